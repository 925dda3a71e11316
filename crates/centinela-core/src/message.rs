//! Alert requests and message formatting.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Payload of a notification request.
///
/// The variant doubles as the request kind; every field is interpolated
/// verbatim into the rendered template.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum NotificationPayload {
    /// A new user registered through the public form.
    #[serde(rename_all = "camelCase")]
    Registration {
        first_name: String,
        last_name: String,
        email: String,
        phone: String,
        /// Carried in the payload so rendering stays deterministic.
        registered_at: DateTime<Utc>,
    },
    /// Operator-triggered health check.
    Ping,
}

impl NotificationPayload {
    /// Short label used in log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            NotificationPayload::Registration { .. } => "registration",
            NotificationPayload::Ping => "ping",
        }
    }
}

/// An immutable notification request, consumed exactly once by the service.
#[derive(Debug, Clone)]
pub struct NotificationRequest {
    pub payload: NotificationPayload,
    /// Raw destination phone string. Empty means "the configured operator
    /// address".
    pub destination: String,
}

impl NotificationRequest {
    pub fn new(payload: NotificationPayload, destination: impl Into<String>) -> Self {
        Self {
            payload,
            destination: destination.into(),
        }
    }

    /// The fixed health-check request, addressed to the operator.
    pub fn ping() -> Self {
        Self {
            payload: NotificationPayload::Ping,
            destination: String::new(),
        }
    }
}

/// Render a payload into its fixed alert template.
///
/// Plain text interpolation only, no escaping. Deterministic: identical
/// payloads yield byte-identical output.
pub fn format(payload: &NotificationPayload) -> String {
    match payload {
        NotificationPayload::Registration {
            first_name,
            last_name,
            email,
            phone,
            registered_at,
        } => format!(
            "Nuevo registro en la plataforma\n\
             Nombre: {} {}\n\
             Email: {}\n\
             Teléfono: {}\n\
             Fecha: {}",
            first_name,
            last_name,
            email,
            phone,
            registered_at.format("%Y-%m-%d %H:%M UTC"),
        ),
        NotificationPayload::Ping => {
            "Ping de prueba: el canal de notificaciones está operativo.".to_string()
        }
    }
}
