//! Destination phone canonicalization.
//!
//! Normalization is total: any input string yields an output, even when the
//! result is not actually dialable. A destination that cannot be repaired is
//! passed through stripped rather than rejected, so delivery can still fall
//! back to a manual link the operator may fix by hand.

use crate::config::DialingPlan;
use serde::{Deserialize, Serialize};

/// A destination normalized to an international-dialing digit string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CanonicalPhone(pub String);

impl CanonicalPhone {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CanonicalPhone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Canonicalize a raw human-entered phone string against a dialing plan.
///
/// Strips every non-digit character, then:
/// - digits already prefixed by the calling code pass through unchanged;
/// - digits starting with the mobile-prefix digit get the calling code
///   prepended;
/// - digits matching the local subscriber length get the calling code
///   prepended;
/// - anything else is returned stripped, as-is.
///
/// Deterministic and side-effect-free; identical input always yields
/// identical output.
pub fn normalize(raw: &str, plan: &DialingPlan) -> CanonicalPhone {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();

    if digits.starts_with(&plan.calling_code) {
        return CanonicalPhone(digits);
    }

    if digits.starts_with(&plan.mobile_prefix) || digits.len() == plan.local_number_len {
        return CanonicalPhone(format!("{}{}", plan.calling_code, digits));
    }

    CanonicalPhone(digits)
}
