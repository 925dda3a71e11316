//! Shell command building for the bridge process.
//!
//! The bridge binary is typically a Node script whose interpreter lives on
//! the operator's PATH, so it is launched through the user's login shell.
//! Non-POSIX shells (fish, nushell) fall back to bash/sh, and arguments are
//! quoted so paths with spaces survive the shell round-trip.

use std::process::Command;

/// Exit status emitted when the bridge process terminates.
#[derive(Debug, Clone, serde::Serialize)]
pub struct BridgeExit {
    pub code: i32,
    pub signal: Option<i32>,
}

/// Prepend the binary's parent directory to PATH so sibling tools (node,
/// npx) are found.
pub fn prepare_path_env(cmd: &mut Command, binary_path: &str) {
    if binary_path.contains('/') {
        if let Some(dir) = std::path::Path::new(binary_path).parent() {
            if let Some(dir_str) = dir.to_str() {
                let existing = std::env::var("PATH").unwrap_or_default();
                let combined = if existing.is_empty() {
                    dir_str.to_string()
                } else {
                    format!("{}:{}", dir_str, existing)
                };
                cmd.env("PATH", combined);
            }
        }
    }
}

/// Build a command that runs the bridge binary with args in a login shell.
///
/// The final command is `<prefix> '<quoted command>'`, where the prefix is
/// either the caller's override (e.g. "/bin/zsh -l -c") or `$SHELL -l -c`
/// with a bash/sh fallback for non-POSIX shells. On Windows the binary is
/// run directly.
#[cfg(unix)]
pub fn build_login_shell_command(
    binary_path: &str,
    args: &[String],
    working_dir: Option<&str>,
    shell_prefix: Option<&str>,
) -> Result<Command, String> {
    let prefix = get_shell_prefix(shell_prefix);

    let prefix_parts: Vec<&str> = prefix.split_whitespace().collect();
    if prefix_parts.is_empty() {
        return Err("Empty shell prefix".to_string());
    }

    let shell_program = prefix_parts[0];
    let shell_args = &prefix_parts[1..];

    let mut command_parts = Vec::with_capacity(args.len() + 1);
    command_parts.push(
        shlex::try_quote(binary_path)
            .map_err(|_| format!("Invalid path: {}", binary_path))?
            .into_owned(),
    );
    for arg in args {
        command_parts.push(
            shlex::try_quote(arg)
                .map_err(|_| format!("Invalid argument: {}", arg))?
                .into_owned(),
        );
    }
    let full_command = command_parts.join(" ");

    let mut cmd = Command::new(shell_program);
    cmd.args(shell_args).arg(&full_command);

    if let Some(dir) = working_dir {
        cmd.current_dir(dir);
    }

    prepare_path_env(&mut cmd, binary_path);

    Ok(cmd)
}

/// The shell prefix to wrap the bridge invocation in.
#[cfg(unix)]
fn get_shell_prefix(custom_prefix: Option<&str>) -> String {
    if let Some(prefix) = custom_prefix {
        if !prefix.is_empty() {
            return prefix.to_string();
        }
    }

    let shell = std::env::var("SHELL").unwrap_or_else(|_| "/bin/sh".to_string());

    let shell_name = std::path::Path::new(&shell)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("");

    // These don't support `-l -c` the POSIX way.
    let non_posix = ["fish", "nu", "nushell", "elvish", "xonsh", "ion"];

    let effective_shell = if non_posix.iter().any(|&s| shell_name == s) {
        if std::path::Path::new("/bin/bash").exists() {
            "/bin/bash"
        } else {
            "/bin/sh"
        }
    } else {
        &shell
    };

    format!("{} -l -c", effective_shell)
}

/// Windows version: runs the binary directly (no login shell concept).
#[cfg(windows)]
pub fn build_login_shell_command(
    binary_path: &str,
    args: &[String],
    working_dir: Option<&str>,
    _shell_prefix: Option<&str>,
) -> Result<Command, String> {
    let mut cmd = Command::new(binary_path);
    cmd.args(args);

    if let Some(dir) = working_dir {
        cmd.current_dir(dir);
    }

    prepare_path_env(&mut cmd, binary_path);

    Ok(cmd)
}
