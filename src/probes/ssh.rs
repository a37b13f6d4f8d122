//! Remote execution wrapper.

use super::BuildError;
use crate::config::RemoteConfig;

/// Wrap `command` so it runs on `host` as `username`:
/// `ssh -n -o ConnectTimeout=<t> user@host '<command>'`.
pub fn wrap_remote(
    command: &str,
    username: &str,
    host: &str,
    remote: &RemoteConfig,
) -> Result<String, BuildError> {
    if username.is_empty()
        || username.starts_with('-')
        || username
            .chars()
            .any(|c| !c.is_ascii_alphanumeric() && !matches!(c, '_' | '-' | '.'))
    {
        return Err(BuildError::InvalidUsername(username.to_string()));
    }
    let quoted = single_quote(command).ok_or_else(|| BuildError::Unquotable(command.to_string()))?;
    Ok(format!(
        "{} -n -o ConnectTimeout={} {}@{} {}",
        remote.ssh_path, remote.connect_timeout_secs, username, host, quoted
    ))
}

/// Single-quote `value` for a POSIX shell, escaping embedded quotes.
///
/// Returns None for newline, carriage return or NUL.
pub fn single_quote(value: &str) -> Option<String> {
    if value.contains(['\n', '\r', '\0']) {
        return None;
    }

    let mut escaped = String::with_capacity(value.len() + 2);
    escaped.push('\'');
    for ch in value.chars() {
        if ch == '\'' {
            escaped.push_str("'\\''");
        } else {
            escaped.push(ch);
        }
    }
    escaped.push('\'');
    Some(escaped)
}
