//! Configuration for the triage account and tool behavior
//!
//! All configuration is loaded from `TRIAGE_*` environment variables once at
//! startup and threaded explicitly through session construction. No other
//! module reads ambient process state.

use std::env;
use std::env::VarError;

use secrecy::SecretString;

use crate::errors::{AppError, AppResult};

/// Triage tool configuration
///
/// Holds credentials and connection details for the single IMAP account plus
/// tool-level settings. The app password is stored using `SecretString` to
/// prevent accidental logging.
#[derive(Debug, Clone)]
pub struct Config {
    /// Account email address, also used as the From address on drafts
    pub email_address: String,
    /// App password stored in a type that prevents accidental logging
    pub app_password: SecretString,
    /// IMAP server hostname
    pub imap_host: String,
    /// IMAP server port (typically 993 for TLS)
    pub imap_port: u16,
    /// TCP connection timeout in milliseconds
    pub connect_timeout_ms: u64,
    /// IMAP greeting/TLS handshake timeout in milliseconds
    pub greeting_timeout_ms: u64,
    /// Socket I/O timeout in milliseconds
    pub socket_timeout_ms: u64,
    /// Webhook URL for digest notifications (notifications skipped if unset)
    pub slack_webhook_url: Option<String>,
    /// Name substituted into draft signatures
    pub signature_name: String,
    /// Directory receiving the per-run batch artifact
    pub output_dir: String,
}

impl Config {
    /// Load all configuration from environment variables
    ///
    /// `TRIAGE_EMAIL_ADDRESS` and `TRIAGE_APP_PASSWORD` are required; every
    /// other value has a default.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if a required variable is missing or a set
    /// variable is malformed.
    ///
    /// # Example Environment
    ///
    /// ```text
    /// TRIAGE_EMAIL_ADDRESS=user@gmail.com
    /// TRIAGE_APP_PASSWORD=app-password
    /// TRIAGE_IMAP_HOST=imap.gmail.com
    /// TRIAGE_SLACK_WEBHOOK_URL=https://hooks.slack.com/services/...
    /// ```
    pub fn load_from_env() -> AppResult<Self> {
        Ok(Self {
            email_address: required_env("TRIAGE_EMAIL_ADDRESS")?,
            app_password: SecretString::new(required_env("TRIAGE_APP_PASSWORD")?.into()),
            imap_host: optional_env("TRIAGE_IMAP_HOST")?
                .unwrap_or_else(|| "imap.gmail.com".to_owned()),
            imap_port: parse_u16_env("TRIAGE_IMAP_PORT", 993)?,
            connect_timeout_ms: parse_u64_env("TRIAGE_CONNECT_TIMEOUT_MS", 30_000)?,
            greeting_timeout_ms: parse_u64_env("TRIAGE_GREETING_TIMEOUT_MS", 15_000)?,
            socket_timeout_ms: parse_u64_env("TRIAGE_SOCKET_TIMEOUT_MS", 300_000)?,
            slack_webhook_url: optional_env("TRIAGE_SLACK_WEBHOOK_URL")?,
            signature_name: optional_env("TRIAGE_SIGNATURE_NAME")?
                .unwrap_or_else(|| "Tony Kipkemboi".to_owned()),
            output_dir: optional_env("TRIAGE_OUTPUT_DIR")?.unwrap_or_else(|| "output".to_owned()),
        })
    }
}

/// Read a required environment variable, returning error if missing or empty
fn required_env(key: &str) -> AppResult<String> {
    match env::var(key) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(AppError::InvalidInput(format!(
            "missing required environment variable {key}"
        ))),
    }
}

/// Read an optional environment variable, treating empty as unset
fn optional_env(key: &str) -> AppResult<Option<String>> {
    match env::var(key) {
        Ok(v) if !v.trim().is_empty() => Ok(Some(v)),
        Ok(_) | Err(VarError::NotPresent) => Ok(None),
        Err(VarError::NotUnicode(_)) => Err(AppError::InvalidInput(format!(
            "environment variable {key} contains non-unicode data"
        ))),
    }
}

/// Parse a `u16` environment variable with default fallback
///
/// Returns `default` if unset.
///
/// # Errors
///
/// Returns `InvalidInput` if the variable is set but not a valid `u16`.
fn parse_u16_env(key: &str, default: u16) -> AppResult<u16> {
    match env::var(key) {
        Ok(v) => v.parse::<u16>().map_err(|_| {
            AppError::InvalidInput(format!("invalid u16 environment variable {key}: '{v}'"))
        }),
        Err(VarError::NotPresent) => Ok(default),
        Err(VarError::NotUnicode(_)) => Err(AppError::InvalidInput(format!(
            "environment variable {key} contains non-unicode data"
        ))),
    }
}

/// Parse a `u64` environment variable with default fallback
///
/// Returns `default` if unset.
///
/// # Errors
///
/// Returns `InvalidInput` if the variable is set but not a valid `u64`.
fn parse_u64_env(key: &str, default: u64) -> AppResult<u64> {
    match env::var(key) {
        Ok(v) => v.parse::<u64>().map_err(|_| {
            AppError::InvalidInput(format!("invalid u64 environment variable {key}: '{v}'"))
        }),
        Err(VarError::NotPresent) => Ok(default),
        Err(VarError::NotUnicode(_)) => Err(AppError::InvalidInput(format!(
            "environment variable {key} contains non-unicode data"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::{optional_env, parse_u16_env, required_env};

    // Variable names no environment sets; the helpers are only read, never
    // mutated, so these are safe under parallel test execution.

    #[test]
    fn missing_required_var_is_rejected() {
        assert!(required_env("TRIAGE_TEST_NEVER_SET").is_err());
    }

    #[test]
    fn missing_optional_var_is_none() {
        assert!(optional_env("TRIAGE_TEST_NEVER_SET").unwrap().is_none());
    }

    #[test]
    fn unset_numeric_var_falls_back_to_default() {
        assert_eq!(parse_u16_env("TRIAGE_TEST_NEVER_SET", 993).unwrap(), 993);
    }
}
