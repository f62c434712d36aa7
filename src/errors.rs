//! Application error model
//!
//! Defines a typed error hierarchy using `thiserror`. Session-level failures
//! (authentication, connectivity) abort an operation; per-item failures inside
//! a batch are reported as aggregate outcomes and never surface here.

use thiserror::Error;

/// Application error type
///
/// Covers all terminal failure cases a tool operation may report. Decoding
/// and date-parsing problems never become errors; they degrade to empty or
/// fallback values at the point of use.
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid caller input (empty id, empty reason, malformed directive)
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Referenced message or resource is absent
    #[error("not found: {0}")]
    NotFound(String),
    /// Authentication failure (missing or rejected credentials)
    #[error("authentication failed: {0}")]
    AuthFailed(String),
    /// Network or protocol failure while opening a session
    #[error("connection failed: {0}")]
    ConnectionFailed(String),
    /// Operation timeout (TCP connect, TLS handshake, IMAP response)
    #[error("operation timed out: {0}")]
    Timeout(String),
    /// None of the known folder-name variants selected successfully
    #[error("folder not found: {0}")]
    FolderNotFound(String),
    /// Internal error (unexpected failure, external crate error)
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Convenience constructor for `InvalidInput`
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}

/// Type alias for fallible return values
///
/// Use this for all internal functions that can fail. Provides a consistent
/// error type throughout the codebase.
pub type AppResult<T> = Result<T, AppError>;
