//! Error taxonomy for the frontend core. Transport failures and protocol
//! denials are converted into user-facing messages at every entry point;
//! nothing in this crate surfaces an uncaught failure to the view layer.

use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AppError {
    Config(String),
    Network(String),
    Timeout(String),
    /// Non-2xx transport response; the body text is surfaced verbatim
    /// (sanitized) and scoped to the initiating action.
    Http { status: u16, message: String },
    Parse(String),
    Serialization(String),
    /// The server explicitly denied a submitted credential.
    Denied(String),
    /// Rejected locally before any network call (empty field, mismatch).
    Validation(String),
    /// Programming invariant violation, e.g. finishing a passkey enrollment
    /// with no pending challenge.
    State(String),
    /// The bearer credential expired mid-flow; the caller must offer a
    /// distinct "please sign in again" path instead of a generic error.
    SessionExpired(String),
}

impl AppError {
    /// Flags an invariant violation: loud in development builds, a generic
    /// recoverable message in production.
    pub fn state_conflict(detail: &str) -> Self {
        debug_assert!(false, "state conflict: {detail}");
        AppError::State("The page is out of sync. Reload and try again.".to_string())
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(message) => write!(formatter, "Config error: {message}"),
            AppError::Network(message) => write!(formatter, "Network error: {message}"),
            AppError::Timeout(message) => write!(formatter, "Timeout: {message}"),
            AppError::Http { status, message } => {
                write!(formatter, "Request failed ({status}): {message}")
            }
            AppError::Parse(message) => write!(formatter, "Response error: {message}"),
            AppError::Serialization(message) => write!(formatter, "Request error: {message}"),
            AppError::Denied(message) => write!(formatter, "Denied: {message}"),
            AppError::Validation(message) => write!(formatter, "{message}"),
            AppError::State(message) => write!(formatter, "{message}"),
            AppError::SessionExpired(message) => write!(formatter, "{message}"),
        }
    }
}

impl std::error::Error for AppError {}
