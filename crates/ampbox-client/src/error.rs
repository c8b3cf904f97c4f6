//! Error types for the Ampbox client.

use thiserror::Error;

/// Result type alias using [`ClientError`].
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors returned by the session service client.
///
/// Callers usually only care about three categories: authentication failures,
/// unknown sessions, and everything else the service can throw at them. Use
/// [`ClientError::is_authentication`] and [`ClientError::is_not_found`] to
/// tell them apart.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The service rejected the API key (401/403).
    #[error("Authentication failed")]
    Authentication,

    /// The requested session does not exist.
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// The service answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Transport-level failure.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The event stream broke mid-session.
    #[error("Event stream error: {0}")]
    Stream(String),

    /// A payload from the service could not be decoded.
    #[error("Invalid response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The client could not be constructed.
    #[error("{0}")]
    Config(String),
}

impl ClientError {
    pub const fn is_authentication(&self) -> bool {
        matches!(self, Self::Authentication)
    }

    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::SessionNotFound(_))
    }
}
