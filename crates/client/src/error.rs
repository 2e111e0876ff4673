//! Errors surfaced by the commerce backend.
//!
//! Three classes reach the stores and views:
//! - authorization failures, already handled globally (session cleared,
//!   navigator sent to the login route) by the time the caller sees them
//! - business-rule rejections carrying a server `message`
//! - transport or decoding failures, shown with a generic fallback text
//!
//! No operation retries.

use reqwest::StatusCode;
use thiserror::Error;

/// Errors that can occur when calling the commerce backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The backend answered 401. The session has been cleared.
    #[error("Unauthorized: session expired or invalid")]
    Unauthorized,

    /// The backend rejected the request (validation, stock, permissions...).
    #[error("Request rejected with HTTP {status}{}", .message.as_deref().map(|m| format!(": {m}")).unwrap_or_default())]
    Rejected {
        /// Response status.
        status: StatusCode,
        /// `message` field of the response body, if any.
        message: Option<String>,
    },

    /// HTTP request failed before a response was received.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body did not have the expected shape.
    #[error("JSON parse error: {0}")]
    Decode(#[from] serde_json::Error),

    /// A request URL could not be built.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl ApiError {
    /// Text to show the user: the server's message when it sent one,
    /// otherwise `fallback`.
    #[must_use]
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Rejected {
                message: Some(message),
                ..
            } if !message.trim().is_empty() => message.clone(),
            _ => fallback.to_owned(),
        }
    }

    /// Whether this error came from the global unauthorized path.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }
}

/// Result type alias for `ApiError`.
pub type Result<T> = std::result::Result<T, ApiError>;
