//! # Koyeb Error Types Module
//!
//! Error types for calls against the Koyeb management API. Every variant
//! carries a message suitable for relaying to the chat verbatim.

/// Custom error types for Koyeb API operations
#[derive(Debug, Clone)]
pub enum KoyebError {
    /// Authentication was rejected (bad or revoked API key)
    Auth(String),
    /// Transport-level failure (connection, timeout, DNS)
    Http(String),
    /// The API answered with an unexpected status code
    Api { status: u16, body: String },
    /// The response body could not be decoded
    Decode(String),
}

impl std::fmt::Display for KoyebError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KoyebError::Auth(msg) => write!(f, "Authentication failed: {msg}"),
            KoyebError::Http(msg) => write!(f, "Request failed: {msg}"),
            KoyebError::Api { status, body } => write!(f, "Koyeb API error ({status}): {body}"),
            KoyebError::Decode(msg) => write!(f, "Unexpected response from Koyeb: {msg}"),
        }
    }
}

impl std::error::Error for KoyebError {}

impl From<reqwest::Error> for KoyebError {
    fn from(err: reqwest::Error) -> Self {
        KoyebError::Http(err.to_string())
    }
}
