//! Relay error types

use thiserror::Error;

/// Errors raised by the relay's outbound adapters and config validation
///
/// None of these stop the drain loop; the dispatcher logs them and moves on.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Webhook returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Paste upload failed: {0}")]
    Paste(String),

    #[error("Invalid JSON response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Config(String),
}

impl RelayError {
    /// Check if this error came from the remote end rather than the network
    pub fn is_status(&self) -> bool {
        matches!(self, RelayError::Status { .. })
    }

    /// HTTP status code, when the remote end answered
    pub fn status(&self) -> Option<u16> {
        match self {
            RelayError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
