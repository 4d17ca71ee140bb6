//! Error types for Slack webhook publishing.

use thiserror::Error;

/// Errors that can occur when posting to the Slack webhook.
#[derive(Error, Debug)]
pub enum SlackError {
    /// The webhook rejected the message (non-2xx response).
    #[error("webhook returned {status}: {body}")]
    Rejected { status: u16, body: String },

    /// Transport-level HTTP failure.
    #[error("webhook request failed: {0}")]
    Http(String),

    /// Message serialization failure.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<reqwest::Error> for SlackError {
    fn from(err: reqwest::Error) -> Self {
        SlackError::Http(err.to_string())
    }
}

/// Result type for Slack operations.
pub type Result<T> = std::result::Result<T, SlackError>;
