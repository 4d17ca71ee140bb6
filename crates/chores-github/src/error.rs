//! Error types for the GitHub GraphQL client.

use thiserror::Error;

/// Errors that can occur when querying the GitHub API.
#[derive(Error, Debug)]
pub enum GithubError {
    /// The API answered with a non-2xx status.
    #[error("GitHub API returned {status}: {body}")]
    Api { status: u16, body: String },

    /// The API answered 2xx but with a GraphQL error payload.
    #[error("GraphQL query failed: {0}")]
    GraphQl(String),

    /// A response was missing an expected field.
    #[error("unexpected response shape: {0}")]
    Shape(String),

    /// Transport-level HTTP failure.
    #[error("GitHub request failed: {0}")]
    Http(String),

    /// Response body was not valid JSON.
    #[error("response parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<reqwest::Error> for GithubError {
    fn from(err: reqwest::Error) -> Self {
        GithubError::Http(err.to_string())
    }
}

/// Result type for GitHub operations.
pub type Result<T> = std::result::Result<T, GithubError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_carries_status_and_body() {
        let err = GithubError::Api {
            status: 502,
            body: "bad gateway".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("502"));
        assert!(msg.contains("bad gateway"));
    }

    #[test]
    fn test_shape_error_display() {
        let err = GithubError::Shape("team not found".to_string());
        assert!(err.to_string().contains("unexpected response shape"));
    }
}
