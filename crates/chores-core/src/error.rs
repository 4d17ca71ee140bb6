//! Error taxonomy for the chores jobs.
//!
//! Four families, matching how failures surface: configuration problems
//! (caught eagerly, before any work), upstream API failures, subprocess
//! failures carrying captured stderr, and unexpected-shape errors where an
//! expected field is simply not there. Nothing is retried; every error is
//! terminal for the run.

use thiserror::Error;

/// Errors produced by the chores jobs.
#[derive(Error, Debug)]
pub enum ChoresError {
    /// Missing or invalid environment configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Invalid command-line usage (e.g. conflicting mode flags).
    #[error("usage error: {0}")]
    Usage(String),

    /// A git subprocess failed.
    #[error("git error: {0}")]
    Git(String),

    /// The container tool failed to run or exited non-zero.
    #[error("docker error: {0}")]
    Docker(String),

    /// The manifest inspection yielded no digest for the target platform.
    #[error("no manifest found: {0}")]
    NoManifest(String),

    /// GitHub API failure.
    #[error(transparent)]
    Github(#[from] chores_github::GithubError),

    /// Slack webhook failure.
    #[error(transparent)]
    Slack(#[from] chores_slack::SlackError),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for chores operations.
pub type Result<T> = std::result::Result<T, ChoresError>;
