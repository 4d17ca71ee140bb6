//! GitHub GraphQL integration for the chores jobs.
//!
//! One small client, one tailored query per job. Responses are parsed into
//! explicit per-query schemas at the boundary; an unexpected shape is a
//! typed error, never a stray panic further in.

pub mod client;
pub mod error;
pub mod queries;

pub use client::GithubClient;
pub use error::{GithubError, Result};
pub use queries::{
    Codeowners, CodeownersError, Connection, PullRequest, RepoWithAlerts, RepoWithCodeowners,
    RepoWithLanguage, RepoWithPrs, SecurityVulnerability, TeamRepo, VulnerabilityAlert,
};
