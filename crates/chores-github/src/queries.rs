//! Per-job GraphQL queries against a team's repositories.
//!
//! Every query is scoped to `organization(login:) { team(slug:) }` and
//! returns repository nodes; each job selects only the fields it needs.
//! The shared `organization.team.repositories.nodes` envelope is unwrapped
//! here so callers only ever see the node lists.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::info;

use crate::client::GithubClient;
use crate::error::{GithubError, Result};

/// A connection's node list; pagination cursors are not used by any job.
#[derive(Debug, Clone, Deserialize)]
pub struct Connection<T> {
    pub nodes: Vec<T>,
}

#[derive(Deserialize)]
struct TeamData<T> {
    organization: Option<OrgNode<T>>,
}

#[derive(Deserialize)]
struct OrgNode<T> {
    team: Option<TeamNode<T>>,
}

#[derive(Deserialize)]
struct TeamNode<T> {
    repositories: Connection<T>,
}

/// Repository identity and activity, for discovery and inactivity reports.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamRepo {
    pub name: String,
    pub is_archived: bool,
    /// Absent for repositories that have never been pushed to.
    pub pushed_at: Option<DateTime<Utc>>,
    pub url: String,
}

/// An open pull request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequest {
    pub title: String,
    pub updated_at: DateTime<Utc>,
    pub permalink: String,
}

/// Repository with its most recently updated open pull requests.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoWithPrs {
    pub name: String,
    pub is_archived: bool,
    pub url: String,
    pub pull_requests: Connection<PullRequest>,
}

/// An open dependabot/security vulnerability alert.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VulnerabilityAlert {
    pub created_at: DateTime<Utc>,
    pub number: u64,
    pub security_vulnerability: SecurityVulnerability,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityVulnerability {
    pub severity: String,
    pub vulnerable_version_range: String,
    pub package: VulnerablePackage,
    pub first_patched_version: Option<PatchedVersion>,
    pub advisory: Advisory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VulnerablePackage {
    pub ecosystem: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PatchedVersion {
    pub identifier: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Advisory {
    pub permalink: String,
}

/// Repository with its open vulnerability alerts.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoWithAlerts {
    pub name: String,
    pub is_archived: bool,
    pub url: String,
    pub vulnerability_alerts: Connection<VulnerabilityAlert>,
}

/// CODEOWNERS validation state; `None` when the file is missing entirely.
#[derive(Debug, Clone, Deserialize)]
pub struct Codeowners {
    pub errors: Vec<CodeownersError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CodeownersError {
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoWithCodeowners {
    pub name: String,
    pub is_archived: bool,
    pub url: String,
    pub codeowners: Option<Codeowners>,
}

/// Repository with primary language and open PR authors, for dependency duty.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoWithLanguage {
    pub name: String,
    pub is_archived: bool,
    pub url: String,
    pub primary_language: Option<Language>,
    pub pull_requests: Connection<PrAuthorNode>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Language {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PrAuthorNode {
    /// Absent when the author's account has been deleted.
    pub author: Option<PrAuthor>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PrAuthor {
    pub login: String,
}

const TEAM_REPOS_QUERY: &str = r#"
query TeamRepos($org: String!, $team: String!) {
    organization(login: $org) {
        team(slug: $team) {
            repositories {
                nodes {
                    name
                    isArchived
                    pushedAt
                    url
                }
            }
        }
    }
}"#;

const OPEN_PRS_QUERY: &str = r#"
query TeamOpenPrs($org: String!, $team: String!) {
    organization(login: $org) {
        team(slug: $team) {
            repositories(orderBy: { field: PUSHED_AT, direction: ASC }) {
                nodes {
                    name
                    isArchived
                    url
                    pullRequests(first: 10, orderBy: { field: UPDATED_AT, direction: DESC }, states: OPEN) {
                        nodes {
                            title
                            updatedAt
                            permalink
                        }
                    }
                }
            }
        }
    }
}"#;

const VULNERABILITY_ALERTS_QUERY: &str = r#"
query TeamVulnerabilities($org: String!, $team: String!) {
    organization(login: $org) {
        team(slug: $team) {
            repositories {
                nodes {
                    name
                    isArchived
                    url
                    vulnerabilityAlerts(states: OPEN, first: 10) {
                        nodes {
                            createdAt
                            number
                            securityVulnerability {
                                severity
                                vulnerableVersionRange
                                package {
                                    ecosystem
                                    name
                                }
                                firstPatchedVersion {
                                    identifier
                                }
                                advisory {
                                    permalink
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}"#;

const CODEOWNERS_QUERY: &str = r#"
query TeamCodeowners($org: String!, $team: String!) {
    organization(login: $org) {
        team(slug: $team) {
            repositories(orderBy: { field: PUSHED_AT, direction: DESC }) {
                nodes {
                    name
                    isArchived
                    url
                    codeowners {
                        errors {
                            message
                        }
                    }
                }
            }
        }
    }
}"#;

const REPOS_BY_LANGUAGE_QUERY: &str = r#"
query TeamReposByLanguage($org: String!, $team: String!) {
    organization(login: $org) {
        team(slug: $team) {
            repositories(orderBy: { field: PUSHED_AT, direction: DESC }) {
                nodes {
                    name
                    isArchived
                    url
                    primaryLanguage {
                        name
                    }
                    pullRequests(first: 10, orderBy: { field: UPDATED_AT, direction: DESC }, states: OPEN) {
                        nodes {
                            author {
                                login
                            }
                        }
                    }
                }
            }
        }
    }
}"#;

impl GithubClient {
    /// All repositories belonging to a team.
    pub async fn team_repositories(&self, org: &str, team: &str) -> Result<Vec<TeamRepo>> {
        let repos = self.team_query(TEAM_REPOS_QUERY, org, team).await?;
        info!(count = repos.len(), %team, "fetched team repositories");
        Ok(repos)
    }

    /// Team repositories with their most recently updated open PRs.
    pub async fn team_pull_requests(&self, org: &str, team: &str) -> Result<Vec<RepoWithPrs>> {
        self.team_query(OPEN_PRS_QUERY, org, team).await
    }

    /// Team repositories with their open vulnerability alerts.
    pub async fn team_vulnerability_alerts(
        &self,
        org: &str,
        team: &str,
    ) -> Result<Vec<RepoWithAlerts>> {
        self.team_query(VULNERABILITY_ALERTS_QUERY, org, team).await
    }

    /// Team repositories with their CODEOWNERS validation state.
    pub async fn team_codeowners(&self, org: &str, team: &str) -> Result<Vec<RepoWithCodeowners>> {
        self.team_query(CODEOWNERS_QUERY, org, team).await
    }

    /// Team repositories with primary language and open PR authors.
    pub async fn team_repos_by_language(
        &self,
        org: &str,
        team: &str,
    ) -> Result<Vec<RepoWithLanguage>> {
        self.team_query(REPOS_BY_LANGUAGE_QUERY, org, team).await
    }

    async fn team_query<T: DeserializeOwned>(
        &self,
        query: &str,
        org: &str,
        team: &str,
    ) -> Result<Vec<T>> {
        let data: TeamData<T> = self
            .graphql(query, serde_json::json!({ "org": org, "team": team }))
            .await?;

        let organization = data
            .organization
            .ok_or_else(|| GithubError::Shape(format!("organization {org} not found")))?;
        let team_node = organization
            .team
            .ok_or_else(|| GithubError::Shape(format!("team {team} not found in {org}")))?;

        Ok(team_node.repositories.nodes)
    }
}
