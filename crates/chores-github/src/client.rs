//! GraphQL client with token auth.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::error::{GithubError, Result};

const GRAPHQL_ENDPOINT: &str = "https://api.github.com/graphql";

#[derive(Serialize)]
struct GraphQlRequest<'a, V> {
    query: &'a str,
    variables: V,
}

#[derive(Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    errors: Option<Vec<GraphQlErrorEntry>>,
}

#[derive(Deserialize)]
struct GraphQlErrorEntry {
    message: String,
}

/// Client for the GitHub GraphQL API, authenticated with a read-only token.
pub struct GithubClient {
    endpoint: String,
    token: String,
    http_client: reqwest::Client,
}

impl GithubClient {
    /// Create a client against the public GitHub API.
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_endpoint(token, GRAPHQL_ENDPOINT)
    }

    /// Create a client against a specific GraphQL endpoint.
    pub fn with_endpoint(token: impl Into<String>, endpoint: impl Into<String>) -> Self {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("chores/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("Failed to create HTTP client");

        GithubClient {
            endpoint: endpoint.into(),
            token: token.into(),
            http_client,
        }
    }

    /// Run one GraphQL query and parse `data` into the query's schema.
    ///
    /// A non-2xx status or a GraphQL `errors` payload is fatal; nothing is
    /// retried.
    pub async fn graphql<V: Serialize, T: DeserializeOwned>(
        &self,
        query: &str,
        variables: V,
    ) -> Result<T> {
        let response = self
            .http_client
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            .json(&GraphQlRequest { query, variables })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), %body, "GitHub API request failed");
            return Err(GithubError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let payload: GraphQlResponse<T> = response.json().await?;

        if let Some(errors) = payload.errors {
            let messages: Vec<String> = errors.into_iter().map(|e| e.message).collect();
            return Err(GithubError::GraphQl(messages.join("; ")));
        }

        debug!("GraphQL query OK");
        payload
            .data
            .ok_or_else(|| GithubError::Shape("response has neither data nor errors".to_string()))
    }
}
