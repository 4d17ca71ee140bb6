//! Incoming-webhook client.

use serde::Serialize;
use tracing::{error, info};

use crate::blocks::{limit_blocks, Block};
use crate::error::{Result, SlackError};

#[derive(Serialize)]
struct Message {
    blocks: Vec<Block>,
}

/// Client for one configured Slack incoming webhook.
pub struct SlackWebhook {
    url: String,
    http_client: reqwest::Client,
}

impl SlackWebhook {
    /// Create a client for the given webhook URL.
    pub fn new(url: impl Into<String>) -> Self {
        SlackWebhook {
            url: url.into(),
            http_client: reqwest::Client::new(),
        }
    }

    /// Post a block message to the webhook.
    ///
    /// The block list is truncated to the 50-block platform limit before
    /// sending. A non-2xx response is an error carrying the status and the
    /// response body; nothing is retried.
    pub async fn post_blocks(&self, blocks: Vec<Block>) -> Result<()> {
        let message = Message {
            blocks: limit_blocks(blocks),
        };

        let response = self
            .http_client
            .post(&self.url)
            .json(&message)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            info!("posted to Slack OK");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        error!(status = status.as_u16(), %body, "failed to post to Slack");
        Err(SlackError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::section;

    #[tokio::test]
    async fn test_post_blocks_succeeds_on_2xx() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/webhook")
            .match_header("content-type", "application/json")
            .with_status(200)
            .with_body("ok")
            .create_async()
            .await;

        let webhook = SlackWebhook::new(format!("{}/webhook", server.url()));
        webhook
            .post_blocks(vec![section("hello")])
            .await
            .expect("post should succeed");

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_post_blocks_fails_on_non_2xx_with_status_and_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/webhook")
            .with_status(400)
            .with_body("invalid_blocks")
            .create_async()
            .await;

        let webhook = SlackWebhook::new(format!("{}/webhook", server.url()));
        let err = webhook
            .post_blocks(vec![section("hello")])
            .await
            .expect_err("post should fail");

        match err {
            SlackError::Rejected { status, body } => {
                assert_eq!(status, 400);
                assert_eq!(body, "invalid_blocks");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_post_blocks_sends_the_truncation_marker_for_long_messages() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/webhook")
            .match_body(mockito::Matcher::Regex(r"\.\.\. and 24 more".to_string()))
            .with_status(200)
            .create_async()
            .await;

        let webhook = SlackWebhook::new(format!("{}/webhook", server.url()));
        let blocks = (0..73).map(|i| section(format!("b{i}"))).collect();
        webhook.post_blocks(blocks).await.expect("post");

        mock.assert_async().await;
    }
}
