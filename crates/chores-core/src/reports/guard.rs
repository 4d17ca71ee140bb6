//! Weekly on-call guard announcement.

use chrono::NaiveDate;
use tracing::info;

use chores_slack::{section, Block, SlackWebhook};

use crate::error::Result;
use crate::rotation::weekly_pick;

const GUARD_ROSTER: &[&str] = &["perols", "ameidell", "jkleven", "oyvindhn", "mgaustad"];

/// This week's guard.
pub fn guard_for(today: NaiveDate) -> &'static str {
    weekly_pick(today, GUARD_ROSTER)
}

/// The announcement message.
pub fn blocks(guard: &str) -> Vec<Block> {
    vec![section(format!(
        ":shield: This week's guard is <https://github.com/{guard}|{guard}> :shield:"
    ))]
}

/// Pick and post.
pub async fn run(webhook: &SlackWebhook, today: NaiveDate) -> Result<()> {
    let guard = guard_for(today);
    info!(guard, "announcing this week's guard");
    webhook.post_blocks(blocks(guard)).await?;
    Ok(())
}
