//! Block Kit message building.
//!
//! Only the two block shapes the jobs actually use are modelled: `header`
//! with plain text and `section` with mrkdwn.

use serde::{Deserialize, Serialize};

/// Hard platform limit on blocks per message.
pub const BLOCK_LIMIT: usize = 50;

/// A Block Kit block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Header { text: Text },
    Section { text: Text },
}

/// A Block Kit text object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Text {
    PlainText { text: String, emoji: bool },
    Mrkdwn { text: String },
}

/// Build a header block with plain text.
pub fn header(text: impl Into<String>) -> Block {
    Block::Header {
        text: Text::PlainText {
            text: text.into(),
            emoji: true,
        },
    }
}

/// Build a section block with mrkdwn text.
pub fn section(text: impl Into<String>) -> Block {
    Block::Section {
        text: Text::Mrkdwn { text: text.into() },
    }
}

/// Enforce the 50-block message limit.
///
/// Keeps the first 49 blocks and appends a single "... and N more" section
/// accounting for everything dropped. Messages at or under the limit pass
/// through untouched.
pub fn limit_blocks(blocks: Vec<Block>) -> Vec<Block> {
    if blocks.len() <= BLOCK_LIMIT {
        return blocks;
    }

    tracing::warn!(
        blocks = blocks.len(),
        limit = BLOCK_LIMIT,
        "message exceeds block limit, truncating"
    );

    let dropped = blocks.len() - (BLOCK_LIMIT - 1);
    let mut limited: Vec<Block> = blocks.into_iter().take(BLOCK_LIMIT - 1).collect();
    limited.push(section(format!("... and {dropped} more")));
    limited
}
