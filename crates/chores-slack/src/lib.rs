//! Slack webhook publishing for the chores jobs.
//!
//! Every job posts its summary as a list of Block Kit blocks to an incoming
//! webhook. The webhook caps messages at 50 blocks; longer reports are
//! truncated with a trailing "... and N more" section.

pub mod blocks;
pub mod error;
pub mod webhook;

pub use blocks::{header, section, Block, BLOCK_LIMIT};
pub use error::{Result, SlackError};
pub use webhook::SlackWebhook;
