//! Core domain logic for the chores housekeeping jobs.
//!
//! Everything a job needs between "cron fired" and "exit": configuration,
//! the local mirror cache, digest resolution, the detect/apply driver,
//! report pipelines and rotation arithmetic.

pub mod config;
pub mod descriptor;
pub mod driver;
pub mod error;
pub mod mirror;
pub mod outputs;
pub mod registry;
pub mod reports;
pub mod rotation;
pub mod telemetry;

pub use config::Config;
pub use driver::{
    apply, detect, filter_relevant, notification_blocks, select_mode, summary_lines,
    DigestOutcome, Mode, COMMIT_MESSAGE,
};
pub use error::{ChoresError, Result};
pub use mirror::MirrorStore;
pub use outputs::JobOutputs;
pub use registry::resolve_latest_digest;
pub use telemetry::init_tracing;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
