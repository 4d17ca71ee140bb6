//! Tracing initialisation for the chores binary.
//!
//! Call [`init_tracing`] once at startup. Respects `RUST_LOG` for
//! fine-grained filtering; the supplied level is the fallback when it is
//! not set. Calling it again is a no-op (the global subscriber can only be
//! installed once per process).

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Install the global tracing subscriber.
///
/// With `json` set, emits newline-delimited JSON log lines for the CI log
/// collectors; otherwise human-readable output.
pub fn init_tracing(json: bool, level: Level) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_target(false).json())
            .try_init()
            .ok();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_target(false))
            .try_init()
            .ok();
    }
}
