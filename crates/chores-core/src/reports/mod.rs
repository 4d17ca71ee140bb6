//! Scheduled report jobs.
//!
//! Each job is a single pipeline: query, filter, build blocks, post. When
//! there is nothing to report, a job logs that and exits cleanly instead
//! of posting a vacuous message (the risks job is the exception and posts
//! an all-clear).

pub mod codeowners;
pub mod duty;
pub mod guard;
pub mod inactive_repos;
pub mod risks;
pub mod stale_prs;

use chrono::{DateTime, Utc};

/// Repositories no report should nag about.
pub(crate) const IGNORED_REPOS: &[&str] = &["design-tokens"];

/// Whole days between a past timestamp and now.
pub(crate) fn days_old(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - timestamp).num_days()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_days_old() {
        let now = Utc::now();
        assert_eq!(days_old(now - chrono::Duration::days(9), now), 9);
        assert_eq!(days_old(now, now), 0);
    }
}
