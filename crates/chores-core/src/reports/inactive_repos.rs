//! Repositories with no pushes for months.

use chrono::{DateTime, Months, Utc};
use tracing::info;

use chores_github::{GithubClient, TeamRepo};
use chores_slack::{section, Block, SlackWebhook};

use crate::error::Result;

const INACTIVE_MONTHS: u32 = 3;

/// Non-archived repositories whose last push is older than the cutoff,
/// oldest first. A repository that has never been pushed to counts as
/// inactive.
pub fn inactive(repos: Vec<TeamRepo>, now: DateTime<Utc>) -> Vec<TeamRepo> {
    let cutoff = now - Months::new(INACTIVE_MONTHS);

    let mut old: Vec<TeamRepo> = repos
        .into_iter()
        .filter(|repo| !repo.is_archived)
        .filter(|repo| match repo.pushed_at {
            Some(pushed_at) => pushed_at < cutoff,
            None => true,
        })
        .collect();
    old.sort_by_key(|repo| repo.pushed_at);
    old
}

/// Report blocks: a prompt plus the repository list.
pub fn blocks(repos: &[TeamRepo]) -> Vec<Block> {
    let list: Vec<String> = repos
        .iter()
        .map(|repo| format!("- {}: {}", repo.name, repo.url))
        .collect();

    vec![
        section(format!(
            "Found {} repos without a single commit in {INACTIVE_MONTHS} months. \
             Time to update or archive?",
            repos.len()
        )),
        section(list.join("\n")),
    ]
}

/// Query, filter and post; logs and skips the post when every repo is
/// active.
pub async fn run(
    client: &GithubClient,
    webhook: &SlackWebhook,
    org: &str,
    team: &str,
) -> Result<()> {
    let repos = client.team_repositories(org, team).await?;

    let old = inactive(repos, Utc::now());
    if old.is_empty() {
        info!("found no inactive repos");
        return Ok(());
    }

    info!(count = old.len(), "found inactive repos");
    webhook.post_blocks(blocks(&old)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn repo(name: &str, archived: bool, pushed_days_ago: Option<i64>) -> TeamRepo {
        TeamRepo {
            name: name.to_string(),
            is_archived: archived,
            pushed_at: pushed_days_ago.map(|days| Utc::now() - Duration::days(days)),
            url: format!("https://github.com/acme/{name}"),
        }
    }

    #[test]
    fn test_only_old_non_archived_repos_count() {
        let old = inactive(
            vec![
                repo("fresh", false, Some(5)),
                repo("old", false, Some(200)),
                repo("old-archived", true, Some(200)),
            ],
            Utc::now(),
        );

        assert_eq!(old.len(), 1);
        assert_eq!(old[0].name, "old");
    }

    #[test]
    fn test_sorted_oldest_first_with_never_pushed_leading() {
        let old = inactive(
            vec![
                repo("older", false, Some(200)),
                repo("oldest", false, Some(400)),
                repo("never-pushed", false, None),
            ],
            Utc::now(),
        );

        let names: Vec<&str> = old.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["never-pushed", "oldest", "older"]);
    }

    #[test]
    fn test_blocks_list_every_repo() {
        let old = vec![repo("a", false, Some(100)), repo("b", false, Some(120))];
        let blocks = blocks(&old);

        assert_eq!(blocks.len(), 2);
        let json = serde_json::to_string(&blocks).unwrap();
        assert!(json.contains("2 repos"));
        assert!(json.contains("- a: https://github.com/acme/a"));
    }
}
