//! Week-old open pull requests, grouped by repository.

use chrono::{DateTime, Duration, Utc};
use tracing::info;

use chores_github::{GithubClient, PullRequest, RepoWithPrs};
use chores_slack::{header, section, Block, SlackWebhook};

use super::{days_old, IGNORED_REPOS};
use crate::error::Result;

const STALE_AFTER_DAYS: i64 = 7;

/// PRs untouched for a week, per non-archived repository.
pub fn stale_by_repo(
    repos: Vec<RepoWithPrs>,
    now: DateTime<Utc>,
) -> Vec<(String, Vec<PullRequest>)> {
    let cutoff = now - Duration::days(STALE_AFTER_DAYS);

    repos
        .into_iter()
        .filter(|repo| !repo.is_archived && !IGNORED_REPOS.contains(&repo.name.as_str()))
        .filter_map(|repo| {
            let stale: Vec<PullRequest> = repo
                .pull_requests
                .nodes
                .into_iter()
                .filter(|pr| pr.updated_at < cutoff)
                .collect();
            (!stale.is_empty()).then_some((repo.name, stale))
        })
        .collect()
}

/// Report blocks: a header with the total, one section per repository.
pub fn blocks(stale: &[(String, Vec<PullRequest>)], now: DateTime<Utc>) -> Vec<Block> {
    let count: usize = stale.iter().map(|(_, prs)| prs.len()).sum();

    let mut blocks = vec![header(format!(
        "There are {count} pull requests older than a week. Merge or close?"
    ))];
    for (repo, prs) in stale {
        let lines: Vec<String> = prs
            .iter()
            .map(|pr| {
                format!(
                    "- <{}|{}> ({} days ago)",
                    pr.permalink,
                    pr.title,
                    days_old(pr.updated_at, now)
                )
            })
            .collect();
        blocks.push(section(format!("*{repo}:*\n{}", lines.join("\n"))));
    }

    blocks
}

/// Query, filter and post; logs and skips the post when nothing is stale.
pub async fn run(
    client: &GithubClient,
    webhook: &SlackWebhook,
    org: &str,
    team: &str,
) -> Result<()> {
    let repos = client.team_pull_requests(org, team).await?;

    let now = Utc::now();
    let stale = stale_by_repo(repos, now);
    let count: usize = stale.iter().map(|(_, prs)| prs.len()).sum();
    if count == 0 {
        info!("found no week-old pull requests");
        return Ok(());
    }

    info!(count, "found pull requests older than a week");
    webhook.post_blocks(blocks(&stale, now)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chores_github::Connection;

    fn repo(name: &str, archived: bool, pr_ages_days: &[i64]) -> RepoWithPrs {
        let now = Utc::now();
        RepoWithPrs {
            name: name.to_string(),
            is_archived: archived,
            url: format!("https://github.com/acme/{name}"),
            pull_requests: Connection {
                nodes: pr_ages_days
                    .iter()
                    .map(|age| PullRequest {
                        title: format!("bump something ({age}d)"),
                        updated_at: now - Duration::days(*age),
                        permalink: format!("https://github.com/acme/{name}/pull/{age}"),
                    })
                    .collect(),
            },
        }
    }

    #[test]
    fn test_only_week_old_prs_count() {
        let now = Utc::now();
        let stale = stale_by_repo(vec![repo("svc-a", false, &[1, 6, 8, 30])], now);

        assert_eq!(stale.len(), 1);
        assert_eq!(stale[0].0, "svc-a");
        assert_eq!(stale[0].1.len(), 2);
    }

    #[test]
    fn test_archived_repos_are_skipped() {
        let now = Utc::now();
        let stale = stale_by_repo(
            vec![repo("svc-a", true, &[30]), repo("svc-b", false, &[30])],
            now,
        );

        assert_eq!(stale.len(), 1);
        assert_eq!(stale[0].0, "svc-b");
    }

    #[test]
    fn test_repos_without_stale_prs_are_dropped() {
        let now = Utc::now();
        let stale = stale_by_repo(vec![repo("svc-a", false, &[1, 2])], now);
        assert!(stale.is_empty());
    }

    #[test]
    fn test_blocks_have_header_and_one_section_per_repo() {
        let now = Utc::now();
        let stale = stale_by_repo(
            vec![repo("svc-a", false, &[10]), repo("svc-b", false, &[8, 9])],
            now,
        );
        let blocks = blocks(&stale, now);

        assert_eq!(blocks.len(), 3);
        let json = serde_json::to_string(&blocks[0]).unwrap();
        assert!(json.contains("3 pull requests"));
        let repo_section = serde_json::to_string(&blocks[2]).unwrap();
        assert!(repo_section.contains("*svc-b:*"));
        assert!(repo_section.contains("(8 days ago)"));
    }
}
