//! Weekly dependency duty: who bumps dependencies, and where.
//!
//! Backend duty rotates every week; frontend duty runs on odd ISO weeks
//! only (the frontend repo set is small enough that every other week
//! keeps up).

use chrono::NaiveDate;
use tracing::info;

use chores_github::{GithubClient, RepoWithLanguage};
use chores_slack::{section, Block, SlackWebhook};

use super::IGNORED_REPOS;
use crate::error::Result;
use crate::rotation::{odd_week_pick, weekly_pick};

const BACKEND_ROSTER: &[&str] = &["perols", "jkleven", "mgaustad", "tsandvik"];
const FRONTEND_ROSTER: &[&str] = &["ameidell", "oyvindhn"];

/// The two repo groups duty is split across, by primary language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepoGroup {
    Backend,
    Frontend,
}

impl RepoGroup {
    fn languages(self) -> &'static [&'static str] {
        match self {
            RepoGroup::Backend => &["Kotlin", "Rust"],
            RepoGroup::Frontend => &["TypeScript", "JavaScript"],
        }
    }

    fn label(self) -> &'static str {
        match self {
            RepoGroup::Backend => "backend",
            RepoGroup::Frontend => "frontend",
        }
    }
}

/// This week's person for a group, or `None` on the frontend's off weeks.
pub fn on_duty(group: RepoGroup, today: NaiveDate) -> Option<&'static str> {
    match group {
        RepoGroup::Backend => Some(weekly_pick(today, BACKEND_ROSTER)),
        RepoGroup::Frontend => odd_week_pick(today, FRONTEND_ROSTER),
    }
}

/// A group repository with its open dependabot PR count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveRepo {
    pub name: String,
    pub url: String,
    pub dependabot_prs: usize,
}

/// The group's non-archived repositories, most open dependabot PRs first.
pub fn active_repos(repos: Vec<RepoWithLanguage>, group: RepoGroup) -> Vec<ActiveRepo> {
    let mut active: Vec<ActiveRepo> = repos
        .into_iter()
        .filter(|repo| !repo.is_archived && !IGNORED_REPOS.contains(&repo.name.as_str()))
        .filter(|repo| {
            repo.primary_language
                .as_ref()
                .is_some_and(|language| group.languages().contains(&language.name.as_str()))
        })
        .map(|repo| {
            let dependabot_prs = repo
                .pull_requests
                .nodes
                .iter()
                .filter(|pr| {
                    pr.author
                        .as_ref()
                        .is_some_and(|author| author.login.contains("dependabot"))
                })
                .count();
            ActiveRepo {
                name: repo.name,
                url: repo.url,
                dependabot_prs,
            }
        })
        .collect();

    active.sort_by(|a, b| b.dependabot_prs.cmp(&a.dependabot_prs));
    active
}

/// Report blocks: the duty announcement plus the repo list.
pub fn blocks(person: &str, group: RepoGroup, repos: &[ActiveRepo]) -> Vec<Block> {
    let label = group.label();
    let mut blocks = vec![section(format!(
        "This week's {label} dependency duty goes to <https://github.com/{person}|{person}>"
    ))];

    if !repos.is_empty() {
        let list: Vec<String> = repos
            .iter()
            .map(|repo| {
                if repo.dependabot_prs > 0 {
                    format!(
                        "- <{}|{}> ({} open dependabot PRs)",
                        repo.url, repo.name, repo.dependabot_prs
                    )
                } else {
                    format!("- <{}|{}> :white_check_mark:", repo.url, repo.name)
                }
            })
            .collect();
        blocks.push(section(format!("Active {label} repos:")));
        blocks.push(section(list.join("\n")));
    }

    blocks
}

/// Query, pick and post; logs and skips the post on off weeks.
pub async fn run(
    client: &GithubClient,
    webhook: &SlackWebhook,
    org: &str,
    team: &str,
    group: RepoGroup,
    today: NaiveDate,
) -> Result<()> {
    let Some(person) = on_duty(group, today) else {
        info!(group = group.label(), "off week, no duty to announce");
        return Ok(());
    };

    let repos = client.team_repos_by_language(org, team).await?;
    let active = active_repos(repos, group);

    info!(group = group.label(), person, repos = active.len(), "announcing duty");
    webhook.post_blocks(blocks(person, group, &active)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chores_github::queries::{Connection, Language, PrAuthor, PrAuthorNode};
    use chrono::Weekday;

    fn repo(
        name: &str,
        archived: bool,
        language: Option<&str>,
        pr_authors: &[&str],
    ) -> RepoWithLanguage {
        RepoWithLanguage {
            name: name.to_string(),
            is_archived: archived,
            url: format!("https://github.com/acme/{name}"),
            primary_language: language.map(|name| Language {
                name: name.to_string(),
            }),
            pull_requests: Connection {
                nodes: pr_authors
                    .iter()
                    .map(|login| PrAuthorNode {
                        author: Some(PrAuthor {
                            login: login.to_string(),
                        }),
                    })
                    .collect(),
            },
        }
    }

    #[test]
    fn test_active_repos_filters_by_language_group() {
        let active = active_repos(
            vec![
                repo("api", false, Some("Kotlin"), &[]),
                repo("worker", false, Some("Rust"), &[]),
                repo("web", false, Some("TypeScript"), &[]),
                repo("docs", false, None, &[]),
            ],
            RepoGroup::Backend,
        );

        let names: Vec<&str> = active.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["api", "worker"]);
    }

    #[test]
    fn test_active_repos_sorted_by_dependabot_pr_count() {
        let active = active_repos(
            vec![
                repo("quiet", false, Some("Rust"), &["alice"]),
                repo("noisy", false, Some("Rust"), &["dependabot[bot]", "dependabot[bot]"]),
                repo("medium", false, Some("Kotlin"), &["dependabot[bot]", "bob"]),
            ],
            RepoGroup::Backend,
        );

        let counts: Vec<(&str, usize)> = active
            .iter()
            .map(|r| (r.name.as_str(), r.dependabot_prs))
            .collect();
        assert_eq!(counts, vec![("noisy", 2), ("medium", 1), ("quiet", 0)]);
    }

    #[test]
    fn test_active_repos_skips_ignored_and_archived() {
        let active = active_repos(
            vec![
                repo("design-tokens", false, Some("TypeScript"), &[]),
                repo("archived-web", true, Some("TypeScript"), &[]),
                repo("web", false, Some("JavaScript"), &[]),
            ],
            RepoGroup::Frontend,
        );

        let names: Vec<&str> = active.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["web"]);
    }

    #[test]
    fn test_handles_deleted_pr_authors() {
        let repos = vec![RepoWithLanguage {
            name: "api".to_string(),
            is_archived: false,
            url: "https://github.com/acme/api".to_string(),
            primary_language: Some(Language {
                name: "Kotlin".to_string(),
            }),
            pull_requests: Connection {
                nodes: vec![PrAuthorNode { author: None }],
            },
        }];

        let active = active_repos(repos, RepoGroup::Backend);
        assert_eq!(active[0].dependabot_prs, 0);
    }

    #[test]
    fn test_frontend_duty_skips_even_weeks() {
        let even_week = NaiveDate::from_isoywd_opt(2023, 8, Weekday::Mon).unwrap();
        assert_eq!(on_duty(RepoGroup::Frontend, even_week), None);
        assert!(on_duty(RepoGroup::Backend, even_week).is_some());

        let odd_week = NaiveDate::from_isoywd_opt(2023, 9, Weekday::Mon).unwrap();
        assert!(on_duty(RepoGroup::Frontend, odd_week).is_some());
    }

    #[test]
    fn test_blocks_flag_repos_with_open_prs() {
        let repos = vec![
            ActiveRepo {
                name: "noisy".to_string(),
                url: "https://github.com/acme/noisy".to_string(),
                dependabot_prs: 3,
            },
            ActiveRepo {
                name: "quiet".to_string(),
                url: "https://github.com/acme/quiet".to_string(),
                dependabot_prs: 0,
            },
        ];

        let blocks = blocks("perols", RepoGroup::Backend, &repos);
        assert_eq!(blocks.len(), 3);
        let json = serde_json::to_string(&blocks).unwrap();
        assert!(json.contains("(3 open dependabot PRs)"));
        assert!(json.contains("quiet> :white_check_mark:"));
        assert!(json.contains("<https://github.com/perols|perols>"));
    }
}
