//! Repositories with missing or broken CODEOWNERS files.

use tracing::info;

use chores_github::{GithubClient, RepoWithCodeowners};
use chores_slack::{header, section, Block, SlackWebhook};

use crate::error::Result;

/// One repository's CODEOWNERS problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeownersIssue {
    pub name: String,
    pub url: String,
    pub error: String,
}

/// Non-archived repositories whose CODEOWNERS file is missing entirely or
/// fails validation.
pub fn issues(repos: Vec<RepoWithCodeowners>) -> Vec<CodeownersIssue> {
    repos
        .into_iter()
        .filter(|repo| !repo.is_archived)
        .filter_map(|repo| {
            let error = match &repo.codeowners {
                None => Some("Missing CODEOWNERS file".to_string()),
                Some(codeowners) if !codeowners.errors.is_empty() => Some(
                    codeowners
                        .errors
                        .iter()
                        .map(|e| e.message.clone())
                        .collect::<Vec<_>>()
                        .join("\n"),
                ),
                Some(_) => None,
            };
            error.map(|error| CodeownersIssue {
                name: repo.name,
                url: repo.url,
                error,
            })
        })
        .collect()
}

/// Report blocks; multi-line validation errors are fenced.
pub fn blocks(issues: &[CodeownersIssue]) -> Vec<Block> {
    let lines: Vec<String> = issues
        .iter()
        .map(|issue| {
            if issue.error.contains('\n') {
                format!("- <{}|{}>: ```{}```", issue.url, issue.name, issue.error)
            } else {
                format!("- <{}|{}>: {}", issue.url, issue.name, issue.error)
            }
        })
        .collect();

    vec![
        header(format!(
            "{} repos are having trouble with CODEOWNERS",
            issues.len()
        )),
        section(lines.join("\n")),
    ]
}

/// Query, filter and post; logs and skips the post when everything is
/// healthy.
pub async fn run(
    client: &GithubClient,
    webhook: &SlackWebhook,
    org: &str,
    team: &str,
) -> Result<()> {
    let repos = client.team_codeowners(org, team).await?;

    let found = issues(repos);
    if found.is_empty() {
        info!("found no repos with CODEOWNERS issues");
        return Ok(());
    }

    info!(count = found.len(), "found repos with CODEOWNERS issues");
    webhook.post_blocks(blocks(&found)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chores_github::{Codeowners, CodeownersError};

    fn repo(name: &str, archived: bool, codeowners: Option<Vec<&str>>) -> RepoWithCodeowners {
        RepoWithCodeowners {
            name: name.to_string(),
            is_archived: archived,
            url: format!("https://github.com/acme/{name}"),
            codeowners: codeowners.map(|errors| Codeowners {
                errors: errors
                    .into_iter()
                    .map(|message| CodeownersError {
                        message: message.to_string(),
                    })
                    .collect(),
            }),
        }
    }

    #[test]
    fn test_missing_file_and_validation_errors_are_issues() {
        let found = issues(vec![
            repo("healthy", false, Some(vec![])),
            repo("missing", false, None),
            repo("broken", false, Some(vec!["Unknown owner on line 3"])),
            repo("archived-missing", true, None),
        ]);

        assert_eq!(found.len(), 2);
        assert_eq!(found[0].name, "missing");
        assert_eq!(found[0].error, "Missing CODEOWNERS file");
        assert_eq!(found[1].name, "broken");
        assert_eq!(found[1].error, "Unknown owner on line 3");
    }

    #[test]
    fn test_multiline_errors_are_fenced_in_blocks() {
        let found = issues(vec![repo(
            "broken",
            false,
            Some(vec!["Unknown owner on line 3", "Unknown owner on line 7"]),
        )]);
        let blocks = blocks(&found);

        let json = serde_json::to_string(&blocks[1]).unwrap();
        assert!(json.contains("```"));
    }
}
