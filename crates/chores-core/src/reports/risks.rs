//! Open vulnerability alerts, grouped by severity and repository.
//!
//! Unlike the other reports this one always posts: either the grouped
//! findings or an explicit all-clear, so an empty channel day still shows
//! the job ran.

use chrono::{DateTime, Utc};
use tracing::info;

use chores_github::{GithubClient, RepoWithAlerts, VulnerabilityAlert};
use chores_slack::{header, section, Block, SlackWebhook};

use super::days_old;
use crate::error::{ChoresError, Result};

/// Alert severities, least severe first.
pub const VALID_LEVELS: &[&str] = &["LOW", "MODERATE", "HIGH", "CRITICAL"];

/// Parse and validate the `--levels=LOW,MODERATE,...` argument.
pub fn parse_levels(arg: Option<&str>) -> Result<Vec<String>> {
    let arg = arg.ok_or_else(|| ChoresError::Usage("no --levels argument given".to_string()))?;

    let levels: Vec<String> = arg
        .split(',')
        .map(|level| level.trim().to_string())
        .filter(|level| !level.is_empty())
        .collect();
    if levels.is_empty() {
        return Err(ChoresError::Usage("no --levels argument given".to_string()));
    }

    if let Some(invalid) = levels.iter().find(|l| !VALID_LEVELS.contains(&l.as_str())) {
        return Err(ChoresError::Usage(format!(
            "invalid level {invalid}, valid: {}",
            VALID_LEVELS.join(", ")
        )));
    }

    Ok(levels)
}

/// One repository's alerts at a single severity.
#[derive(Debug, Clone)]
pub struct RepoAlerts {
    pub name: String,
    pub url: String,
    pub alerts: Vec<VulnerabilityAlert>,
}

/// Group open alerts by severity (most severe first), then by repository.
/// Only requested levels and non-archived repositories are considered.
pub fn by_severity(
    repos: &[RepoWithAlerts],
    levels: &[String],
) -> Vec<(String, Vec<RepoAlerts>)> {
    let mut grouped = Vec::new();

    for level in VALID_LEVELS.iter().rev() {
        if !levels.iter().any(|l| l == level) {
            continue;
        }

        let mut repo_groups = Vec::new();
        for repo in repos {
            if repo.is_archived {
                continue;
            }
            let alerts: Vec<VulnerabilityAlert> = repo
                .vulnerability_alerts
                .nodes
                .iter()
                .filter(|alert| alert.security_vulnerability.severity == *level)
                .cloned()
                .collect();
            if !alerts.is_empty() {
                repo_groups.push(RepoAlerts {
                    name: repo.name.clone(),
                    url: repo.url.clone(),
                    alerts,
                });
            }
        }

        if !repo_groups.is_empty() {
            grouped.push((level.to_string(), repo_groups));
        }
    }

    grouped
}

fn level_emoji(level: &str) -> &'static str {
    match level {
        "LOW" => ":large_blue_circle:",
        "MODERATE" => ":large_yellow_circle:",
        "HIGH" => ":large_orange_circle:",
        "CRITICAL" => ":red_circle:",
        _ => "",
    }
}

/// One mrkdwn line for an alert, linking the dependabot issue and the
/// advisory.
pub fn alert_line(alert: &VulnerabilityAlert, repo_url: &str, now: DateTime<Utc>) -> String {
    let vulnerability = &alert.security_vulnerability;
    let fix = vulnerability
        .first_patched_version
        .as_ref()
        .map(|version| format!("Fixed in *{}*", version.identifier))
        .unwrap_or_else(|| "NO FIX".to_string());

    format!(
        "{}: {}@{}, {} days old\n\t\t{} <{}/security/dependabot/{}|alert>, <{}|advisory>",
        vulnerability.package.ecosystem,
        vulnerability.package.name,
        vulnerability.vulnerable_version_range,
        days_old(alert.created_at, now),
        fix,
        repo_url,
        alert.number,
        vulnerability.advisory.permalink,
    )
}

/// Report blocks: a header per severity, then per repository its name and
/// alert lines.
pub fn blocks(grouped: &[(String, Vec<RepoAlerts>)], now: DateTime<Utc>) -> Vec<Block> {
    let mut blocks = Vec::new();

    for (level, repo_groups) in grouped {
        blocks.push(header(format!(
            "Vulnerabilities at level {level} {}",
            level_emoji(level)
        )));
        for group in repo_groups {
            let lines: Vec<String> = group
                .alerts
                .iter()
                .map(|alert| alert_line(alert, &group.url, now))
                .collect();
            blocks.push(section(format!("*{}*", group.name)));
            blocks.push(section(lines.join("\n")));
        }
    }

    blocks
}

/// The all-clear message for days with no findings.
pub fn all_clear_blocks(levels: &[String]) -> Vec<Block> {
    vec![section(format!(
        ":white_check_mark: No vulnerabilities found today for levels {} :white_check_mark:",
        levels.join(", ")
    ))]
}

/// Query, group and post.
pub async fn run(
    client: &GithubClient,
    webhook: &SlackWebhook,
    org: &str,
    team: &str,
    levels: &[String],
) -> Result<()> {
    let repos = client.team_vulnerability_alerts(org, team).await?;

    let now = Utc::now();
    let grouped = by_severity(&repos, levels);
    if grouped.is_empty() {
        info!("no vulnerabilities at the requested levels");
        webhook.post_blocks(all_clear_blocks(levels)).await?;
        return Ok(());
    }

    let total: usize = grouped
        .iter()
        .flat_map(|(_, groups)| groups.iter().map(|g| g.alerts.len()))
        .sum();
    info!(total, "found vulnerabilities");
    webhook.post_blocks(blocks(&grouped, now)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chores_github::queries::{
        Advisory, Connection, PatchedVersion, SecurityVulnerability, VulnerablePackage,
    };

    fn alert(severity: &str, package: &str, patched: Option<&str>) -> VulnerabilityAlert {
        VulnerabilityAlert {
            created_at: Utc::now() - chrono::Duration::days(4),
            number: 12,
            security_vulnerability: SecurityVulnerability {
                severity: severity.to_string(),
                vulnerable_version_range: "< 2.0.0".to_string(),
                package: VulnerablePackage {
                    ecosystem: "NPM".to_string(),
                    name: package.to_string(),
                },
                first_patched_version: patched.map(|identifier| PatchedVersion {
                    identifier: identifier.to_string(),
                }),
                advisory: Advisory {
                    permalink: "https://github.com/advisories/GHSA-x".to_string(),
                },
            },
        }
    }

    fn repo(name: &str, archived: bool, alerts: Vec<VulnerabilityAlert>) -> RepoWithAlerts {
        RepoWithAlerts {
            name: name.to_string(),
            is_archived: archived,
            url: format!("https://github.com/acme/{name}"),
            vulnerability_alerts: Connection { nodes: alerts },
        }
    }

    fn levels(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_levels_accepts_valid_combinations() {
        assert_eq!(
            parse_levels(Some("HIGH,CRITICAL")).unwrap(),
            vec!["HIGH".to_string(), "CRITICAL".to_string()]
        );
    }

    #[test]
    fn test_parse_levels_rejects_invalid_and_missing() {
        assert!(matches!(
            parse_levels(Some("HIGH,BOGUS")),
            Err(ChoresError::Usage(_))
        ));
        assert!(matches!(parse_levels(None), Err(ChoresError::Usage(_))));
        assert!(matches!(parse_levels(Some("")), Err(ChoresError::Usage(_))));
    }

    #[test]
    fn test_by_severity_filters_levels_and_archived() {
        let repos = vec![
            repo("svc-a", false, vec![alert("HIGH", "left-pad", None)]),
            repo("svc-b", false, vec![alert("LOW", "chalk", Some("5.0.0"))]),
            repo("svc-c", true, vec![alert("HIGH", "lodash", None)]),
        ];

        let grouped = by_severity(&repos, &levels(&["HIGH", "CRITICAL"]));
        assert_eq!(grouped.len(), 1);
        assert_eq!(grouped[0].0, "HIGH");
        assert_eq!(grouped[0].1.len(), 1);
        assert_eq!(grouped[0].1[0].name, "svc-a");
    }

    #[test]
    fn test_by_severity_orders_most_severe_first() {
        let repos = vec![
            repo("svc-a", false, vec![alert("MODERATE", "a", None)]),
            repo("svc-b", false, vec![alert("CRITICAL", "b", None)]),
        ];

        let grouped = by_severity(&repos, &levels(&["MODERATE", "CRITICAL"]));
        assert_eq!(grouped[0].0, "CRITICAL");
        assert_eq!(grouped[1].0, "MODERATE");
    }

    #[test]
    fn test_alert_line_mentions_fix_or_no_fix() {
        let now = Utc::now();
        let fixed = alert_line(
            &alert("HIGH", "left-pad", Some("2.0.0")),
            "https://github.com/acme/svc-a",
            now,
        );
        assert!(fixed.contains("Fixed in *2.0.0*"));
        assert!(fixed.contains("NPM: left-pad@< 2.0.0"));
        assert!(fixed.contains("4 days old"));
        assert!(fixed.contains("/security/dependabot/12|alert>"));

        let unfixed = alert_line(
            &alert("HIGH", "left-pad", None),
            "https://github.com/acme/svc-a",
            now,
        );
        assert!(unfixed.contains("NO FIX"));
    }

    #[test]
    fn test_all_clear_mentions_levels() {
        let blocks = all_clear_blocks(&levels(&["HIGH", "CRITICAL"]));
        let json = serde_json::to_string(&blocks).unwrap();
        assert!(json.contains("HIGH, CRITICAL"));
    }
}
