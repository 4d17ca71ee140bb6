//! Digest-update driver: detect drift, or commit and push the pin.
//!
//! The workflow runs as two CI jobs sharing one logical run. The detect
//! job rewrites every relevant mirror's descriptor with the freshly
//! resolved digest and reports whether anything actually changed through
//! the job output channel. The apply job, gated on a human approval, gets
//! the *same* digest passed back in explicitly (never re-resolved, so the
//! value that was detected is the value that gets committed) and pushes
//! the rewrite out per repository.

use futures::future;
use tracing::{error, info};

use chores_github::TeamRepo;
use chores_slack::{header, section, Block};

use crate::descriptor::{self, BUILD_DESCRIPTOR};
use crate::error::{ChoresError, Result};
use crate::mirror::MirrorStore;

/// Fixed message for the automated pin commits.
pub const COMMIT_MESSAGE: &str = "automated: update base image to newest digest";

/// The two mutually exclusive driver modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Rewrite mirrors and report drift, without committing anything.
    Detect,
    /// Re-apply a previously detected digest, commit and push.
    Apply,
}

/// Resolve the mode from the two CLI flags.
///
/// Passing both or neither is a usage error, raised before any network or
/// filesystem work happens.
pub fn select_mode(has_new_digest: bool, make_changes: bool) -> Result<Mode> {
    match (has_new_digest, make_changes) {
        (true, false) => Ok(Mode::Detect),
        (false, true) => Ok(Mode::Apply),
        (false, false) => Err(ChoresError::Usage(
            "missing --has-new-digest or --make-changes flag".to_string(),
        )),
        (true, true) => Err(ChoresError::Usage(
            "--has-new-digest and --make-changes are mutually exclusive".to_string(),
        )),
    }
}

/// Result of a detect run, threaded to the apply job via job outputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestOutcome {
    pub has_changed: bool,
    pub digest: String,
    pub changed_repos: usize,
}

/// Narrow a team's repositories down to the ones this image applies to:
/// non-archived, mirrored, and with a build descriptor whose first `FROM`
/// line mentions the image. Syncs every candidate mirror as a side effect.
pub async fn filter_relevant(
    mirrors: &MirrorStore,
    repos: Vec<TeamRepo>,
    image: &str,
) -> Result<Vec<String>> {
    let names: Vec<String> = repos
        .into_iter()
        .filter(|repo| !repo.is_archived)
        .map(|repo| repo.name)
        .collect();
    info!(count = names.len(), "found non-archived repositories");

    mirrors.sync_all(&names).await?;

    let mut relevant = Vec::new();
    for name in names {
        let path = mirrors.path_for(&name).join(BUILD_DESCRIPTOR);
        if !path.exists() {
            info!(repo = %name, "no Dockerfile found, skipping");
            continue;
        }

        let content = tokio::fs::read_to_string(&path).await?;
        if descriptor::references_image(&content, image) {
            relevant.push(name);
        } else {
            info!(
                repo = %name,
                base = descriptor::first_from_line(&content).unwrap_or(""),
                "image not relevant, skipping"
            );
        }
    }

    Ok(relevant)
}

/// Pin every relevant mirror's descriptor to the digest.
async fn rewrite_all(
    mirrors: &MirrorStore,
    repos: &[String],
    image: &str,
    digest: &str,
) -> Result<()> {
    future::try_join_all(repos.iter().map(|repo| async move {
        let path = mirrors.path_for(repo).join(BUILD_DESCRIPTOR);
        let content = tokio::fs::read_to_string(&path).await?;
        tokio::fs::write(&path, descriptor::pin_base_image(&content, image, digest)).await?;
        info!(%repo, "updated Dockerfile");
        Ok::<(), ChoresError>(())
    }))
    .await?;

    Ok(())
}

/// Detect mode: rewrite, then count mirrors whose working tree changed.
///
/// Running this twice against mirrors that already carry the digest
/// reports zero changes the second time.
pub async fn detect(
    mirrors: &MirrorStore,
    repos: &[String],
    image: &str,
    digest: &str,
) -> Result<DigestOutcome> {
    rewrite_all(mirrors, repos, image, digest).await?;

    let counts = future::try_join_all(
        repos
            .iter()
            .map(|repo| mirrors.changed_file_count(repo)),
    )
    .await?;
    let changed_repos = counts.into_iter().filter(|count| *count > 0).count();

    if changed_repos > 0 {
        info!(changed_repos, "found changes");
    } else {
        info!("no digests changed");
    }

    Ok(DigestOutcome {
        has_changed: changed_repos > 0,
        digest: digest.to_string(),
        changed_repos,
    })
}

/// Apply mode: re-apply the rewrite, then stage, commit and push each
/// changed repository.
///
/// Repositories are pushed independently and in parallel; one failure
/// neither blocks nor rolls back the others. Every failure is logged as it
/// happens, and the run fails at the end if any repository could not be
/// pushed. Returns the number of repositories pushed.
pub async fn apply(
    mirrors: &MirrorStore,
    repos: &[String],
    image: &str,
    digest: &str,
) -> Result<usize> {
    rewrite_all(mirrors, repos, image, digest).await?;

    let outcomes = future::join_all(repos.iter().map(|repo| async move {
        let result = push_one(mirrors, repo).await;
        (repo.as_str(), result)
    }))
    .await;

    let mut pushed = 0;
    let mut failed = Vec::new();
    for (repo, result) in outcomes {
        match result {
            Ok(true) => pushed += 1,
            Ok(false) => info!(%repo, "already up to date, nothing to push"),
            Err(e) => {
                error!(%repo, error = %e, "failed to commit and push");
                failed.push(repo.to_string());
            }
        }
    }

    if !failed.is_empty() {
        return Err(ChoresError::Git(format!(
            "push failed for {} of {} repositories: {}",
            failed.len(),
            repos.len(),
            failed.join(", ")
        )));
    }

    info!(pushed, "pushed changes");
    Ok(pushed)
}

/// Stage, commit and push one mirror; `Ok(false)` when its working tree
/// carries no change.
async fn push_one(mirrors: &MirrorStore, repo: &str) -> Result<bool> {
    if mirrors.changed_file_count(repo).await? == 0 {
        return Ok(false);
    }

    mirrors.stage(repo, BUILD_DESCRIPTOR).await?;
    mirrors.commit(repo, COMMIT_MESSAGE).await?;
    mirrors.push(repo).await?;
    info!(%repo, "committed and pushed");
    Ok(true)
}

/// Slack notification for a detected digest change.
pub fn notification_blocks(
    image: &str,
    outcome: &DigestOutcome,
    run_url: Option<&str>,
) -> Vec<Block> {
    let mut blocks = vec![
        header(format!("New base image digest for {image}!")),
        section(format!(
            "`{}`\n\nThis version needs to be rolled out to {} repositories",
            outcome.digest, outcome.changed_repos
        )),
        section(format!(
            "Verify that this digest matches the \"latest\" tag of {image}"
        )),
    ];

    if let Some(url) = run_url {
        blocks.push(section(format!(
            "If everything looks good, approve the rollout at {url}"
        )));
    }

    blocks
}

/// Step summary lines for the CI job log.
pub fn summary_lines(image: &str, outcome: &DigestOutcome) -> Vec<String> {
    if outcome.has_changed {
        vec![
            format!("The new digest is: `{}`", outcome.digest),
            format!(
                "There are {} repos that need the new digest",
                outcome.changed_repos
            ),
            String::new(),
            format!("Visit {image} and verify the digest on the \"latest\" tag."),
        ]
    } else {
        vec![
            format!("The digest is {}", outcome.digest),
            "It hasn't changed since last time".to_string(),
        ]
    }
}
