//! Local repository mirrors.
//!
//! Each team repository gets a shallow working copy at a deterministic path
//! under the cache root, used only as a staging area for automated edits.
//! A sync converges the copy to the remote tip: clone on first use, forced
//! reset + clean + rebase-pull afterwards. The cache directory is assumed
//! single-writer; two concurrent runs against the same cache are not
//! supported.

use std::path::{Path, PathBuf};
use std::time::Instant;

use futures::stream::{self, StreamExt, TryStreamExt};
use tokio::process::Command;
use tracing::info;

use crate::error::{ChoresError, Result};

/// Ceiling on simultaneous git subprocesses during bulk sync.
const MAX_CONCURRENT_SYNCS: usize = 10;

const COMMIT_USER_NAME: &str = "team-platform-automation[bot]";
const COMMIT_USER_EMAIL: &str = "github-actions[bot]@users.noreply.github.com";

/// Mirror cache rooted at a fixed directory, one subdirectory per repo.
pub struct MirrorStore {
    root: PathBuf,
    remote_base: String,
}

impl MirrorStore {
    /// Create a store. `remote_base` is the URL prefix remotes are cloned
    /// from; `<remote_base>/<name>` must be a valid git remote.
    pub fn new(root: impl Into<PathBuf>, remote_base: impl Into<String>) -> Self {
        MirrorStore {
            root: root.into(),
            remote_base: remote_base.into(),
        }
    }

    /// Path of a repository's working copy.
    pub fn path_for(&self, repo: &str) -> PathBuf {
        self.root.join(repo)
    }

    /// Sync every repository, at most [`MAX_CONCURRENT_SYNCS`] git
    /// subprocesses at a time. Any single failure fails the whole call.
    pub async fn sync_all(&self, repos: &[String]) -> Result<()> {
        std::fs::create_dir_all(&self.root)?;

        stream::iter(repos.iter().map(|repo| self.sync(repo)))
            .buffer_unordered(MAX_CONCURRENT_SYNCS)
            .try_collect::<Vec<_>>()
            .await?;

        Ok(())
    }

    /// Ensure one repository's working copy exists and matches the remote
    /// default branch tip.
    pub async fn sync(&self, repo: &str) -> Result<()> {
        if self.path_for(repo).exists() {
            self.pull(repo).await
        } else {
            self.clone_repo(repo).await
        }
    }

    async fn clone_repo(&self, repo: &str) -> Result<()> {
        let remote = format!("{}/{}", self.remote_base, repo);

        let started = Instant::now();
        run_git(&self.root, &["clone", "--depth", "1", &remote, repo]).await?;
        info!(
            repo,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "cloned OK"
        );

        Ok(())
    }

    async fn pull(&self, repo: &str) -> Result<()> {
        let dir = self.path_for(repo);

        let started = Instant::now();
        run_git(&dir, &["reset", "--hard", "HEAD"]).await?;
        run_git(&dir, &["clean", "-fdx"]).await?;
        run_git(&dir, &["pull", "--rebase"]).await?;
        info!(
            repo,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "exists, pulled OK"
        );

        Ok(())
    }

    /// Number of changed files in the working tree.
    pub async fn changed_file_count(&self, repo: &str) -> Result<usize> {
        let stdout = run_git(&self.path_for(repo), &["diff", "--name-only"]).await?;
        Ok(stdout.lines().filter(|line| !line.trim().is_empty()).count())
    }

    /// Stage one file.
    pub async fn stage(&self, repo: &str, file: &str) -> Result<()> {
        run_git(&self.path_for(repo), &["add", file]).await?;
        Ok(())
    }

    /// Commit staged changes with the automation identity, bypassing
    /// verification hooks.
    pub async fn commit(&self, repo: &str, message: &str) -> Result<()> {
        let name = format!("user.name={COMMIT_USER_NAME}");
        let email = format!("user.email={COMMIT_USER_EMAIL}");
        let args = [
            "-c",
            name.as_str(),
            "-c",
            email.as_str(),
            "commit",
            "--no-verify",
            "-m",
            message,
        ];
        run_git(&self.path_for(repo), &args).await?;
        Ok(())
    }

    /// Push the current branch to the remote.
    pub async fn push(&self, repo: &str) -> Result<()> {
        run_git(&self.path_for(repo), &["push"]).await?;
        Ok(())
    }
}

/// Run one git command in `dir`, capturing output. A non-zero exit is an
/// error carrying the captured stderr.
async fn run_git(dir: &Path, args: &[&str]) -> Result<String> {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .await
        .map_err(|e| ChoresError::Git(format!("failed to run git: {e}")))?;

    if !output.status.success() {
        let subcommand = subcommand_name(args);
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ChoresError::Git(format!(
            "git {subcommand} failed: {}",
            stderr.trim()
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

/// The git subcommand in an argument list, stepping over `-c key=value`
/// pairs.
fn subcommand_name<'a>(args: &[&'a str]) -> &'a str {
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if *arg == "-c" {
            iter.next();
        } else if !arg.starts_with('-') {
            return arg;
        }
    }
    "?"
}
