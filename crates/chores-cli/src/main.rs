//! chores - scheduled housekeeping jobs for a team's repositories.
//!
//! One subcommand per cron-triggered CI job:
//!
//! - `digest`: detect base-image digest drift, or commit and push the pin
//! - `stale-prs`: report open PRs older than a week
//! - `inactive-repos`: report repositories without recent pushes
//! - `codeowners`: report missing or broken CODEOWNERS files
//! - `risks`: report open vulnerability alerts by severity
//! - `duty`: announce this week's dependency duty
//! - `guard`: announce this week's guard
//!
//! Every job runs to completion or fails the process with exit code 1;
//! nothing is retried.

use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, Level};

use chores_core::reports::duty::RepoGroup;
use chores_core::reports::{codeowners, duty, guard, inactive_repos, risks, stale_prs};
use chores_core::{driver, registry, ChoresError, Config, JobOutputs, MirrorStore, Mode};
use chores_github::GithubClient;
use chores_slack::SlackWebhook;

#[derive(Parser)]
#[command(name = "chores")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Scheduled housekeeping jobs for the team's repositories", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect or roll out base-image digest updates
    Digest {
        /// Detect drift and report it through the job output channel
        #[arg(long)]
        has_new_digest: bool,

        /// Commit and push a previously detected digest
        #[arg(long)]
        make_changes: bool,

        /// Image reference (registry/repo, no tag)
        #[arg(long)]
        image: Option<String>,

        /// Digest to roll out (required with --make-changes)
        #[arg(long)]
        digest: Option<String>,
    },

    /// Report open pull requests older than a week
    StalePrs,

    /// Report repositories without pushes for months
    InactiveRepos,

    /// Report repositories with missing or broken CODEOWNERS files
    Codeowners,

    /// Report open vulnerability alerts
    Risks {
        /// Severities to report, comma separated (LOW,MODERATE,HIGH,CRITICAL)
        #[arg(long)]
        levels: Option<String>,
    },

    /// Announce this week's dependency duty for a repo group
    Duty {
        /// Repo group to announce duty for
        #[arg(value_enum)]
        group: DutyGroup,
    },

    /// Announce this week's guard
    Guard,
}

#[derive(Clone, Copy, ValueEnum)]
enum DutyGroup {
    Backend,
    Frontend,
}

impl From<DutyGroup> for RepoGroup {
    fn from(group: DutyGroup) -> Self {
        match group {
            DutyGroup::Backend => RepoGroup::Backend,
            DutyGroup::Frontend => RepoGroup::Frontend,
        }
    }
}

/// Shared collaborators for the report jobs.
struct Context {
    config: Config,
    github: GithubClient,
    webhook: SlackWebhook,
}

impl Context {
    fn from_env() -> chores_core::Result<Self> {
        let config = Config::from_env()?;
        let github = GithubClient::new(&config.github_token);
        let webhook = SlackWebhook::new(&config.slack_webhook_url);
        Ok(Context {
            config,
            github,
            webhook,
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    chores_core::init_tracing(cli.json, level);

    match cli.command {
        Commands::Digest {
            has_new_digest,
            make_changes,
            image,
            digest,
        } => cmd_digest(has_new_digest, make_changes, image, digest).await,
        Commands::StalePrs => {
            let ctx = Context::from_env()?;
            stale_prs::run(&ctx.github, &ctx.webhook, &ctx.config.org, &ctx.config.team).await?;
            Ok(())
        }
        Commands::InactiveRepos => {
            let ctx = Context::from_env()?;
            inactive_repos::run(&ctx.github, &ctx.webhook, &ctx.config.org, &ctx.config.team)
                .await?;
            Ok(())
        }
        Commands::Codeowners => {
            let ctx = Context::from_env()?;
            codeowners::run(&ctx.github, &ctx.webhook, &ctx.config.org, &ctx.config.team).await?;
            Ok(())
        }
        Commands::Risks { levels } => {
            let levels = risks::parse_levels(levels.as_deref())?;
            let ctx = Context::from_env()?;
            risks::run(
                &ctx.github,
                &ctx.webhook,
                &ctx.config.org,
                &ctx.config.team,
                &levels,
            )
            .await?;
            Ok(())
        }
        Commands::Duty { group } => {
            let ctx = Context::from_env()?;
            duty::run(
                &ctx.github,
                &ctx.webhook,
                &ctx.config.org,
                &ctx.config.team,
                group.into(),
                Utc::now().date_naive(),
            )
            .await?;
            Ok(())
        }
        Commands::Guard => {
            let ctx = Context::from_env()?;
            guard::run(&ctx.webhook, Utc::now().date_naive()).await?;
            Ok(())
        }
    }
}

async fn cmd_digest(
    has_new_digest: bool,
    make_changes: bool,
    image: Option<String>,
    digest: Option<String>,
) -> Result<()> {
    // Usage and configuration errors surface before any network or
    // filesystem work.
    let mode = driver::select_mode(has_new_digest, make_changes)?;
    let image = image
        .ok_or_else(|| ChoresError::Usage("missing --image=<image> flag".to_string()))?;
    let config = Config::from_env()?;

    info!(%image, "using image");

    match mode {
        Mode::Detect => cmd_digest_detect(&config, &image).await,
        Mode::Apply => {
            let digest = digest
                .ok_or_else(|| ChoresError::Usage("missing --digest=<digest> flag".to_string()))?;
            cmd_digest_apply(&config, &image, &digest).await
        }
    }
}

async fn cmd_digest_detect(config: &Config, image: &str) -> Result<()> {
    let outputs = JobOutputs::from_env()?;
    let github = GithubClient::new(&config.github_token);
    let mirrors = MirrorStore::new(config.cache_dir.clone(), config.remote_base());

    let repos = github
        .team_repositories(&config.org, &config.team)
        .await?;
    let relevant = driver::filter_relevant(&mirrors, repos, image).await?;
    let digest = registry::resolve_latest_digest(image).await?;
    let outcome = driver::detect(&mirrors, &relevant, image, &digest).await?;

    outputs.append_output(&[
        format!("digest-changed={}", outcome.has_changed),
        format!("digest={}", outcome.digest),
    ])?;
    outputs.append_summary(&driver::summary_lines(image, &outcome))?;

    if outcome.has_changed {
        let webhook = SlackWebhook::new(&config.slack_webhook_url);
        webhook
            .post_blocks(driver::notification_blocks(
                image,
                &outcome,
                run_url().as_deref(),
            ))
            .await?;
    }

    Ok(())
}

async fn cmd_digest_apply(config: &Config, image: &str, digest: &str) -> Result<()> {
    let github = GithubClient::new(&config.github_token);
    let mirrors = MirrorStore::new(config.cache_dir.clone(), config.remote_base());

    let repos = github
        .team_repositories(&config.org, &config.team)
        .await?;
    let relevant = driver::filter_relevant(&mirrors, repos, image).await?;
    let pushed = driver::apply(&mirrors, &relevant, image, digest).await?;

    info!(pushed, "digest rollout complete");
    Ok(())
}

/// Link to the current workflow run, when running inside the CI runner.
fn run_url() -> Option<String> {
    let server = std::env::var("GITHUB_SERVER_URL").ok()?;
    let repository = std::env::var("GITHUB_REPOSITORY").ok()?;
    let run_id = std::env::var("GITHUB_RUN_ID").ok()?;
    Some(format!("{server}/{repository}/actions/runs/{run_id}"))
}
