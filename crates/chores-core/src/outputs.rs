//! CI job output channel.
//!
//! Detect mode hands its result to the apply job through the workflow
//! runner's file-based output mechanism: machine-readable `key=value` lines
//! appended to `$GITHUB_OUTPUT` and a human-readable summary appended to
//! `$GITHUB_STEP_SUMMARY`.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{ChoresError, Result};

/// Env var naming the machine-readable job output file.
pub const OUTPUT_ENV: &str = "GITHUB_OUTPUT";

/// Env var naming the human-readable step summary file.
pub const SUMMARY_ENV: &str = "GITHUB_STEP_SUMMARY";

/// The two job output files, resolved eagerly so a missing variable fails
/// the run before any mirrors are touched.
#[derive(Debug, Clone)]
pub struct JobOutputs {
    output_path: PathBuf,
    summary_path: PathBuf,
}

impl JobOutputs {
    /// Resolve both output paths from the environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let output_path = lookup(OUTPUT_ENV)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ChoresError::Config(format!("{OUTPUT_ENV} env missing")))?;
        let summary_path = lookup(SUMMARY_ENV)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ChoresError::Config(format!("{SUMMARY_ENV} env missing")))?;

        Ok(JobOutputs {
            output_path: PathBuf::from(output_path),
            summary_path: PathBuf::from(summary_path),
        })
    }

    /// Construct with explicit paths.
    pub fn new(output_path: impl Into<PathBuf>, summary_path: impl Into<PathBuf>) -> Self {
        JobOutputs {
            output_path: output_path.into(),
            summary_path: summary_path.into(),
        }
    }

    /// Append `key=value` output lines for downstream jobs.
    pub fn append_output(&self, lines: &[String]) -> Result<()> {
        append_lines(&self.output_path, lines)
    }

    /// Append human-readable summary lines.
    pub fn append_summary(&self, lines: &[String]) -> Result<()> {
        append_lines(&self.summary_path, lines)
    }
}

fn append_lines(path: &Path, lines: &[String]) -> Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    for line in lines {
        writeln!(file, "{line}")?;
    }
    Ok(())
}
