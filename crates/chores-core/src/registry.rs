//! Container image digest resolution.
//!
//! Asks the container tool for the multi-arch manifest of an image's
//! `latest` tag and extracts the content digest for the target
//! architecture. The digest is an opaque token; nothing downstream ever
//! interprets it.

use serde::Deserialize;
use tokio::process::Command;
use tracing::info;

use crate::error::{ChoresError, Result};

/// The only architecture the team builds for.
const TARGET_ARCHITECTURE: &str = "amd64";

/// One entry of a verbose manifest inspection. Registries answer with
/// either a list of these (one per platform) or a single flat object.
#[derive(Debug, Deserialize)]
struct ManifestEntry {
    #[serde(rename = "Descriptor")]
    descriptor: Descriptor,
}

#[derive(Debug, Deserialize)]
struct Descriptor {
    digest: Option<String>,
    platform: Option<Platform>,
}

#[derive(Debug, Deserialize)]
struct Platform {
    architecture: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ManifestOutput {
    List(Vec<ManifestEntry>),
    Single(ManifestEntry),
}

/// Resolve the current digest of `<image>:latest` for amd64.
pub async fn resolve_latest_digest(image: &str) -> Result<String> {
    let reference = format!("{image}:latest");
    let output = Command::new("docker")
        .args(["manifest", "inspect", "--verbose", &reference])
        .output()
        .await
        .map_err(|e| ChoresError::Docker(format!("failed to run docker: {e}")))?;

    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    if !output.status.success() {
        return Err(ChoresError::Docker(format!(
            "docker manifest inspect {reference} failed: {stderr}"
        )));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let digest = extract_digest(&stdout, TARGET_ARCHITECTURE)?.ok_or_else(|| {
        ChoresError::NoManifest(if stderr.is_empty() {
            format!("no {TARGET_ARCHITECTURE} manifest for {reference}")
        } else {
            stderr
        })
    })?;

    info!(%image, %digest, "resolved latest digest");
    Ok(digest)
}

/// Pull the digest for `arch` out of a verbose manifest inspection.
///
/// Handles both response shapes: a manifest list (pick the entry whose
/// platform architecture matches) and a single flat object (take its
/// digest as-is).
fn extract_digest(raw: &str, arch: &str) -> Result<Option<String>> {
    let output: ManifestOutput = serde_json::from_str(raw)?;

    let digest = match output {
        ManifestOutput::List(entries) => entries
            .into_iter()
            .find(|entry| {
                entry
                    .descriptor
                    .platform
                    .as_ref()
                    .is_some_and(|p| p.architecture == arch)
            })
            .and_then(|entry| entry.descriptor.digest),
        ManifestOutput::Single(entry) => entry.descriptor.digest,
    };

    Ok(digest)
}
