//! Docker CLI probes
//!
//! Implements [`ExistenceProbe`] by shelling out to a Docker-compatible
//! CLI: `manifest inspect` for remote registries, `image inspect` for the
//! local store. The exit status alone cannot distinguish "tag absent" from
//! "query broken", so stderr is matched against the messages the CLI and
//! registries emit for a definitively missing tag.

use crate::check::probe::ExistenceProbe;
use crate::error::{LazybuildError, LazybuildResult};
use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Stderr fragments that mean the tag definitively does not exist.
/// Anything else on a non-zero exit is treated as an open question.
const ABSENCE_MARKERS: &[&str] = &[
    "no such image",
    "no such manifest",
    "no such object",
    "manifest unknown",
    "not found",
    "name unknown",
    "does not exist",
];

/// Probe that queries the remote registry through `manifest inspect`.
pub struct RegistryProbe {
    docker_bin: String,
}

impl RegistryProbe {
    pub fn new(docker_bin: String) -> Self {
        Self { docker_bin }
    }
}

#[async_trait]
impl ExistenceProbe for RegistryProbe {
    async fn tag_exists(&self, name: &str, tag: &str) -> LazybuildResult<bool> {
        inspect(&self.docker_bin, &["manifest", "inspect"], name, tag).await
    }

    fn probe_name(&self) -> &'static str {
        "registry manifest"
    }
}

/// Probe that inspects the local image store.
pub struct LocalStoreProbe {
    docker_bin: String,
}

impl LocalStoreProbe {
    pub fn new(docker_bin: String) -> Self {
        Self { docker_bin }
    }
}

#[async_trait]
impl ExistenceProbe for LocalStoreProbe {
    async fn tag_exists(&self, name: &str, tag: &str) -> LazybuildResult<bool> {
        inspect(&self.docker_bin, &["image", "inspect"], name, tag).await
    }

    fn probe_name(&self) -> &'static str {
        "local image store"
    }
}

/// Run `<docker_bin> <subcommand> <name:tag>` and classify the result.
async fn inspect(
    docker_bin: &str,
    subcommand: &[&str],
    name: &str,
    tag: &str,
) -> LazybuildResult<bool> {
    let name_tag = format!("{name}:{tag}");
    let command = format!("{} {}", docker_bin, subcommand.join(" "));
    debug!("Executing: {} {}", command, name_tag);

    let output = Command::new(docker_bin)
        .args(subcommand)
        .arg(&name_tag)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| LazybuildError::command_failed(command.clone(), e))?;

    if output.status.success() {
        return Ok(true);
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    if definitive_absence(&stderr) {
        debug!("{} absent: {}", name_tag, stderr.trim());
        return Ok(false);
    }

    Err(LazybuildError::command_exec(command, stderr))
}

fn definitive_absence(stderr: &str) -> bool {
    let stderr = stderr.to_lowercase();
    ABSENCE_MARKERS.iter().any(|marker| stderr.contains(marker))
}
