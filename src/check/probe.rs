//! Existence probe abstraction
//!
//! Provides a trait for tag existence queries so the check loop can run
//! against the real Docker CLI or a scripted stand-in in tests.

use crate::check::docker::{LocalStoreProbe, RegistryProbe};
use crate::check::{CheckConfig, CheckMode};
use crate::error::LazybuildResult;
use async_trait::async_trait;

/// Read-only query of whether a (name, tag) pair already exists.
#[async_trait]
pub trait ExistenceProbe: Send + Sync {
    /// Returns `Ok(true)` if `name:tag` exists, `Ok(false)` if the target
    /// answered definitively that it does not, and an error for anything
    /// that leaves the question open.
    async fn tag_exists(&self, name: &str, tag: &str) -> LazybuildResult<bool>;

    /// Human-readable probe name for display
    fn probe_name(&self) -> &'static str;
}

/// Create the probe matching the configured check mode.
pub fn create_probe(config: &CheckConfig) -> Box<dyn ExistenceProbe> {
    match config.mode {
        CheckMode::Registry => Box::new(RegistryProbe::new(config.docker_bin.clone())),
        CheckMode::Local => Box::new(LocalStoreProbe::new(config.docker_bin.clone())),
    }
}
