//! Tag existence checking
//!
//! Answers, for each (image name, content-hash tag) candidate, whether that
//! exact tag already exists in the configured target: a remote registry or
//! the local image store. Transient failures are retried with exponential
//! backoff; candidates are probed concurrently and results come back in
//! candidate order.

mod docker;
mod probe;

pub use docker::{LocalStoreProbe, RegistryProbe};
pub use probe::{create_probe, ExistenceProbe};

use crate::error::LazybuildError;
use crate::tag::TagCandidate;
use futures_util::stream::{self, StreamExt};
use std::time::Duration;
use tokio::time::{sleep, timeout, timeout_at, Instant};
use tracing::{debug, warn};

pub const DEFAULT_ATTEMPTS: u32 = 3;
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_CONCURRENCY: usize = 4;
pub const DEFAULT_DOCKER_BIN: &str = "docker";

/// Initial delay between attempts; doubles after each failure.
const INITIAL_BACKOFF: Duration = Duration::from_millis(500);

/// Where existence is checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckMode {
    /// Query the remote registry via a manifest lookup.
    Registry,
    /// Inspect the local image store.
    Local,
}

impl CheckMode {
    pub fn name(&self) -> &'static str {
        match self {
            CheckMode::Registry => "registry",
            CheckMode::Local => "local",
        }
    }
}

impl std::str::FromStr for CheckMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "registry" => Ok(CheckMode::Registry),
            "local" => Ok(CheckMode::Local),
            other => Err(format!(
                "unknown check mode '{other}' (expected 'registry' or 'local')"
            )),
        }
    }
}

/// Settings for the existence-check phase.
#[derive(Debug, Clone)]
pub struct CheckConfig {
    pub mode: CheckMode,
    /// Attempts per candidate before settling to a failure.
    pub attempts: u32,
    /// Timeout applied to each individual attempt.
    pub attempt_timeout: Duration,
    /// Initial retry backoff; doubles after each failed attempt.
    pub backoff: Duration,
    /// Maximum number of candidates probed at once.
    pub concurrency: usize,
    /// Overall deadline across all candidates, if any.
    pub deadline: Option<Duration>,
    /// Docker-compatible CLI used to perform the probes.
    pub docker_bin: String,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            mode: CheckMode::Registry,
            attempts: DEFAULT_ATTEMPTS,
            attempt_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            backoff: INITIAL_BACKOFF,
            concurrency: DEFAULT_CONCURRENCY,
            deadline: None,
            docker_bin: DEFAULT_DOCKER_BIN.to_string(),
        }
    }
}

/// Outcome of checking one candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    /// The tag exists in the target.
    Exists,
    /// The target answered definitively that the tag does not exist.
    Missing,
    /// No definitive answer after retries; carries the last failure reason.
    Failed(String),
}

impl CheckOutcome {
    pub fn exists(&self) -> bool {
        matches!(self, CheckOutcome::Exists)
    }

    pub fn failed(&self) -> bool {
        matches!(self, CheckOutcome::Failed(_))
    }
}

/// Check all candidates against the probe, concurrently up to the
/// configured limit. Results are returned in candidate order, one outcome
/// per candidate, and never abort the invocation: a candidate that cannot
/// be determined comes back as [`CheckOutcome::Failed`].
pub async fn check_candidates(
    probe: &dyn ExistenceProbe,
    candidates: &[TagCandidate],
    config: &CheckConfig,
) -> Vec<CheckOutcome> {
    let deadline = config.deadline.map(|d| Instant::now() + d);

    stream::iter(
        candidates
            .iter()
            .map(|candidate| check_candidate(probe, candidate, config, deadline)),
    )
    .buffered(config.concurrency.max(1))
    .collect()
    .await
}

async fn check_candidate(
    probe: &dyn ExistenceProbe,
    candidate: &TagCandidate,
    config: &CheckConfig,
    deadline: Option<Instant>,
) -> CheckOutcome {
    let attempts = check_with_retries(probe, candidate, config);

    match deadline {
        Some(at) => match timeout_at(at, attempts).await {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!(
                    "Deadline elapsed while checking {}, treating as failed",
                    candidate.name_tag()
                );
                CheckOutcome::Failed("overall deadline elapsed".to_string())
            }
        },
        None => attempts.await,
    }
}

async fn check_with_retries(
    probe: &dyn ExistenceProbe,
    candidate: &TagCandidate,
    config: &CheckConfig,
) -> CheckOutcome {
    let name_tag = candidate.name_tag();
    let attempts = config.attempts.max(1);
    let mut delay = config.backoff;
    let mut last_error = String::new();

    for attempt in 1..=attempts {
        let result = timeout(
            config.attempt_timeout,
            probe.tag_exists(&candidate.name, &candidate.tag),
        )
        .await
        .map_err(|_| LazybuildError::ProbeTimeout(config.attempt_timeout.as_secs()))
        .and_then(|r| r);

        match result {
            Ok(true) => {
                debug!("{} exists ({})", name_tag, probe.probe_name());
                return CheckOutcome::Exists;
            }
            Ok(false) => {
                debug!("{} not found ({})", name_tag, probe.probe_name());
                return CheckOutcome::Missing;
            }
            Err(e) if e.is_retryable() => {
                warn!(
                    "Check for {} failed (attempt {}/{}): {}",
                    name_tag, attempt, attempts, e
                );
                last_error = e.to_string();
            }
            Err(e) => {
                warn!("Check for {} failed: {}", name_tag, e);
                return CheckOutcome::Failed(e.to_string());
            }
        }

        if attempt < attempts {
            debug!("Retrying {} in {:?}", name_tag, delay);
            sleep(delay).await;
            delay *= 2;
        }
    }

    CheckOutcome::Failed(last_error)
}
