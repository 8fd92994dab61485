//! CLI argument definitions using clap derive
//!
//! Every build input can also arrive through the `INPUT_<NAME>` variables
//! GitHub Actions sets for action inputs, so the same binary works as a
//! plain CLI and as an action step. Actions passes unset inputs as empty
//! strings, so all inputs are optional here and normalized afterwards.

use crate::check::{
    CheckConfig, CheckMode, DEFAULT_ATTEMPTS, DEFAULT_CONCURRENCY, DEFAULT_DOCKER_BIN,
    DEFAULT_TIMEOUT_SECS,
};
use crate::error::{LazybuildError, LazybuildResult};
use crate::hash::BuildInputs;
use crate::sandbox::SandboxInputs;
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

/// Lazybuild - Skip container image builds
///
/// Derives a deterministic content-hash tag from the declared build
/// inputs and checks whether an image with that tag already exists, so
/// unchanged images are never rebuilt.
#[derive(Parser, Debug)]
#[command(name = "lazybuild")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Decide whether a build is required and publish the outputs
    Decide(DecideArgs),

    /// Print the content hash for the declared build inputs
    Hash(HashArgs),

    /// Stage the build inputs into a sandbox directory
    Sandbox(SandboxArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Arguments for the decide command
#[derive(Parser, Debug)]
pub struct DecideArgs {
    /// Image references to publish (newline or comma separated)
    #[arg(long, env = "INPUT_TAGS")]
    pub tags: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    #[command(flatten)]
    pub inputs: InputArgs,

    #[command(flatten)]
    pub check: CheckArgs,
}

impl DecideArgs {
    /// The parsed tag list. Required: an empty or missing value is an
    /// error, matching the action contract.
    pub fn tag_list(&self) -> LazybuildResult<Vec<String>> {
        let raw = trimmed(&self.tags)
            .ok_or_else(|| LazybuildError::MissingInput("tags".to_string()))?;
        Ok(parse_list(&raw))
    }
}

/// Arguments for the hash command
#[derive(Parser, Debug)]
pub struct HashArgs {
    #[command(flatten)]
    pub inputs: InputArgs,
}

/// Arguments for the sandbox command
#[derive(Parser, Debug)]
pub struct SandboxArgs {
    #[command(flatten)]
    pub inputs: InputArgs,
}

/// Arguments for the completions command
#[derive(Parser, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}

/// The declared build inputs, shared by decide, hash and sandbox
#[derive(Args, Debug, Clone, Default)]
pub struct InputArgs {
    /// Build context directory (defaults to the current directory)
    #[arg(long, env = "INPUT_CONTEXT")]
    pub context: Option<String>,

    /// Dockerfile location (defaults to <context>/Dockerfile)
    #[arg(long, env = "INPUT_FILE")]
    pub file: Option<String>,

    /// Extra file globs folded into the content hash (whitespace separated)
    #[arg(long, env = "INPUT_EXTRA-INPUTS")]
    pub extra_inputs: Option<String>,

    /// Annotations to apply (KEY=VALUE, one per line)
    #[arg(long, env = "INPUT_ANNOTATIONS")]
    pub annotations: Option<String>,

    /// Build arguments (KEY=VALUE, one per line)
    #[arg(long, env = "INPUT_BUILD-ARGS")]
    pub build_args: Option<String>,

    /// Additional build contexts (NAME=PATH, one per line)
    #[arg(long, env = "INPUT_BUILD-CONTEXTS")]
    pub build_contexts: Option<String>,

    /// Target build stage
    #[arg(long, env = "INPUT_TARGET")]
    pub target: Option<String>,

    /// Ulimit settings (one per line)
    #[arg(long, env = "INPUT_ULIMIT")]
    pub ulimit: Option<String>,

    /// Image labels (KEY=VALUE, one per line)
    #[arg(long, env = "INPUT_LABELS")]
    pub labels: Option<String>,
}

impl InputArgs {
    /// Assemble the hash-relevant inputs, parsing list and KEY=VALUE
    /// fields.
    pub fn to_build_inputs(&self) -> LazybuildResult<BuildInputs> {
        Ok(BuildInputs {
            annotations: parse_key_values("annotations", &self.annotations)?,
            build_args: parse_key_values("build-args", &self.build_args)?,
            build_contexts: parse_key_values("build-contexts", &self.build_contexts)?,
            target: trimmed(&self.target),
            ulimits: parse_lines(&self.ulimit),
            labels: parse_key_values("labels", &self.labels)?,
            file: trimmed(&self.file).map(PathBuf::from),
            context: self.context_dir(),
            extra_inputs: parse_patterns(&self.extra_inputs),
        })
    }

    /// Assemble the inputs the sandbox command stages.
    pub fn to_sandbox_inputs(&self) -> LazybuildResult<SandboxInputs> {
        Ok(SandboxInputs {
            context: self.context_dir(),
            file: trimmed(&self.file).map(PathBuf::from),
            extra_inputs: parse_patterns(&self.extra_inputs),
            build_contexts: parse_key_values("build-contexts", &self.build_contexts)?,
        })
    }

    fn context_dir(&self) -> PathBuf {
        trimmed(&self.context)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

/// Existence-check flags for the decide command
#[derive(Args, Debug, Clone)]
pub struct CheckArgs {
    /// Where to check for existing tags
    #[arg(long, env = "INPUT_MODE", default_value = "registry", value_parser = parse_check_mode)]
    pub mode: CheckMode,

    /// Attempts per candidate before giving up
    #[arg(long, env = "INPUT_ATTEMPTS", default_value_t = DEFAULT_ATTEMPTS)]
    pub attempts: u32,

    /// Per-attempt timeout in seconds
    #[arg(long, env = "INPUT_CHECK-TIMEOUT", default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub check_timeout: u64,

    /// Overall deadline in seconds across all checks
    #[arg(long, env = "INPUT_DEADLINE")]
    pub deadline: Option<u64>,

    /// Maximum concurrent checks
    #[arg(long, env = "INPUT_CONCURRENCY", default_value_t = DEFAULT_CONCURRENCY)]
    pub concurrency: usize,

    /// Docker-compatible CLI used for the checks
    #[arg(long, env = "LAZYBUILD_DOCKER_BIN", default_value = DEFAULT_DOCKER_BIN)]
    pub docker_bin: String,
}

impl CheckArgs {
    pub fn to_config(&self) -> CheckConfig {
        CheckConfig {
            mode: self.mode,
            attempts: self.attempts,
            attempt_timeout: Duration::from_secs(self.check_timeout),
            concurrency: self.concurrency,
            deadline: self.deadline.map(Duration::from_secs),
            docker_bin: self.docker_bin.clone(),
            ..CheckConfig::default()
        }
    }
}

/// Output format for the decide command
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Styled summary plus one Output line per value
    Text,
    /// Single JSON document
    Json,
}

fn parse_check_mode(s: &str) -> Result<CheckMode, String> {
    s.parse()
}

/// Normalize an optional input: trim, and treat empty as missing.
fn trimmed(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

/// Split a list input on newlines and commas, dropping empty entries.
pub(crate) fn parse_list(value: &str) -> Vec<String> {
    value
        .lines()
        .flat_map(|line| line.split(','))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Split a list input on newlines only, for entries whose values may
/// contain commas.
fn parse_lines(value: &Option<String>) -> Vec<String> {
    value
        .as_deref()
        .unwrap_or_default()
        .lines()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Split extra-input patterns on whitespace.
// TODO: split on newlines like the other list inputs once the calling
// workflows stop passing space-separated patterns.
fn parse_patterns(value: &Option<String>) -> Vec<String> {
    value
        .as_deref()
        .unwrap_or_default()
        .split_whitespace()
        .map(String::from)
        .collect()
}

/// Parse KEY=VALUE entries, one per line.
fn parse_key_values(
    input: &str,
    value: &Option<String>,
) -> LazybuildResult<Vec<(String, String)>> {
    let mut pairs = Vec::new();
    for entry in parse_lines(value) {
        let (key, val) = match entry.split_once('=') {
            Some(pair) => pair,
            None => {
                return Err(LazybuildError::InvalidKeyValue {
                    input: input.to_string(),
                    entry,
                })
            }
        };
        let key = key.trim();
        if key.is_empty() {
            return Err(LazybuildError::InvalidKeyValue {
                input: input.to_string(),
                entry,
            });
        }
        pairs.push((key.to_string(), val.trim().to_string()));
    }
    Ok(pairs)
}
