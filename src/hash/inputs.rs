//! Declared build inputs and their loading
//!
//! Collects the hash-relevant build parameters plus the byte content of the
//! Dockerfile and of every file matched by the extra-input globs. Loading is
//! all-or-nothing: a partial input set is never handed to the hasher.

use crate::error::{LazybuildError, LazybuildResult};
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::debug;

/// Declared build parameters, as parsed by the CLI layer.
///
/// Collections keep their declared order here; canonicalization sorts them
/// before hashing, so declaration order never leaks into the hash.
#[derive(Debug, Clone, Default)]
pub struct BuildInputs {
    /// OCI annotations (key/value)
    pub annotations: Vec<(String, String)>,
    /// Build arguments (key/value)
    pub build_args: Vec<(String, String)>,
    /// Named build contexts (name/location)
    pub build_contexts: Vec<(String, String)>,
    /// Target build stage
    pub target: Option<String>,
    /// Ulimit constraint strings (e.g. "nofile=1024:1024")
    pub ulimits: Vec<String>,
    /// Image labels (key/value)
    pub labels: Vec<(String, String)>,
    /// Explicit Dockerfile path (overrides `<context>/Dockerfile`)
    pub file: Option<PathBuf>,
    /// Build context directory
    pub context: PathBuf,
    /// Glob patterns whose matched file contents are folded into the hash
    pub extra_inputs: Vec<String>,
}

impl BuildInputs {
    /// The Dockerfile path: explicit `--file` if given, else
    /// `<context>/Dockerfile`.
    pub fn dockerfile_path(&self) -> PathBuf {
        match &self.file {
            Some(path) => path.clone(),
            None => self.context.join("Dockerfile"),
        }
    }

    /// Read the Dockerfile and every glob-matched extra input into a
    /// [`BuildInputSet`] ready for canonicalization.
    pub fn load(&self) -> LazybuildResult<BuildInputSet> {
        let dockerfile_path = self.dockerfile_path();
        let dockerfile =
            std::fs::read(&dockerfile_path).map_err(|e| LazybuildError::DockerfileRead {
                path: dockerfile_path.clone(),
                source: e,
            })?;
        debug!(
            "Read Dockerfile: {} ({} bytes)",
            dockerfile_path.display(),
            dockerfile.len()
        );

        let extra_files = expand_extra_inputs(&self.extra_inputs)?;

        Ok(BuildInputSet {
            annotations: self.annotations.clone(),
            build_args: self.build_args.clone(),
            build_contexts: self.build_contexts.clone(),
            target: self.target.clone(),
            ulimits: self.ulimits.clone(),
            labels: self.labels.clone(),
            dockerfile,
            extra_files,
        })
    }
}

/// The full set of hash-relevant inputs with file contents resolved.
///
/// Immutable once assembled. Two sets with the same semantic content
/// produce identical canonical bytes whatever order their collections
/// were declared in.
#[derive(Debug, Clone, Default)]
pub struct BuildInputSet {
    pub annotations: Vec<(String, String)>,
    pub build_args: Vec<(String, String)>,
    pub build_contexts: Vec<(String, String)>,
    pub target: Option<String>,
    pub ulimits: Vec<String>,
    pub labels: Vec<(String, String)>,
    /// Raw Dockerfile bytes (content only, the path is not hashed)
    pub dockerfile: Vec<u8>,
    /// Matched path and content per extra input, in match order
    pub extra_files: Vec<(String, Vec<u8>)>,
}

/// Expand extra-input glob patterns into (path, content) pairs.
///
/// Matched directories are skipped and duplicate matches across patterns are
/// read once. Every matched regular file must be readable; a pattern that
/// matches nothing contributes nothing.
fn expand_extra_inputs(patterns: &[String]) -> LazybuildResult<Vec<(String, Vec<u8>)>> {
    let mut files = Vec::new();
    let mut seen = HashSet::new();

    for pattern in patterns {
        let matches = glob::glob(pattern).map_err(|e| LazybuildError::GlobPattern {
            pattern: pattern.clone(),
            reason: e.to_string(),
        })?;

        for entry in matches {
            let path = entry.map_err(|e| LazybuildError::InputRead {
                path: e.path().to_path_buf(),
                source: e.into_error(),
            })?;
            if path.is_dir() {
                continue;
            }

            let key = path.to_string_lossy().into_owned();
            if !seen.insert(key.clone()) {
                continue;
            }

            let content = std::fs::read(&path).map_err(|e| LazybuildError::InputRead {
                path: path.clone(),
                source: e,
            })?;
            debug!("Hashing extra input: {} ({} bytes)", key, content.len());
            files.push((key, content));
        }
    }

    debug!("Expanded {} extra input file(s)", files.len());
    Ok(files)
}
