//! Build sandbox staging
//!
//! Copies the declared build inputs into a fresh throwaway directory so
//! the build tool sees exactly the files that went into the content hash
//! and nothing else. Relative paths keep their structure under the
//! sandbox root, and build-context locations are rewritten to point
//! inside it.

use crate::error::{LazybuildError, LazybuildResult};
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Inputs controlling what gets staged.
#[derive(Debug, Clone, Default)]
pub struct SandboxInputs {
    /// Build context directory.
    pub context: PathBuf,
    /// Explicit Dockerfile location. When unset, `<context>/Dockerfile`
    /// is staged into the sandbox.
    pub file: Option<PathBuf>,
    /// Glob patterns naming the files and directories to stage.
    pub extra_inputs: Vec<String>,
    /// Named build contexts whose locations should be rewritten.
    pub build_contexts: Vec<(String, String)>,
}

/// Where everything lives after staging.
#[derive(Debug, Clone)]
pub struct StagedSandbox {
    /// Sandbox root. The directory is not cleaned up; it is handed to the
    /// build step that runs after this process exits.
    pub root: PathBuf,
    /// The build context, relocated inside the sandbox.
    pub context: PathBuf,
    /// Build contexts with their locations rewritten into the sandbox.
    pub build_contexts: Vec<(String, PathBuf)>,
}

/// Stage the inputs into a new sandbox directory.
///
/// Every extra-input pattern must match at least one path; a pattern that
/// matches nothing would silently produce a sandbox the build cannot use.
/// The context and every staged path must be relative and free of `..`,
/// so that everything lands under the sandbox root. The `.dockerignore`
/// next to the context is staged whenever it exists, whether or not it
/// was listed.
pub fn stage(inputs: &SandboxInputs) -> LazybuildResult<StagedSandbox> {
    let root = tempfile::Builder::new()
        .prefix("lazybuild-sandbox-")
        .tempdir()
        .map_err(|e| LazybuildError::io("create sandbox directory", e))?
        .into_path();
    debug!("Staging sandbox in {}", root.display());

    let context = join_inside(&root, &inputs.context)?;
    let build_contexts = inputs
        .build_contexts
        .iter()
        .map(|(name, path)| Ok((name.clone(), join_inside(&root, Path::new(path))?)))
        .collect::<LazybuildResult<Vec<_>>>()?;

    let mut paths = Vec::new();
    for pattern in &inputs.extra_inputs {
        paths.extend(matches_for(pattern)?);
    }

    if inputs.file.is_none() {
        paths.push(inputs.context.join("Dockerfile"));
    }
    let dockerignore = inputs.context.join(".dockerignore");
    if dockerignore.exists() {
        paths.push(dockerignore);
    }

    for path in &paths {
        stage_path(path, &root)?;
    }

    Ok(StagedSandbox {
        context,
        build_contexts,
        root,
    })
}

/// Expand one pattern. Zero matches is an error: the path was declared as
/// a build input, so its absence means the sandbox would be incomplete.
fn matches_for(pattern: &str) -> LazybuildResult<Vec<PathBuf>> {
    let entries = glob::glob(pattern).map_err(|e| LazybuildError::GlobPattern {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })?;

    let mut paths = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| {
            let path = e.path().to_path_buf();
            LazybuildError::InputRead {
                path,
                source: e.into_error(),
            }
        })?;
        paths.push(path);
    }

    if paths.is_empty() {
        return Err(LazybuildError::SandboxInputMissing(PathBuf::from(pattern)));
    }
    Ok(paths)
}

/// Copy one path into the sandbox, mirroring its relative structure.
fn stage_path(path: &Path, root: &Path) -> LazybuildResult<()> {
    let target = join_inside(root, path)?;

    if path.is_dir() {
        debug!("Staging directory {}", path.display());
        copy_tree(path, &target)
    } else if path.is_file() {
        debug!("Staging file {}", path.display());
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| LazybuildError::io(format!("create {}", parent.display()), e))?;
        }
        std::fs::copy(path, &target)
            .map_err(|e| LazybuildError::io(format!("copy {}", path.display()), e))?;
        Ok(())
    } else {
        Err(LazybuildError::SandboxInputMissing(path.to_path_buf()))
    }
}

fn copy_tree(from: &Path, to: &Path) -> LazybuildResult<()> {
    std::fs::create_dir_all(to)
        .map_err(|e| LazybuildError::io(format!("create {}", to.display()), e))?;

    let entries = std::fs::read_dir(from)
        .map_err(|e| LazybuildError::io(format!("read {}", from.display()), e))?;
    for entry in entries {
        let entry = entry.map_err(|e| LazybuildError::io(format!("read {}", from.display()), e))?;
        let source = entry.path();
        let target = to.join(entry.file_name());
        if source.is_dir() {
            copy_tree(&source, &target)?;
        } else {
            std::fs::copy(&source, &target)
                .map_err(|e| LazybuildError::io(format!("copy {}", source.display()), e))?;
        }
    }
    Ok(())
}

/// Join a path under the sandbox root, dropping `.` components so a
/// context of `.` maps to the root itself. Absolute and parent-relative
/// paths would place the copy target outside the root, in the absolute
/// case on top of the source files themselves, so they are rejected
/// before anything is copied.
fn join_inside(root: &Path, path: &Path) -> LazybuildResult<PathBuf> {
    let mut joined = root.to_path_buf();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::Normal(part) => joined.push(part),
            Component::RootDir | Component::Prefix(_) | Component::ParentDir => {
                return Err(LazybuildError::SandboxInputOutside(path.to_path_buf()));
            }
        }
    }
    Ok(joined)
}
