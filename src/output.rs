//! Output publication
//!
//! Prints every output as an `Output: name=value` line and, when running
//! under GitHub Actions, appends it to the `GITHUB_OUTPUT` file in the
//! runner's heredoc format. A random delimiter keeps multi-line values
//! from being able to terminate their own block.

use crate::decision::ActionOutputs;
use crate::error::{LazybuildError, LazybuildResult};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use tracing::debug;
use uuid::Uuid;

/// Publishes named outputs to stdout and, under GitHub Actions, to the
/// `GITHUB_OUTPUT` file.
#[derive(Debug, Clone)]
pub struct OutputWriter {
    github_output: Option<PathBuf>,
}

impl OutputWriter {
    /// Detect the publication target from the environment. `GITHUB_ACTIONS`
    /// set to a non-empty value selects Actions behavior, at which point a
    /// missing `GITHUB_OUTPUT` is an error rather than a silent skip.
    pub fn from_env() -> LazybuildResult<Self> {
        let on_actions = std::env::var("GITHUB_ACTIONS").map_or(false, |v| !v.is_empty());
        if !on_actions {
            return Ok(Self {
                github_output: None,
            });
        }
        match std::env::var_os("GITHUB_OUTPUT") {
            Some(path) => Ok(Self {
                github_output: Some(PathBuf::from(path)),
            }),
            None => Err(LazybuildError::MissingInput("GITHUB_OUTPUT".to_string())),
        }
    }

    #[cfg(test)]
    pub(crate) fn disabled() -> Self {
        Self {
            github_output: None,
        }
    }

    /// Publish one named value.
    pub fn set(&self, name: &str, value: &str) -> LazybuildResult<()> {
        println!("Output: {name}={value:?}");
        self.append(name, value)
    }

    /// Publish the decision outputs in their fixed order.
    pub fn publish(&self, outputs: &ActionOutputs) -> LazybuildResult<()> {
        for (name, value) in render_entries(outputs) {
            self.set(name, &value)?;
        }
        Ok(())
    }

    /// Append every decision output to `GITHUB_OUTPUT` without printing,
    /// for formats that already rendered the values another way.
    pub fn record(&self, outputs: &ActionOutputs) -> LazybuildResult<()> {
        for (name, value) in render_entries(outputs) {
            self.append(name, &value)?;
        }
        Ok(())
    }

    fn append(&self, name: &str, value: &str) -> LazybuildResult<()> {
        if let Some(path) = &self.github_output {
            debug!("Appending {} to {}", name, path.display());
            let mut file = OpenOptions::new()
                .append(true)
                .create(true)
                .open(path)
                .map_err(|e| LazybuildError::io(format!("open {}", path.display()), e))?;
            append_github_output(&mut file, name, value)
                .map_err(|e| LazybuildError::io(format!("write {}", path.display()), e))?;
        }
        Ok(())
    }
}

/// Render each decision output as a string, in publication order.
fn render_entries(outputs: &ActionOutputs) -> Vec<(&'static str, String)> {
    vec![
        ("tags", outputs.tags.join("\n")),
        ("tag-existed", bool_str(outputs.tag_existed).to_string()),
        (
            "build-required",
            bool_str(outputs.build_required).to_string(),
        ),
        ("image-name", outputs.image_name.clone()),
        ("image-tag", outputs.image_tag.clone()),
        ("image-name-tag", outputs.image_name_tag.clone()),
    ]
}

fn bool_str(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

fn append_github_output(writer: &mut impl Write, name: &str, value: &str) -> std::io::Result<()> {
    let delimiter = format!("gh-delim-{}", Uuid::new_v4());
    writeln!(writer, "{name}<<{delimiter}")?;
    writeln!(writer, "{value}")?;
    writeln!(writer, "{delimiter}")
}
