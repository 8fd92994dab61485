//! Sandbox command - stage the build inputs into an isolated directory

use crate::cli::args::SandboxArgs;
use crate::error::LazybuildResult;
use crate::output::OutputWriter;
use crate::sandbox;
use console::style;
use tracing::debug;

/// Execute the sandbox command
pub fn execute(args: SandboxArgs) -> LazybuildResult<()> {
    let writer = OutputWriter::from_env()?;
    let inputs = args.inputs.to_sandbox_inputs()?;
    let staged = sandbox::stage(&inputs)?;
    debug!("Sandbox root: {}", staged.root.display());

    println!(
        "{} Sandbox staged in {}",
        style("✓").green(),
        style(staged.root.display()).cyan()
    );

    writer.set("tmpdir", &staged.root.display().to_string())?;
    writer.set("context", &staged.context.display().to_string())?;

    let build_contexts = staged
        .build_contexts
        .iter()
        .map(|(name, path)| format!("{}={}", name, path.display()))
        .collect::<Vec<_>>()
        .join("\n");
    writer.set("build-contexts", &build_contexts)?;

    Ok(())
}
