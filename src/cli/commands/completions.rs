//! Completions command - generate shell completion scripts

use crate::cli::args::CompletionsArgs;
use crate::cli::Cli;
use crate::error::LazybuildResult;
use clap::CommandFactory;
use clap_complete::generate;

/// Execute the completions command
pub fn execute(args: CompletionsArgs) -> LazybuildResult<()> {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(args.shell, &mut cmd, name, &mut std::io::stdout());
    Ok(())
}
