//! Lazybuild - Content-Addressed Container Build Skipping
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use lazybuild::cli::{Cli, Commands};
use lazybuild::error::LazybuildResult;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> LazybuildResult<()> {
    let cli = Cli::parse();

    // Initialize logging: 0 = warn (spinners only), 1 = info, 2+ = debug
    let filter = match cli.verbose {
        0 => EnvFilter::new("lazybuild=warn"),
        1 => EnvFilter::new("lazybuild=info"),
        _ => EnvFilter::new("lazybuild=debug"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();

    // Dispatch to command
    match cli.command {
        Commands::Decide(args) => lazybuild::cli::commands::decide(args).await,
        Commands::Hash(args) => lazybuild::cli::commands::hash(args),
        Commands::Sandbox(args) => lazybuild::cli::commands::sandbox(args),
        Commands::Completions(args) => lazybuild::cli::commands::completions(args),
    }
}
