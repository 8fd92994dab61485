//! Decide command - hash the build inputs and decide whether to build

use crate::check::{check_candidates, create_probe, CheckConfig, ExistenceProbe};
use crate::cli::args::{DecideArgs, OutputFormat};
use crate::decision::{ActionOutputs, BuildDecision};
use crate::error::LazybuildResult;
use crate::hash;
use crate::output::OutputWriter;
use crate::tag::{derive_candidates, parse_references};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

/// Execute the decide command
pub async fn execute(args: DecideArgs) -> LazybuildResult<()> {
    let writer = OutputWriter::from_env()?;
    let config = args.check.to_config();
    let probe = create_probe(&config);
    run(args, &writer, probe.as_ref(), &config).await
}

/// Command body with the probe injected, so tests can script the answers.
async fn run(
    args: DecideArgs,
    writer: &OutputWriter,
    probe: &dyn ExistenceProbe,
    config: &CheckConfig,
) -> LazybuildResult<()> {
    let pb = create_progress_bar("Hashing build inputs...");

    let inputs = args.inputs.to_build_inputs()?;
    let input_set = inputs.load()?;
    let content_hash = hash::content_hash(&input_set);
    debug!("Content hash: {}", content_hash);

    let references = parse_references(&args.tag_list()?)?;
    let candidates = derive_candidates(&references, &content_hash);
    debug!("{} candidate tag(s) to check", candidates.len());

    pb.set_message(format!("Checking tag existence ({})...", probe.probe_name()));
    let outcomes = check_candidates(probe, &candidates, config).await;

    let decision = BuildDecision::reduce(&candidates, &outcomes)?;
    let outputs = ActionOutputs::assemble(&decision, &references, &candidates, &content_hash);

    pb.finish_and_clear();

    match args.format {
        OutputFormat::Text => {
            if decision.tag_existed {
                println!(
                    "{} {} already exists, build not required",
                    style("✓").green(),
                    style(&outputs.image_name_tag).cyan()
                );
            } else {
                println!(
                    "{} {} needs building",
                    style("!").yellow(),
                    style(&outputs.image_name_tag).cyan()
                );
            }

            let failed = outcomes.iter().filter(|o| o.failed()).count();
            if failed > 0 {
                println!(
                    "{} {} of {} existence checks failed, forcing a build",
                    style("!").yellow(),
                    failed,
                    outcomes.len()
                );
            }

            writer.publish(&outputs)?;
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&outputs)?);
            writer.record(&outputs)?;
        }
    }

    Ok(())
}

fn create_progress_bar(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap(),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}
