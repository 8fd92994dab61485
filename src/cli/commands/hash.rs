//! Hash command - print the content hash of the build inputs

use crate::cli::args::HashArgs;
use crate::error::LazybuildResult;
use crate::hash;
use crate::tag::content_hash_tag;
use tracing::debug;

/// Execute the hash command
pub fn execute(args: HashArgs) -> LazybuildResult<()> {
    let inputs = args.inputs.to_build_inputs()?;
    let input_set = inputs.load()?;
    let content_hash = hash::content_hash(&input_set);
    debug!("Tag form: {}", content_hash_tag(&content_hash));

    println!("{content_hash}");
    Ok(())
}
