//! CLI command implementations

pub mod completions;
pub mod decide;
pub mod hash;
pub mod sandbox;

pub use completions::execute as completions;
pub use decide::execute as decide;
pub use hash::execute as hash;
pub use sandbox::execute as sandbox;
