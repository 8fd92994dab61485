//! Lazybuild - Content-Addressed Container Build Skipping
//!
//! Hashes the full set of build inputs, derives a content-addressed
//! image tag, and checks whether that tag already exists so CI can
//! skip rebuilds that would produce an identical image.

pub mod check;
pub mod cli;
pub mod decision;
pub mod error;
pub mod hash;
pub mod output;
pub mod sandbox;
pub mod tag;

pub use error::{LazybuildError, LazybuildResult};
