//! Content hashing of declared build inputs
//!
//! Reduces everything that affects an image build (build args, contexts,
//! labels, annotations, target, ulimits, Dockerfile bytes, extra input
//! files) to a single deterministic hash. Same declared inputs = same hash,
//! regardless of declaration order.

pub mod canonical;
pub mod inputs;

pub use canonical::{canonical_form, content_hash};
pub use inputs::{BuildInputSet, BuildInputs};
