//! Build-or-skip decision
//!
//! Reduces the per-candidate existence outcomes into a single decision and
//! assembles the outputs published to the caller. Uncertainty always falls
//! toward building: a failed check can force a rebuild but never a skip.

use crate::check::CheckOutcome;
use crate::error::{LazybuildError, LazybuildResult};
use crate::tag::{augmented_tag_list, content_hash_tag, ImageReference, TagCandidate};
use serde::Serialize;

/// Reduction of all existence outcomes into one decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildDecision {
    /// True iff every candidate's content-hash tag already exists.
    pub tag_existed: bool,
    /// True when a build must run, either because the tag set is incomplete
    /// or because any check ended without a definitive answer.
    pub build_required: bool,
    /// Representative image name: the first whose tag exists when all do,
    /// otherwise the first candidate overall.
    pub image_name: String,
}

impl BuildDecision {
    /// Reduce outcomes into a decision. `outcomes` must be in candidate
    /// order, one per candidate.
    pub fn reduce(
        candidates: &[TagCandidate],
        outcomes: &[CheckOutcome],
    ) -> LazybuildResult<Self> {
        let first = candidates
            .first()
            .ok_or_else(|| LazybuildError::MissingInput("tags".to_string()))?;

        let tag_existed = !outcomes.is_empty() && outcomes.iter().all(CheckOutcome::exists);
        let any_failed = outcomes.iter().any(CheckOutcome::failed);
        let build_required = !tag_existed || any_failed;

        let image_name = if tag_existed {
            candidates
                .iter()
                .zip(outcomes)
                .find(|(_, outcome)| outcome.exists())
                .map(|(candidate, _)| candidate.name.clone())
                .unwrap_or_else(|| first.name.clone())
        } else {
            first.name.clone()
        };

        Ok(Self {
            tag_existed,
            build_required,
            image_name,
        })
    }
}

/// The values published at the end of an invocation, in publication order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ActionOutputs {
    /// Augmented tag list to forward to the build tool.
    pub tags: Vec<String>,
    pub tag_existed: bool,
    pub build_required: bool,
    pub image_name: String,
    /// `content-hash-<hex>`, shared by every candidate.
    pub image_tag: String,
    pub image_name_tag: String,
}

impl ActionOutputs {
    pub fn assemble(
        decision: &BuildDecision,
        references: &[ImageReference],
        candidates: &[TagCandidate],
        content_hash: &str,
    ) -> Self {
        let image_tag = content_hash_tag(content_hash);
        Self {
            tags: augmented_tag_list(references, candidates),
            tag_existed: decision.tag_existed,
            build_required: decision.build_required,
            image_name: decision.image_name.clone(),
            image_name_tag: format!("{}:{}", decision.image_name, image_tag),
            image_tag,
        }
    }
}
