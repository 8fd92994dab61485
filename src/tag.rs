//! Image reference parsing and content-hash tag derivation
//!
//! Turns the user-supplied tag list into parsed references, derives one
//! content-hash tag candidate per distinct image name, and assembles the
//! augmented tag list handed to the build tool.

use crate::error::{LazybuildError, LazybuildResult};
use std::collections::HashSet;

/// Prefix for tags derived from the content hash.
pub const CONTENT_HASH_PREFIX: &str = "content-hash-";

/// A user-supplied image reference, split into repository name and
/// optional explicit tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    pub name: String,
    pub explicit_tag: Option<String>,
}

impl ImageReference {
    /// Parse a reference string.
    ///
    /// Only a `:` after the last `/` separates name from tag, so registry
    /// ports (`localhost:5000/app`) stay part of the name. A trailing `:`
    /// with nothing after it is treated as a bare name.
    pub fn parse(raw: &str) -> LazybuildResult<Self> {
        let repo_start = raw.rfind('/').map(|i| i + 1).unwrap_or(0);
        let mut colons = raw[repo_start..].match_indices(':');

        let (name, explicit_tag) = match (colons.next(), colons.next()) {
            (None, _) => (raw, None),
            (Some((offset, _)), None) => {
                let colon = repo_start + offset;
                let tag = &raw[colon + 1..];
                if tag.is_empty() {
                    (&raw[..colon], None)
                } else {
                    (&raw[..colon], Some(tag.to_string()))
                }
            }
            (Some(_), Some(_)) => {
                return Err(LazybuildError::invalid_tag(
                    raw,
                    "more than one ':' after the last '/'",
                ))
            }
        };

        if name.is_empty() {
            return Err(LazybuildError::invalid_tag(raw, "empty image name"));
        }

        Ok(Self {
            name: name.to_string(),
            explicit_tag,
        })
    }
}

/// One derived (image name, content-hash tag) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagCandidate {
    pub name: String,
    pub tag: String,
}

impl TagCandidate {
    pub fn name_tag(&self) -> String {
        format!("{}:{}", self.name, self.tag)
    }
}

/// Format the tag derived from a content hash.
pub fn content_hash_tag(content_hash: &str) -> String {
    format!("{CONTENT_HASH_PREFIX}{content_hash}")
}

/// Parse the raw tag list. The list is required and must not be empty.
pub fn parse_references(raw: &[String]) -> LazybuildResult<Vec<ImageReference>> {
    if raw.is_empty() {
        return Err(LazybuildError::MissingInput("tags".to_string()));
    }
    raw.iter().map(|r| ImageReference::parse(r)).collect()
}

/// Derive one candidate per distinct image name, preserving first-seen
/// order across the references.
pub fn derive_candidates(references: &[ImageReference], content_hash: &str) -> Vec<TagCandidate> {
    let tag = content_hash_tag(content_hash);
    let mut seen = HashSet::new();
    references
        .iter()
        .filter(|r| seen.insert(r.name.clone()))
        .map(|r| TagCandidate {
            name: r.name.clone(),
            tag: tag.clone(),
        })
        .collect()
}

/// Assemble the tag list forwarded to the build tool: the user references
/// that carried an explicit tag, in input order, followed by one
/// content-hash tag per distinct name. Bare names contribute only their
/// content-hash entry. Exact duplicates are dropped.
pub fn augmented_tag_list(
    references: &[ImageReference],
    candidates: &[TagCandidate],
) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut tags = Vec::new();

    for reference in references {
        if let Some(explicit) = &reference.explicit_tag {
            let name_tag = format!("{}:{}", reference.name, explicit);
            if seen.insert(name_tag.clone()) {
                tags.push(name_tag);
            }
        }
    }
    for candidate in candidates {
        let name_tag = candidate.name_tag();
        if seen.insert(name_tag.clone()) {
            tags.push(name_tag);
        }
    }

    tags
}
