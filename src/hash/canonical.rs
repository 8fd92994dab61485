//! Canonical byte form and content hash
//!
//! Serializes a [`BuildInputSet`] into a stable byte sequence and reduces it
//! with SHA-256. Every unordered collection is sorted before serialization
//! and every field is length-prefixed, so neither map iteration order nor
//! crafted values containing separators can change or forge the result.

use crate::hash::BuildInputSet;
use sha2::{Digest, Sha256};

/// Serialize the input set into its canonical byte form.
///
/// Sections appear in a fixed order: annotations, build-args,
/// build-contexts, target, ulimit, labels, Dockerfile bytes, extra-input
/// files sorted by matched path. Key/value collections sort by key with
/// ties broken by value. Empty sections still emit their header and a zero
/// entry count, so the section layout itself is stable.
pub fn canonical_form(inputs: &BuildInputSet) -> Vec<u8> {
    let mut out = Vec::new();

    write_pairs(&mut out, "annotations", &inputs.annotations);
    write_pairs(&mut out, "build-args", &inputs.build_args);
    write_pairs(&mut out, "build-contexts", &inputs.build_contexts);
    write_optional(&mut out, "target", inputs.target.as_deref());
    write_values(&mut out, "ulimit", &inputs.ulimits);
    write_pairs(&mut out, "labels", &inputs.labels);

    write_header(&mut out, "dockerfile", 1);
    write_field(&mut out, &inputs.dockerfile);

    let mut files: Vec<&(String, Vec<u8>)> = inputs.extra_files.iter().collect();
    files.sort_by(|a, b| a.0.cmp(&b.0));
    write_header(&mut out, "extra-inputs", files.len());
    for (path, content) in files {
        write_field(&mut out, path.as_bytes());
        write_field(&mut out, content);
    }

    out
}

/// Reduce the canonical form of the input set to its content hash: the full
/// SHA-256 digest as 64 lowercase hex characters.
pub fn content_hash(inputs: &BuildInputSet) -> String {
    let mut hasher = Sha256::new();
    hasher.update(canonical_form(inputs));
    hex::encode(hasher.finalize())
}

/// Length-prefixed field: u64 big-endian byte count, then the bytes.
fn write_field(out: &mut Vec<u8>, bytes: &[u8]) {
    out.extend_from_slice(&(bytes.len() as u64).to_be_bytes());
    out.extend_from_slice(bytes);
}

/// Section header: the section label as a field, then the entry count.
fn write_header(out: &mut Vec<u8>, label: &str, count: usize) {
    write_field(out, label.as_bytes());
    out.extend_from_slice(&(count as u64).to_be_bytes());
}

fn write_pairs(out: &mut Vec<u8>, label: &str, pairs: &[(String, String)]) {
    let mut sorted: Vec<&(String, String)> = pairs.iter().collect();
    sorted.sort();
    write_header(out, label, sorted.len());
    for (key, value) in sorted {
        write_field(out, key.as_bytes());
        write_field(out, value.as_bytes());
    }
}

fn write_values(out: &mut Vec<u8>, label: &str, values: &[String]) {
    let mut sorted: Vec<&String> = values.iter().collect();
    sorted.sort();
    write_header(out, label, sorted.len());
    for value in sorted {
        write_field(out, value.as_bytes());
    }
}

fn write_optional(out: &mut Vec<u8>, label: &str, value: Option<&str>) {
    match value {
        Some(v) => {
            write_header(out, label, 1);
            write_field(out, v.as_bytes());
        }
        None => write_header(out, label, 0),
    }
}
