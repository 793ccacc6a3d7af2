//! Filesystem-safe path truncation (spec §8 boundary behavior).
//!
//! A path component longer than 240 bytes is truncated to 240 bytes and has a hashed suffix
//! appended so two different long components never collide after truncation; the same rule
//! applies to the path as a whole once joined, bounded at 880 bytes. Grounded on the
//! content-hashing pattern in `noet-core::codec::compiler` (`Sha256` over bytes, hex-encoded),
//! applied here to path components instead of file contents.

use sha2::{Digest, Sha256};

const MAX_COMPONENT_BYTES: usize = 240;
const MAX_PATH_BYTES: usize = 880;
const HASH_SUFFIX_HEX_LEN: usize = 8;

fn hashed_suffix(original: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(original.as_bytes());
    let digest = hasher.finalize();
    hex::encode(&digest[..HASH_SUFFIX_HEX_LEN / 2])
}

/// Truncate a single path component to `MAX_COMPONENT_BYTES`, appending a hashed suffix of the
/// full original component so distinct long components remain distinguishable on disk.
pub fn filesystem_safe_component(component: &str) -> String {
    if component.len() <= MAX_COMPONENT_BYTES {
        return component.to_string();
    }
    let suffix = hashed_suffix(component);
    // Reserve room for a separating dash and the hash suffix.
    let budget = MAX_COMPONENT_BYTES - suffix.len() - 1;
    let mut truncated = component.to_string();
    // Truncate at a char boundary at or before `budget`.
    while !truncated.is_char_boundary(budget.min(truncated.len())) {
        truncated.pop();
    }
    truncated.truncate(budget.min(truncated.len()));
    format!("{truncated}-{suffix}")
}

/// Apply [`filesystem_safe_component`] to every component of a slash-joined path, then truncate
/// the joined result to `MAX_PATH_BYTES` the same way if it is still too long.
pub fn filesystem_safe_path(path_components: &[String]) -> Vec<String> {
    let safe_components: Vec<String> = path_components
        .iter()
        .map(|c| filesystem_safe_component(c))
        .collect();

    let joined = safe_components.join("/");
    if joined.len() <= MAX_PATH_BYTES {
        return safe_components;
    }

    // Whole-path truncation: keep as many leading components as fit, then hash the remainder.
    let suffix = hashed_suffix(&joined);
    let budget = MAX_PATH_BYTES - suffix.len() - 1;
    let mut kept = Vec::new();
    let mut used = 0usize;
    for component in &safe_components {
        let next = used + component.len() + if kept.is_empty() { 0 } else { 1 };
        if next > budget {
            break;
        }
        used = next;
        kept.push(component.clone());
    }
    kept.push(suffix);
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_component_is_unchanged() {
        assert_eq!(filesystem_safe_component("MyClass"), "MyClass");
    }

    #[test]
    fn long_component_is_truncated_with_hash_suffix() {
        let long = "x".repeat(500);
        let safe = filesystem_safe_component(&long);
        assert!(safe.len() <= MAX_COMPONENT_BYTES);
        assert!(safe.contains('-'));
    }

    #[test]
    fn distinct_long_components_truncate_to_distinct_results() {
        let a = "a".repeat(500);
        let b = format!("{}{}", "a".repeat(499), "b");
        assert_ne!(filesystem_safe_component(&a), filesystem_safe_component(&b));
    }

    #[test]
    fn whole_path_over_budget_is_truncated() {
        let components: Vec<String> = (0..20).map(|i| format!("segment-{i}").repeat(10)).collect();
        let safe = filesystem_safe_path(&components);
        let joined_len: usize = safe.iter().map(|c| c.len()).sum::<usize>() + safe.len() - 1;
        assert!(joined_len <= MAX_PATH_BYTES);
    }

    #[test]
    fn short_path_is_unchanged() {
        let components = vec!["documentation".to_string(), "MyKit".to_string()];
        assert_eq!(filesystem_safe_path(&components), components);
    }
}
