//! Per-name disambiguation sub-tree and stable-hash disambiguator (spec §4.2, §9).
//!
//! Grounded on `noet-core::nodekey`'s practice of deriving a short stable token from a longer
//! stable identifier; here the token is `hex(sha256(precise_id))[..hash_length]` rather than a
//! node key, and it disambiguates *siblings with the same name* instead of identifying a node
//! globally.

use std::collections::BTreeMap;

use sha2::{Digest, Sha256};

use crate::pathhierarchy::tree::NodeId;

/// Symbol-kind tokens recognized as disambiguation suffixes (spec §9: "retain as a small
/// data-driven table ... do not special-case any one language"). Not exhaustive; unrecognized
/// kind identifiers still work, they are simply never *guessed* as a disambiguator when parsing
/// an authored path.
pub const KNOWN_KIND_TOKENS: &[&str] = &[
    "module",
    "class",
    "struct",
    "enum",
    "protocol",
    "typealias",
    "associatedtype",
    "method",
    "property",
    "func",
    "var",
    "case",
    "initializer",
    "deinitializer",
    "subscript",
    "operator",
    "extension",
    "type-method",
    "type-property",
    "type-subscript",
];

/// Derive the disambiguation kind token from a symbol-kind identifier, e.g. `swift.method` ->
/// `method` (spec §4.2: "kind" half of the `(kind, stable-hash)` key).
pub fn kind_token(kind_identifier: &str) -> String {
    kind_identifier
        .rsplit('.')
        .next()
        .unwrap_or(kind_identifier)
        .to_string()
}

/// Stable hash disambiguator for a precise identifier (spec §4.2, §9 Decision: 4 hex chars).
pub fn stable_hash(precise_id: &str, hash_length: usize) -> String {
    let mut hasher = Sha256::new();
    hasher.update(precise_id.as_bytes());
    let digest = hasher.finalize();
    let full = hex::encode(digest);
    full.chars().take(hash_length).collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisambiguationMatch {
    Single(NodeId),
    Collision(Vec<NodeId>),
    NotFound,
}

/// Two-level `(kind, hash) -> node` index for one name within one parent (spec §3 "Disambiguation
/// Subtree").
#[derive(Debug, Clone, Default)]
pub struct DisambiguationSubtree {
    entries: BTreeMap<(String, String), NodeId>,
}

impl DisambiguationSubtree {
    pub fn insert(&mut self, kind: String, hash: String, node: NodeId) {
        self.entries.insert((kind, hash), node);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&(String, String), &NodeId)> {
        self.entries.iter()
    }

    /// Collision-aware single-step lookup (spec §4.2 step 3).
    pub fn find(&self, kind: Option<&str>, hash: Option<&str>) -> DisambiguationMatch {
        if self.entries.is_empty() {
            return DisambiguationMatch::NotFound;
        }
        if self.entries.len() == 1 {
            return DisambiguationMatch::Single(*self.entries.values().next().unwrap());
        }

        let matches: Vec<NodeId> = self
            .entries
            .iter()
            .filter(|((k, h), _)| {
                kind.map(|want| want == k).unwrap_or(true) && hash.map(|want| want == h).unwrap_or(true)
            })
            .map(|(_, id)| *id)
            .collect();

        match matches.len() {
            0 => DisambiguationMatch::NotFound,
            1 => DisambiguationMatch::Single(matches[0]),
            _ => DisambiguationMatch::Collision(matches),
        }
    }

    /// The shortest disambiguation suffix (`""`, `"-kind"`, `"-hash"`, or `"-kind-hash"`) that
    /// uniquely selects `target` among every entry in this subtree (spec §4.2 "canonical
    /// disambiguated path").
    pub fn shortest_disambiguator_for(&self, target: NodeId) -> String {
        if self.entries.len() <= 1 {
            return String::new();
        }
        let (target_kind, target_hash) = self
            .entries
            .iter()
            .find(|(_, id)| **id == target)
            .map(|((k, h), _)| (k.clone(), h.clone()))
            .unwrap_or_default();

        let kind_unique = self
            .entries
            .keys()
            .filter(|(k, _)| *k == target_kind)
            .count()
            == 1;
        if kind_unique {
            return format!("-{target_kind}");
        }

        let hash_unique = self
            .entries
            .keys()
            .filter(|(_, h)| *h == target_hash)
            .count()
            == 1;
        if hash_unique {
            return format!("-{target_hash}");
        }

        format!("-{target_kind}-{target_hash}")
    }

    /// Same as [`Self::shortest_disambiguator_for`] but restricted to a subset of entries, used
    /// when reporting a *lookup-collision* limited to the candidates that actually matched (spec
    /// §4.2 step 3, §8 "collision completeness").
    pub fn shortest_disambiguator_among(&self, target: NodeId, candidates: &[NodeId]) -> String {
        if candidates.len() <= 1 {
            return String::new();
        }
        let (target_kind, target_hash) = self
            .entries
            .iter()
            .find(|(_, id)| **id == target)
            .map(|((k, h), _)| (k.clone(), h.clone()))
            .unwrap_or_default();

        let candidate_keys: Vec<&(String, String)> = self
            .entries
            .iter()
            .filter(|(_, id)| candidates.contains(id))
            .map(|(k, _)| k)
            .collect();

        let kind_unique = candidate_keys.iter().filter(|(k, _)| *k == target_kind).count() == 1;
        if kind_unique {
            return format!("-{target_kind}");
        }
        let hash_unique = candidate_keys.iter().filter(|(_, h)| *h == target_hash).count() == 1;
        if hash_unique {
            return format!("-{target_hash}");
        }
        format!("-{target_kind}-{target_hash}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: usize) -> NodeId {
        NodeId::for_test(n)
    }

    #[test]
    fn single_entry_matches_regardless_of_hints() {
        let mut subtree = DisambiguationSubtree::default();
        subtree.insert("method".into(), "ab12".into(), id(1));
        assert_eq!(subtree.find(None, None), DisambiguationMatch::Single(id(1)));
        assert_eq!(
            subtree.find(Some("struct"), Some("zzzz")),
            DisambiguationMatch::Single(id(1))
        );
    }

    #[test]
    fn kind_filters_to_one_candidate() {
        let mut subtree = DisambiguationSubtree::default();
        subtree.insert("method".into(), "aaaa".into(), id(1));
        subtree.insert("property".into(), "bbbb".into(), id(2));
        assert_eq!(
            subtree.find(Some("method"), None),
            DisambiguationMatch::Single(id(1))
        );
    }

    #[test]
    fn no_hints_with_multiple_entries_collides() {
        let mut subtree = DisambiguationSubtree::default();
        subtree.insert("method".into(), "aaaa".into(), id(1));
        subtree.insert("method".into(), "bbbb".into(), id(2));
        match subtree.find(None, None) {
            DisambiguationMatch::Collision(candidates) => assert_eq!(candidates.len(), 2),
            other => panic!("expected collision, got {other:?}"),
        }
    }

    #[test]
    fn shortest_disambiguator_prefers_kind() {
        let mut subtree = DisambiguationSubtree::default();
        subtree.insert("method".into(), "aaaa".into(), id(1));
        subtree.insert("property".into(), "bbbb".into(), id(2));
        assert_eq!(subtree.shortest_disambiguator_for(id(1)), "-method");
    }

    #[test]
    fn shortest_disambiguator_falls_back_to_hash() {
        let mut subtree = DisambiguationSubtree::default();
        subtree.insert("method".into(), "aaaa".into(), id(1));
        subtree.insert("method".into(), "bbbb".into(), id(2));
        assert_eq!(subtree.shortest_disambiguator_for(id(1)), "-aaaa");
    }

    #[test]
    fn shortest_disambiguator_falls_back_to_kind_and_hash() {
        let mut subtree = DisambiguationSubtree::default();
        subtree.insert("method".into(), "aaaa".into(), id(1));
        subtree.insert("method".into(), "bbbb".into(), id(2));
        subtree.insert("property".into(), "aaaa".into(), id(3));
        assert_eq!(subtree.shortest_disambiguator_for(id(1)), "-method-aaaa");
    }

    #[test]
    fn stable_hash_is_deterministic_and_truncated() {
        let h1 = stable_hash("s:abc", 4);
        let h2 = stable_hash("s:abc", 4);
        assert_eq!(h1, h2);
        assert_eq!(h1.len(), 4);
    }

    #[test]
    fn kind_token_strips_language_prefix() {
        assert_eq!(kind_token("swift.method"), "method");
        assert_eq!(kind_token("method"), "method");
    }
}
