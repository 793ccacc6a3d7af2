//! Identifier & Reference model (spec §3, §4.1).
//!
//! An [`Identifier`] is an opaque, process-unique handle owned by exactly one topic-graph node.
//! A [`Reference`] is the URL-shaped value authors write (or relationships imply) that eventually
//! resolves to one. Grounded on `noet-core::properties::Bid` (an opaque stable id minted per node)
//! and `noet-core::nodekey::NodeKey` (the pre-resolution, string-keyed reference variants).

use std::{
    collections::BTreeSet,
    fmt::{self, Display, Formatter},
};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CatalogError, Result};

/// Opaque, process-unique identifier for one topic-graph node.
///
/// Unlike `noet-core::Bid`, which is deterministically derived from a parent namespace so that
/// graphs can be merged across processes, an `Identifier` here only needs to be unique within the
/// catalog compiling it — the spec requires each graph node to own exactly one, nothing more.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Identifier(Uuid);

impl Identifier {
    pub fn new() -> Self {
        Identifier(Uuid::new_v4())
    }

    /// Deterministic identifier derived from a precise symbol identifier, so that re-registering
    /// the same catalog inputs yields the same topic-graph node identities (spec §8 round-trip
    /// law).
    pub fn from_precise_id(module: &str, precise_id: &str) -> Self {
        static NAMESPACE: Uuid = Uuid::from_bytes([
            0x2c, 0x9a, 0x71, 0x0e, 0x5b, 0x44, 0x4b, 0x0a, 0x8e, 0x21, 0x9d, 0x6f, 0x3a, 0x54,
            0x8c, 0x11,
        ]);
        let key = format!("{module}\u{0}{precise_id}");
        Identifier(Uuid::new_v5(&NAMESPACE, key.as_bytes()))
    }

    /// Deterministic identifier derived from a catalog-relative file path, for document nodes
    /// (articles, tutorials, technologies) that have no precise identifier of their own.
    pub fn from_path(catalog_id: &str, relative_path: &str) -> Self {
        static NAMESPACE: Uuid = Uuid::from_bytes([
            0x7a, 0x1d, 0x4e, 0x90, 0x2f, 0x63, 0x40, 0x77, 0x9b, 0x58, 0x0c, 0x3e, 0x6a, 0x02,
            0x1f, 0x44,
        ]);
        let key = format!("{catalog_id}\u{0}{relative_path}");
        Identifier(Uuid::new_v5(&NAMESPACE, key.as_bytes()))
    }
}

impl Default for Identifier {
    fn default() -> Self {
        Identifier::new()
    }
}

impl Display for Identifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The documentation URL scheme (spec §6: `doc://<catalog-id>/...`).
pub const DOC_SCHEME: &str = "doc";

/// A parsed, possibly partial, reference URL: `[scheme://][catalog-id]/path[#fragment]`.
///
/// Authored text is not always a well-formed absolute URL — `MyClass/myFunc(_:)` has no scheme or
/// host at all, only a path. This parses leniently instead of forcing every authored string
/// through `url::Url`, which requires a base for anything relative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceUrl {
    pub scheme: Option<String>,
    pub catalog_id: Option<String>,
    /// Slash-separated path components, no leading/trailing slash.
    pub path: Vec<String>,
    pub fragment: Option<String>,
    /// Whether the authored text began with `/` (absolute within its catalog).
    pub is_absolute: bool,
}

impl ReferenceUrl {
    pub fn parse(authored: &str) -> Result<Self> {
        let (without_fragment, fragment) = match authored.split_once('#') {
            Some((head, frag)) => (head, Some(frag.to_string())),
            None => (authored, None),
        };

        let (scheme, rest) = match without_fragment.split_once("://") {
            Some((scheme, rest)) => (Some(scheme.to_string()), rest),
            None => (None, without_fragment),
        };

        if let Some(scheme) = &scheme {
            if scheme != DOC_SCHEME {
                return Err(CatalogError::LinkResolution(format!(
                    "unsupported reference scheme: {scheme}"
                )));
            }
        }

        let is_absolute = scheme.is_some() || rest.starts_with('/');
        let trimmed = rest.trim_start_matches('/').trim_end_matches('/');

        let (catalog_id, path_str) = if scheme.is_some() {
            match trimmed.split_once('/') {
                Some((host, path)) => (Some(host.to_string()), path),
                None => (Some(trimmed.to_string()), ""),
            }
        } else {
            (None, trimmed)
        };

        let path = if path_str.is_empty() {
            Vec::new()
        } else {
            path_str.split('/').map(|s| s.to_string()).collect()
        };

        Ok(ReferenceUrl {
            scheme,
            catalog_id,
            path,
            fragment,
            is_absolute,
        })
    }

    pub fn to_authored_string(&self) -> String {
        let mut s = String::new();
        if let Some(scheme) = &self.scheme {
            s.push_str(scheme);
            s.push_str("://");
            if let Some(catalog_id) = &self.catalog_id {
                s.push_str(catalog_id);
            }
            s.push('/');
        } else if self.is_absolute {
            s.push('/');
        }
        s.push_str(&self.path.join("/"));
        if let Some(fragment) = &self.fragment {
            s.push('#');
            s.push_str(fragment);
        }
        s
    }
}

/// Why a reference could not be resolved (spec §3, §7).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedFailure {
    pub authored_text: String,
    /// Every candidate URL the resolver attempted, in attempt order (surfaced verbatim in
    /// diagnostics so the author can see why resolution failed — spec §7).
    pub attempted_candidates: Vec<String>,
    pub reason: String,
}

/// A successfully resolved reference (spec §3). Immutable once constructed — the spec invariant
/// that a `resolved-success` reference never changes for the catalog's lifetime is upheld simply
/// by never exposing a mutable path through [`Reference`] once this variant is reached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedReference {
    pub identifier: Identifier,
    pub catalog_id: String,
    pub path: Vec<String>,
    pub fragment: Option<String>,
    pub source_languages: BTreeSet<String>,
}

impl ResolvedReference {
    /// spec §8: every resolved-success reference has a non-empty `sourceLanguages` set that is a
    /// superset of `{defaultLanguage}`.
    pub fn is_well_formed(&self, default_language: &str) -> bool {
        !self.source_languages.is_empty() && self.source_languages.contains(default_language)
    }

    pub fn absolute_url(&self) -> String {
        let mut s = format!("{DOC_SCHEME}://{}/{}", self.catalog_id, self.path.join("/"));
        if let Some(fragment) = &self.fragment {
            s.push('#');
            s.push_str(fragment);
        }
        s
    }
}

/// A reference in one of its three lifecycle states (spec §3).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reference {
    Unresolved {
        authored_text: String,
        url: ReferenceUrl,
    },
    ResolvedSuccess(ResolvedReference),
    ResolvedFailure(ResolvedFailure),
}

impl Reference {
    pub fn unresolved(authored_text: impl Into<String>) -> Result<Self> {
        let authored_text = authored_text.into();
        let url = ReferenceUrl::parse(&authored_text)?;
        Ok(Reference::Unresolved { authored_text, url })
    }

    pub fn is_resolved(&self) -> bool {
        !matches!(self, Reference::Unresolved { .. })
    }

    pub fn as_resolved_success(&self) -> Option<&ResolvedReference> {
        match self {
            Reference::ResolvedSuccess(r) => Some(r),
            _ => None,
        }
    }

    pub fn identifier(&self) -> Option<Identifier> {
        self.as_resolved_success().map(|r| r.identifier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_absolute_doc_url_with_fragment() {
        let url = ReferenceUrl::parse("doc://MyKit/documentation/MyKit/MyClass#discussion")
            .expect("parse");
        assert_eq!(url.scheme.as_deref(), Some(DOC_SCHEME));
        assert_eq!(url.catalog_id.as_deref(), Some("MyKit"));
        assert_eq!(url.path, vec!["documentation", "MyKit", "MyClass"]);
        assert_eq!(url.fragment.as_deref(), Some("discussion"));
    }

    #[test]
    fn parses_bare_symbol_path() {
        let url = ReferenceUrl::parse("MyClass/myFunc(_:)").expect("parse");
        assert!(url.scheme.is_none());
        assert!(url.catalog_id.is_none());
        assert_eq!(url.path, vec!["MyClass", "myFunc(_:)"]);
        assert!(!url.is_absolute);
    }

    #[test]
    fn parses_rooted_path() {
        let url = ReferenceUrl::parse("/MyKit/MyClass").expect("parse");
        assert!(url.is_absolute);
        assert_eq!(url.path, vec!["MyKit", "MyClass"]);
    }

    #[test]
    fn rejects_non_doc_scheme() {
        let err = ReferenceUrl::parse("https://example.com/page").unwrap_err();
        assert!(matches!(err, CatalogError::LinkResolution(_)));
    }

    #[test]
    fn identifier_from_precise_id_is_deterministic() {
        let a = Identifier::from_precise_id("MyKit", "s:5MyKit7MyClassV3fooyyF");
        let b = Identifier::from_precise_id("MyKit", "s:5MyKit7MyClassV3fooyyF");
        assert_eq!(a, b);
        let c = Identifier::from_precise_id("OtherKit", "s:5MyKit7MyClassV3fooyyF");
        assert_ne!(a, c);
    }

    #[test]
    fn resolved_reference_well_formedness() {
        let mut languages = BTreeSet::new();
        languages.insert("swift".to_string());
        let r = ResolvedReference {
            identifier: Identifier::new(),
            catalog_id: "MyKit".into(),
            path: vec!["documentation".into(), "MyKit".into()],
            fragment: None,
            source_languages: languages,
        };
        assert!(r.is_well_formed("swift"));
        assert!(!r.is_well_formed("occ"));
    }
}
