//! Topic graph node types (spec §3).

use std::collections::BTreeSet;

use crate::{identifier::Identifier, symbolgraph::Availability};

/// Every node kind the registrar, relationship builder, or curator can produce (spec §3, §4.4).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Module,
    Technology,
    Tutorial,
    TutorialArticle,
    Article,
    Collection,
    Landmark,
    /// `symbol-*` variants are not individually enumerated by the spec; the symbol's own kind
    /// identifier (e.g. `swift.method`) carries that detail.
    Symbol(String),
    Snippet,
    SnippetGroup,
    HttpRequest,
    Dictionary,
}

impl NodeKind {
    pub fn is_symbol(&self) -> bool {
        matches!(self, NodeKind::Symbol(_))
    }
}

/// Where a topic-graph node's content lives (spec §3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentLocation {
    File(String),
    Range { start_line: u32, end_line: u32, url: String },
    External,
}

/// One vertex of the topic graph (spec §3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicGraphNode {
    pub reference: Identifier,
    pub kind: NodeKind,
    pub title: String,
    pub content_location: ContentLocation,
    /// Never rendered as its own page (spec §3; e.g. a symbol-graph module shell).
    pub is_virtual: bool,
    /// Unrenderable container pruned once its children are curated elsewhere (spec §4.6 "extended
    /// symbol pruning").
    pub is_empty_extension: bool,
}

impl TopicGraphNode {
    pub fn new(reference: Identifier, kind: NodeKind, title: impl Into<String>, content_location: ContentLocation) -> Self {
        TopicGraphNode {
            reference,
            kind,
            title: title.into(),
            content_location,
            is_virtual: false,
            is_empty_extension: false,
        }
    }
}

/// Where a doc-chunk's prose came from (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocChunkOrigin {
    SourceComment,
    Extension,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocChunk {
    pub origin: DocChunkOrigin,
    pub text: String,
}

/// Per-language symbol payload carried by a symbol documentation node (spec §3 "Symbol").
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolPayload {
    pub precise_id: String,
    pub title: String,
    pub kind_identifier: String,
    pub sub_heading: Option<Vec<String>>,
    pub availability: Vec<Availability>,
    pub access_level: String,
    pub module_reference: Identifier,
    /// Set when this symbol's docs were inherited from another symbol (spec §4.3 `SourceOrigin`).
    pub inherited_from: Option<String>,
}

/// A single in-memory page (spec §3 "Documentation Node"). `semantic_value` is treated as opaque
/// by everything except the markup layer; it is `None` for symbol-only pages that never had
/// authored prose.
#[derive(Debug, Clone)]
pub struct DocumentationNode {
    pub reference: Identifier,
    pub kind: NodeKind,
    pub source_languages: BTreeSet<String>,
    pub semantic_value: Option<crate::markup::ParsedMarkup>,
    pub symbol: Option<SymbolPayload>,
    pub doc_chunks: Vec<DocChunk>,
}

impl DocumentationNode {
    pub fn new(reference: Identifier, kind: NodeKind) -> Self {
        DocumentationNode {
            reference,
            kind,
            source_languages: BTreeSet::new(),
            semantic_value: None,
            symbol: None,
            doc_chunks: Vec::new(),
        }
    }
}
