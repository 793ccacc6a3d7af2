//! Wire schema for symbol-graph JSON input (spec §6).
//!
//! These types mirror the canonical subset required by the spec exactly; unknown fields are
//! ignored (`#[serde(default)]` everywhere a field is optional) so this crate tolerates
//! additional vendor-specific mixins without failing to decode. Grounded on the struct-per-wire-
//! field style of `noet-core::codec::belief_ir`, which keeps wire structs separate from the
//! in-memory model they're converted into.

use serde::{Deserialize, Serialize};

/// A single `(interface-language, platform)` pair used to key per-variant symbol data (spec
/// §4.1).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Selector {
    pub interface_language: String,
    pub platform: Option<String>,
}

impl Selector {
    pub fn new(interface_language: impl Into<String>, platform: Option<String>) -> Self {
        Selector {
            interface_language: interface_language.into(),
            platform,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatingSystem {
    pub name: Option<String>,
    pub minimum_version: Option<VersionTriple>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionTriple {
    pub major: u32,
    #[serde(default)]
    pub minor: u32,
    #[serde(default)]
    pub patch: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformMetadata {
    pub architecture: Option<String>,
    pub vendor: Option<String>,
    #[serde(default)]
    pub operating_system: Option<OperatingSystem>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleMetadata {
    pub name: String,
    #[serde(default)]
    pub platform: Option<PlatformMetadata>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolIdentifier {
    pub precise: String,
    pub interface_language: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Names {
    pub title: String,
    #[serde(default)]
    pub navigator: Option<Vec<DeclarationToken>>,
    #[serde(default)]
    pub sub_heading: Option<Vec<DeclarationToken>>,
    #[serde(default)]
    pub prose: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeclarationToken {
    pub kind: String,
    pub spelling: String,
    #[serde(default)]
    pub precise_identifier: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolKind {
    pub identifier: String,
    pub display_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocCommentLine {
    pub text: String,
    #[serde(default)]
    pub range: Option<SourceRange>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocComment {
    #[serde(default)]
    pub lines: Vec<DocCommentLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourcePosition {
    pub line: u32,
    pub character: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceRange {
    pub start: SourcePosition,
    pub end: SourcePosition,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceOrigin {
    pub identifier: String,
    pub display_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Availability {
    pub domain: Option<String>,
    #[serde(default)]
    pub introduced: Option<VersionTriple>,
    #[serde(default)]
    pub deprecated: Option<VersionTriple>,
    #[serde(default)]
    pub is_unconditionally_deprecated: bool,
}

/// Grab-bag of optional per-symbol payloads (spec §6 `mixins{...}`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolMixins {
    #[serde(default)]
    pub declaration_fragments: Option<Vec<DeclarationToken>>,
    #[serde(default)]
    pub availability: Vec<Availability>,
    #[serde(default)]
    pub source_origin: Option<SourceOrigin>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Symbol {
    pub identifier: SymbolIdentifier,
    pub names: Names,
    #[serde(default)]
    pub path_components: Vec<String>,
    #[serde(default)]
    pub doc_comment: Option<DocComment>,
    #[serde(default = "default_access_level")]
    pub access_level: String,
    pub kind: SymbolKind,
    #[serde(default)]
    pub mixins: SymbolMixins,
}

fn default_access_level() -> String {
    "public".to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RelationshipKind {
    MemberOf,
    OptionalMemberOf,
    RequirementOf,
    OptionalRequirementOf,
    DefaultImplementationOf,
    ConformsTo,
    InheritsFrom,
    DeclaredIn,
    InContextOf,
}

impl RelationshipKind {
    pub fn is_requirement_like(self) -> bool {
        matches!(
            self,
            RelationshipKind::MemberOf
                | RelationshipKind::OptionalMemberOf
                | RelationshipKind::RequirementOf
                | RelationshipKind::OptionalRequirementOf
        )
    }

    pub fn is_optional(self) -> bool {
        matches!(
            self,
            RelationshipKind::OptionalMemberOf | RelationshipKind::OptionalRequirementOf
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    pub source: String,
    pub target: String,
    pub kind: RelationshipKind,
    #[serde(default)]
    pub mixins: Option<RelationshipMixins>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipMixins {
    #[serde(default)]
    pub source_origin: Option<SourceOrigin>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolGraph {
    pub module: ModuleMetadata,
    #[serde(default)]
    pub symbols: Vec<Symbol>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
}

impl SymbolGraph {
    pub fn parse(content: &str) -> crate::error::Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn selector(&self, symbol: &Symbol) -> Selector {
        Selector::new(
            symbol.identifier.interface_language.clone(),
            self.module
                .platform
                .as_ref()
                .and_then(|p| p.operating_system.as_ref())
                .and_then(|os| os.name.clone()),
        )
    }
}
