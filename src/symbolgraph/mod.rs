//! Symbol graph ingestion (spec §4.1, §6).

pub mod loader;
pub mod schema;

pub use loader::{SelectedRelationship, SymbolGraphLoader, SymbolVariant, UnifiedModule, UnifiedSymbol};
pub use schema::{
    Availability, DeclarationToken, DocComment, DocCommentLine, ModuleMetadata, Names,
    OperatingSystem, PlatformMetadata, Relationship, RelationshipKind, RelationshipMixins,
    Selector, SourceOrigin, SourcePosition, SourceRange, Symbol, SymbolGraph, SymbolIdentifier,
    SymbolKind, VersionTriple,
};
