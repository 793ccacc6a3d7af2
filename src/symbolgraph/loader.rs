//! Symbol graph ingestion and merging (spec §4.1).
//!
//! Reads symbol-graph JSON files, groups them by module, and merges same-precise-id symbols
//! across selectors into one [`UnifiedSymbol`]. Grounded on the multi-file ingestion + merge
//! pipeline in `noet-core::codec::compiler`/`noet-core::codec::builder`, which accumulates
//! per-file "proto" nodes into one session graph the same way this loader accumulates per-file
//! symbol-graph fragments into one [`UnifiedModule`] per module.

use std::{
    collections::{BTreeMap, BTreeSet},
    fs,
    path::PathBuf,
};

use crate::{
    catalog::parse_symbol_graph_filename,
    error::{CatalogError, Result},
    symbolgraph::schema::{
        Availability, DeclarationToken, DocComment, ModuleMetadata, Relationship, Selector,
        SourceOrigin, SymbolGraph, SymbolKind,
    },
};

/// Per-selector data for one unified symbol (spec §4.1: "each unified symbol knows its
/// per-selector variants").
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SymbolVariant {
    pub title: String,
    pub sub_heading: Option<Vec<DeclarationToken>>,
    pub declaration_fragments: Option<Vec<DeclarationToken>>,
    pub doc_comment: Option<DocComment>,
    pub availability: Vec<Availability>,
    pub source_origin: Option<SourceOrigin>,
}

#[derive(Debug, Clone)]
pub struct UnifiedSymbol {
    pub precise_id: String,
    pub kind: SymbolKind,
    pub path_components: Vec<String>,
    pub access_level: String,
    pub variants: BTreeMap<Selector, SymbolVariant>,
    pub source_languages: BTreeSet<String>,
}

impl UnifiedSymbol {
    /// Any one variant, preferring `default_language` when present (spec §4.2 step 4's
    /// "prefer the default language" tie-break reused here for display purposes).
    pub fn preferred_variant(&self, default_language: &str) -> Option<&SymbolVariant> {
        self.variants
            .iter()
            .find(|(selector, _)| selector.interface_language == default_language)
            .or_else(|| self.variants.iter().next())
            .map(|(_, variant)| variant)
    }
}

/// A relationship together with the selector of the file it was read from, so the relationship
/// builder can later reason about which languages/platforms assert it (spec §4.1
/// `relationshipsByLanguage`).
#[derive(Debug, Clone)]
pub struct SelectedRelationship {
    pub selector: Selector,
    pub relationship: Relationship,
}

#[derive(Debug, Clone, Default)]
pub struct UnifiedModule {
    pub name: String,
    pub modules: BTreeMap<Selector, ModuleMetadata>,
    pub symbols: BTreeMap<String, UnifiedSymbol>,
    pub relationships_by_language: BTreeMap<Selector, Vec<Relationship>>,
    /// Relationships whose source or target precise id is absent from `symbols` (spec §4.1, used
    /// for "symbol referenced in relationships but absent from graph" diagnostics, spec §7).
    pub orphan_relationships: Vec<Relationship>,
}

impl UnifiedModule {
    fn relationship_targets_exist(&self, rel: &Relationship) -> bool {
        self.symbols.contains_key(&rel.source) && self.symbols.contains_key(&rel.target)
    }

    fn all_relationships(&self) -> impl Iterator<Item = &Relationship> {
        self.relationships_by_language.values().flatten()
    }

    pub fn recompute_orphans(&mut self) {
        self.orphan_relationships = self
            .all_relationships()
            .filter(|rel| !self.relationship_targets_exist(rel))
            .cloned()
            .collect();
    }
}

pub struct SymbolGraphLoader;

impl SymbolGraphLoader {
    /// Load and merge a catalog's symbol-graph files into one [`UnifiedModule`] per module (spec
    /// §4.1). The first malformed file encountered aborts the whole catalog (spec §4.1 Failure,
    /// §7: "Malformed symbol graph JSON" is not locally recoverable).
    pub fn load(files: &[PathBuf]) -> Result<BTreeMap<String, UnifiedModule>> {
        let mut modules: BTreeMap<String, UnifiedModule> = BTreeMap::new();

        for path in files {
            let file_name = path
                .file_name()
                .and_then(|n| n.to_str())
                .ok_or_else(|| CatalogError::SymbolGraph(format!("non-UTF8 filename: {path:?}")))?;
            let parsed_name = parse_symbol_graph_filename(file_name).ok_or_else(|| {
                CatalogError::SymbolGraph(format!("not a symbol-graph filename: {file_name}"))
            })?;

            let content = fs::read_to_string(path)?;
            let graph = SymbolGraph::parse(&content).map_err(|e| {
                tracing::error!(path = %path.display(), error = %e, "malformed symbol graph JSON");
                CatalogError::SymbolGraph(format!("{}: {e}", path.display()))
            })?;

            let module = modules.entry(parsed_name.module.clone()).or_insert_with(|| {
                UnifiedModule {
                    name: parsed_name.module.clone(),
                    ..Default::default()
                }
            });

            merge_graph_into_module(module, graph)?;
        }

        for module in modules.values_mut() {
            module.recompute_orphans();
        }

        Ok(modules)
    }

    /// Convenience wrapper for callers that already have in-memory content (tests, or a
    /// non-filesystem data provider).
    pub fn load_from_sources(
        sources: impl IntoIterator<Item = (String, String)>,
    ) -> Result<BTreeMap<String, UnifiedModule>> {
        let mut modules: BTreeMap<String, UnifiedModule> = BTreeMap::new();
        for (file_name, content) in sources {
            let parsed_name = parse_symbol_graph_filename(&file_name).ok_or_else(|| {
                CatalogError::SymbolGraph(format!("not a symbol-graph filename: {file_name}"))
            })?;
            let graph = SymbolGraph::parse(&content)
                .map_err(|e| CatalogError::SymbolGraph(format!("{file_name}: {e}")))?;
            let module = modules.entry(parsed_name.module.clone()).or_insert_with(|| {
                UnifiedModule {
                    name: parsed_name.module.clone(),
                    ..Default::default()
                }
            });
            merge_graph_into_module(module, graph)?;
        }
        for module in modules.values_mut() {
            module.recompute_orphans();
        }
        Ok(modules)
    }
}

fn merge_graph_into_module(module: &mut UnifiedModule, graph: SymbolGraph) -> Result<()> {
    for symbol in &graph.symbols {
        let selector = graph.selector(symbol);
        let precise_id = symbol.identifier.precise.clone();

        let unified = module
            .symbols
            .entry(precise_id.clone())
            .or_insert_with(|| UnifiedSymbol {
                precise_id: precise_id.clone(),
                kind: symbol.kind.clone(),
                path_components: symbol.path_components.clone(),
                access_level: symbol.access_level.clone(),
                variants: BTreeMap::new(),
                source_languages: BTreeSet::new(),
            });

        // spec §8 boundary: a declaration without an OS name must not be mixed with OS-named
        // declarations for the same precise id.
        let has_os_variant = unified.variants.keys().any(|s| s.platform.is_some());
        let has_os_free_variant = unified.variants.keys().any(|s| s.platform.is_none());
        let introduces_conflict = (selector.platform.is_some() && has_os_free_variant)
            || (selector.platform.is_none() && has_os_variant);
        if introduces_conflict {
            return Err(CatalogError::SymbolGraph(format!(
                "symbol {precise_id} mixes an OS-qualified declaration with an unqualified one"
            )));
        }

        unified.source_languages.insert(selector.interface_language.clone());
        unified.variants.insert(
            selector.clone(),
            SymbolVariant {
                title: symbol.names.title.clone(),
                sub_heading: symbol.names.sub_heading.clone(),
                declaration_fragments: symbol.mixins.declaration_fragments.clone(),
                doc_comment: symbol.doc_comment.clone(),
                availability: symbol.mixins.availability.clone(),
                source_origin: symbol.mixins.source_origin.clone(),
            },
        );

        module.modules.entry(selector).or_insert_with(|| graph.module.clone());
    }

    for relationship in &graph.relationships {
        // Relationships are attributed to every selector declared by their source symbol in this
        // file, matching the spec's "selector = interface-language x platform" grouping.
        let selectors: Vec<Selector> = graph
            .symbols
            .iter()
            .filter(|s| s.identifier.precise == relationship.source)
            .map(|s| graph.selector(s))
            .collect();
        let selectors = if selectors.is_empty() {
            vec![Selector::new(
                graph
                    .symbols
                    .first()
                    .map(|s| s.identifier.interface_language.clone())
                    .unwrap_or_default(),
                None,
            )]
        } else {
            selectors
        };
        for selector in selectors {
            module
                .relationships_by_language
                .entry(selector)
                .or_default()
                .push(relationship.clone());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(module: &str, language: &str, os: Option<&str>) -> String {
        let platform = match os {
            Some(os) => format!(r#"{{"operatingSystem": {{"name": "{os}"}}}}"#),
            None => "null".to_string(),
        };
        format!(
            r#"{{
                "module": {{"name": "{module}", "platform": {platform}}},
                "symbols": [{{
                    "identifier": {{"precise": "s:foo", "interfaceLanguage": "{language}"}},
                    "names": {{"title": "foo()"}},
                    "pathComponents": ["MyClass", "foo()"],
                    "kind": {{"identifier": "swift.method", "displayName": "Instance Method"}}
                }}],
                "relationships": []
            }}"#
        )
    }

    #[test]
    fn loads_single_module_single_symbol() {
        let modules = SymbolGraphLoader::load_from_sources([(
            "MyKit.symbols.json".to_string(),
            sample("MyKit", "swift", Some("macos")),
        )])
        .expect("load");
        let module = modules.get("MyKit").expect("module present");
        assert_eq!(module.symbols.len(), 1);
        let symbol = module.symbols.get("s:foo").expect("symbol present");
        assert_eq!(symbol.variants.len(), 1);
        assert!(symbol.source_languages.contains("swift"));
    }

    #[test]
    fn merges_same_precise_id_across_platforms() {
        let modules = SymbolGraphLoader::load_from_sources([
            (
                "MyKit.symbols.json".to_string(),
                sample("MyKit", "swift", Some("macos")),
            ),
            (
                "MyKit@ios.symbols.json".to_string(),
                sample("MyKit", "swift", Some("ios")),
            ),
        ])
        .expect("load");
        let module = modules.get("MyKit").expect("module");
        let symbol = module.symbols.get("s:foo").expect("symbol");
        assert_eq!(symbol.variants.len(), 2);
    }

    #[test]
    fn os_qualified_and_unqualified_variants_conflict() {
        let result = SymbolGraphLoader::load_from_sources([
            (
                "MyKit.symbols.json".to_string(),
                sample("MyKit", "swift", None),
            ),
            (
                "MyKit@ios.symbols.json".to_string(),
                sample("MyKit", "swift", Some("ios")),
            ),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn malformed_json_is_fatal() {
        let result = SymbolGraphLoader::load_from_sources([(
            "MyKit.symbols.json".to_string(),
            "{not json".to_string(),
        )]);
        assert!(matches!(result, Err(CatalogError::SymbolGraph(_))));
    }

    #[test]
    fn empty_symbol_graph_still_creates_module() {
        let modules = SymbolGraphLoader::load_from_sources([(
            "Empty.symbols.json".to_string(),
            r#"{"module": {"name": "Empty"}, "symbols": [], "relationships": []}"#.to_string(),
        )])
        .expect("load");
        assert!(modules.contains_key("Empty"));
        assert!(modules["Empty"].symbols.is_empty());
    }

    #[test]
    fn orphan_relationship_is_recorded() {
        let src = r#"{
            "module": {"name": "MyKit"},
            "symbols": [{
                "identifier": {"precise": "s:a", "interfaceLanguage": "swift"},
                "names": {"title": "A"},
                "kind": {"identifier": "swift.class", "displayName": "Class"}
            }],
            "relationships": [{"source": "s:a", "target": "s:missing", "kind": "inheritsFrom"}]
        }"#;
        let modules =
            SymbolGraphLoader::load_from_sources([("MyKit.symbols.json".to_string(), src.to_string())])
                .expect("load");
        assert_eq!(modules["MyKit"].orphan_relationships.len(), 1);
    }
}
