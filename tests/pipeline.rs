//! End-to-end scenarios that wire several modules together the way an embedding compiler would:
//! symbol-graph ingestion -> path hierarchy -> topic graph -> curation -> link resolution.
//! Per-module edge cases already have focused unit-test coverage; these exercise the seams.

use std::collections::BTreeMap;

use doccat_core::{
    config::CompilerOptions,
    curator::{CrawlPage, Curator},
    diagnostics::{DiagnosticEngine, Problem, ProblemIdentifier, Severity},
    identifier::Identifier,
    linkresolver::{ExternalResolver, LinkResolver, ResolutionContext, ResolvedInformation},
    markup::TopicsTaskGroup,
    pathhierarchy::{LookupOutcome, PathHierarchy},
    registrar::DocumentRegistrar,
    symbolgraph::SymbolGraphLoader,
    topicgraph::{ContentLocation, NodeKind, TopicGraph, TopicGraphNode},
};

const CATALOG_ID: &str = "MyKit";

fn overload_module() -> BTreeMap<String, doccat_core::symbolgraph::UnifiedModule> {
    let src = r#"{
        "module": {"name": "MyKit"},
        "symbols": [
            {
                "identifier": {"precise": "s:foo-int", "interfaceLanguage": "swift"},
                "names": {"title": "foo()"},
                "pathComponents": ["foo()"],
                "kind": {"identifier": "swift.method", "displayName": "Instance Method"}
            },
            {
                "identifier": {"precise": "s:foo-string", "interfaceLanguage": "swift"},
                "names": {"title": "foo()"},
                "pathComponents": ["foo()"],
                "kind": {"identifier": "swift.method", "displayName": "Instance Method"}
            }
        ],
        "relationships": []
    }"#;
    SymbolGraphLoader::load_from_sources([("MyKit.symbols.json".to_string(), src.to_string())])
        .expect("load")
}

/// Scenario: a collision the path hierarchy reports is surfaced as a `LookupCollision`
/// diagnostic with every candidate's disambiguated path enumerated (spec §7).
#[test]
fn overload_collision_is_reported_with_every_disambiguated_candidate() {
    let modules = overload_module();
    let options = CompilerOptions::default();
    let (hierarchy, cycles) = PathHierarchy::build(&modules, options.disambiguation_hash_length).expect("build");
    assert!(cycles.is_empty());

    let mut diagnostics = DiagnosticEngine::new();
    match hierarchy.find("/MyKit/foo()", None, &options.default_language) {
        LookupOutcome::Collision { candidates, disambiguations } => {
            assert_eq!(candidates.len(), 2);
            let notes: Vec<String> = candidates
                .iter()
                .map(|id| {
                    let precise = hierarchy.node(*id).symbol_precise_id.clone().unwrap();
                    format!("{precise}{}", disambiguations[id])
                })
                .collect();
            diagnostics.record(
                Problem::new(Severity::Warning, ProblemIdentifier::LookupCollision, "ambiguous reference 'foo()'")
                    .with_notes(notes),
            );
        }
        other => panic!("expected collision, got {other:?}"),
    }

    assert_eq!(diagnostics.problems().len(), 1);
    assert_eq!(diagnostics.problems()[0].notes.len(), 2);
    assert_ne!(diagnostics.problems()[0].notes[0], diagnostics.problems()[0].notes[1]);

    for precise_id in ["s:foo-int", "s:foo-string"] {
        let canonical = hierarchy.canonical_path(precise_id).expect("canonical path");
        match hierarchy.find(&format!("/{canonical}"), None, &options.default_language) {
            LookupOutcome::Found(id) => {
                assert_eq!(hierarchy.node(id).symbol_precise_id.as_deref(), Some(precise_id));
            }
            other => panic!("expected found, got {other:?}"),
        }
    }
}

/// Scenario: a standalone markup file whose H1 is a symbol link is classified as a documentation
/// extension by the registrar, and the link resolver independently resolves that same target to
/// the symbol's page, confirming the two subsystems agree without either one knowing about the
/// other (spec §4.4, §4.5).
#[test]
fn documentation_extension_target_matches_the_symbol_the_resolver_finds() {
    let src = r#"{
        "module": {"name": "MyKit"},
        "symbols": [{
            "identifier": {"precise": "s:bar", "interfaceLanguage": "swift"},
            "names": {"title": "bar()"},
            "pathComponents": ["MyClass", "bar()"],
            "kind": {"identifier": "swift.method", "displayName": "Instance Method"}
        }],
        "relationships": []
    }"#;
    let modules: BTreeMap<_, _> =
        SymbolGraphLoader::load_from_sources([("MyKit.symbols.json".to_string(), src.to_string())]).expect("load");
    let (hierarchy, _) = PathHierarchy::build(&modules, 4).expect("build");

    let mut diagnostics = DiagnosticEngine::new();
    let files = vec![(
        "MyClass_bar.md".to_string(),
        "# ``MyKit/MyClass/bar()``\n\nExtra discussion of `bar()`.\n".to_string(),
    )];
    let output = DocumentRegistrar::register(CATALOG_ID, &files, &mut diagnostics);
    assert!(output.pages.is_empty());
    let extension = &output.extensions[0];

    let resolver = LinkResolver::new();
    let empty_lookup = |_: &str| None;
    let ctx = ResolutionContext {
        local_catalog_id: CATALOG_ID,
        default_language: "swift",
        path_hierarchy: &hierarchy,
        lookup_whole_graph: &empty_lookup,
        parent_path: None,
        parent_module: None,
    };
    let reference = resolver.resolve(&extension.target_link, None, true, &ctx);
    let resolved = reference.as_resolved_success().expect("resolved");
    assert_eq!(resolved.identifier, Identifier::from_precise_id("MyKit", "s:bar"));
}

struct FakeExternalResolver;

impl ExternalResolver for FakeExternalResolver {
    fn resolve_topic(&mut self, url: &str) -> doccat_core::error::Result<ResolvedInformation> {
        Ok(ResolvedInformation {
            kind: "article".to_string(),
            url: format!("documentation/OtherKit/{url}"),
            title: "Remote Page".to_string(),
            abstract_text: None,
            language: "swift".to_string(),
            available_languages: vec!["swift".to_string()],
        })
    }

    fn resolve_symbol(&mut self, precise_id: &str) -> doccat_core::error::Result<ResolvedInformation> {
        Ok(ResolvedInformation {
            kind: "symbol".to_string(),
            url: format!("documentation/OtherKit/{precise_id}"),
            title: precise_id.to_string(),
            abstract_text: None,
            language: "swift".to_string(),
            available_languages: vec!["swift".to_string()],
        })
    }
}

/// Scenario: a reference naming a foreign catalog ID falls through every local candidate and is
/// handed to the registered external resolver, whose answer becomes a resolved-success reference
/// (spec §4.5 step 6, §6).
#[test]
fn cross_catalog_reference_falls_back_to_the_registered_external_resolver() {
    let modules: BTreeMap<_, _> = SymbolGraphLoader::load_from_sources([(
        "MyKit.symbols.json".to_string(),
        r#"{"module": {"name": "MyKit"}, "symbols": [], "relationships": []}"#.to_string(),
    )])
    .expect("load");
    let (hierarchy, _) = PathHierarchy::build(&modules, 4).expect("build");

    let resolver = LinkResolver::new();
    resolver.register_external("OtherKit", Box::new(FakeExternalResolver));
    let empty_lookup = |_: &str| None;
    let ctx = ResolutionContext {
        local_catalog_id: CATALOG_ID,
        default_language: "swift",
        path_hierarchy: &hierarchy,
        lookup_whole_graph: &empty_lookup,
        parent_path: None,
        parent_module: None,
    };

    let reference = resolver.resolve("doc://OtherKit/documentation/OtherKit/Widget", None, false, &ctx);
    let resolved = reference.as_resolved_success().expect("resolved");
    assert_eq!(resolved.catalog_id, "OtherKit");
}

fn container_and_member_module() -> BTreeMap<String, doccat_core::symbolgraph::UnifiedModule> {
    let src = r#"{
        "module": {"name": "MyKit"},
        "symbols": [
            {
                "identifier": {"precise": "s:container", "interfaceLanguage": "swift"},
                "names": {"title": "Container"},
                "pathComponents": ["Container"],
                "kind": {"identifier": "swift.class", "displayName": "Class"}
            },
            {
                "identifier": {"precise": "s:member", "interfaceLanguage": "swift"},
                "names": {"title": "member"},
                "pathComponents": ["member"],
                "kind": {"identifier": "swift.property", "displayName": "Instance Property"}
            }
        ],
        "relationships": [{"source": "s:member", "target": "s:container", "kind": "memberOf"}]
    }"#;
    SymbolGraphLoader::load_from_sources([("MyKit.symbols.json".to_string(), src.to_string())]).expect("load")
}

fn topic_graph_for(modules: &BTreeMap<String, doccat_core::symbolgraph::UnifiedModule>) -> TopicGraph {
    let mut graph = TopicGraph::new();
    for module in modules.values() {
        let module_id = Identifier::from_path(CATALOG_ID, &module.name);
        graph.insert_node(TopicGraphNode::new(
            module_id,
            NodeKind::Module,
            module.name.clone(),
            ContentLocation::External,
        ));
        for symbol in module.symbols.values() {
            let id = Identifier::from_precise_id(&module.name, &symbol.precise_id);
            let variant = symbol.preferred_variant("swift").expect("variant");
            graph.insert_node(TopicGraphNode::new(
                id,
                NodeKind::Symbol(symbol.kind.identifier.clone()),
                variant.title.clone(),
                ContentLocation::External,
            ));
        }
    }
    graph
}

fn identifier_for_node<'a>(
    hierarchy: &'a PathHierarchy,
) -> impl Fn(doccat_core::pathhierarchy::NodeId) -> Identifier + 'a {
    move |node_id| {
        let node = hierarchy.node(node_id);
        match &node.symbol_precise_id {
            Some(precise_id) => Identifier::from_precise_id(hierarchy.root_name_of(node_id).unwrap_or(CATALOG_ID), precise_id),
            None => Identifier::from_path(CATALOG_ID, &node.name),
        }
    }
}

/// Scenario: a member that is both authored into a manual Topics list on one page and would also
/// be auto-curated under its path-hierarchy container keeps only the manual parent once
/// reconciliation runs (spec §4.6 "reconciliation").
#[test]
fn manual_curation_wins_over_automatic_after_full_pipeline_reconciliation() {
    let modules = container_and_member_module();
    let (hierarchy, cycles) = PathHierarchy::build(&modules, 4).expect("build");
    assert!(cycles.is_empty());

    let mut graph = topic_graph_for(&modules);
    let container_id = Identifier::from_precise_id("MyKit", "s:container");
    let member_id = Identifier::from_precise_id("MyKit", "s:member");

    let manual_parent_id = Identifier::from_path(CATALOG_ID, "Guide.md");
    graph.insert_node(TopicGraphNode::new(
        manual_parent_id,
        NodeKind::Article,
        "Guide",
        ContentLocation::File("Guide.md".to_string()),
    ));

    let resolver = LinkResolver::new();
    let empty_lookup_graph = graph.clone();
    let lookup_whole_graph = move |path: &str| -> Option<Identifier> {
        let trimmed = path.trim_start_matches("documentation/");
        empty_lookup_graph
            .node_ids()
            .find(|&id| empty_lookup_graph.node(id).map(|n| n.title == trimmed).unwrap_or(false))
    };
    let ctx_for = |_: Identifier| ResolutionContext {
        local_catalog_id: CATALOG_ID,
        default_language: "swift",
        path_hierarchy: &hierarchy,
        lookup_whole_graph: &lookup_whole_graph,
        parent_path: None,
        parent_module: None,
    };

    let pages = vec![CrawlPage {
        identifier: manual_parent_id,
        topics: vec![TopicsTaskGroup {
            heading: Some("See Also".to_string()),
            links: vec!["MyKit/Container/member".to_string()],
        }],
    }];

    let identifier_for = identifier_for_node(&hierarchy);
    let report = Curator::curate(
        &mut graph,
        &hierarchy,
        &resolver,
        &identifier_for,
        &pages,
        &ctx_for,
        &[],
        None,
        &BTreeMap::new(),
        &|_| false,
        &|_| false,
        &[container_id, manual_parent_id],
    );

    // The member was already manually curated under `Guide.md` by the time automatic curation
    // reached it, so it never receives an automatic edge from its path-hierarchy container;
    // the childless container itself still gets auto-curated under the module root.
    assert_eq!(graph.parents(member_id), &[manual_parent_id]);
    assert!(graph.children(container_id).is_empty());
    let module_id = Identifier::from_path(CATALOG_ID, "MyKit");
    assert_eq!(graph.parents(container_id), &[module_id]);
    assert_eq!(report.automatic_edges, vec![(container_id, module_id)]);
}

/// Scenario: registering the exact same catalog inputs twice through the full ingestion ->
/// hierarchy -> topic-graph pipeline produces identical node identities and an identical
/// structural hash (spec §8 round-trip/idempotence law).
#[test]
fn re_registering_identical_inputs_yields_an_identical_topic_graph() {
    let build_once = || {
        let modules = container_and_member_module();
        let (hierarchy, _) = PathHierarchy::build(&modules, 4).expect("build");
        let mut graph = topic_graph_for(&modules);
        let container_id = Identifier::from_precise_id("MyKit", "s:container");
        let member_id = Identifier::from_precise_id("MyKit", "s:member");
        graph.add_edge(container_id, member_id);
        graph
    };

    let first = build_once();
    let second = build_once();
    assert_eq!(first.structural_hash(), second.structural_hash());
    assert!(first.is_consistent());
    assert!(second.is_consistent());
}

/// A root-collection article (`@TechnologyRoot` without its own top-level directive) is
/// classified as `NodeKind::Collection` by the registrar (spec §4.4).
#[test]
fn technology_root_article_is_classified_as_a_root_collection() {
    let mut diagnostics = DiagnosticEngine::new();
    let files = vec![(
        "index.md".to_string(),
        "@TechnologyRoot\n\n# MyKit\n\nOverview text.\n".to_string(),
    )];
    let output = DocumentRegistrar::register(CATALOG_ID, &files, &mut diagnostics);
    assert_eq!(output.pages.len(), 1);
    assert_eq!(output.pages[0].kind, NodeKind::Collection);
    assert!(output.pages[0].parsed.has_technology_root);
}
