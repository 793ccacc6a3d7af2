//! Curator: two-pass manual/automatic curation plus reconciliation and pruning (spec §4.6).

use std::collections::{BTreeMap, BTreeSet};

use crate::{
    identifier::Identifier,
    linkresolver::{LinkResolver, ResolutionContext},
    markup::TopicsTaskGroup,
    pathhierarchy::{NodeId, PathHierarchy},
    topicgraph::TopicGraph,
};

/// A page with authored *Topics* sections to crawl during manual curation (spec §4.6 pass 1/2).
pub struct CrawlPage {
    pub identifier: Identifier,
    pub topics: Vec<TopicsTaskGroup>,
}

#[derive(Debug, Clone, Default)]
pub struct CurationReport {
    /// Every reference that was successfully manually curated (spec §4.6 pass 1/2).
    pub manually_curated: BTreeSet<Identifier>,
    /// `(child, parent)` pairs added automatically (spec §4.6 "automatic curation").
    pub automatic_edges: Vec<(Identifier, Identifier)>,
}

pub struct Curator;

impl Curator {
    /// Crawl one batch of pages' Topics sections, adding manual edges for every link that
    /// resolves and is not already a child (spec §4.6 pass 1 / pass 2).
    fn crawl_pass<'a>(
        topic_graph: &mut TopicGraph,
        resolver: &LinkResolver,
        pages: &[CrawlPage],
        ctx_for: &dyn Fn(Identifier) -> ResolutionContext<'a>,
        manually_curated: &mut BTreeSet<Identifier>,
    ) {
        for page in pages {
            for group in &page.topics {
                for link in &group.links {
                    let ctx = ctx_for(page.identifier);
                    let mut reference = resolver.resolve(link, Some(page.identifier), true, &ctx);
                    if !reference.is_resolved() {
                        reference = resolver.resolve(link, Some(page.identifier), false, &ctx);
                    }
                    let Some(target) = reference.identifier() else {
                        continue;
                    };
                    if !topic_graph.contains(target) {
                        continue;
                    }
                    if topic_graph.add_edge(page.identifier, target) {
                        manually_curated.insert(target);
                    }
                }
            }
        }
    }

    /// Automatic curation: every symbol with no parent in the topic graph after pass 1 is given
    /// one edge from its natural parent in the path hierarchy (spec §4.6).
    fn auto_curate(
        topic_graph: &mut TopicGraph,
        path_hierarchy: &PathHierarchy,
        identifier_for: &dyn Fn(NodeId) -> Identifier,
        report: &mut CurationReport,
    ) {
        for (_, &root) in path_hierarchy.roots() {
            Self::auto_curate_subtree(topic_graph, path_hierarchy, root, identifier_for, report);
        }
    }

    fn auto_curate_subtree(
        topic_graph: &mut TopicGraph,
        path_hierarchy: &PathHierarchy,
        node_id: NodeId,
        identifier_for: &dyn Fn(NodeId) -> Identifier,
        report: &mut CurationReport,
    ) {
        let node = path_hierarchy.node(node_id);
        if node.symbol_precise_id.is_some() {
            let child_id = identifier_for(node_id);
            if topic_graph.contains(child_id) && !topic_graph.has_parent(child_id) {
                if let Some(parent_node_id) = node.parent {
                    let parent_id = identifier_for(parent_node_id);
                    if topic_graph.contains(parent_id) && topic_graph.add_edge(parent_id, child_id) {
                        report.automatic_edges.push((child_id, parent_id));
                    }
                }
            }
        }
        let children: Vec<NodeId> = node
            .children
            .values()
            .flat_map(|subtree| subtree.iter().map(|(_, &id)| id))
            .collect();
        for child in children {
            Self::auto_curate_subtree(topic_graph, path_hierarchy, child, identifier_for, report);
        }
    }

    /// For every automatic pair, remove the automatic edge if the child ended up with more than
    /// one parent (spec §4.6 "reconciliation").
    fn reconcile(topic_graph: &mut TopicGraph, report: &mut CurationReport) {
        report.automatic_edges.retain(|&(child, parent)| {
            if topic_graph.parents(child).len() > 1 {
                topic_graph.remove_edge(parent, child);
                false
            } else {
                true
            }
        });
    }

    /// Attach every article with neither parents nor children to the sole root module under a
    /// synthetic "Articles" group (spec §4.6).
    fn curate_orphan_articles(topic_graph: &mut TopicGraph, article_ids: &[Identifier], sole_root: Option<Identifier>) {
        let Some(root) = sole_root else { return };
        for &article in article_ids {
            if !topic_graph.has_parent(article) && !topic_graph.has_children(article) {
                topic_graph.add_edge(root, article);
            }
        }
    }

    /// Depth-first extended-symbol pruning (spec §4.6). `is_extended_symbol_container` flags which
    /// nodes are placeholder containers eligible for pruning; a container with no documentation
    /// extension and (after this pass) no remaining children is marked virtual + empty-extension
    /// and detached.
    fn prune_extended_symbols(
        topic_graph: &mut TopicGraph,
        roots: &[Identifier],
        is_extended_symbol_container: &dyn Fn(Identifier) -> bool,
        has_documentation_extension: &dyn Fn(Identifier) -> bool,
    ) {
        let mut visited = BTreeSet::new();
        for &root in roots {
            Self::prune_subtree(
                topic_graph,
                root,
                is_extended_symbol_container,
                has_documentation_extension,
                &mut visited,
            );
        }
    }

    fn prune_subtree(
        topic_graph: &mut TopicGraph,
        id: Identifier,
        is_extended_symbol_container: &dyn Fn(Identifier) -> bool,
        has_documentation_extension: &dyn Fn(Identifier) -> bool,
        visited: &mut BTreeSet<Identifier>,
    ) {
        if !visited.insert(id) {
            return;
        }
        let children: Vec<Identifier> = topic_graph.children(id).to_vec();
        for child in &children {
            Self::prune_subtree(
                topic_graph,
                *child,
                is_extended_symbol_container,
                has_documentation_extension,
                visited,
            );
        }

        if is_extended_symbol_container(id)
            && topic_graph.children(id).is_empty()
            && !has_documentation_extension(id)
        {
            if let Some(node) = topic_graph.node_mut(id) {
                node.is_virtual = true;
                node.is_empty_extension = true;
            }
            topic_graph.remove_all_edges(id);
        }
    }

    /// Run the full curation algorithm (spec §4.6): pass 1, automatic curation, pass 2,
    /// reconciliation, orphan-article curation, then extended-symbol pruning.
    #[allow(clippy::too_many_arguments)]
    pub fn curate<'a>(
        topic_graph: &mut TopicGraph,
        path_hierarchy: &PathHierarchy,
        resolver: &LinkResolver,
        identifier_for: &dyn Fn(NodeId) -> Identifier,
        initial_pages: &[CrawlPage],
        ctx_for: &dyn Fn(Identifier) -> ResolutionContext<'a>,
        article_ids: &[Identifier],
        sole_root: Option<Identifier>,
        extension_pages: &BTreeMap<Identifier, Vec<TopicsTaskGroup>>,
        is_extended_symbol_container: &dyn Fn(Identifier) -> bool,
        has_documentation_extension: &dyn Fn(Identifier) -> bool,
        roots: &[Identifier],
    ) -> CurationReport {
        let mut report = CurationReport::default();

        Self::crawl_pass(topic_graph, resolver, initial_pages, ctx_for, &mut report.manually_curated);
        Self::auto_curate(topic_graph, path_hierarchy, identifier_for, &mut report);

        let pass_two_pages: Vec<CrawlPage> = report
            .automatic_edges
            .iter()
            .filter_map(|&(child, _)| {
                extension_pages.get(&child).map(|topics| CrawlPage {
                    identifier: child,
                    topics: topics.clone(),
                })
            })
            .collect();
        Self::crawl_pass(topic_graph, resolver, &pass_two_pages, ctx_for, &mut report.manually_curated);

        Self::reconcile(topic_graph, &mut report);
        Self::curate_orphan_articles(topic_graph, article_ids, sole_root);
        Self::prune_extended_symbols(topic_graph, roots, is_extended_symbol_container, has_documentation_extension);

        report
    }
}
