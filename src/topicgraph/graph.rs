//! Reader-facing topic graph: nodes plus order-preserving forward/reverse edge maps (spec §3,
//! §5, §8).
//!
//! Grounded on `noet-core`'s `BidGraph`, a typed registry of nodes with forward and reverse
//! adjacency bookkeeping, adapted here from a `petgraph`-backed representation to explicit
//! insertion-ordered adjacency lists — the spec requires per-node edge order to reflect authored
//! Topics order (§5 "Topic-graph edges retain insertion order per node"), which `petgraph`'s
//! linked-list adjacency does not guarantee on removal-and-reinsert.

use std::collections::HashMap;

use crate::{
    identifier::Identifier,
    topicgraph::node::{DocumentationNode, TopicGraphNode},
};

#[derive(Debug, Clone, Default)]
pub struct TopicGraph {
    nodes: HashMap<Identifier, TopicGraphNode>,
    documents: HashMap<Identifier, DocumentationNode>,
    forward: HashMap<Identifier, Vec<Identifier>>,
    reverse: HashMap<Identifier, Vec<Identifier>>,
}

impl TopicGraph {
    pub fn new() -> Self {
        TopicGraph::default()
    }

    pub fn insert_node(&mut self, node: TopicGraphNode) {
        let id = node.reference;
        self.nodes.insert(id, node);
        self.forward.entry(id).or_default();
        self.reverse.entry(id).or_default();
    }

    pub fn insert_document(&mut self, document: DocumentationNode) {
        self.documents.insert(document.reference, document);
    }

    /// Replace a node's payload in place without disturbing its edges (spec §3 `replaceNode`).
    pub fn replace_node(&mut self, node: TopicGraphNode) {
        let id = node.reference;
        self.forward.entry(id).or_default();
        self.reverse.entry(id).or_default();
        self.nodes.insert(id, node);
    }

    pub fn node(&self, id: Identifier) -> Option<&TopicGraphNode> {
        self.nodes.get(&id)
    }

    pub fn node_mut(&mut self, id: Identifier) -> Option<&mut TopicGraphNode> {
        self.nodes.get_mut(&id)
    }

    pub fn document(&self, id: Identifier) -> Option<&DocumentationNode> {
        self.documents.get(&id)
    }

    pub fn document_mut(&mut self, id: Identifier) -> Option<&mut DocumentationNode> {
        self.documents.get_mut(&id)
    }

    pub fn contains(&self, id: Identifier) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn node_ids(&self) -> impl Iterator<Item = Identifier> + '_ {
        self.nodes.keys().copied()
    }

    /// Add an edge `from -> to`, a no-op if it already exists (spec §4.6 pass 1: "if the target is
    /// not already a child of this page, add a topic-graph edge").
    pub fn add_edge(&mut self, from: Identifier, to: Identifier) -> bool {
        let forward = self.forward.entry(from).or_default();
        if forward.contains(&to) {
            return false;
        }
        forward.push(to);
        self.reverse.entry(to).or_default().push(from);
        true
    }

    pub fn remove_edge(&mut self, from: Identifier, to: Identifier) {
        if let Some(children) = self.forward.get_mut(&from) {
            children.retain(|child| *child != to);
        }
        if let Some(parents) = self.reverse.get_mut(&to) {
            parents.retain(|parent| *parent != from);
        }
    }

    /// Remove every edge touching `id`, in either direction (spec §4.6 "extended-symbol pruning":
    /// "remove its edges").
    pub fn remove_all_edges(&mut self, id: Identifier) {
        let children: Vec<Identifier> = self.forward.get(&id).cloned().unwrap_or_default();
        for child in children {
            self.remove_edge(id, child);
        }
        let parents: Vec<Identifier> = self.reverse.get(&id).cloned().unwrap_or_default();
        for parent in parents {
            self.remove_edge(parent, id);
        }
    }

    pub fn children(&self, id: Identifier) -> &[Identifier] {
        self.forward.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn parents(&self, id: Identifier) -> &[Identifier] {
        self.reverse.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_parent(&self, id: Identifier) -> bool {
        !self.parents(id).is_empty()
    }

    pub fn has_children(&self, id: Identifier) -> bool {
        !self.children(id).is_empty()
    }

    /// spec §8: "for every topic-graph edge (a,b) there is a corresponding reverse edge entry in
    /// reverseEdges[b] that contains a".
    pub fn is_consistent(&self) -> bool {
        self.forward.iter().all(|(from, children)| {
            children
                .iter()
                .all(|to| self.reverse.get(to).map(|parents| parents.contains(from)).unwrap_or(false))
        })
    }

    /// A deterministic hash of the graph's structure: every (parent, child) edge pair, sorted.
    /// Used for the round-trip/idempotence law in spec §8 ("re-registering the same inputs yields
    /// an identical topic-graph hash").
    pub fn structural_hash(&self) -> u64 {
        use std::hash::{Hash, Hasher};
        let mut edges: Vec<(Identifier, Identifier)> = self
            .forward
            .iter()
            .flat_map(|(from, children)| children.iter().map(move |to| (*from, *to)))
            .collect();
        edges.sort();
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        edges.hash(&mut hasher);
        hasher.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topicgraph::node::{ContentLocation, NodeKind};

    fn node(id: Identifier) -> TopicGraphNode {
        TopicGraphNode::new(id, NodeKind::Article, "title", ContentLocation::File("a.md".into()))
    }

    #[test]
    fn add_edge_is_idempotent_and_bidirectional() {
        let mut graph = TopicGraph::new();
        let a = Identifier::new();
        let b = Identifier::new();
        graph.insert_node(node(a));
        graph.insert_node(node(b));
        assert!(graph.add_edge(a, b));
        assert!(!graph.add_edge(a, b));
        assert_eq!(graph.children(a), &[b]);
        assert_eq!(graph.parents(b), &[a]);
        assert!(graph.is_consistent());
    }

    #[test]
    fn remove_edge_updates_both_maps() {
        let mut graph = TopicGraph::new();
        let a = Identifier::new();
        let b = Identifier::new();
        graph.insert_node(node(a));
        graph.insert_node(node(b));
        graph.add_edge(a, b);
        graph.remove_edge(a, b);
        assert!(graph.children(a).is_empty());
        assert!(graph.parents(b).is_empty());
    }

    #[test]
    fn edge_order_is_insertion_order() {
        let mut graph = TopicGraph::new();
        let a = Identifier::new();
        let children: Vec<Identifier> = (0..3).map(|_| Identifier::new()).collect();
        graph.insert_node(node(a));
        for child in &children {
            graph.insert_node(node(*child));
            graph.add_edge(a, *child);
        }
        assert_eq!(graph.children(a), children.as_slice());
    }

    #[test]
    fn remove_all_edges_detaches_node_in_both_directions() {
        let mut graph = TopicGraph::new();
        let parent = Identifier::new();
        let target = Identifier::new();
        let child = Identifier::new();
        for id in [parent, target, child] {
            graph.insert_node(node(id));
        }
        graph.add_edge(parent, target);
        graph.add_edge(target, child);
        graph.remove_all_edges(target);
        assert!(graph.children(parent).is_empty());
        assert!(graph.parents(child).is_empty());
    }

    #[test]
    fn structural_hash_is_stable_across_rebuild() {
        let mut first = TopicGraph::new();
        let a = Identifier::from_path("cat", "a");
        let b = Identifier::from_path("cat", "b");
        first.insert_node(node(a));
        first.insert_node(node(b));
        first.add_edge(a, b);

        let mut second = TopicGraph::new();
        second.insert_node(node(a));
        second.insert_node(node(b));
        second.add_edge(a, b);

        assert_eq!(first.structural_hash(), second.structural_hash());
    }
}
