//! Path hierarchy: a forest of modules -> symbols -> members with collision-aware look-up (spec
//! §3, §4.2).
//!
//! Grounded on the arena-plus-handle shape of `noet-core`'s `BidGraph` (`petgraph`-backed, nodes
//! referenced by index rather than by pointer) and on design note §9's "arena + identifier"
//! guidance for breaking the context/resolver ownership cycle: the hierarchy owns every node in a
//! `Vec`, and every other component holds a [`NodeId`] rather than a reference.

use std::collections::{BTreeMap, BTreeSet};

use crate::{
    error::Result,
    pathhierarchy::disambiguation::{kind_token, stable_hash, DisambiguationMatch, DisambiguationSubtree},
    symbolgraph::{RelationshipKind, UnifiedModule},
};

/// Arena index into a [`PathHierarchy`]. Stable for the lifetime of the hierarchy; never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
    #[cfg(test)]
    pub fn for_test(n: usize) -> Self {
        NodeId(n)
    }
}

#[derive(Debug, Clone)]
pub struct PathNode {
    pub name: String,
    pub parent: Option<NodeId>,
    /// `None` for a pure "shell" interior node (spec §3: "tree nodes may be pure interior shell
    /// nodes").
    pub symbol_precise_id: Option<String>,
    pub children: BTreeMap<String, DisambiguationSubtree>,
}

impl PathNode {
    fn is_valid_terminus(&self) -> bool {
        self.symbol_precise_id.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
    Found(NodeId),
    Collision {
        candidates: Vec<NodeId>,
        disambiguations: BTreeMap<NodeId, String>,
    },
    NotFound,
}

/// A cyclic `inheritsFrom`/`memberOf` chain detected while building the hierarchy (spec §8:
/// "detected during pre-order traversal and emitted as a single diagnostic; neither cycle member
/// is auto-curated").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CyclicRelationship {
    pub members: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct PathHierarchy {
    arena: Vec<PathNode>,
    roots: BTreeMap<String, NodeId>,
    by_precise_id: BTreeMap<String, NodeId>,
    hash_length: usize,
}

const SHELL_KIND: &str = "_shell";

impl PathHierarchy {
    pub fn new(hash_length: usize) -> Self {
        PathHierarchy {
            arena: Vec::new(),
            roots: BTreeMap::new(),
            by_precise_id: BTreeMap::new(),
            hash_length,
        }
    }

    fn alloc(&mut self, name: String, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.arena.len());
        self.arena.push(PathNode {
            name,
            parent,
            symbol_precise_id: None,
            children: BTreeMap::new(),
        });
        id
    }

    pub fn node(&self, id: NodeId) -> &PathNode {
        &self.arena[id.0]
    }

    pub fn roots(&self) -> impl Iterator<Item = (&String, &NodeId)> {
        self.roots.iter()
    }

    pub fn find_by_precise_id(&self, precise_id: &str) -> Option<NodeId> {
        self.by_precise_id.get(precise_id).copied()
    }

    /// The name of the module root that owns `id`, walking up the tree.
    pub fn root_name_of(&self, id: NodeId) -> Option<&str> {
        let mut current = id;
        loop {
            match self.arena[current.0].parent {
                Some(parent) => current = parent,
                None => return Some(&self.arena[current.0].name),
            }
        }
    }

    fn ensure_root(&mut self, module_name: &str) -> NodeId {
        if let Some(&id) = self.roots.get(module_name) {
            return id;
        }
        let id = self.alloc(module_name.to_string(), None);
        self.roots.insert(module_name.to_string(), id);
        id
    }

    /// Insert (or reuse) a shell node chain for `components` under `root`, the fallback path used
    /// when no relationship supplies a parent (spec §4.2: "fall back to the symbol's declared
    /// pathComponents").
    fn ensure_shell_path(&mut self, root: NodeId, components: &[String]) -> NodeId {
        let mut current = root;
        for component in components {
            let existing = self.arena[current.0]
                .children
                .get(component)
                .and_then(|subtree| match subtree.find(Some(SHELL_KIND), None) {
                    DisambiguationMatch::Single(id) => Some(id),
                    _ => None,
                });
            current = match existing {
                Some(id) => id,
                None => {
                    let id = self.alloc(component.clone(), Some(current));
                    self.arena[current.0]
                        .children
                        .entry(component.clone())
                        .or_default()
                        .insert(SHELL_KIND.to_string(), String::new(), id);
                    id
                }
            };
        }
        current
    }

    fn attach_symbol(
        &mut self,
        parent: NodeId,
        name: &str,
        precise_id: &str,
        kind_identifier: &str,
    ) -> NodeId {
        if let Some(&existing) = self.by_precise_id.get(precise_id) {
            return existing;
        }
        let id = self.alloc(name.to_string(), Some(parent));
        self.arena[id.0].symbol_precise_id = Some(precise_id.to_string());
        let hash = stable_hash(precise_id, self.hash_length);
        let kind = kind_token(kind_identifier);
        self.arena[parent.0]
            .children
            .entry(name.to_string())
            .or_default()
            .insert(kind, hash, id);
        self.by_precise_id.insert(precise_id.to_string(), id);
        id
    }

    /// Resolve the relationship-derived parent precise id for `precise_id` within `module` (spec
    /// §4.2): `memberOf`/`requirementOf`/`optionalRequirementOf` parent directly to their target;
    /// `defaultImplementationOf` parents to *the parent of* the target requirement.
    fn relationship_parent(module: &UnifiedModule, precise_id: &str) -> Option<String> {
        let mut default_impl_target = None;
        for relationship in module.relationships_by_language.values().flatten() {
            if relationship.source != precise_id {
                continue;
            }
            match relationship.kind {
                RelationshipKind::MemberOf
                | RelationshipKind::OptionalMemberOf
                | RelationshipKind::RequirementOf
                | RelationshipKind::OptionalRequirementOf => {
                    return Some(relationship.target.clone());
                }
                RelationshipKind::DefaultImplementationOf => {
                    default_impl_target = Some(relationship.target.clone());
                }
                _ => {}
            }
        }
        let requirement = default_impl_target?;
        Self::relationship_parent(module, &requirement)
    }

    fn detect_cycle(module: &UnifiedModule, start: &str) -> Option<CyclicRelationship> {
        let mut visited = Vec::new();
        let mut current = start.to_string();
        let mut seen: BTreeSet<String> = BTreeSet::new();
        loop {
            if !seen.insert(current.clone()) {
                let cycle_start = visited.iter().position(|m| *m == current).unwrap_or(0);
                return Some(CyclicRelationship {
                    members: visited[cycle_start..].to_vec(),
                });
            }
            visited.push(current.clone());
            match Self::relationship_parent(module, &current) {
                Some(next) if module.symbols.contains_key(&next) => current = next,
                _ => return None,
            }
            if visited.len() > module.symbols.len() + 1 {
                return None;
            }
        }
    }

    /// Build the forest for a full catalog's loaded modules (spec §4.2). Returns any cyclic
    /// `memberOf`/`inheritsFrom` chains detected alongside the hierarchy; cycle members are left
    /// unparented rather than attached, per spec §8 ("neither cycle member is auto-curated").
    pub fn build(
        modules: &BTreeMap<String, UnifiedModule>,
        hash_length: usize,
    ) -> Result<(Self, Vec<CyclicRelationship>)> {
        let mut hierarchy = PathHierarchy::new(hash_length);
        let mut cycles = Vec::new();
        let mut cyclic_ids: BTreeSet<String> = BTreeSet::new();

        for module in modules.values() {
            for precise_id in module.symbols.keys() {
                if let Some(cycle) = Self::detect_cycle(module, precise_id) {
                    for member in &cycle.members {
                        cyclic_ids.insert(member.clone());
                    }
                    if !cycles.contains(&cycle) {
                        cycles.push(cycle);
                    }
                }
            }
        }

        for module in modules.values() {
            let root = hierarchy.ensure_root(&module.name);
            // Process symbols with a relationship-derived parent before shell-fallback symbols so
            // that a parent symbol node exists (created via attach_symbol) before any of its
            // members are attached to it.
            let mut remaining: Vec<&String> = module.symbols.keys().collect();
            let mut progressed = true;
            while progressed && !remaining.is_empty() {
                progressed = false;
                let mut next_remaining = Vec::new();
                for precise_id in remaining {
                    if cyclic_ids.contains(precise_id) {
                        continue;
                    }
                    let symbol = &module.symbols[precise_id];
                    let name = symbol
                        .path_components
                        .last()
                        .cloned()
                        .unwrap_or_else(|| precise_id.clone());

                    match Self::relationship_parent(module, precise_id) {
                        Some(parent_precise_id) => {
                            match hierarchy.find_by_precise_id(&parent_precise_id) {
                                Some(parent_node) => {
                                    hierarchy.attach_symbol(
                                        parent_node,
                                        &name,
                                        precise_id,
                                        &symbol.kind.identifier,
                                    );
                                    progressed = true;
                                }
                                None => next_remaining.push(precise_id),
                            }
                        }
                        None => {
                            let parent_components = &symbol.path_components
                                [..symbol.path_components.len().saturating_sub(1)];
                            let parent_node = hierarchy.ensure_shell_path(root, parent_components);
                            hierarchy.attach_symbol(
                                parent_node,
                                &name,
                                precise_id,
                                &symbol.kind.identifier,
                            );
                            progressed = true;
                        }
                    }
                }
                remaining = next_remaining;
            }
        }

        Ok((hierarchy, cycles))
    }

    /// Collision-aware look-up (spec §4.2). `parent` anchors a relative path; absolute paths
    /// (leading `/`) start from the module roots.
    pub fn find(&self, path: &str, parent: Option<NodeId>, default_language: &str) -> LookupOutcome {
        let is_absolute = path.starts_with('/');
        let trimmed = path.trim_start_matches('/');
        let raw: Vec<&str> = trimmed.split('/').filter(|c| !c.is_empty()).collect();
        if raw.is_empty() {
            return LookupOutcome::NotFound;
        }
        let components: Vec<ParsedComponent> = raw
            .iter()
            .map(|c| ParsedComponent::parse(c, self.hash_length))
            .collect();

        let start = if is_absolute {
            match self.roots.get(&components[0].name) {
                Some(&id) => id,
                None => return LookupOutcome::NotFound,
            }
        } else {
            match self.resolve_start(parent, &components[0].name) {
                Some(id) => id,
                None => return LookupOutcome::NotFound,
            }
        };

        let start_consumed_first_component = is_absolute || self.is_root(start);
        let remaining = if start_consumed_first_component {
            &components[1..]
        } else {
            &components[..]
        };

        self.walk(start, remaining, default_language)
    }

    fn is_root(&self, id: NodeId) -> bool {
        self.roots.values().any(|&r| r == id)
    }

    /// Walk up from `parent` until a node whose children contain `first_name`, falling back to the
    /// roots (spec §4.2 step 2).
    fn resolve_start(&self, parent: Option<NodeId>, first_name: &str) -> Option<NodeId> {
        let mut cursor = parent;
        while let Some(id) = cursor {
            if self.arena[id.0].children.contains_key(first_name) {
                return Some(id);
            }
            cursor = self.arena[id.0].parent;
        }
        if let Some(&root) = self.roots.get(first_name) {
            return Some(root);
        }
        self.roots.values().copied().find(|&r| self.arena[r.0].children.contains_key(first_name))
    }

    fn walk(&self, current: NodeId, components: &[ParsedComponent], default_language: &str) -> LookupOutcome {
        if components.is_empty() {
            return if self.arena[current.0].is_valid_terminus() {
                LookupOutcome::Found(current)
            } else {
                LookupOutcome::NotFound
            };
        }

        let comp = &components[0];
        let subtree = match self.arena[current.0].children.get(&comp.name) {
            Some(s) => s,
            None => return LookupOutcome::NotFound,
        };

        match subtree.find(comp.kind_hint.as_deref(), comp.hash_hint.as_deref()) {
            DisambiguationMatch::Single(next) => self.walk(next, &components[1..], default_language),
            DisambiguationMatch::NotFound => LookupOutcome::NotFound,
            DisambiguationMatch::Collision(candidates) => {
                let remaining = &components[1..];
                if !remaining.is_empty() {
                    let resolved: Vec<NodeId> = candidates
                        .iter()
                        .filter_map(|&c| match self.walk(c, remaining, default_language) {
                            LookupOutcome::Found(found) => Some(found),
                            _ => None,
                        })
                        .collect();
                    if resolved.len() == 1 {
                        return LookupOutcome::Found(resolved[0]);
                    }
                }
                let _ = default_language; // language-variant tie-break: a no-op here since this
                                           // hierarchy stores one node per precise id, not per
                                           // language (spec §4.2 step 4, second clause).
                let disambiguations = candidates
                    .iter()
                    .map(|&id| (id, subtree.shortest_disambiguator_among(id, &candidates)))
                    .collect();
                LookupOutcome::Collision {
                    candidates,
                    disambiguations,
                }
            }
        }
    }

    /// Shortest path that uniquely identifies `precise_id` (spec §4.2 "canonical disambiguated
    /// path").
    pub fn canonical_path(&self, precise_id: &str) -> Option<String> {
        let id = self.find_by_precise_id(precise_id)?;
        let mut segments = Vec::new();
        let mut current = id;
        loop {
            let node = &self.arena[current.0];
            let segment = match node.parent {
                Some(parent) => {
                    let subtree = &self.arena[parent.0].children[&node.name];
                    format!("{}{}", node.name, subtree.shortest_disambiguator_for(current))
                }
                None => node.name.clone(),
            };
            segments.push(segment);
            match node.parent {
                Some(parent) => current = parent,
                None => break,
            }
        }
        segments.reverse();
        Some(segments.join("/"))
    }
}

struct ParsedComponent {
    name: String,
    kind_hint: Option<String>,
    hash_hint: Option<String>,
}

impl ParsedComponent {
    fn parse(raw: &str, hash_length: usize) -> Self {
        let mut parts: Vec<&str> = raw.split('-').collect();
        let mut kind_hint = None;
        let mut hash_hint = None;

        while parts.len() > 1 && (kind_hint.is_none() || hash_hint.is_none()) {
            let candidate = *parts.last().unwrap();
            if hash_hint.is_none()
                && candidate.len() == hash_length
                && !candidate.is_empty()
                && candidate.chars().all(|c| c.is_ascii_hexdigit())
            {
                hash_hint = Some(candidate.to_string());
                parts.pop();
            } else if kind_hint.is_none()
                && crate::pathhierarchy::disambiguation::KNOWN_KIND_TOKENS.contains(&candidate)
            {
                kind_hint = Some(candidate.to_string());
                parts.pop();
            } else {
                break;
            }
        }

        ParsedComponent {
            name: parts.join("-"),
            kind_hint,
            hash_hint,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbolgraph::SymbolGraphLoader;

    fn overload_pair_module() -> BTreeMap<String, UnifiedModule> {
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

    #[test]
    fn bare_overload_name_collides() {
        let modules = overload_pair_module();
        let (hierarchy, cycles) = PathHierarchy::build(&modules, 4).expect("build");
        assert!(cycles.is_empty());
        match hierarchy.find("/MyKit/foo()", None, "swift") {
            LookupOutcome::Collision { candidates, .. } => assert_eq!(candidates.len(), 2),
            other => panic!("expected collision, got {other:?}"),
        }
    }

    #[test]
    fn canonical_path_round_trips_for_each_overload() {
        let modules = overload_pair_module();
        let (hierarchy, _) = PathHierarchy::build(&modules, 4).expect("build");
        for precise_id in ["s:foo-int", "s:foo-string"] {
            let canonical = hierarchy.canonical_path(precise_id).expect("canonical path");
            let found = hierarchy.find(&format!("/{canonical}"), None, "swift");
            match found {
                LookupOutcome::Found(id) => {
                    assert_eq!(hierarchy.node(id).symbol_precise_id.as_deref(), Some(precise_id));
                }
                other => panic!("expected found, got {other:?}"),
            }
        }
    }

    #[test]
    fn shell_node_is_not_a_valid_terminus() {
        let src = r#"{
            "module": {"name": "MyKit"},
            "symbols": [{
                "identifier": {"precise": "s:member", "interfaceLanguage": "swift"},
                "names": {"title": "bar"},
                "pathComponents": ["MyClass", "bar"],
                "kind": {"identifier": "swift.property", "displayName": "Instance Property"}
            }],
            "relationships": []
        }"#;
        let modules =
            SymbolGraphLoader::load_from_sources([("MyKit.symbols.json".to_string(), src.to_string())])
                .expect("load");
        let (hierarchy, _) = PathHierarchy::build(&modules, 4).expect("build");
        assert_eq!(hierarchy.find("/MyKit/MyClass", None, "swift"), LookupOutcome::NotFound);
        assert!(matches!(
            hierarchy.find("/MyKit/MyClass/bar", None, "swift"),
            LookupOutcome::Found(_)
        ));
    }

    #[test]
    fn member_of_relationship_parents_under_target() {
        let src = r#"{
            "module": {"name": "MyKit"},
            "symbols": [
                {
                    "identifier": {"precise": "s:class", "interfaceLanguage": "swift"},
                    "names": {"title": "MyClass"},
                    "pathComponents": ["MyClass"],
                    "kind": {"identifier": "swift.class", "displayName": "Class"}
                },
                {
                    "identifier": {"precise": "s:member", "interfaceLanguage": "swift"},
                    "names": {"title": "bar"},
                    "pathComponents": ["bar"],
                    "kind": {"identifier": "swift.property", "displayName": "Instance Property"}
                }
            ],
            "relationships": [{"source": "s:member", "target": "s:class", "kind": "memberOf"}]
        }"#;
        let modules =
            SymbolGraphLoader::load_from_sources([("MyKit.symbols.json".to_string(), src.to_string())])
                .expect("load");
        let (hierarchy, _) = PathHierarchy::build(&modules, 4).expect("build");
        assert!(matches!(
            hierarchy.find("/MyKit/MyClass/bar", None, "swift"),
            LookupOutcome::Found(_)
        ));
    }

    #[test]
    fn cyclic_inherits_from_is_detected_and_unparented() {
        let src = r#"{
            "module": {"name": "MyKit"},
            "symbols": [
                {
                    "identifier": {"precise": "s:a", "interfaceLanguage": "swift"},
                    "names": {"title": "A"},
                    "pathComponents": ["A"],
                    "kind": {"identifier": "swift.class", "displayName": "Class"}
                },
                {
                    "identifier": {"precise": "s:b", "interfaceLanguage": "swift"},
                    "names": {"title": "B"},
                    "pathComponents": ["B"],
                    "kind": {"identifier": "swift.class", "displayName": "Class"}
                }
            ],
            "relationships": [
                {"source": "s:a", "target": "s:b", "kind": "memberOf"},
                {"source": "s:b", "target": "s:a", "kind": "memberOf"}
            ]
        }"#;
        let modules =
            SymbolGraphLoader::load_from_sources([("MyKit.symbols.json".to_string(), src.to_string())])
                .expect("load");
        let (_, cycles) = PathHierarchy::build(&modules, 4).expect("build");
        assert_eq!(cycles.len(), 1);
    }

    #[test]
    fn empty_module_still_creates_root() {
        let src = r#"{"module": {"name": "Empty"}, "symbols": [], "relationships": []}"#;
        let modules =
            SymbolGraphLoader::load_from_sources([("Empty.symbols.json".to_string(), src.to_string())])
                .expect("load");
        let (hierarchy, _) = PathHierarchy::build(&modules, 4).expect("build");
        assert!(hierarchy.roots().any(|(name, _)| name == "Empty"));
    }
}
