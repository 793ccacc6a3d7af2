//! Link resolver: layered search over the path hierarchy and whole topic graph, with a
//! process-wide cache and external-resolver fallback (spec §4.5).
//!
//! Grounded on `noet-core::codec::compiler`'s resolution cache (a single-writer map keyed by the
//! authored reference text) and on design note §9's "cyclic ownership ... break with arena +
//! identifier": the resolver never stores node references, only [`Identifier`]s and [`NodeId`]s.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::{
    identifier::{Identifier, Reference, ReferenceUrl, ResolvedFailure, ResolvedReference},
    linkresolver::external::ExternalResolver,
    pathhierarchy::{LookupOutcome, PathHierarchy},
};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    authored_text: String,
    parent: Option<Identifier>,
    from_symbol_link: bool,
}

/// Everything the resolver needs about the catalog being resolved, supplied by the caller so this
/// module stays decoupled from exactly how the topic graph is stored (spec §9 "arena +
/// identifier").
pub struct ResolutionContext<'a> {
    pub local_catalog_id: &'a str,
    pub default_language: &'a str,
    pub path_hierarchy: &'a PathHierarchy,
    /// Resolve a fully-qualified candidate path (e.g. `documentation/MyKit/Thing`) against the
    /// whole topic graph; used for non-symbol-link candidates (spec §4.5 step 5b-e).
    pub lookup_whole_graph: &'a dyn Fn(&str) -> Option<Identifier>,
    /// The parent page's path components, if any, for relative/sibling candidates (step 5c/5d).
    pub parent_path: Option<&'a [String]>,
    /// The parent's owning module name, used for the module-rooted candidate (step 5e).
    pub parent_module: Option<&'a str>,
}

/// Resolves authored or relationship-implied references against the path hierarchy and topic
/// graph (spec §4.5).
pub struct LinkResolver {
    cache: Mutex<HashMap<CacheKey, Reference>>,
    external: Mutex<HashMap<String, Box<dyn ExternalResolver>>>,
}

impl Default for LinkResolver {
    fn default() -> Self {
        LinkResolver {
            cache: Mutex::new(HashMap::new()),
            external: Mutex::new(HashMap::new()),
        }
    }
}

impl LinkResolver {
    pub fn new() -> Self {
        LinkResolver::default()
    }

    pub fn register_external(&self, catalog_id: impl Into<String>, resolver: Box<dyn ExternalResolver>) {
        self.external.lock().insert(catalog_id.into(), resolver);
    }

    fn candidates(url: &ReferenceUrl, from_symbol_link: bool, ctx: &ResolutionContext) -> Vec<Vec<String>> {
        let mut candidates = Vec::new();

        let mut direct = vec!["documentation".to_string()];
        direct.extend(url.path.iter().cloned());
        candidates.push(direct);

        if !from_symbol_link {
            for root in ["articles-root", "tutorials-root", "tutorials-container"] {
                let mut c = vec![root.to_string()];
                c.extend(url.path.iter().cloned());
                candidates.push(c);
            }
        }

        if let Some(parent_path) = ctx.parent_path {
            let mut child = parent_path.to_vec();
            child.extend(url.path.iter().cloned());
            candidates.push(child);

            let mut sibling = parent_path.to_vec();
            sibling.pop();
            sibling.extend(url.path.iter().cloned());
            candidates.push(sibling);
        }

        if let Some(module) = ctx.parent_module {
            let mut rooted = vec!["documentation".to_string(), module.to_string()];
            rooted.extend(url.path.iter().cloned());
            candidates.push(rooted);
        }

        candidates
    }

    /// A candidate's path as built by [`Self::candidates`] is shaped like the authored URL
    /// (`documentation/Module/Symbol`, matching `ReferenceUrl::path`); the path hierarchy's own
    /// roots are bare module names, with no `documentation` pseudo-segment. Strip it, and look up
    /// absolute so [`PathHierarchy::find`] resolves the module name as a root rather than walking
    /// from some ambient parent.
    fn hierarchy_lookup_path(candidate: &[String]) -> String {
        let stripped: &[String] = match candidate.first() {
            Some(first) if first == "documentation" => &candidate[1..],
            _ => candidate,
        };
        format!("/{}", stripped.join("/"))
    }

    /// Resolve `(authored_text, parent, from_symbol_link)` (spec §4.5).
    pub fn resolve(
        &self,
        authored_text: &str,
        parent: Option<Identifier>,
        from_symbol_link: bool,
        ctx: &ResolutionContext,
    ) -> Reference {
        let key = CacheKey {
            authored_text: authored_text.to_string(),
            parent,
            from_symbol_link,
        };
        if let Some(hit) = self.cache.lock().get(&key).cloned() {
            let symbol_miss = from_symbol_link && hit.identifier().is_none();
            if !symbol_miss {
                return hit;
            }
        }

        let resolved = self.resolve_uncached(authored_text, from_symbol_link, ctx);
        if resolved.is_resolved() {
            self.cache.lock().insert(key, resolved.clone());
        }
        resolved
    }

    fn resolve_uncached(&self, authored_text: &str, from_symbol_link: bool, ctx: &ResolutionContext) -> Reference {
        let url = match ReferenceUrl::parse(authored_text) {
            Ok(url) => url,
            Err(err) => {
                return Reference::ResolvedFailure(ResolvedFailure {
                    authored_text: authored_text.to_string(),
                    attempted_candidates: Vec::new(),
                    reason: err.to_string(),
                })
            }
        };

        let catalog_id = url
            .catalog_id
            .clone()
            .unwrap_or_else(|| ctx.local_catalog_id.to_string());

        let candidates = Self::candidates(&url, from_symbol_link, ctx);
        let mut attempted = Vec::new();

        for candidate in &candidates {
            let candidate_str = candidate.join("/");
            attempted.push(candidate_str.clone());

            if from_symbol_link {
                let lookup_path = Self::hierarchy_lookup_path(candidate);
                if let LookupOutcome::Found(node_id) = ctx.path_hierarchy.find(&lookup_path, None, ctx.default_language)
                {
                    let node = ctx.path_hierarchy.node(node_id);
                    if let Some(precise_id) = &node.symbol_precise_id {
                        let module_name = ctx
                            .path_hierarchy
                            .root_name_of(node_id)
                            .unwrap_or(&catalog_id)
                            .to_string();
                        let mut languages = std::collections::BTreeSet::new();
                        languages.insert(ctx.default_language.to_string());
                        return Reference::ResolvedSuccess(ResolvedReference {
                            identifier: Identifier::from_precise_id(&module_name, precise_id),
                            catalog_id,
                            path: candidate.clone(),
                            fragment: url.fragment.clone(),
                            source_languages: languages,
                        });
                    }
                }
            } else if let Some(identifier) = (ctx.lookup_whole_graph)(&candidate_str) {
                let mut languages = std::collections::BTreeSet::new();
                languages.insert(ctx.default_language.to_string());
                return Reference::ResolvedSuccess(ResolvedReference {
                    identifier,
                    catalog_id,
                    path: candidate.clone(),
                    fragment: url.fragment.clone(),
                    source_languages: languages,
                });
            }
        }

        if let Some(resolved) = self.try_external(&catalog_id, &url, from_symbol_link) {
            return resolved;
        }

        Reference::ResolvedFailure(ResolvedFailure {
            authored_text: authored_text.to_string(),
            attempted_candidates: attempted,
            reason: "no candidate path resolved and no external resolver matched".to_string(),
        })
    }

    fn try_external(&self, catalog_id: &str, url: &ReferenceUrl, from_symbol_link: bool) -> Option<Reference> {
        let mut external = self.external.lock();
        let resolver = external.get_mut(catalog_id)?;
        let outcome = if from_symbol_link && url.path.len() == 1 {
            resolver.resolve_symbol(&url.path[0])
        } else {
            resolver.resolve_topic(&url.to_authored_string())
        };
        let info = outcome.ok()?;
        let mut languages = std::collections::BTreeSet::new();
        languages.extend(info.available_languages.iter().cloned());
        languages.insert(info.language.clone());
        Some(Reference::ResolvedSuccess(ResolvedReference {
            identifier: Identifier::from_path(catalog_id, &info.url),
            catalog_id: catalog_id.to_string(),
            path: url.path.clone(),
            fragment: url.fragment.clone(),
            source_languages: languages,
        }))
    }
}
