//! Relationship builder: symbol-graph relationship edges -> in-memory relations and on-page
//! member rollups (spec §4.3).

use std::collections::BTreeMap;

use crate::{
    config::CompilerOptions,
    symbolgraph::{Relationship, RelationshipKind, UnifiedModule},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConformsTo {
    pub conformant: String,
    pub protocol_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InheritsFrom {
    pub derived: String,
    pub base: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultImplementationOf {
    pub default_impl: String,
    pub requirement: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequirementOf {
    pub requirement: String,
    pub protocol_id: String,
    pub optional: bool,
}

/// Which on-page section a rolled-up member belongs to (spec §4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RollupSection {
    DictionaryKeys,
    HttpParameters,
    HttpBody,
    HttpBodyParameters,
    HttpResponses,
}

impl RollupSection {
    /// Classify a `memberOf`/`optionalMemberOf` edge by its member's kind identifier (spec §4.3:
    /// "certain source/target kind pairs"). Returns `None` for an ordinary member (handled by the
    /// path hierarchy instead, not rolled up on-page).
    fn classify(member_kind_identifier: &str) -> Option<Self> {
        let lower = member_kind_identifier.to_ascii_lowercase();
        if lower.contains("httpresponse") {
            Some(RollupSection::HttpResponses)
        } else if lower.contains("httpbodyparameter") {
            Some(RollupSection::HttpBodyParameters)
        } else if lower.contains("httpbody") {
            Some(RollupSection::HttpBody)
        } else if lower.contains("httpparameter") {
            Some(RollupSection::HttpParameters)
        } else if lower.contains("dictionarykey") || lower.contains("dictionary.key") {
            Some(RollupSection::DictionaryKeys)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollupRow {
    pub member_precise_id: String,
    pub name: String,
    /// Present (and used as the primary sort key) only for [`RollupSection::HttpResponses`].
    pub status_code: Option<u32>,
}

#[derive(Debug, Clone, Default)]
pub struct RelationshipModel {
    pub conforms_to: Vec<ConformsTo>,
    pub inherits_from: Vec<InheritsFrom>,
    pub default_implementations: Vec<DefaultImplementationOf>,
    pub requirements: Vec<RequirementOf>,
    /// target precise id -> section -> member rows, sorted deterministically.
    pub rollups: BTreeMap<String, BTreeMap<RollupSection, Vec<RollupRow>>>,
    /// member precise id -> source-origin precise id, for `memberOf`/`defaultImplementationOf`
    /// edges whose mixins carried a `SourceOrigin` (spec §4.3 inherited-docs case).
    pub inherited_from: BTreeMap<String, String>,
}

impl RelationshipModel {
    fn add_rollup(&mut self, target: &str, section: RollupSection, row: RollupRow) {
        self.rollups
            .entry(target.to_string())
            .or_default()
            .entry(section)
            .or_default()
            .push(row);
    }

    fn sort_rollups(&mut self) {
        for sections in self.rollups.values_mut() {
            for (section, rows) in sections.iter_mut() {
                if *section == RollupSection::HttpResponses {
                    rows.sort_by(|a, b| {
                        a.status_code
                            .unwrap_or(u32::MAX)
                            .cmp(&b.status_code.unwrap_or(u32::MAX))
                            .then_with(|| a.name.cmp(&b.name))
                    });
                } else {
                    rows.sort_by(|a, b| a.name.cmp(&b.name));
                }
            }
        }
    }

    /// Whether `member_precise_id`'s inherited doc-comment should be stripped (spec §4.3, §9
    /// Decision: the stricter reading — inherited docs are kept only when both `inherit_docs` is
    /// set *and* the source and inheriting symbol are in the same module).
    pub fn should_strip_inherited_doc(
        &self,
        member_precise_id: &str,
        owning_module: &UnifiedModule,
        options: &CompilerOptions,
    ) -> bool {
        let Some(source_id) = self.inherited_from.get(member_precise_id) else {
            return false;
        };
        let same_module = owning_module.symbols.contains_key(source_id);
        !(options.inherit_docs && same_module)
    }
}

fn status_code_from_name(name: &str) -> Option<u32> {
    name.chars().filter(|c| c.is_ascii_digit()).collect::<String>().parse().ok()
}

fn member_name(module: &UnifiedModule, precise_id: &str, default_language: &str) -> String {
    module
        .symbols
        .get(precise_id)
        .and_then(|s| s.preferred_variant(default_language))
        .map(|v| v.title.clone())
        .unwrap_or_else(|| precise_id.to_string())
}

/// Build the in-memory relationship model from every module's unified relationships (spec §4.3).
pub fn build_relationships(
    modules: &BTreeMap<String, UnifiedModule>,
    default_language: &str,
) -> RelationshipModel {
    let mut model = RelationshipModel::default();

    for module in modules.values() {
        let relationships: Vec<&Relationship> = module.relationships_by_language.values().flatten().collect();
        for relationship in relationships {
            match relationship.kind {
                RelationshipKind::ConformsTo => {
                    model.conforms_to.push(ConformsTo {
                        conformant: relationship.source.clone(),
                        protocol_id: relationship.target.clone(),
                    });
                }
                RelationshipKind::InheritsFrom => {
                    model.inherits_from.push(InheritsFrom {
                        derived: relationship.source.clone(),
                        base: relationship.target.clone(),
                    });
                }
                RelationshipKind::DefaultImplementationOf => {
                    model.default_implementations.push(DefaultImplementationOf {
                        default_impl: relationship.source.clone(),
                        requirement: relationship.target.clone(),
                    });
                    if let Some(origin) = relationship.mixins.as_ref().and_then(|m| m.source_origin.as_ref()) {
                        model
                            .inherited_from
                            .insert(relationship.source.clone(), origin.identifier.clone());
                    }
                }
                RelationshipKind::RequirementOf | RelationshipKind::OptionalRequirementOf => {
                    model.requirements.push(RequirementOf {
                        requirement: relationship.source.clone(),
                        protocol_id: relationship.target.clone(),
                        optional: relationship.kind.is_optional(),
                    });
                }
                RelationshipKind::MemberOf | RelationshipKind::OptionalMemberOf => {
                    if let Some(origin) = relationship.mixins.as_ref().and_then(|m| m.source_origin.as_ref()) {
                        model
                            .inherited_from
                            .insert(relationship.source.clone(), origin.identifier.clone());
                    }
                    let member_kind = module
                        .symbols
                        .get(&relationship.source)
                        .map(|s| s.kind.identifier.as_str())
                        .unwrap_or_default();
                    if let Some(section) = RollupSection::classify(member_kind) {
                        let name = member_name(module, &relationship.source, default_language);
                        let status_code = if section == RollupSection::HttpResponses {
                            status_code_from_name(&name)
                        } else {
                            None
                        };
                        model.add_rollup(
                            &relationship.target,
                            section,
                            RollupRow {
                                member_precise_id: relationship.source.clone(),
                                name,
                                status_code,
                            },
                        );
                    }
                }
                _ => {}
            }
        }
    }

    model.sort_rollups();
    model
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbolgraph::SymbolGraphLoader;

    fn module_with_http_responses() -> BTreeMap<String, UnifiedModule> {
        let src = r#"{
            "module": {"name": "WebAPI"},
            "symbols": [
                {
                    "identifier": {"precise": "s:endpoint", "interfaceLanguage": "data"},
                    "names": {"title": "GET /items"},
                    "kind": {"identifier": "httpRequest", "displayName": "HTTP Request"}
                },
                {
                    "identifier": {"precise": "s:resp-404", "interfaceLanguage": "data"},
                    "names": {"title": "404"},
                    "kind": {"identifier": "httpResponse", "displayName": "HTTP Response"}
                },
                {
                    "identifier": {"precise": "s:resp-200", "interfaceLanguage": "data"},
                    "names": {"title": "200"},
                    "kind": {"identifier": "httpResponse", "displayName": "HTTP Response"}
                }
            ],
            "relationships": [
                {"source": "s:resp-404", "target": "s:endpoint", "kind": "memberOf"},
                {"source": "s:resp-200", "target": "s:endpoint", "kind": "memberOf"}
            ]
        }"#;
        SymbolGraphLoader::load_from_sources([("WebAPI.symbols.json".to_string(), src.to_string())])
            .expect("load")
    }

    #[test]
    fn http_responses_roll_up_sorted_by_status_code() {
        let modules = module_with_http_responses();
        let model = build_relationships(&modules, "data");
        let rows = &model.rollups["s:endpoint"][&RollupSection::HttpResponses];
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].status_code, Some(200));
        assert_eq!(rows[1].status_code, Some(404));
    }

    #[test]
    fn conforms_to_is_recorded() {
        let src = r#"{
            "module": {"name": "MyKit"},
            "symbols": [
                {"identifier": {"precise": "s:type", "interfaceLanguage": "swift"}, "names": {"title": "T"}, "kind": {"identifier": "swift.struct", "displayName": "Structure"}},
                {"identifier": {"precise": "s:proto", "interfaceLanguage": "swift"}, "names": {"title": "P"}, "kind": {"identifier": "swift.protocol", "displayName": "Protocol"}}
            ],
            "relationships": [{"source": "s:type", "target": "s:proto", "kind": "conformsTo"}]
        }"#;
        let modules =
            SymbolGraphLoader::load_from_sources([("MyKit.symbols.json".to_string(), src.to_string())])
                .expect("load");
        let model = build_relationships(&modules, "swift");
        assert_eq!(model.conforms_to.len(), 1);
        assert_eq!(model.conforms_to[0].conformant, "s:type");
    }

    #[test]
    fn inherited_docs_are_kept_only_when_flag_set_and_same_module() {
        let src = r#"{
            "module": {"name": "MyKit"},
            "symbols": [
                {"identifier": {"precise": "s:base", "interfaceLanguage": "swift"}, "names": {"title": "base"}, "kind": {"identifier": "swift.method", "displayName": "Method"}},
                {"identifier": {"precise": "s:derived", "interfaceLanguage": "swift"}, "names": {"title": "derived"}, "kind": {"identifier": "swift.method", "displayName": "Method"}}
            ],
            "relationships": [{
                "source": "s:derived",
                "target": "s:container",
                "kind": "memberOf",
                "mixins": {"sourceOrigin": {"identifier": "s:base", "displayName": "base"}}
            }]
        }"#;
        let modules =
            SymbolGraphLoader::load_from_sources([("MyKit.symbols.json".to_string(), src.to_string())])
                .expect("load");
        let model = build_relationships(&modules, "swift");
        let module = &modules["MyKit"];

        let mut options = CompilerOptions::default();
        options.inherit_docs = false;
        assert!(model.should_strip_inherited_doc("s:derived", module, &options));

        options.inherit_docs = true;
        assert!(!model.should_strip_inherited_doc("s:derived", module, &options));
    }
}
