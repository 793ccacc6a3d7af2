//! Document registrar: classifies parsed markup files and builds placeholder topic-graph entries
//! (spec §4.4).

use std::collections::HashMap;

use crate::{
    diagnostics::{DiagnosticEngine, Problem, ProblemIdentifier, Severity},
    identifier::Identifier,
    markup::ParsedMarkup,
    topicgraph::NodeKind,
};

#[derive(Debug, Clone, PartialEq, Eq)]
enum ClassifiedKind {
    Technology,
    Tutorial,
    TutorialArticle,
    RootCollectionArticle,
    DocumentationExtension(String),
    Article,
}

fn classify(parsed: &ParsedMarkup) -> ClassifiedKind {
    match parsed.top_level_directive.as_deref() {
        Some("Technology") | Some("TutorialOverview") => ClassifiedKind::Technology,
        Some("Tutorial") => ClassifiedKind::Tutorial,
        Some("Article") => ClassifiedKind::TutorialArticle,
        _ => {
            if parsed.has_technology_root {
                ClassifiedKind::RootCollectionArticle
            } else if let Some(target) = &parsed.h1_link_target {
                ClassifiedKind::DocumentationExtension(target.clone())
            } else {
                ClassifiedKind::Article
            }
        }
    }
}

/// A markup file that produces its own page (spec §3 "Documentation Node").
#[derive(Debug, Clone)]
pub struct RegisteredPage {
    pub identifier: Identifier,
    pub relative_path: String,
    pub kind: NodeKind,
    pub parsed: ParsedMarkup,
    /// Tutorial landmark sub-headings, each given a child topic-graph node (spec §4.4). Populated
    /// only for [`NodeKind::Tutorial`] pages.
    pub landmarks: Vec<(Identifier, String)>,
}

/// A standalone markup file whose H1 is a symbol link (spec §4.4, GLOSSARY "Documentation
/// extension"). Produces no page of its own; its content augments the target symbol's page once
/// the link resolver matches `target_link`.
#[derive(Debug, Clone)]
pub struct RegisteredExtension {
    pub relative_path: String,
    pub target_link: String,
    pub parsed: ParsedMarkup,
}

#[derive(Debug, Clone, Default)]
pub struct RegistrarOutput {
    pub pages: Vec<RegisteredPage>,
    pub extensions: Vec<RegisteredExtension>,
}

fn reference_stem(relative_path: &str) -> String {
    relative_path
        .rsplit('/')
        .next()
        .and_then(|name| name.split('.').next())
        .unwrap_or(relative_path)
        .to_string()
}

pub struct DocumentRegistrar;

impl DocumentRegistrar {
    /// `markup_files` must already be sorted by absolute path (spec §4.4: "files are ordered by
    /// absolute URL before assignment").
    pub fn register(
        catalog_id: &str,
        markup_files: &[(String, String)],
        diagnostics: &mut DiagnosticEngine,
    ) -> RegistrarOutput {
        let mut seen_stems: HashMap<String, String> = HashMap::new();
        let mut output = RegistrarOutput::default();

        for (relative_path, content) in markup_files {
            let stem = reference_stem(relative_path);
            if let Some(first_path) = seen_stems.get(&stem) {
                diagnostics.record(
                    Problem::new(
                        Severity::Warning,
                        ProblemIdentifier::DuplicateReference,
                        format!("duplicate reference for '{stem}', discarding '{relative_path}'"),
                    )
                    .with_notes(vec![first_path.clone(), relative_path.clone()]),
                );
                continue;
            }
            seen_stems.insert(stem, relative_path.clone());

            let parsed = ParsedMarkup::parse(content);
            let identifier = Identifier::from_path(catalog_id, relative_path);

            match classify(&parsed) {
                ClassifiedKind::DocumentationExtension(target_link) => {
                    output.extensions.push(RegisteredExtension {
                        relative_path: relative_path.clone(),
                        target_link,
                        parsed,
                    });
                }
                classified => {
                    let kind = match classified {
                        ClassifiedKind::Technology => NodeKind::Technology,
                        ClassifiedKind::Tutorial => NodeKind::Tutorial,
                        ClassifiedKind::TutorialArticle => NodeKind::TutorialArticle,
                        ClassifiedKind::RootCollectionArticle => NodeKind::Collection,
                        ClassifiedKind::Article => NodeKind::Article,
                        ClassifiedKind::DocumentationExtension(_) => unreachable!(),
                    };
                    let landmarks = if kind == NodeKind::Tutorial {
                        parsed
                            .headings
                            .iter()
                            .filter(|(level, text)| *level == 2 && !text.eq_ignore_ascii_case("Topics"))
                            .map(|(_, text)| {
                                (Identifier::from_path(catalog_id, &format!("{relative_path}#{text}")), text.clone())
                            })
                            .collect()
                    } else {
                        Vec::new()
                    };
                    output.pages.push(RegisteredPage {
                        identifier,
                        relative_path: relative_path.clone(),
                        kind,
                        parsed,
                        landmarks,
                    });
                }
            }
        }

        output
    }
}
