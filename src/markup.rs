//! Parsed-markup front door (spec §1 Non-goals: "Markdown parsing and semantic-model construction
//! ... consumed as an opaque parsed-document object").
//!
//! This crate does not own markdown semantics — the spec treats the parsed document as an opaque
//! value produced upstream. What it does need, and what this module extracts once up front so the
//! registrar, relationship builder, and curator never re-parse: the top-level block directive, the
//! H1 (for documentation-extension detection), and the authored *Topics* task groups (for
//! curation). Grounded on `noet-core`'s markdown codec, which likewise walks `pulldown_cmark`
//! events once into a small extracted struct rather than keeping the parser's event stream alive.

use pulldown_cmark::{Event, HeadingLevel, Parser, Tag, TagEnd};
use regex::Regex;

/// One `### <name>` task group under a `## Topics` section (spec §4.6).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TopicsTaskGroup {
    pub heading: Option<String>,
    /// Authored link destinations (or bare code-span text for implicit symbol links), in
    /// document order.
    pub links: Vec<String>,
}

/// The slice of a markup document's structure the rest of this crate actually consumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedMarkup {
    pub source: String,
    pub h1_text: Option<String>,
    /// Set when the H1 is itself a single link or code span, the shape spec §4.4 looks for when
    /// classifying a file as a documentation extension.
    pub h1_link_target: Option<String>,
    /// The name of the first top-level `@Directive(...)` block, if any (spec §4.4).
    pub top_level_directive: Option<String>,
    pub has_technology_root: bool,
    pub topics: Vec<TopicsTaskGroup>,
    /// Every heading in document order as `(level, text)`, used by the registrar to find tutorial
    /// landmark sub-headings (spec §4.4).
    pub headings: Vec<(u8, String)>,
}

fn directive_name(source: &str) -> Option<String> {
    let re = Regex::new(r"(?m)^@([A-Za-z][A-Za-z0-9_]*)").expect("valid regex");
    re.captures(source).map(|c| c[1].to_string())
}

fn has_technology_root(source: &str) -> bool {
    source.contains("@TechnologyRoot")
}

fn heading_level_to_u8(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

impl ParsedMarkup {
    pub fn parse(source: &str) -> Self {
        let mut h1_text = None;
        let mut h1_link_target = None;
        let mut topics = Vec::new();

        let mut in_topics = false;
        let mut current_group: Option<TopicsTaskGroup> = None;
        let mut heading_level: Option<HeadingLevel> = None;
        let mut heading_text = String::new();
        let mut seen_h1 = false;
        let mut in_list_item = false;
        let mut item_link: Option<String> = None;
        let mut item_text = String::new();
        let mut headings = Vec::new();

        let parser = Parser::new(source);
        for event in parser {
            match event {
                Event::Start(Tag::Heading { level, .. }) => {
                    heading_level = Some(level);
                    heading_text.clear();
                }
                Event::End(TagEnd::Heading(level)) => {
                    headings.push((heading_level_to_u8(level), heading_text.trim().to_string()));
                    match level {
                        HeadingLevel::H1 if !seen_h1 => {
                            seen_h1 = true;
                            h1_text = Some(heading_text.trim().to_string());
                        }
                        HeadingLevel::H2 => {
                            in_topics = heading_text.trim().eq_ignore_ascii_case("Topics");
                            current_group = None;
                        }
                        HeadingLevel::H3 if in_topics => {
                            if let Some(group) = current_group.take() {
                                topics.push(group);
                            }
                            current_group = Some(TopicsTaskGroup {
                                heading: Some(heading_text.trim().to_string()),
                                links: Vec::new(),
                            });
                        }
                        _ => {}
                    }
                    heading_level = None;
                }
                Event::Start(Tag::Item) => {
                    in_list_item = true;
                    item_link = None;
                    item_text.clear();
                }
                Event::End(TagEnd::Item) => {
                    if in_topics {
                        if let Some(link) = item_link.take().or_else(|| {
                            let trimmed = item_text.trim();
                            (!trimmed.is_empty()).then(|| trimmed.to_string())
                        }) {
                            current_group.get_or_insert_with(TopicsTaskGroup::default).links.push(link);
                        }
                    }
                    in_list_item = false;
                }
                Event::Start(Tag::Link { dest_url, .. }) => {
                    if heading_level == Some(HeadingLevel::H1) && !seen_h1 {
                        h1_link_target = Some(dest_url.to_string());
                    }
                    if in_list_item {
                        item_link = Some(dest_url.to_string());
                    }
                }
                Event::Code(text) => {
                    if heading_level == Some(HeadingLevel::H1) && !seen_h1 && h1_link_target.is_none() {
                        h1_link_target = Some(text.to_string());
                    }
                    if heading_level.is_some() {
                        heading_text.push_str(&text);
                    } else if in_list_item && item_link.is_none() {
                        item_text.push_str(&text);
                    }
                }
                Event::Text(text) => {
                    if heading_level.is_some() {
                        heading_text.push_str(&text);
                    } else if in_list_item && item_link.is_none() {
                        item_text.push_str(&text);
                    }
                }
                _ => {}
            }
        }
        if let Some(group) = current_group.take() {
            topics.push(group);
        }

        ParsedMarkup {
            source: source.to_string(),
            h1_text,
            h1_link_target,
            top_level_directive: directive_name(source),
            has_technology_root: has_technology_root(source),
            topics,
            headings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_plain_h1() {
        let doc = ParsedMarkup::parse("# My Article\n\nSome text.\n");
        assert_eq!(doc.h1_text.as_deref(), Some("My Article"));
        assert!(doc.h1_link_target.is_none());
    }

    #[test]
    fn extracts_h1_code_span_as_link_target() {
        let doc = ParsedMarkup::parse("# ``MyKit/MyClass/bar()``\n\nDiscussion.\n");
        assert_eq!(doc.h1_link_target.as_deref(), Some("MyKit/MyClass/bar()"));
    }

    #[test]
    fn extracts_top_level_directive() {
        let doc = ParsedMarkup::parse("@Tutorial(name: \"Getting Started\") {\n\n}\n");
        assert_eq!(doc.top_level_directive.as_deref(), Some("Tutorial"));
    }

    #[test]
    fn detects_technology_root() {
        let doc = ParsedMarkup::parse("@TechnologyRoot\n\n# Overview\n");
        assert!(doc.has_technology_root);
    }

    #[test]
    fn extracts_topics_task_groups_and_links() {
        let source = "\
# MyClass

## Topics

### Creating a value

- <doc:MyKit/MyClass/init()>
- ``MyKit/MyClass/bar()``
";
        let doc = ParsedMarkup::parse(source);
        assert_eq!(doc.topics.len(), 1);
        assert_eq!(doc.topics[0].heading.as_deref(), Some("Creating a value"));
        assert_eq!(doc.topics[0].links.len(), 2);
    }

    #[test]
    fn non_topics_sections_are_ignored() {
        let source = "\
# MyClass

## See Also

- <doc:MyKit/Other>
";
        let doc = ParsedMarkup::parse(source);
        assert!(doc.topics.is_empty());
    }
}
