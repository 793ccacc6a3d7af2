//! Catalog directory discovery (spec §4.0, §6 — supplemented).
//!
//! Walks a catalog directory and classifies every file into markup, symbol-graph, catalog
//! metadata, or resource, producing the two sorted URL lists the rest of the pipeline consumes.
//! Grounded on `noet-core::codec::network::iter_net_docs`'s `WalkDir`-based traversal with a
//! hidden-file filter.

use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use crate::config::CatalogInfo;

const MARKUP_EXTENSIONS: &[&str] = &["md", "tutorial"];

/// A symbol-graph file's parsed filename: `<module>(@<target>)?(.symbols)?.json`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolGraphFileName {
    pub module: String,
    pub target: Option<String>,
}

/// Parse a symbol-graph filename stem (without directory, with `.json` extension) into its module
/// and optional target/platform. Returns `None` if the file is not a `.json` file.
pub fn parse_symbol_graph_filename(file_name: &str) -> Option<SymbolGraphFileName> {
    let stem = file_name.strip_suffix(".json")?;
    let stem = stem.strip_suffix(".symbols").unwrap_or(stem);
    match stem.split_once('@') {
        Some((module, target)) => Some(SymbolGraphFileName {
            module: module.to_string(),
            target: Some(target.to_string()),
        }),
        None => Some(SymbolGraphFileName {
            module: stem.to_string(),
            target: None,
        }),
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|s| s.starts_with('.'))
        .unwrap_or(false)
}

fn is_markup(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| MARKUP_EXTENSIONS.contains(&ext))
        .unwrap_or(false)
}

fn is_symbol_graph(path: &Path) -> bool {
    path.extension().and_then(|ext| ext.to_str()) == Some("json")
        && path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n != crate::config::INFO_JSON)
            .unwrap_or(false)
}

/// The result of walking a catalog directory: classified, sorted file lists plus any catalog
/// metadata found at the root.
#[derive(Debug, Clone, Default)]
pub struct CatalogContents {
    /// Markup files, sorted by absolute path (spec §4.4's deterministic duplicate-discard rule
    /// depends on this ordering).
    pub markup_files: Vec<PathBuf>,
    /// Symbol-graph JSON files, sorted by absolute path.
    pub symbol_graph_files: Vec<PathBuf>,
    /// Everything else under the catalog root (images, videos, downloads, `header.html`, etc).
    pub resource_files: Vec<PathBuf>,
    pub info: CatalogInfo,
}

/// Walk `catalog_dir` and classify its contents (spec §4.0).
pub fn discover_catalog(catalog_dir: &Path) -> crate::error::Result<CatalogContents> {
    let info = CatalogInfo::read_from_catalog_dir(catalog_dir)?;

    let mut markup_files = Vec::new();
    let mut symbol_graph_files = Vec::new();
    let mut resource_files = Vec::new();

    for entry in WalkDir::new(catalog_dir)
        .into_iter()
        .filter_entry(|e| !is_hidden(e) || e.path() == catalog_dir)
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
        if file_name == crate::config::INFO_JSON || file_name == crate::config::INFO_YAML {
            continue;
        }
        if is_markup(path) {
            markup_files.push(path.to_path_buf());
        } else if is_symbol_graph(path) {
            symbol_graph_files.push(path.to_path_buf());
        } else {
            resource_files.push(path.to_path_buf());
        }
    }

    markup_files.sort();
    symbol_graph_files.sort();
    resource_files.sort();

    tracing::info!(
        markup = markup_files.len(),
        symbol_graphs = symbol_graph_files.len(),
        resources = resource_files.len(),
        "discovered catalog contents"
    );

    Ok(CatalogContents {
        markup_files,
        symbol_graph_files,
        resource_files,
        info,
    })
}
