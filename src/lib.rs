//! # doccat-core
//!
//! The indexing, resolution, and curation engine at the core of a documentation compiler: it
//! ingests a documentation *catalog* (authored prose plus machine-emitted symbol-graph files
//! describing a module's public API), reconciles the two into a single unified topic graph,
//! resolves every cross-reference, and hands the result to a downstream renderer.
//!
//! ## Architecture
//!
//! Dependency order, leaves first:
//!
//! - [`identifier`] — stable topic identifiers and URL-shaped references.
//! - [`symbolgraph`] — per-module symbol-graph ingestion and merging (`SymbolGraphLoader`,
//!   `UnifiedModule`).
//! - [`pathhierarchy`] — the multi-rooted symbol index with collision-aware look-up
//!   (`PathHierarchy`, `DisambiguationSubtree`).
//! - [`topicgraph`] — the reader-facing directed graph of pages (`TopicGraph`).
//! - [`registrar`] — classifies authored markup into technologies, tutorials, articles, and
//!   documentation extensions (`DocumentRegistrar`).
//! - [`relationships`] — turns symbol-graph relationship edges into in-memory links and on-page
//!   rollups (`RelationshipModel`).
//! - [`linkresolver`] — resolves authored references with layered search and external-resolver
//!   fallback (`LinkResolver`).
//! - [`curator`] — the two-pass manual/automatic curation algorithm (`Curator`).
//! - [`driver`] — orchestrates the concurrent render phase and emits output (`ConversionDriver`).
//! - [`diagnostics`] — accumulates warnings and errors (`DiagnosticEngine`, `Problem`).
//!
//! Ambient concerns: [`error`] (the crate-wide `CatalogError`), [`config`] (`CatalogInfo`,
//! `CompilerOptions`), [`catalog`] (directory discovery), and [`paths`] (filesystem-safe path
//! truncation).
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use doccat_core::{catalog, config::CompilerOptions, symbolgraph::SymbolGraphLoader, pathhierarchy::PathHierarchy};
//! use std::path::Path;
//!
//! # fn main() -> doccat_core::error::Result<()> {
//! let contents = catalog::discover_catalog(Path::new("./MyKit.doccatalog"))?;
//! let modules = SymbolGraphLoader::load(&contents.symbol_graph_files)?;
//! let options = CompilerOptions::default();
//! let (hierarchy, cycles) = PathHierarchy::build(&modules, options.disambiguation_hash_length)?;
//! for cycle in &cycles {
//!     println!("cyclic relationship: {:?}", cycle.members);
//! }
//! println!("path hierarchy has {} module roots", hierarchy.roots().count());
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod config;
pub mod curator;
pub mod diagnostics;
pub mod driver;
pub mod error;
pub mod identifier;
pub mod linkresolver;
pub mod markup;
pub mod pathhierarchy;
pub mod paths;
pub mod registrar;
pub mod relationships;
pub mod symbolgraph;
pub mod topicgraph;

pub use error::{CatalogError, Result};
