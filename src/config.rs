//! Catalog-level configuration (spec §6 `Info.json`/`Info.yaml`, spec §1.1 ambient stack).
//!
//! Grounded on `noet-core::config::TomlConfigProvider`: a small serde-backed struct read from a
//! well-known file at the root of the thing being compiled. This crate supports JSON and YAML
//! (not TOML or plist — see DESIGN.md for why) since §6 only specifies `Info.<plist/json/yaml>`
//! and the inherited dependency stack carries `serde_json`/`serde_yaml`, not a plist crate.

use std::{collections::BTreeMap, fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::error::Result;

pub const INFO_JSON: &str = "Info.json";
pub const INFO_YAML: &str = "Info.yaml";

/// Catalog metadata read from an optional `Info.json`/`Info.yaml` (spec §6).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CatalogInfo {
    pub display_name: Option<String>,
    pub identifier: Option<String>,
    pub version: Option<String>,
    pub default_code_listing_language: Option<String>,
    pub default_module_kind: Option<String>,
    pub default_availability: Option<BTreeMap<String, String>>,
}

impl Default for CatalogInfo {
    fn default() -> Self {
        CatalogInfo {
            display_name: None,
            identifier: None,
            version: None,
            default_code_listing_language: None,
            default_module_kind: None,
            default_availability: None,
        }
    }
}

impl CatalogInfo {
    /// Read `Info.json` or `Info.yaml` from a catalog directory, in that order. Returns the
    /// default (empty) metadata when neither file is present.
    pub fn read_from_catalog_dir(catalog_dir: &Path) -> Result<Self> {
        let json_path = catalog_dir.join(INFO_JSON);
        if json_path.exists() {
            tracing::debug!(path = %json_path.display(), "reading catalog Info.json");
            let content = fs::read_to_string(&json_path)?;
            return Ok(serde_json::from_str(&content)?);
        }
        let yaml_path = catalog_dir.join(INFO_YAML);
        if yaml_path.exists() {
            tracing::debug!(path = %yaml_path.display(), "reading catalog Info.yaml");
            let content = fs::read_to_string(&yaml_path)?;
            return Ok(serde_yaml::from_str(&content)?);
        }
        tracing::debug!(dir = %catalog_dir.display(), "no catalog Info file found, using defaults");
        Ok(CatalogInfo::default())
    }
}

/// Knobs that affect compilation semantics rather than catalog content (spec §1.1, §4.3, §4.2).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompilerOptions {
    /// Default source language used when a symbol or reference declares none explicitly, and the
    /// language preferred when a path-hierarchy collision is otherwise unresolvable (spec §4.2
    /// step 4, §8).
    pub default_language: String,
    /// Whether inherited documentation comments are kept on the inheriting symbol. Spec §4.3: this
    /// only takes effect when the inheriting and source symbol additionally share a module — the
    /// stricter of the two descriptions mentioned in spec §9.
    pub inherit_docs: bool,
    /// Number of hex characters of the SHA-256 digest of a precise identifier used as the stable
    /// hash disambiguator (spec §4.2, §9 — fixed at 4).
    pub disambiguation_hash_length: usize,
    /// Upper bound on concurrently running render/discovery tasks (spec §5).
    pub max_concurrency: usize,
    /// Whether to emit a `documentationCoverageInfo` consumer callback during conversion (spec
    /// §6).
    pub coverage_enabled: bool,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        CompilerOptions {
            default_language: "swift".to_string(),
            inherit_docs: false,
            disambiguation_hash_length: 4,
            max_concurrency: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
            coverage_enabled: false,
        }
    }
}
