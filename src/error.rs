//! Crate-wide error type.
//!
//! Mirrors the taxonomy in spec §7: I/O and decoding failures are fatal for a catalog and
//! propagate as `Err`; everything else (per-symbol, per-link, per-file problems) is recorded as a
//! [`crate::diagnostics::Problem`] instead and the catalog keeps going.

use std::{fmt, io};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A rough severity hint for embedding consumers that want to map errors onto their own status
/// model without this crate depending on an HTTP stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusHint {
    /// The caller passed something this crate cannot make sense of.
    BadInput,
    /// Something the caller asked for does not exist.
    NotFound,
    /// An internal invariant was violated or an external resource misbehaved.
    Internal,
    /// The operation was cancelled cooperatively.
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
pub enum CatalogError {
    #[error("catalog directory error: {0}")]
    Catalog(String),

    #[error("malformed symbol graph: {0}")]
    SymbolGraph(String),

    #[error("path hierarchy error: {0}")]
    PathHierarchy(String),

    #[error("link resolution error: {0}")]
    LinkResolution(String),

    #[error("curation error: {0}")]
    Curation(String),

    #[error("(de)serialization error: {0}")]
    Serialization(String),

    #[error("file system error: {0}")]
    Io(String),

    #[error("item not found: {0}")]
    NotFound(String),

    #[error("external resolver error: {0}")]
    ExternalResolver(String),

    #[error("registration was cancelled")]
    RegistrationCancelled,
}

impl CatalogError {
    pub fn status_hint(&self) -> StatusHint {
        match self {
            CatalogError::Catalog(_) => StatusHint::BadInput,
            CatalogError::SymbolGraph(_) => StatusHint::BadInput,
            CatalogError::PathHierarchy(_) => StatusHint::Internal,
            CatalogError::LinkResolution(_) => StatusHint::Internal,
            CatalogError::Curation(_) => StatusHint::Internal,
            CatalogError::Serialization(_) => StatusHint::BadInput,
            CatalogError::Io(_) => StatusHint::Internal,
            CatalogError::NotFound(_) => StatusHint::NotFound,
            CatalogError::ExternalResolver(_) => StatusHint::Internal,
            CatalogError::RegistrationCancelled => StatusHint::Cancelled,
        }
    }
}

impl From<io::Error> for CatalogError {
    fn from(src: io::Error) -> Self {
        match src.kind() {
            io::ErrorKind::NotFound => CatalogError::NotFound(format!("{src}")),
            _ => CatalogError::Io(format!("{src}")),
        }
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(src: serde_json::Error) -> Self {
        CatalogError::Serialization(format!("JSON: {src}"))
    }
}

impl From<serde_yaml::Error> for CatalogError {
    fn from(src: serde_yaml::Error) -> Self {
        CatalogError::Serialization(format!("YAML: {src}"))
    }
}

impl From<url::ParseError> for CatalogError {
    fn from(src: url::ParseError) -> Self {
        CatalogError::Serialization(format!("invalid URL: {src}"))
    }
}

impl From<regex::Error> for CatalogError {
    fn from(src: regex::Error) -> Self {
        CatalogError::Serialization(format!("invalid regex: {src}"))
    }
}

impl From<fmt::Error> for CatalogError {
    fn from(src: fmt::Error) -> Self {
        CatalogError::Io(format!("{src}"))
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;
