//! Path utilities shared across the path hierarchy, catalog discovery, and link resolution.

pub mod fspath;

pub use fspath::filesystem_safe_path;
