//! Path conversion utilities.
//!
//! This module handles conversions between:
//! - Source file paths (relative to the content directory)
//! - Page ids (the `/`-separated source path that identifies a page)
//! - Output file paths (where pages are written in the output directory)

use std::path::{Component, Path, PathBuf};

/// The `/`-separated form of a source path, independent of the platform.
///
/// # Examples
/// ```ignore
/// page_id("guide/intro.md") => "guide/intro.md"
/// page_id("guide\\intro.md") => "guide/intro.md" (on Windows)
/// ```
pub fn page_id(path: &Path) -> String {
    path.components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Output path of a markdown document, relative to the output directory.
///
/// # Examples
/// ```ignore
/// document_output_path("installation.md") => "installation.html"
/// document_output_path("guide/intro.markdown") => "guide/intro.html"
/// ```
pub fn document_output_path(path: &Path) -> PathBuf {
    path.with_extension("html")
}

/// Resolve `path` against `base` unless it is already absolute.
pub fn resolve_path(base: &Path, path: &Path) -> PathBuf {
    if path.is_relative() {
        base.join(path)
    } else {
        path.to_path_buf()
    }
}

/// Get the base path from a config file path (its parent directory).
pub fn base_path_from_config(config_path: &Path) -> PathBuf {
    config_path
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}
