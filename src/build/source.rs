use std::path::{Path, PathBuf};

use super::document::{ContentItem, Document, StaticFile};
use super::paths::resolve_path;

// =============================================================================
// Errors
// =============================================================================

#[derive(thiserror::Error, Debug)]
pub enum SourceError {
    #[error("content path does not exist: {0}")]
    PathNotFound(PathBuf),

    #[error("content path is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("failed to read directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to read directory entry in {path}: {source}")]
    ReadEntry {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to read {path}: {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },
}

// =============================================================================
// Content source
// =============================================================================

/// The content directory after resolution against the config file location.
#[derive(Debug, Clone)]
pub struct ContentSource {
    /// The resolved local path to the content directory
    pub root: PathBuf,
}

impl ContentSource {
    /// Resolve the configured content directory and check that it exists.
    pub fn resolve(content: &Path, base_path: &Path) -> Result<Self, SourceError> {
        let root = resolve_path(base_path, content);
        if !root.exists() {
            return Err(SourceError::PathNotFound(root));
        }
        if !root.is_dir() {
            return Err(SourceError::NotADirectory(root));
        }
        Ok(Self { root })
    }

    /// Discover all content, sorted by source path.
    ///
    /// Markdown files are read and parsed into documents; everything else is
    /// a static file.
    pub fn discover_content(&self) -> Result<Vec<ContentItem>, SourceError> {
        let mut items = Vec::new();
        self.walk_directory(&self.root, &PathBuf::new(), &mut items)?;
        items.sort_by(|a, b| a.source_path().cmp(b.source_path()));
        Ok(items)
    }

    /// Recursively walk a directory and collect content items.
    fn walk_directory(
        &self,
        dir: &Path,
        relative_path: &Path,
        items: &mut Vec<ContentItem>,
    ) -> Result<(), SourceError> {
        let entries = std::fs::read_dir(dir).map_err(|e| SourceError::ReadDir {
            path: dir.to_path_buf(),
            source: e,
        })?;

        for entry in entries {
            let entry = entry.map_err(|e| SourceError::ReadEntry {
                path: dir.to_path_buf(),
                source: e,
            })?;

            let path = entry.path();
            let file_name = entry.file_name();
            let file_name_str = file_name.to_string_lossy();

            // Skip hidden files and directories
            if file_name_str.starts_with('.') {
                continue;
            }

            if path.is_dir()
                && matches!(
                    file_name_str.as_ref(),
                    "node_modules" | "__pycache__" | "target"
                )
            {
                continue;
            }

            let item_relative_path = relative_path.join(&file_name);

            if path.is_dir() {
                self.walk_directory(&path, &item_relative_path, items)?;
            } else if path.is_file() {
                items.push(classify_file(&path, item_relative_path)?);
            }
        }

        Ok(())
    }
}

/// Classify a file as either a Document or StaticFile.
fn classify_file(full_path: &Path, relative_path: PathBuf) -> Result<ContentItem, SourceError> {
    let extension = relative_path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());

    match extension.as_deref() {
        Some("md" | "markdown") => {
            let text = std::fs::read_to_string(full_path).map_err(|e| SourceError::ReadFile {
                path: full_path.to_path_buf(),
                source: e,
            })?;
            Ok(ContentItem::Document(Document::from_source(
                relative_path,
                &text,
            )))
        }
        _ => Ok(ContentItem::Static(StaticFile::new(relative_path))),
    }
}
