use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::paths::{document_output_path, page_id};
use crate::config::CaptionOverrides;

// =============================================================================
// Content items (documents and static files)
// =============================================================================

/// A content item discovered in the content directory.
/// Can be either a document (markdown) or a static file (images, etc.).
#[derive(Debug, Clone)]
pub enum ContentItem {
    /// A markdown document that will be rendered to HTML
    Document(Document),
    /// A static file that will be copied as-is
    Static(StaticFile),
}

impl ContentItem {
    /// Get the path relative to the content directory.
    pub fn source_path(&self) -> &PathBuf {
        match self {
            ContentItem::Document(doc) => &doc.source_path,
            ContentItem::Static(file) => &file.source_path,
        }
    }
}

// =============================================================================
// Static files
// =============================================================================

/// A static file (image, CSS, ...) that gets copied to the output directory.
#[derive(Debug, Clone)]
pub struct StaticFile {
    /// Path relative to the content directory (e.g., "images/plot.png")
    pub source_path: PathBuf,
}

impl StaticFile {
    pub fn new(source_path: PathBuf) -> Self {
        Self { source_path }
    }

    /// Static files keep their relative path in the output directory.
    pub fn output_path(&self) -> &PathBuf {
        &self.source_path
    }
}

// =============================================================================
// Documents
// =============================================================================

/// A markdown document flowing through the build pipeline.
#[derive(Debug, Clone)]
pub struct Document {
    /// Path relative to the content directory (e.g., "guide/intro.md")
    pub source_path: PathBuf,
    /// `/`-separated source path; the page's identity for cross-references
    pub page_id: String,
    /// Path relative to the output directory (e.g., "guide/intro.html")
    pub output_path: PathBuf,
    /// Front matter metadata
    pub front_matter: FrontMatter,
    /// Markdown without the front matter block
    pub raw_content: String,
}

/// Front matter metadata parsed from the document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FrontMatter {
    /// Page title (overrides the filename-derived title)
    pub title: Option<String>,
    /// Page description, emitted as a meta tag
    pub description: Option<String>,
    /// Caption settings for this page only, same shape as the `caption` config section
    pub caption: Option<serde_yaml::Value>,
    /// Additional arbitrary metadata
    #[serde(flatten)]
    pub extra: HashMap<String, serde_yaml::Value>,
}

/// Result of parsing front matter from markdown content.
#[derive(Debug)]
pub struct ParsedContent {
    /// The parsed front matter (empty if none found)
    pub front_matter: FrontMatter,
    /// The markdown content without the front matter block
    pub content: String,
}

/// Parse front matter from markdown content.
///
/// Front matter is a YAML block delimited by `---` at the start of the file:
///
/// ```markdown
/// ---
/// title: My Page
/// caption:
///   figure:
///     start_index: 5
/// ---
///
/// # Content starts here
/// ```
///
/// Invalid YAML is logged and treated as no front matter.
pub fn parse_front_matter(content: &str) -> ParsedContent {
    let content = content.trim_start();

    if !content.starts_with("---") {
        return ParsedContent {
            front_matter: FrontMatter::default(),
            content: content.to_string(),
        };
    }

    let after_opening = &content[3..];
    let Some(closing_pos) = after_opening.find("\n---") else {
        // No closing delimiter, the whole file is markdown
        return ParsedContent {
            front_matter: FrontMatter::default(),
            content: content.to_string(),
        };
    };

    let yaml_content = after_opening[..closing_pos].trim_start_matches('\n');

    // "---" + yaml + "\n---"
    let markdown_start = 3 + closing_pos + 4;
    let markdown_content = content
        .get(markdown_start..)
        .map(|rest| rest.trim_start_matches(['\r', '\n']).to_string())
        .unwrap_or_default();

    let front_matter = if yaml_content.trim().is_empty() {
        FrontMatter::default()
    } else {
        match serde_yaml::from_str(yaml_content) {
            Ok(fm) => fm,
            Err(e) => {
                tracing::warn!(error = %e, "failed to parse front matter, ignoring it");
                FrontMatter::default()
            }
        }
    };

    ParsedContent {
        front_matter,
        content: markdown_content,
    }
}

impl Document {
    /// Create a document from a file's full text.
    pub fn from_source(source_path: PathBuf, text: &str) -> Self {
        let parsed = parse_front_matter(text);
        Self {
            page_id: page_id(&source_path),
            output_path: document_output_path(&source_path),
            source_path,
            front_matter: parsed.front_matter,
            raw_content: parsed.content,
        }
    }

    /// Get the document title, falling back to the file name.
    pub fn title(&self) -> String {
        self.front_matter.title.clone().unwrap_or_else(|| {
            self.source_path
                .file_stem()
                .and_then(|s| s.to_str())
                .map(title_from_stem)
                .unwrap_or_else(|| "Untitled".to_string())
        })
    }

    /// Caption overrides from the `caption` front matter key, if present.
    pub fn caption_overrides(&self) -> Option<Result<CaptionOverrides, serde_yaml::Error>> {
        self.front_matter
            .caption
            .clone()
            .map(CaptionOverrides::from_value)
    }
}

/// `getting-started` -> `Getting Started`, `api_reference` -> `Api Reference`
fn title_from_stem(stem: &str) -> String {
    let mut title = String::with_capacity(stem.len());
    let mut word_start = true;
    for c in stem.chars() {
        if c == '-' || c == '_' {
            title.push(' ');
            word_start = true;
        } else if word_start {
            title.extend(c.to_uppercase());
            word_start = false;
        } else {
            title.push(c);
        }
    }
    title
}
