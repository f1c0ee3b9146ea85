//! Configuration type definitions.
//!
//! This module contains the data structures of `capref.yaml`.
//! These types are pure data - no I/O or complex logic.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// =============================================================================
// Root config
// =============================================================================

/// Site configuration - everything needed to build one documentation site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RootConfig {
    pub site: SiteConfig,
    /// Directory holding the markdown sources, relative to the config file
    #[serde(default = "default_content")]
    pub content: PathBuf,
    #[serde(default)]
    pub markdown: MarkdownConfig,
    #[serde(default)]
    pub caption: CaptionConfig,
}

fn default_content() -> PathBuf {
    PathBuf::from("docs")
}

// =============================================================================
// Site configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    pub name: String,
    #[serde(default = "default_output")]
    pub output: PathBuf,
}

fn default_output() -> PathBuf {
    PathBuf::from("_site")
}

// =============================================================================
// Markdown configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkdownConfig {
    /// Extensions to enable for markdown processing
    #[serde(default = "default_markdown_extensions")]
    pub extensions: Vec<String>,
}

fn default_markdown_extensions() -> Vec<String> {
    vec![
        "definition_lists".to_string(),
        "footnotes".to_string(),
        "gfm".to_string(),
        "heading_attributes".to_string(),
        "strikethrough".to_string(),
        "tables".to_string(),
        "tasklists".to_string(),
    ]
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        Self {
            extensions: default_markdown_extensions(),
        }
    }
}

// =============================================================================
// Caption configuration
// =============================================================================

/// Caption numbering and cross-reference settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionConfig {
    /// Extra caption keywords handled by the custom family (e.g. `List`)
    #[serde(default)]
    pub additional_identifier: Vec<String>,
    /// Text placed into empty links that point at a caption on another page.
    /// Supports `{page_title}` and `{local_ref}`.
    #[serde(default = "default_cross_reference_text")]
    pub cross_reference_text: String,
    #[serde(default)]
    pub table: IdentifierConfig,
    #[serde(default)]
    pub figure: IdentifierConfig,
    #[serde(default)]
    pub custom: IdentifierConfig,
}

fn default_cross_reference_text() -> String {
    "{local_ref}".to_string()
}

impl Default for CaptionConfig {
    fn default() -> Self {
        Self {
            additional_identifier: Vec::new(),
            cross_reference_text: default_cross_reference_text(),
            table: IdentifierConfig::default(),
            figure: IdentifierConfig::default(),
            custom: IdentifierConfig::default(),
        }
    }
}

/// Settings of one caption family.
///
/// The `ignore_*` flags only affect figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentifierConfig {
    pub enable: bool,
    pub start_index: i64,
    pub increment_index: i64,
    pub position: Position,
    pub default_id: String,
    pub reference_text: String,
    pub caption_prefix: String,
    pub markdown_identifier: String,
    /// Accept caption lines with leading whitespace (inside lists, admonitions)
    pub allow_indented_caption: bool,
    /// Never use an image's `alt` text as its caption
    pub ignore_alt: bool,
    /// Images carrying one of these classes never become figures
    pub ignore_classes: Vec<String>,
    /// Keep `#fragment` image pairs as separate figures
    pub ignore_hash: bool,
}

impl Default for IdentifierConfig {
    fn default() -> Self {
        Self {
            enable: true,
            start_index: 1,
            increment_index: 1,
            position: Position::default(),
            default_id: "_{identifier}-{index}".to_string(),
            reference_text: "{Identifier} {index}".to_string(),
            caption_prefix: "{Identifier} {index}:".to_string(),
            markdown_identifier: "{Identifier}:".to_string(),
            allow_indented_caption: true,
            ignore_alt: false,
            ignore_classes: vec!["twemoji".to_string()],
            ignore_hash: false,
        }
    }
}

/// Where the caption goes relative to the captioned content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    Top,
    #[default]
    Bottom,
}

impl Position {
    pub fn as_str(&self) -> &'static str {
        match self {
            Position::Top => "top",
            Position::Bottom => "bottom",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
