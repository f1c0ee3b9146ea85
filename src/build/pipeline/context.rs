//! Pipeline context for sharing state across stages.

use std::path::Path;

use crate::caption::CrossReferences;
use crate::config::{MarkdownConfig, SiteConfig};

/// Shared context for pipeline stages.
///
/// Contains the configuration stages read and the build-wide
/// cross-reference registry the caption stages fill and consume.
pub struct PipelineContext<'a> {
    // === Output configuration ===
    /// Directory where output files are written
    pub output_dir: &'a Path,

    // === Site-level data ===
    /// Site metadata (name, output directory)
    pub site: &'a SiteConfig,

    /// Markdown processing configuration
    pub markdown_config: &'a MarkdownConfig,

    // === Build-wide state ===
    /// Ids assigned to captioned elements, across every page of this build
    pub references: CrossReferences,
}

impl<'a> PipelineContext<'a> {
    /// Create a new pipeline context with an empty reference registry.
    pub fn new(
        output_dir: &'a Path,
        site: &'a SiteConfig,
        markdown_config: &'a MarkdownConfig,
        cross_reference_text: &str,
    ) -> Self {
        Self {
            output_dir,
            site,
            markdown_config,
            references: CrossReferences::new(cross_reference_text),
        }
    }
}
