//! Document types for pipeline processing.

use crate::build::document::Document;
use crate::config::CaptionConfig;

/// A document being processed through the pipeline.
///
/// Wraps the original `Document` with mutable state that evolves
/// through pipeline stages:
///
/// 1. Initially: `content` = raw markdown
/// 2. After caption-fence: captions wrapped in marker tags
/// 3. After markdown: `content` = HTML fragment
/// 4. After caption: captions numbered, targets wrapped
/// 5. After cross-reference: empty reference links filled
/// 6. After template: `output_html` = final page HTML
#[derive(Debug)]
pub struct ProcessingDocument {
    /// The original document (metadata and raw content)
    pub doc: Document,

    /// Caption settings of this page (site config plus front matter overrides)
    pub caption: CaptionConfig,

    /// Content being processed, markdown first and HTML after the markdown stage.
    pub content: String,

    /// Final HTML output after template rendering.
    ///
    /// None until the template stage populates it.
    pub output_html: Option<String>,
}

impl ProcessingDocument {
    /// Create a new processing document with its resolved caption settings.
    pub fn new(doc: Document, caption: CaptionConfig) -> Self {
        let content = doc.raw_content.clone();
        Self {
            doc,
            caption,
            content,
            output_html: None,
        }
    }

    /// Get the `/`-separated source path identifying this page.
    pub fn page_id(&self) -> &str {
        &self.doc.page_id
    }

    /// Get the document title.
    pub fn title(&self) -> String {
        self.doc.title()
    }
}
