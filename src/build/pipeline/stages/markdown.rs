//! Markdown rendering stage.

use crate::build::markdown::render_markdown;
use crate::build::pipeline::{PipelineContext, PipelineError, ProcessingDocument, Stage};

/// Stage that renders markdown content to HTML.
///
/// After this stage, `doc.content` contains an HTML fragment. Caption marker
/// tags survive rendering as raw HTML.
pub struct MarkdownStage;

impl Stage for MarkdownStage {
    fn name(&self) -> &'static str {
        "markdown"
    }

    fn process(
        &self,
        docs: &mut [ProcessingDocument],
        ctx: &mut PipelineContext,
    ) -> Result<(), PipelineError> {
        for doc in docs {
            doc.content = render_markdown(&doc.content, ctx.markdown_config)?;
        }
        Ok(())
    }
}
