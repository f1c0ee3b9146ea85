//! Caption stages.
//!
//! Captions are handled in three passes. Fencing runs on the markdown,
//! assembly on the rendered HTML of each page, and reference filling only
//! once every page has been assembled, since a page may link to a caption
//! of any other page.

use crate::build::pipeline::{PipelineContext, PipelineError, ProcessingDocument, Stage};
use crate::caption::{self, PageRef};

/// Stage that wraps caption lines in marker tags before rendering.
pub struct CaptionFenceStage;

impl Stage for CaptionFenceStage {
    fn name(&self) -> &'static str {
        "caption-fence"
    }

    fn process(
        &self,
        docs: &mut [ProcessingDocument],
        _ctx: &mut PipelineContext,
    ) -> Result<(), PipelineError> {
        for doc in docs {
            doc.content = caption::process_markdown(&doc.content, &doc.caption, &doc.doc.page_id);
        }
        Ok(())
    }
}

/// Stage that numbers captions and registers their ids.
///
/// After this stage, every successfully captioned element of every page is
/// known to `ctx.references`.
pub struct CaptionStage;

impl Stage for CaptionStage {
    fn name(&self) -> &'static str {
        "caption"
    }

    fn process(
        &self,
        docs: &mut [ProcessingDocument],
        ctx: &mut PipelineContext,
    ) -> Result<(), PipelineError> {
        for doc in docs {
            let title = doc.title();
            let page = PageRef::new(&doc.doc.page_id, &title);
            doc.content =
                caption::process_html(&doc.content, &doc.caption, &page, &mut ctx.references);
        }
        tracing::debug!(targets = ctx.references.len(), "registered reference targets");
        Ok(())
    }
}

/// Stage that fills empty links pointing at registered ids.
pub struct CrossReferenceStage;

impl Stage for CrossReferenceStage {
    fn name(&self) -> &'static str {
        "cross-reference"
    }

    fn process(
        &self,
        docs: &mut [ProcessingDocument],
        ctx: &mut PipelineContext,
    ) -> Result<(), PipelineError> {
        if ctx.references.is_empty() {
            return Ok(());
        }
        for doc in docs {
            let title = doc.title();
            let page = PageRef::new(&doc.doc.page_id, &title);
            doc.content = ctx.references.post_process(&page, &doc.content);
        }
        Ok(())
    }
}
