//! File writing stage.

use crate::build::pipeline::{PipelineContext, PipelineError, ProcessingDocument, Stage};

/// Stage that writes rendered documents to the output directory.
///
/// Takes the final HTML from `doc.output_html` and writes it next to where
/// the source sits in the content directory, creating parent directories.
pub struct WriteStage;

impl Stage for WriteStage {
    fn name(&self) -> &'static str {
        "write"
    }

    fn process(
        &self,
        docs: &mut [ProcessingDocument],
        ctx: &mut PipelineContext,
    ) -> Result<(), PipelineError> {
        for doc in docs {
            let html = doc.output_html.as_ref().ok_or_else(|| {
                PipelineError::stage(
                    "write",
                    format!(
                        "document '{}' has no output HTML (was template stage run?)",
                        doc.page_id()
                    ),
                )
            })?;

            let output_path = ctx.output_dir.join(&doc.doc.output_path);
            if let Some(parent) = output_path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&output_path, html)?;
            tracing::debug!(page = doc.page_id(), output = %output_path.display(), "wrote page");
        }
        Ok(())
    }
}
