//! Pipeline error types.

use crate::build::markdown::MarkdownError;

/// Errors that can occur during pipeline processing.
///
/// Caption problems are never pipeline errors; they are logged and the page
/// keeps its content.
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("markdown rendering error: {0}")]
    Markdown(#[from] MarkdownError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("stage '{stage}' failed: {message}")]
    Stage { stage: String, message: String },
}

impl PipelineError {
    /// Create a stage-specific error.
    pub fn stage(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Stage {
            stage: stage.into(),
            message: message.into(),
        }
    }
}
