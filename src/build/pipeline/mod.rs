//! Build pipeline for document processing.
//!
//! The pipeline transforms documents through a series of stages:
//! 1. Caption fencing (caption lines wrapped in marker tags)
//! 2. Markdown rendering (to HTML)
//! 3. Caption assembly (numbering, ids, reference targets)
//! 4. Cross-reference filling (empty links to registered ids)
//! 5. Template rendering (page shell)
//! 6. File writing (output to disk)
//!
//! Every stage sees the whole batch of documents before the next one starts,
//! so all pages have registered their captions before any page's references
//! are filled. Custom stages can be inserted before or after any named stage.

mod context;
mod document;
mod error;
mod stages;

pub use context::PipelineContext;
pub use document::ProcessingDocument;
pub use error::PipelineError;
pub use stages::{
    CaptionFenceStage, CaptionStage, CrossReferenceStage, MarkdownStage, TemplateStage,
    WriteStage,
};

/// A stage in the document processing pipeline.
///
/// Stages transform documents sequentially. Each stage receives all documents
/// and can modify them in place before passing to the next stage.
pub trait Stage: Send + Sync {
    /// Unique name for this stage (used for insertion points).
    fn name(&self) -> &'static str;

    /// Process documents through this stage.
    ///
    /// Documents are passed by mutable reference so stages can transform
    /// their content in place. The `ctx` provides access to shared
    /// configuration and the cross-reference registry.
    fn process(
        &self,
        docs: &mut [ProcessingDocument],
        ctx: &mut PipelineContext,
    ) -> Result<(), PipelineError>;
}

/// The document processing pipeline.
///
/// The default pipeline is:
/// caption-fence → markdown → caption → cross-reference → template → write.
///
/// # Extension Points
///
/// Insert custom stages using `insert_before` or `insert_after`:
///
/// ```ignore
/// pipeline.insert_after("caption", MyCustomStage)?;
/// ```
pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
}

impl Pipeline {
    /// Create an empty pipeline with no stages.
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    /// Create the default pipeline with standard stages.
    pub fn default_pipeline() -> Self {
        let mut pipeline = Self::new();
        pipeline.add_stage(CaptionFenceStage);
        pipeline.add_stage(MarkdownStage);
        pipeline.add_stage(CaptionStage);
        pipeline.add_stage(CrossReferenceStage);
        pipeline.add_stage(TemplateStage);
        pipeline.add_stage(WriteStage);
        pipeline
    }

    /// Add a stage to the end of the pipeline.
    pub fn add_stage<S: Stage + 'static>(&mut self, stage: S) -> &mut Self {
        self.stages.push(Box::new(stage));
        self
    }

    /// Insert a stage before the named stage.
    pub fn insert_before<S: Stage + 'static>(
        &mut self,
        name: &str,
        stage: S,
    ) -> Result<&mut Self, PipelineError> {
        let pos = self.position(name)?;
        self.stages.insert(pos, Box::new(stage));
        Ok(self)
    }

    /// Insert a stage after the named stage.
    pub fn insert_after<S: Stage + 'static>(
        &mut self,
        name: &str,
        stage: S,
    ) -> Result<&mut Self, PipelineError> {
        let pos = self.position(name)?;
        self.stages.insert(pos + 1, Box::new(stage));
        Ok(self)
    }

    fn position(&self, name: &str) -> Result<usize, PipelineError> {
        self.stages
            .iter()
            .position(|s| s.name() == name)
            .ok_or_else(|| PipelineError::stage(name, "stage not found in pipeline"))
    }

    /// Run the pipeline on a set of documents.
    pub fn run(
        &self,
        docs: &mut [ProcessingDocument],
        ctx: &mut PipelineContext,
    ) -> Result<(), PipelineError> {
        for stage in &self.stages {
            tracing::debug!(stage = stage.name(), documents = docs.len(), "running stage");
            stage.process(docs, ctx)?;
        }
        Ok(())
    }

    /// Get the names of all stages in order.
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::default_pipeline()
    }
}
