//! Default pipeline stages.
//!
//! The standard document processing pipeline consists of:
//!
//! 1. **CaptionFenceStage** - Wrap caption lines of the markdown in marker tags
//! 2. **MarkdownStage** - Convert markdown to HTML
//! 3. **CaptionStage** - Number captions and register their ids
//! 4. **CrossReferenceStage** - Fill empty links to registered ids
//! 5. **TemplateStage** - Wrap content in the page shell
//! 6. **WriteStage** - Write final HTML to output directory

mod caption;
mod markdown;
mod template;
mod write;

pub use caption::{CaptionFenceStage, CaptionStage, CrossReferenceStage};
pub use markdown::MarkdownStage;
pub use template::TemplateStage;
pub use write::WriteStage;
