mod builder;
mod document;
mod markdown;
mod paths;
pub mod pipeline;
pub mod source;

pub use builder::{BuildError, BuildResult, Builder};
pub use document::{ContentItem, Document, FrontMatter, ParsedContent, StaticFile, parse_front_matter};
pub use markdown::{MarkdownError, render_markdown};
pub use paths::{base_path_from_config, document_output_path, page_id, resolve_path};
