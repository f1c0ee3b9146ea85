use std::path::{Path, PathBuf};

use crate::config::{CaptionConfig, RootConfig};

use super::document::{ContentItem, Document, StaticFile};
use super::paths::resolve_path;
use super::pipeline::{Pipeline, PipelineContext, PipelineError, ProcessingDocument};
use super::source::{ContentSource, SourceError};

#[derive(thiserror::Error, Debug)]
pub enum BuildError {
    #[error("source error: {0}")]
    Source(#[from] SourceError),

    #[error("pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug)]
pub struct BuildResult {
    pub output_dir: PathBuf,
    pub documents: usize,
    pub static_files: usize,
    /// Ids registered for cross-referencing across all pages
    pub reference_targets: usize,
}

pub struct Builder {
    config: RootConfig,
    /// Base path for resolving relative paths (typically the config file's directory)
    base_path: PathBuf,
}

impl Builder {
    pub fn new(config: RootConfig, base_path: PathBuf) -> Self {
        Self { config, base_path }
    }

    pub fn build(&self) -> Result<BuildResult, BuildError> {
        // 1. Discover content
        // 2. Resolve each page's caption settings
        // 3. Run the document pipeline
        // 4. Copy static files
        let source = ContentSource::resolve(&self.config.content, &self.base_path)?;
        let items = source.discover_content()?;

        let mut documents = Vec::new();
        let mut static_files = Vec::new();
        for item in items {
            match item {
                ContentItem::Document(doc) => documents.push(doc),
                ContentItem::Static(file) => static_files.push(file),
            }
        }
        tracing::info!(
            content = %source.root.display(),
            documents = documents.len(),
            static_files = static_files.len(),
            "discovered content"
        );

        let output_dir = self.output_dir();
        std::fs::create_dir_all(&output_dir)?;

        let mut docs: Vec<ProcessingDocument> = documents
            .into_iter()
            .map(|doc| {
                let caption = self.page_caption_config(&doc);
                ProcessingDocument::new(doc, caption)
            })
            .collect();

        // The registry lives in this context only, so every build starts empty
        let mut ctx = PipelineContext::new(
            &output_dir,
            &self.config.site,
            &self.config.markdown,
            &self.config.caption.cross_reference_text,
        );
        Pipeline::default_pipeline().run(&mut docs, &mut ctx)?;

        for file in &static_files {
            copy_static_file(&source.root, &output_dir, file)?;
        }

        tracing::info!(
            output = %output_dir.display(),
            documents = docs.len(),
            static_files = static_files.len(),
            "wrote site"
        );

        let reference_targets = ctx.references.len();
        Ok(BuildResult {
            output_dir,
            documents: docs.len(),
            static_files: static_files.len(),
            reference_targets,
        })
    }

    /// The page's caption settings: site config with front matter overrides applied.
    fn page_caption_config(&self, doc: &Document) -> CaptionConfig {
        match doc.caption_overrides() {
            None => self.config.caption.clone(),
            Some(Ok(overrides)) => {
                tracing::debug!(page = %doc.page_id, "applying caption overrides");
                self.config.caption.with_overrides(&overrides)
            }
            Some(Err(e)) => {
                tracing::warn!(
                    page = %doc.page_id,
                    error = %e,
                    "ignoring invalid caption overrides in front matter"
                );
                self.config.caption.clone()
            }
        }
    }

    pub fn output_dir(&self) -> PathBuf {
        resolve_path(&self.base_path, &self.config.site.output)
    }
}

fn copy_static_file(
    content_root: &Path,
    output_dir: &Path,
    file: &StaticFile,
) -> Result<(), std::io::Error> {
    let input_path = content_root.join(&file.source_path);
    let output_path = output_dir.join(file.output_path());
    if let Some(parent) = output_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::copy(&input_path, &output_path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn config(yaml: &str) -> RootConfig {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_build_writes_pages_and_static_files() {
        let dir = tempfile::tempdir().unwrap();
        let docs = dir.path().join("docs");
        fs::create_dir_all(docs.join("img")).unwrap();
        fs::write(docs.join("index.md"), "Figure: Logo\n\n![logo](img/logo.png)\n").unwrap();
        fs::write(docs.join("img/logo.png"), [137u8, 80, 78, 71]).unwrap();

        let builder = Builder::new(config("site:\n  name: Docs\n"), dir.path().to_path_buf());
        let result = builder.build().unwrap();

        assert_eq!(result.output_dir, dir.path().join("_site"));
        assert_eq!(result.documents, 1);
        assert_eq!(result.static_files, 1);
        assert_eq!(result.reference_targets, 1);

        let page = fs::read_to_string(dir.path().join("_site/index.html")).unwrap();
        assert!(page.contains("<title>Index - Docs</title>"));
        assert!(page.contains("<figcaption>Figure 1: Logo</figcaption>"));
        assert_eq!(
            fs::read(dir.path().join("_site/img/logo.png")).unwrap(),
            vec![137u8, 80, 78, 71]
        );
    }

    #[test]
    fn test_front_matter_overrides_apply_per_page() {
        let dir = tempfile::tempdir().unwrap();
        let docs = dir.path().join("docs");
        fs::create_dir_all(&docs).unwrap();
        fs::write(
            docs.join("a.md"),
            "---\ncaption:\n  figure:\n    start_index: 7\n---\n\nFigure: A\n\n![a](a.png)\n",
        )
        .unwrap();
        fs::write(docs.join("b.md"), "Figure: B\n\n![b](b.png)\n").unwrap();

        let builder = Builder::new(config("site:\n  name: Docs\n"), dir.path().to_path_buf());
        builder.build().unwrap();

        let a = fs::read_to_string(dir.path().join("_site/a.html")).unwrap();
        let b = fs::read_to_string(dir.path().join("_site/b.html")).unwrap();
        assert!(a.contains("Figure 7: A"));
        assert!(b.contains("Figure 1: B"));
    }

    #[test]
    fn test_invalid_overrides_fall_back_to_site_config() {
        let dir = tempfile::tempdir().unwrap();
        let docs = dir.path().join("docs");
        fs::create_dir_all(&docs).unwrap();
        fs::write(
            docs.join("a.md"),
            "---\ncaption:\n  figure:\n    no_such_key: 1\n---\n\nFigure: A\n\n![a](a.png)\n",
        )
        .unwrap();

        let builder = Builder::new(config("site:\n  name: Docs\n"), dir.path().to_path_buf());
        builder.build().unwrap();

        let a = fs::read_to_string(dir.path().join("_site/a.html")).unwrap();
        assert!(a.contains("Figure 1: A"));
    }

    #[test]
    fn test_missing_content_directory() {
        let dir = tempfile::tempdir().unwrap();
        let builder = Builder::new(config("site:\n  name: Docs\n"), dir.path().to_path_buf());
        assert!(matches!(
            builder.build(),
            Err(BuildError::Source(SourceError::PathNotFound(_)))
        ));
    }
}
