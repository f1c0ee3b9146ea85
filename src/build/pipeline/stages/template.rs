//! Page template stage.

use crate::build::pipeline::{PipelineContext, PipelineError, ProcessingDocument, Stage};
use crate::dom::{escape_attr, escape_text};

/// Stage that wraps rendered content in a minimal HTML page.
///
/// After this stage, `doc.output_html` contains the complete HTML page.
pub struct TemplateStage;

impl Stage for TemplateStage {
    fn name(&self) -> &'static str {
        "template"
    }

    fn process(
        &self,
        docs: &mut [ProcessingDocument],
        ctx: &mut PipelineContext,
    ) -> Result<(), PipelineError> {
        for doc in docs {
            let html = render_page(
                &doc.title(),
                &ctx.site.name,
                doc.doc.front_matter.description.as_deref(),
                &doc.content,
            );
            doc.output_html = Some(html);
        }
        Ok(())
    }
}

fn render_page(title: &str, site_name: &str, description: Option<&str>, content: &str) -> String {
    let description = description
        .map(|d| format!("<meta name=\"description\" content=\"{}\">\n", escape_attr(d)))
        .unwrap_or_default();
    format!(
        "<!DOCTYPE html>\n\
         <html lang=\"en\">\n\
         <head>\n\
         <meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         {description}\
         <title>{title} - {site}</title>\n\
         </head>\n\
         <body>\n\
         <main>\n\
         {content}\
         </main>\n\
         </body>\n\
         </html>\n",
        title = escape_text(title),
        site = escape_text(site_name),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_page() {
        let html = render_page("Plots & Charts", "Docs", None, "<p>Hi</p>\n");
        assert!(html.starts_with("<!DOCTYPE html>\n"));
        assert!(html.contains("<title>Plots &amp; Charts - Docs</title>"));
        assert!(html.contains("<main>\n<p>Hi</p>\n</main>"));
        assert!(!html.contains("name=\"description\""));
    }

    #[test]
    fn test_render_page_description() {
        let html = render_page("T", "Docs", Some("Say \"hi\""), "");
        assert!(html.contains("<meta name=\"description\" content=\"Say &quot;hi&quot;\">"));
    }
}
