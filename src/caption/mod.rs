//! Caption numbering and cross-referencing.
//!
//! Captions go through two per-page phases and one build-wide pass:
//!
//! 1. [`process_markdown`] fences caption lines in marker tags before the
//!    markdown is rendered.
//! 2. [`process_html`] finds the markers in the rendered HTML, numbers each
//!    caption, wraps its target in a `figure` (or gives a `table` its
//!    `caption`) and registers the assigned id with the [`CrossReferences`].
//! 3. Once every page went through step 2, [`CrossReferences::post_process`]
//!    fills empty links pointing at those ids.
//!
//! Failures never escape a phase. A broken caption is logged and skipped; an
//! unexpected failure hands back the phase's input unchanged.

mod counter;
mod custom;
mod extract;
mod fence;
mod figure;
mod format;
mod table;
mod xref;

use std::panic::{AssertUnwindSafe, catch_unwind};

pub use counter::IndexCounter;
pub use extract::{CaptionMarkers, CaptionRecord};
pub use fence::{caption_pattern, fence_captions};
pub use format::{FormatError, format_template};
pub use xref::{CrossReferences, PageRef};

use crate::config::{CaptionConfig, IdentifierConfig, Position};
use crate::dom::{Attribute, Dom, FragmentError, NodeId, check_well_formed};

/// Marker tag fencing figure captions.
pub const FIGURE_CAPTION_TAG: &str = "figure-caption";
/// Marker tag fencing table captions.
pub const TABLE_CAPTION_TAG: &str = "table-caption";
/// Marker tag fencing captions of every additional identifier.
pub const CUSTOM_CAPTION_TAG: &str = "custom-caption";

#[derive(thiserror::Error, Debug)]
pub enum CaptionError {
    #[error("{reason} (caption: '{caption}')")]
    StructuralMismatch { caption: String, reason: String },

    #[error("invalid markup in caption '{markup}': {source}")]
    MalformedFragment {
        markup: String,
        #[source]
        source: FragmentError,
    },

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error("invalid caption pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("unexpected failure: {0}")]
    Unexpected(String),
}

impl CaptionError {
    fn mismatch(caption: &str, reason: impl Into<String>) -> Self {
        Self::StructuralMismatch {
            caption: caption.to_string(),
            reason: reason.into(),
        }
    }

    /// Whether the error only concerns a single caption.
    pub fn is_caption_level(&self) -> bool {
        matches!(
            self,
            Self::StructuralMismatch { .. } | Self::MalformedFragment { .. }
        )
    }
}

// =============================================================================
// Markdown phase
// =============================================================================

/// Fence every caption line of `markdown`.
///
/// Families run table, figure, custom. A failing family is logged and leaves
/// the text as the previous family produced it.
pub fn process_markdown(markdown: &str, config: &CaptionConfig, page: &str) -> String {
    let mut text = markdown.to_string();

    let families = [
        ("table", TABLE_CAPTION_TAG, &config.table),
        ("figure", FIGURE_CAPTION_TAG, &config.figure),
    ];
    for (identifier, tag, family) in families {
        if !family.enable {
            continue;
        }
        match guarded(|| fence_family(&text, family, &[identifier], tag)) {
            Ok(fenced) => text = fenced,
            Err(e) => tracing::error!(page, family = identifier, error = %e, "failed to fence captions"),
        }
    }

    if config.custom.enable && !config.additional_identifier.is_empty() {
        let identifiers: Vec<&str> = config.additional_identifier.iter().map(String::as_str).collect();
        match guarded(|| fence_family(&text, &config.custom, &identifiers, CUSTOM_CAPTION_TAG)) {
            Ok(fenced) => text = fenced,
            Err(e) => tracing::error!(page, family = "custom", error = %e, "failed to fence captions"),
        }
    }

    text
}

fn fence_family(
    markdown: &str,
    config: &IdentifierConfig,
    identifiers: &[&str],
    tag: &str,
) -> Result<String, CaptionError> {
    let mut text = markdown.to_string();
    for identifier in identifiers {
        let keyword = config.markdown_keyword(identifier)?;
        text = fence_captions(&text, &keyword, tag, config.allow_indented_caption)?;
    }
    Ok(text)
}

// =============================================================================
// HTML phase
// =============================================================================

/// Number and wrap every fenced caption of a rendered page.
///
/// Assigned ids are registered with `references`. Returns `html` untouched if
/// nothing changed or if the page could not be processed.
pub fn process_html(
    html: &str,
    config: &CaptionConfig,
    page: &PageRef<'_>,
    references: &mut CrossReferences,
) -> String {
    match guarded(|| assemble_page(html, config, page, references)) {
        Ok(Some(processed)) => processed,
        Ok(None) => html.to_string(),
        Err(e) => {
            tracing::error!(page = page.source_path, error = %e, "failed to process captions, keeping page as is");
            html.to_string()
        }
    }
}

fn assemble_page(
    html: &str,
    config: &CaptionConfig,
    page: &PageRef<'_>,
    references: &mut CrossReferences,
) -> Result<Option<String>, CaptionError> {
    let mut dom = Dom::parse_fragment(html);

    table::process(&mut dom, &config.table, page, references)?;
    custom::process(&mut dom, &config.custom, page, references)?;
    figure::process(&mut dom, &config.figure, page, references)?;

    if !dom.is_modified() {
        return Ok(None);
    }
    Ok(Some(dom.fragment_html()))
}

/// Run `f`, turning a panic into [`CaptionError::Unexpected`].
fn guarded<T>(f: impl FnOnce() -> Result<T, CaptionError>) -> Result<T, CaptionError> {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "panic".to_string());
            Err(CaptionError::Unexpected(message))
        }
    }
}

// =============================================================================
// Shared assembly helpers
// =============================================================================

/// Build a `tag` element whose content is parsed from `markup`.
///
/// Fails if `markup` is not balanced, in which case nothing is created.
fn caption_element(
    dom: &mut Dom,
    tag: &str,
    attrs: Vec<Attribute>,
    markup: &str,
) -> Result<NodeId, CaptionError> {
    check_well_formed(markup).map_err(|source| CaptionError::MalformedFragment {
        markup: markup.to_string(),
        source,
    })?;

    let fragment = Dom::parse_fragment(markup);
    let element = dom.create_element(tag, attrs);
    if let Some(body) = fragment.body() {
        for &child in fragment.children(body) {
            let copy = dom.import(&fragment, child);
            dom.append(element, copy);
        }
    }
    Ok(element)
}

/// Wrap `targets` in a `figure` placed where the first target was.
///
/// The caption becomes the first child for `top` and the last for `bottom`.
fn wrap_in_figure(
    dom: &mut Dom,
    targets: &[NodeId],
    caption: NodeId,
    position: Position,
    attrs: Vec<Attribute>,
) -> NodeId {
    let figure = dom.create_element("figure", attrs);
    if let Some(&first) = targets.first() {
        dom.insert_before(first, figure);
    }
    if position == Position::Top {
        dom.append(figure, caption);
    }
    for &target in targets {
        dom.append(figure, target);
    }
    if position == Position::Bottom {
        dom.append(figure, caption);
    }
    figure
}

/// Attributes in record order, with `id` replaced or appended.
fn attributes_with_id(attributes: &[(String, String)], id: &str) -> Vec<Attribute> {
    let mut attrs: Vec<Attribute> = attributes
        .iter()
        .map(|(name, value)| {
            if name == "id" {
                Attribute::new(name, id)
            } else {
                Attribute::new(name, value.as_str())
            }
        })
        .collect();
    if !attributes.iter().any(|(name, _)| name == "id") {
        attrs.push(Attribute::new("id", id));
    }
    attrs
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn render(markdown: &str) -> String {
        let parser = pulldown_cmark::Parser::new_ext(markdown, pulldown_cmark::Options::ENABLE_TABLES);
        let mut html = String::new();
        pulldown_cmark::html::push_html(&mut html, parser);
        html
    }

    fn full_pipeline(markdown: &str, config: &CaptionConfig) -> (String, CrossReferences) {
        let page = PageRef::new("index.md", "Home");
        let mut references = CrossReferences::new(&config.cross_reference_text);
        let fenced = process_markdown(markdown, config, page.source_path);
        let html = process_html(&render(&fenced), config, &page, &mut references);
        let html = references.post_process(&page, &html);
        (html, references)
    }

    #[test]
    fn test_disabled_families_leave_markdown_alone() {
        let mut config = CaptionConfig::default();
        config.table.enable = false;
        config.figure.enable = false;
        config.custom.enable = false;
        config.additional_identifier = vec!["List".to_string()];

        let md = "Figure: A\n\n![a](a.png)\n\nTable: B\n\nList: C\n\n";
        assert_eq!(process_markdown(md, &config, "index.md"), md);
    }

    #[test]
    fn test_disabled_families_leave_html_alone() {
        let mut config = CaptionConfig::default();
        config.table.enable = false;
        config.figure.enable = false;
        config.custom.enable = false;

        let html = "<p><img src=\"a.png\" alt=\"A\"></p>\n<table><tr><td>1</td></tr></table>";
        let mut references = CrossReferences::default();
        let out = process_html(html, &config, &PageRef::new("a.md", "A"), &mut references);
        assert_eq!(out, html);
        assert!(references.is_empty());
    }

    #[test]
    fn test_untouched_page_is_returned_verbatim() {
        let html = "<p>Some <b>odd</b>   spacing<br/></p>";
        let mut references = CrossReferences::default();
        let out = process_html(
            html,
            &CaptionConfig::default(),
            &PageRef::new("a.md", "A"),
            &mut references,
        );
        assert_eq!(out, html);
    }

    #[test]
    fn test_figure_scenario() {
        let md = "Figure: Cat {#mycat}\n\n![Cat](cat.png)\n";
        let (html, references) = full_pipeline(md, &CaptionConfig::default());
        assert_eq!(
            html,
            "<figure id=\"mycat\"><img src=\"cat.png\" alt=\"Cat\"><figcaption>Figure 1: Cat</figcaption></figure>\n"
        );
        assert_eq!(references.len(), 1);
    }

    #[test]
    fn test_round_trip_of_caption_and_options() {
        let md = "Table: Numbers *in* bold {#tab .wide data-x=\"1\"}\n\n| a |\n|---|\n| 1 |\n";
        let fenced = process_markdown(md, &CaptionConfig::default(), "index.md");
        let mut dom = Dom::parse_fragment(&render(&fenced));
        let mut markers = CaptionMarkers::find(&dom, TABLE_CAPTION_TAG);
        let record = markers.next_record(&mut dom).unwrap().unwrap();

        assert_eq!(record.identifier, "Table");
        assert_eq!(record.body, "Numbers <em>in</em> bold");
        assert_eq!(
            record.attributes,
            vec![
                ("id".to_string(), "tab".to_string()),
                ("class".to_string(), "wide".to_string()),
                ("data-x".to_string(), "1".to_string()),
            ]
        );
        assert!(dom.is_element_named(record.target.unwrap(), "table"));
    }

    #[test]
    fn test_local_reference_is_filled() {
        let md = "See [](#_figure-1).\n\nFigure: Cat\n\n![Cat](cat.png)\n";
        let (html, _) = full_pipeline(md, &CaptionConfig::default());
        assert!(html.contains("<a href=\"#_figure-1\">Figure 1</a>"));
        assert!(html.contains("<figure id=\"_figure-1\">"));
    }

    #[test]
    fn test_custom_identifiers_are_numbered_separately() {
        let mut config = CaptionConfig::default();
        config.additional_identifier = vec!["List".to_string(), "Equation".to_string()];
        let md = "List: Fruits\n\n- apple\n\nEquation: Mass\n\n    E = mc^2\n\nList: Vegetables\n\n- leek\n";
        let (html, _) = full_pipeline(md, &config);

        assert!(html.contains("<figcaption>List 1: Fruits</figcaption>"));
        assert!(html.contains("<figcaption>Equation 1: Mass</figcaption>"));
        assert!(html.contains("<figcaption>List 2: Vegetables</figcaption>"));
        assert!(html.contains("<figure id=\"_list-2\">"));
    }

    #[test]
    fn test_bad_template_fails_open() {
        let mut config = CaptionConfig::default();
        config.table.caption_prefix = "{Identifier} {nope}:".to_string();
        let html = "<p><table-caption identifier=\"Table\"></table-caption></p>\
            <p>Numbers</p>\
            <p><table-caption-end></table-caption-end></p>\
            <table><tbody><tr><td>1</td></tr></tbody></table>";
        let mut references = CrossReferences::default();
        let out = process_html(html, &config, &PageRef::new("a.md", "A"), &mut references);
        assert_eq!(out, html);
    }

    #[test]
    fn test_guarded_catches_panics() {
        let result: Result<(), CaptionError> = guarded(|| panic!("boom"));
        match result {
            Err(CaptionError::Unexpected(message)) => assert_eq!(message, "boom"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_attributes_with_id() {
        let attrs = attributes_with_id(&[("class".into(), "wide".into())], "_figure-1");
        let names: Vec<&str> = attrs.iter().map(|a| a.local_name()).collect();
        assert_eq!(names, vec!["class", "id"]);

        let attrs = attributes_with_id(&[("id".into(), "old".into())], "new");
        assert_eq!(attrs[0].value, "new");
    }
}
