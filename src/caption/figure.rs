//! Figure captions.
//!
//! Images standing alone in a paragraph become numbered `figure`s. The
//! caption comes from a fenced `Figure:` line, else the image `title`, else
//! its `alt` text.

use std::collections::{HashMap, HashSet};

use crate::config::IdentifierConfig;
use crate::dom::{Dom, NodeId, escape_text};

use super::{
    CaptionError, CaptionMarkers, CaptionRecord, CrossReferences, FIGURE_CAPTION_TAG,
    IndexCounter, PageRef, attributes_with_id, caption_element, wrap_in_figure,
};

const IDENTIFIER: &str = "figure";

pub(super) fn process(
    dom: &mut Dom,
    config: &IdentifierConfig,
    page: &PageRef<'_>,
    references: &mut CrossReferences,
) -> Result<(), CaptionError> {
    if !config.enable {
        return Ok(());
    }

    let mut explicit = explicit_captions(dom, page);

    let mut counter = IndexCounter::new(config.start_index, config.increment_index);
    let mut grouped: HashSet<NodeId> = HashSet::new();
    let candidates: Vec<NodeId> = dom
        .elements_by_tag(dom.document(), "img")
        .into_iter()
        .filter(|&img| is_paragraph_image(dom, img) || explicit.contains_key(&img))
        .collect();

    for img in candidates {
        if grouped.contains(&img) || is_ignored(dom, img, &config.ignore_classes) {
            continue;
        }

        let record = explicit.remove(&img);
        let variants = if config.ignore_hash {
            Vec::new()
        } else {
            hash_variants(dom, img)
        };

        let (caption, attributes) = match record {
            Some(record) => (record.body, record.attributes),
            None => match dom.attr(img, "title") {
                Some(title) => (escape_text(title), Vec::new()),
                None => {
                    let alt = match dom.attr(img, "alt") {
                        Some(alt) if !config.ignore_alt && !alt.is_empty() => escape_text(alt),
                        _ => continue,
                    };
                    let last = variants.last().copied().unwrap_or(img);
                    if has_trailing_content(dom, last) {
                        continue;
                    }
                    (alt, Vec::new())
                }
            },
        };

        let index = counter.current(IDENTIFIER);
        let figure = Figure {
            image: img,
            variants: &variants,
            caption: &caption,
            attributes: &attributes,
        };
        match figure.assemble(dom, config, index, page, references) {
            Ok(()) => {
                grouped.extend(variants.iter().copied());
                counter.advance(IDENTIFIER);
            }
            Err(e) if e.is_caption_level() => {
                tracing::error!(page = page.source_path, error = %e, "skipping figure caption");
            }
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

/// Fenced figure captions keyed by the image they describe.
fn explicit_captions(dom: &mut Dom, page: &PageRef<'_>) -> HashMap<NodeId, CaptionRecord> {
    let mut explicit = HashMap::new();
    let mut markers = CaptionMarkers::find(dom, FIGURE_CAPTION_TAG);
    while let Some(record) = markers.next_record(dom) {
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                tracing::error!(page = page.source_path, error = %e, "skipping figure caption");
                continue;
            }
        };
        match record.target.and_then(|target| first_image(dom, target)) {
            Some(img) => {
                explicit.insert(img, record);
            }
            None => tracing::error!(
                page = page.source_path,
                caption = %record.body,
                "figure caption must be followed by an image, skipping"
            ),
        }
    }
    explicit
}

struct Figure<'a> {
    image: NodeId,
    /// `#fragment` images sharing the caption, in document order
    variants: &'a [NodeId],
    /// Caption markup
    caption: &'a str,
    attributes: &'a [(String, String)],
}

impl Figure<'_> {
    fn assemble(
        &self,
        dom: &mut Dom,
        config: &IdentifierConfig,
        index: i64,
        page: &PageRef<'_>,
        references: &mut CrossReferences,
    ) -> Result<(), CaptionError> {
        let prefix = config.caption_prefix(IDENTIFIER, index)?;
        let reference = config.reference_text(IDENTIFIER, index)?;

        let explicit_id = self
            .attributes
            .iter()
            .find(|(name, _)| name == "id")
            .map(|(_, id)| id.clone());
        let image_id = dom.attr(self.image, "id").map(str::to_string);
        let figure_id = match (&explicit_id, &image_id) {
            (Some(id), _) | (None, Some(id)) => id.clone(),
            (None, None) => config.default_id(IDENTIFIER, index)?,
        };

        let figcaption = caption_element(
            dom,
            "figcaption",
            Vec::new(),
            &format!("{prefix} {}", self.caption),
        )?;

        // The figure takes over the image id unless the caption names its own.
        if explicit_id.is_none() {
            dom.remove_attr(self.image, "id");
        }
        dom.remove_attr(self.image, "title");

        let targets: Vec<NodeId> = std::iter::once(self.image)
            .chain(self.variants.iter().copied())
            .map(|img| wrap_target(dom, img))
            .collect();
        let paragraph = dom.parent(targets[0]);
        let figure = wrap_in_figure(
            dom,
            &targets,
            figcaption,
            config.position,
            attributes_with_id(self.attributes, &figure_id),
        );
        if let Some(paragraph) = paragraph
            && dom.is_element_named(paragraph, "p")
        {
            unwrap_paragraph(dom, paragraph, figure);
        }

        if let Some(image_id) = &image_id
            && *image_id != figure_id
        {
            references.register_target(image_id, &reference, page);
        }
        references.register_target(&figure_id, &reference, page);
        Ok(())
    }
}

/// `p > img` or `p > a > img`
fn is_paragraph_image(dom: &Dom, img: NodeId) -> bool {
    let Some(parent) = dom.parent(img) else {
        return false;
    };
    if dom.is_element_named(parent, "p") {
        return true;
    }
    dom.is_element_named(parent, "a")
        && dom
            .parent(parent)
            .is_some_and(|grandparent| dom.is_element_named(grandparent, "p"))
}

fn is_ignored(dom: &Dom, img: NodeId, ignore_classes: &[String]) -> bool {
    ignore_classes.iter().any(|class| dom.has_class(img, class))
}

fn first_image(dom: &Dom, target: NodeId) -> Option<NodeId> {
    if dom.is_element_named(target, "img") {
        return Some(target);
    }
    dom.elements_by_tag(target, "img").into_iter().next()
}

/// The node that moves into the figure: the image or its enclosing link.
fn wrap_target(dom: &Dom, img: NodeId) -> NodeId {
    match dom.parent(img) {
        Some(parent) if dom.is_element_named(parent, "a") => parent,
        _ => img,
    }
}

fn has_fragment(dom: &Dom, img: NodeId) -> bool {
    dom.attr(img, "src").is_some_and(|src| src.contains('#'))
}

/// Images following `img` that are variants of it (`a.png#light`, `b.png#dark`).
fn hash_variants(dom: &Dom, img: NodeId) -> Vec<NodeId> {
    let mut variants = Vec::new();
    let mut current = img;
    while has_fragment(dom, current) {
        match next_image(dom, wrap_target(dom, current)) {
            Some(next) if has_fragment(dom, next) => {
                variants.push(next);
                current = next;
            }
            _ => break,
        }
    }
    variants
}

/// The image right after `node`, skipping whitespace, bare or inside a link.
fn next_image(dom: &Dom, node: NodeId) -> Option<NodeId> {
    let sibling = dom
        .following_siblings(node)
        .into_iter()
        .find(|&s| !dom.is_blank_text(s))?;
    if dom.is_element_named(sibling, "img") {
        return Some(sibling);
    }
    if dom.is_element_named(sibling, "a") {
        let children: Vec<NodeId> = dom
            .children(sibling)
            .iter()
            .copied()
            .filter(|&c| !dom.is_blank_text(c))
            .collect();
        if let [only] = children.as_slice()
            && dom.is_element_named(*only, "img")
        {
            return Some(*only);
        }
    }
    None
}

/// Whether anything but whitespace follows the image in its paragraph.
fn has_trailing_content(dom: &Dom, img: NodeId) -> bool {
    dom.following_siblings(wrap_target(dom, img))
        .into_iter()
        .any(|s| !dom.is_blank_text(s))
}

/// Replace `paragraph` by `figure` if the figure is all it holds.
fn unwrap_paragraph(dom: &mut Dom, paragraph: NodeId, figure: NodeId) {
    let only_figure = dom
        .children(paragraph)
        .iter()
        .all(|&c| c == figure || dom.is_blank_text(c));
    if only_figure {
        dom.insert_before(paragraph, figure);
        dom.detach(paragraph);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Position;
    use pretty_assertions::assert_eq;

    const PAGE: PageRef<'static> = PageRef {
        source_path: "figures.md",
        title: "Figures",
    };

    fn marker(options: &str, caption: &str) -> String {
        format!(
            "<p><figure-caption identifier=\"Figure\"{options}></figure-caption></p>\
             <p>{caption}</p>\
             <p><figure-caption-end></figure-caption-end></p>"
        )
    }

    fn run(html: &str, config: &IdentifierConfig) -> (String, CrossReferences) {
        let mut dom = Dom::parse_fragment(html);
        let mut references = CrossReferences::default();
        process(&mut dom, config, &PAGE, &mut references).unwrap();
        (dom.fragment_html(), references)
    }

    #[test]
    fn test_alt_text_caption() {
        let (out, references) = run(
            "<p><img src=\"cat.png\" alt=\"Cat\"></p>",
            &IdentifierConfig::default(),
        );
        assert_eq!(
            out,
            "<figure id=\"_figure-1\"><img src=\"cat.png\" alt=\"Cat\"><figcaption>Figure 1: Cat</figcaption></figure>"
        );
        assert_eq!(references.len(), 1);
    }

    #[test]
    fn test_title_wins_over_alt() {
        let (out, _) = run(
            "<p><img src=\"a.png\" alt=\"Alt\" title=\"Title &amp; more\"></p>",
            &IdentifierConfig::default(),
        );
        assert_eq!(
            out,
            "<figure id=\"_figure-1\"><img src=\"a.png\" alt=\"Alt\"><figcaption>Figure 1: Title &amp; more</figcaption></figure>"
        );
    }

    #[test]
    fn test_explicit_caption_wins_and_position_top() {
        let config = IdentifierConfig {
            position: Position::Top,
            ..IdentifierConfig::default()
        };
        let html = format!(
            "{}<p><img src=\"a.png\" alt=\"A\" title=\"T\"></p>",
            marker("", "Explicit <em>caption</em>")
        );
        let (out, _) = run(&html, &config);
        assert_eq!(
            out,
            "<figure id=\"_figure-1\"><figcaption>Figure 1: Explicit <em>caption</em></figcaption><img src=\"a.png\" alt=\"A\"></figure>"
        );
    }

    #[test]
    fn test_ignore_alt() {
        let config = IdentifierConfig {
            ignore_alt: true,
            ..IdentifierConfig::default()
        };
        let mut dom = Dom::parse_fragment("<p><img src=\"a.png\" alt=\"A\"></p>");
        let mut references = CrossReferences::default();
        process(&mut dom, &config, &PAGE, &mut references).unwrap();
        assert!(!dom.is_modified());
    }

    #[test]
    fn test_ignored_class() {
        let html = "<p><img class=\"emoji twemoji\" src=\"e.svg\" alt=\"smile\"></p>";
        let (out, references) = run(html, &IdentifierConfig::default());
        assert_eq!(out, html);
        assert!(references.is_empty());
    }

    #[test]
    fn test_inline_image_is_not_a_figure() {
        let html = "<p>Look <img src=\"a.png\" alt=\"A\"> here</p>";
        let (out, _) = run(html, &IdentifierConfig::default());
        assert_eq!(out, html);
    }

    #[test]
    fn test_linked_image() {
        let (out, _) = run(
            "<p><a href=\"big.png\"><img src=\"a.png\" alt=\"A\"></a></p>",
            &IdentifierConfig::default(),
        );
        assert_eq!(
            out,
            "<figure id=\"_figure-1\"><a href=\"big.png\"><img src=\"a.png\" alt=\"A\"></a><figcaption>Figure 1: A</figcaption></figure>"
        );
    }

    #[test]
    fn test_hash_variants_share_one_figure() {
        let html = "<p><img src=\"a.png#light-only\" alt=\"Cat\">\n<img src=\"b.png#dark-only\" alt=\"Cat\"></p>";
        let (out, _) = run(html, &IdentifierConfig::default());
        assert_eq!(out.matches("<figure").count(), 1);
        assert_eq!(out.matches("<figcaption>").count(), 1);
        assert_eq!(
            out,
            "<figure id=\"_figure-1\"><img src=\"a.png#light-only\" alt=\"Cat\"><img src=\"b.png#dark-only\" alt=\"Cat\"><figcaption>Figure 1: Cat</figcaption></figure>"
        );
    }

    #[test]
    fn test_ignore_hash_keeps_images_apart() {
        let config = IdentifierConfig {
            ignore_hash: true,
            ..IdentifierConfig::default()
        };
        let html = "<p><img src=\"a.png#light-only\" alt=\"Cat\">\n<img src=\"b.png#dark-only\" alt=\"Cat\"></p>";
        let (out, _) = run(html, &config);
        assert!(out.contains("<figure id=\"_figure-1\"><img src=\"b.png#dark-only\""));
        assert!(!out.contains("<figure id=\"_figure-1\"><img src=\"a.png"));
    }

    #[test]
    fn test_image_id_moves_to_figure() {
        let (out, references) = run(
            "<p><img id=\"cat\" src=\"c.png\" alt=\"C\"></p>",
            &IdentifierConfig::default(),
        );
        assert_eq!(
            out,
            "<figure id=\"cat\"><img src=\"c.png\" alt=\"C\"><figcaption>Figure 1: C</figcaption></figure>"
        );
        assert_eq!(references.len(), 1);
    }

    #[test]
    fn test_image_and_figure_ids_both_resolve() {
        let html = format!(
            "{}<p><img id=\"legacy\" src=\"c.png\" alt=\"C\"></p>",
            marker(" id=\"fig\"", "Caption")
        );
        let (out, references) = run(&html, &IdentifierConfig::default());
        assert!(out.starts_with("<figure id=\"fig\"><img id=\"legacy\""));
        assert_eq!(references.len(), 2);
        assert_eq!(
            references
                .post_process(&PAGE, "<a href=\"#legacy\"></a><a href=\"#fig\"></a>"),
            "<a href=\"#legacy\">Figure 1</a><a href=\"#fig\">Figure 1</a>"
        );
    }

    #[test]
    fn test_sequential_numbering() {
        let html = "<p><img src=\"a.png\" alt=\"A\"></p><p>text</p><p><img src=\"b.png\" alt=\"B\"></p>";
        let (out, _) = run(html, &IdentifierConfig::default());
        assert!(out.contains("<figure id=\"_figure-1\"><img src=\"a.png\""));
        assert!(out.contains("<figure id=\"_figure-2\"><img src=\"b.png\""));
        assert!(out.contains("Figure 2: B"));
    }

    #[test]
    fn test_caption_without_image_is_skipped() {
        let html = format!("{}<p>No image</p>", marker("", "Lost"));
        let (out, references) = run(&html, &IdentifierConfig::default());
        assert_eq!(out, "<p>No image</p>");
        assert!(references.is_empty());
    }

    #[test]
    fn test_malformed_prefix_leaves_images() {
        let config = IdentifierConfig {
            caption_prefix: "Figure {index} <b>".to_string(),
            ..IdentifierConfig::default()
        };
        let html = "<p><img src=\"a.png\" alt=\"A\"></p><p><img src=\"b.png\" alt=\"B\"></p>";
        let (out, references) = run(html, &config);
        assert_eq!(out, html);
        assert!(references.is_empty());
    }
}
