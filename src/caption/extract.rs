//! HTML-phase extraction of fenced captions.
//!
//! After markdown rendering a fenced caption looks like
//!
//! ```html
//! <p><figure-caption identifier="Figure" id="cat"></figure-caption></p>
//! <p>A cat</p>
//! <p><figure-caption-end></figure-caption-end></p>
//! <p><img src="cat.png" alt="cat"></p>
//! ```
//!
//! Extraction removes the scaffolding and hands back the caption body, the
//! marker attributes and the element that follows the end marker.

use crate::dom::{Dom, NodeId};

use super::CaptionError;

/// One extracted caption.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionRecord {
    /// Element following the end marker
    pub target: Option<NodeId>,
    /// Marker attributes other than `identifier`, in source order
    pub attributes: Vec<(String, String)>,
    /// Caption markup
    pub body: String,
    /// Identifier as written in the markdown keyword, e.g. `Figure`
    pub identifier: String,
}

impl CaptionRecord {
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Remove an attribute and return its value.
    pub fn take_attribute(&mut self, name: &str) -> Option<String> {
        let index = self.attributes.iter().position(|(key, _)| key == name)?;
        Some(self.attributes.remove(index).1)
    }
}

/// Markers of one tag, collected up front in document order.
pub struct CaptionMarkers {
    tag: String,
    end_tag: String,
    pending: std::vec::IntoIter<NodeId>,
}

impl CaptionMarkers {
    pub fn find(dom: &Dom, tag: &str) -> Self {
        let markers = dom.elements_by_tag(dom.document(), tag);
        Self {
            tag: tag.to_string(),
            end_tag: format!("{tag}-end"),
            pending: markers.into_iter(),
        }
    }

    /// Extract the next caption still attached to the tree.
    ///
    /// An error only concerns that one caption; the caller may keep going.
    pub fn next_record(&mut self, dom: &mut Dom) -> Option<Result<CaptionRecord, CaptionError>> {
        loop {
            let marker = self.pending.next()?;
            if dom.is_connected(marker) {
                return Some(self.extract(dom, marker));
            }
        }
    }

    fn extract(&self, dom: &mut Dom, marker: NodeId) -> Result<CaptionRecord, CaptionError> {
        let wrapper = match dom.parent(marker) {
            Some(parent) if !is_root(dom, parent) => parent,
            _ => marker,
        };

        let identifier = dom.attr(marker, "identifier").unwrap_or_default().to_string();
        let attributes = dom
            .attrs(marker)
            .iter()
            .filter(|a| a.local_name() != "identifier")
            .map(|a| (a.local_name().to_string(), a.value.clone()))
            .collect();

        let mut body = Vec::new();
        let mut end = None;
        let mut cursor = dom.next_element_sibling(wrapper);
        while let Some(sibling) = cursor {
            if self.is_end(dom, sibling) {
                end = Some(sibling);
                break;
            }
            body.push(sibling);
            cursor = dom.next_element_sibling(sibling);
        }

        let Some(end) = end else {
            remove_scaffolding(dom, wrapper);
            return Err(CaptionError::StructuralMismatch {
                caption: identifier,
                reason: format!("<{}> has no matching <{}>", self.tag, self.end_tag),
            });
        };

        let target = dom.next_element_sibling(end);
        let body_html = caption_body(dom, &body);

        remove_scaffolding(dom, wrapper);
        for node in body {
            remove_scaffolding(dom, node);
        }
        remove_scaffolding(dom, end);

        Ok(CaptionRecord {
            target,
            attributes,
            body: body_html,
            identifier,
        })
    }

    /// The end marker itself, or a wrapper directly holding it.
    fn is_end(&self, dom: &Dom, node: NodeId) -> bool {
        dom.is_element_named(node, &self.end_tag)
            || dom
                .children(node)
                .iter()
                .any(|&child| dom.is_element_named(child, &self.end_tag))
    }
}

fn is_root(dom: &Dom, node: NodeId) -> bool {
    node == dom.document() || dom.is_element_named(node, "body")
}

/// Detach `node` along with the whitespace text that follows it.
fn remove_scaffolding(dom: &mut Dom, node: NodeId) {
    if let Some(next) = dom.following_siblings(node).first().copied()
        && dom.is_blank_text(next)
    {
        dom.detach(next);
    }
    dom.detach(node);
}

/// Serialize the caption body; a lone paragraph contributes its content only.
fn caption_body(dom: &Dom, nodes: &[NodeId]) -> String {
    if let [single] = nodes
        && dom.is_element_named(*single, "p")
        && dom.attrs(*single).is_empty()
    {
        return dom.inner_html(*single).trim_matches('\n').to_string();
    }

    nodes
        .iter()
        .map(|&node| dom.outer_html(node).trim_matches('\n').to_string())
        .collect()
}
