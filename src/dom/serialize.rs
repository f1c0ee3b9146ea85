//! Tree serialization through html5ever's serializer.

use std::io;

use html5ever::serialize::{Serialize, SerializeOpts, Serializer, TraversalScope, serialize};

use super::{Dom, NodeData, NodeId};

/// Escape text content.
pub fn escape_text(s: &str) -> String {
    quick_xml::escape::partial_escape(s).into_owned()
}

/// Escape a double-quoted attribute value.
pub fn escape_attr(s: &str) -> String {
    quick_xml::escape::escape(s).into_owned()
}

/// A node of a [`Dom`] as seen by html5ever's serializer.
struct SerializableNode<'a> {
    dom: &'a Dom,
    id: NodeId,
}

impl SerializableNode<'_> {
    fn serialize_children<S: Serializer>(&self, serializer: &mut S) -> io::Result<()> {
        for &child in self.dom.children(self.id) {
            SerializableNode {
                dom: self.dom,
                id: child,
            }
            .serialize(serializer, TraversalScope::IncludeNode)?;
        }
        Ok(())
    }
}

impl Serialize for SerializableNode<'_> {
    fn serialize<S>(&self, serializer: &mut S, traversal_scope: TraversalScope) -> io::Result<()>
    where
        S: Serializer,
    {
        match (traversal_scope, self.dom.data(self.id)) {
            (TraversalScope::IncludeNode, NodeData::Element { name, attrs }) => {
                serializer.start_elem(
                    name.clone(),
                    attrs.iter().map(|attr| (&attr.name, attr.value.as_str())),
                )?;
                self.serialize_children(serializer)?;
                serializer.end_elem(name.clone())
            }
            (TraversalScope::IncludeNode, NodeData::Text(text)) => serializer.write_text(text),
            (TraversalScope::IncludeNode, NodeData::Comment(text)) => {
                serializer.write_comment(text)
            }
            (TraversalScope::IncludeNode, NodeData::Doctype { name }) => {
                serializer.write_doctype(name)
            }
            (TraversalScope::IncludeNode, NodeData::Document)
            | (TraversalScope::ChildrenOnly(_), _) => self.serialize_children(serializer),
        }
    }
}

pub(super) fn to_html(dom: &Dom, id: NodeId, traversal_scope: TraversalScope) -> String {
    let mut bytes = Vec::new();
    let opts = SerializeOpts {
        traversal_scope,
        ..Default::default()
    };
    if let Err(e) = serialize(&mut bytes, &SerializableNode { dom, id }, opts) {
        tracing::error!(error = %e, "failed to serialize HTML");
    }
    String::from_utf8(bytes).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Attribute;

    #[test]
    fn test_escape_text() {
        assert_eq!(escape_text("a < b & c"), "a &lt; b &amp; c");
    }

    #[test]
    fn test_escape_attr() {
        assert_eq!(escape_attr(r#"say "hi" & go"#), "say &quot;hi&quot; &amp; go");
    }

    #[test]
    fn test_void_elements_have_no_end_tag() {
        let dom = Dom::parse_fragment(r#"<p><img src="a.png" alt="A"><br></p>"#);
        let p = dom.elements_by_tag(dom.document(), "p")[0];
        assert_eq!(dom.outer_html(p), r#"<p><img src="a.png" alt="A"><br></p>"#);
        assert_eq!(dom.inner_html(p), r#"<img src="a.png" alt="A"><br>"#);
    }

    #[test]
    fn test_created_elements_serialize_like_parsed_ones() {
        let mut dom = Dom::parse_fragment("<p></p>");
        let p = dom.elements_by_tag(dom.document(), "p")[0];
        let img = dom.create_element("img", vec![Attribute::new("alt", "x & y")]);
        dom.append(p, img);
        dom.append_text(p, "\u{a0}caption");
        assert_eq!(dom.fragment_html(), "<p><img alt=\"x &amp; y\">&nbsp;caption</p>");
    }

    #[test]
    fn test_raw_text_not_escaped() {
        let dom = Dom::parse_fragment("<script>if (a < b) {}</script><p>a &lt; b</p>");
        assert_eq!(
            dom.fragment_html(),
            "<script>if (a < b) {}</script><p>a &lt; b</p>"
        );
    }
}
