//! html5ever TreeSink that builds a [`Dom`].

use std::borrow::Cow;
use std::cell::RefCell;

use html5ever::driver::ParseOpts;
use html5ever::tendril::{StrTendril, TendrilSink};
use html5ever::tree_builder::{ElementFlags, NodeOrText, QuirksMode, TreeSink};
use html5ever::{Attribute as Html5Attribute, QualName, local_name, ns, parse_document};

use super::{Attribute, Dom, NodeData, NodeId};

static EMPTY_NAME: QualName = QualName {
    prefix: None,
    ns: ns!(),
    local: local_name!(""),
};

/// Handle the tree builder holds on to.
///
/// Element handles carry their own name so `elem_name` can hand out a
/// reference without reaching through the `RefCell`.
#[derive(Debug, Clone)]
pub struct NodeHandle {
    id: NodeId,
    name: Option<QualName>,
}

impl NodeHandle {
    fn plain(id: NodeId) -> Self {
        Self { id, name: None }
    }
}

/// Uses interior mutability because `TreeSink` methods take `&self`.
struct DomSink {
    dom: RefCell<Dom>,
}

impl DomSink {
    fn new() -> Self {
        Self {
            dom: RefCell::new(Dom::new()),
        }
    }

    fn into_dom(self) -> Dom {
        self.dom.into_inner()
    }
}

/// Parse a complete document into a fresh tree.
pub(super) fn parse(html: &str) -> Dom {
    parse_document(DomSink::new(), ParseOpts::default())
        .from_utf8()
        .one(html.as_bytes())
        .into_dom()
}

impl TreeSink for DomSink {
    type Handle = NodeHandle;
    type Output = Self;
    type ElemName<'a>
        = &'a QualName
    where
        Self: 'a;

    fn finish(self) -> Self::Output {
        self
    }

    fn parse_error(&self, _msg: Cow<'static, str>) {
        // Lenient like browsers; malformed input still produces a tree.
    }

    fn get_document(&self) -> Self::Handle {
        NodeHandle::plain(self.dom.borrow().document())
    }

    fn elem_name<'a>(&'a self, target: &'a Self::Handle) -> Self::ElemName<'a> {
        target.name.as_ref().unwrap_or(&EMPTY_NAME)
    }

    fn create_element(
        &self,
        name: QualName,
        attrs: Vec<Html5Attribute>,
        _flags: ElementFlags,
    ) -> Self::Handle {
        let attrs = attrs
            .into_iter()
            .map(|a| Attribute {
                name: a.name,
                value: a.value.to_string(),
            })
            .collect();
        let id = self
            .dom
            .borrow_mut()
            .create_element_qualified(name.clone(), attrs);
        NodeHandle {
            id,
            name: Some(name),
        }
    }

    fn create_comment(&self, text: StrTendril) -> Self::Handle {
        NodeHandle::plain(self.dom.borrow_mut().create_comment(text.to_string()))
    }

    fn create_pi(&self, _target: StrTendril, _data: StrTendril) -> Self::Handle {
        NodeHandle::plain(self.dom.borrow_mut().create_comment(String::new()))
    }

    fn append(&self, parent: &Self::Handle, child: NodeOrText<Self::Handle>) {
        let mut dom = self.dom.borrow_mut();
        match child {
            NodeOrText::AppendNode(node) => dom.append(parent.id, node.id),
            NodeOrText::AppendText(text) => dom.append_text(parent.id, &text),
        }
    }

    fn append_based_on_parent_node(
        &self,
        element: &Self::Handle,
        prev_element: &Self::Handle,
        child: NodeOrText<Self::Handle>,
    ) {
        let has_parent = self.dom.borrow().parent(element.id).is_some();
        if has_parent {
            self.append_before_sibling(element, child);
        } else {
            self.append(prev_element, child);
        }
    }

    fn append_doctype_to_document(
        &self,
        name: StrTendril,
        _public_id: StrTendril,
        _system_id: StrTendril,
    ) {
        let mut dom = self.dom.borrow_mut();
        let doctype = dom.create_doctype(name.to_string());
        let document = dom.document();
        dom.append(document, doctype);
    }

    fn get_template_contents(&self, target: &Self::Handle) -> Self::Handle {
        target.clone()
    }

    fn same_node(&self, x: &Self::Handle, y: &Self::Handle) -> bool {
        x.id == y.id
    }

    fn set_quirks_mode(&self, _mode: QuirksMode) {}

    fn append_before_sibling(&self, sibling: &Self::Handle, new_node: NodeOrText<Self::Handle>) {
        let mut dom = self.dom.borrow_mut();
        match new_node {
            NodeOrText::AppendNode(node) => dom.insert_before(sibling.id, node.id),
            NodeOrText::AppendText(text) => {
                let node = dom.create_text(text.to_string());
                dom.insert_before(sibling.id, node);
            }
        }
    }

    fn add_attrs_if_missing(&self, target: &Self::Handle, attrs: Vec<Html5Attribute>) {
        let mut dom = self.dom.borrow_mut();
        for attr in attrs {
            let local = attr.name.local.to_string();
            if dom.attr(target.id, &local).is_none()
                && matches!(dom.data(target.id), NodeData::Element { .. })
            {
                dom.set_attr(target.id, &local, attr.value.to_string());
            }
        }
    }

    fn remove_from_parent(&self, target: &Self::Handle) {
        self.dom.borrow_mut().detach(target.id);
    }

    fn reparent_children(&self, node: &Self::Handle, new_parent: &Self::Handle) {
        self.dom
            .borrow_mut()
            .reparent_children(node.id, new_parent.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_parse() {
        let dom = parse("<html><body><p>Hello</p></body></html>");
        let p = dom.elements_by_tag(dom.document(), "p")[0];
        assert_eq!(dom.text_content(p), "Hello");
    }

    #[test]
    fn test_custom_elements_keep_attributes() {
        let dom = parse(r#"<p><figure-caption identifier="Figure" id="x"></figure-caption></p>"#);
        let marker = dom.elements_by_tag(dom.document(), "figure-caption")[0];
        assert_eq!(dom.attr(marker, "identifier"), Some("Figure"));
        assert_eq!(dom.attr(marker, "id"), Some("x"));
        let parent = dom.parent(marker).unwrap();
        assert_eq!(dom.element_name(parent), Some("p"));
    }

    #[test]
    fn test_misnested_markup_recovers() {
        let dom = parse("<body><p><b>bold</p>after</body>");
        let body = dom.body().unwrap();
        assert!(dom.text_content(body).contains("after"));
        assert!(!dom.elements_by_tag(dom.document(), "b").is_empty());
    }
}
