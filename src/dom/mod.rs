//! Arena-backed HTML tree used by the caption assemblers.
//!
//! Nodes live in a single vector and are addressed by [`NodeId`]. Every node
//! keeps an ordered list of child ids plus a parent link used only for
//! navigation; splicing a node never invalidates any other id.

mod fragment;
mod serialize;
mod tree_sink;

use html5ever::serialize::TraversalScope;
use html5ever::{LocalName, QualName, ns};

pub use fragment::{FragmentError, check_well_formed};
pub use serialize::{escape_attr, escape_text};

/// Index of a node in its [`Dom`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// An element attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: QualName,
    pub value: String,
}

impl Attribute {
    /// Create an attribute in the null namespace.
    pub fn new(name: &str, value: impl Into<String>) -> Self {
        Self {
            name: QualName::new(None, ns!(), LocalName::from(name)),
            value: value.into(),
        }
    }

    /// The attribute's local name.
    pub fn local_name(&self) -> &str {
        self.name.local.as_ref()
    }
}

#[derive(Debug, Clone)]
pub enum NodeData {
    Document,
    Doctype { name: String },
    Element { name: QualName, attrs: Vec<Attribute> },
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone)]
pub struct Node {
    pub data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    fn new(data: NodeData) -> Self {
        Self {
            data,
            parent: None,
            children: Vec::new(),
        }
    }
}

/// A mutable HTML tree.
#[derive(Debug, Clone)]
pub struct Dom {
    nodes: Vec<Node>,
    document: NodeId,
    modified: bool,
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}

impl Dom {
    /// Create an empty tree holding only a document node.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new(NodeData::Document)],
            document: NodeId(0),
            modified: false,
        }
    }

    /// Parse a complete HTML document.
    pub fn parse_document(html: &str) -> Self {
        let mut dom = tree_sink::parse(html);
        dom.modified = false;
        dom
    }

    /// Parse an HTML fragment as the content of a `<body>`.
    ///
    /// The fragment's top-level nodes are the children of [`Dom::body`].
    pub fn parse_fragment(html: &str) -> Self {
        Self::parse_document(&format!(
            "<!DOCTYPE html><html><head></head><body>{html}</body></html>"
        ))
    }

    pub fn document(&self) -> NodeId {
        self.document
    }

    /// Whether any mutation happened since parsing.
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0].data
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// The `<body>` element, if the tree has one.
    pub fn body(&self) -> Option<NodeId> {
        self.descendants(self.document)
            .into_iter()
            .find(|&id| self.is_element_named(id, "body"))
    }

    // =========================================================================
    // Construction
    // =========================================================================

    fn alloc(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(data));
        id
    }

    pub fn create_element(&mut self, local: &str, attrs: Vec<Attribute>) -> NodeId {
        let name = QualName::new(None, ns!(html), LocalName::from(local));
        self.create_element_qualified(name, attrs)
    }

    pub fn create_element_qualified(&mut self, name: QualName, attrs: Vec<Attribute>) -> NodeId {
        self.alloc(NodeData::Element { name, attrs })
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.alloc(NodeData::Text(text.into()))
    }

    pub fn create_comment(&mut self, text: impl Into<String>) -> NodeId {
        self.alloc(NodeData::Comment(text.into()))
    }

    pub fn create_doctype(&mut self, name: impl Into<String>) -> NodeId {
        self.alloc(NodeData::Doctype { name: name.into() })
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    /// Append `child` as the last child of `parent`, detaching it first.
    pub fn append(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[parent.0].children.push(child);
        self.nodes[child.0].parent = Some(parent);
        self.modified = true;
    }

    /// Append text to `parent`, merging with a trailing text node.
    pub fn append_text(&mut self, parent: NodeId, text: &str) {
        if let Some(&last) = self.nodes[parent.0].children.last()
            && let NodeData::Text(existing) = &mut self.nodes[last.0].data
        {
            existing.push_str(text);
            self.modified = true;
            return;
        }
        let node = self.create_text(text);
        self.append(parent, node);
    }

    /// Insert `child` at `index` among `parent`'s children.
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) {
        self.detach(child);
        let children = &mut self.nodes[parent.0].children;
        let index = index.min(children.len());
        children.insert(index, child);
        self.nodes[child.0].parent = Some(parent);
        self.modified = true;
    }

    /// Insert `new_node` immediately before `sibling`.
    ///
    /// Does nothing if `sibling` has no parent.
    pub fn insert_before(&mut self, sibling: NodeId, new_node: NodeId) {
        if sibling == new_node {
            return;
        }
        self.detach(new_node);
        let Some(parent) = self.nodes[sibling.0].parent else {
            return;
        };
        let Some(index) = self.index_in_parent(sibling) else {
            return;
        };
        self.nodes[parent.0].children.insert(index, new_node);
        self.nodes[new_node.0].parent = Some(parent);
        self.modified = true;
    }

    /// Remove a node (and its subtree) from its parent.
    pub fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.nodes[id.0].parent.take() else {
            return;
        };
        self.nodes[parent.0].children.retain(|&c| c != id);
        self.modified = true;
    }

    /// Move every child of `from` to the end of `to`.
    pub fn reparent_children(&mut self, from: NodeId, to: NodeId) {
        let children = std::mem::take(&mut self.nodes[from.0].children);
        for child in children {
            self.nodes[child.0].parent = None;
            self.append(to, child);
        }
    }

    /// Deep-copy `node` from another tree into this one. The copy is detached.
    pub fn import(&mut self, other: &Dom, node: NodeId) -> NodeId {
        let copy = self.alloc(other.data(node).clone());
        for &child in other.children(node) {
            let child_copy = self.import(other, child);
            self.append(copy, child_copy);
        }
        copy
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.nodes[id.0].parent?;
        self.nodes[parent.0].children.iter().position(|&c| c == id)
    }

    /// Whether the node is still reachable from the document root.
    pub fn is_connected(&self, id: NodeId) -> bool {
        let mut current = id;
        loop {
            if current == self.document {
                return true;
            }
            match self.nodes[current.0].parent {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    /// Siblings that come after `id`, in order.
    pub fn following_siblings(&self, id: NodeId) -> Vec<NodeId> {
        match (self.parent(id), self.index_in_parent(id)) {
            (Some(parent), Some(index)) => self.children(parent)[index + 1..].to_vec(),
            _ => Vec::new(),
        }
    }

    pub fn next_element_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.following_siblings(id)
            .into_iter()
            .find(|&s| self.is_element(s))
    }

    /// All descendants of `id` in document order, excluding `id` itself.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }
        out
    }

    /// Descendant elements of `root` with the given local name, in document order.
    pub fn elements_by_tag(&self, root: NodeId, tag: &str) -> Vec<NodeId> {
        self.descendants(root)
            .into_iter()
            .filter(|&id| self.is_element_named(id, tag))
            .collect()
    }

    // =========================================================================
    // Element accessors
    // =========================================================================

    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.data(id), NodeData::Element { .. })
    }

    pub fn element_name(&self, id: NodeId) -> Option<&str> {
        match self.data(id) {
            NodeData::Element { name, .. } => Some(name.local.as_ref()),
            _ => None,
        }
    }

    pub fn is_element_named(&self, id: NodeId, tag: &str) -> bool {
        self.element_name(id) == Some(tag)
    }

    pub fn attrs(&self, id: NodeId) -> &[Attribute] {
        match self.data(id) {
            NodeData::Element { attrs, .. } => attrs,
            _ => &[],
        }
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.attrs(id)
            .iter()
            .find(|a| a.local_name() == name)
            .map(|a| a.value.as_str())
    }

    /// Set an attribute, replacing an existing value in place.
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: impl Into<String>) {
        let value = value.into();
        if let NodeData::Element { attrs, .. } = &mut self.nodes[id.0].data {
            match attrs.iter_mut().find(|a| a.local_name() == name) {
                Some(existing) => existing.value = value,
                None => attrs.push(Attribute::new(name, value)),
            }
            self.modified = true;
        }
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) -> Option<String> {
        let NodeData::Element { attrs, .. } = &mut self.nodes[id.0].data else {
            return None;
        };
        let index = attrs.iter().position(|a| a.local_name() == name)?;
        self.modified = true;
        Some(attrs.remove(index).value)
    }

    /// Whether the `class` attribute contains `class` as a token.
    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.attr(id, "class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        if let NodeData::Text(text) = self.data(id) {
            out.push_str(text);
        }
        for node in self.descendants(id) {
            if let NodeData::Text(text) = self.data(node) {
                out.push_str(text);
            }
        }
        out
    }

    /// Whether the node is a text node containing only whitespace.
    pub fn is_blank_text(&self, id: NodeId) -> bool {
        matches!(self.data(id), NodeData::Text(text) if text.trim().is_empty())
    }

    // =========================================================================
    // Serialization
    // =========================================================================

    /// Serialize a node including its own tags.
    pub fn outer_html(&self, id: NodeId) -> String {
        serialize::to_html(self, id, TraversalScope::IncludeNode)
    }

    /// Serialize the children of a node.
    pub fn inner_html(&self, id: NodeId) -> String {
        let parent = match self.data(id) {
            NodeData::Element { name, .. } => Some(name.clone()),
            _ => None,
        };
        serialize::to_html(self, id, TraversalScope::ChildrenOnly(parent))
    }

    /// Serialize the body content of a tree built with [`Dom::parse_fragment`].
    pub fn fragment_html(&self) -> String {
        match self.body() {
            Some(body) => self.inner_html(body),
            None => self.inner_html(self.document),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fragment_body_children() {
        let dom = Dom::parse_fragment("<p>One</p><p>Two</p>");
        let body = dom.body().unwrap();
        let names: Vec<_> = dom
            .children(body)
            .iter()
            .filter_map(|&c| dom.element_name(c))
            .collect();
        assert_eq!(names, vec!["p", "p"]);
        assert!(!dom.is_modified());
    }

    #[test]
    fn test_insert_before_and_detach() {
        let mut dom = Dom::parse_fragment("<p>a</p><p>b</p>");
        let body = dom.body().unwrap();
        let second = dom.children(body)[1];
        let div = dom.create_element("div", vec![]);
        dom.insert_before(second, div);
        assert_eq!(dom.fragment_html(), "<p>a</p><div></div><p>b</p>");

        dom.detach(second);
        assert_eq!(dom.fragment_html(), "<p>a</p><div></div>");
        assert!(!dom.is_connected(second));
        assert!(dom.is_modified());
    }

    #[test]
    fn test_attributes_keep_order() {
        let mut dom = Dom::parse_fragment(r#"<img src="a.png" alt="A" title="T">"#);
        let img = dom.elements_by_tag(dom.document(), "img")[0];
        assert_eq!(dom.remove_attr(img, "title").as_deref(), Some("T"));
        dom.set_attr(img, "src", "b.png");
        dom.set_attr(img, "id", "x");
        assert_eq!(dom.fragment_html(), r#"<img src="b.png" alt="A" id="x">"#);
    }

    #[test]
    fn test_next_element_sibling_skips_text() {
        let dom = Dom::parse_fragment("<p>a</p>\n<table></table>");
        let p = dom.elements_by_tag(dom.document(), "p")[0];
        let next = dom.next_element_sibling(p).unwrap();
        assert_eq!(dom.element_name(next), Some("table"));
    }

    #[test]
    fn test_import_subtree() {
        let source = Dom::parse_fragment("<em>x</em> y");
        let mut target = Dom::parse_fragment("<p></p>");
        let p = target.elements_by_tag(target.document(), "p")[0];
        let body = source.body().unwrap();
        for &child in source.children(body) {
            let copy = target.import(&source, child);
            target.append(p, copy);
        }
        assert_eq!(target.fragment_html(), "<p><em>x</em> y</p>");
    }

    #[test]
    fn test_has_class_tokens() {
        let dom = Dom::parse_fragment(r#"<img class="wide twemoji">"#);
        let img = dom.elements_by_tag(dom.document(), "img")[0];
        assert!(dom.has_class(img, "twemoji"));
        assert!(!dom.has_class(img, "twe"));
    }
}
