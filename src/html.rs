//! Lenient HTML parsing for EPUB 3 navigation documents.
//!
//! Nav documents in the wild are often not well-formed XML, so they go
//! through html5ever, which recovers from them the way a browser does. A
//! small `TreeSink` collects the tree, which is then handed out as an owned
//! [`Element`].

use std::borrow::Cow;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

use html5ever::tendril::{StrTendril, TendrilSink};
use html5ever::tree_builder::{ElementFlags, NodeOrText, QuirksMode, TreeSink};
use html5ever::{Attribute as Html5Attribute, ParseOpts, QualName, parse_document};

/// A node in the tree: an element or a run of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

/// An element with its local name, attributes and children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Node>,
}

impl Element {
    /// Lowercase local name, e.g. `nav`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this element's local name is `local`.
    pub fn is(&self, local: &str) -> bool {
        self.name == local
    }

    /// Attribute by name as written, e.g. `href` or `epub:type`.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// All attributes as `(name, value)` pairs, in document order.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Direct child elements.
    pub fn children(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
    }

    /// Direct child elements with the given local name.
    pub fn children_named<'a>(&'a self, local: &'a str) -> impl Iterator<Item = &'a Element> {
        self.children().filter(move |e| e.is(local))
    }

    /// All descendant elements in document order, not including `self`.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants {
            stack: vec![self.children.iter()],
        }
    }

    /// First descendant element with the given local name.
    pub fn find(&self, local: &str) -> Option<&Element> {
        self.descendants().find(|e| e.is(local))
    }

    /// Concatenated text of this element and everything below it.
    pub fn text(&self) -> String {
        let mut out = String::new();
        collect_text(&self.children, &mut out);
        out
    }
}

fn collect_text(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(t) => out.push_str(t),
            Node::Element(e) => collect_text(&e.children, out),
        }
    }
}

/// Pre-order iterator over descendant elements.
pub struct Descendants<'a> {
    stack: Vec<std::slice::Iter<'a, Node>>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Element;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(iter) = self.stack.last_mut() {
            match iter.next() {
                Some(Node::Element(e)) => {
                    self.stack.push(e.children.iter());
                    return Some(e);
                }
                Some(Node::Text(_)) => {}
                None => {
                    self.stack.pop();
                }
            }
        }
        None
    }
}

/// Parse an HTML or XHTML document and return its `html` element.
///
/// Never fails: html5ever recovers from any input, and always produces an
/// `html` root with `head` and `body`.
pub fn parse(text: &str) -> Element {
    parse_document(HtmlSink::default(), ParseOpts::default())
        .from_utf8()
        .one(text.as_bytes())
        .into_root()
}

// ----------------------------------------------------------------------------
// TreeSink
// ----------------------------------------------------------------------------

type NodeRef = Rc<SinkNode>;

enum SinkData {
    Document,
    Element {
        name: QualName,
        attrs: RefCell<Vec<Html5Attribute>>,
    },
    Text(RefCell<String>),
    /// Comments and processing instructions: kept for tree positions only.
    Other,
}

struct SinkNode {
    data: SinkData,
    parent: RefCell<Option<Weak<SinkNode>>>,
    children: RefCell<Vec<NodeRef>>,
}

impl SinkNode {
    fn new(data: SinkData) -> NodeRef {
        Rc::new(Self {
            data,
            parent: RefCell::new(None),
            children: RefCell::new(Vec::new()),
        })
    }

    fn parent(&self) -> Option<NodeRef> {
        self.parent.borrow().as_ref().and_then(Weak::upgrade)
    }
}

/// html5ever TreeSink that builds a reference-counted tree.
///
/// The trait hands out `&self`, so nodes use interior mutability. Element
/// names never change after creation and live outside any `RefCell`, which
/// lets `elem_name` return a plain reference.
struct HtmlSink {
    document: NodeRef,
}

impl Default for HtmlSink {
    fn default() -> Self {
        Self {
            document: SinkNode::new(SinkData::Document),
        }
    }
}

impl HtmlSink {
    /// Consume the sink and convert its root element.
    fn into_root(self) -> Element {
        let root = self
            .document
            .children
            .borrow()
            .iter()
            .find_map(|node| convert(node));
        match root {
            Some(Node::Element(element)) => element,
            _ => Element {
                name: "html".to_string(),
                attributes: Vec::new(),
                children: Vec::new(),
            },
        }
    }
}

fn convert(node: &SinkNode) -> Option<Node> {
    match &node.data {
        SinkData::Element { name, attrs } => Some(Node::Element(Element {
            name: name.local.to_string(),
            attributes: attrs
                .borrow()
                .iter()
                .map(|a| (attribute_name(&a.name), a.value.to_string()))
                .collect(),
            children: node
                .children
                .borrow()
                .iter()
                .filter_map(|child| convert(child))
                .collect(),
        })),
        SinkData::Text(text) => Some(Node::Text(text.borrow().clone())),
        SinkData::Document | SinkData::Other => None,
    }
}

/// `xlink:href` in foreign content keeps its prefix; `epub:type` in HTML
/// content is already a plain name.
fn attribute_name(name: &QualName) -> String {
    match &name.prefix {
        Some(prefix) => format!("{}:{}", prefix, name.local),
        None => name.local.to_string(),
    }
}

fn detach(node: &NodeRef) {
    let parent = node.parent.borrow_mut().take().and_then(|weak| weak.upgrade());
    if let Some(parent) = parent {
        parent
            .children
            .borrow_mut()
            .retain(|child| !Rc::ptr_eq(child, node));
    }
}

fn index_of(parent: &NodeRef, child: &NodeRef) -> Option<usize> {
    parent
        .children
        .borrow()
        .iter()
        .position(|c| Rc::ptr_eq(c, child))
}

/// Append text to the node at `index` if it is a text run.
fn merge_text(parent: &NodeRef, index: usize, text: &str) -> bool {
    let children = parent.children.borrow();
    match children.get(index).map(|node| &node.data) {
        Some(SinkData::Text(existing)) => {
            existing.borrow_mut().push_str(text);
            true
        }
        _ => false,
    }
}

fn insert(parent: &NodeRef, index: usize, child: NodeRef) {
    *child.parent.borrow_mut() = Some(Rc::downgrade(parent));
    parent.children.borrow_mut().insert(index, child);
}

impl TreeSink for HtmlSink {
    type Handle = NodeRef;
    type Output = Self;
    type ElemName<'a>
        = &'a QualName
    where
        Self: 'a;

    fn finish(self) -> Self::Output {
        self
    }

    fn parse_error(&self, msg: Cow<'static, str>) {
        tracing::trace!(%msg, "recovered from HTML parse error");
    }

    fn get_document(&self) -> Self::Handle {
        self.document.clone()
    }

    fn elem_name<'a>(&'a self, target: &'a Self::Handle) -> Self::ElemName<'a> {
        static EMPTY: QualName = QualName {
            prefix: None,
            ns: html5ever::ns!(),
            local: html5ever::local_name!(""),
        };

        match &target.data {
            SinkData::Element { name, .. } => name,
            _ => &EMPTY,
        }
    }

    fn create_element(
        &self,
        name: QualName,
        attrs: Vec<Html5Attribute>,
        _flags: ElementFlags,
    ) -> Self::Handle {
        SinkNode::new(SinkData::Element {
            name,
            attrs: RefCell::new(attrs),
        })
    }

    fn create_comment(&self, _text: StrTendril) -> Self::Handle {
        SinkNode::new(SinkData::Other)
    }

    fn create_pi(&self, _target: StrTendril, _data: StrTendril) -> Self::Handle {
        SinkNode::new(SinkData::Other)
    }

    fn append(&self, parent: &Self::Handle, child: NodeOrText<Self::Handle>) {
        let node = match child {
            NodeOrText::AppendNode(node) => {
                detach(&node);
                node
            }
            NodeOrText::AppendText(text) => {
                let len = parent.children.borrow().len();
                if len > 0 && merge_text(parent, len - 1, &text) {
                    return;
                }
                SinkNode::new(SinkData::Text(RefCell::new(text.to_string())))
            }
        };
        let len = parent.children.borrow().len();
        insert(parent, len, node);
    }

    fn append_based_on_parent_node(
        &self,
        element: &Self::Handle,
        prev_element: &Self::Handle,
        child: NodeOrText<Self::Handle>,
    ) {
        if element.parent().is_some() {
            self.append_before_sibling(element, child);
        } else {
            self.append(prev_element, child);
        }
    }

    fn append_doctype_to_document(
        &self,
        _name: StrTendril,
        _public_id: StrTendril,
        _system_id: StrTendril,
    ) {
    }

    fn get_template_contents(&self, target: &Self::Handle) -> Self::Handle {
        target.clone()
    }

    fn same_node(&self, x: &Self::Handle, y: &Self::Handle) -> bool {
        Rc::ptr_eq(x, y)
    }

    fn set_quirks_mode(&self, _mode: QuirksMode) {}

    fn append_before_sibling(&self, sibling: &Self::Handle, new_node: NodeOrText<Self::Handle>) {
        let Some(parent) = sibling.parent() else {
            return;
        };
        let child = match new_node {
            NodeOrText::AppendNode(node) => {
                detach(&node);
                node
            }
            NodeOrText::AppendText(text) => {
                let index = index_of(&parent, sibling).unwrap_or(0);
                if index > 0 && merge_text(&parent, index - 1, &text) {
                    return;
                }
                SinkNode::new(SinkData::Text(RefCell::new(text.to_string())))
            }
        };
        if let Some(index) = index_of(&parent, sibling) {
            insert(&parent, index, child);
        }
    }

    fn add_attrs_if_missing(&self, target: &Self::Handle, attrs: Vec<Html5Attribute>) {
        if let SinkData::Element {
            attrs: existing, ..
        } = &target.data
        {
            let mut existing = existing.borrow_mut();
            for attr in attrs {
                if !existing.iter().any(|a| a.name == attr.name) {
                    existing.push(attr);
                }
            }
        }
    }

    fn remove_from_parent(&self, target: &Self::Handle) {
        detach(target);
    }

    fn reparent_children(&self, node: &Self::Handle, new_parent: &Self::Handle) {
        let children = std::mem::take(&mut *node.children.borrow_mut());
        for child in &children {
            *child.parent.borrow_mut() = Some(Rc::downgrade(new_parent));
        }
        new_parent.children.borrow_mut().extend(children);
    }
}
