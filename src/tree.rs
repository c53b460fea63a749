//! # Element Tree
//!
//! An arena-backed XML tree. Every node lives in one `Vec` owned by the
//! [`Document`] and is addressed by a [`NodeId`]. Nodes keep a list of child
//! ids and an optional parent id, so detaching and re-appending nodes during
//! a merge never involves shared ownership.
//!
//! Index `0` is always the synthetic document node. Its single element child
//! is the document element. Detached nodes stay in the arena but are no longer
//! reachable from the document node.
//!
//! Parsing is done with `quick-xml`'s event reader. Comments, processing
//! instructions and doctype declarations are dropped; character data and
//! entity references are folded into text nodes.

use std::borrow::Cow;

use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{Error, Result};

/// Handle to a node inside a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// Attribute map that keeps insertion order and unique keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    entries: Vec<(String, String)>,
}

impl Attributes {
    /// Value of `key`, if present.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Sets `key`, replacing the value in place when it already exists.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Iterates over `(key, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A tagged element with its attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attributes: Attributes,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Attributes::default(),
        }
    }
}

/// What a node holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Document,
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// An XML document stored as an arena of nodes.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<NodeData>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Creates a document holding only the document node.
    pub fn new() -> Self {
        Self {
            nodes: vec![NodeData {
                kind: NodeKind::Document,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    /// Parses XML text into a document.
    ///
    /// # Errors
    ///
    /// Returns `Error::Parse` when the text is not well-formed, contains no
    /// element, or has more than one top-level element.
    pub fn parse(text: &str) -> Result<Self> {
        let mut reader = Reader::from_str(text);
        let mut doc = Document::new();
        let mut stack = vec![doc.root()];

        loop {
            let event = match reader.read_event() {
                Ok(event) => event,
                Err(err) => {
                    return Err(Error::Parse {
                        message: format!("{} (at byte {})", err, reader.buffer_position()),
                    })
                }
            };

            let parent = match stack.last() {
                Some(parent) => *parent,
                None => return Err(Error::parse("unbalanced end tag")),
            };

            match event {
                Event::Start(start) => {
                    let node = doc.open_element(parent, &start)?;
                    stack.push(node);
                }
                Event::Empty(start) => {
                    doc.open_element(parent, &start)?;
                }
                Event::End(_) => {
                    if stack.len() <= 1 {
                        return Err(Error::parse("unexpected end tag"));
                    }
                    stack.pop();
                }
                Event::Text(text) => {
                    let raw = std::str::from_utf8(&text).map_err(Error::parse)?;
                    let value = unescape(raw).map_err(Error::parse)?;
                    doc.push_text(parent, &value)?;
                }
                Event::CData(data) => {
                    let raw = std::str::from_utf8(&data).map_err(Error::parse)?;
                    doc.push_text(parent, raw)?;
                }
                Event::GeneralRef(reference) => {
                    let name = std::str::from_utf8(&reference).map_err(Error::parse)?;
                    let value = unescape(&format!("&{};", name))
                        .map_err(Error::parse)?
                        .into_owned();
                    doc.push_text(parent, &value)?;
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if stack.len() > 1 {
            return Err(Error::parse("unexpected end of document: unclosed element"));
        }
        if doc.document_element().is_none() {
            return Err(Error::parse("no element found"));
        }
        Ok(doc)
    }

    fn open_element(&mut self, parent: NodeId, start: &BytesStart) -> Result<NodeId> {
        if parent == self.root() && self.document_element().is_some() {
            return Err(Error::parse("junk after document element"));
        }
        let name = std::str::from_utf8(start.name().as_ref())
            .map_err(Error::parse)?
            .to_string();
        let mut element = Element::new(name);
        for attribute in start.attributes() {
            let attribute = attribute.map_err(Error::parse)?;
            let key = std::str::from_utf8(attribute.key.as_ref())
                .map_err(Error::parse)?
                .to_string();
            let raw = std::str::from_utf8(&attribute.value).map_err(Error::parse)?;
            let value = unescape(raw).map_err(Error::parse)?;
            element.attributes.set(key, value.into_owned());
        }
        let node = self.alloc(NodeKind::Element(element));
        self.append(parent, node);
        Ok(node)
    }

    fn push_text(&mut self, parent: NodeId, text: &str) -> Result<()> {
        if parent == self.root() {
            if text.trim().is_empty() {
                return Ok(());
            }
            return Err(Error::parse("text outside the document element"));
        }
        self.append_text(parent, text);
        Ok(())
    }

    fn alloc(&mut self, kind: NodeKind) -> NodeId {
        self.nodes.push(NodeData {
            kind,
            parent: None,
            children: Vec::new(),
        });
        NodeId(self.nodes.len() - 1)
    }

    /// The synthetic document node.
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// The top-level element, if any.
    pub fn document_element(&self) -> Option<NodeId> {
        self.children(self.root())
            .iter()
            .copied()
            .find(|child| self.is_element(*child))
    }

    /// Creates a detached element node.
    pub fn new_element(&mut self, name: impl Into<String>) -> NodeId {
        self.alloc(NodeKind::Element(Element::new(name)))
    }

    /// Creates a detached text node.
    pub fn new_text(&mut self, text: impl Into<String>) -> NodeId {
        self.alloc(NodeKind::Text(text.into()))
    }

    /// Appends a detached node as the last child of `parent`.
    pub fn append(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    /// Appends text to `parent`, extending a trailing text node if there is one.
    pub fn append_text(&mut self, parent: NodeId, text: &str) {
        if let Some(last) = self.nodes[parent.0].children.last().copied() {
            if let NodeKind::Text(existing) = &mut self.nodes[last.0].kind {
                existing.push_str(text);
                return;
            }
        }
        let node = self.new_text(text);
        self.append(parent, node);
    }

    /// Removes `node` from its parent. The node and its subtree stay intact.
    pub fn detach(&mut self, node: NodeId) {
        if let Some(parent) = self.nodes[node.0].parent.take() {
            self.nodes[parent.0].children.retain(|child| *child != node);
        }
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.0].parent
    }

    /// Children of `node` in document order.
    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.nodes[node.0].children
    }

    /// Element children of `node` in document order.
    pub fn child_elements(&self, node: NodeId) -> Vec<NodeId> {
        self.children(node)
            .iter()
            .copied()
            .filter(|child| self.is_element(*child))
            .collect()
    }

    pub fn kind(&self, node: NodeId) -> &NodeKind {
        &self.nodes[node.0].kind
    }

    pub fn element(&self, node: NodeId) -> Option<&Element> {
        match &self.nodes[node.0].kind {
            NodeKind::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn element_mut(&mut self, node: NodeId) -> Option<&mut Element> {
        match &mut self.nodes[node.0].kind {
            NodeKind::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn text(&self, node: NodeId) -> Option<&str> {
        match &self.nodes[node.0].kind {
            NodeKind::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn is_element(&self, node: NodeId) -> bool {
        self.element(node).is_some()
    }

    /// Tag name of an element node.
    pub fn name(&self, node: NodeId) -> Option<&str> {
        self.element(node).map(|element| element.name.as_str())
    }

    pub fn attribute(&self, node: NodeId, key: &str) -> Option<&str> {
        self.element(node)
            .and_then(|element| element.attributes.get(key))
    }

    /// Sets an attribute on an element node. No-op for other nodes.
    pub fn set_attribute(&mut self, node: NodeId, key: &str, value: &str) {
        if let Some(element) = self.element_mut(node) {
            element.attributes.set(key, value);
        }
    }

    /// Concatenation of the direct text children of `node`.
    pub fn direct_text(&self, node: NodeId) -> Cow<'_, str> {
        let mut texts = self
            .children(node)
            .iter()
            .filter_map(|child| self.text(*child));
        match (texts.next(), texts.next()) {
            (None, _) => Cow::Borrowed(""),
            (Some(only), None) => Cow::Borrowed(only),
            (Some(first), Some(second)) => {
                let mut joined = format!("{}{}", first, second);
                texts.for_each(|text| joined.push_str(text));
                Cow::Owned(joined)
            }
        }
    }

    /// `node` and all of its descendants in document order.
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut pending = vec![node];
        while let Some(current) = pending.pop() {
            order.push(current);
            pending.extend(self.children(current).iter().rev());
        }
        order
    }

    /// First element named `tag` at or below `node`, in document order.
    pub fn find_element(&self, node: NodeId, tag: &str) -> Option<NodeId> {
        self.descendants(node)
            .into_iter()
            .find(|candidate| self.name(*candidate) == Some(tag))
    }

    /// Deep-copies `node` from `source` into this arena and returns the
    /// detached copy.
    pub fn import(&mut self, source: &Document, node: NodeId) -> NodeId {
        let copy = self.alloc(source.kind(node).clone());
        for child in source.children(node) {
            let child_copy = self.import(source, *child);
            self.append(copy, child_copy);
        }
        copy
    }

    /// Ancestor path of an element, e.g. `/definition/group:entry/field:data`.
    ///
    /// Each step is the tag name, followed by `:name` when the element carries
    /// a non-empty `name` attribute.
    pub fn path(&self, node: NodeId) -> String {
        let mut steps = Vec::new();
        let mut current = Some(node);
        while let Some(id) = current {
            if let Some(element) = self.element(id) {
                match element.attributes.get("name") {
                    Some(name) if !name.is_empty() => {
                        steps.push(format!("{}:{}", element.name, name))
                    }
                    _ => steps.push(element.name.clone()),
                }
            }
            current = self.parent(id);
        }
        steps.reverse();
        format!("/{}", steps.join("/"))
    }
}
