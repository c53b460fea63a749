//! # Renderer
//!
//! Serializes a [`Document`] back to XML text. Two layouts are provided:
//!
//! - **Compact**: every node is written verbatim, the declaration is followed
//!   directly by the document element.
//! - **Pretty**: whitespace-only text is dropped and element-only content is
//!   broken onto lines, indented by one space per level. Elements carrying
//!   real text keep their content on one line so text bodies are never
//!   altered.
//!
//! Attributes are written in the order the tree holds them. Empty elements
//! are written as `<tag/>`.

use quick_xml::escape::{escape, partial_escape};

use crate::tree::{Document, NodeId, NodeKind};

/// Declaration written at the top of every rendered document.
pub const XML_DECLARATION: &str = r#"<?xml version="1.0" ?>"#;

/// Renders the whole document without added whitespace.
pub fn to_compact_string(doc: &Document) -> String {
    let mut out = String::from(XML_DECLARATION);
    for child in doc.children(doc.root()) {
        write_compact(doc, *child, &mut out);
    }
    out
}

/// Renders the whole document with one-space indentation.
pub fn to_pretty_string(doc: &Document) -> String {
    let mut out = String::from(XML_DECLARATION);
    out.push('\n');
    for child in doc.children(doc.root()) {
        write_pretty(doc, *child, 0, &mut out);
    }
    out
}

/// Renders a single node and its subtree, without a declaration.
pub fn node_to_string(doc: &Document, node: NodeId) -> String {
    let mut out = String::new();
    write_compact(doc, node, &mut out);
    out
}

fn write_start(doc: &Document, node: NodeId, out: &mut String) {
    if let Some(element) = doc.element(node) {
        out.push('<');
        out.push_str(&element.name);
        for (key, value) in element.attributes.iter() {
            out.push(' ');
            out.push_str(key);
            out.push_str("=\"");
            out.push_str(&escape(value));
            out.push('"');
        }
    }
}

fn write_compact(doc: &Document, node: NodeId, out: &mut String) {
    match doc.kind(node) {
        NodeKind::Text(text) => out.push_str(&partial_escape(text.as_str())),
        NodeKind::Document => {
            for child in doc.children(node) {
                write_compact(doc, *child, out);
            }
        }
        NodeKind::Element(element) => {
            write_start(doc, node, out);
            let children = doc.children(node);
            if children.is_empty() {
                out.push_str("/>");
                return;
            }
            out.push('>');
            for child in children {
                write_compact(doc, *child, out);
            }
            out.push_str("</");
            out.push_str(&element.name);
            out.push('>');
        }
    }
}

fn write_pretty(doc: &Document, node: NodeId, depth: usize, out: &mut String) {
    let Some(element) = doc.element(node) else {
        return;
    };
    let indent = " ".repeat(depth);
    out.push_str(&indent);
    write_start(doc, node, out);

    let children = doc.children(node);
    let has_text = children
        .iter()
        .any(|child| doc.text(*child).is_some_and(|text| !text.trim().is_empty()));

    if has_text {
        out.push('>');
        for child in children {
            write_compact(doc, *child, out);
        }
    } else {
        let elements = doc.child_elements(node);
        if elements.is_empty() {
            out.push_str("/>\n");
            return;
        }
        out.push_str(">\n");
        for child in elements {
            write_pretty(doc, child, depth + 1, out);
        }
        out.push_str(&indent);
    }
    out.push_str("</");
    out.push_str(&element.name);
    out.push_str(">\n");
}
