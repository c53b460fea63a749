//! # Component Merger
//!
//! This module unifies structurally equivalent sibling elements of a
//! collected component tree. The walk is depth-first; at every level the
//! merger repeatedly looks for a mergeable pair of element siblings, folds
//! the later sibling into the earlier one, and rescans until no pair is left.
//! Because a rescan happens after every fold, the result does not depend on
//! which pair was folded first.
//!
//! ## Mergeability
//!
//! Two siblings are mergeable when they share a tag name and
//!
//! - their `name` attributes are equal, or at least one is missing/empty;
//! - no attribute present on both sides holds different values;
//! - for unique-text tags, their trimmed direct texts agree (or one is empty).
//!
//! Some mismatches are contradictions rather than "not mergeable" and raise
//! `Error::IncompatibleNode`: differently named singles, attribute conflicts
//! on singles or on equally named elements, and unique-text mismatches.
//!
//! ## Example
//!
//! ```
//! use nxsconfig::merge::Merger;
//!
//! let mut merger = Merger::default();
//! merger
//!     .collect(&["<definition/>", "<definition><group type='NXentry'/></definition>"])
//!     .unwrap();
//! merger.merge().unwrap();
//! assert_eq!(
//!     merger.to_xml().unwrap(),
//!     r#"<?xml version="1.0" ?><definition><group type="NXentry"/></definition>"#
//! );
//! ```

pub mod rules;
pub mod switch;

use std::collections::BTreeSet;

use log::{debug, trace};

use crate::collect::collect;
use crate::error::{Error, Result};
use crate::render::{to_compact_string, to_pretty_string};
use crate::tree::{Document, NodeId};

pub use rules::MergeRules;

/// Collects component fragments and merges them into one tree.
///
/// A `Merger` owns its tree; use one instance per request.
#[derive(Debug, Clone, Default)]
pub struct Merger {
    rules: MergeRules,
    switch_datasources: BTreeSet<String>,
    document: Option<Document>,
}

impl Merger {
    pub fn new(rules: MergeRules) -> Self {
        Self {
            rules,
            switch_datasources: BTreeSet::new(),
            document: None,
        }
    }

    /// Sets the datasources whose `INIT`/`FINAL` strategies are switched to
    /// `STEP` during the merge.
    pub fn with_switch_datasources<I, S>(mut self, datasources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.switch_datasources = datasources.into_iter().map(Into::into).collect();
        self
    }

    pub fn rules(&self) -> &MergeRules {
        &self.rules
    }

    /// Parses and gathers `fragments`; see [`collect`].
    pub fn collect<S: AsRef<str>>(&mut self, fragments: &[S]) -> Result<()> {
        // A failed collect must not leave the previous tree behind.
        self.document = None;
        self.document = collect(fragments)?;
        Ok(())
    }

    /// Merges the collected tree in place.
    ///
    /// On error the collected tree is discarded, so no partial result can be
    /// rendered afterwards.
    pub fn merge(&mut self) -> Result<()> {
        let Some(doc) = self.document.as_mut() else {
            return Ok(());
        };
        let walker = Walker {
            rules: &self.rules,
            switch_datasources: &self.switch_datasources,
        };
        let root = doc.root();
        if let Err(err) = walker.merge_children(doc, root) {
            debug!("Merge abandoned: {}", err);
            self.document = None;
            return Err(err);
        }
        Ok(())
    }

    /// The collected (and possibly merged) tree.
    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    /// Compact rendering of the tree, or `None` when nothing was collected.
    pub fn to_xml(&self) -> Option<String> {
        self.document.as_ref().map(to_compact_string)
    }

    /// Pretty rendering of the tree, or `None` when nothing was collected.
    pub fn to_pretty_xml(&self) -> Option<String> {
        self.document.as_ref().map(to_pretty_string)
    }
}

struct Walker<'a> {
    rules: &'a MergeRules,
    switch_datasources: &'a BTreeSet<String>,
}

fn quoted_text(text: &str) -> String {
    format!("\"{}\"", text)
}

impl Walker<'_> {
    fn merge_children(&self, doc: &mut Document, node: NodeId) -> Result<()> {
        while let Some((keep, other)) = self.find_mergeable_pair(doc, node)? {
            trace!("Merging {} into {}", doc.path(other), doc.path(keep));
            merge_nodes(doc, keep, other);
        }

        let parent_tag = doc.name(node).map(str::to_string);
        for child in doc.child_elements(node) {
            let tag = doc.name(child).unwrap_or_default().to_string();
            if let Some(parent_tag) = &parent_tag {
                if let Some(allowed) = self.rules.allowed_children(parent_tag) {
                    if !allowed.contains(&tag) {
                        let path = doc.path(child);
                        return Err(Error::IncompatibleNode {
                            message: format!("not allowed <{}> in {}", tag, path),
                            nodes: vec![path],
                        });
                    }
                }
            }
            self.merge_children(doc, child)?;
            if self.rules.is_switchable(&tag) {
                switch::switch_step_mode(doc, child, self.rules, self.switch_datasources)?;
            }
        }
        Ok(())
    }

    fn find_mergeable_pair(&self, doc: &Document, node: NodeId) -> Result<Option<(NodeId, NodeId)>> {
        let elements = doc.child_elements(node);
        for (i, first) in elements.iter().enumerate() {
            for second in &elements[i + 1..] {
                if self.are_mergeable(doc, *first, *second)? {
                    return Ok(Some((*first, *second)));
                }
            }
        }
        Ok(None)
    }

    /// Decides whether `second` folds into `first`.
    ///
    /// Unique text is only compared for pairs whose attributes agree; an
    /// unnamed non-single pair with differing attributes is simply kept apart.
    fn are_mergeable(&self, doc: &Document, first: NodeId, second: NodeId) -> Result<bool> {
        let (Some(elem1), Some(elem2)) = (doc.element(first), doc.element(second)) else {
            return Ok(false);
        };
        if elem1.name != elem2.name {
            return Ok(false);
        }
        let tag = elem1.name.as_str();
        let single = self.rules.is_single(tag);

        let name1 = elem1.attributes.get("name").unwrap_or_default();
        let name2 = elem2.attributes.get("name").unwrap_or_default();
        if !name1.is_empty() && !name2.is_empty() && name1 != name2 {
            if single {
                let (path1, path2) = (doc.path(first), doc.path(second));
                return Err(Error::IncompatibleNode {
                    message: format!("differently named <{}> elements: {} <> {}", tag, path1, path2),
                    nodes: vec![path1, path2],
                });
            }
            return Ok(false);
        }

        let conflicts: Vec<(&str, &str, &str)> = elem1
            .attributes
            .iter()
            .filter_map(|(key, value1)| {
                elem2
                    .attributes
                    .get(key)
                    .filter(|value2| *value2 != value1)
                    .map(|value2| (key, value1, value2))
            })
            .collect();

        if !conflicts.is_empty() {
            if single || (!name1.is_empty() && name1 == name2) {
                let path = doc.path(first);
                let details: Vec<String> = conflicts
                    .iter()
                    .map(|(key, value1, value2)| {
                        format!("{}/{} = {} <> {}", path, key, quoted_text(value1), quoted_text(value2))
                    })
                    .collect();
                return Err(Error::IncompatibleNode {
                    message: format!("incompatible element attributes: {}", details.join("; ")),
                    nodes: vec![path, doc.path(second)],
                });
            }
            return Ok(false);
        }

        if self.rules.has_unique_text(tag) {
            let text1 = doc.direct_text(first);
            let text2 = doc.direct_text(second);
            let (text1, text2) = (text1.trim(), text2.trim());
            if !text1.is_empty() && !text2.is_empty() && text1 != text2 {
                let path = doc.path(first);
                return Err(Error::IncompatibleNode {
                    message: format!(
                        "incompatible <{}> element value at {}: {} <> {}",
                        tag,
                        path,
                        quoted_text(text1),
                        quoted_text(text2)
                    ),
                    nodes: vec![path, doc.path(second)],
                });
            }
        }

        Ok(true)
    }
}

/// Folds `other` into `keep` and detaches `other`.
///
/// `other`'s attributes are copied onto `keep`; its element children are
/// moved over, and its text children are moved only when their trimmed
/// content is not already among `keep`'s texts.
fn merge_nodes(doc: &mut Document, keep: NodeId, other: NodeId) {
    let attributes: Vec<(String, String)> = doc
        .element(other)
        .map(|element| {
            element
                .attributes
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect()
        })
        .unwrap_or_default();
    for (key, value) in &attributes {
        doc.set_attribute(keep, key, value);
    }

    let mut texts: Vec<String> = doc
        .children(keep)
        .iter()
        .filter_map(|child| doc.text(*child))
        .map(|text| text.trim().to_string())
        .collect();

    for child in doc.children(other).to_vec() {
        if let Some(text) = doc.text(child) {
            let trimmed = text.trim().to_string();
            if texts.contains(&trimmed) {
                continue;
            }
            texts.push(trimmed);
        }
        doc.append(keep, child);
    }
    doc.detach(other);
}
