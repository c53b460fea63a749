//! # Collector
//!
//! Parses raw component fragments and gathers them under one `<definition>`
//! element. The first non-empty fragment becomes the accumulating document;
//! the children of every later fragment's `<definition>` are deep-copied and
//! appended, in fragment order, to the first fragment's `<definition>`.
//! Whitespace-only text between those children is not copied.

use log::debug;

use crate::defaults::DEFINITION_TAG;
use crate::error::{Error, Result};
use crate::tree::{Document, NodeId};

fn undefined() -> Error {
    Error::UndefinedTag {
        tag: DEFINITION_TAG.to_string(),
    }
}

/// Collects fragments into one document.
///
/// Empty (or whitespace-only) fragments are skipped. Returns `Ok(None)` when
/// nothing is left to collect.
///
/// # Errors
///
/// - `Error::Parse` if a fragment is not well-formed XML.
/// - `Error::UndefinedTag` if a fragment has no `<definition>` element.
pub fn collect<S: AsRef<str>>(fragments: &[S]) -> Result<Option<Document>> {
    let mut collected: Option<(Document, NodeId)> = None;

    for (index, fragment) in fragments.iter().enumerate() {
        let text = fragment.as_ref();
        if text.trim().is_empty() {
            continue;
        }
        let parsed = Document::parse(text)?;
        let definition = parsed
            .find_element(parsed.root(), DEFINITION_TAG)
            .ok_or_else(undefined)?;

        match collected.as_mut() {
            None => {
                debug!("Collecting fragment {} as the root definition", index);
                collected = Some((parsed, definition));
            }
            Some((doc, target)) => {
                let mut imported = 0;
                for child in parsed.children(definition) {
                    let blank = parsed
                        .text(*child)
                        .is_some_and(|text| text.trim().is_empty());
                    if blank {
                        continue;
                    }
                    let copy = doc.import(&parsed, *child);
                    doc.append(*target, copy);
                    imported += 1;
                }
                debug!("Imported {} nodes from fragment {}", imported, index);
            }
        }
    }

    Ok(collected.map(|(doc, _)| doc))
}
