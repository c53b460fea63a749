//! # Discovery
//!
//! Read-only scans used for introspection:
//!
//! - **Component dependencies**: the transitive closure of
//!   `$components.<name>` references, starting from a list of names.
//! - **Datasource references**: every `<datasource>` element of a document
//!   plus every `$datasources.<name>` reference in `field`/`attribute` text.
//! - **Variables**: every `$var.<name>` marker.
//!
//! None of these scans mutate anything.

use std::collections::{BTreeSet, HashSet};

use log::debug;

use crate::defaults::DATASOURCE_TAG;
use crate::error::{Error, Result};
use crate::placeholders::{find_identifiers, Label};
use crate::store::FragmentStore;
use crate::tree::Document;

/// Type recorded for datasources referenced as `$datasources.<name>`.
pub const FROM_DB_TYPE: &str = "__FROM_DB__";

/// Prefix of the names given to unnamed `<datasource>` elements.
pub const UNNAMED_PREFIX: &str = "__unnamed__";

/// Tags whose text may reference stored datasources.
const REFERENCING_TAGS: &[&str] = &["field", "attribute"];

/// A datasource used by a component or a merged document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSourceRef {
    pub name: String,
    /// The `type` attribute, or [`FROM_DB_TYPE`] for text references.
    pub kind: String,
}

impl DataSourceRef {
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
        }
    }

    /// Whether this is a reference to a stored datasource.
    pub fn is_from_db(&self) -> bool {
        self.kind == FROM_DB_TYPE
    }
}

/// Transitive closure of `names` over `$components.` references.
///
/// The result starts with `names` (deduplicated, in order) followed by the
/// discovered dependencies in depth-first order. A name already visited is
/// not descended into again, so cycles terminate.
///
/// # Errors
///
/// Returns `Error::NonregisteredRecord` for the first name, requested or
/// discovered, that the store does not list.
pub fn component_dependencies<S, N>(names: &[N], store: &S) -> Result<Vec<String>>
where
    S: FragmentStore + ?Sized,
    N: AsRef<str>,
{
    let available = store.list_components()?;
    let mut visited = HashSet::new();
    let mut order = Vec::new();

    for name in names {
        let name = name.as_ref();
        if !available.contains(name) {
            return Err(Error::missing_component(name));
        }
        if visited.insert(name.to_string()) {
            order.push(name.to_string());
        }
    }

    let roots = order.clone();
    for name in &roots {
        descend(name, store, &available, &mut visited, &mut order)?;
    }
    debug!("Resolved {} components from {} requested", order.len(), names.len());
    Ok(order)
}

fn descend<S: FragmentStore + ?Sized>(
    name: &str,
    store: &S,
    available: &BTreeSet<String>,
    visited: &mut HashSet<String>,
    order: &mut Vec<String>,
) -> Result<()> {
    let xml = store.fetch_component(name)?;
    for dependency in find_identifiers(&xml, Label::Components)? {
        if !available.contains(&dependency) {
            return Err(Error::missing_component(&dependency));
        }
        if visited.insert(dependency.clone()) {
            order.push(dependency.clone());
            descend(&dependency, store, available, visited, order)?;
        }
    }
    Ok(())
}

/// Datasources used by `xml`, in document order of first encounter.
///
/// `<datasource>` elements contribute their `name` and `type` attributes;
/// unnamed ones are called `__unnamed__<n>` with a counter starting at 0 for
/// each call. `$datasources.<name>` references in the direct text of
/// `field` and `attribute` elements contribute `(name, "__FROM_DB__")`.
/// Each name is reported once.
pub fn datasource_references(xml: &str) -> Result<Vec<DataSourceRef>> {
    let doc = Document::parse(xml)?;
    let mut seen = HashSet::new();
    let mut found = Vec::new();
    let mut unnamed = 0usize;

    for node in doc.descendants(doc.root()) {
        let Some(tag) = doc.name(node) else {
            continue;
        };
        if tag == DATASOURCE_TAG {
            let name = match doc.attribute(node, "name") {
                Some(name) if !name.is_empty() => name.to_string(),
                _ => {
                    let name = format!("{}{}", UNNAMED_PREFIX, unnamed);
                    unnamed += 1;
                    name
                }
            };
            let kind = doc.attribute(node, "type").unwrap_or_default();
            if seen.insert(name.clone()) {
                found.push(DataSourceRef::new(name, kind));
            }
        } else if REFERENCING_TAGS.contains(&tag) {
            for name in find_identifiers(&doc.direct_text(node), Label::DataSources)? {
                if seen.insert(name.clone()) {
                    found.push(DataSourceRef::new(name, FROM_DB_TYPE));
                }
            }
        }
    }
    Ok(found)
}

/// Variables referenced in `text`, in order of first occurrence.
pub fn variables(text: &str) -> Result<Vec<String>> {
    find_identifiers(text, Label::Var)
}
