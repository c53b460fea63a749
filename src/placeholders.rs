//! # Placeholder Resolution
//!
//! Fragment authors leave markers of the form `$<label>.<identifier>` in
//! element text and attribute values:
//!
//! - `$var.<id>` or `$var.<id>#"<default>"`: a caller-supplied variable, with
//!   an optional quoted default (`\"` inside the default is a literal quote).
//! - `$components.<id>`: a component dependency. Only used to discover
//!   dependencies; it is erased when a configuration is built.
//! - `$datasources.<id>`: a stored datasource, inlined as XML.
//!
//! Identifiers are `[A-Za-z0-9_]+`. Every pass scans the raw text once, left
//! to right, and never rescans text it has just inserted.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use log::{debug, warn};
use quick_xml::escape::escape;
use regex::{Captures, Regex};

use crate::defaults::DATASOURCE_TAG;
use crate::error::{Error, Result};
use crate::render::node_to_string;
use crate::store::FragmentStore;
use crate::tree::Document;

/// Marker namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
    Var,
    Components,
    DataSources,
}

impl Label {
    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Var => "var",
            Label::Components => "components",
            Label::DataSources => "datasources",
        }
    }

    /// Regex matching `$<label>.<identifier>`, identifier in group 1.
    pub fn regex(&self) -> Result<Regex> {
        Ok(Regex::new(&format!(r"\${}\.([A-Za-z0-9_]+)", self.as_str()))?)
    }
}

fn variable_regex() -> Result<Regex> {
    Ok(Regex::new(
        r##"\$var\.([A-Za-z0-9_]+)(?:#"((?:\\.|[^"\\])*)")?"##,
    )?)
}

/// Identifiers referenced with `label` in `text`, in order of first
/// occurrence, without duplicates.
pub fn find_identifiers(text: &str, label: Label) -> Result<Vec<String>> {
    let regex = label.regex()?;
    let mut seen = HashSet::new();
    let mut found = Vec::new();
    for captures in regex.captures_iter(text) {
        let id = &captures[1];
        if seen.insert(id.to_string()) {
            found.push(id.to_string());
        }
    }
    Ok(found)
}

/// Replaces `$var.` markers with values from `variables`.
///
/// A missing variable falls back to its quoted default, or to an empty string
/// when there is none. Caller-supplied values are XML-escaped; a default is
/// already source text and is inserted verbatim with only `\"` unescaped.
/// This pass never fails on unknown variables.
pub fn substitute_variables(text: &str, variables: &BTreeMap<String, String>) -> Result<String> {
    let regex = variable_regex()?;
    let replaced = regex.replace_all(text, |captures: &Captures| {
        let id = &captures[1];
        match (variables.get(id), captures.get(2)) {
            (Some(value), _) => escape(value.as_str()).into_owned(),
            (None, Some(default)) => default.as_str().replace("\\\"", "\""),
            (None, None) => {
                warn!("Variable '{}' is not set and has no default", id);
                String::new()
            }
        }
    });
    Ok(replaced.into_owned())
}

/// Erases `$components.` markers.
///
/// # Errors
///
/// Returns `Error::NonregisteredRecord` for the first marker naming a
/// component outside `available`.
pub fn erase_components(text: &str, available: &BTreeSet<String>) -> Result<String> {
    let regex = Label::Components.regex()?;
    if let Some(missing) = regex
        .captures_iter(text)
        .map(|captures| captures[1].to_string())
        .find(|id| !available.contains(id))
    {
        return Err(Error::missing_component(&missing));
    }
    Ok(regex.replace_all(text, "").into_owned())
}

/// Extracts the first `<datasource>` element of a stored datasource fragment
/// and renders it compactly.
pub fn extract_datasource(xml: &str) -> Result<Option<String>> {
    if xml.trim().is_empty() {
        return Ok(None);
    }
    let doc = Document::parse(xml)?;
    Ok(doc
        .find_element(doc.root(), DATASOURCE_TAG)
        .map(|node| node_to_string(&doc, node)))
}

/// Replaces every `$datasources.<id>` marker with a newline followed by the
/// stored datasource element.
///
/// `$var.` markers in the stored XML are resolved against `variables` before
/// the element is parsed, while their quoted defaults are still raw text.
///
/// # Errors
///
/// Returns `Error::NonregisteredRecord` when `<id>` is not listed by the
/// store, or when its stored XML holds no `<datasource>` element.
pub fn substitute_datasources<S: FragmentStore + ?Sized>(
    text: &str,
    store: &S,
    variables: &BTreeMap<String, String>,
) -> Result<String> {
    let regex = Label::DataSources.regex()?;
    let available = store.list_datasources()?;
    let mut out = String::with_capacity(text.len());
    let mut last = 0;

    for captures in regex.captures_iter(text) {
        let (Some(marker), Some(id)) = (captures.get(0), captures.get(1)) else {
            continue;
        };
        let id = id.as_str();
        if !available.contains(id) {
            return Err(Error::missing_datasource(id));
        }
        let xml = substitute_variables(&store.fetch_datasource(id)?, variables)?;
        let element = extract_datasource(&xml)?.ok_or_else(|| Error::missing_datasource(id))?;
        debug!("Inlining datasource '{}'", id);

        out.push_str(&text[last..marker.start()]);
        out.push('\n');
        out.push_str(&element);
        last = marker.end();
    }
    out.push_str(&text[last..]);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn vars(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_find_identifiers_in_order_without_duplicates() {
        let text = "$components.b $var.x $components.a $components.b";
        assert_eq!(
            find_identifiers(text, Label::Components).unwrap(),
            vec!["b".to_string(), "a".to_string()]
        );
        assert_eq!(find_identifiers(text, Label::Var).unwrap(), vec!["x".to_string()]);
        assert!(find_identifiers(text, Label::DataSources).unwrap().is_empty());
    }

    #[test]
    fn test_substitute_variables_uses_values() {
        let text = r#"<field name="$var.name">$var.value</field>"#;
        let result = substitute_variables(text, &vars(&[("name", "data"), ("value", "1")])).unwrap();
        assert_eq!(result, r#"<field name="data">1</field>"#);
    }

    #[test]
    fn test_substitute_variables_default() {
        let result = substitute_variables(r#"<a>$var.x#"fallback"</a>"#, &vars(&[])).unwrap();
        assert_eq!(result, "<a>fallback</a>");
    }

    #[test]
    fn test_substitute_variables_value_wins_over_default() {
        let result = substitute_variables(r#"<a>$var.x#"fallback"</a>"#, &vars(&[("x", "set")])).unwrap();
        assert_eq!(result, "<a>set</a>");
    }

    #[test]
    fn test_substitute_variables_escaped_quote_in_default() {
        let result = substitute_variables(r#"<a>$var.x#"say \"hi\""</a>"#, &vars(&[])).unwrap();
        assert_eq!(result, r#"<a>say "hi"</a>"#);
        let doc = Document::parse(&result).unwrap();
        assert_eq!(doc.direct_text(doc.document_element().unwrap()), "say \"hi\"");
    }

    #[test]
    fn test_substitute_variables_default_keeps_entities() {
        let result = substitute_variables(r#"<a>$var.x#"a &amp; b"</a>"#, &vars(&[])).unwrap();
        assert_eq!(result, "<a>a &amp; b</a>");
        let doc = Document::parse(&result).unwrap();
        assert_eq!(doc.direct_text(doc.document_element().unwrap()), "a & b");
    }

    #[test]
    fn test_substitute_variables_missing_becomes_empty() {
        let result = substitute_variables("<a>[$var.nothing]</a>", &vars(&[])).unwrap();
        assert_eq!(result, "<a>[]</a>");
    }

    #[test]
    fn test_substitute_variables_escapes_values() {
        let result = substitute_variables("<a>$var.x</a>", &vars(&[("x", "1 < 2 & 3")])).unwrap();
        assert_eq!(result, "<a>1 &lt; 2 &amp; 3</a>");
    }

    #[test]
    fn test_erase_components() {
        let available: BTreeSet<String> = ["slit".to_string()].into_iter().collect();
        assert_eq!(
            erase_components("<definition>$components.slit</definition>", &available).unwrap(),
            "<definition></definition>"
        );
        let err = erase_components("$components.other", &available).unwrap_err();
        assert!(matches!(err, Error::NonregisteredRecord { .. }));
    }

    #[test]
    fn test_substitute_datasources_inlines_element() {
        let mut store = MemoryStore::new();
        store.store_datasource(
            "ds1",
            r#"<?xml version="1.0"?><definition><datasource name="ds1" type="CLIENT"><record name="r1"/></datasource></definition>"#,
        );
        let text = "<field>$datasources.ds1<strategy/></field>";
        let result = substitute_datasources(text, &store, &vars(&[])).unwrap();
        assert_eq!(
            result,
            "<field>\n<datasource name=\"ds1\" type=\"CLIENT\"><record name=\"r1\"/></datasource><strategy/></field>"
        );
        assert!(!result.contains("$datasources.ds1"));
    }

    #[test]
    fn test_substitute_datasources_resolves_attribute_variables() {
        let mut store = MemoryStore::new();
        store.store_datasource(
            "ds",
            r#"<datasource name='ds' type='CLIENT'><record name='$var.rec#"r1"'/><doc>$var.note</doc></datasource>"#,
        );
        let text = "<field>$datasources.ds</field>";

        let result = substitute_datasources(text, &store, &vars(&[])).unwrap();
        assert!(result.contains(r#"<record name="r1"/>"#));

        let variables = vars(&[("rec", "a\"b"), ("note", "x")]);
        let result = substitute_datasources(text, &store, &variables).unwrap();
        assert!(result.contains(r#"<record name="a&quot;b"/>"#));
        assert!(result.contains("<doc>x</doc>"));
    }

    #[test]
    fn test_substitute_datasources_unregistered() {
        let store = MemoryStore::new();
        let err = substitute_datasources("$datasources.missing", &store, &vars(&[])).unwrap_err();
        match err {
            Error::NonregisteredRecord { name, .. } => assert_eq!(name, "missing"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_substitute_datasources_without_element() {
        let mut store = MemoryStore::new();
        store.store_datasource("empty", "");
        store.store_datasource("other", "<definition><record/></definition>");
        assert!(substitute_datasources("$datasources.empty", &store, &vars(&[])).is_err());
        assert!(substitute_datasources("$datasources.other", &store, &vars(&[])).is_err());
    }

    #[test]
    fn test_substitute_datasources_leaves_plain_text() {
        let store = MemoryStore::new();
        assert_eq!(
            substitute_datasources("<a>no refs</a>", &store, &vars(&[])).unwrap(),
            "<a>no refs</a>"
        );
    }

    #[test]
    fn test_missing_variable_logs_warning() {
        testing_logger::setup();
        assert_eq!(substitute_variables("<a>$var.nope</a>", &vars(&[])).unwrap(), "<a></a>");
        testing_logger::validate(|logs| {
            assert!(logs
                .iter()
                .any(|entry| entry.level == log::Level::Warn && entry.body.contains("'nope'")));
        });
    }
}
