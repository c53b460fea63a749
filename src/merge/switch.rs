//! Step-mode switch
//!
//! After a `field` or `attribute` element has been merged, its `strategy`
//! child may be flipped to `STEP` mode when the element reads from one of a
//! caller-supplied set of datasources. The datasource is found either as a
//! direct `<datasource name="...">` child or as a `$datasources.<name>`
//! reference in the element's own text. Deeper nesting is not inspected.

use std::collections::BTreeSet;

use log::debug;

use super::rules::MergeRules;
use crate::defaults::{DATASOURCE_TAG, STEP_MODE, STRATEGY_TAG};
use crate::error::Result;
use crate::placeholders::{find_identifiers, Label};
use crate::tree::{Document, NodeId};

/// Name of the datasource `node` reads from, if any.
fn datasource_name(doc: &Document, node: NodeId) -> Result<Option<String>> {
    let named_child = doc
        .child_elements(node)
        .into_iter()
        .filter(|child| doc.name(*child) == Some(DATASOURCE_TAG))
        .filter_map(|child| doc.attribute(child, "name"))
        .find(|name| !name.is_empty())
        .map(str::to_string);
    if named_child.is_some() {
        return Ok(named_child);
    }
    Ok(find_identifiers(&doc.direct_text(node), Label::DataSources)?
        .into_iter()
        .next())
}

/// Switches the strategy mode of `node` to `STEP` when it reads from one of
/// `datasources`. Returns whether the mode changed.
pub fn switch_step_mode(
    doc: &mut Document,
    node: NodeId,
    rules: &MergeRules,
    datasources: &BTreeSet<String>,
) -> Result<bool> {
    if datasources.is_empty() {
        return Ok(false);
    }
    let Some(name) = datasource_name(doc, node)? else {
        return Ok(false);
    };
    if !datasources.contains(&name) {
        return Ok(false);
    }
    let Some(strategy) = doc
        .child_elements(node)
        .into_iter()
        .rev()
        .find(|child| doc.name(*child) == Some(STRATEGY_TAG))
    else {
        return Ok(false);
    };
    let switch = doc
        .attribute(strategy, "mode")
        .is_some_and(|mode| rules.switches_mode(mode));
    if switch {
        debug!("Switching {} to {} mode", doc.path(node), STEP_MODE);
        doc.set_attribute(strategy, "mode", STEP_MODE);
    }
    Ok(switch)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn switch_first_field(xml: &str, names: &[&str]) -> (bool, Option<String>) {
        let mut doc = Document::parse(xml).unwrap();
        let field = doc.find_element(doc.root(), "field").unwrap();
        let set: BTreeSet<String> = names.iter().map(|n| n.to_string()).collect();
        let switched = switch_step_mode(&mut doc, field, &MergeRules::default(), &set).unwrap();
        let strategy = doc.find_element(field, "strategy");
        let mode = strategy.and_then(|s| doc.attribute(s, "mode").map(str::to_string));
        (switched, mode)
    }

    #[test]
    fn test_switch_by_datasource_child() {
        let (switched, mode) = switch_first_field(
            r#"<field><datasource name="ds1" type="TANGO"/><strategy mode="INIT"/></field>"#,
            &["ds1"],
        );
        assert!(switched);
        assert_eq!(mode.as_deref(), Some("STEP"));
    }

    #[test]
    fn test_switch_by_text_reference() {
        let (switched, mode) = switch_first_field(
            r#"<field>$datasources.ds2<strategy mode="FINAL"/></field>"#,
            &["ds2"],
        );
        assert!(switched);
        assert_eq!(mode.as_deref(), Some("STEP"));
    }

    #[test]
    fn test_switch_ignores_other_datasources_and_modes() {
        let (switched, mode) = switch_first_field(
            r#"<field><datasource name="ds1"/><strategy mode="INIT"/></field>"#,
            &["other"],
        );
        assert!(!switched);
        assert_eq!(mode.as_deref(), Some("INIT"));

        let (switched, mode) = switch_first_field(
            r#"<field><datasource name="ds1"/><strategy mode="POSTRUN"/></field>"#,
            &["ds1"],
        );
        assert!(!switched);
        assert_eq!(mode.as_deref(), Some("POSTRUN"));
    }

    #[test]
    fn test_switch_does_not_look_into_grandchildren() {
        let (switched, mode) = switch_first_field(
            r#"<field><dimensions><dim><datasource name="ds1"/></dim></dimensions><strategy mode="INIT"/></field>"#,
            &["ds1"],
        );
        assert!(!switched);
        assert_eq!(mode.as_deref(), Some("INIT"));
    }

    #[test]
    fn test_switch_without_strategy() {
        let (switched, mode) = switch_first_field(r#"<field>$datasources.ds1</field>"#, &["ds1"]);
        assert!(!switched);
        assert_eq!(mode, None);
    }
}
