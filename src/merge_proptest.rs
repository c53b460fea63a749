//! Property-based tests for the merger and the placeholder passes.
//!
//! These tests use proptest to generate component fragments and verify that
//! merging is idempotent and does not depend on fragment order.

#[cfg(test)]
mod proptest_tests {
    use std::collections::BTreeMap;

    use crate::merge::Merger;
    use crate::placeholders::substitute_variables;
    use crate::tree::{Document, NodeId};
    use proptest::prelude::*;

    /// One `<field>` of a generated fragment. Texts and attributes depend only
    /// on the field index so that equally named fields never conflict.
    #[derive(Debug, Clone)]
    struct FieldSpec {
        index: u8,
        text: bool,
        units: bool,
        strategy: bool,
    }

    fn field_spec() -> impl Strategy<Value = FieldSpec> {
        (0u8..4, any::<bool>(), any::<bool>(), any::<bool>()).prop_map(
            |(index, text, units, strategy)| FieldSpec {
                index,
                text,
                units,
                strategy,
            },
        )
    }

    fn fragment() -> impl Strategy<Value = String> {
        prop::collection::vec(field_spec(), 0..5).prop_map(|fields| {
            let mut xml = String::from(r#"<definition><group type="NXentry" name="entry">"#);
            for field in fields {
                xml.push_str(&format!(r#"<field name="f{}""#, field.index));
                if field.units {
                    xml.push_str(&format!(r#" units="mm{}""#, field.index));
                }
                xml.push('>');
                if field.text {
                    xml.push_str(&format!("$datasources.ds{}", field.index));
                }
                if field.strategy {
                    xml.push_str(r#"<strategy mode="INIT"/>"#);
                }
                xml.push_str("</field>");
            }
            xml.push_str("</group></definition>");
            xml
        })
    }

    fn merged(fragments: &[String]) -> Document {
        let mut merger = Merger::default();
        merger.collect(fragments).unwrap();
        merger.merge().unwrap();
        merger.document().cloned().unwrap()
    }

    /// Rendering with sorted attributes, sorted texts and sorted children.
    fn canonical(doc: &Document, node: NodeId) -> String {
        let Some(element) = doc.element(node) else {
            return String::new();
        };
        let mut attributes: Vec<String> = element
            .attributes
            .iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect();
        attributes.sort();
        let mut texts: Vec<String> = doc
            .children(node)
            .iter()
            .filter_map(|child| doc.text(*child))
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .collect();
        texts.sort();
        let mut children: Vec<String> = doc
            .child_elements(node)
            .into_iter()
            .map(|child| canonical(doc, child))
            .collect();
        children.sort();
        format!(
            "<{} {}>{}{}</{}>",
            element.name,
            attributes.join(" "),
            texts.join("|"),
            children.join(""),
            element.name
        )
    }

    fn canonical_document(doc: &Document) -> String {
        doc.document_element()
            .map(|root| canonical(doc, root))
            .unwrap_or_default()
    }

    proptest! {
        /// Property: merging a fragment with copies of itself changes nothing
        #[test]
        fn merge_of_repeated_fragment_is_idempotent(xml in fragment(), copies in 1usize..4) {
            let single = merged(&[xml.clone()]);
            let repeated = merged(&vec![xml; copies + 1]);
            prop_assert_eq!(canonical_document(&single), canonical_document(&repeated));
        }

        /// Property: fragment order only affects sibling order
        #[test]
        fn merge_is_order_insensitive(
            (fragments, shuffled) in prop::collection::vec(fragment(), 1..5)
                .prop_flat_map(|v| (Just(v.clone()), Just(v).prop_shuffle()))
        ) {
            let first = merged(&fragments);
            let second = merged(&shuffled);
            prop_assert_eq!(canonical_document(&first), canonical_document(&second));
        }

        /// Property: after a merge no two sibling fields share a name
        #[test]
        fn merged_fields_have_unique_names(fragments in prop::collection::vec(fragment(), 1..5)) {
            let doc = merged(&fragments);
            let group = doc.find_element(doc.root(), "group").unwrap();
            let mut names: Vec<&str> = doc
                .child_elements(group)
                .into_iter()
                .filter_map(|field| doc.attribute(field, "name"))
                .collect();
            let total = names.len();
            names.sort_unstable();
            names.dedup();
            prop_assert_eq!(names.len(), total);
        }

        /// Property: text without markers passes the variable pass unchanged
        #[test]
        fn variable_pass_keeps_marker_free_text(text in "[^$]*") {
            let result = substitute_variables(&text, &BTreeMap::new()).unwrap();
            prop_assert_eq!(result, text);
        }

        /// Property: substituted values are escaped, so the result stays well-formed
        #[test]
        fn substituted_values_keep_documents_well_formed(value in "[ -~]*") {
            let mut variables = BTreeMap::new();
            variables.insert("v".to_string(), value);
            let xml = substitute_variables(r#"<field name="$var.v">$var.v</field>"#, &variables).unwrap();
            prop_assert!(Document::parse(&xml).is_ok());
        }
    }
}
