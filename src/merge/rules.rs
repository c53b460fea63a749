//! Merge rule tables
//!
//! [`MergeRules`] is an immutable value describing how the merger treats each
//! tag. It is built once (from the defaults, the legacy table, or a settings
//! file) and handed to a [`Merger`](super::Merger) by value, so two mergers
//! never share mutable rule state.

use std::collections::{BTreeMap, BTreeSet};

use crate::defaults;

/// Tag-specific merge rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeRules {
    singles: BTreeSet<String>,
    children: BTreeMap<String, BTreeSet<String>>,
    unique_text: BTreeSet<String>,
    switchable: BTreeSet<String>,
    modes_to_switch: BTreeSet<String>,
}

impl Default for MergeRules {
    fn default() -> Self {
        Self::canonical()
    }
}

fn to_set<I, S>(items: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    items.into_iter().map(Into::into).collect()
}

impl MergeRules {
    /// The current rule set.
    pub fn canonical() -> Self {
        Self {
            singles: to_set(defaults::SINGLES.iter().copied()),
            children: defaults::CHILDREN
                .iter()
                .map(|(parent, allowed)| (parent.to_string(), to_set(allowed.iter().copied())))
                .collect(),
            unique_text: to_set(defaults::UNIQUE_TEXT.iter().copied()),
            switchable: to_set(defaults::SWITCHABLE.iter().copied()),
            modes_to_switch: to_set(defaults::MODES_TO_SWITCH.iter().copied()),
        }
    }

    /// The earlier rule set: `datasource` and `door` are singles, and `dim`
    /// and `link` children are not constrained.
    pub fn legacy() -> Self {
        let mut rules = Self::canonical();
        rules.singles = to_set(defaults::LEGACY_SINGLES.iter().copied());
        for parent in defaults::LEGACY_UNCONSTRAINED {
            rules.children.remove(*parent);
        }
        rules
    }

    /// Replaces the singles table.
    pub fn with_singles<I, S>(mut self, singles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.singles = to_set(singles);
        self
    }

    /// Replaces the allowed-children table.
    pub fn with_children<I, P, C, S>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = (P, C)>,
        P: Into<String>,
        C: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.children = children
            .into_iter()
            .map(|(parent, allowed)| (parent.into(), to_set(allowed)))
            .collect();
        self
    }

    /// Replaces the unique-text table.
    pub fn with_unique_text<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.unique_text = to_set(tags);
        self
    }

    /// Replaces the set of tags the step-mode switch applies to.
    pub fn with_switchable<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.switchable = to_set(tags);
        self
    }

    /// Replaces the strategy modes that get switched.
    pub fn with_modes_to_switch<I, S>(mut self, modes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.modes_to_switch = to_set(modes);
        self
    }

    pub fn is_single(&self, tag: &str) -> bool {
        self.singles.contains(tag)
    }

    /// Allowed children of `parent`, or `None` when the parent is unconstrained.
    pub fn allowed_children(&self, parent: &str) -> Option<&BTreeSet<String>> {
        self.children.get(parent)
    }

    pub fn has_unique_text(&self, tag: &str) -> bool {
        self.unique_text.contains(tag)
    }

    pub fn is_switchable(&self, tag: &str) -> bool {
        self.switchable.contains(tag)
    }

    pub fn switches_mode(&self, mode: &str) -> bool {
        self.modes_to_switch.contains(mode)
    }
}
