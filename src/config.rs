//! # Settings
//!
//! This module defines the optional `nxsconfig.yaml` settings file and its
//! parsing. The file supplies the values a configuration request needs beyond
//! the list of component names:
//!
//! - **`variables`**: values substituted for `$var.<name>` markers.
//! - **`step_datasources`**: datasources whose `INIT`/`FINAL` strategies are
//!   switched to `STEP`.
//! - **`mandatory`**: components added to every request, after the ones the
//!   store marks as mandatory.
//! - **`rules`**: optional replacement of any of the merger's rule tables,
//!   starting from either the `canonical` or the `legacy` set.
//!
//! ```yaml
//! variables:
//!   entryname: scan_001
//! step_datasources: [exp_c01]
//! mandatory: [default]
//! rules:
//!   base: canonical
//!   unique_text: [field, attribute]
//! ```
//!
//! Unknown keys are rejected so that typos do not silently fall back to the
//! defaults.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::merge::MergeRules;

/// Which built-in rule set overrides start from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleBase {
    #[default]
    Canonical,
    Legacy,
}

/// Replacement rule tables. Absent tables keep the base set's values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RulesOverride {
    pub base: RuleBase,
    pub singles: Option<Vec<String>>,
    pub children: Option<BTreeMap<String, Vec<String>>>,
    pub unique_text: Option<Vec<String>>,
    pub switchable: Option<Vec<String>>,
    pub modes_to_switch: Option<Vec<String>>,
}

impl RulesOverride {
    /// Builds the merge rules this override describes.
    pub fn to_rules(&self) -> MergeRules {
        let mut rules = match self.base {
            RuleBase::Canonical => MergeRules::canonical(),
            RuleBase::Legacy => MergeRules::legacy(),
        };
        if let Some(singles) = &self.singles {
            rules = rules.with_singles(singles.iter().cloned());
        }
        if let Some(children) = &self.children {
            rules = rules.with_children(children.clone());
        }
        if let Some(unique_text) = &self.unique_text {
            rules = rules.with_unique_text(unique_text.iter().cloned());
        }
        if let Some(switchable) = &self.switchable {
            rules = rules.with_switchable(switchable.iter().cloned());
        }
        if let Some(modes) = &self.modes_to_switch {
            rules = rules.with_modes_to_switch(modes.iter().cloned());
        }
        rules
    }
}

/// Contents of the settings file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub variables: BTreeMap<String, String>,
    pub step_datasources: Vec<String>,
    pub mandatory: Vec<String>,
    pub rules: Option<RulesOverride>,
}

impl Settings {
    /// Parses settings from YAML text. Blank text yields the defaults.
    pub fn parse(yaml_content: &str) -> Result<Self> {
        if yaml_content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml_content).map_err(|e| Error::ConfigParse {
            message: e.to_string(),
            hint: Some(
                "Expected the keys `variables`, `step_datasources`, `mandatory` and `rules`".to_string(),
            ),
        })
    }

    /// Reads and parses a settings file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Merge rules described by the settings.
    pub fn merge_rules(&self) -> MergeRules {
        self.rules
            .as_ref()
            .map(RulesOverride::to_rules)
            .unwrap_or_default()
    }
}
