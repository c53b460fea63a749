//! # Configurator
//!
//! The façade tying the engine to a [`FragmentStore`]. It expands requested
//! component names with the mandatory components and their dependencies,
//! fetches the fragments, and runs them through the collector, the merger,
//! the placeholder passes and the renderer.
//!
//! ## Pipelines
//!
//! `merge(names)` collects and merges the raw fragments and returns the
//! compact document with placeholders untouched.
//!
//! `create_configuration(names)` builds the final document:
//!
//! 1.  Substitute `$var.` markers in every fragment.
//! 2.  Collect and merge.
//! 3.  Erase `$components.` markers and inline `$datasources.` references.
//! 4.  Merge the single resulting fragment again, catching duplicates the
//!     inlined datasources exposed.
//! 5.  Substitute `$var.` markers once more (inlined datasources may carry
//!     their own) and pretty-print.
//!
//! Any error aborts the call and leaves the last configuration untouched.

use std::collections::{BTreeMap, BTreeSet};

use log::{debug, info};

use crate::config::Settings;
use crate::discovery::{self, DataSourceRef};
use crate::error::Result;
use crate::merge::{MergeRules, Merger};
use crate::placeholders::{erase_components, substitute_datasources, substitute_variables};
use crate::render::to_pretty_string;
use crate::store::FragmentStore;
use crate::tree::Document;

/// Builds configurations from the fragments of a store.
#[derive(Debug, Clone)]
pub struct Configurator<S: FragmentStore> {
    store: S,
    rules: MergeRules,
    variables: BTreeMap<String, String>,
    step_datasources: BTreeSet<String>,
    extra_mandatory: Vec<String>,
    xml_string: Option<String>,
}

impl<S: FragmentStore> Configurator<S> {
    /// Creates a configurator with the canonical merge rules.
    pub fn new(store: S) -> Self {
        Self {
            store,
            rules: MergeRules::default(),
            variables: BTreeMap::new(),
            step_datasources: BTreeSet::new(),
            extra_mandatory: Vec::new(),
            xml_string: None,
        }
    }

    /// Replaces the merge rules.
    pub fn with_rules(mut self, rules: MergeRules) -> Self {
        self.rules = rules;
        self
    }

    /// Applies variables, step datasources, mandatory components and rules
    /// from a settings file.
    pub fn with_settings(mut self, settings: &Settings) -> Self {
        self.rules = settings.merge_rules();
        self.variables = settings.variables.clone();
        self.step_datasources = settings.step_datasources.iter().cloned().collect();
        self.extra_mandatory = settings.mandatory.clone();
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn rules(&self) -> &MergeRules {
        &self.rules
    }

    pub fn variables(&self) -> &BTreeMap<String, String> {
        &self.variables
    }

    pub fn set_variables(&mut self, variables: BTreeMap<String, String>) {
        self.variables = variables;
    }

    /// Sets variables from a JSON object. Non-string values are stored in
    /// their JSON text form.
    pub fn set_variables_json(&mut self, json: &str) -> Result<()> {
        let parsed: BTreeMap<String, serde_json::Value> = serde_json::from_str(json)?;
        self.variables = parsed
            .into_iter()
            .map(|(name, value)| match value {
                serde_json::Value::String(text) => (name, text),
                other => (name, other.to_string()),
            })
            .collect();
        Ok(())
    }

    pub fn step_datasources(&self) -> &BTreeSet<String> {
        &self.step_datasources
    }

    pub fn set_step_datasources<I, N>(&mut self, names: I)
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
    {
        self.step_datasources = names.into_iter().map(Into::into).collect();
    }

    /// Sets step datasources from a JSON list of names.
    pub fn set_step_datasources_json(&mut self, json: &str) -> Result<()> {
        let names: Vec<String> = serde_json::from_str(json)?;
        self.set_step_datasources(names);
        Ok(())
    }

    /// The last configuration built by [`create_configuration`](Self::create_configuration).
    pub fn xml_string(&self) -> Option<&str> {
        self.xml_string.as_deref()
    }

    pub fn available_components(&self) -> Result<BTreeSet<String>> {
        self.store.list_components()
    }

    pub fn available_datasources(&self) -> Result<BTreeSet<String>> {
        self.store.list_datasources()
    }

    /// Components added to every request: the store's mandatory list, then
    /// the ones from the settings, without duplicates.
    pub fn mandatory_components(&self) -> Result<Vec<String>> {
        let mut mandatory = self.store.mandatory_components()?;
        for name in &self.extra_mandatory {
            if !mandatory.contains(name) {
                mandatory.push(name.clone());
            }
        }
        Ok(mandatory)
    }

    /// Raw XML of the named components.
    pub fn components<N: AsRef<str>>(&self, names: &[N]) -> Result<Vec<String>> {
        names
            .iter()
            .map(|name| self.store.fetch_component(name.as_ref()))
            .collect()
    }

    /// Raw XML of the named datasources.
    pub fn datasources<N: AsRef<str>>(&self, names: &[N]) -> Result<Vec<String>> {
        names
            .iter()
            .map(|name| self.store.fetch_datasource(name.as_ref()))
            .collect()
    }

    /// XML of the named components with variables substituted.
    pub fn instantiated_components<N: AsRef<str>>(&self, names: &[N]) -> Result<Vec<String>> {
        self.components(names)?
            .iter()
            .map(|xml| substitute_variables(xml, &self.variables))
            .collect()
    }

    /// `names` plus all components they depend on.
    pub fn dependent_components<N: AsRef<str>>(&self, names: &[N]) -> Result<Vec<String>> {
        discovery::component_dependencies(names, &self.store)
    }

    /// Variables used by one component.
    pub fn component_variables(&self, name: &str) -> Result<Vec<String>> {
        discovery::variables(&self.store.fetch_component(name)?)
    }

    /// Variables used by the named components and their dependencies.
    pub fn components_variables<N: AsRef<str>>(&self, names: &[N]) -> Result<Vec<String>> {
        let mut seen = BTreeSet::new();
        let mut found = Vec::new();
        for name in self.dependent_components(names)? {
            for variable in self.component_variables(&name)? {
                if seen.insert(variable.clone()) {
                    found.push(variable);
                }
            }
        }
        Ok(found)
    }

    /// Datasources used by one component.
    pub fn component_datasources(&self, name: &str) -> Result<Vec<DataSourceRef>> {
        discovery::datasource_references(&self.store.fetch_component(name)?)
    }

    /// Datasources used by the merged document of `names`.
    pub fn components_datasources<N: AsRef<str>>(&self, names: &[N]) -> Result<Vec<DataSourceRef>> {
        let merged = self.merge(names)?;
        if merged.is_empty() {
            return Ok(Vec::new());
        }
        discovery::datasource_references(&merged)
    }

    /// Mandatory components, then `names`, then their dependencies.
    fn resolve_names<N: AsRef<str>>(&self, names: &[N]) -> Result<Vec<String>> {
        let mut requested = self.mandatory_components()?;
        requested.extend(names.iter().map(|name| name.as_ref().to_string()));
        let resolved = discovery::component_dependencies(&requested, &self.store)?;
        debug!("Components to merge: {}", resolved.join(", "));
        Ok(resolved)
    }

    fn merger(&self) -> Merger {
        Merger::new(self.rules.clone()).with_switch_datasources(self.step_datasources.iter().cloned())
    }

    fn merge_fragments<F: AsRef<str>>(&self, fragments: &[F]) -> Result<Option<String>> {
        let mut merger = self.merger();
        merger.collect(fragments)?;
        merger.merge()?;
        Ok(merger.to_xml())
    }

    /// Merges the mandatory and named components (with their dependencies)
    /// and returns the compact document. Placeholders are left in place.
    /// Returns an empty string when there is nothing to merge.
    pub fn merge<N: AsRef<str>>(&self, names: &[N]) -> Result<String> {
        let names = self.resolve_names(names)?;
        let fragments = self.components(&names)?;
        Ok(self.merge_fragments(&fragments)?.unwrap_or_default())
    }

    /// Builds the fully resolved configuration for `names`.
    ///
    /// On success the pretty-printed document is available from
    /// [`xml_string`](Self::xml_string); on error the previous value is kept.
    pub fn create_configuration<N: AsRef<str>>(&mut self, names: &[N]) -> Result<()> {
        let names = self.resolve_names(names)?;
        let fragments: Vec<String> = self
            .components(&names)?
            .iter()
            .map(|xml| substitute_variables(xml, &self.variables))
            .collect::<Result<_>>()?;

        let Some(merged) = self.merge_fragments(&fragments)? else {
            info!("No components to merge, configuration is empty");
            self.xml_string = Some(String::new());
            return Ok(());
        };

        let available = self.store.list_components()?;
        let resolved = erase_components(&merged, &available)?;
        let resolved = substitute_datasources(&resolved, &self.store, &self.variables)?;

        let remerged = self.merge_fragments(&[resolved])?.unwrap_or_default();
        let final_text = substitute_variables(&remerged, &self.variables)?;
        let document = Document::parse(&final_text)?;

        info!("Created configuration from {} components", names.len());
        self.xml_string = Some(to_pretty_string(&document));
        Ok(())
    }
}
