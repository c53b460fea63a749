//! # Fragment Stores
//!
//! The merge engine never talks to a database directly. It reads fragments
//! through the [`FragmentStore`] trait, which offers lookup by name and
//! listing of the registered names for both kinds of fragment.
//!
//! Two implementations ship with the crate:
//!
//! - **`MemoryStore`**: an in-memory map, filled and updated by the caller.
//!   Storing a name replaces its previous XML.
//! - **`DirectoryStore`**: a read-only view over a directory laid out as
//!   `components/<name>.xml`, `datasources/<name>.xml` and an optional
//!   `mandatory.txt` listing mandatory component names one per line.
//!
//! Lookups of unknown names fail with `Error::NonregisteredRecord`.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

use crate::error::{Error, RecordKind, Result};

/// Read access to stored components and datasources.
pub trait FragmentStore: Send + Sync {
    /// XML text of the component `name`.
    fn fetch_component(&self, name: &str) -> Result<String>;

    /// XML text of the datasource `name`.
    fn fetch_datasource(&self, name: &str) -> Result<String>;

    /// Names of all registered components.
    fn list_components(&self) -> Result<BTreeSet<String>>;

    /// Names of all registered datasources.
    fn list_datasources(&self) -> Result<BTreeSet<String>>;

    /// Components implicitly added to every merge.
    fn mandatory_components(&self) -> Result<Vec<String>> {
        Ok(Vec::new())
    }
}

impl<T: FragmentStore + ?Sized> FragmentStore for &T {
    fn fetch_component(&self, name: &str) -> Result<String> {
        (**self).fetch_component(name)
    }

    fn fetch_datasource(&self, name: &str) -> Result<String> {
        (**self).fetch_datasource(name)
    }

    fn list_components(&self) -> Result<BTreeSet<String>> {
        (**self).list_components()
    }

    fn list_datasources(&self) -> Result<BTreeSet<String>> {
        (**self).list_datasources()
    }

    fn mandatory_components(&self) -> Result<Vec<String>> {
        (**self).mandatory_components()
    }
}

/// In-memory fragment store
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    components: BTreeMap<String, String>,
    datasources: BTreeMap<String, String>,
    mandatory: Vec<String>,
}

impl MemoryStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a component
    pub fn store_component(&mut self, name: &str, xml: &str) {
        self.components.insert(name.to_string(), xml.to_string());
    }

    /// Add or replace a datasource
    pub fn store_datasource(&mut self, name: &str, xml: &str) {
        self.datasources.insert(name.to_string(), xml.to_string());
    }

    /// Remove a component, also dropping it from the mandatory list
    pub fn delete_component(&mut self, name: &str) -> Result<()> {
        self.components
            .remove(name)
            .ok_or_else(|| Error::missing_component(name))?;
        self.mandatory.retain(|m| m != name);
        Ok(())
    }

    /// Remove a datasource
    pub fn delete_datasource(&mut self, name: &str) -> Result<()> {
        self.datasources
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| Error::missing_datasource(name))
    }

    /// Mark a registered component as mandatory
    pub fn set_mandatory(&mut self, name: &str) -> Result<()> {
        if !self.components.contains_key(name) {
            return Err(Error::missing_component(name));
        }
        if !self.mandatory.iter().any(|m| m == name) {
            self.mandatory.push(name.to_string());
        }
        Ok(())
    }

    /// Remove a component from the mandatory list
    pub fn unset_mandatory(&mut self, name: &str) {
        self.mandatory.retain(|m| m != name);
    }
}

impl FragmentStore for MemoryStore {
    fn fetch_component(&self, name: &str) -> Result<String> {
        self.components
            .get(name)
            .cloned()
            .ok_or_else(|| Error::missing_component(name))
    }

    fn fetch_datasource(&self, name: &str) -> Result<String> {
        self.datasources
            .get(name)
            .cloned()
            .ok_or_else(|| Error::missing_datasource(name))
    }

    fn list_components(&self) -> Result<BTreeSet<String>> {
        Ok(self.components.keys().cloned().collect())
    }

    fn list_datasources(&self) -> Result<BTreeSet<String>> {
        Ok(self.datasources.keys().cloned().collect())
    }

    fn mandatory_components(&self) -> Result<Vec<String>> {
        Ok(self.mandatory.clone())
    }
}

const COMPONENTS_DIR: &str = "components";
const DATASOURCES_DIR: &str = "datasources";
const MANDATORY_FILE: &str = "mandatory.txt";
const FRAGMENT_EXTENSION: &str = "xml";

/// Read-only store backed by a directory of XML files
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Names must not escape their kind's directory.
    fn is_valid_name(name: &str) -> bool {
        !name.is_empty()
            && !name.starts_with('.')
            && !name.contains(|c: char| c == '/' || c == '\\')
    }

    fn fragment_path(&self, kind: RecordKind, name: &str) -> PathBuf {
        let dir = match kind {
            RecordKind::Component => COMPONENTS_DIR,
            RecordKind::DataSource => DATASOURCES_DIR,
        };
        self.root
            .join(dir)
            .join(format!("{}.{}", name, FRAGMENT_EXTENSION))
    }

    fn fetch(&self, kind: RecordKind, name: &str) -> Result<String> {
        let missing = || Error::NonregisteredRecord {
            kind,
            name: name.to_string(),
        };
        if !Self::is_valid_name(name) {
            return Err(missing());
        }
        let path = self.fragment_path(kind, name);
        if !path.is_file() {
            return Err(missing());
        }
        debug!("Reading {} '{}' from {}", kind, name, path.display());
        Ok(fs::read_to_string(path)?)
    }

    fn list(&self, kind: RecordKind) -> Result<BTreeSet<String>> {
        let dir = match kind {
            RecordKind::Component => self.root.join(COMPONENTS_DIR),
            RecordKind::DataSource => self.root.join(DATASOURCES_DIR),
        };
        let mut names = BTreeSet::new();
        if !dir.is_dir() {
            return Ok(names);
        }
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            if path.extension().and_then(|e| e.to_str()) != Some(FRAGMENT_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if Self::is_valid_name(stem) {
                    names.insert(stem.to_string());
                }
            }
        }
        Ok(names)
    }
}

impl FragmentStore for DirectoryStore {
    fn fetch_component(&self, name: &str) -> Result<String> {
        self.fetch(RecordKind::Component, name)
    }

    fn fetch_datasource(&self, name: &str) -> Result<String> {
        self.fetch(RecordKind::DataSource, name)
    }

    fn list_components(&self) -> Result<BTreeSet<String>> {
        self.list(RecordKind::Component)
    }

    fn list_datasources(&self) -> Result<BTreeSet<String>> {
        self.list(RecordKind::DataSource)
    }

    fn mandatory_components(&self) -> Result<Vec<String>> {
        let path = self.root.join(MANDATORY_FILE);
        if !path.is_file() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(path)?;
        let mut names: Vec<String> = Vec::new();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if !names.iter().any(|n| n == line) {
                names.push(line.to_string());
            }
        }
        Ok(names)
    }
}
