//! # Error Handling
//!
//! This module defines the centralized error type for `nxsconfig`. It uses
//! the `thiserror` library to build one `Error` enum covering every failure
//! the merge engine, the placeholder resolver, the fragment stores and the
//! settings loader can report.
//!
//! ## Taxonomy
//!
//! - **`Parse`**: a fragment is not well-formed XML.
//! - **`UndefinedTag`**: a fragment lacks its required `<definition>` element.
//! - **`IncompatibleNode`**: two sibling elements contradict each other, or a
//!   child tag is not allowed under its parent. Carries the ancestor paths of
//!   the offending nodes.
//! - **`NonregisteredRecord`**: a component or datasource referenced by name
//!   is not present in the fragment store.
//!
//! None of these are retried internally. Every one of them aborts the whole
//! `merge`/`create_configuration` call and no partial document is returned.
//!
//! The `Result` type alias is used throughout the crate.

use thiserror::Error;

/// Main error type for nxsconfig operations
#[derive(Error, Debug)]
pub enum Error {
    /// A fragment could not be parsed as XML.
    #[error("XML parsing error: {message}")]
    Parse { message: String },

    /// A fragment does not contain the required element.
    #[error("<{tag}> not defined")]
    UndefinedTag { tag: String },

    /// Two sibling elements cannot be unified, or an element sits under a
    /// parent that does not allow it.
    #[error("Incompatible nodes: {message}")]
    IncompatibleNode {
        message: String,
        /// Ancestor paths of the nodes involved, e.g. `/definition/group:entry`
        nodes: Vec<String>,
    },

    /// A referenced record is not registered in the fragment store.
    #[error("The {kind} '{name}' is not registered in the database")]
    NonregisteredRecord { kind: RecordKind, name: String },

    /// The settings file could not be understood.
    #[error("Configuration parsing error: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    ConfigParse {
        message: String,
        /// Optional hint for how to fix the settings file
        hint: Option<String>,
    },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML parsing error, wrapped from `serde_yaml::Error`.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A JSON parsing error, wrapped from `serde_json::Error`.
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// A regular expression error, wrapped from `regex::Error`.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}

/// The kind of stored record a lookup refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Component,
    DataSource,
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordKind::Component => write!(f, "component"),
            RecordKind::DataSource => write!(f, "datasource"),
        }
    }
}

impl Error {
    /// Shorthand for a missing component.
    pub fn missing_component(name: &str) -> Self {
        Error::NonregisteredRecord {
            kind: RecordKind::Component,
            name: name.to_string(),
        }
    }

    /// Shorthand for a missing datasource.
    pub fn missing_datasource(name: &str) -> Self {
        Error::NonregisteredRecord {
            kind: RecordKind::DataSource,
            name: name.to_string(),
        }
    }

    /// Builds a parse error from any displayable XML reader failure.
    pub(crate) fn parse<E: std::fmt::Display>(err: E) -> Self {
        Error::Parse {
            message: err.to_string(),
        }
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
