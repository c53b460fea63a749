//! # NXS Configuration Library
//!
//! This library assembles one XML configuration document from a set of named
//! component fragments and datasource fragments. It is designed to be used
//! by the `nxsconfig` command-line tool but can also be embedded in any
//! service that keeps its fragments elsewhere, through the
//! [`store::FragmentStore`] trait.
//!
//! ## Quick Example
//!
//! ```
//! use nxsconfig::configurator::Configurator;
//! use nxsconfig::store::MemoryStore;
//!
//! let mut store = MemoryStore::new();
//! store.store_component(
//!     "entry",
//!     "<definition><group type='NXentry' name='$var.entry#\"scan\"'/></definition>",
//! );
//! store.store_component(
//!     "sample",
//!     "<definition><group type='NXentry' name='$var.entry#\"scan\"'><field name='temp'>$datasources.temp</field></group></definition>",
//! );
//! store.store_datasource("temp", "<datasource name='temp' type='CLIENT'><record name='temp'/></datasource>");
//!
//! let mut configurator = Configurator::new(store);
//! configurator.create_configuration(&["entry", "sample"]).unwrap();
//!
//! let xml = configurator.xml_string().unwrap();
//! assert_eq!(xml.matches("<group").count(), 1);
//! assert!(xml.contains(r#"<datasource name="temp" type="CLIENT">"#));
//! ```
//!
//! ## Core Concepts
//!
//! - **Tree (`tree`)**: An arena-backed XML tree with parent links, used by
//!   every other module.
//! - **Collector (`collect`)**: Gathers the children of each fragment's
//!   `<definition>` under the first fragment's `<definition>`.
//! - **Merger (`merge`)**: Folds structurally equivalent siblings together,
//!   enforces the allowed-children table and switches strategy modes.
//! - **Placeholders (`placeholders`)**: Resolves `$var.`, `$components.` and
//!   `$datasources.` markers.
//! - **Renderer (`render`)**: Writes compact or pretty XML.
//! - **Discovery (`discovery`)**: Read-only scans for dependencies,
//!   datasources and variables.
//! - **Stores (`store`)**: Where fragments come from, in memory or on disk.
//! - **Configurator (`configurator`)**: The façade tying all of the above
//!   together.
//!
//! ## Execution Flow
//!
//! Creating a configuration runs these steps:
//!
//! 1.  **Resolution**: Expand the requested names with the mandatory
//!     components and all `$components.` dependencies.
//! 2.  **Instantiation**: Substitute `$var.` markers in each fragment.
//! 3.  **Merge**: Collect and merge the fragments.
//! 4.  **Inlining**: Erase `$components.` markers and inline the referenced
//!     datasources.
//! 5.  **Re-merge**: Merge the result again and resolve variables brought in
//!     by the datasources.
//! 6.  **Output**: Pretty-print the document.

pub mod collect;
pub mod config;
pub mod configurator;
pub mod defaults;
pub mod discovery;
pub mod error;
pub mod merge;
pub mod placeholders;
pub mod render;
pub mod store;
pub mod suggestions;
pub mod tree;

#[cfg(test)]
mod merge_proptest;
