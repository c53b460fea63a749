//! Shared test utilities for integration and E2E tests.
//!
//! This module provides a store fixture and fragment snippets shared by the
//! library integration tests and the CLI end-to-end tests.
//!
//! ## Usage
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = StoreFixture::new().with_beamline();
//!     fixture.command().arg("ls").assert().success();
//! }
//! ```

use assert_fs::prelude::*;
use std::path::Path;

use nxsconfig::store::DirectoryStore;

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    #[allow(unused_imports)]
    pub use assert_cmd::cargo::cargo_bin_cmd;
    #[allow(unused_imports)]
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::fragments;
    pub use super::StoreFixture;
}

/// Component and datasource fragments for testing.
#[allow(dead_code)]
pub mod fragments {
    /// Entry group shared by every beamline component.
    pub const DEFAULT: &str = r#"<?xml version="1.0"?>
<definition>
  <group type="NXentry" name='$var.entryname#"scan"'>
    <field name="title">$var.title#"untitled"<strategy mode="INIT"/></field>
  </group>
</definition>
"#;

    /// Slit component depending on the motor component.
    pub const SLIT: &str = r#"<definition>
  <group type="NXentry" name='$var.entryname#"scan"'>
    <group type="NXinstrument" name="instrument">
      <group type="NXslit" name="slit1">
        <field name="x_gap" units="mm" type="NX_FLOAT">$datasources.slit1_gap<strategy mode="FINAL"/></field>
      </group>
    </group>
  </group>
  $components.motor
</definition>
"#;

    /// Motor component.
    pub const MOTOR: &str = r#"<definition>
  <group type="NXentry" name='$var.entryname#"scan"'>
    <group type="NXinstrument" name="instrument">
      <group type="NXpositioner" name="mot01">
        <field name="value" units="deg">$datasources.mot01<strategy mode="INIT"/></field>
      </group>
    </group>
  </group>
</definition>
"#;

    /// Component whose `type` conflicts with [`MOTOR`]'s positioner.
    pub const MOTOR_CLASH: &str = r#"<definition>
  <group type="NXentry" name='$var.entryname#"scan"'>
    <group type="NXinstrument" name="instrument">
      <group type="NXdetector" name="mot01"/>
    </group>
  </group>
</definition>
"#;

    /// Component holding a tag not allowed under `<definition>`.
    pub const BAD_CHILD: &str = "<definition><strategy mode='INIT'/></definition>";

    /// Component referencing a datasource nobody stored.
    pub const DANGLING: &str =
        "<definition><group type='NXentry'><field name='x'>$datasources.missing</field></group></definition>";

    pub const SLIT1_GAP: &str = r#"<definition>
  <datasource name="slit1_gap" type="TANGO">
    <device name="p09/slit/exp.01" member="attribute"/>
    <record name="Gap"/>
  </datasource>
</definition>
"#;

    pub const MOT01: &str = r#"<datasource name="mot01" type="CLIENT"><record name="mot01"/><doc>$var.motor_doc#"rotation"</doc></datasource>"#;
}

/// A temporary directory laid out as a fragment store.
pub struct StoreFixture {
    temp_dir: assert_fs::TempDir,
}

#[allow(dead_code)]
impl StoreFixture {
    /// Create a fixture with an empty store.
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Add `components/<name>.xml`.
    pub fn with_component(self, name: &str, xml: &str) -> Self {
        self.temp_dir
            .child(format!("components/{}.xml", name))
            .write_str(xml)
            .expect("Failed to write component");
        self
    }

    /// Add `datasources/<name>.xml`.
    pub fn with_datasource(self, name: &str, xml: &str) -> Self {
        self.temp_dir
            .child(format!("datasources/{}.xml", name))
            .write_str(xml)
            .expect("Failed to write datasource");
        self
    }

    /// Write `mandatory.txt`.
    pub fn with_mandatory(self, names: &[&str]) -> Self {
        let mut content = String::from("# components merged into every configuration\n");
        for name in names {
            content.push_str(name);
            content.push('\n');
        }
        self.temp_dir
            .child("mandatory.txt")
            .write_str(&content)
            .expect("Failed to write mandatory.txt");
        self
    }

    /// Write `nxsconfig.yaml` in the store root.
    pub fn with_settings(self, yaml: &str) -> Self {
        self.temp_dir
            .child("nxsconfig.yaml")
            .write_str(yaml)
            .expect("Failed to write settings");
        self
    }

    /// Default, slit and motor components with their datasources; `default`
    /// is mandatory.
    pub fn with_beamline(self) -> Self {
        self.with_component("default", fragments::DEFAULT)
            .with_component("slit", fragments::SLIT)
            .with_component("motor", fragments::MOTOR)
            .with_datasource("slit1_gap", fragments::SLIT1_GAP)
            .with_datasource("mot01", fragments::MOT01)
            .with_mandatory(&["default"])
    }

    /// Get the path to the store directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// A directory store over the fixture.
    pub fn store(&self) -> DirectoryStore {
        DirectoryStore::new(self.path())
    }

    /// A CLI command pointed at the fixture store.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("nxsconfig");
        cmd.env_remove("NXSCONFIG_CONFIG")
            .env_remove("RUST_LOG")
            .arg("--store")
            .arg(self.path());
        cmd
    }
}

impl Default for StoreFixture {
    fn default() -> Self {
        Self::new()
    }
}
