//! Default values for nxsconfig.
//!
//! This module provides the literal rule tables used by the merger and the
//! file names used by the command-line tool, so every caller agrees on them.

/// Root element every component fragment is wrapped in.
pub const DEFINITION_TAG: &str = "definition";

/// Element holding a data-acquisition binding.
pub const DATASOURCE_TAG: &str = "datasource";

/// Element carrying the acquisition mode of a field.
pub const STRATEGY_TAG: &str = "strategy";

/// Mode a switched strategy is set to.
pub const STEP_MODE: &str = "STEP";

/// Default settings file looked up by the CLI.
pub const DEFAULT_SETTINGS_FILENAME: &str = "nxsconfig.yaml";

/// Tags for which two siblings with different names are always an error.
pub const SINGLES: &[&str] = &[
    "strategy",
    "dimensions",
    "definition",
    "record",
    "device",
    "query",
    "database",
];

/// Allowed child tags per parent tag. Parents not listed are unconstrained.
pub const CHILDREN: &[(&str, &[&str])] = &[
    (
        "attribute",
        &["datasource", "strategy", "enumeration", "doc", "dimensions"],
    ),
    (
        "definition",
        &["group", "field", "attribute", "link", "component", "doc", "symbols"],
    ),
    ("dimensions", &["dim", "doc"]),
    ("dim", &["datasource", "strategy", "doc"]),
    (
        "field",
        &["attribute", "datasource", "doc", "dimensions", "enumeration", "strategy"],
    ),
    (
        "group",
        &["group", "field", "attribute", "link", "component", "doc", "vfield"],
    ),
    ("link", &["datasource", "strategy", "doc"]),
    ("symbols", &["doc", "symbol"]),
];

/// Tags whose direct text must agree between merge candidates.
pub const UNIQUE_TEXT: &[&str] = &["field", "attribute", "query", "strategy", "result"];

/// Tags whose strategy mode may be switched to `STEP`.
pub const SWITCHABLE: &[&str] = &["field", "attribute"];

/// Strategy modes that get switched to `STEP`.
pub const MODES_TO_SWITCH: &[&str] = &["INIT", "FINAL"];

/// Singles of the earlier rule set, which also treated `datasource` and
/// `door` as singletons.
pub const LEGACY_SINGLES: &[&str] = &[
    "strategy",
    "dimensions",
    "definition",
    "record",
    "device",
    "query",
    "database",
    "datasource",
    "door",
];

/// Parents the earlier rule set did not constrain.
pub const LEGACY_UNCONSTRAINED: &[&str] = &["dim", "link"];
