//! # Error Suggestions
//!
//! Helpers that build CLI errors carrying `hint:` lines, so a failure says
//! what went wrong and how to get past it.
//!
//! ```rust,ignore
//! use nxsconfig::suggestions;
//!
//! return Err(suggestions::store_not_found(&args.store));
//! ```

use std::collections::BTreeSet;
use std::path::Path;

use crate::error::{Error, RecordKind};

/// Error for a store directory that does not exist.
pub fn store_not_found(path: &Path) -> anyhow::Error {
    anyhow::anyhow!(
        "Store directory not found: {path}\n\n\
         hint: A store holds components/<name>.xml and datasources/<name>.xml\n\
         hint: Use --store to point at a different directory\n\
         hint: Set the NXSCONFIG_STORE environment variable",
        path = path.display()
    )
}

/// Error for a settings file that was asked for but does not exist.
pub fn settings_not_found(path: &Path) -> anyhow::Error {
    anyhow::anyhow!(
        "Settings file not found: {path}\n\n\
         hint: Use --config to specify a different path\n\
         hint: Omit --config to run without settings",
        path = path.display()
    )
}

/// Error for a `--var` argument without `=`.
pub fn invalid_variable(argument: &str) -> anyhow::Error {
    anyhow::anyhow!(
        "Invalid variable assignment: {argument}\n\n\
         hint: Use --var NAME=VALUE, for example --var entryname=scan_001"
    )
}

/// Rewrites a library error into a CLI error, adding a "did you mean" hint
/// when a record name is close to a registered one.
pub fn explain(error: Error, components: &BTreeSet<String>, datasources: &BTreeSet<String>) -> anyhow::Error {
    let Error::NonregisteredRecord { kind, name } = &error else {
        return error.into();
    };
    let (candidates, listing) = match kind {
        RecordKind::Component => (components, "nxsconfig ls components"),
        RecordKind::DataSource => (datasources, "nxsconfig ls datasources"),
    };
    let did_you_mean = find_similar(name, candidates)
        .map(|candidate| format!("\nhint: Did you mean '{candidate}'?"))
        .unwrap_or_default();
    anyhow::anyhow!("{error}{did_you_mean}\n\nhint: Run '{listing}' to see what is registered")
}

/// Closest candidate within an edit distance of 2.
fn find_similar<'a>(input: &str, candidates: &'a BTreeSet<String>) -> Option<&'a str> {
    candidates
        .iter()
        .map(|candidate| (candidate, edit_distance(input, candidate)))
        .filter(|(_, distance)| *distance <= 2 && *distance < input.chars().count())
        .min_by_key(|(_, distance)| *distance)
        .map(|(candidate, _)| candidate.as_str())
}

/// Levenshtein distance, computed over two rolling rows.
fn edit_distance(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != *cb);
            current[j + 1] = substitution.min(previous[j + 1] + 1).min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> BTreeSet<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_store_not_found_includes_hints() {
        let message = store_not_found(Path::new("/srv/store")).to_string();
        assert!(message.contains("Store directory not found: /srv/store"));
        assert!(message.contains("--store"));
        assert!(message.contains("NXSCONFIG_STORE"));
    }

    #[test]
    fn test_settings_not_found_includes_hints() {
        let message = settings_not_found(Path::new("cfg.yaml")).to_string();
        assert!(message.contains("cfg.yaml"));
        assert!(message.contains("--config"));
    }

    #[test]
    fn test_invalid_variable() {
        let message = invalid_variable("entryname").to_string();
        assert!(message.contains("entryname"));
        assert!(message.contains("NAME=VALUE"));
    }

    #[test]
    fn test_explain_suggests_close_component() {
        let message = explain(
            Error::missing_component("slitt"),
            &names(&["slit", "motor"]),
            &names(&[]),
        )
        .to_string();
        assert!(message.contains("The component 'slitt' is not registered"));
        assert!(message.contains("Did you mean 'slit'?"));
        assert!(message.contains("nxsconfig ls components"));
    }

    #[test]
    fn test_explain_without_close_match() {
        let message = explain(
            Error::missing_datasource("xyz"),
            &names(&[]),
            &names(&["temperature"]),
        )
        .to_string();
        assert!(!message.contains("Did you mean"));
        assert!(message.contains("nxsconfig ls datasources"));
    }

    #[test]
    fn test_explain_passes_other_errors_through() {
        let error = Error::UndefinedTag {
            tag: "definition".to_string(),
        };
        assert_eq!(explain(error, &names(&[]), &names(&[])).to_string(), "<definition> not defined");
    }

    #[test]
    fn test_edit_distance() {
        assert_eq!(edit_distance("", "abc"), 3);
        assert_eq!(edit_distance("abc", ""), 3);
        assert_eq!(edit_distance("kitten", "sitting"), 3);
        assert_eq!(edit_distance("slit", "slit"), 0);
    }
}
