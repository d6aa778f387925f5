//! Account-id registry files.
//!
//! Flat comma-delimited lists mapping player names to account ids, as
//! produced and consumed by the original tooling. Names the API could not
//! resolve are recorded with a `-1` sentinel so later runs do not re-query
//! them; such rows never surface as scoreable accounts.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use csv::{ReaderBuilder, WriterBuilder};
use thiserror::Error;
use tracing::{info, warn};

use crate::models::{AccountId, RegisteredAccount};
use crate::source::{SourceError, WargamingApi};

/// Sentinel id written for names the API could not resolve.
const UNKNOWN_ID: &str = "-1";

/// Errors that can occur during registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Source error: {0}")]
    Source(#[from] SourceError),
}

/// Contents of one registry file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryFile {
    /// Name to id mappings with a real account id
    pub resolved: Vec<RegisteredAccount>,

    /// Names recorded with the unknown sentinel
    pub unresolved: Vec<String>,
}

impl RegistryFile {
    /// Account ids of all resolved entries, in file order.
    pub fn account_ids(&self) -> Vec<AccountId> {
        self.resolved.iter().map(|account| account.id).collect()
    }

    /// Whether a name is already present, resolved or not.
    pub fn contains_name(&self, name: &str) -> bool {
        self.resolved.iter().any(|account| account.name == name)
            || self.unresolved.iter().any(|n| n == name)
    }
}

/// Load a registry CSV file.
///
/// Rows are `name,id`. Rows carrying the unknown sentinel go to
/// `unresolved`; rows with an unparsable id or the wrong shape are skipped
/// with a warning. Duplicate names keep their first occurrence.
pub fn load_registry(path: &Path) -> Result<RegistryFile, RegistryError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;

    let mut registry = RegistryFile::default();
    let mut seen = HashSet::new();

    for record in reader.records() {
        let record = record?;
        let (Some(name), Some(id_field)) = (record.get(0), record.get(1)) else {
            warn!("Skipping malformed registry row: {:?}", record);
            continue;
        };

        if !seen.insert(name.to_string()) {
            continue;
        }

        if id_field.trim() == UNKNOWN_ID {
            registry.unresolved.push(name.to_string());
        } else {
            match id_field.parse::<AccountId>() {
                Ok(id) => registry
                    .resolved
                    .push(RegisteredAccount::new(name.to_string(), id)),
                Err(_) => warn!("Skipping registry row with bad id: {},{}", name, id_field),
            }
        }
    }

    info!(
        "Loaded {} resolved and {} unresolved entries from {:?}",
        registry.resolved.len(),
        registry.unresolved.len(),
        path
    );
    Ok(registry)
}

/// Write a registry CSV file, resolved entries first in account-id order,
/// then unresolved names with the unknown sentinel. The parent directory is
/// created if absent.
pub fn save_registry(path: &Path, registry: &RegistryFile) -> Result<(), RegistryError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut writer = WriterBuilder::new().has_headers(false).from_path(path)?;

    let mut resolved = registry.resolved.clone();
    resolved.sort_by_key(|account| account.id);

    for account in &resolved {
        let id = account.id.to_string();
        writer.write_record([account.name.as_str(), id.as_str()])?;
    }
    for name in &registry.unresolved {
        writer.write_record([name.as_str(), UNKNOWN_ID])?;
    }

    writer.flush()?;
    Ok(())
}

/// Names from `names` that are not yet present in `known`, deduplicated,
/// in input order.
fn names_to_query(names: &[String], known: &RegistryFile) -> Vec<String> {
    let mut queued = HashSet::new();
    names
        .iter()
        .filter(|name| !known.contains_name(name) && queued.insert(name.as_str()))
        .cloned()
        .collect()
}

/// Merge one batch of API resolutions into a registry.
///
/// Every queried name ends up either resolved or recorded with the unknown
/// sentinel, so later runs skip it.
fn merge_resolutions(
    registry: &mut RegistryFile,
    queried: &[String],
    fetched: &HashMap<String, AccountId>,
) {
    for name in queried {
        match fetched.get(name) {
            Some(id) => registry
                .resolved
                .push(RegisteredAccount::new(name.clone(), *id)),
            None => registry.unresolved.push(name.clone()),
        }
    }
}

/// Resolve player names to account ids, batching through the account-list
/// endpoint. Names already present in `known` are not re-queried.
pub async fn resolve_names(
    api: &WargamingApi,
    names: &[String],
    known: RegistryFile,
    batch_size: usize,
) -> Result<RegistryFile, RegistryError> {
    let pending = names_to_query(names, &known);
    info!(
        "Resolving {} new names ({} already known)",
        pending.len(),
        names.len() - pending.len()
    );

    let mut registry = known;
    for batch in pending.chunks(batch_size.max(1)) {
        let fetched = api.fetch_account_ids(batch).await?;
        merge_resolutions(&mut registry, batch, &fetched);
    }

    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn sample_registry() -> RegistryFile {
        RegistryFile {
            resolved: vec![
                RegisteredAccount::new("late_joiner", AccountId::new(547000000)),
                RegisteredAccount::new("veteran", AccountId::new(500123456)),
            ],
            unresolved: vec!["ghost_player".to_string()],
        }
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data").join("ZLIST.csv");

        save_registry(&path, &sample_registry()).unwrap();
        let loaded = load_registry(&path).unwrap();

        // save orders resolved rows by account id
        assert_eq!(
            loaded.resolved,
            vec![
                RegisteredAccount::new("veteran", AccountId::new(500123456)),
                RegisteredAccount::new("late_joiner", AccountId::new(547000000)),
            ]
        );
        assert_eq!(loaded.unresolved, vec!["ghost_player".to_string()]);
    }

    #[test]
    fn test_load_filters_sentinel_and_bad_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ZLIST.csv");
        fs::write(
            &path,
            "veteran,500123456\nghost_player,-1\nbroken,not-a-number\nsolo_field\n",
        )
        .unwrap();

        let loaded = load_registry(&path).unwrap();

        assert_eq!(loaded.resolved.len(), 1);
        assert_eq!(loaded.resolved[0].name, "veteran");
        assert_eq!(loaded.unresolved, vec!["ghost_player".to_string()]);
    }

    #[test]
    fn test_load_keeps_first_duplicate() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ZLIST.csv");
        fs::write(&path, "veteran,1\nveteran,2\n").unwrap();

        let loaded = load_registry(&path).unwrap();

        assert_eq!(loaded.resolved.len(), 1);
        assert_eq!(loaded.resolved[0].id, AccountId::new(1));
    }

    #[test]
    fn test_account_ids() {
        let registry = sample_registry();
        assert_eq!(
            registry.account_ids(),
            vec![AccountId::new(547000000), AccountId::new(500123456)]
        );
    }

    #[test]
    fn test_names_to_query_skips_known_and_duplicates() {
        let known = sample_registry();
        let names = vec![
            "veteran".to_string(),
            "newcomer".to_string(),
            "newcomer".to_string(),
            "ghost_player".to_string(),
            "other".to_string(),
        ];

        let pending = names_to_query(&names, &known);

        assert_eq!(pending, vec!["newcomer".to_string(), "other".to_string()]);
    }

    #[test]
    fn test_merge_resolutions_records_unknowns() {
        let mut registry = RegistryFile::default();
        let queried = vec!["found".to_string(), "missing".to_string()];
        let fetched: HashMap<String, AccountId> =
            [("found".to_string(), AccountId::new(42))].into_iter().collect();

        merge_resolutions(&mut registry, &queried, &fetched);

        assert_eq!(
            registry.resolved,
            vec![RegisteredAccount::new("found", AccountId::new(42))]
        );
        assert_eq!(registry.unresolved, vec!["missing".to_string()]);
    }
}
