//! JSON-backed cache of every (d, t, n) verdict

use super::record::{OutcomeRecord, Status};
use crate::cff::CffParams;
use crate::error::{CffError, Result};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Status string the legacy update rule compares against
pub const LEGACY_PENDING_SENTINEL: &str = "timeout";

/// How `upsert` treats a record whose key is already stored
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpsertPolicy {
    /// Replace TIMEOUT and ERROR records; SAT and UNSAT are final
    #[default]
    Refresh,
    /// Replace only the solution, and only when the stored tag equals
    /// [`LEGACY_PENDING_SENTINEL`]. Stored tags are upper case, so in
    /// practice an existing record is never touched.
    Legacy,
}

/// What an `upsert` did to the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertAction {
    Inserted,
    Updated,
    Kept,
}

/// Persisted collection of outcome records.
///
/// Every lookup reads the whole file and every update rewrites it; one
/// process is assumed to own the file.
#[derive(Debug, Clone)]
pub struct ResultStore {
    path: PathBuf,
    policy: UpsertPolicy,
}

impl ResultStore {
    pub fn open(path: impl Into<PathBuf>, policy: UpsertPolicy) -> Self {
        Self {
            path: path.into(),
            policy,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn policy(&self) -> UpsertPolicy {
        self.policy
    }

    /// All records; a missing file is an empty store
    pub fn load(&self) -> Result<Vec<OutcomeRecord>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(CffError::StoreIo {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&content).map_err(|source| CffError::StoreFormat {
            path: self.path.clone(),
            source,
        })
    }

    /// The record stored under `params`, if any
    pub fn get(&self, params: CffParams) -> Result<Option<OutcomeRecord>> {
        Ok(self.load()?.into_iter().find(|r| r.matches(params)))
    }

    /// True when a conclusive record exists; a TIMEOUT asks for a retry
    pub fn exists(&self, params: CffParams) -> Result<bool> {
        Ok(self
            .get(params)?
            .map(|record| !record.status.is_retryable())
            .unwrap_or(false))
    }

    /// Insert `record`, or update the stored one according to the policy
    pub fn upsert(&self, record: OutcomeRecord) -> Result<UpsertAction> {
        let mut records = self.load()?;
        let params = record.params();

        let action = match records.iter_mut().find(|r| r.matches(params)) {
            None => {
                records.push(record);
                UpsertAction::Inserted
            }
            Some(existing) => match self.policy {
                UpsertPolicy::Refresh if !existing.status.is_final() => {
                    *existing = record;
                    UpsertAction::Updated
                }
                UpsertPolicy::Legacy if existing.status.as_str() == LEGACY_PENDING_SENTINEL => {
                    existing.solution = record.solution;
                    UpsertAction::Updated
                }
                _ => UpsertAction::Kept,
            },
        };

        // the legacy rule rewrites the file even when nothing changed
        if action == UpsertAction::Kept && self.policy == UpsertPolicy::Refresh {
            debug!(%params, "store already holds a final record");
            return Ok(action);
        }

        self.save(&mut records)?;
        debug!(%params, ?action, "store updated");
        Ok(action)
    }

    /// For each t, the greatest n with a SAT record for `d`
    pub fn best_known(&self, d: usize) -> Result<Vec<(usize, usize)>> {
        let best = self
            .load()?
            .into_iter()
            .filter(|r| r.d == d && r.status == Status::Sat)
            .map(|r| (r.t, r.n))
            .into_grouping_map()
            .max();

        Ok(best.into_iter().sorted().collect())
    }

    /// Rewrite the whole file through a synced sibling and a rename
    fn save(&self, records: &mut [OutcomeRecord]) -> Result<()> {
        records.sort_by_key(|r| (r.d, r.t, r.n));

        let json = serde_json::to_string_pretty(records).map_err(|source| {
            CffError::StoreFormat {
                path: self.path.clone(),
                source,
            }
        })?;
        write_atomically(&self.path, json.as_bytes())?;
        info!(records = records.len(), path = %self.path.display(), "saved result store");
        Ok(())
    }
}

/// Replace `path` with `contents` through a synced `<name>.tmp` sibling
/// and a rename, creating parent directories as needed
pub(crate) fn write_atomically(path: &Path, contents: &[u8]) -> Result<()> {
    let io_error = |source| CffError::StoreIo {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_error)?;
    }

    let mut temp_name = path.file_name().unwrap_or_default().to_os_string();
    temp_name.push(".tmp");
    let temp_path = path.with_file_name(temp_name);

    let mut file = std::fs::File::create(&temp_path).map_err(io_error)?;
    file.write_all(contents).map_err(io_error)?;
    file.sync_all().map_err(io_error)?;
    drop(file);

    std::fs::rename(&temp_path, path).map_err(io_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn record(d: usize, t: usize, n: usize, status: Status) -> OutcomeRecord {
        let solution = if status == Status::Sat {
            (1..=n).map(|e| vec![e]).collect()
        } else {
            vec![]
        };
        OutcomeRecord::new(CffParams::new(d, t, n), status, solution)
    }

    #[test]
    fn test_missing_file_is_empty_store() {
        let dir = tempdir().unwrap();
        let store = ResultStore::open(dir.path().join("data.json"), UpsertPolicy::Refresh);

        assert!(store.load().unwrap().is_empty());
        assert!(!store.exists(CffParams::new(1, 3, 3)).unwrap());
    }

    #[test]
    fn test_store_created_on_first_write() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/data.json");
        let store = ResultStore::open(&path, UpsertPolicy::Refresh);

        store.upsert(record(1, 3, 3, Status::Sat)).unwrap();

        assert!(path.exists());
        assert!(!path.with_extension("json.tmp").exists());
        assert_eq!(store.load().unwrap().len(), 1);
    }

    #[test]
    fn test_exists_treats_timeout_as_missing() {
        let dir = tempdir().unwrap();
        let store = ResultStore::open(dir.path().join("data.json"), UpsertPolicy::Refresh);

        store.upsert(record(1, 3, 3, Status::Timeout)).unwrap();
        store.upsert(record(1, 3, 4, Status::Error)).unwrap();
        store.upsert(record(1, 3, 5, Status::Unsat)).unwrap();

        assert!(!store.exists(CffParams::new(1, 3, 3)).unwrap());
        assert!(store.exists(CffParams::new(1, 3, 4)).unwrap());
        assert!(store.exists(CffParams::new(1, 3, 5)).unwrap());
    }

    #[test]
    fn test_repeated_upsert_does_not_duplicate() {
        let dir = tempdir().unwrap();
        let store = ResultStore::open(dir.path().join("data.json"), UpsertPolicy::Refresh);

        let sat = record(2, 9, 12, Status::Sat);
        assert_eq!(store.upsert(sat.clone()).unwrap(), UpsertAction::Inserted);
        assert_eq!(store.upsert(sat.clone()).unwrap(), UpsertAction::Kept);
        assert_eq!(store.upsert(sat).unwrap(), UpsertAction::Kept);

        assert_eq!(store.load().unwrap().len(), 1);
    }

    #[test]
    fn test_refresh_replaces_timeout() {
        let dir = tempdir().unwrap();
        let store = ResultStore::open(dir.path().join("data.json"), UpsertPolicy::Refresh);
        let params = CffParams::new(1, 4, 4);

        store.upsert(record(1, 4, 4, Status::Timeout)).unwrap();
        assert_eq!(
            store.upsert(record(1, 4, 4, Status::Sat)).unwrap(),
            UpsertAction::Updated
        );

        let stored = store.get(params).unwrap().unwrap();
        assert_eq!(stored.status, Status::Sat);
        assert_eq!(stored.solution.len(), 4);
        assert!(store.exists(params).unwrap());
    }

    #[test]
    fn test_refresh_keeps_final_records() {
        let dir = tempdir().unwrap();
        let store = ResultStore::open(dir.path().join("data.json"), UpsertPolicy::Refresh);

        store.upsert(record(1, 4, 7, Status::Unsat)).unwrap();
        store.upsert(record(1, 4, 7, Status::Timeout)).unwrap();

        let stored = store.get(CffParams::new(1, 4, 7)).unwrap().unwrap();
        assert_eq!(stored.status, Status::Unsat);
    }

    #[test]
    fn test_legacy_never_updates_stored_timeout() {
        let dir = tempdir().unwrap();
        let store = ResultStore::open(dir.path().join("data.json"), UpsertPolicy::Legacy);
        let params = CffParams::new(1, 4, 4);

        store.upsert(record(1, 4, 4, Status::Timeout)).unwrap();
        assert_eq!(
            store.upsert(record(1, 4, 4, Status::Sat)).unwrap(),
            UpsertAction::Kept
        );

        let stored = store.get(params).unwrap().unwrap();
        assert_eq!(stored.status, Status::Timeout);
        assert!(stored.solution.is_empty());
        assert!(!store.exists(params).unwrap());
    }

    #[test]
    fn test_records_saved_in_key_order() {
        let dir = tempdir().unwrap();
        let store = ResultStore::open(dir.path().join("data.json"), UpsertPolicy::Refresh);

        store.upsert(record(2, 5, 5, Status::Unsat)).unwrap();
        store.upsert(record(1, 4, 6, Status::Sat)).unwrap();
        store.upsert(record(1, 4, 5, Status::Sat)).unwrap();

        let keys: Vec<_> = store.load().unwrap().iter().map(|r| (r.d, r.t, r.n)).collect();
        assert_eq!(keys, vec![(1, 4, 5), (1, 4, 6), (2, 5, 5)]);
    }

    #[test]
    fn test_malformed_store_surfaces() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.json");
        std::fs::write(&path, "[{\"d\": 1,").unwrap();
        let store = ResultStore::open(&path, UpsertPolicy::Refresh);

        assert!(matches!(
            store.exists(CffParams::new(1, 3, 3)),
            Err(CffError::StoreFormat { .. })
        ));
        assert!(store.upsert(record(1, 3, 3, Status::Sat)).is_err());
        // the broken file is left for inspection
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[{\"d\": 1,");
    }

    #[test]
    fn test_best_known_per_t() {
        let dir = tempdir().unwrap();
        let store = ResultStore::open(dir.path().join("data.json"), UpsertPolicy::Refresh);

        store.upsert(record(1, 4, 5, Status::Sat)).unwrap();
        store.upsert(record(1, 4, 6, Status::Sat)).unwrap();
        store.upsert(record(1, 4, 7, Status::Unsat)).unwrap();
        store.upsert(record(1, 5, 8, Status::Sat)).unwrap();
        store.upsert(record(2, 5, 9, Status::Sat)).unwrap();

        assert_eq!(store.best_known(1).unwrap(), vec![(4, 6), (5, 8)]);
        assert_eq!(store.best_known(2).unwrap(), vec![(5, 9)]);
        assert!(store.best_known(3).unwrap().is_empty());
    }
}
