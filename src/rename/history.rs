//! Capped undo log for batch renames, kept as one blob in a `KeyValueStore`.
//!
//! Entries are keyed by UUIDv7 strings, which sort by creation time, so the
//! most recent batch is the max key and pruning drops the smallest keys.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;
use uuid::Uuid;

use crate::errors::{OrganizeError, Result};
use crate::repo::KeyValueStore;

/// Store key holding the whole log.
pub const UNDO_LOG_KEY: &str = "rename_undo_log";

/// Batches kept when no limit is configured.
pub const DEFAULT_HISTORY_LIMIT: usize = 10;

/// One reversible rename.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UndoLogEntry {
    pub original_path: PathBuf,
    pub renamed_path: PathBuf,
    pub original_name: String,
    pub new_name: String,
}

/// All renames of one executed batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UndoRecord {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub entries: Vec<UndoLogEntry>,
}

type UndoLog = BTreeMap<String, UndoRecord>;

pub struct RenameHistory {
    store: Arc<dyn KeyValueStore>,
    limit: usize,
    // Serializes read-modify-write of the blob within this process.
    guard: Mutex<()>,
}

impl RenameHistory {
    pub fn new(store: Arc<dyn KeyValueStore>, limit: usize) -> Self {
        Self {
            store,
            limit: limit.max(1),
            guard: Mutex::new(()),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Persist a batch under a fresh id, pruning the oldest batches over the cap.
    pub fn save(&self, entries: Vec<UndoLogEntry>) -> Result<String> {
        let id = Uuid::now_v7().to_string();
        let limit = self.limit;
        let record = UndoRecord {
            id: id.clone(),
            created_at: Utc::now(),
            entries,
        };
        self.modify(move |log| {
            log.insert(record.id.clone(), record);
            while log.len() > limit {
                if let Some((old, _)) = log.pop_first() {
                    debug!(undo_id = %old, "pruned undo log entry");
                }
            }
            ((), true)
        })?;
        Ok(id)
    }

    pub fn get(&self, id: &str) -> Result<Option<UndoRecord>> {
        let _g = self.lock()?;
        Ok(self.load()?.remove(id))
    }

    /// Delete a batch; returns whether it existed.
    pub fn remove(&self, id: &str) -> Result<bool> {
        self.modify(|log| {
            let existed = log.remove(id).is_some();
            (existed, existed)
        })
    }

    /// Keep only `remaining` under `id`, dropping the batch when nothing is left.
    /// Returns true when the batch is gone.
    pub fn retain_entries(&self, id: &str, remaining: Vec<UndoLogEntry>) -> Result<bool> {
        self.modify(|log| {
            if remaining.is_empty() {
                log.remove(id);
                return (true, true);
            }
            match log.get_mut(id) {
                Some(rec) => {
                    rec.entries = remaining;
                    (false, true)
                }
                None => (true, false),
            }
        })
    }

    /// All batches, newest first.
    pub fn list(&self) -> Result<Vec<UndoRecord>> {
        let _g = self.lock()?;
        Ok(self.load()?.into_values().rev().collect())
    }

    pub fn latest(&self) -> Result<Option<UndoRecord>> {
        let _g = self.lock()?;
        Ok(self.load()?.pop_last().map(|(_, r)| r))
    }

    fn lock(&self) -> Result<MutexGuard<'_, ()>> {
        self.guard
            .lock()
            .map_err(|_| OrganizeError::Store("undo log lock poisoned".into()))
    }

    fn load(&self) -> Result<UndoLog> {
        decode_log(self.store.get(UNDO_LOG_KEY)?)
    }

    /// Apply `f` to the stored log as one store-level update. `f` returns its
    /// output and whether the log changed.
    fn modify<T>(&self, f: impl FnOnce(&mut UndoLog) -> (T, bool)) -> Result<T> {
        let _g = self.lock()?;
        let mut f = Some(f);
        let mut out = None;
        self.store.update(UNDO_LOG_KEY, &mut |current| {
            let apply = f
                .take()
                .ok_or_else(|| OrganizeError::Store("undo log update ran twice".into()))?;
            let mut log = decode_log(current)?;
            let (value, changed) = apply(&mut log);
            out = Some(value);
            if changed { encode_log(&log).map(Some) } else { Ok(None) }
        })?;
        out.ok_or_else(|| OrganizeError::Store("undo log update did not run".into()))
    }
}

fn decode_log(bytes: Option<Vec<u8>>) -> Result<UndoLog> {
    match bytes {
        None => Ok(UndoLog::new()),
        Some(bytes) if bytes.is_empty() => Ok(UndoLog::new()),
        Some(bytes) => serde_json::from_slice(&bytes)
            .map_err(|e| OrganizeError::Store(format!("corrupt undo log: {e}"))),
    }
}

fn encode_log(log: &UndoLog) -> Result<Vec<u8>> {
    serde_json::to_vec(log).map_err(|e| OrganizeError::Store(format!("serialize undo log: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repo::{FileKvStore, MemoryKvStore};

    fn entry(n: usize) -> UndoLogEntry {
        UndoLogEntry {
            original_path: PathBuf::from(format!("/d/a{n}.txt")),
            renamed_path: PathBuf::from(format!("/d/b{n}.txt")),
            original_name: format!("a{n}.txt"),
            new_name: format!("b{n}.txt"),
        }
    }

    #[test]
    fn save_get_remove() {
        let h = RenameHistory::new(Arc::new(MemoryKvStore::new()), 10);
        let id = h.save(vec![entry(0)]).unwrap();
        let rec = h.get(&id).unwrap().unwrap();
        assert_eq!(rec.entries, vec![entry(0)]);
        assert!(h.remove(&id).unwrap());
        assert!(!h.remove(&id).unwrap());
        assert!(h.get(&id).unwrap().is_none());
    }

    #[test]
    fn keeps_most_recent_n() {
        let h = RenameHistory::new(Arc::new(MemoryKvStore::new()), 3);
        let ids: Vec<String> = (0..5).map(|i| h.save(vec![entry(i)]).unwrap()).collect();
        let listed: Vec<String> = h.list().unwrap().into_iter().map(|r| r.id).collect();
        assert_eq!(listed, vec![ids[4].clone(), ids[3].clone(), ids[2].clone()]);
        assert_eq!(h.latest().unwrap().unwrap().id, ids[4]);
        assert!(h.get(&ids[0]).unwrap().is_none());
    }

    #[test]
    fn retain_entries_shrinks_then_drops_batch() {
        let h = RenameHistory::new(Arc::new(MemoryKvStore::new()), 10);
        let id = h.save(vec![entry(0), entry(1)]).unwrap();
        assert!(!h.retain_entries(&id, vec![entry(1)]).unwrap());
        assert_eq!(h.get(&id).unwrap().unwrap().entries, vec![entry(1)]);
        assert!(h.retain_entries(&id, Vec::new()).unwrap());
        assert!(h.get(&id).unwrap().is_none());
    }

    #[test]
    fn saves_from_separate_histories_on_one_store_all_survive() {
        let td = tempfile::tempdir().unwrap();
        let dir = td.path().to_path_buf();
        let workers: Vec<_> = (0..4)
            .map(|_| {
                let h = RenameHistory::new(Arc::new(FileKvStore::new(&dir)), 1000);
                std::thread::spawn(move || {
                    (0..25)
                        .map(|i| h.save(vec![entry(i)]).unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        let ids: Vec<String> = workers.into_iter().flat_map(|w| w.join().unwrap()).collect();

        let h = RenameHistory::new(Arc::new(FileKvStore::new(&dir)), 1000);
        assert_eq!(h.list().unwrap().len(), 100);
        for id in &ids {
            assert!(h.get(id).unwrap().is_some(), "batch {id} was lost");
        }
    }

    #[test]
    fn corrupt_blob_is_store_error() {
        let kv = Arc::new(MemoryKvStore::new());
        kv.set(UNDO_LOG_KEY, b"not json").unwrap();
        let h = RenameHistory::new(kv, 10);
        assert!(matches!(h.list(), Err(OrganizeError::Store(_))));
    }
}
