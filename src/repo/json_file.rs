//! Durable JSON-file implementations of the ledger and key/value store.
//!
//! Design:
//! - Each document is rewritten whole via temp file + fsync + rename.
//! - An advisory lock on a sidecar `<file>.lock` (fs2) serializes writers across
//!   processes, so concurrent CLI invocations cannot interleave read-modify-write.
//! - A missing document reads as empty.

use fs2::FileExt;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use tracing::trace;

use crate::errors::{OrganizeError, Result};
use crate::fs_ops::describe_io_error;
use crate::platform::atomic_write_private;
use crate::sanitize::sanitize_filename;

use super::{
    KeyValueStore, KvUpdate, LedgerDoc, MoveLedger, OrganizedFileRecord, RecordId, RecordStatus,
};

fn store_err(op: &str, path: &Path, e: io::Error) -> OrganizeError {
    OrganizeError::Store(describe_io_error(op, path, &e))
}

/// Exclusive advisory lock held for the lifetime of the guard.
struct FileLock {
    file: File,
}

impl FileLock {
    fn acquire(target: &Path) -> Result<Self> {
        let mut name = target.as_os_str().to_os_string();
        name.push(".lock");
        let lock_path = PathBuf::from(name);
        if let Some(parent) = lock_path.parent() {
            fs::create_dir_all(parent).map_err(|e| store_err("create store dir", parent, e))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .map_err(|e| store_err("open lock file", &lock_path, e))?;
        file.lock_exclusive()
            .map_err(|e| store_err("lock", &lock_path, e))?;
        trace!(path = %lock_path.display(), "store lock acquired");
        Ok(Self { file })
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

fn read_json<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    match fs::read(path) {
        Ok(bytes) if bytes.is_empty() => Ok(T::default()),
        Ok(bytes) => serde_json::from_slice(&bytes)
            .map_err(|e| OrganizeError::Store(format!("parse '{}': {e}", path.display()))),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(T::default()),
        Err(e) => Err(store_err("read", path, e)),
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(value)
        .map_err(|e| OrganizeError::Store(format!("serialize '{}': {e}", path.display())))?;
    atomic_write_private(path, &bytes).map_err(|e| store_err("write", path, e))
}

/// Move ledger persisted as a single JSON document.
#[derive(Debug, Clone)]
pub struct JsonLedger {
    path: PathBuf,
}

impl JsonLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<LedgerDoc> {
        let _lock = FileLock::acquire(&self.path)?;
        read_json(&self.path)
    }

    fn update<T>(&self, f: impl FnOnce(&mut LedgerDoc) -> Result<T>) -> Result<T> {
        let _lock = FileLock::acquire(&self.path)?;
        let mut doc: LedgerDoc = read_json(&self.path)?;
        let out = f(&mut doc)?;
        write_json(&self.path, &doc)?;
        Ok(out)
    }
}

impl MoveLedger for JsonLedger {
    fn record_move(&self, source: &Path, dest: &Path, folder_number: &str) -> Result<RecordId> {
        self.update(|doc| Ok(doc.record_move(source, dest, folder_number)))
    }

    fn update_status(&self, id: RecordId, status: RecordStatus) -> Result<()> {
        self.update(|doc| doc.set_status(id, status))
    }

    fn get_record(&self, id: RecordId) -> Result<Option<OrganizedFileRecord>> {
        Ok(self.read()?.get(id))
    }

    fn list_records(&self) -> Result<Vec<OrganizedFileRecord>> {
        Ok(self.read()?.all())
    }
}

/// Key/value store keeping one file per key under `dir`.
#[derive(Debug, Clone)]
pub struct FileKvStore {
    dir: PathBuf,
}

impl FileKvStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", sanitize_filename(key)))
    }
}

impl KeyValueStore for FileKvStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.key_path(key);
        let _lock = FileLock::acquire(&path)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(store_err("read", &path, e)),
        }
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        let path = self.key_path(key);
        let _lock = FileLock::acquire(&path)?;
        atomic_write_private(&path, value).map_err(|e| store_err("write", &path, e))
    }

    fn update(&self, key: &str, f: &mut KvUpdate<'_>) -> Result<()> {
        let path = self.key_path(key);
        // Held across read and write so concurrent updaters queue up.
        let _lock = FileLock::acquire(&path)?;
        let current = match fs::read(&path) {
            Ok(bytes) => Some(bytes),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => return Err(store_err("read", &path, e)),
        };
        match f(current)? {
            Some(next) => atomic_write_private(&path, &next).map_err(|e| store_err("write", &path, e)),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn ledger_persists_across_instances() {
        let td = tempdir().unwrap();
        let path = td.path().join("ledger.json");
        let id = JsonLedger::new(&path)
            .record_move(Path::new("/in/a.txt"), Path::new("/jd/a.txt"), "11.01")
            .unwrap();

        let reopened = JsonLedger::new(&path);
        let rec = reopened.get_record(id).unwrap().unwrap();
        assert_eq!(rec.status, RecordStatus::Moved);
        assert_eq!(rec.current_path, PathBuf::from("/jd/a.txt"));

        reopened.update_status(id, RecordStatus::Undone).unwrap();
        let rec = JsonLedger::new(&path).get_record(id).unwrap().unwrap();
        assert_eq!(rec.status, RecordStatus::Undone);
    }

    #[test]
    fn missing_ledger_is_empty() {
        let td = tempdir().unwrap();
        let ledger = JsonLedger::new(td.path().join("none.json"));
        assert!(ledger.list_records().unwrap().is_empty());
        assert!(ledger.get_record(RecordId(1)).unwrap().is_none());
    }

    #[test]
    fn corrupt_ledger_is_a_store_error() {
        let td = tempdir().unwrap();
        let path = td.path().join("ledger.json");
        fs::write(&path, b"{not json").unwrap();
        let err = JsonLedger::new(&path).list_records().unwrap_err();
        assert_eq!(err.kind(), "store");
    }

    #[test]
    fn kv_store_roundtrip_and_key_sanitizing() {
        let td = tempdir().unwrap();
        let kv = FileKvStore::new(td.path());
        assert!(kv.get("rename/undo").unwrap().is_none());
        kv.set("rename/undo", b"[]").unwrap();
        assert_eq!(kv.get("rename/undo").unwrap().unwrap(), b"[]");
        assert!(td.path().join("renameundo.json").exists());
    }

    #[test]
    fn kv_updates_from_separate_handles_do_not_lose_writes() {
        let td = tempdir().unwrap();
        let dir = td.path().to_path_buf();
        let workers: Vec<_> = (0..4)
            .map(|_| {
                let kv = FileKvStore::new(&dir);
                std::thread::spawn(move || {
                    for _ in 0..25 {
                        kv.update("counter", &mut |cur| {
                            let n: u32 = cur
                                .map(|b| String::from_utf8(b).unwrap().parse().unwrap())
                                .unwrap_or(0);
                            Ok(Some((n + 1).to_string().into_bytes()))
                        })
                        .unwrap();
                    }
                })
            })
            .collect();
        for w in workers {
            w.join().unwrap();
        }
        let total = FileKvStore::new(&dir).get("counter").unwrap().unwrap();
        assert_eq!(String::from_utf8(total).unwrap(), "100");
    }
}
