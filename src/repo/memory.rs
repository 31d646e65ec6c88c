//! In-process implementations of the collaborator traits.
//! Used by tests, by embedders, and by the catalog built from the XML config.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use crate::errors::{OrganizeError, Result};

use super::{
    DriveInfo, DriveRepository, FolderInfo, FolderRepository, KeyValueStore, KvUpdate, LedgerDoc,
    MoveLedger, OrganizedFileRecord, RecordId, RecordStatus,
};

fn lock<T>(m: &Mutex<T>) -> Result<MutexGuard<'_, T>> {
    m.lock()
        .map_err(|_| OrganizeError::Store("in-memory store lock poisoned".into()))
}

/// Fixed folder catalog keyed by JD number.
#[derive(Debug, Default, Clone)]
pub struct StaticFolders {
    folders: HashMap<String, FolderInfo>,
}

impl StaticFolders {
    pub fn new(folders: impl IntoIterator<Item = FolderInfo>) -> Self {
        Self {
            folders: folders.into_iter().map(|f| (f.number.clone(), f)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.folders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.folders.is_empty()
    }
}

impl FolderRepository for StaticFolders {
    fn resolve_folder(&self, folder_number: &str) -> Result<Option<FolderInfo>> {
        Ok(self.folders.get(folder_number.trim()).cloned())
    }
}

/// Fixed drive list; the default is the flagged one, else the first.
#[derive(Debug, Default, Clone)]
pub struct StaticDrives {
    drives: Vec<DriveInfo>,
    default_id: Option<String>,
}

impl StaticDrives {
    pub fn new(drives: Vec<DriveInfo>, default_id: Option<String>) -> Self {
        Self { drives, default_id }
    }

    pub fn single(drive: DriveInfo) -> Self {
        Self::new(vec![drive], None)
    }
}

impl DriveRepository for StaticDrives {
    fn default_drive(&self) -> Result<Option<DriveInfo>> {
        let flagged = self
            .default_id
            .as_deref()
            .and_then(|id| self.drives.iter().find(|d| d.id == id));
        Ok(flagged.or_else(|| self.drives.first()).cloned())
    }

    fn drive(&self, id: &str) -> Result<Option<DriveInfo>> {
        Ok(self.drives.iter().find(|d| d.id == id).cloned())
    }
}

#[derive(Debug, Default)]
pub struct MemoryLedger {
    doc: Mutex<LedgerDoc>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MoveLedger for MemoryLedger {
    fn record_move(&self, source: &Path, dest: &Path, folder_number: &str) -> Result<RecordId> {
        Ok(lock(&self.doc)?.record_move(source, dest, folder_number))
    }

    fn update_status(&self, id: RecordId, status: RecordStatus) -> Result<()> {
        lock(&self.doc)?.set_status(id, status)
    }

    fn get_record(&self, id: RecordId) -> Result<Option<OrganizedFileRecord>> {
        Ok(lock(&self.doc)?.get(id))
    }

    fn list_records(&self) -> Result<Vec<OrganizedFileRecord>> {
        Ok(lock(&self.doc)?.all())
    }
}

#[derive(Debug, Default)]
pub struct MemoryKvStore {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryKvStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(lock(&self.entries)?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        lock(&self.entries)?.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn update(&self, key: &str, f: &mut KvUpdate<'_>) -> Result<()> {
        let mut entries = lock(&self.entries)?;
        if let Some(next) = f(entries.get(key).cloned())? {
            entries.insert(key.to_string(), next);
        }
        Ok(())
    }
}
