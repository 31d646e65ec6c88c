//! External collaborators of the move/rename engine.
//!
//! The engine never owns the folder taxonomy, drive list, move ledger or undo-log
//! storage; it talks to them through these traits. `memory` holds in-process
//! implementations, `json_file` durable ones backed by small JSON documents.

mod json_file;
mod ledger;
mod memory;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::errors::Result;

pub use json_file::{FileKvStore, JsonLedger};
pub use memory::{MemoryKvStore, MemoryLedger, StaticDrives, StaticFolders};

pub(crate) use ledger::LedgerDoc;

/// Folder metadata resolved from the JD taxonomy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderInfo {
    /// JD id, e.g. "21.03".
    pub number: String,
    pub name: String,
    pub category_name: String,
    pub area_name: String,
}

/// A storage location that can hold a JD tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriveInfo {
    pub id: String,
    pub base_path: PathBuf,
    /// JD root inside the drive; relative values are joined onto `base_path`.
    pub jd_root_path: Option<PathBuf>,
}

impl DriveInfo {
    /// Directory every destination must stay inside.
    pub fn sandbox_root(&self) -> PathBuf {
        match &self.jd_root_path {
            Some(root) if root.is_absolute() => root.clone(),
            Some(root) => self.base_path.join(root),
            None => self.base_path.clone(),
        }
    }
}

pub trait FolderRepository: Send + Sync {
    fn resolve_folder(&self, folder_number: &str) -> Result<Option<FolderInfo>>;
}

pub trait DriveRepository: Send + Sync {
    fn default_drive(&self) -> Result<Option<DriveInfo>>;
    fn drive(&self, id: &str) -> Result<Option<DriveInfo>>;
}

/// Ledger record id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub u64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RecordId {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(RecordId)
            .map_err(|_| format!("invalid record id: '{s}'"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    Moved,
    Undone,
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RecordStatus::Moved => "moved",
            RecordStatus::Undone => "undone",
        })
    }
}

/// One organized file as tracked by the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizedFileRecord {
    pub id: RecordId,
    pub original_path: PathBuf,
    pub current_path: PathBuf,
    pub folder_number: String,
    pub status: RecordStatus,
    pub moved_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub trait MoveLedger: Send + Sync {
    /// Record a completed move. If a `moved` record already tracks `source` as its
    /// current location, that record follows the file instead of a new one being made.
    fn record_move(&self, source: &Path, dest: &Path, folder_number: &str) -> Result<RecordId>;

    fn update_status(&self, id: RecordId, status: RecordStatus) -> Result<()>;

    fn get_record(&self, id: RecordId) -> Result<Option<OrganizedFileRecord>>;

    /// All records, oldest first.
    fn list_records(&self) -> Result<Vec<OrganizedFileRecord>>;
}

/// Closure handed to `KeyValueStore::update`: receives the current value and
/// returns the new one, or `None` to leave the stored value untouched.
pub type KvUpdate<'a> = dyn FnMut(Option<Vec<u8>>) -> Result<Option<Vec<u8>>> + 'a;

/// Opaque durable key/value storage used for the rename undo log.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;
    fn set(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Read-modify-write of `key` with no other writer of the same store in between,
    /// in this process or another. `f` runs exactly once; its error aborts the write.
    fn update(&self, key: &str, f: &mut KvUpdate<'_>) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sandbox_root_prefers_jd_root() {
        let mut d = DriveInfo {
            id: "main".into(),
            base_path: PathBuf::from("/mnt/data"),
            jd_root_path: None,
        };
        assert_eq!(d.sandbox_root(), PathBuf::from("/mnt/data"));
        d.jd_root_path = Some(PathBuf::from("JD"));
        assert_eq!(d.sandbox_root(), PathBuf::from("/mnt/data/JD"));
        d.jd_root_path = Some(PathBuf::from("/srv/jd"));
        assert_eq!(d.sandbox_root(), PathBuf::from("/srv/jd"));
    }

    #[test]
    fn record_id_parses() {
        assert_eq!(" 42 ".parse::<RecordId>().unwrap(), RecordId(42));
        assert!("x".parse::<RecordId>().is_err());
    }

    #[test]
    fn status_serializes_lowercase() {
        let s = serde_json::to_string(&RecordStatus::Undone).unwrap();
        assert_eq!(s, "\"undone\"");
    }
}
