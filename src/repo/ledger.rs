//! In-memory ledger document shared by the memory and JSON-file ledgers.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::errors::{OrganizeError, Result};

use super::{OrganizedFileRecord, RecordId, RecordStatus};

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub(crate) struct LedgerDoc {
    next_id: u64,
    records: Vec<OrganizedFileRecord>,
}

impl LedgerDoc {
    pub(crate) fn record_move(&mut self, source: &Path, dest: &Path, folder_number: &str) -> RecordId {
        let now = Utc::now();
        if let Some(existing) = self
            .records
            .iter_mut()
            .find(|r| r.status == RecordStatus::Moved && r.current_path == source)
        {
            existing.current_path = dest.to_path_buf();
            existing.folder_number = folder_number.to_string();
            existing.updated_at = now;
            return existing.id;
        }

        self.next_id += 1;
        let id = RecordId(self.next_id);
        self.records.push(OrganizedFileRecord {
            id,
            original_path: source.to_path_buf(),
            current_path: dest.to_path_buf(),
            folder_number: folder_number.to_string(),
            status: RecordStatus::Moved,
            moved_at: now,
            updated_at: now,
        });
        id
    }

    pub(crate) fn set_status(&mut self, id: RecordId, status: RecordStatus) -> Result<()> {
        let rec = self
            .records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| OrganizeError::NotFound(format!("ledger record {id}")))?;
        rec.status = status;
        rec.updated_at = Utc::now();
        Ok(())
    }

    pub(crate) fn get(&self, id: RecordId) -> Option<OrganizedFileRecord> {
        self.records.iter().find(|r| r.id == id).cloned()
    }

    pub(crate) fn all(&self) -> Vec<OrganizedFileRecord> {
        self.records.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn ids_increase() {
        let mut doc = LedgerDoc::default();
        let a = doc.record_move(Path::new("/in/a"), Path::new("/jd/a"), "11.01");
        let b = doc.record_move(Path::new("/in/b"), Path::new("/jd/b"), "11.01");
        assert!(b > a);
    }

    #[test]
    fn moving_a_tracked_file_again_updates_its_record() {
        let mut doc = LedgerDoc::default();
        let id = doc.record_move(Path::new("/in/a"), Path::new("/jd/11.01/a"), "11.01");
        let again = doc.record_move(Path::new("/jd/11.01/a"), Path::new("/jd/12.04/a"), "12.04");
        assert_eq!(id, again);
        let rec = doc.get(id).unwrap();
        assert_eq!(rec.original_path, PathBuf::from("/in/a"));
        assert_eq!(rec.current_path, PathBuf::from("/jd/12.04/a"));
        assert_eq!(rec.folder_number, "12.04");
    }

    #[test]
    fn undone_records_are_not_reused() {
        let mut doc = LedgerDoc::default();
        let id = doc.record_move(Path::new("/in/a"), Path::new("/jd/a"), "11.01");
        doc.set_status(id, RecordStatus::Undone).unwrap();
        let next = doc.record_move(Path::new("/jd/a"), Path::new("/jd/b"), "11.02");
        assert_ne!(id, next);
    }

    #[test]
    fn unknown_id_is_not_found() {
        let mut doc = LedgerDoc::default();
        let err = doc.set_status(RecordId(9), RecordStatus::Undone).unwrap_err();
        assert_eq!(err.kind(), "not_found");
    }
}
