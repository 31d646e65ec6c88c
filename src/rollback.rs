//! Reversal of recorded moves.
//!
//! A rollback is refused unless all of these hold:
//! - the ledger record is in the `moved` state
//! - the file still exists at its current path
//! - the original path is free
//!
//! Reversal uses the same rename / cross-device fallback as a forward move and
//! never overwrites. A failed rollback leaves the record state unchanged.

use serde::Serialize;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::cancel::CancelToken;
use crate::errors::{OrganizeError, Result, io_err};
use crate::fs_ops::relocate;
use crate::mover::FileMover;
use crate::repo::{RecordId, RecordStatus};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RollbackFailure {
    pub record_id: RecordId,
    pub reason: String,
    pub kind: &'static str,
}

/// Result of a fail-soft batch rollback.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RollbackSummary {
    pub total: usize,
    pub success: usize,
    pub failed: usize,
    pub failures: Vec<RollbackFailure>,
    /// Set when the batch stopped early on a cancel request.
    pub cancelled: bool,
}

impl FileMover {
    /// Move a recorded file back to where it came from and mark the record `undone`.
    ///
    /// Returns the restored path.
    pub fn rollback(&self, id: RecordId) -> Result<PathBuf> {
        let fs = self.fs.as_ref();
        let record = self
            .ledger
            .get_record(id)?
            .ok_or_else(|| OrganizeError::NotFound(format!("ledger record {id}")))?;

        if record.status != RecordStatus::Moved {
            return Err(OrganizeError::InvalidState(format!(
                "record {id} is '{}', only 'moved' records can be rolled back",
                record.status
            )));
        }
        if !fs.exists(&record.current_path) {
            return Err(OrganizeError::missing_path(
                "file at recorded location",
                &record.current_path,
            ));
        }
        if fs.exists(&record.original_path) {
            return Err(OrganizeError::Conflict(format!(
                "original location already has a file: '{}'",
                record.original_path.display()
            )));
        }

        if let Some(parent) = record.original_path.parent()
            && !fs.exists(parent)
        {
            fs.create_dir_all(parent)
                .map_err(io_err("recreate original directory", parent))?;
        }

        relocate(
            fs,
            &record.current_path,
            &record.original_path,
            self.settings.preserve_metadata,
        )?;
        self.ledger.update_status(id, RecordStatus::Undone)?;

        info!(
            record = %id,
            from = %record.current_path.display(),
            to = %record.original_path.display(),
            "rolled back"
        );
        Ok(record.original_path)
    }

    /// Roll back `ids` in order, continuing past individual failures.
    ///
    /// `on_progress(done, total)` runs after every attempted item.
    pub fn batch_rollback<F>(
        &self,
        ids: &[RecordId],
        cancel: &CancelToken,
        mut on_progress: F,
    ) -> RollbackSummary
    where
        F: FnMut(usize, usize),
    {
        let total = ids.len();
        let mut summary = RollbackSummary {
            total,
            ..RollbackSummary::default()
        };

        for (i, &id) in ids.iter().enumerate() {
            if cancel.is_cancelled() {
                warn!(done = i, total, "rollback batch cancelled");
                summary.cancelled = true;
                break;
            }
            match self.rollback(id) {
                Ok(_) => summary.success += 1,
                Err(e) => {
                    warn!(record = %id, code = e.code(), kind = e.kind(), "rollback failed: {e}");
                    summary.failed += 1;
                    summary.failures.push(RollbackFailure {
                        record_id: id,
                        reason: e.to_string(),
                        kind: e.kind(),
                    });
                }
            }
            on_progress(i + 1, total);
        }

        info!(
            total,
            success = summary.success,
            failed = summary.failed,
            "rollback batch finished"
        );
        summary
    }
}
