//! Executing a previewed batch rename and undoing it.
//!
//! Destinations are re-checked right before each rename; a path that became
//! occupied after the preview is a per-item error, never an overwrite.

use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use super::history::{RenameHistory, UndoLogEntry};
use super::preview::{RenamePreviewItem, is_same_entry};
use crate::cancel::CancelToken;
use crate::errors::{OrganizeError, Result};
use crate::fs_ops::FileSystem;

/// Why one file was not renamed (or restored).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenameItemError {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchRenameResult {
    /// No item failed.
    pub success: bool,
    /// Files renamed.
    pub count: usize,
    /// Files attempted (changing, conflict-free preview items).
    pub total: usize,
    pub errors: Vec<RenameItemError>,
    /// Undo log id; only set when at least one file was renamed.
    pub undo_id: Option<String>,
    pub cancelled: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UndoRenameResult {
    pub success: bool,
    /// Files restored.
    pub count: usize,
    pub total: usize,
    pub errors: Vec<RenameItemError>,
    /// The undo log entry was deleted (every file restored).
    pub log_removed: bool,
    pub cancelled: bool,
}

fn item_error(path: &Path, reason: impl Into<String>) -> RenameItemError {
    RenameItemError {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}

/// Occupied by something other than `from` itself.
fn occupied(fs: &dyn FileSystem, from: &Path, to: &Path) -> bool {
    fs.exists(to) && !is_same_entry(fs, from, to)
}

/// Rename every actionable preview item in order and log the batch for undo.
pub fn execute_batch_rename<F>(
    fs: &dyn FileSystem,
    history: &RenameHistory,
    preview: &[RenamePreviewItem],
    cancel: &CancelToken,
    mut on_progress: F,
) -> Result<BatchRenameResult>
where
    F: FnMut(usize, usize),
{
    let work: Vec<&RenamePreviewItem> = preview.iter().filter(|i| i.is_actionable()).collect();
    let total = work.len();
    let mut errors = Vec::new();
    let mut done: Vec<UndoLogEntry> = Vec::with_capacity(total);
    let mut cancelled = false;

    for (i, item) in work.iter().enumerate() {
        if cancel.is_cancelled() {
            warn!(done = i, total, "rename batch cancelled");
            cancelled = true;
            break;
        }
        let from = &item.original_path;
        let to = &item.new_path;

        if !fs.exists(from) {
            errors.push(item_error(from, "source file no longer exists"));
        } else if occupied(fs, from, to) {
            errors.push(item_error(
                from,
                format!("destination already exists: '{}'", to.display()),
            ));
        } else {
            match fs.rename(from, to) {
                Ok(()) => {
                    info!(from = %from.display(), to = %to.display(), "renamed");
                    done.push(UndoLogEntry {
                        original_path: from.clone(),
                        renamed_path: to.clone(),
                        original_name: item.original_name.clone(),
                        new_name: item.new_name.clone(),
                    });
                }
                Err(e) => {
                    let e = OrganizeError::io("rename", from, e);
                    warn!(code = e.code(), "rename failed: {e}");
                    errors.push(item_error(from, e.to_string()));
                }
            }
        }
        on_progress(i + 1, total);
    }

    let count = done.len();
    let undo_id = if done.is_empty() {
        None
    } else {
        let pairs: Vec<(PathBuf, PathBuf)> = done
            .iter()
            .map(|d| (d.original_path.clone(), d.renamed_path.clone()))
            .collect();
        let id = history.save(done).map_err(|e| {
            error!("{count} files renamed but the undo log could not be saved: {e}");
            for (from, to) in &pairs {
                error!(from = %from.display(), to = %to.display(), "rename not recorded for undo");
            }
            e
        })?;
        Some(id)
    };

    info!(count, total, errors = errors.len(), undo_id = ?undo_id, "rename batch finished");
    Ok(BatchRenameResult {
        success: errors.is_empty(),
        count,
        total,
        errors,
        undo_id,
        cancelled,
    })
}

/// Reverse a logged batch, newest rename first.
///
/// Restored entries are dropped from the log as the batch ends, so a retry after
/// fixing the reported problems only replays what is left. The log entry is
/// deleted once nothing is left.
pub fn undo_batch_rename<F>(
    fs: &dyn FileSystem,
    history: &RenameHistory,
    undo_id: &str,
    cancel: &CancelToken,
    mut on_progress: F,
) -> Result<UndoRenameResult>
where
    F: FnMut(usize, usize),
{
    let record = history
        .get(undo_id)?
        .ok_or_else(|| OrganizeError::NotFound(format!("undo log entry '{undo_id}'")))?;

    let total = record.entries.len();
    let mut result = UndoRenameResult {
        total,
        ..UndoRenameResult::default()
    };
    let mut restored = vec![false; total];

    for (i, (idx, entry)) in record.entries.iter().enumerate().rev().enumerate() {
        if cancel.is_cancelled() {
            warn!(done = i, total, "undo cancelled");
            result.cancelled = true;
            break;
        }
        let from = &entry.renamed_path;
        let to = &entry.original_path;

        if !fs.exists(from) {
            result.errors.push(item_error(from, "renamed file no longer exists"));
        } else if occupied(fs, from, to) {
            result.errors.push(item_error(
                from,
                format!("original location already has a file: '{}'", to.display()),
            ));
        } else {
            match fs.rename(from, to) {
                Ok(()) => {
                    result.count += 1;
                    restored[idx] = true;
                }
                Err(e) => {
                    let e = OrganizeError::io("rename", from, e);
                    result.errors.push(item_error(from, e.to_string()));
                }
            }
        }
        on_progress(i + 1, total);
    }

    result.success = result.errors.is_empty() && !result.cancelled;
    if result.count > 0 || result.success {
        let remaining: Vec<UndoLogEntry> = record
            .entries
            .into_iter()
            .zip(restored)
            .filter_map(|(entry, done)| (!done).then_some(entry))
            .collect();
        let left = remaining.len();
        result.log_removed = history.retain_entries(undo_id, remaining)?;
        if !result.log_removed {
            warn!(undo_id, left, "undo incomplete; keeping the unrestored entries for retry");
        }
    }
    info!(undo_id, restored = result.count, total, "undo finished");
    Ok(result)
}
