//! Pattern-based bulk rename within each file's own directory.
//!
//! Flow: `RenameOptions` -> `RenameRules` (validated) -> preview -> execute -> undo.
//! `RenameEngine` bundles the filesystem and undo history for callers that
//! do not want to pass them around.

mod execute;
mod history;
mod options;
mod pattern;
mod preview;

use std::path::PathBuf;
use std::sync::Arc;

use crate::cancel::CancelToken;
use crate::errors::{OrganizeError, Result};
use crate::fs_ops::{FileSystem, StdFileSystem};
use crate::repo::KeyValueStore;

pub use execute::{
    BatchRenameResult, RenameItemError, UndoRenameResult, execute_batch_rename, undo_batch_rename,
};
pub use history::{DEFAULT_HISTORY_LIMIT, RenameHistory, UNDO_LOG_KEY, UndoLogEntry, UndoRecord};
pub use options::{
    CaseTransform, FindReplace, MAX_NUMBER_DIGITS, NumberPosition, Numbering, RenameOptions,
    RenameRules,
};
pub use pattern::generate_new_name;
pub use preview::{RenameConflict, RenamePreviewItem, generate_preview};

pub struct RenameEngine {
    fs: Arc<dyn FileSystem>,
    history: RenameHistory,
}

impl RenameEngine {
    pub fn new(store: Arc<dyn KeyValueStore>, history_limit: usize) -> Self {
        Self {
            fs: Arc::new(StdFileSystem),
            history: RenameHistory::new(store, history_limit),
        }
    }

    pub fn with_fs(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = fs;
        self
    }

    pub fn history(&self) -> &RenameHistory {
        &self.history
    }

    pub fn preview(&self, files: &[PathBuf], rules: &RenameRules) -> Vec<RenamePreviewItem> {
        generate_preview(self.fs.as_ref(), files, rules)
    }

    pub fn execute<F>(
        &self,
        preview: &[RenamePreviewItem],
        cancel: &CancelToken,
        on_progress: F,
    ) -> Result<BatchRenameResult>
    where
        F: FnMut(usize, usize),
    {
        execute_batch_rename(self.fs.as_ref(), &self.history, preview, cancel, on_progress)
    }

    pub fn undo<F>(&self, undo_id: &str, cancel: &CancelToken, on_progress: F) -> Result<UndoRenameResult>
    where
        F: FnMut(usize, usize),
    {
        undo_batch_rename(self.fs.as_ref(), &self.history, undo_id, cancel, on_progress)
    }

    /// Undo the most recent batch.
    pub fn undo_latest<F>(&self, cancel: &CancelToken, on_progress: F) -> Result<UndoRenameResult>
    where
        F: FnMut(usize, usize),
    {
        let latest = self
            .history
            .latest()?
            .ok_or_else(|| OrganizeError::NotFound("no rename batch to undo".into()))?;
        self.undo(&latest.id, cancel, on_progress)
    }
}
