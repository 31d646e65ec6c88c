//! Rename previews with conflict classification.
//!
//! Candidate names and on-disk checks run in parallel; duplicate detection is a
//! single ordered pass afterwards, so the first item claiming a name always wins.

use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use super::options::RenameRules;
use super::pattern::generate_new_name;
use crate::fs_ops::FileSystem;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RenameConflict {
    /// An earlier item in the same batch maps to the same name (case-insensitive).
    Duplicate,
    /// Something else already exists at the new path.
    Exists,
}

impl fmt::Display for RenameConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RenameConflict::Duplicate => "duplicate",
            RenameConflict::Exists => "exists",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenamePreviewItem {
    pub original_path: PathBuf,
    pub original_name: String,
    pub new_name: String,
    pub new_path: PathBuf,
    pub will_change: bool,
    pub conflict: Option<RenameConflict>,
}

impl RenamePreviewItem {
    /// Changes and has no conflict.
    pub fn is_actionable(&self) -> bool {
        self.will_change && self.conflict.is_none()
    }
}

/// Build a preview for `files`, in input order; each file's index feeds the counter.
pub fn generate_preview(
    fs: &dyn FileSystem,
    files: &[PathBuf],
    rules: &RenameRules,
) -> Vec<RenamePreviewItem> {
    let candidates: Vec<(RenamePreviewItem, bool)> = files
        .par_iter()
        .enumerate()
        .map(|(index, path)| {
            let original_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let new_name = generate_new_name(&original_name, rules, index);
            let new_path = path.with_file_name(&new_name);
            let occupied = new_path != *path
                && fs.exists(&new_path)
                && !is_same_entry(fs, path, &new_path);
            let item = RenamePreviewItem {
                will_change: new_name != original_name,
                original_path: path.clone(),
                original_name,
                new_name,
                new_path,
                conflict: None,
            };
            (item, occupied)
        })
        .collect();

    let mut claimed: HashSet<String> = HashSet::with_capacity(candidates.len());
    candidates
        .into_iter()
        .map(|(mut item, occupied)| {
            let key = item.new_path.to_string_lossy().to_lowercase();
            if !claimed.insert(key) {
                item.conflict = Some(RenameConflict::Duplicate);
            } else if occupied {
                item.conflict = Some(RenameConflict::Exists);
            }
            item
        })
        .collect()
}

/// True when `new` is just a case variant of `original` that resolves to the same
/// file (a case-only rename on a case-insensitive filesystem).
pub(crate) fn is_same_entry(fs: &dyn FileSystem, original: &Path, new: &Path) -> bool {
    let a = original.to_string_lossy();
    let b = new.to_string_lossy();
    if a.to_lowercase() != b.to_lowercase() {
        return false;
    }
    match (fs.canonicalize(original), fs.canonicalize(new)) {
        (Ok(x), Ok(y)) => x == y,
        _ => false,
    }
}
