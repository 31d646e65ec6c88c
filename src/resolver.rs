//! Destination directory resolution with sandbox containment.
//!
//! Layout under the drive's sandbox root:
//!   <area name>/<category name>/<folder number> <folder name>/
//!
//! Every segment is sanitized, then the joined path is canonicalized and must be
//! a strict descendant of the canonical root. The re-check is mandatory: a
//! symlinked area or category directory can escape even when every segment is clean.

use serde::Serialize;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, error};

use crate::errors::{OrganizeError, Result, io_err};
use crate::fs_ops::FileSystem;
use crate::repo::{DriveInfo, DriveRepository, FolderInfo, FolderRepository};
use crate::sanitize::sanitize_segment;

/// Where a file for a given folder should go.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedDestination {
    /// Canonical sandbox root of the drive.
    pub base_path: PathBuf,
    pub folder: FolderInfo,
    /// Canonical destination directory, always strictly inside `base_path`.
    pub destination_dir: PathBuf,
}

pub struct PathResolver<'a> {
    folders: &'a dyn FolderRepository,
    drives: &'a dyn DriveRepository,
    fs: &'a dyn FileSystem,
}

impl<'a> PathResolver<'a> {
    pub fn new(
        folders: &'a dyn FolderRepository,
        drives: &'a dyn DriveRepository,
        fs: &'a dyn FileSystem,
    ) -> Self {
        Self { folders, drives, fs }
    }

    /// Resolve and create the destination directory for `folder_number`.
    pub fn resolve(&self, folder_number: &str, drive_id: Option<&str>) -> Result<ResolvedDestination> {
        self.resolve_with(folder_number, drive_id, true)
    }

    /// Resolve without touching the filesystem (dry run). Containment is still verified.
    pub fn plan(&self, folder_number: &str, drive_id: Option<&str>) -> Result<ResolvedDestination> {
        self.resolve_with(folder_number, drive_id, false)
    }

    fn resolve_with(
        &self,
        folder_number: &str,
        drive_id: Option<&str>,
        create: bool,
    ) -> Result<ResolvedDestination> {
        let folder = self
            .folders
            .resolve_folder(folder_number)?
            .ok_or_else(|| OrganizeError::NotFound(format!("folder '{folder_number}'")))?;
        let drive = self.pick_drive(drive_id)?;

        if !self.fs.is_dir(&drive.base_path) {
            return Err(OrganizeError::Configuration(format!(
                "drive '{}' base directory '{}' is not available",
                drive.id,
                drive.base_path.display()
            )));
        }
        let root = drive.sandbox_root();
        if create && !self.fs.exists(&root) {
            self.fs
                .create_dir_all(&root)
                .map_err(io_err("create JD root", &root))?;
        }

        let joined = root
            .join(sanitize_segment(&folder.area_name))
            .join(sanitize_segment(&folder.category_name))
            .join(sanitize_segment(&format!("{} {}", folder.number, folder.name)));

        if create {
            self.fs
                .create_dir_all(&joined)
                .map_err(io_err("create destination directory", &joined))?;
        }

        let base_path = self.canonical_or_planned(&root)?;
        let destination_dir = self.canonical_or_planned(&joined)?;
        ensure_contained(&base_path, &destination_dir)?;

        debug!(folder = %folder.number, dest = %destination_dir.display(), "resolved destination");
        Ok(ResolvedDestination {
            base_path,
            folder,
            destination_dir,
        })
    }

    fn pick_drive(&self, drive_id: Option<&str>) -> Result<DriveInfo> {
        match drive_id {
            Some(id) => self
                .drives
                .drive(id)?
                .ok_or_else(|| OrganizeError::NotFound(format!("drive '{id}'"))),
            None => self.drives.default_drive()?.ok_or_else(|| {
                OrganizeError::Configuration("no drive is configured or available".into())
            }),
        }
    }

    /// Canonicalize `path`; for not-yet-existing tails, canonicalize the deepest
    /// existing ancestor and append the remaining (already sanitized) components.
    fn canonical_or_planned(&self, path: &Path) -> Result<PathBuf> {
        let mut existing = path;
        let mut tail: Vec<&std::ffi::OsStr> = Vec::new();
        while !self.fs.exists(existing) {
            match (existing.file_name(), existing.parent()) {
                (Some(name), Some(parent)) => {
                    tail.push(name);
                    existing = parent;
                }
                _ => break,
            }
        }
        let mut out = self
            .fs
            .canonicalize(existing)
            .map_err(io_err("canonicalize", existing))?;
        for name in tail.into_iter().rev() {
            out.push(name);
        }
        Ok(out)
    }
}

/// `dest` must be a strict descendant of `base` with no parent references.
pub fn ensure_contained(base: &Path, dest: &Path) -> Result<()> {
    let has_parent_ref = dest.components().any(|c| matches!(c, Component::ParentDir));
    if has_parent_ref || dest == base || !dest.starts_with(base) {
        error!(base = %base.display(), dest = %dest.display(), "destination escapes base directory");
        return Err(OrganizeError::Security(format!(
            "destination escapes base directory: '{}' is not inside '{}'",
            dest.display(),
            base.display()
        )));
    }
    Ok(())
}
