//! Conflict resolution and single-file move execution.
//!
//! A move goes through these steps:
//! - the source must exist and be a regular file
//! - the destination directory comes from `PathResolver` (sandboxed)
//! - an occupied destination is handled by the request's `ConflictStrategy`
//! - the file is relocated (rename, or copy + verify + delete across devices)
//! - the move is recorded in the ledger
//!
//! A skipped move is a normal outcome and never touches the filesystem.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::errors::{OrganizeError, Result, io_err};
use crate::fs_ops::{FileSystem, Relocation, StdFileSystem, relocate};
use crate::naming::{DEFAULT_MAX_ATTEMPTS, unique_name};
use crate::repo::{DriveRepository, FolderRepository, MoveLedger, RecordId};
use crate::resolver::PathResolver;
use crate::sanitize::sanitize_filename;

/// What to do when the destination file already exists.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ConflictStrategy {
    /// Leave both files alone and report the move as skipped.
    Skip,
    /// Pick a free `name_N.ext` variant.
    #[default]
    Rename,
    /// Replace the existing destination file.
    Overwrite,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRequest {
    pub source: PathBuf,
    /// JD folder id, e.g. "21.03".
    pub folder_number: String,
    #[serde(default)]
    pub conflict: ConflictStrategy,
    #[serde(default)]
    pub drive_id: Option<String>,
}

impl MoveRequest {
    pub fn new(source: impl Into<PathBuf>, folder_number: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            folder_number: folder_number.into(),
            conflict: ConflictStrategy::default(),
            drive_id: None,
        }
    }

    pub fn with_conflict(mut self, conflict: ConflictStrategy) -> Self {
        self.conflict = conflict;
        self
    }

    pub fn on_drive(mut self, drive_id: impl Into<String>) -> Self {
        self.drive_id = Some(drive_id.into());
        self
    }
}

/// Outcome of one move request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum MoveResult {
    Success {
        source: PathBuf,
        destination: PathBuf,
        /// `None` for dry runs.
        record_id: Option<RecordId>,
        copied: bool,
    },
    Skipped {
        source: PathBuf,
        destination: PathBuf,
        reason: String,
    },
    Failed {
        source: PathBuf,
        reason: String,
        kind: &'static str,
    },
}

impl MoveResult {
    pub fn is_success(&self) -> bool {
        matches!(self, MoveResult::Success { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, MoveResult::Skipped { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, MoveResult::Failed { .. })
    }

    pub fn source(&self) -> &Path {
        match self {
            MoveResult::Success { source, .. }
            | MoveResult::Skipped { source, .. }
            | MoveResult::Failed { source, .. } => source,
        }
    }

    /// Final (or would-be) path, when one was decided.
    pub fn destination(&self) -> Option<&Path> {
        match self {
            MoveResult::Success { destination, .. } | MoveResult::Skipped { destination, .. } => {
                Some(destination)
            }
            MoveResult::Failed { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoverSettings {
    /// Carry timestamps and permissions over after a cross-device copy.
    pub preserve_metadata: bool,
    /// Resolve and report destinations without touching the filesystem or ledger.
    pub dry_run: bool,
    pub unique_name_attempts: u32,
}

impl Default for MoverSettings {
    fn default() -> Self {
        Self {
            preserve_metadata: false,
            dry_run: false,
            unique_name_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

/// Moves files into the JD tree and keeps the ledger in step.
///
/// Cheap to clone; all collaborators are shared.
#[derive(Clone)]
pub struct FileMover {
    pub(crate) fs: Arc<dyn FileSystem>,
    folders: Arc<dyn FolderRepository>,
    drives: Arc<dyn DriveRepository>,
    pub(crate) ledger: Arc<dyn MoveLedger>,
    pub(crate) settings: MoverSettings,
}

impl FileMover {
    pub fn new(
        folders: Arc<dyn FolderRepository>,
        drives: Arc<dyn DriveRepository>,
        ledger: Arc<dyn MoveLedger>,
    ) -> Self {
        Self {
            fs: Arc::new(StdFileSystem),
            folders,
            drives,
            ledger,
            settings: MoverSettings::default(),
        }
    }

    pub fn with_fs(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = fs;
        self
    }

    pub fn with_settings(mut self, settings: MoverSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> &MoverSettings {
        &self.settings
    }

    pub fn ledger(&self) -> &dyn MoveLedger {
        self.ledger.as_ref()
    }

    pub(crate) fn resolver(&self) -> PathResolver<'_> {
        PathResolver::new(self.folders.as_ref(), self.drives.as_ref(), self.fs.as_ref())
    }

    /// Run one request, folding errors into `MoveResult::Failed`.
    pub fn move_file(&self, request: &MoveRequest) -> MoveResult {
        match self.try_move(request) {
            Ok(result) => result,
            Err(e) => {
                error!(
                    src = %request.source.display(),
                    folder = %request.folder_number,
                    code = e.code(),
                    kind = e.kind(),
                    "move failed: {e}"
                );
                MoveResult::Failed {
                    source: request.source.clone(),
                    reason: e.to_string(),
                    kind: e.kind(),
                }
            }
        }
    }

    /// Run one request. Skips are `Ok`; only exceptional conditions are `Err`.
    pub fn try_move(&self, request: &MoveRequest) -> Result<MoveResult> {
        let fs = self.fs.as_ref();
        let source = self.absolute_source(&request.source)?;
        // Non-UTF-8 names are kept readable; invalid bytes become U+FFFD.
        let file_name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| OrganizeError::missing_path("source file name", &source))?;

        let resolver = self.resolver();
        let resolved = if self.settings.dry_run {
            resolver.plan(&request.folder_number, request.drive_id.as_deref())?
        } else {
            resolver.resolve(&request.folder_number, request.drive_id.as_deref())?
        };
        let dir = &resolved.destination_dir;
        let mut destination = dir.join(sanitize_filename(&file_name));

        if destination == source {
            return Ok(MoveResult::Skipped {
                source,
                destination,
                reason: "file is already in the destination folder".into(),
            });
        }

        if fs.exists(&destination) {
            match request.conflict {
                ConflictStrategy::Skip => {
                    info!(src = %source.display(), dest = %destination.display(), "destination exists; skipping");
                    return Ok(MoveResult::Skipped {
                        source,
                        destination,
                        reason: "destination already exists".into(),
                    });
                }
                ConflictStrategy::Rename => {
                    let name =
                        unique_name(fs, dir, &file_name, self.settings.unique_name_attempts)?;
                    debug!(dest = %destination.display(), renamed = %name, "destination exists; using unique name");
                    destination = dir.join(name);
                }
                ConflictStrategy::Overwrite => {
                    if fs.is_dir(&destination) {
                        return Err(OrganizeError::Conflict(format!(
                            "cannot overwrite directory '{}'",
                            destination.display()
                        )));
                    }
                    warn!(dest = %destination.display(), "destination exists; overwriting");
                }
            }
        }

        if self.settings.dry_run {
            info!(src = %source.display(), dest = %destination.display(), "dry run: would move");
            return Ok(MoveResult::Success {
                source,
                destination,
                record_id: None,
                copied: false,
            });
        }

        let how = relocate(fs, &source, &destination, self.settings.preserve_metadata)?;
        let record_id = self
            .ledger
            .record_move(&source, &destination, &resolved.folder.number)
            .map_err(|e| {
                error!(
                    src = %source.display(),
                    dest = %destination.display(),
                    "file moved but the ledger write failed: {e}"
                );
                e
            })?;

        info!(
            src = %source.display(),
            dest = %destination.display(),
            folder = %resolved.folder.number,
            record = %record_id,
            "moved"
        );
        Ok(MoveResult::Success {
            source,
            destination,
            record_id: Some(record_id),
            copied: matches!(how, Relocation::Copied { .. }),
        })
    }

    /// Existing regular file, made absolute through its parent so a symlinked
    /// source is moved as the link itself.
    fn absolute_source(&self, source: &Path) -> Result<PathBuf> {
        let fs = self.fs.as_ref();
        if !fs.exists(source) {
            return Err(OrganizeError::missing_path("source file", source));
        }
        if fs.is_dir(source) {
            return Err(OrganizeError::NotFound(format!(
                "source file '{}' (path is a directory)",
                source.display()
            )));
        }
        let name = source
            .file_name()
            .ok_or_else(|| OrganizeError::missing_path("source file name", source))?;
        let parent = match source.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let parent = fs
            .canonicalize(parent)
            .map_err(io_err("canonicalize source directory", parent))?;
        Ok(parent.join(name))
    }
}
