//! Core library for `jd_mover`.
//!
//! Moves and renames files into a Johnny.Decimal folder tree with these guarantees:
//! - every destination stays inside the drive's JD root
//! - name collisions are resolved, never silently clobbered
//! - cross-device moves copy and verify before deleting
//! - moves and batch renames can be reversed
//!
//! Start with `FileMover` (moves, rollback), `batch` (sequential batches) and
//! `rename::RenameEngine` (preview / execute / undo). Folder taxonomy, drives and
//! persistence are injected through the traits in `repo`.

pub mod batch;
pub mod cancel;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod errors;
pub mod fs_ops;
pub mod mover;
pub mod naming;
pub mod output;
pub mod platform;
pub mod rename;
pub mod repo;
pub mod resolver;
pub mod rollback;
pub mod sanitize;

pub use batch::{BatchEvent, BatchHandle, BatchOptions, BatchReport, run_batch, run_batch_with, spawn_batch};
pub use cancel::CancelToken;
pub use config::{Config, LogLevel, default_config_path, default_log_path, path_has_symlink_ancestor};
pub use errors::{OrganizeError, Result};
pub use fs_ops::{FileSystem, StdFileSystem};
pub use mover::{ConflictStrategy, FileMover, MoveRequest, MoveResult, MoverSettings};
pub use naming::unique_name;
pub use rename::{RenameEngine, RenameOptions, RenameRules, generate_new_name, generate_preview};
pub use repo::{
    DriveInfo, DriveRepository, FileKvStore, FolderInfo, FolderRepository, JsonLedger,
    KeyValueStore, MemoryKvStore, MemoryLedger, MoveLedger, OrganizedFileRecord, RecordId,
    RecordStatus, StaticDrives, StaticFolders,
};
pub use resolver::{PathResolver, ResolvedDestination};
pub use rollback::{RollbackFailure, RollbackSummary};
pub use sanitize::{sanitize_filename, sanitize_segment};
