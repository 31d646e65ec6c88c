//! Filesystem primitives consumed by the move/rename engine.
//!
//! Everything that touches the disk goes through `FileSystem`, so the engine can be
//! driven against a recording or fault-injecting double in tests.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::{atomic, copy, meta};

pub trait FileSystem: Send + Sync {
    /// True if anything (file, directory, dangling symlink) occupies `path`.
    fn exists(&self, path: &Path) -> bool;

    fn is_dir(&self, path: &Path) -> bool;

    fn file_len(&self, path: &Path) -> io::Result<u64>;

    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Same-volume rename. Cross-volume attempts must fail with the raw OS error.
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;

    /// Copy `from` to `to`, returning bytes written. `to` is either complete or absent.
    fn copy(&self, from: &Path, to: &Path) -> io::Result<u64>;

    fn remove_file(&self, path: &Path) -> io::Result<()>;

    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf>;

    /// Carry timestamps/permissions over after a copy. Best-effort by default.
    fn copy_metadata(&self, _from: &Path, _to: &Path) -> io::Result<()> {
        Ok(())
    }
}

/// The real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdFileSystem;

impl FileSystem for StdFileSystem {
    fn exists(&self, path: &Path) -> bool {
        fs::symlink_metadata(path).is_ok()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn file_len(&self, path: &Path) -> io::Result<u64> {
        fs::metadata(path).map(|m| m.len())
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(path)
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        atomic::try_atomic_move(from, to)
    }

    fn copy(&self, from: &Path, to: &Path) -> io::Result<u64> {
        copy::safe_copy_and_rename(from, to)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }

    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        // dunce strips the \\?\ prefix on Windows so prefix checks compare like with like.
        dunce::canonicalize(path)
    }

    fn copy_metadata(&self, from: &Path, to: &Path) -> io::Result<()> {
        meta::preserve_metadata(from, to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[cfg(unix)]
    #[test]
    fn dangling_symlink_counts_as_existing() {
        let td = tempdir().unwrap();
        let link = td.path().join("link");
        std::os::unix::fs::symlink(td.path().join("missing"), &link).unwrap();
        assert!(StdFileSystem.exists(&link));
        assert!(!link.exists());
    }

    #[test]
    fn rename_and_len() {
        let td = tempdir().unwrap();
        let a = td.path().join("a.txt");
        let b = td.path().join("b.txt");
        fs::write(&a, b"12345").unwrap();
        StdFileSystem.rename(&a, &b).unwrap();
        assert!(!StdFileSystem.exists(&a));
        assert_eq!(StdFileSystem.file_len(&b).unwrap(), 5);
    }
}
