//! Single-file relocation shared by moves, rollbacks and rename undo.
//!
//! Attempts an in-place rename first. When the OS reports a cross-device
//! error, falls back to copy -> verify -> delete source. The copy is complete
//! and verified before the source is touched, so an interruption leaves two
//! copies, never zero. Any other rename failure is returned as-is.

use std::io;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::errors::{OrganizeError, Result, io_err};

use super::primitives::FileSystem;
use super::util::is_cross_device;

/// How a relocation was carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relocation {
    Renamed,
    Copied { bytes: u64 },
}

/// Move `src` to `dest` (which the caller has already decided may be written).
pub fn relocate(
    fs: &dyn FileSystem,
    src: &Path,
    dest: &Path,
    preserve_metadata: bool,
) -> Result<Relocation> {
    match fs.rename(src, dest) {
        Ok(()) => {
            debug!(src = %src.display(), dest = %dest.display(), "renamed atomically");
            Ok(Relocation::Renamed)
        }
        Err(e) if is_cross_device(&e) => {
            warn!(
                src = %src.display(),
                dest = %dest.display(),
                "cross-device rename; falling back to copy + delete"
            );
            copy_then_delete(fs, src, dest, preserve_metadata)
        }
        Err(e) => Err(OrganizeError::io("rename", src, e)),
    }
}

fn copy_then_delete(
    fs: &dyn FileSystem,
    src: &Path,
    dest: &Path,
    preserve_metadata: bool,
) -> Result<Relocation> {
    let expected = fs.file_len(src).map_err(io_err("stat source", src))?;
    let bytes = fs.copy(src, dest).map_err(io_err("copy to destination", dest))?;
    let written = fs.file_len(dest).map_err(io_err("stat copied file", dest))?;

    if bytes != expected || written != expected {
        let _ = fs.remove_file(dest);
        return Err(OrganizeError::io(
            "verify copy",
            dest,
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("source has {expected} bytes, copy has {written}"),
            ),
        ));
    }

    if preserve_metadata
        && let Err(e) = fs.copy_metadata(src, dest)
    {
        warn!(dest = %dest.display(), error = %e, "failed to preserve metadata");
    }

    fs.remove_file(src)
        .map_err(io_err("remove source after verified copy", src))?;
    info!(src = %src.display(), dest = %dest.display(), bytes, "copied across devices and removed source");
    Ok(Relocation::Copied { bytes })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs_ops::StdFileSystem;
    use std::path::PathBuf;
    use std::sync::Mutex;
    use tempfile::tempdir;

    /// Real filesystem whose renames always report EXDEV; records every call.
    struct CrossDeviceFs {
        calls: Mutex<Vec<String>>,
        short_copy: bool,
    }

    impl CrossDeviceFs {
        fn new(short_copy: bool) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                short_copy,
            }
        }

        fn log(&self, what: &str) {
            self.calls.lock().unwrap().push(what.to_string());
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl FileSystem for CrossDeviceFs {
        fn exists(&self, path: &Path) -> bool {
            StdFileSystem.exists(path)
        }
        fn is_dir(&self, path: &Path) -> bool {
            StdFileSystem.is_dir(path)
        }
        fn file_len(&self, path: &Path) -> io::Result<u64> {
            StdFileSystem.file_len(path)
        }
        fn create_dir_all(&self, path: &Path) -> io::Result<()> {
            StdFileSystem.create_dir_all(path)
        }
        fn rename(&self, _from: &Path, _to: &Path) -> io::Result<()> {
            self.log("rename");
            #[cfg(unix)]
            let code = libc::EXDEV;
            #[cfg(not(unix))]
            let code = 17;
            Err(io::Error::from_raw_os_error(code))
        }
        fn copy(&self, from: &Path, to: &Path) -> io::Result<u64> {
            self.log("copy");
            if self.short_copy {
                std::fs::write(to, b"x")?;
                return Ok(1);
            }
            StdFileSystem.copy(from, to)
        }
        fn remove_file(&self, path: &Path) -> io::Result<()> {
            self.log("remove");
            StdFileSystem.remove_file(path)
        }
        fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
            StdFileSystem.canonicalize(path)
        }
    }

    #[test]
    fn cross_device_copies_then_deletes() {
        let td = tempdir().unwrap();
        let src = td.path().join("a.txt");
        let dest = td.path().join("b.txt");
        std::fs::write(&src, b"content").unwrap();

        let fs = CrossDeviceFs::new(false);
        let how = relocate(&fs, &src, &dest, false).unwrap();

        assert_eq!(how, Relocation::Copied { bytes: 7 });
        assert_eq!(fs.calls(), vec!["rename", "copy", "remove"]);
        assert!(!src.exists());
        assert_eq!(std::fs::read(&dest).unwrap(), b"content");
    }

    #[test]
    fn short_copy_keeps_source() {
        let td = tempdir().unwrap();
        let src = td.path().join("a.txt");
        let dest = td.path().join("b.txt");
        std::fs::write(&src, b"content").unwrap();

        let fs = CrossDeviceFs::new(true);
        let err = relocate(&fs, &src, &dest, false).unwrap_err();

        assert_eq!(err.kind(), "io");
        assert!(src.exists(), "source must survive a failed verification");
        assert!(!dest.exists(), "partial copy is removed");
    }

    #[test]
    fn same_device_is_a_plain_rename() {
        let td = tempdir().unwrap();
        let src = td.path().join("a.txt");
        let dest = td.path().join("b.txt");
        std::fs::write(&src, b"content").unwrap();

        let how = relocate(&StdFileSystem, &src, &dest, false).unwrap();
        assert_eq!(how, Relocation::Renamed);
        assert!(dest.exists() && !src.exists());
    }

    #[test]
    fn other_rename_errors_do_not_fall_back() {
        let td = tempdir().unwrap();
        let src = td.path().join("missing.txt");
        let dest = td.path().join("b.txt");
        let err = relocate(&StdFileSystem, &src, &dest, false).unwrap_err();
        assert!(matches!(err, OrganizeError::Io { op: "rename", .. }));
        assert!(!dest.exists());
    }
}
