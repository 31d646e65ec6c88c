#![allow(dead_code)]

use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

use jd_mover::{
    DriveInfo, FileMover, FileSystem, FolderInfo, MemoryLedger, StaticDrives, StaticFolders,
    StdFileSystem,
};

/// A temp tree with an `inbox/` to move from and a `jd/` root to move into.
pub struct Tree {
    pub td: TempDir,
    pub inbox: PathBuf,
    pub jd: PathBuf,
}

impl Tree {
    pub fn new() -> Self {
        let td = tempfile::tempdir().unwrap();
        let base = dunce::canonicalize(td.path()).unwrap();
        let inbox = base.join("inbox");
        let jd = base.join("jd");
        std::fs::create_dir_all(&inbox).unwrap();
        std::fs::create_dir_all(&jd).unwrap();
        Self { td, inbox, jd }
    }

    pub fn file(&self, name: &str, contents: &str) -> PathBuf {
        let p = self.inbox.join(name);
        std::fs::write(&p, contents).unwrap();
        p
    }
}

pub fn folder(number: &str, name: &str, category: &str, area: &str) -> FolderInfo {
    FolderInfo {
        number: number.into(),
        name: name.into(),
        category_name: category.into(),
        area_name: area.into(),
    }
}

pub fn catalog() -> StaticFolders {
    StaticFolders::new([
        folder("21.03", "Invoices", "21 Billing", "20-29 Finance"),
        folder("31.01", "Photos", "31 Media", "30-39 Life"),
    ])
}

pub fn drives(root: &Path) -> StaticDrives {
    StaticDrives::single(DriveInfo {
        id: "main".into(),
        base_path: root.to_path_buf(),
        jd_root_path: None,
    })
}

pub fn mover(tree: &Tree) -> FileMover {
    FileMover::new(
        Arc::new(catalog()),
        Arc::new(drives(&tree.jd)),
        Arc::new(MemoryLedger::new()),
    )
}

pub fn invoices_dir(tree: &Tree) -> PathBuf {
    tree.jd
        .join("20-29 Finance")
        .join("21 Billing")
        .join("21.03 Invoices")
}

fn cross_device_error() -> io::Error {
    #[cfg(unix)]
    {
        io::Error::from_raw_os_error(libc::EXDEV)
    }
    #[cfg(not(unix))]
    {
        io::Error::from_raw_os_error(17)
    }
}

/// Real filesystem that records mutating calls and can pretend every rename
/// crosses a device boundary.
#[derive(Default)]
pub struct RecordingFs {
    pub calls: Mutex<Vec<String>>,
    pub cross_device: bool,
}

impl RecordingFs {
    pub fn cross_device() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            cross_device: true,
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: &str) {
        self.calls.lock().unwrap().push(call.to_string());
    }
}

impl FileSystem for RecordingFs {
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
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        self.record("rename");
        if self.cross_device {
            return Err(cross_device_error());
        }
        StdFileSystem.rename(from, to)
    }
    fn copy(&self, from: &Path, to: &Path) -> io::Result<u64> {
        self.record("copy");
        StdFileSystem.copy(from, to)
    }
    fn remove_file(&self, path: &Path) -> io::Result<()> {
        self.record("remove");
        StdFileSystem.remove_file(path)
    }
    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        StdFileSystem.canonicalize(path)
    }
}

/// Sorted list of every file under `root` with its contents.
pub fn snapshot(root: &Path) -> Vec<(PathBuf, Vec<u8>)> {
    let mut out: Vec<(PathBuf, Vec<u8>)> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| (e.path().to_path_buf(), std::fs::read(e.path()).unwrap()))
        .collect();
    out.sort();
    out
}
