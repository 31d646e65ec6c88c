//! Copy-into-place for cross-device relocation.
//!
//! Bytes are streamed into a hidden `.part` file next to the destination, synced,
//! then renamed over `dest`; a reader never sees a half-written file under the
//! final name. The `.part` file is removed on any failure.
//!
//! The source is read once from start to EOF. Growth during the copy is not
//! picked up; `relocate` compares lengths afterwards.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;

use super::atomic::try_atomic_move;
use super::util;

const BUF_SIZE: usize = 1024 * 1024;

/// Copy `src` to `dest` via a sibling temp file. Returns the number of bytes copied.
pub fn safe_copy_and_rename(src: &Path, dest: &Path) -> io::Result<u64> {
    let dest_dir = dest.parent().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("destination has no parent: {}", dest.display()),
        )
    })?;
    fs::create_dir_all(dest_dir)?;

    let part = util::unique_temp_path(dest_dir);
    let result = stream_into_new(src, &part).and_then(|bytes| {
        try_atomic_move(&part, dest)?;
        Ok(bytes)
    });
    if result.is_err() {
        let _ = fs::remove_file(&part);
    }
    result
}

/// `dst` must not exist yet; it is opened with `create_new` and synced before return.
fn stream_into_new(src: &Path, dst: &Path) -> io::Result<u64> {
    let mut reader = BufReader::with_capacity(BUF_SIZE, File::open(src)?);
    let out = OpenOptions::new().write(true).create_new(true).open(dst)?;
    let mut writer = BufWriter::with_capacity(BUF_SIZE, out);
    let bytes = io::copy(&mut reader, &mut writer)?;
    writer.flush()?;
    writer.get_ref().sync_all()?;
    Ok(bytes)
}
