//! Metadata preservation for cross-device copies.
//! Copies timestamps (atime, mtime) and, on Unix, permission bits from source to destination.
//! Same-volume renames keep metadata for free and never come through here.

use filetime::{FileTime, set_file_times};
use std::fs;
use std::io;
use std::path::Path;
use tracing::trace;

pub(super) fn preserve_metadata(src: &Path, dest: &Path) -> io::Result<()> {
    let meta = fs::metadata(src)?;

    let at = meta
        .accessed()
        .map(FileTime::from_system_time)
        .unwrap_or_else(|_| FileTime::from_last_access_time(&meta));
    let mt = FileTime::from_last_modification_time(&meta);
    set_file_times(dest, at, mt)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = meta.permissions().mode() & 0o777;
        fs::set_permissions(dest, fs::Permissions::from_mode(mode))?;
    }

    trace!(src = %src.display(), dest = %dest.display(), "preserved metadata");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use filetime::set_file_mtime;
    use tempfile::tempdir;

    #[test]
    fn mtime_is_copied() {
        let td = tempdir().unwrap();
        let src = td.path().join("a");
        let dest = td.path().join("b");
        fs::write(&src, b"a").unwrap();
        fs::write(&dest, b"a").unwrap();
        let ts = FileTime::from_unix_time(1_700_000_000, 0);
        set_file_mtime(&src, ts).unwrap();

        preserve_metadata(&src, &dest).unwrap();
        let got = FileTime::from_last_modification_time(&fs::metadata(&dest).unwrap());
        assert_eq!(got.unix_seconds(), ts.unix_seconds());
    }

    #[cfg(unix)]
    #[test]
    fn mode_is_copied() {
        use std::os::unix::fs::PermissionsExt;
        let td = tempdir().unwrap();
        let src = td.path().join("a");
        let dest = td.path().join("b");
        fs::write(&src, b"a").unwrap();
        fs::write(&dest, b"a").unwrap();
        fs::set_permissions(&src, fs::Permissions::from_mode(0o640)).unwrap();

        preserve_metadata(&src, &dest).unwrap();
        let mode = fs::metadata(&dest).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o640);
    }
}
