//! I/O error description helpers.
//!
//! Formats an io::Error with the operation, the path involved and a
//! platform-aware hint. Used by `OrganizeError::Io`'s Display impl so every
//! surfaced IO failure reads the same way in logs and CLI output.

use std::io;
use std::path::Path;

/// Format a human-friendly message with op/path plus platform-aware hints.
pub fn describe_io_error(op: &str, path: &Path, e: &io::Error) -> String {
    let mut msg = format!("{} '{}': {}", op, path.display(), e);

    if let Some(code) = e.raw_os_error() {
        if let Some(hint) = os_hint(code) {
            msg.push_str(" - ");
            msg.push_str(hint);
        }
        msg.push_str(&format!(" [os code: {code}]"));
    } else if let Some(hint) = kind_hint(e.kind()) {
        msg.push_str(" - ");
        msg.push_str(hint);
    }

    msg
}

#[cfg(unix)]
fn os_hint(code: i32) -> Option<&'static str> {
    match code {
        libc::EACCES | libc::EPERM => {
            Some("permission denied; check ownership and write permissions.")
        }
        libc::EXDEV => Some("cross-filesystem; atomic rename not possible."),
        libc::EBUSY => Some("resource busy; ensure no other process is writing."),
        libc::ENOENT => Some("path not found; verify it exists."),
        libc::EEXIST => Some("already exists; pick a unique name or remove the target."),
        libc::ENOSPC => Some("insufficient space on device."),
        libc::EROFS => Some("read-only filesystem; cannot write here."),
        libc::ENAMETOOLONG => Some("filename or path too long; shorten path segments."),
        _ => None,
    }
}

#[cfg(windows)]
fn os_hint(code: i32) -> Option<&'static str> {
    match code {
        5 => Some("access denied; check permissions."),
        17 => Some("not same device; cross-filesystem move."),
        32 => Some("sharing violation; file is in use."),
        2 | 3 => Some("path not found; verify it exists."),
        80 => Some("already exists; pick a unique name."),
        112 => Some("insufficient disk space."),
        206 => Some("filename or path too long (MAX_PATH exceeded)."),
        _ => None,
    }
}

#[cfg(not(any(unix, windows)))]
fn os_hint(_code: i32) -> Option<&'static str> {
    None
}

fn kind_hint(kind: io::ErrorKind) -> Option<&'static str> {
    match kind {
        io::ErrorKind::PermissionDenied => {
            Some("permission denied; check ownership and write permissions.")
        }
        io::ErrorKind::NotFound => Some("path not found; verify it exists."),
        io::ErrorKind::AlreadyExists => Some("already exists; remove or choose a unique name."),
        _ => None,
    }
}
