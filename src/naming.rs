//! Unique destination names.
//!
//! Policy:
//! - The desired name is sanitized first.
//! - If nothing occupies `dir/name`, the name is returned unchanged.
//! - Otherwise `_1`, `_2`, ... is inserted before the extension until a free
//!   name is found, up to a fixed bound. Hitting the bound is an error, never a loop.
//!
//! Notes:
//! - This only decides the name from current filesystem state. Moves are
//!   processed sequentially so the check-then-write window stays within one item.

use std::path::Path;
use tracing::trace;

use crate::errors::{OrganizeError, Result};
use crate::fs_ops::FileSystem;
use crate::sanitize::{MAX_FILENAME_LEN, sanitize_filename, split_extension};

/// Default number of numbered variants tried before giving up.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 100;

/// Return a name that does not collide with anything in `dir`.
///
/// Examples:
/// - "movie.mkv" -> "movie_1.mkv", "movie_2.mkv", ...
/// - ".env" -> ".env_1"
/// - "archive.tar.gz" -> "archive.tar_1.gz"
pub fn unique_name(
    fs: &dyn FileSystem,
    dir: &Path,
    desired: &str,
    max_attempts: u32,
) -> Result<String> {
    let name = sanitize_filename(desired);
    if !fs.exists(&dir.join(&name)) {
        return Ok(name);
    }

    let (stem, ext) = split_extension(&name);
    for n in 1..=max_attempts {
        let candidate = name_with_suffix(stem, ext, &format!("_{n}"));
        if !fs.exists(&dir.join(&candidate)) {
            trace!(name = %name, candidate = %candidate, attempts = n, "picked unique name");
            return Ok(candidate);
        }
    }

    Err(OrganizeError::Exhausted(format!(
        "too many files with similar names: '{}' in '{}'",
        name,
        dir.display()
    )))
}

/// Insert `suffix` between stem and extension, shrinking the stem if the
/// result would exceed `MAX_FILENAME_LEN`.
fn name_with_suffix(stem: &str, ext: Option<&str>, suffix: &str) -> String {
    let overhead = suffix.len() + ext.map(|e| e.len() + 1).unwrap_or(0);
    let budget = MAX_FILENAME_LEN.saturating_sub(overhead).max(1);

    let mut out = String::with_capacity(stem.len() + overhead);
    for ch in stem.chars() {
        if out.len() + ch.len_utf8() > budget {
            break;
        }
        out.push(ch);
    }
    if out.is_empty() {
        out.push('f');
    }
    out.push_str(suffix);
    if let Some(e) = ext {
        out.push('.');
        out.push_str(e);
    }
    out
}
