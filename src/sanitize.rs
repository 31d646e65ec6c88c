//! Filename and path-segment sanitizing.
//!
//! Used by every component that turns user or catalog text into a path:
//! - unsafe characters (`<>:"/\|?*` and control chars) are stripped
//! - leading/trailing whitespace and trailing dots are trimmed
//! - Windows reserved device names (CON, NUL, COM1, ...) are prefixed with `_`
//! - the result is clamped to `MAX_FILENAME_LEN` bytes, keeping the extension
//!
//! An input that sanitizes to nothing becomes `FALLBACK_NAME`.

/// Conservative per-component limit (bytes); typical POSIX/EXT/NTFS limit.
pub const MAX_FILENAME_LEN: usize = 255;

/// Name used when sanitizing leaves nothing usable.
pub const FALLBACK_NAME: &str = "unnamed";

const UNSAFE_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

const RESERVED_NAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Sanitize a single filename (no directory components survive).
pub fn sanitize_filename(name: &str) -> String {
    let stripped: String = name
        .chars()
        .filter(|c| !UNSAFE_CHARS.contains(c) && !c.is_control())
        .collect();

    let trimmed = stripped.trim().trim_end_matches(['.', ' ']);
    if trimmed.is_empty() || trimmed.chars().all(|c| c == '.') {
        return FALLBACK_NAME.to_string();
    }

    let guarded = guard_reserved(trimmed);
    clamp_len(&guarded, MAX_FILENAME_LEN)
}

/// Sanitize one directory segment (area/category/folder names).
///
/// On top of `sanitize_filename`, every `..` run is removed so a segment can
/// never climb out of its parent even before the containment re-check.
pub fn sanitize_segment(segment: &str) -> String {
    let mut s: String = segment
        .chars()
        .filter(|c| !UNSAFE_CHARS.contains(c) && !c.is_control())
        .collect();
    while s.contains("..") {
        s = s.replace("..", "");
    }
    sanitize_filename(&s)
}

/// Split `name` into (stem, extension) at the last dot.
///
/// A leading dot does not start an extension (".env" has none), matching
/// `Path::extension` semantics.
pub fn split_extension(name: &str) -> (&str, Option<&str>) {
    match name.rfind('.') {
        Some(idx) if idx > 0 && idx + 1 < name.len() => (&name[..idx], Some(&name[idx + 1..])),
        _ => (name, None),
    }
}

fn guard_reserved(name: &str) -> String {
    let (stem, _) = split_extension(name);
    let upper = stem.trim_end().to_ascii_uppercase();
    if RESERVED_NAMES.contains(&upper.as_str()) {
        format!("_{name}")
    } else {
        name.to_string()
    }
}

/// Truncate the stem so `stem + "." + ext` fits within `max` bytes.
/// Truncation happens on char boundaries; the extension is kept intact
/// unless it alone exceeds the budget.
pub(crate) fn clamp_len(name: &str, max: usize) -> String {
    if name.len() <= max {
        return name.to_string();
    }
    let (stem, ext) = split_extension(name);
    let overhead = ext.map(|e| e.len() + 1).unwrap_or(0);
    if overhead >= max {
        return truncate_chars(name, max);
    }
    let budget = max - overhead;
    let mut out = truncate_chars(stem, budget);
    if out.is_empty() {
        out.push('f');
    }
    if let Some(e) = ext {
        out.push('.');
        out.push_str(e);
    }
    out
}

fn truncate_chars(s: &str, budget: usize) -> String {
    let mut acc = String::new();
    for ch in s.chars() {
        if acc.len() + ch.len_utf8() > budget {
            break;
        }
        acc.push(ch);
    }
    acc
}
