//! Pure name transformation.
//!
//! Rules apply in a fixed order:
//! 1. find / replace (base name)
//! 2. case transform (base name; the extension follows lower/upper, and is
//!    lowercased for title/sentence)
//! 3. prefix
//! 4. suffix
//! 5. zero-padded counter (`start + index`)
//!
//! Prefix and suffix are added after the case transform and keep their own case.
//! The combined name is sanitized last.

use super::options::{CaseTransform, FindReplace, NumberPosition, RenameRules};
use crate::sanitize::{sanitize_filename, split_extension};

/// Compute the new name for the file at position `index` of a batch.
pub fn generate_new_name(original: &str, rules: &RenameRules, index: usize) -> String {
    let opts = rules.options();
    let (stem, ext) = split_extension(original);

    let mut base = match &opts.find_replace {
        Some(fr) => find_replace(stem, fr),
        None => stem.to_string(),
    };
    let mut ext = ext.map(str::to_string);

    if let Some(case) = opts.case {
        base = apply_case(&base, case);
        ext = ext.map(|e| match case {
            CaseTransform::Upper => e.to_uppercase(),
            CaseTransform::Lower | CaseTransform::Title | CaseTransform::Sentence => {
                e.to_lowercase()
            }
        });
    }

    if let Some(prefix) = &opts.prefix {
        base.insert_str(0, prefix);
    }
    if let Some(suffix) = &opts.suffix {
        base.push_str(suffix);
    }
    if let Some(n) = &opts.number {
        let value = n.start.saturating_add(index as u64);
        let counter = format!("{value:0width$}", width = n.digits);
        base = match n.position {
            NumberPosition::Prefix => format!("{counter}{}{base}", n.separator),
            NumberPosition::Suffix => format!("{base}{}{counter}", n.separator),
        };
    }

    let combined = match ext {
        Some(e) => format!("{base}.{e}"),
        None => base,
    };
    sanitize_filename(&combined)
}

fn find_replace(haystack: &str, fr: &FindReplace) -> String {
    let mut out = String::with_capacity(haystack.len());
    let mut from = 0;
    while let Some((start, end)) = find_from(haystack, &fr.find, from, fr.match_case) {
        out.push_str(&haystack[from..start]);
        out.push_str(&fr.replace);
        from = end;
        if !fr.all {
            break;
        }
    }
    out.push_str(&haystack[from..]);
    out
}

/// Byte range of the first match of `needle` at or after `from`.
fn find_from(haystack: &str, needle: &str, from: usize, match_case: bool) -> Option<(usize, usize)> {
    if match_case {
        return haystack[from..]
            .find(needle)
            .map(|i| (from + i, from + i + needle.len()));
    }
    // Char-wise comparison keeps byte offsets valid when lowercasing changes lengths.
    for (offset, _) in haystack[from..].char_indices() {
        let start = from + offset;
        let mut rest = haystack[start..].char_indices();
        let mut end = start;
        let mut matched = true;
        for n in needle.chars() {
            match rest.next() {
                Some((i, h)) if h.to_lowercase().eq(n.to_lowercase()) => {
                    end = start + i + h.len_utf8();
                }
                _ => {
                    matched = false;
                    break;
                }
            }
        }
        if matched {
            return Some((start, end));
        }
    }
    None
}

fn apply_case(s: &str, case: CaseTransform) -> String {
    match case {
        CaseTransform::Lower => s.to_lowercase(),
        CaseTransform::Upper => s.to_uppercase(),
        CaseTransform::Title => title_case(s),
        CaseTransform::Sentence => sentence_case(s),
    }
}

fn is_word_break(c: char) -> bool {
    c.is_whitespace() || matches!(c, '_' | '-' | '.')
}

fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for c in s.chars() {
        if is_word_break(c) {
            at_word_start = true;
            out.push(c);
        } else if at_word_start {
            out.extend(c.to_uppercase());
            at_word_start = false;
        } else {
            out.extend(c.to_lowercase());
        }
    }
    out
}

fn sentence_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut seen_letter = false;
    for c in s.chars() {
        if !seen_letter && c.is_alphabetic() {
            out.extend(c.to_uppercase());
            seen_letter = true;
        } else {
            out.extend(c.to_lowercase());
        }
    }
    out
}
