//! Upload filename hygiene.
//!
//! Client-supplied names are reduced to a conservative ASCII subset before
//! they are joined onto a workspace path or echoed back in
//! `Content-Disposition`.

use deunicode::deunicode;
use std::path::Path;

const MAX_FILENAME_LEN: usize = 120;
const MAX_EXTENSION_LEN: usize = 16;

/// Reduce a client filename to `[A-Za-z0-9._-]`.
///
/// - Only the last path component survives (`../../x.pdf` → `x.pdf`).
/// - Non-Latin characters are transliterated, whitespace becomes `_`.
/// - Windows reserved names and illegal characters are removed.
/// - Leading/trailing `.` and `_` are stripped.
///
/// Returns `None` when nothing usable is left.
pub fn secure_filename(raw: &str) -> Option<String> {
    let last = raw
        .rsplit(['/', '\\'])
        .find(|part| !part.trim().is_empty())
        .unwrap_or("");

    let options = sanitize_filename::Options {
        truncate: false,
        windows: true,
        replacement: "",
    };
    let cleaned = sanitize_filename::sanitize_with_options(deunicode(last), options);

    let mut out = String::with_capacity(cleaned.len());
    for word in cleaned.split_whitespace() {
        if !out.is_empty() {
            out.push('_');
        }
        out.extend(
            word.chars()
                .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')),
        );
    }

    let clamped = clamp_len(trim_separators(&out));
    let trimmed = trim_separators(&clamped);
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.to_string())
}

fn trim_separators(name: &str) -> &str {
    name.trim_matches(|c| c == '.' || c == '_')
}

/// Filename without its final extension (`scan.v2.pdf` → `scan.v2`).
pub fn file_stem(name: &str) -> String {
    Path::new(name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| name.to_string())
}

fn clamp_len(name: &str) -> String {
    if name.len() <= MAX_FILENAME_LEN {
        return name.to_string();
    }
    let path = Path::new(name);
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or(name);
    // An oversized "extension" is just part of the name.
    if ext.is_empty() || ext.len() > MAX_EXTENSION_LEN {
        name[..MAX_FILENAME_LEN].to_string()
    } else {
        let max_stem = MAX_FILENAME_LEN.saturating_sub(ext.len() + 1);
        format!("{}.{}", &stem[..max_stem.min(stem.len())], ext)
    }
}
