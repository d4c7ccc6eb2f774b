//! Source rewriting for fixes.
//!
//! Rewrites are pure: `(text, replacements) -> text`. Replacements are applied
//! from the highest offset down so earlier offsets stay valid, and the
//! result does not depend on the order they were supplied in.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::Path;

use serde::Serialize;
use thiserror::Error;

/// Replace the bytes `start..end` with `text`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Replacement {
    pub start: usize,
    pub end: usize,
    pub text: String,
}

impl Replacement {
    pub fn new(range: std::ops::Range<usize>, text: impl Into<String>) -> Self {
        Self {
            start: range.start,
            end: range.end,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RewriteError {
    #[error("replacements overlap at byte {at}")]
    Overlap { at: usize },
    #[error("replacement {start}..{end} does not fit a {len}-byte source")]
    OutOfBounds { start: usize, end: usize, len: usize },
}

/// Apply non-overlapping replacements to `text`.
///
/// Two replacements overlap when their ranges intersect or when they start at
/// the same offset. Ranges must lie on character boundaries.
pub fn apply_replacements(text: &str, edits: &[Replacement]) -> Result<String, RewriteError> {
    let mut sorted: Vec<&Replacement> = edits.iter().collect();
    sorted.sort_by_key(|r| (r.start, r.end));

    for r in &sorted {
        if r.start > r.end
            || r.end > text.len()
            || !text.is_char_boundary(r.start)
            || !text.is_char_boundary(r.end)
        {
            return Err(RewriteError::OutOfBounds {
                start: r.start,
                end: r.end,
                len: text.len(),
            });
        }
    }
    for pair in sorted.windows(2) {
        if pair[1].start < pair[0].end || pair[1].start == pair[0].start {
            return Err(RewriteError::Overlap { at: pair[1].start });
        }
    }

    let mut out = text.to_string();
    for r in sorted.iter().rev() {
        out.replace_range(r.start..r.end, &r.text);
    }
    Ok(out)
}

/// Replace the contents of `path` all at once.
///
/// Writes to a temporary file in the same directory, then renames it over
/// the target. On failure the original file is untouched. A symlink is
/// followed and the file it points at is replaced; the link stays. An
/// existing file keeps its permissions, a new one gets the usual defaults.
pub fn write_atomic(path: &Path, contents: &str) -> std::io::Result<()> {
    let target = match fs::canonicalize(path) {
        Ok(resolved) => resolved,
        Err(e) if e.kind() == ErrorKind::NotFound => path.to_path_buf(),
        Err(e) => return Err(e),
    };
    let existing = match fs::metadata(&target) {
        Ok(meta) => Some(meta.permissions()),
        Err(e) if e.kind() == ErrorKind::NotFound => None,
        Err(e) => return Err(e),
    };
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut builder = tempfile::Builder::new();
    builder.prefix(".omerta");
    if let Some(permissions) = existing.is_none().then(new_file_permissions).flatten() {
        builder.permissions(permissions);
    }

    let mut tmp = builder.tempfile_in(dir)?;
    tmp.write_all(contents.as_bytes())?;
    if let Some(permissions) = existing {
        tmp.as_file().set_permissions(permissions)?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(&target).map_err(|e| e.error)?;
    Ok(())
}

/// Narrowed by the umask like any freshly created file.
#[cfg(unix)]
fn new_file_permissions() -> Option<fs::Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(fs::Permissions::from_mode(0o666))
}

#[cfg(not(unix))]
fn new_file_permissions() -> Option<fs::Permissions> {
    None
}
