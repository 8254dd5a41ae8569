//! Path normalization and the directory-contiguous ordering used by the index.

use chrono::{DateTime, Utc};
use std::cmp::Ordering;

/// Stands in for `/` in sortable paths.
///
/// It sorts below every printable character, so `a/b` orders before `a-b`
/// and a directory's entries stay contiguous. `\x00` is avoided because
/// SQLite treats it as a string terminator.
pub const SORTABLE_SEPARATOR: char = '\x01';

/// A `(path, modified)` pair describing one indexed or on-disk note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMetadata {
    pub path: String,
    pub modified: DateTime<Utc>,
}

impl FileMetadata {
    pub fn new(path: impl Into<String>, modified: DateTime<Utc>) -> Self {
        Self {
            path: normalize_path(&path.into()),
            modified,
        }
    }
}

/// Normalizes a notebook-relative path.
///
/// Backslashes become slashes, empty and `.` segments are dropped and
/// surrounding whitespace is trimmed. `..` segments are kept as-is.
pub fn normalize_path(path: &str) -> String {
    path.trim()
        .replace('\\', "/")
        .split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// Returns the form of `path` stored in the `sortable_path` column.
pub fn sortable_path(path: &str) -> String {
    path.replace('/', &SORTABLE_SEPARATOR.to_string())
}

/// Compares two paths the way the index orders them.
pub fn cmp_sortable(a: &str, b: &str) -> Ordering {
    let key = |c: char| if c == '/' { SORTABLE_SEPARATOR } else { c };
    a.chars().map(key).cmp(b.chars().map(key))
}

/// Sorts walker output into index order so it can be diffed against
/// [`crate::index::SqliteIndex::indexed`].
pub fn sort_for_diff(files: &mut [FileMetadata]) {
    files.sort_by(|a, b| cmp_sortable(&a.path, &b.path));
}

/// Returns every non-empty prefix of `path`, shortest first.
///
/// Used to find unresolved links whose href is a prefix of a newly indexed
/// path without scanning the whole link table.
pub(crate) fn path_prefixes(path: &str) -> Vec<&str> {
    path.char_indices()
        .map(|(i, c)| &path[..i + c.len_utf8()])
        .collect()
}
