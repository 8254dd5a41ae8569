//! SQLite-backed notes index implementation.

mod connection;
mod graph;
mod links;
mod listing;
mod repo_impl;
mod transaction;


use crate::index::{IndexError, IndexResult};
use crate::query::SnippetStyle;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::Connection;

pub(crate) use links::load_links;
pub use listing::IndexedFiles;
pub(crate) use repo_impl::load_tags;
pub use transaction::Transaction;

// ===========================================
// SqliteIndex Struct
// ===========================================

/// SQLite-backed notes index.
///
/// Owns a single connection. Writes go through `&mut self` so only one writer
/// can be active; reads borrow the index immutably.
pub struct SqliteIndex {
    pub(crate) conn: Connection,
    snippet_style: SnippetStyle,
}

impl SqliteIndex {
    /// Returns the markers used to highlight snippets in query results.
    pub fn snippet_style(&self) -> &SnippetStyle {
        &self.snippet_style
    }

    /// Replaces the snippet markers used by subsequent queries.
    pub fn set_snippet_style(&mut self, style: SnippetStyle) {
        self.snippet_style = style;
    }
}

// ===========================================
// Timestamp Encoding
// ===========================================

/// Encodes a timestamp for storage.
///
/// Fixed nanosecond precision with a `Z` suffix keeps stored values in
/// chronological order under plain string comparison.
pub(crate) fn encode_time(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Decodes a stored timestamp.
pub(crate) fn decode_time(value: &str) -> IndexResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| IndexError::Corrupt(format!("invalid timestamp '{}': {}", value, e)))
}

/// Renders ids as a comma-separated SQL list.
///
/// Ids are integers, so inlining them cannot inject SQL.
pub(crate) fn join_ids<'a>(ids: impl IntoIterator<Item = &'a crate::domain::NoteId>) -> String {
    ids.into_iter()
        .map(|id| id.get().to_string())
        .collect::<Vec<_>>()
        .join(",")
}
