//! IndexRepository trait, errors and query result types.

use crate::domain::{NoteId, NoteRecord};
use crate::query::FilterCriteria;
use std::path::PathBuf;
use thiserror::Error;

// ===========================================
// IndexError Type
// ===========================================

/// Errors that can occur during index operations.
#[derive(Debug, Error)]
pub enum IndexError {
    /// A note is already indexed at this path.
    #[error("a note is already indexed at {path}")]
    DuplicatePath { path: String },

    /// No note is indexed at this path.
    #[error("note not found in the index: {path}")]
    NotFound { path: String },

    /// The filter criteria cannot be compiled or executed.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// None of the mentioned paths resolve to an indexed note.
    #[error("could not find notes at: {}", paths.join(", "))]
    MentionNotFound { paths: Vec<String> },

    /// A persisted value could not be decoded.
    #[error("corrupt index data: {0}")]
    Corrupt(String),

    /// Note metadata could not be serialized.
    #[error("cannot serialize note metadata for {path}: {source}")]
    Metadata {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// A database error occurred.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// An I/O error occurred.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for index operations.
pub type IndexResult<T> = Result<T, IndexError>;

// ===========================================
// Query Results
// ===========================================

/// A note matching a query, with the snippets explaining the match.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteMatch {
    id: NoteId,
    note: NoteRecord,
    snippets: Vec<String>,
}

impl NoteMatch {
    pub fn new(id: NoteId, note: NoteRecord, snippets: Vec<String>) -> Self {
        Self { id, note, snippets }
    }

    /// Returns the store-assigned id of the note.
    pub fn id(&self) -> NoteId {
        self.id
    }

    pub fn note(&self) -> &NoteRecord {
        &self.note
    }

    /// Returns highlighted excerpts, deduplicated in first-seen order.
    pub fn snippets(&self) -> &[String] {
        &self.snippets
    }

    pub fn into_note(self) -> NoteRecord {
        self.note
    }
}

/// The matches returned by [`IndexRepository::find`].
///
/// `count()` is the number of matches actually returned, after the limit.
#[derive(Debug, Clone, Default)]
pub struct FindResult {
    matches: Vec<NoteMatch>,
}

impl FindResult {
    pub(crate) fn new(matches: Vec<NoteMatch>) -> Self {
        Self { matches }
    }

    pub fn count(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, NoteMatch> {
        self.matches.iter()
    }

    /// Returns the paths of the matches in result order.
    pub fn paths(&self) -> Vec<&str> {
        self.matches.iter().map(|m| m.note().path()).collect()
    }
}

impl IntoIterator for FindResult {
    type Item = NoteMatch;
    type IntoIter = std::vec::IntoIter<NoteMatch>;

    fn into_iter(self) -> Self::IntoIter {
        self.matches.into_iter()
    }
}

impl<'a> IntoIterator for &'a FindResult {
    type Item = &'a NoteMatch;
    type IntoIter = std::slice::Iter<'a, NoteMatch>;

    fn into_iter(self) -> Self::IntoIter {
        self.matches.iter()
    }
}

// ===========================================
// IndexRepository Trait
// ===========================================

/// Repository trait for the notes index.
///
/// Writes take `&mut self`: the index supports a single writer at a time and
/// every write applies atomically for one note (record, tags and links).
pub trait IndexRepository {
    /// Indexes a new note and returns its id.
    ///
    /// Fails with [`IndexError::DuplicatePath`] if the path is already indexed.
    fn add(&mut self, note: &NoteRecord) -> IndexResult<NoteId>;

    /// Replaces every field, tag and link of the note indexed at the same path.
    ///
    /// Fails with [`IndexError::NotFound`] if the path is not indexed.
    fn update(&mut self, note: &NoteRecord) -> IndexResult<NoteId>;

    /// Removes the note at `path` with its links and tag associations.
    ///
    /// Not idempotent: removing an absent path fails with [`IndexError::NotFound`].
    fn remove(&mut self, path: &str) -> IndexResult<()>;

    /// Finds the id of the note at exactly `path`.
    fn find_id_by_path(&self, path: &str) -> IndexResult<Option<NoteId>>;

    /// Finds the first note, in index order, whose path starts with `prefix`.
    fn find_id_by_path_prefix(&self, prefix: &str) -> IndexResult<Option<NoteId>>;

    /// Returns the notes matching `criteria`, ranked and annotated.
    fn find(&self, criteria: &FilterCriteria) -> IndexResult<FindResult>;
}
