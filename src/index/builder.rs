//! Index sync: brings the index in line with the notes found on disk.

use crate::domain::NoteRecord;
use crate::index::{IndexRepository, IndexResult, SqliteIndex};
use crate::infra::{FileMetadata, cmp_sortable, sort_for_diff};
use std::cmp::Ordering;
use std::fmt;

// ===========================================
// SyncError Type
// ===========================================

/// Errors that can occur when indexing individual files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// Failed to parse a note file.
    Parse { path: String, message: String },
    /// I/O error reading file.
    Io { path: String, message: String },
}

impl SyncError {
    /// Returns the path of the file that caused the error.
    pub fn path(&self) -> &str {
        match self {
            SyncError::Parse { path, .. } => path,
            SyncError::Io { path, .. } => path,
        }
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        match self {
            SyncError::Parse { message, .. } => message,
            SyncError::Io { message, .. } => message,
        }
    }
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path(), self.message())
    }
}

impl std::error::Error for SyncError {}

// ===========================================
// Result Types
// ===========================================

/// Result of a sync.
#[derive(Debug, Default)]
pub struct SyncResult {
    /// Number of new notes added.
    pub added: usize,
    /// Number of existing notes updated.
    pub modified: usize,
    /// Number of notes removed (file deleted).
    pub removed: usize,
    /// Errors that occurred during indexing.
    pub errors: Vec<SyncError>,
}

// ===========================================
// Progress Reporting
// ===========================================

/// Result of processing a single file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileResult {
    Added,
    Modified,
    Removed,
    /// Error occurred while processing file.
    Error(String),
}

/// Trait for receiving progress updates during a sync.
pub trait ProgressReporter {
    /// Called when a file is processed.
    fn on_file(&mut self, path: &str, result: FileResult);
    /// Called when the sync is complete.
    fn on_complete(&mut self, changed: usize, errors: usize);
}

/// A no-op progress reporter.
#[derive(Default)]
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn on_file(&mut self, _path: &str, _result: FileResult) {}
    fn on_complete(&mut self, _changed: usize, _errors: usize) {}
}

// ===========================================
// Parsing Collaborator
// ===========================================

/// Turns a file found on disk into a note record.
///
/// The record's path and modification time should match the file's, or the
/// next sync will see the file as changed again.
pub trait NoteParser {
    fn parse(&mut self, file: &FileMetadata) -> Result<NoteRecord, SyncError>;
}

impl<F> NoteParser for F
where
    F: FnMut(&FileMetadata) -> Result<NoteRecord, SyncError>,
{
    fn parse(&mut self, file: &FileMetadata) -> Result<NoteRecord, SyncError> {
        self(file)
    }
}

// ===========================================
// Diffing
// ===========================================

/// A difference between the files on disk and the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    Added(FileMetadata),
    Modified(FileMetadata),
    Removed(FileMetadata),
}

/// Compares files on disk against the indexed files.
///
/// `indexed` must be in sortable-path order, as yielded by
/// [`SqliteIndex::indexed`]; `source` may be in any order. A file is
/// modified when its modification time differs from the indexed one.
pub fn diff<I>(source: &[FileMetadata], indexed: I) -> IndexResult<Vec<Change>>
where
    I: IntoIterator<Item = IndexResult<FileMetadata>>,
{
    let mut source = source.to_vec();
    sort_for_diff(&mut source);

    let mut indexed = indexed.into_iter();
    let mut current = indexed.next().transpose()?;
    let mut changes = Vec::new();

    for file in source {
        while let Some(entry) = current.take_if(|e| cmp_sortable(&e.path, &file.path) == Ordering::Less) {
            changes.push(Change::Removed(entry));
            current = indexed.next().transpose()?;
        }

        match current.take_if(|e| e.path == file.path) {
            Some(entry) => {
                if entry.modified != file.modified {
                    changes.push(Change::Modified(file));
                }
                current = indexed.next().transpose()?;
            }
            None => changes.push(Change::Added(file)),
        }
    }

    while let Some(entry) = current {
        changes.push(Change::Removed(entry));
        current = indexed.next().transpose()?;
    }

    Ok(changes)
}

// ===========================================
// IndexBuilder
// ===========================================

/// Keeps a `SqliteIndex` in sync with the notes on disk.
///
/// Walking the notebook is the caller's job: it hands over the
/// `(path, modified)` pairs it found and a [`NoteParser`] that reads one
/// file. Only added and modified files are parsed.
pub struct IndexBuilder<P> {
    parser: P,
}

impl<P: NoteParser> IndexBuilder<P> {
    pub fn new(parser: P) -> Self {
        Self { parser }
    }

    /// Applies the differences between `files` and the index.
    ///
    /// # Errors
    ///
    /// Returns an error if a database operation fails. Individual file errors
    /// are collected in the returned `SyncResult`.
    pub fn sync(&mut self, index: &mut SqliteIndex, files: &[FileMetadata]) -> IndexResult<SyncResult> {
        self.sync_with_progress(index, files, &mut NoopReporter)
    }

    /// Applies the differences with progress reporting.
    pub fn sync_with_progress<R: ProgressReporter>(
        &mut self,
        index: &mut SqliteIndex,
        files: &[FileMetadata],
        progress: &mut R,
    ) -> IndexResult<SyncResult> {
        let changes = diff(files, index.indexed())?;
        let mut result = SyncResult::default();

        for change in changes {
            match change {
                Change::Added(file) => match self.parser.parse(&file) {
                    Ok(note) => {
                        index.add(&note)?;
                        result.added += 1;
                        progress.on_file(&file.path, FileResult::Added);
                    }
                    Err(e) => record_error(&mut result, progress, e),
                },
                Change::Modified(file) => match self.parser.parse(&file) {
                    Ok(note) => {
                        index.update(&note)?;
                        result.modified += 1;
                        progress.on_file(&file.path, FileResult::Modified);
                    }
                    Err(e) => record_error(&mut result, progress, e),
                },
                Change::Removed(file) => {
                    index.remove(&file.path)?;
                    result.removed += 1;
                    progress.on_file(&file.path, FileResult::Removed);
                }
            }
        }

        progress.on_complete(
            result.added + result.modified + result.removed,
            result.errors.len(),
        );
        Ok(result)
    }
}

fn record_error<R: ProgressReporter>(result: &mut SyncResult, progress: &mut R, error: SyncError) {
    progress.on_file(error.path(), FileResult::Error(error.message().to_string()));
    result.errors.push(error);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Link;
    use chrono::{DateTime, TimeZone, Utc};
    use pretty_assertions::assert_eq;

    // ===========================================
    // Test Helpers
    // ===========================================

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 10, minute, 0).unwrap()
    }

    fn file(path: &str, minute: u32) -> FileMetadata {
        FileMetadata::new(path, at(minute))
    }

    /// Parses every file into a note titled after its path, failing on `bad/` paths.
    fn parse(file: &FileMetadata) -> Result<NoteRecord, SyncError> {
        if file.path.starts_with("bad/") {
            return Err(SyncError::Parse {
                path: file.path.clone(),
                message: "unterminated front matter".to_string(),
            });
        }
        let note = NoteRecord::builder(file.path.clone(), format!("# {}", file.path), file.modified)
            .title(file.path.trim_end_matches(".md"))
            .links(vec![Link::new("target")])
            .build()
            .unwrap();
        Ok(note)
    }

    #[derive(Default)]
    struct RecordingReporter {
        files: Vec<(String, FileResult)>,
        completed: Option<(usize, usize)>,
    }

    impl ProgressReporter for RecordingReporter {
        fn on_file(&mut self, path: &str, result: FileResult) {
            self.files.push((path.to_string(), result));
        }

        fn on_complete(&mut self, changed: usize, errors: usize) {
            self.completed = Some((changed, errors));
        }
    }

    fn ok(files: Vec<FileMetadata>) -> Vec<IndexResult<FileMetadata>> {
        files.into_iter().map(Ok).collect()
    }

    // ===========================================
    // diff Tests
    // ===========================================

    #[test]
    fn diff_classifies_changes() {
        let source = vec![file("b.md", 1), file("a.md", 2), file("d.md", 0)];
        let indexed = ok(vec![file("a.md", 1), file("b.md", 1), file("c.md", 0)]);

        let changes = diff(&source, indexed).unwrap();

        assert_eq!(
            changes,
            vec![
                Change::Modified(file("a.md", 2)),
                Change::Removed(file("c.md", 0)),
                Change::Added(file("d.md", 0)),
            ]
        );
    }

    #[test]
    fn diff_uses_directory_order() {
        // `a/z.md` sorts before `a-b.md` once `/` becomes the separator
        let source = vec![file("a-b.md", 0), file("a/z.md", 0)];
        let indexed = ok(vec![file("a/z.md", 0), file("a-b.md", 0)]);

        assert!(diff(&source, indexed).unwrap().is_empty());
    }

    #[test]
    fn diff_against_empty_index_adds_everything() {
        let changes = diff(&[file("x.md", 0)], Vec::new()).unwrap();
        assert_eq!(changes, vec![Change::Added(file("x.md", 0))]);
    }

    // ===========================================
    // sync Tests
    // ===========================================

    #[test]
    fn sync_indexes_new_files() {
        let mut index = SqliteIndex::open_in_memory().unwrap();
        let mut builder = IndexBuilder::new(parse);

        let result = builder
            .sync(&mut index, &[file("one.md", 0), file("two.md", 0)])
            .unwrap();

        assert_eq!(result.added, 2);
        assert_eq!(index.count().unwrap(), 2);
    }

    #[test]
    fn second_sync_without_changes_is_a_no_op() {
        let mut index = SqliteIndex::open_in_memory().unwrap();
        let mut builder = IndexBuilder::new(parse);
        let files = [file("one.md", 0), file("dir/two.md", 0)];

        builder.sync(&mut index, &files).unwrap();
        let result = builder.sync(&mut index, &files).unwrap();

        assert_eq!((result.added, result.modified, result.removed), (0, 0, 0));
    }

    #[test]
    fn sync_updates_and_removes() {
        let mut index = SqliteIndex::open_in_memory().unwrap();
        let mut builder = IndexBuilder::new(parse);
        builder
            .sync(&mut index, &[file("one.md", 0), file("two.md", 0)])
            .unwrap();

        let mut reporter = RecordingReporter::default();
        let result = builder
            .sync_with_progress(&mut index, &[file("one.md", 5)], &mut reporter)
            .unwrap();

        assert_eq!((result.added, result.modified, result.removed), (0, 1, 1));
        assert_eq!(
            reporter.files,
            vec![
                ("one.md".to_string(), FileResult::Modified),
                ("two.md".to_string(), FileResult::Removed),
            ]
        );
        assert_eq!(reporter.completed, Some((2, 0)));
        assert_eq!(index.indexed().next().unwrap().unwrap(), file("one.md", 5));
    }

    #[test]
    fn parse_errors_are_collected() {
        let mut index = SqliteIndex::open_in_memory().unwrap();
        let mut builder = IndexBuilder::new(parse);

        let result = builder
            .sync(&mut index, &[file("bad/one.md", 0), file("good.md", 0)])
            .unwrap();

        assert_eq!(result.added, 1);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].path(), "bad/one.md");
        assert!(result.errors[0].to_string().contains("unterminated"));
    }
}
