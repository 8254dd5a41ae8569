//! The indexed representation of a note.

use crate::domain::{Link, Metadata, Tag};
use crate::infra::{ContentHash, normalize_path};
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::fmt;

/// The kind of error that occurred when constructing a note.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseNoteErrorKind {
    EmptyPath,
}

/// Error returned when constructing an invalid note.
#[derive(Debug, Clone)]
pub struct ParseNoteError {
    kind: ParseNoteErrorKind,
}

impl fmt::Display for ParseNoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ParseNoteErrorKind::EmptyPath => write!(f, "invalid note: path cannot be empty"),
        }
    }
}

impl std::error::Error for ParseNoteError {}

/// A note as handed to and returned by the index.
///
/// The record carries everything the content parser extracted from a file:
/// title, lead paragraph, body, raw content, metadata, tags and outbound
/// links. The checksum is derived from the raw content at build time.
///
/// # Examples
///
/// ```
/// use notegraph::domain::NoteRecord;
/// use chrono::Utc;
///
/// let now = Utc::now();
/// let note = NoteRecord::builder("ideas/rust.md", "# Rust\n\nOwnership.", now)
///     .title("Rust")
///     .body("Ownership.")
///     .build()
///     .unwrap();
/// assert_eq!(note.path(), "ideas/rust.md");
/// assert_eq!(note.word_count(), 1);
/// ```
#[derive(Clone, PartialEq)]
pub struct NoteRecord {
    path: String,
    title: String,
    lead: String,
    body: String,
    raw_content: String,
    word_count: u32,
    metadata: Metadata,
    checksum: ContentHash,
    created: DateTime<Utc>,
    modified: DateTime<Utc>,
    tags: BTreeSet<Tag>,
    links: Vec<Link>,
}

impl NoteRecord {
    /// Creates a builder for a note at `path` with the given raw content.
    ///
    /// `created` defaults to `modified` unless set explicitly.
    pub fn builder(
        path: impl Into<String>,
        raw_content: impl Into<String>,
        modified: DateTime<Utc>,
    ) -> NoteRecordBuilder {
        NoteRecordBuilder {
            path: path.into(),
            raw_content: raw_content.into(),
            title: String::new(),
            lead: String::new(),
            body: String::new(),
            word_count: None,
            metadata: Metadata::new(),
            created: None,
            modified,
            tags: BTreeSet::new(),
            links: Vec::new(),
        }
    }

    /// Returns the normalized path relative to the notebook root.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the first paragraph of the body.
    pub fn lead(&self) -> &str {
        &self.lead
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// Returns the file content as read from disk, front matter included.
    pub fn raw_content(&self) -> &str {
        &self.raw_content
    }

    pub fn word_count(&self) -> u32 {
        self.word_count
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Returns the checksum of the raw content.
    pub fn checksum(&self) -> &ContentHash {
        &self.checksum
    }

    pub fn created(&self) -> DateTime<Utc> {
        self.created
    }

    pub fn modified(&self) -> DateTime<Utc> {
        self.modified
    }

    pub fn tags(&self) -> &BTreeSet<Tag> {
        &self.tags
    }

    /// Returns the outbound links in authoring order.
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub(crate) fn with_links(mut self, links: Vec<Link>) -> Self {
        self.links = links;
        self
    }
}

impl fmt::Display for NoteRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.title, self.path)
    }
}

impl fmt::Debug for NoteRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NoteRecord")
            .field("path", &self.path)
            .field("title", &self.title)
            .field("word_count", &self.word_count)
            .field("created", &self.created)
            .field("modified", &self.modified)
            .field("tags", &self.tags)
            .field("links", &self.links)
            .finish_non_exhaustive()
    }
}

/// Builder for [`NoteRecord`].
pub struct NoteRecordBuilder {
    path: String,
    raw_content: String,
    title: String,
    lead: String,
    body: String,
    word_count: Option<u32>,
    metadata: Metadata,
    created: Option<DateTime<Utc>>,
    modified: DateTime<Utc>,
    tags: BTreeSet<Tag>,
    links: Vec<Link>,
}

impl NoteRecordBuilder {
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn lead(mut self, lead: impl Into<String>) -> Self {
        self.lead = lead.into();
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Overrides the word count; by default the body's words are counted.
    pub fn word_count(mut self, count: u32) -> Self {
        self.word_count = Some(count);
        self
    }

    pub fn metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn created(mut self, created: DateTime<Utc>) -> Self {
        self.created = Some(created);
        self
    }

    /// Sets the tags; duplicates collapse.
    pub fn tags(mut self, tags: impl IntoIterator<Item = Tag>) -> Self {
        self.tags = tags.into_iter().collect();
        self
    }

    pub fn links(mut self, links: Vec<Link>) -> Self {
        self.links = links;
        self
    }

    /// Builds the record, normalizing the path and computing the checksum.
    ///
    /// # Errors
    ///
    /// Returns `ParseNoteError` if the path is empty after normalization.
    pub fn build(self) -> Result<NoteRecord, ParseNoteError> {
        let path = normalize_path(&self.path);
        if path.is_empty() {
            return Err(ParseNoteError {
                kind: ParseNoteErrorKind::EmptyPath,
            });
        }

        let word_count = self
            .word_count
            .unwrap_or_else(|| self.body.split_whitespace().count() as u32);

        Ok(NoteRecord {
            path,
            checksum: ContentHash::compute(self.raw_content.as_bytes()),
            raw_content: self.raw_content,
            title: self.title,
            lead: self.lead,
            body: self.body,
            word_count,
            metadata: self.metadata,
            created: self.created.unwrap_or(self.modified),
            modified: self.modified,
            tags: self.tags,
            links: self.links,
        })
    }
}
