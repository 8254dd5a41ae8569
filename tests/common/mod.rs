//! Test fixture utilities for integration tests.

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use notegraph::domain::{Link, Metadata, MetadataValue, NoteId, NoteRecord, Tag};
use notegraph::index::{IndexRepository, SqliteIndex};
use notegraph::query::FilterCriteria;

/// Returns midnight UTC on the given day of January 2024.
pub fn day(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap()
}

// ===========================================
// TestNote Builder
// ===========================================

/// Builder for note records with sensible test defaults.
///
/// The title defaults to the file stem and both dates default to day 1.
pub struct TestNote {
    path: String,
    title: Option<String>,
    body: String,
    tags: Vec<String>,
    links: Vec<Link>,
    metadata: Metadata,
    created: DateTime<Utc>,
    modified: DateTime<Utc>,
}

impl TestNote {
    pub fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
            title: None,
            body: String::new(),
            tags: Vec::new(),
            links: Vec::new(),
            metadata: Metadata::new(),
            created: day(1),
            modified: day(1),
        }
    }

    pub fn title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    pub fn body(mut self, body: &str) -> Self {
        self.body = body.to_string();
        self
    }

    pub fn tag(mut self, tag: &str) -> Self {
        self.tags.push(tag.to_string());
        self
    }

    /// Adds an internal link to `href`.
    pub fn link(self, href: &str) -> Self {
        self.with_link(Link::new(href))
    }

    pub fn with_link(mut self, link: Link) -> Self {
        self.links.push(link);
        self
    }

    pub fn alias(mut self, alias: &str) -> Self {
        let entry = self
            .metadata
            .entry("aliases".to_string())
            .or_insert_with(|| MetadataValue::List(Vec::new()));
        if let MetadataValue::List(items) = entry {
            items.push(MetadataValue::String(alias.to_string()));
        }
        self
    }

    pub fn created(mut self, at: DateTime<Utc>) -> Self {
        self.created = at;
        self
    }

    pub fn modified(mut self, at: DateTime<Utc>) -> Self {
        self.modified = at;
        self
    }

    pub fn build(self) -> NoteRecord {
        let title = self.title.unwrap_or_else(|| {
            let stem = self.path.rsplit('/').next().unwrap_or(&self.path);
            stem.trim_end_matches(".md").to_string()
        });
        let lead = self.body.split("\n\n").next().unwrap_or_default().to_string();

        NoteRecord::builder(
            self.path,
            format!("# {}\n\n{}", title, self.body),
            self.modified,
        )
        .title(title)
        .lead(lead)
        .body(self.body)
        .metadata(self.metadata)
        .created(self.created)
        .tags(self.tags.iter().map(|t| Tag::new(t).unwrap()))
        .links(self.links)
        .build()
        .unwrap()
    }
}

// ===========================================
// TestIndex
// ===========================================

/// An in-memory index with shorthand for adding notes and querying paths.
pub struct TestIndex {
    pub index: SqliteIndex,
}

impl TestIndex {
    pub fn new() -> Self {
        Self {
            index: SqliteIndex::open_in_memory().unwrap(),
        }
    }

    /// Creates an index holding `notes`, added in order.
    pub fn with_notes(notes: impl IntoIterator<Item = TestNote>) -> Self {
        let mut test = Self::new();
        for note in notes {
            test.add(note);
        }
        test
    }

    pub fn add(&mut self, note: TestNote) -> NoteId {
        self.index.add(&note.build()).unwrap()
    }

    /// Runs `criteria` and returns the matching paths in result order.
    pub fn paths(&self, criteria: FilterCriteria) -> Vec<String> {
        self.index
            .find(&criteria)
            .unwrap()
            .paths()
            .into_iter()
            .map(String::from)
            .collect()
    }

    /// Runs `criteria` and returns the matching paths sorted by name.
    pub fn sorted_paths(&self, criteria: FilterCriteria) -> Vec<String> {
        let mut paths = self.paths(criteria);
        paths.sort();
        paths
    }
}
