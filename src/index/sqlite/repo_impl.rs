//! IndexRepository trait implementation for SqliteIndex.

use super::{SqliteIndex, encode_time, links};
use crate::domain::{NoteId, NoteRecord, Tag, TagKind, metadata_to_json};
use crate::index::{FindResult, IndexError, IndexRepository, IndexResult};
use crate::infra::{ContentHash, normalize_path, sortable_path};
use crate::query::{FilterCompiler, FilterCriteria, executor, expand_mentions};
use rusqlite::{Connection, OptionalExtension, params};
use std::collections::BTreeSet;
use tracing::debug;

impl IndexRepository for SqliteIndex {
    fn add(&mut self, note: &NoteRecord) -> IndexResult<NoteId> {
        let tx = self.transaction()?;

        if find_id_by_path(tx.conn(), note.path())?.is_some() {
            return Err(IndexError::DuplicatePath {
                path: note.path().to_string(),
            });
        }

        let metadata = encode_metadata(note)?;
        tx.conn().execute(
            "INSERT INTO notes (path, sortable_path, title, lead, body, raw_content,
                                word_count, metadata, checksum, created, modified)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                note.path(),
                sortable_path(note.path()),
                note.title(),
                note.lead(),
                note.body(),
                note.raw_content(),
                note.word_count(),
                metadata,
                note.checksum().as_str(),
                encode_time(note.created()),
                encode_time(note.modified()),
            ],
        )?;
        let id = NoteId::from_raw(tx.conn().last_insert_rowid());

        write_tags(tx.conn(), id, note.tags())?;
        links::insert_links(tx.conn(), id, note)?;

        tx.commit()?;
        debug!(path = note.path(), id = %id, "indexed note");
        Ok(id)
    }

    fn update(&mut self, note: &NoteRecord) -> IndexResult<NoteId> {
        let tx = self.transaction()?;

        let id = find_id_by_path(tx.conn(), note.path())?.ok_or_else(|| IndexError::NotFound {
            path: note.path().to_string(),
        })?;

        let metadata = encode_metadata(note)?;
        tx.conn().execute(
            "UPDATE notes SET title = ?1, lead = ?2, body = ?3, raw_content = ?4,
                              word_count = ?5, metadata = ?6, checksum = ?7,
                              created = ?8, modified = ?9
             WHERE id = ?10",
            params![
                note.title(),
                note.lead(),
                note.body(),
                note.raw_content(),
                note.word_count(),
                metadata,
                note.checksum().as_str(),
                encode_time(note.created()),
                encode_time(note.modified()),
                id,
            ],
        )?;

        tx.conn()
            .execute("DELETE FROM note_tags WHERE note_id = ?", [id])?;
        write_tags(tx.conn(), id, note.tags())?;

        links::remove_links(tx.conn(), id)?;
        links::insert_links(tx.conn(), id, note)?;

        tx.commit()?;
        debug!(path = note.path(), id = %id, "updated note");
        Ok(id)
    }

    fn remove(&mut self, path: &str) -> IndexResult<()> {
        let path = normalize_path(path);
        let tx = self.transaction()?;

        let id = find_id_by_path(tx.conn(), &path)?
            .ok_or_else(|| IndexError::NotFound { path: path.clone() })?;

        // Outbound links and tag associations cascade; inbound links become unresolved
        tx.conn().execute("DELETE FROM notes WHERE id = ?", [id])?;

        tx.commit()?;
        debug!(path = %path, id = %id, "removed note");
        Ok(())
    }

    fn find_id_by_path(&self, path: &str) -> IndexResult<Option<NoteId>> {
        find_id_by_path(&self.conn, &normalize_path(path))
    }

    fn find_id_by_path_prefix(&self, prefix: &str) -> IndexResult<Option<NoteId>> {
        find_id_by_path_prefix(&self.conn, prefix)
    }

    fn find(&self, criteria: &FilterCriteria) -> IndexResult<FindResult> {
        let criteria = expand_mentions(criteria, self)?;
        let plan = FilterCompiler::new(self, self).compile(&criteria)?;
        executor::execute(&self.conn, &plan, self.snippet_style())
    }
}

impl SqliteIndex {
    /// Returns the stored checksum of the note at `path`, if indexed.
    pub fn checksum(&self, path: &str) -> IndexResult<Option<ContentHash>> {
        let stored: Option<String> = self
            .conn
            .query_row(
                "SELECT checksum FROM notes WHERE path = ?",
                [normalize_path(path)],
                |row| row.get(0),
            )
            .optional()?;

        stored
            .map(|hex| {
                ContentHash::from_hex(&hex)
                    .map_err(|e| IndexError::Corrupt(format!("invalid checksum: {}", e)))
            })
            .transpose()
    }

    /// Returns the number of indexed notes.
    pub fn count(&self) -> IndexResult<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM notes", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

// ===========================================
// Shared Lookups
// ===========================================

pub(super) fn find_id_by_path(conn: &Connection, path: &str) -> IndexResult<Option<NoteId>> {
    let id = conn
        .query_row("SELECT id FROM notes WHERE path = ?", [path], |row| {
            row.get(0)
        })
        .optional()?;
    Ok(id)
}

/// Finds the first note in sortable order whose path starts with `prefix`.
///
/// The range condition lets SQLite seek on the unique path index before the
/// exact prefix check runs.
pub(super) fn find_id_by_path_prefix(
    conn: &Connection,
    prefix: &str,
) -> IndexResult<Option<NoteId>> {
    if prefix.is_empty() {
        return Ok(None);
    }

    let id = conn
        .query_row(
            "SELECT id FROM notes
             WHERE path >= ?1 AND substr(path, 1, length(?1)) = ?1
             ORDER BY sortable_path
             LIMIT 1",
            [prefix],
            |row| row.get(0),
        )
        .optional()?;
    Ok(id)
}

pub(crate) fn load_tags(conn: &Connection, id: NoteId) -> IndexResult<BTreeSet<Tag>> {
    let mut stmt = conn.prepare_cached(
        "SELECT t.kind, t.name FROM tags t
         JOIN note_tags nt ON t.id = nt.tag_id
         WHERE nt.note_id = ?",
    )?;

    let rows = stmt.query_map([id], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
    })?;

    let mut tags = BTreeSet::new();
    for row in rows {
        let (kind, name) = row?;
        let kind = TagKind::from_name(&kind)
            .ok_or_else(|| IndexError::Corrupt(format!("unknown tag kind '{}'", kind)))?;
        let tag = Tag::with_kind(kind, &name)
            .map_err(|e| IndexError::Corrupt(format!("invalid stored tag: {}", e)))?;
        tags.insert(tag);
    }
    Ok(tags)
}

fn write_tags(conn: &Connection, id: NoteId, tags: &BTreeSet<Tag>) -> IndexResult<()> {
    for tag in tags {
        conn.execute(
            "INSERT OR IGNORE INTO tags (kind, name) VALUES (?, ?)",
            params![tag.kind().as_str(), tag.as_str()],
        )?;
        conn.execute(
            "INSERT INTO note_tags (note_id, tag_id)
             SELECT ?, id FROM tags WHERE kind = ? AND name = ?",
            params![id, tag.kind().as_str(), tag.as_str()],
        )?;
    }
    Ok(())
}

fn encode_metadata(note: &NoteRecord) -> IndexResult<String> {
    metadata_to_json(note.metadata()).map_err(|e| IndexError::Metadata {
        path: note.path().to_string(),
        source: e,
    })
}
