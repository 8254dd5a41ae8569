//! SQLite schema creation for the notes index.

use rusqlite::Connection;

/// Current schema version recorded in `schema_version`.
pub const SCHEMA_VERSION: i64 = 1;

/// Creates the database schema for the notes index.
///
/// Idempotent: every statement uses `IF NOT EXISTS`.
///
/// # Tables Created
/// - `notes` - One row per indexed note, including raw content and metadata JSON
/// - `links` - Outbound links; `target_id` is NULL until the href resolves
/// - `tags` - Distinct `(kind, name)` pairs
/// - `note_tags` - Many-to-many junction for notes and tags
/// - `notes_fts` - FTS5 index over title, body and raw content
/// - `schema_version` - Schema version tracking
pub fn create_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;

    // ===========================================
    // Notes
    // ===========================================
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS notes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            path TEXT NOT NULL UNIQUE,
            sortable_path TEXT NOT NULL,
            title TEXT NOT NULL DEFAULT '',
            lead TEXT NOT NULL DEFAULT '',
            body TEXT NOT NULL DEFAULT '',
            raw_content TEXT NOT NULL DEFAULT '',
            word_count INTEGER NOT NULL DEFAULT 0,
            metadata TEXT NOT NULL DEFAULT '{}',
            checksum TEXT NOT NULL,
            created TEXT NOT NULL,
            modified TEXT NOT NULL
        );",
    )?;

    // ===========================================
    // Links
    // ===========================================
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS links (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            source_id INTEGER NOT NULL REFERENCES notes(id) ON DELETE CASCADE,
            target_id INTEGER REFERENCES notes(id) ON DELETE SET NULL,
            title TEXT NOT NULL DEFAULT '',
            href TEXT NOT NULL,
            external INTEGER NOT NULL DEFAULT 0,
            rels TEXT NOT NULL DEFAULT '',
            snippet TEXT NOT NULL DEFAULT '',
            snippet_start INTEGER NOT NULL DEFAULT 0,
            snippet_end INTEGER NOT NULL DEFAULT 0
        );",
    )?;

    // ===========================================
    // Tags
    // ===========================================
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS tags (
            id INTEGER PRIMARY KEY,
            kind TEXT NOT NULL,
            name TEXT NOT NULL,
            UNIQUE(kind, name)
        );

        CREATE TABLE IF NOT EXISTS note_tags (
            note_id INTEGER NOT NULL REFERENCES notes(id) ON DELETE CASCADE,
            tag_id INTEGER NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
            PRIMARY KEY (note_id, tag_id)
        );",
    )?;

    // ===========================================
    // Indexes
    // ===========================================
    // The partial index on unresolved hrefs backs the link backfill pass.
    conn.execute_batch(
        "CREATE INDEX IF NOT EXISTS idx_notes_sortable_path ON notes(sortable_path);
         CREATE INDEX IF NOT EXISTS idx_notes_created ON notes(created);
         CREATE INDEX IF NOT EXISTS idx_notes_modified ON notes(modified);
         CREATE INDEX IF NOT EXISTS idx_links_source ON links(source_id);
         CREATE INDEX IF NOT EXISTS idx_links_target ON links(target_id);
         CREATE INDEX IF NOT EXISTS idx_links_unresolved_href
             ON links(href) WHERE target_id IS NULL;
         CREATE INDEX IF NOT EXISTS idx_note_tags_tag ON note_tags(tag_id);",
    )?;

    // ===========================================
    // Full-Text Search
    // ===========================================
    // Column names must match the notes table for external content
    conn.execute_batch(
        "CREATE VIRTUAL TABLE IF NOT EXISTS notes_fts USING fts5(
            title,
            body,
            raw_content,
            content='notes',
            content_rowid='id',
            tokenize='porter unicode61 remove_diacritics 1'
        );

        CREATE TRIGGER IF NOT EXISTS notes_fts_insert
        AFTER INSERT ON notes BEGIN
            INSERT INTO notes_fts(rowid, title, body, raw_content)
            VALUES (NEW.id, NEW.title, NEW.body, NEW.raw_content);
        END;

        CREATE TRIGGER IF NOT EXISTS notes_fts_delete
        AFTER DELETE ON notes BEGIN
            INSERT INTO notes_fts(notes_fts, rowid, title, body, raw_content)
            VALUES ('delete', OLD.id, OLD.title, OLD.body, OLD.raw_content);
        END;

        CREATE TRIGGER IF NOT EXISTS notes_fts_update
        AFTER UPDATE ON notes BEGIN
            INSERT INTO notes_fts(notes_fts, rowid, title, body, raw_content)
            VALUES ('delete', OLD.id, OLD.title, OLD.body, OLD.raw_content);
            INSERT INTO notes_fts(rowid, title, body, raw_content)
            VALUES (NEW.id, NEW.title, NEW.body, NEW.raw_content);
        END;",
    )?;

    // ===========================================
    // Schema Version
    // ===========================================
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL
        );",
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version, applied_at) VALUES (?, datetime('now'))",
        [SCHEMA_VERSION],
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_exists(conn: &Connection, name: &str) -> bool {
        conn.query_row(
            "SELECT 1 FROM sqlite_master WHERE name = ?",
            [name],
            |_| Ok(true),
        )
        .unwrap_or(false)
    }

    #[test]
    fn creates_all_tables() {
        let conn = Connection::open_in_memory().unwrap();
        create_schema(&conn).unwrap();

        for table in ["notes", "links", "tags", "note_tags", "notes_fts", "schema_version"] {
            assert!(table_exists(&conn, table), "{} should exist", table);
        }
    }

    #[test]
    fn is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        create_schema(&conn).unwrap();
        create_schema(&conn).unwrap();

        let versions: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_version", [], |row| row.get(0))
            .unwrap();
        assert_eq!(versions, 1);
    }

    #[test]
    fn fts_tracks_inserted_notes() {
        let conn = Connection::open_in_memory().unwrap();
        create_schema(&conn).unwrap();
        conn.execute(
            "INSERT INTO notes (path, sortable_path, title, body, checksum, created, modified)
             VALUES ('a.md', 'a.md', 'Borrow checker', 'lifetimes everywhere', 'x', 't', 't')",
            [],
        )
        .unwrap();

        let hits: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM notes_fts WHERE notes_fts MATCH 'lifetimes'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(hits, 1);
    }

    #[test]
    fn deleting_target_unresolves_links() {
        let conn = Connection::open_in_memory().unwrap();
        create_schema(&conn).unwrap();
        conn.execute_batch(
            "INSERT INTO notes (id, path, sortable_path, checksum, created, modified)
                VALUES (1, 'a.md', 'a.md', 'x', 't', 't'), (2, 'b.md', 'b.md', 'x', 't', 't');
             INSERT INTO links (source_id, target_id, href) VALUES (1, 2, 'b');
             DELETE FROM notes WHERE id = 2;",
        )
        .unwrap();

        let target: Option<i64> = conn
            .query_row("SELECT target_id FROM links", [], |row| row.get(0))
            .unwrap();
        assert_eq!(target, None);
    }
}
