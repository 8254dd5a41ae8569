//! Connection management for SqliteIndex.

use super::SqliteIndex;
use super::transaction::Transaction;
use crate::index::{IndexError, IndexResult, create_schema};
use crate::query::SnippetStyle;
use rusqlite::Connection;
use std::fs;
use std::path::Path;

impl SqliteIndex {
    // ===========================================
    // In-Memory Connection
    // ===========================================

    /// Opens an in-memory SQLite database with the notes schema.
    ///
    /// This is useful for testing and temporary indexes that don't need persistence.
    pub fn open_in_memory() -> IndexResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn)
    }

    // ===========================================
    // File-Based Connection
    // ===========================================

    /// Opens or creates a SQLite database at the given path.
    ///
    /// Creates parent directories if they don't exist. Initializes the schema
    /// if this is a new database.
    pub fn open(path: &Path) -> IndexResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| IndexError::Io {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
            }
        }

        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> IndexResult<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        create_schema(&conn)?;
        Ok(Self {
            conn,
            snippet_style: SnippetStyle::default(),
        })
    }

    // ===========================================
    // Connection Accessors
    // ===========================================

    /// Returns a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    // ===========================================
    // Transaction Support
    // ===========================================

    /// Begins a write unit.
    ///
    /// The unit rolls back on drop unless `commit()` is called.
    pub fn transaction(&mut self) -> IndexResult<Transaction<'_>> {
        Transaction::begin(&self.conn)
    }
}
