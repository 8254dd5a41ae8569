//! RAII write units backed by SQLite savepoints.

use crate::index::IndexResult;
use rusqlite::Connection;

const SAVEPOINT: &str = "note_write";

/// A write unit with RAII-based automatic rollback.
///
/// Implemented with a savepoint rather than `BEGIN`, so a unit behaves as a
/// transaction on its own and nests cleanly when the caller already opened
/// one. The unit rolls back when dropped unless `commit()` is called.
pub struct Transaction<'a> {
    conn: &'a Connection,
    finished: bool,
}

impl<'a> Transaction<'a> {
    pub(crate) fn begin(conn: &'a Connection) -> IndexResult<Self> {
        conn.execute_batch(&format!("SAVEPOINT {SAVEPOINT}"))?;
        Ok(Self {
            conn,
            finished: false,
        })
    }

    /// Returns a reference to the underlying connection.
    pub(crate) fn conn(&self) -> &Connection {
        self.conn
    }

    /// Commits the unit.
    pub fn commit(mut self) -> IndexResult<()> {
        self.conn.execute_batch(&format!("RELEASE {SAVEPOINT}"))?;
        self.finished = true;
        Ok(())
    }

    /// Rolls back the unit explicitly.
    pub fn rollback(mut self) -> IndexResult<()> {
        self.undo()?;
        self.finished = true;
        Ok(())
    }

    fn undo(&self) -> rusqlite::Result<()> {
        self.conn
            .execute_batch(&format!("ROLLBACK TO {SAVEPOINT}; RELEASE {SAVEPOINT}"))
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if !self.finished {
            // Attempt rollback, but ignore errors since we're in drop
            let _ = self.undo();
        }
    }
}
