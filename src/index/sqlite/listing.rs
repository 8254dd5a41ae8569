//! Paged listing of indexed files in directory-contiguous order.

use super::{SqliteIndex, decode_time};
use crate::index::IndexResult;
use crate::infra::FileMetadata;
use rusqlite::Connection;
use std::collections::VecDeque;

const PAGE_SIZE: i64 = 256;

impl SqliteIndex {
    /// Lists every indexed `(path, modified)` pair ordered by sortable path.
    ///
    /// Rows are fetched lazily in pages. Each call starts a fresh listing.
    pub fn indexed(&self) -> IndexedFiles<'_> {
        IndexedFiles::new(&self.conn)
    }
}

/// Iterator over indexed files, returned by [`SqliteIndex::indexed`].
///
/// Pages are keyed on the last sortable path seen, so the listing never holds
/// a statement open between calls to `next()`.
pub struct IndexedFiles<'a> {
    conn: &'a Connection,
    cursor: Option<String>,
    buffer: VecDeque<FileMetadata>,
    exhausted: bool,
}

impl<'a> IndexedFiles<'a> {
    fn new(conn: &'a Connection) -> Self {
        Self {
            conn,
            cursor: None,
            buffer: VecDeque::new(),
            exhausted: false,
        }
    }

    fn fetch_page(&mut self) -> IndexResult<()> {
        let conn = self.conn;
        let mut stmt = conn.prepare_cached(
            "SELECT path, sortable_path, modified FROM notes
             WHERE ?1 IS NULL OR sortable_path > ?1
             ORDER BY sortable_path
             LIMIT ?2",
        )?;

        let rows = stmt
            .query_map(rusqlite::params![self.cursor, PAGE_SIZE], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        if (rows.len() as i64) < PAGE_SIZE {
            self.exhausted = true;
        }

        for (path, sortable, modified) in rows {
            self.buffer.push_back(FileMetadata {
                path,
                modified: decode_time(&modified)?,
            });
            self.cursor = Some(sortable);
        }
        Ok(())
    }
}

impl Iterator for IndexedFiles<'_> {
    type Item = IndexResult<FileMetadata>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.buffer.is_empty() && !self.exhausted {
            if let Err(e) = self.fetch_page() {
                self.exhausted = true;
                self.buffer.clear();
                return Some(Err(e));
            }
        }
        self.buffer.pop_front().map(Ok)
    }
}
