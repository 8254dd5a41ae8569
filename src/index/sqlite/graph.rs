//! Link graph and note lookups backing query compilation.

use super::repo_impl::find_id_by_path_prefix;
use super::{SqliteIndex, join_ids};
use crate::domain::{Metadata, NoteId, metadata_from_json};
use crate::index::IndexResult;
use crate::query::{Hop, LinkDirection, LinkGraph, NoteLookup};
use rusqlite::OptionalExtension;
use tracing::warn;

impl NoteLookup for SqliteIndex {
    fn resolve_path(&self, path: &str) -> IndexResult<Option<NoteId>> {
        find_id_by_path_prefix(&self.conn, path)
    }

    fn note_names(&self, id: NoteId) -> IndexResult<Option<(String, Metadata)>> {
        let row: Option<(String, String, String)> = self
            .conn
            .query_row(
                "SELECT path, title, metadata FROM notes WHERE id = ?",
                [id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;

        Ok(row.map(|(path, title, json)| {
            let metadata = metadata_from_json(&json).unwrap_or_else(|e| {
                warn!(path = %path, error = %e, "cannot decode note metadata");
                Metadata::new()
            });
            (title, metadata)
        }))
    }
}

impl LinkGraph for SqliteIndex {
    fn hops(&self, nodes: &[NoteId], direction: LinkDirection) -> IndexResult<Vec<Hop>> {
        if nodes.is_empty() {
            return Ok(Vec::new());
        }
        let ids = join_ids(nodes);

        let mut hops = Vec::new();
        if matches!(direction, LinkDirection::Outgoing | LinkDirection::Both) {
            let sql = format!(
                "SELECT source_id, target_id, title, snippet FROM links
                 WHERE target_id IS NOT NULL AND source_id IN ({})
                 ORDER BY id",
                ids
            );
            self.collect_hops(&sql, &mut hops)?;
        }
        if matches!(direction, LinkDirection::Incoming | LinkDirection::Both) {
            let sql = format!(
                "SELECT target_id, source_id, title, snippet FROM links
                 WHERE target_id IN ({})
                 ORDER BY id",
                ids
            );
            self.collect_hops(&sql, &mut hops)?;
        }
        Ok(hops)
    }
}

impl SqliteIndex {
    fn collect_hops(&self, sql: &str, hops: &mut Vec<Hop>) -> IndexResult<()> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map([], |row| {
            Ok(Hop {
                from: row.get(0)?,
                to: row.get(1)?,
                title: row.get(2)?,
                snippet: row.get(3)?,
            })
        })?;
        for hop in rows {
            hops.push(hop?);
        }
        Ok(())
    }
}
