//! Link storage and target resolution.
//!
//! A link's target is resolved when the link is written, by looking up the
//! first note whose path starts with the href. Links written before their
//! target exists stay unresolved until the target is indexed, at which point
//! [`backfill_targets`] points them at the new note.

use super::repo_impl::find_id_by_path_prefix;
use crate::domain::{Link, NoteId, NoteRecord, join_rels, split_rels};
use crate::index::IndexResult;
use crate::infra::path_prefixes;
use rusqlite::{Connection, ToSql, params};
use tracing::debug;

/// Stores the outbound links of `note`, then heals links elsewhere that were
/// waiting for a note at its path.
pub(super) fn insert_links(conn: &Connection, source: NoteId, note: &NoteRecord) -> IndexResult<()> {
    let mut stmt = conn.prepare_cached(
        "INSERT INTO links (source_id, target_id, title, href, external, rels,
                            snippet, snippet_start, snippet_end)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
    )?;

    for link in note.links() {
        let target = resolve_target(conn, link)?;
        let (start, end) = link.snippet_range();
        stmt.execute(params![
            source,
            target,
            link.link_title(),
            link.href(),
            link.is_external(),
            join_rels(link.rels()),
            link.snippet_text(),
            start as i64,
            end as i64,
        ])?;
    }

    let healed = backfill_targets(conn, source, note.path())?;
    if healed > 0 {
        debug!(path = note.path(), healed, "resolved forward links");
    }
    Ok(())
}

/// Deletes every outbound link of `source`.
pub(super) fn remove_links(conn: &Connection, source: NoteId) -> IndexResult<()> {
    conn.execute("DELETE FROM links WHERE source_id = ?", [source])?;
    Ok(())
}

/// Loads the outbound links of `source` in authoring order.
pub(crate) fn load_links(conn: &Connection, source: NoteId) -> IndexResult<Vec<Link>> {
    let mut stmt = conn.prepare_cached(
        "SELECT title, href, external, rels, snippet, snippet_start, snippet_end, target_id
         FROM links WHERE source_id = ? ORDER BY id",
    )?;

    let links = stmt
        .query_map([source], |row| {
            let title: String = row.get(0)?;
            let href: String = row.get(1)?;
            let external: bool = row.get(2)?;
            let rels: String = row.get(3)?;
            let snippet: String = row.get(4)?;
            let start: i64 = row.get(5)?;
            let end: i64 = row.get(6)?;
            let target: Option<NoteId> = row.get(7)?;

            Ok(Link::new(href)
                .title(title)
                .external(external)
                .snippet(snippet, start.max(0) as usize, end.max(0) as usize)
                .with_rels(split_rels(&rels))
                .with_target(target))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(links)
}

fn resolve_target(conn: &Connection, link: &Link) -> IndexResult<Option<NoteId>> {
    if link.is_external() || link.href().is_empty() {
        return Ok(None);
    }
    find_id_by_path_prefix(conn, link.href())
}

/// Points unresolved internal links at `target` when their href is a prefix
/// of `path`. Returns the number of links healed.
pub(super) fn backfill_targets(conn: &Connection, target: NoteId, path: &str) -> IndexResult<usize> {
    let prefixes = path_prefixes(path);
    if prefixes.is_empty() {
        return Ok(0);
    }

    let placeholders = vec!["?"; prefixes.len()].join(", ");
    let sql = format!(
        "UPDATE links SET target_id = ?
         WHERE target_id IS NULL AND external = 0 AND href IN ({})",
        placeholders
    );

    let mut bindings: Vec<&dyn ToSql> = Vec::with_capacity(prefixes.len() + 1);
    bindings.push(&target);
    for prefix in &prefixes {
        bindings.push(prefix);
    }

    let healed = conn.execute(&sql, bindings.as_slice())?;
    Ok(healed)
}
