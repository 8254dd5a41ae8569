//! Runs compiled plans against the SQLite store.

use crate::domain::{Metadata, NoteId, NoteRecord, metadata_from_json};
use crate::index::{FindResult, IndexError, IndexResult, NoteMatch, decode_time, load_links, load_tags};
use crate::query::SnippetStyle;
use crate::query::compiler::{QueryPlan, SnippetSource};
use crate::query::fts::map_query_error;
use crate::query::order::{self, SortKey};
use crate::query::planner::{self, columns};
use rusqlite::{Connection, OptionalExtension, Row, params_from_iter};
use tracing::{debug, warn};

/// A matching row before its content, tags and links are loaded.
struct Candidate {
    id: NoteId,
    key: SortKey,
    fts_snippet: Option<String>,
}

/// Note content read for the candidates that survive the limit.
struct Content {
    lead: String,
    body: String,
    raw_content: String,
    metadata: String,
}

/// Executes `plan` and returns the ordered, limited matches.
///
/// Candidates carry only their sort keys until they are ordered and
/// limited; content, tags and links are then loaded per match. Either every
/// match is returned or an error is; a failing row aborts the whole find.
pub fn execute(conn: &Connection, plan: &QueryPlan, style: &SnippetStyle) -> IndexResult<FindResult> {
    let query = planner::lower(plan, style);
    debug!(sql = %query.sql, params = query.params.len(), "running find query");

    let matching = plan.full_text.is_some();
    let query_error = |e| map_query_error(e, matching);

    let mut stmt = conn.prepare(&query.sql).map_err(query_error)?;
    let rows = stmt
        .query_map(params_from_iter(query.params.iter()), read_candidate)
        .map_err(query_error)?;

    let mut candidates = Vec::new();
    for row in rows {
        let mut candidate = row.map_err(query_error)??;
        candidate.key.distance = plan.distances.get(&candidate.id).copied();
        candidates.push(candidate);
    }

    candidates.sort_by(|a, b| order::compare(&plan.order, &a.key, &b.key));
    if plan.limit > 0 {
        candidates.truncate(plan.limit);
    }

    let mut matches = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let content = load_content(conn, candidate.id)?;
        let snippets = snippets_for(&candidate, &content, plan, style);
        let id = candidate.id;
        let note = into_record(conn, candidate, content)?;
        matches.push(NoteMatch::new(id, note, snippets));
    }

    Ok(FindResult::new(matches))
}

/// Reads one row. Timestamp decoding errors surface as the inner result so
/// they are not mistaken for query errors.
fn read_candidate(row: &Row<'_>) -> rusqlite::Result<IndexResult<Candidate>> {
    let created: String = row.get(columns::CREATED)?;
    let modified: String = row.get(columns::MODIFIED)?;

    let candidate = Candidate {
        id: row.get(columns::ID)?,
        key: SortKey {
            relevance: row.get(columns::RELEVANCE)?,
            distance: None,
            shuffle: row.get(columns::SHUFFLE)?,
            path: row.get(columns::PATH)?,
            title: row.get(columns::TITLE)?,
            created: match decode_time(&created) {
                Ok(t) => t,
                Err(e) => return Ok(Err(e)),
            },
            modified: match decode_time(&modified) {
                Ok(t) => t,
                Err(e) => return Ok(Err(e)),
            },
            word_count: row.get(columns::WORD_COUNT)?,
        },
        fts_snippet: row.get(columns::SNIPPET)?,
    };
    Ok(Ok(candidate))
}

fn load_content(conn: &Connection, id: NoteId) -> IndexResult<Content> {
    let mut stmt = conn.prepare_cached(
        "SELECT lead, body, raw_content, metadata FROM notes WHERE id = ?",
    )?;
    stmt.query_row([id], |row| {
        Ok(Content {
            lead: row.get(0)?,
            body: row.get(1)?,
            raw_content: row.get(2)?,
            metadata: row.get(3)?,
        })
    })
    .optional()?
    .ok_or_else(|| IndexError::Corrupt(format!("note {} vanished during find", id)))
}

fn snippets_for(
    candidate: &Candidate,
    content: &Content,
    plan: &QueryPlan,
    style: &SnippetStyle,
) -> Vec<String> {
    let snippets: Vec<String> = match plan.snippet_source {
        SnippetSource::Links => plan
            .link_snippets
            .get(&candidate.id)
            .map(|links| {
                links
                    .iter()
                    .map(|link| style.highlight(&link.text, &link.title))
                    .collect()
            })
            .unwrap_or_default(),
        SnippetSource::FullText => candidate.fts_snippet.iter().cloned().collect(),
        SnippetSource::Lead => vec![content.lead.clone()],
    };
    crate::query::snippet::dedup_snippets(snippets)
}

fn into_record(conn: &Connection, candidate: Candidate, content: Content) -> IndexResult<NoteRecord> {
    let Candidate { id, key, .. } = candidate;
    let Content {
        lead,
        body,
        raw_content,
        metadata,
    } = content;

    let metadata = metadata_from_json(&metadata).unwrap_or_else(|e| {
        warn!(path = %key.path, error = %e, "cannot decode note metadata, using empty metadata");
        Metadata::new()
    });

    NoteRecord::builder(key.path, raw_content, key.modified)
        .title(key.title)
        .lead(lead)
        .body(body)
        .word_count(key.word_count)
        .metadata(metadata)
        .created(key.created)
        .tags(load_tags(conn, id)?)
        .links(load_links(conn, id)?)
        .build()
        .map_err(|e| IndexError::Corrupt(format!("note {}: {}", id, e)))
}
