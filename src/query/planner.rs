//! Lowers a query plan to SQL.

use crate::index::{encode_time, join_ids};
use crate::query::SnippetStyle;
use crate::query::compiler::QueryPlan;
use crate::query::predicate::{DateBound, DateField, Predicate};
use rusqlite::types::Value;

/// FTS5 column weights for title, body and raw content.
const BM25_WEIGHTS: &str = "1000.0, 500.0, 1.0";

/// Index of `raw_content` in `notes_fts`, the column snippets are cut from.
const SNIPPET_COLUMN: i64 = 2;

/// A SQL statement with its positional parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlQuery {
    pub sql: String,
    pub params: Vec<Value>,
}

/// Column positions in the lowered `SELECT`.
///
/// Only the columns needed to order and annotate a candidate are read;
/// note content is fetched once the candidates are sorted and limited.
pub(crate) mod columns {
    pub const ID: usize = 0;
    pub const PATH: usize = 1;
    pub const TITLE: usize = 2;
    pub const WORD_COUNT: usize = 3;
    pub const CREATED: usize = 4;
    pub const MODIFIED: usize = 5;
    pub const RELEVANCE: usize = 6;
    pub const SNIPPET: usize = 7;
    pub const SHUFFLE: usize = 8;
}

/// Builds the candidate query for `plan`.
///
/// The query filters but does not order or limit; ordering mixes SQL values
/// with closure distances and happens after rows are read.
pub fn lower(plan: &QueryPlan, style: &SnippetStyle) -> SqlQuery {
    let mut params = Vec::new();
    let mut sql = String::from(
        "SELECT n.id, n.path, n.title, n.word_count, n.created, n.modified, ",
    );

    if plan.full_text.is_some() {
        sql.push_str(&format!(
            "-bm25(notes_fts, {}), snippet(notes_fts, {}, ?, ?, ?, ?), ",
            BM25_WEIGHTS, SNIPPET_COLUMN
        ));
        params.push(Value::Text(style.open.clone()));
        params.push(Value::Text(style.close.clone()));
        params.push(Value::Text(style.ellipsis.clone()));
        params.push(Value::Integer(style.token_limit()));
    } else {
        sql.push_str("0.0, NULL, ");
    }
    sql.push_str("RANDOM()\nFROM notes n");

    let mut conditions = Vec::new();
    if let Some(expr) = &plan.full_text {
        sql.push_str("\nJOIN notes_fts ON notes_fts.rowid = n.id");
        conditions.push("notes_fts MATCH ?".to_string());
        params.push(Value::Text(expr.clone()));
    }
    if !plan.predicate.is_all() {
        conditions.push(lower_predicate(&plan.predicate, &mut params));
    }

    if !conditions.is_empty() {
        sql.push_str("\nWHERE ");
        sql.push_str(&conditions.join(" AND "));
    }

    SqlQuery { sql, params }
}

/// Renders `predicate` as a SQL condition over the `notes n` alias,
/// appending its parameters in placeholder order.
pub(crate) fn lower_predicate(predicate: &Predicate, params: &mut Vec<Value>) -> String {
    match predicate {
        Predicate::And(items) if items.is_empty() => "1".to_string(),
        Predicate::Or(items) if items.is_empty() => "0".to_string(),
        Predicate::And(items) => join(items, " AND ", params),
        Predicate::Or(items) => join(items, " OR ", params),
        Predicate::Not(inner) => format!("NOT ({})", lower_predicate(inner, params)),
        Predicate::PathGlob(glob) => {
            params.push(Value::Text(glob.clone()));
            params.push(Value::Text(format!("{}/*", glob)));
            "(n.path GLOB ? OR n.path GLOB ?)".to_string()
        }
        Predicate::TagGlob { kind, pattern } => {
            params.push(Value::Text(kind.as_str().to_string()));
            params.push(Value::Text(pattern.clone()));
            "n.id IN (SELECT nt.note_id FROM note_tags nt
                      JOIN tags t ON t.id = nt.tag_id
                      WHERE t.kind = ? AND t.name GLOB ?)"
                .to_string()
        }
        Predicate::IdIn(ids) if ids.is_empty() => "0".to_string(),
        Predicate::IdIn(ids) => format!("n.id IN ({})", join_ids(ids)),
        Predicate::HasIncomingLink => {
            "n.id IN (SELECT target_id FROM links WHERE target_id IS NOT NULL)".to_string()
        }
        Predicate::Date { field, bound, at } => {
            let column = match field {
                DateField::Created => "n.created",
                DateField::Modified => "n.modified",
            };
            let operator = match bound {
                DateBound::AtOrAfter => ">=",
                DateBound::Before => "<",
            };
            params.push(Value::Text(encode_time(*at)));
            format!("{} {} ?", column, operator)
        }
    }
}

fn join(items: &[Predicate], separator: &str, params: &mut Vec<Value>) -> String {
    let parts: Vec<String> = items
        .iter()
        .map(|item| lower_predicate(item, params))
        .collect();
    format!("({})", parts.join(separator))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{NoteId, TagKind};
    use crate::query::compiler::SnippetSource;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use std::collections::{BTreeSet, HashMap};

    fn plan(predicate: Predicate, full_text: Option<&str>) -> QueryPlan {
        QueryPlan {
            predicate,
            full_text: full_text.map(str::to_string),
            snippet_source: SnippetSource::Lead,
            link_snippets: HashMap::new(),
            distances: HashMap::new(),
            order: Vec::new(),
            limit: 0,
        }
    }

    #[test]
    fn match_all_has_no_where_clause() {
        let query = lower(&plan(Predicate::all(), None), &SnippetStyle::default());
        assert!(!query.sql.contains("WHERE"));
        assert!(query.params.is_empty());
    }

    #[test]
    fn candidate_query_leaves_content_out() {
        let query = lower(&plan(Predicate::all(), None), &SnippetStyle::default());
        for column in ["n.body", "n.raw_content", "n.lead", "n.metadata"] {
            assert!(!query.sql.contains(column), "{} should not be selected", column);
        }
    }

    #[test]
    fn full_text_binds_snippet_markers_before_expression() {
        let style = SnippetStyle::new("[", "]");
        let query = lower(&plan(Predicate::all(), Some("rust")), &style);

        assert!(query.sql.contains("JOIN notes_fts"));
        assert!(query.sql.contains("bm25(notes_fts, 1000.0, 500.0, 1.0)"));
        assert_eq!(
            query.params,
            vec![
                Value::Text("[".into()),
                Value::Text("]".into()),
                Value::Text("…".into()),
                Value::Integer(20),
                Value::Text("rust".into()),
            ]
        );
    }

    #[test]
    fn path_glob_matches_path_and_descendants() {
        let mut params = Vec::new();
        let sql = lower_predicate(&Predicate::PathGlob("notes/a*".into()), &mut params);
        assert_eq!(sql, "(n.path GLOB ? OR n.path GLOB ?)");
        assert_eq!(
            params,
            vec![Value::Text("notes/a*".into()), Value::Text("notes/a*/*".into())]
        );
    }

    #[test]
    fn tag_glob_binds_kind_and_pattern() {
        let mut params = Vec::new();
        let sql = lower_predicate(
            &Predicate::TagGlob {
                kind: TagKind::Tag,
                pattern: "ru*".into(),
            },
            &mut params,
        );
        assert!(sql.contains("t.name GLOB ?"));
        assert_eq!(
            params,
            vec![Value::Text("tag".into()), Value::Text("ru*".into())]
        );
    }

    #[test]
    fn id_sets_are_inlined() {
        let ids: BTreeSet<NoteId> = [3, 1].into_iter().map(NoteId::from_raw).collect();
        let mut params = Vec::new();
        assert_eq!(
            lower_predicate(&Predicate::IdIn(ids).negate(), &mut params),
            "NOT (n.id IN (1,3))"
        );
        assert_eq!(
            lower_predicate(&Predicate::IdIn(BTreeSet::new()), &mut params),
            "0"
        );
        assert!(params.is_empty());
    }

    #[test]
    fn dates_use_half_open_bounds() {
        let at = Utc.with_ymd_and_hms(2024, 2, 1, 12, 0, 0).unwrap();
        let mut params = Vec::new();
        let sql = lower_predicate(
            &Predicate::and([
                Predicate::Date {
                    field: DateField::Created,
                    bound: DateBound::AtOrAfter,
                    at,
                },
                Predicate::Date {
                    field: DateField::Modified,
                    bound: DateBound::Before,
                    at,
                },
            ]),
            &mut params,
        );
        assert_eq!(sql, "(n.created >= ? AND n.modified < ?)");
        assert_eq!(
            params[0],
            Value::Text("2024-02-01T12:00:00.000000000Z".into())
        );
    }
}
