//! Full-text expression checks and bareword conversion.

use crate::index::{IndexError, IndexResult};
use rusqlite::ErrorCode;

/// Columns of `notes_fts` that may prefix a term as a column filter.
const COLUMNS: &[&str] = &["title", "body", "raw_content"];

/// Words FTS5 treats as operators.
const OPERATORS: &[&str] = &["AND", "OR", "NOT", "+"];

/// Rejects expressions FTS5 can never accept and returns the form to bind
/// to `MATCH`.
///
/// Barewords FTS5 cannot tokenize as written, such as `hello-world` or
/// `x:hello`, are quoted into phrases, and a leading `-` on a word becomes
/// `NOT`. Anything else FTS5 rejects surfaces at execution through
/// [`map_query_error`].
pub fn validate(expr: &str) -> IndexResult<String> {
    let trimmed = expr.trim();
    if trimmed.is_empty() {
        return Err(IndexError::InvalidQuery(
            "match expression cannot be empty".to_string(),
        ));
    }

    let mut in_quotes = false;
    let mut depth: i32 = 0;
    for c in trimmed.chars() {
        match c {
            '"' => in_quotes = !in_quotes,
            '(' if !in_quotes => depth += 1,
            ')' if !in_quotes => {
                depth -= 1;
                if depth < 0 {
                    return Err(unbalanced(trimmed, "parenthesis"));
                }
            }
            _ => {}
        }
    }

    if in_quotes {
        return Err(unbalanced(trimmed, "quote"));
    }
    if depth != 0 {
        return Err(unbalanced(trimmed, "parenthesis"));
    }

    Ok(convert(trimmed))
}

fn unbalanced(expr: &str, what: &str) -> IndexError {
    IndexError::InvalidQuery(format!("unbalanced {} in match expression: {}", what, expr))
}

/// Rewrites every bareword outside quoted phrases; phrases, parentheses and
/// whitespace are copied as they are.
fn convert(expr: &str) -> String {
    let mut out = String::with_capacity(expr.len());
    let mut word = String::new();
    let mut in_quotes = false;

    for c in expr.chars() {
        if in_quotes {
            out.push(c);
            if c == '"' {
                in_quotes = false;
            }
            continue;
        }
        if c == '"' || c == '(' || c == ')' || c.is_whitespace() {
            flush_word(&mut word, &mut out);
            out.push(c);
            in_quotes = c == '"';
        } else {
            word.push(c);
        }
    }
    flush_word(&mut word, &mut out);
    out
}

fn flush_word(word: &mut String, out: &mut String) {
    if !word.is_empty() {
        out.push_str(&convert_word(word));
        word.clear();
    }
}

fn convert_word(word: &str) -> String {
    if OPERATORS.contains(&word) {
        return word.to_string();
    }
    if let Some(rest) = word.strip_prefix('-') {
        if !rest.is_empty() {
            return format!("NOT {}", convert_word(rest));
        }
    }
    if let Some((column, rest)) = word.split_once(':') {
        if COLUMNS.contains(&column) {
            if rest.is_empty() {
                return word.to_string();
            }
            return format!("{}:{}", column, convert_word(rest));
        }
    }

    let (stem, prefix) = match word.strip_suffix('*') {
        Some(stem) if !stem.is_empty() => (stem, "*"),
        _ => (word, ""),
    };
    if stem.chars().all(is_bareword_char) {
        word.to_string()
    } else {
        format!("\"{}\"{}", stem.replace('"', "\"\""), prefix)
    }
}

fn is_bareword_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || !c.is_ascii()
}

/// Maps errors raised while running a query.
///
/// When the query carries a `MATCH`, a generic SQLite error is the FTS5
/// parser rejecting the expression (`fts5: syntax error`, `no such column`)
/// and becomes `InvalidQuery`. Everything else stays a database error.
pub(crate) fn map_query_error(e: rusqlite::Error, matching: bool) -> IndexError {
    match &e {
        rusqlite::Error::SqliteFailure(failure, _)
            if matching && failure.code == ErrorCode::Unknown =>
        {
            IndexError::InvalidQuery(format!("invalid FTS query: {}", e))
        }
        _ => IndexError::Database(e),
    }
}
