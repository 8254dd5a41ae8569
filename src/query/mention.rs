//! Expansion of mention criteria into full-text terms.

use crate::domain::Metadata;
use crate::index::{IndexError, IndexResult};
use crate::query::{FilterCriteria, NoteLookup};

/// Metadata key holding alternative names of a note.
const ALIASES_KEY: &str = "aliases";

/// Rewrites `mention` criteria into a match expression.
///
/// Each mentioned path resolves by prefix. The titles and aliases of the
/// resolved notes are quoted and OR-ed, then AND-ed onto any existing match
/// expression. The mentioned notes themselves are excluded from the results.
/// Criteria without mentions are returned unchanged.
///
/// # Errors
///
/// Returns [`IndexError::MentionNotFound`] if no mentioned path resolves.
pub fn expand_mentions<L: NoteLookup + ?Sized>(
    criteria: &FilterCriteria,
    lookup: &L,
) -> IndexResult<FilterCriteria> {
    if criteria.mentions().is_empty() {
        return Ok(criteria.clone());
    }

    let not_found = || IndexError::MentionNotFound {
        paths: criteria.mentions().to_vec(),
    };

    let ids = lookup.resolve_paths(criteria.mentions())?;
    if ids.is_empty() {
        return Err(not_found());
    }

    let mut names: Vec<String> = Vec::new();
    for id in &ids {
        let Some((title, metadata)) = lookup.note_names(*id)? else {
            continue;
        };
        for name in std::iter::once(title).chain(aliases(&metadata)) {
            let quoted = quote(&name);
            if !quoted.is_empty() && !names.contains(&quoted) {
                names.push(quoted);
            }
        }
    }
    if names.is_empty() {
        return Err(not_found());
    }

    let group = format!("({})", names.join(" OR "));
    let expr = match criteria.match_expression() {
        Some(existing) if !existing.trim().is_empty() => {
            format!("({}) AND {}", existing.trim(), group)
        }
        _ => group,
    };

    Ok(criteria.with_expanded_mentions(expr, ids))
}

/// Reads the `aliases` metadata entry, either a single string or a list.
fn aliases(metadata: &Metadata) -> Vec<String> {
    match metadata.get(ALIASES_KEY) {
        Some(value) => match value.as_list() {
            Some(list) => list.iter().filter_map(|v| v.as_text()).collect(),
            None => value.as_text().into_iter().collect(),
        },
        None => Vec::new(),
    }
}

/// Quotes a name as an FTS5 phrase, or returns an empty string if nothing
/// is left once quotes are stripped.
fn quote(name: &str) -> String {
    let stripped = name.replace('"', "");
    let stripped = stripped.trim();
    if stripped.is_empty() {
        String::new()
    } else {
        format!("\"{}\"", stripped)
    }
}
