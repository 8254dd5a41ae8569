//! Compiles filter criteria into a query plan.

use crate::domain::{Metadata, NoteId, TagKind};
use crate::index::{IndexError, IndexResult};
use crate::query::order::OrderKey;
use crate::query::predicate::{DateBound, DateField, Predicate};
use crate::query::traversal::{self, LinkGraph, LinkSnippet};
use crate::query::{DateRange, FilterCriteria, LinkDirection, LinkFilter, SortField, Sorter, fts};
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Separates alternatives inside a tag group: `a OR b` or `a|b`.
static TAG_ALTERNATIVES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+OR\s+|\|").expect("valid regex"));

// ===========================================
// Lookup Trait
// ===========================================

/// Note lookups needed while compiling criteria.
pub trait NoteLookup {
    /// Resolves a path or path prefix to the first matching note.
    fn resolve_path(&self, path: &str) -> IndexResult<Option<NoteId>>;

    /// Returns the title and metadata of the note.
    fn note_names(&self, id: NoteId) -> IndexResult<Option<(String, Metadata)>>;

    /// Resolves each path, dropping the ones that match nothing.
    fn resolve_paths(&self, paths: &[String]) -> IndexResult<Vec<NoteId>> {
        let mut ids = Vec::new();
        for path in paths {
            if let Some(id) = self.resolve_path(path)? {
                if !ids.contains(&id) {
                    ids.push(id);
                }
            }
        }
        Ok(ids)
    }
}

// ===========================================
// Query Plan
// ===========================================

/// Where result snippets come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SnippetSource {
    Lead,
    FullText,
    Links,
}

/// Everything the executor needs to run a find.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    pub(crate) predicate: Predicate,
    pub(crate) full_text: Option<String>,
    pub(crate) snippet_source: SnippetSource,
    pub(crate) link_snippets: HashMap<NoteId, Vec<LinkSnippet>>,
    pub(crate) distances: HashMap<NoteId, usize>,
    pub(crate) order: Vec<OrderKey>,
    pub(crate) limit: usize,
}

impl QueryPlan {
    pub fn predicate(&self) -> &Predicate {
        &self.predicate
    }

    pub fn full_text(&self) -> Option<&str> {
        self.full_text.as_deref()
    }

    pub fn snippet_source(&self) -> SnippetSource {
        self.snippet_source
    }

    pub fn order(&self) -> &[OrderKey] {
        &self.order
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Upgrades the snippet source; link snippets beat full text beats the lead.
    fn prefer_snippets(&mut self, source: SnippetSource) {
        self.snippet_source = self.snippet_source.max(source);
    }
}

// ===========================================
// Compiler
// ===========================================

/// Turns [`FilterCriteria`] into a [`QueryPlan`].
pub struct FilterCompiler<'a, L: ?Sized, G: ?Sized> {
    lookup: &'a L,
    graph: &'a G,
}

impl<'a, L, G> FilterCompiler<'a, L, G>
where
    L: NoteLookup + ?Sized,
    G: LinkGraph + ?Sized,
{
    pub fn new(lookup: &'a L, graph: &'a G) -> Self {
        Self { lookup, graph }
    }

    /// Compiles the criteria.
    ///
    /// Mentions must already be expanded; see [`crate::query::expand_mentions`].
    pub fn compile(&self, criteria: &FilterCriteria) -> IndexResult<QueryPlan> {
        let mut plan = QueryPlan {
            predicate: Predicate::all(),
            full_text: None,
            snippet_source: SnippetSource::Lead,
            link_snippets: HashMap::new(),
            distances: HashMap::new(),
            order: Vec::new(),
            limit: criteria.result_limit(),
        };
        let mut predicates = Vec::new();

        if !criteria.include_paths().is_empty() {
            predicates.push(Predicate::or(
                criteria.include_paths().iter().map(|p| path_glob(p)),
            ));
        }
        for path in criteria.exclude_paths() {
            predicates.push(path_glob(path).negate());
        }

        if let Some(expr) = criteria.match_expression() {
            plan.full_text = Some(fts::validate(expr)?);
            plan.prefer_snippets(SnippetSource::FullText);
        }

        for group in criteria.tag_groups() {
            if let Some(predicate) = tag_group(group)? {
                predicates.push(predicate);
            }
        }

        let mut recursive = false;
        if let Some(filter) = criteria.linked_by_filter() {
            recursive |= filter.is_recursive();
            predicates.extend(self.link_filter(filter, LinkDirection::Incoming, &mut plan)?);
        }
        if let Some(filter) = criteria.link_to_filter() {
            recursive |= filter.is_recursive();
            predicates.extend(self.link_filter(filter, LinkDirection::Outgoing, &mut plan)?);
        }

        if !criteria.related_paths().is_empty() {
            let seeds = self.lookup.resolve_paths(criteria.related_paths())?;
            if !seeds.is_empty() {
                predicates.push(Predicate::IdIn(traversal::related(self.graph, &seeds)?));
            }
        }

        if criteria.is_orphan() {
            predicates.push(Predicate::HasIncomingLink.negate());
        }

        predicates.extend(date_range(DateField::Created, criteria.created_range()));
        predicates.extend(date_range(DateField::Modified, criteria.modified_range()));

        if !criteria.excluded_ids().is_empty() {
            predicates.push(Predicate::IdIn(criteria.excluded_ids().clone()).negate());
        }

        plan.predicate = Predicate::and(predicates);

        if plan.full_text.is_some() {
            plan.order.push(OrderKey::Relevance);
        }
        if recursive {
            plan.order.push(OrderKey::Distance);
        }
        plan.order
            .extend(criteria.sorters().iter().copied().map(OrderKey::Field));
        plan.order
            .push(OrderKey::Field(Sorter::by(SortField::Title)));

        Ok(plan)
    }

    fn link_filter(
        &self,
        filter: &LinkFilter,
        direction: LinkDirection,
        plan: &mut QueryPlan,
    ) -> IndexResult<Option<Predicate>> {
        if filter.is_negated() && filter.is_recursive() {
            return Err(IndexError::InvalidQuery(
                "a negated link filter cannot be recursive".to_string(),
            ));
        }

        let seeds = self.lookup.resolve_paths(filter.paths())?;
        if seeds.is_empty() {
            return Ok(None);
        }

        let max_distance = if filter.is_recursive() {
            filter.max_distance()
        } else {
            1
        };
        let closure = traversal::closure(self.graph, &seeds, direction, max_distance)?;

        if filter.is_negated() {
            return Ok(Some(Predicate::IdIn(closure.ids()).negate()));
        }

        plan.prefer_snippets(SnippetSource::Links);
        for (id, reach) in closure.iter() {
            let snippets = plan.link_snippets.entry(id).or_default();
            for snippet in &reach.snippets {
                if !snippets.contains(snippet) {
                    snippets.push(snippet.clone());
                }
            }
            if filter.is_recursive() {
                plan.distances
                    .entry(id)
                    .and_modify(|d| *d = (*d).min(reach.distance))
                    .or_insert(reach.distance);
            }
        }

        Ok(Some(Predicate::IdIn(closure.ids())))
    }
}

// ===========================================
// Leaf Builders
// ===========================================

fn path_glob(glob: &str) -> Predicate {
    Predicate::PathGlob(glob.trim_end_matches('/').to_string())
}

/// Parses one tag group into a predicate.
///
/// Alternatives are OR-ed. A single pattern may be negated with a leading
/// `-` or `NOT `; negation inside a group of alternatives is rejected.
fn tag_group(group: &str) -> IndexResult<Option<Predicate>> {
    let patterns: Vec<&str> = TAG_ALTERNATIVES
        .split(group.trim())
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();

    let mut alternatives = Vec::with_capacity(patterns.len());
    for pattern in &patterns {
        let (negated, name) = strip_negation(pattern);
        if name.is_empty() {
            continue;
        }
        let predicate = Predicate::TagGlob {
            kind: TagKind::Tag,
            pattern: name.to_lowercase(),
        };

        if negated {
            if patterns.len() > 1 {
                return Err(IndexError::InvalidQuery(format!(
                    "cannot negate '{}' inside the tag group '{}'",
                    name, group
                )));
            }
            return Ok(Some(predicate.negate()));
        }
        alternatives.push(predicate);
    }

    if alternatives.is_empty() {
        return Ok(None);
    }
    Ok(Some(Predicate::or(alternatives)))
}

fn strip_negation(pattern: &str) -> (bool, &str) {
    if let Some(rest) = pattern.strip_prefix('-') {
        (true, rest.trim())
    } else if let Some(rest) = pattern.strip_prefix("NOT ") {
        (true, rest.trim())
    } else {
        (false, pattern)
    }
}

fn date_range(field: DateField, range: DateRange) -> Vec<Predicate> {
    let mut predicates = Vec::new();
    if let Some(at) = range.after {
        predicates.push(Predicate::Date {
            field,
            bound: DateBound::AtOrAfter,
            at,
        });
    }
    if let Some(at) = range.before {
        predicates.push(Predicate::Date {
            field,
            bound: DateBound::Before,
            at,
        });
    }
    predicates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::traversal::tests::FakeGraph;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use std::collections::BTreeSet;

    /// Resolves `n.md` (and any prefix of it) to id `n`.
    struct FakeLookup;

    impl NoteLookup for FakeLookup {
        fn resolve_path(&self, path: &str) -> IndexResult<Option<NoteId>> {
            Ok(path
                .trim_end_matches(".md")
                .parse::<i64>()
                .ok()
                .map(NoteId::from_raw))
        }

        fn note_names(&self, id: NoteId) -> IndexResult<Option<(String, Metadata)>> {
            Ok(Some((format!("Note {}", id), Metadata::new())))
        }
    }

    fn compile(criteria: FilterCriteria, links: &[(i64, i64)]) -> IndexResult<QueryPlan> {
        let graph = FakeGraph::new(links);
        FilterCompiler::new(&FakeLookup, &graph).compile(&criteria)
    }

    fn ids(raw: &[i64]) -> BTreeSet<NoteId> {
        raw.iter().copied().map(NoteId::from_raw).collect()
    }

    fn tag(pattern: &str) -> Predicate {
        Predicate::TagGlob {
            kind: TagKind::Tag,
            pattern: pattern.to_string(),
        }
    }

    #[test]
    fn empty_criteria_match_everything_ordered_by_title() {
        let plan = compile(FilterCriteria::new(), &[]).unwrap();
        assert!(plan.predicate().is_all());
        assert_eq!(plan.snippet_source(), SnippetSource::Lead);
        assert_eq!(plan.order(), [OrderKey::Field(Sorter::by(SortField::Title))]);
    }

    #[test]
    fn include_paths_are_ored_and_excludes_anded() {
        let plan = compile(
            FilterCriteria::new()
                .include_path("a/")
                .include_path("b")
                .exclude_path("a/private"),
            &[],
        )
        .unwrap();
        assert_eq!(
            plan.predicate,
            Predicate::And(vec![
                Predicate::Or(vec![
                    Predicate::PathGlob("a".into()),
                    Predicate::PathGlob("b".into())
                ]),
                Predicate::PathGlob("a/private".into()).negate(),
            ])
        );
    }

    #[test]
    fn tag_group_alternatives() {
        let plan = compile(FilterCriteria::new().tag("Rust OR cli|tools"), &[]).unwrap();
        assert_eq!(
            plan.predicate,
            Predicate::Or(vec![tag("rust"), tag("cli"), tag("tools")])
        );
    }

    #[test]
    fn tag_groups_are_anded_and_may_be_negated() {
        let plan = compile(
            FilterCriteria::new().tag("rust").tag("-draft").tag("NOT wip"),
            &[],
        )
        .unwrap();
        assert_eq!(
            plan.predicate,
            Predicate::And(vec![tag("rust"), tag("draft").negate(), tag("wip").negate()])
        );
    }

    #[test]
    fn negation_inside_alternatives_is_invalid() {
        let err = compile(FilterCriteria::new().tag("rust OR -draft"), &[]).unwrap_err();
        assert!(matches!(err, IndexError::InvalidQuery(_)));
    }

    #[test]
    fn match_expression_ranks_by_relevance() {
        let plan = compile(FilterCriteria::new().matching(" ownership "), &[]).unwrap();
        assert_eq!(plan.full_text(), Some("ownership"));
        assert_eq!(plan.snippet_source(), SnippetSource::FullText);
        assert_eq!(plan.order()[0], OrderKey::Relevance);
    }

    #[test]
    fn malformed_match_expression_is_invalid() {
        let err = compile(FilterCriteria::new().matching("\"open"), &[]).unwrap_err();
        assert!(matches!(err, IndexError::InvalidQuery(_)));
    }

    #[test]
    fn link_to_recursive_uses_bounded_closure() {
        let plan = compile(
            FilterCriteria::new().link_to(LinkFilter::new(["1.md"]).recursive(2)),
            &[(1, 2), (2, 3), (3, 4)],
        )
        .unwrap();
        assert_eq!(plan.predicate, Predicate::IdIn(ids(&[2, 3])));
        assert_eq!(plan.distances.get(&NoteId::from_raw(3)), Some(&2));
        assert_eq!(plan.snippet_source(), SnippetSource::Links);
        assert_eq!(plan.order()[0], OrderKey::Distance);
    }

    #[test]
    fn linked_by_follows_incoming_links() {
        let plan = compile(
            FilterCriteria::new().linked_by(LinkFilter::new(["3.md"])),
            &[(1, 3), (2, 3), (3, 4)],
        )
        .unwrap();
        assert_eq!(plan.predicate, Predicate::IdIn(ids(&[1, 2])));
        assert!(plan.distances.is_empty());
    }

    #[test]
    fn negated_link_filter_excludes_neighbours() {
        let plan = compile(
            FilterCriteria::new().link_to(LinkFilter::new(["1.md"]).negate()),
            &[(1, 2)],
        )
        .unwrap();
        assert_eq!(plan.predicate, Predicate::IdIn(ids(&[2])).negate());
        assert_eq!(plan.snippet_source(), SnippetSource::Lead);
    }

    #[test]
    fn negated_recursive_link_filter_is_invalid() {
        let err = compile(
            FilterCriteria::new().link_to(LinkFilter::new(["1.md"]).negate().recursive(0)),
            &[(1, 2)],
        )
        .unwrap_err();
        assert!(matches!(err, IndexError::InvalidQuery(_)));
    }

    #[test]
    fn unresolved_link_filter_is_ignored() {
        let plan = compile(
            FilterCriteria::new().link_to(LinkFilter::new(["missing"])),
            &[(1, 2)],
        )
        .unwrap();
        assert!(plan.predicate().is_all());
    }

    #[test]
    fn related_keeps_distance_two() {
        let plan = compile(FilterCriteria::new().related("1.md"), &[(1, 2), (3, 2)]).unwrap();
        assert_eq!(plan.predicate, Predicate::IdIn(ids(&[3])));
    }

    #[test]
    fn dates_orphan_and_excluded_ids() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        let plan = compile(
            FilterCriteria::new()
                .orphan()
                .modified_before(at)
                .exclude_id(NoteId::from_raw(9)),
            &[],
        )
        .unwrap();
        assert_eq!(
            plan.predicate,
            Predicate::And(vec![
                Predicate::HasIncomingLink.negate(),
                Predicate::Date {
                    field: DateField::Modified,
                    bound: DateBound::Before,
                    at
                },
                Predicate::IdIn(ids(&[9])).negate(),
            ])
        );
    }

    #[test]
    fn user_sorters_precede_title_tiebreak() {
        let plan = compile(
            FilterCriteria::new()
                .sort(Sorter::by(SortField::Modified))
                .limit(3),
            &[],
        )
        .unwrap();
        assert_eq!(
            plan.order(),
            [
                OrderKey::Field(Sorter::new(SortField::Modified, false)),
                OrderKey::Field(Sorter::by(SortField::Title)),
            ]
        );
        assert_eq!(plan.limit(), 3);
    }
}
