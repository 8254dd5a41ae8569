//! Filter criteria accepted by [`crate::index::IndexRepository::find`].

use crate::domain::NoteId;
use chrono::{DateTime, Days, NaiveDate, Utc};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

// ===========================================
// Link Filters
// ===========================================

/// Which way links are followed from the seed notes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkDirection {
    /// From a note to the notes it links to.
    Outgoing,
    /// From a note to the notes linking to it.
    Incoming,
    Both,
}

/// Restricts results to the link neighbourhood of a set of notes.
///
/// Without `recursive`, only direct neighbours match. With it, the whole
/// closure up to `max_distance` hops matches (0 means unbounded).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LinkFilter {
    paths: Vec<String>,
    negate: bool,
    recursive: bool,
    max_distance: usize,
}

impl LinkFilter {
    pub fn new<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Matches the notes outside the neighbourhood instead.
    pub fn negate(mut self) -> Self {
        self.negate = true;
        self
    }

    /// Follows links transitively, up to `max_distance` hops (0 = unbounded).
    pub fn recursive(mut self, max_distance: usize) -> Self {
        self.recursive = true;
        self.max_distance = max_distance;
        self
    }

    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    pub fn is_negated(&self) -> bool {
        self.negate
    }

    pub fn is_recursive(&self) -> bool {
        self.recursive
    }

    pub fn max_distance(&self) -> usize {
        self.max_distance
    }
}

// ===========================================
// Sorting
// ===========================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortField {
    Created,
    Modified,
    Path,
    Title,
    WordCount,
    Random,
}

impl SortField {
    /// Direction used when a sorter string gives none.
    fn default_ascending(self) -> bool {
        matches!(self, SortField::Path | SortField::Title | SortField::Random)
    }
}

/// One ordering key requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Sorter {
    pub field: SortField,
    pub ascending: bool,
}

impl Sorter {
    pub fn new(field: SortField, ascending: bool) -> Self {
        Self { field, ascending }
    }

    /// Sorts on `field` in its natural direction.
    pub fn by(field: SortField) -> Self {
        Self::new(field, field.default_ascending())
    }
}

/// Error returned when parsing an invalid sorter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseSorterError(String);

impl fmt::Display for ParseSorterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid sort field: {}", self.0)
    }
}

impl std::error::Error for ParseSorterError {}

impl FromStr for Sorter {
    type Err = ParseSorterError;

    /// Parses `field`, `field+` or `field-`.
    ///
    /// Fields accept their full name or a short form: `created`/`c`,
    /// `modified`/`m`, `path`/`p`, `title`/`t`, `word-count`/`wc`,
    /// `random`/`r`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (name, direction) = match trimmed.chars().last() {
            Some('+') => (&trimmed[..trimmed.len() - 1], Some(true)),
            Some('-') => (&trimmed[..trimmed.len() - 1], Some(false)),
            _ => (trimmed, None),
        };

        let field = match name.to_lowercase().as_str() {
            "created" | "c" => SortField::Created,
            "modified" | "m" => SortField::Modified,
            "path" | "p" => SortField::Path,
            "title" | "t" => SortField::Title,
            "word-count" | "wc" => SortField::WordCount,
            "random" | "r" => SortField::Random,
            _ => return Err(ParseSorterError(s.to_string())),
        };

        Ok(Sorter::new(
            field,
            direction.unwrap_or_else(|| field.default_ascending()),
        ))
    }
}

// ===========================================
// Date Ranges
// ===========================================

/// Bounds on one timestamp field: `after` is inclusive, `before` exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateRange {
    pub after: Option<DateTime<Utc>>,
    pub before: Option<DateTime<Utc>>,
}

impl DateRange {
    fn day(date: NaiveDate) -> Self {
        let start = date.and_time(chrono::NaiveTime::MIN).and_utc();
        Self {
            after: Some(start),
            before: start.checked_add_days(Days::new(1)),
        }
    }
}

// ===========================================
// FilterCriteria
// ===========================================

/// An immutable description of which notes to find and how to order them.
///
/// Built with consuming methods; every criterion left unset matches all
/// notes.
///
/// # Examples
///
/// ```
/// use notegraph::query::{FilterCriteria, LinkFilter, Sorter, SortField};
///
/// let criteria = FilterCriteria::new()
///     .include_path("projects")
///     .tag("rust OR cli")
///     .link_to(LinkFilter::new(["projects/alpha.md"]).recursive(2))
///     .sort(Sorter::by(SortField::Modified))
///     .limit(10);
/// assert_eq!(criteria.result_limit(), 10);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterCriteria {
    include_paths: Vec<String>,
    exclude_paths: Vec<String>,
    match_expr: Option<String>,
    tags: Vec<String>,
    created: DateRange,
    modified: DateRange,
    linked_by: Option<LinkFilter>,
    link_to: Option<LinkFilter>,
    related: Vec<String>,
    orphan: bool,
    mentions: Vec<String>,
    exclude_ids: BTreeSet<NoteId>,
    sorters: Vec<Sorter>,
    limit: usize,
}

impl FilterCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps notes at `glob` or beneath it. Multiple includes are OR-ed.
    pub fn include_path(mut self, glob: impl Into<String>) -> Self {
        self.include_paths.push(glob.into());
        self
    }

    /// Drops notes at `glob` or beneath it.
    pub fn exclude_path(mut self, glob: impl Into<String>) -> Self {
        self.exclude_paths.push(glob.into());
        self
    }

    /// Sets the full-text expression, in FTS5 query syntax.
    pub fn matching(mut self, expr: impl Into<String>) -> Self {
        self.match_expr = Some(expr.into());
        self
    }

    /// Adds a tag group such as `rust`, `rust OR cli`, `draft|wip` or `-archived`.
    ///
    /// Patterns within a group are OR-ed; groups are AND-ed.
    pub fn tag(mut self, group: impl Into<String>) -> Self {
        self.tags.push(group.into());
        self
    }

    pub fn created_after(mut self, at: DateTime<Utc>) -> Self {
        self.created.after = Some(at);
        self
    }

    pub fn created_before(mut self, at: DateTime<Utc>) -> Self {
        self.created.before = Some(at);
        self
    }

    /// Keeps notes created during `date` (UTC).
    pub fn created_on(mut self, date: NaiveDate) -> Self {
        self.created = DateRange::day(date);
        self
    }

    pub fn modified_after(mut self, at: DateTime<Utc>) -> Self {
        self.modified.after = Some(at);
        self
    }

    pub fn modified_before(mut self, at: DateTime<Utc>) -> Self {
        self.modified.before = Some(at);
        self
    }

    /// Keeps notes modified during `date` (UTC).
    pub fn modified_on(mut self, date: NaiveDate) -> Self {
        self.modified = DateRange::day(date);
        self
    }

    /// Keeps notes linking to the filter's notes.
    pub fn linked_by(mut self, filter: LinkFilter) -> Self {
        self.linked_by = Some(filter);
        self
    }

    /// Keeps notes the filter's notes link to.
    pub fn link_to(mut self, filter: LinkFilter) -> Self {
        self.link_to = Some(filter);
        self
    }

    /// Keeps notes two hops away from `path` in either direction.
    pub fn related(mut self, path: impl Into<String>) -> Self {
        self.related.push(path.into());
        self
    }

    /// Keeps notes without any resolved incoming link.
    pub fn orphan(mut self) -> Self {
        self.orphan = true;
        self
    }

    /// Keeps notes mentioning the title or an alias of the note at `path`.
    pub fn mention(mut self, path: impl Into<String>) -> Self {
        self.mentions.push(path.into());
        self
    }

    pub fn exclude_id(mut self, id: NoteId) -> Self {
        self.exclude_ids.insert(id);
        self
    }

    /// Appends an ordering key. Earlier sorters take precedence.
    pub fn sort(mut self, sorter: Sorter) -> Self {
        self.sorters.push(sorter);
        self
    }

    /// Caps the number of results; 0 means unlimited.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    // ===========================================
    // Accessors
    // ===========================================

    pub fn include_paths(&self) -> &[String] {
        &self.include_paths
    }

    pub fn exclude_paths(&self) -> &[String] {
        &self.exclude_paths
    }

    pub fn match_expression(&self) -> Option<&str> {
        self.match_expr.as_deref()
    }

    pub fn tag_groups(&self) -> &[String] {
        &self.tags
    }

    pub fn created_range(&self) -> DateRange {
        self.created
    }

    pub fn modified_range(&self) -> DateRange {
        self.modified
    }

    pub fn linked_by_filter(&self) -> Option<&LinkFilter> {
        self.linked_by.as_ref()
    }

    pub fn link_to_filter(&self) -> Option<&LinkFilter> {
        self.link_to.as_ref()
    }

    pub fn related_paths(&self) -> &[String] {
        &self.related
    }

    pub fn is_orphan(&self) -> bool {
        self.orphan
    }

    pub fn mentions(&self) -> &[String] {
        &self.mentions
    }

    pub fn excluded_ids(&self) -> &BTreeSet<NoteId> {
        &self.exclude_ids
    }

    pub fn sorters(&self) -> &[Sorter] {
        &self.sorters
    }

    pub fn result_limit(&self) -> usize {
        self.limit
    }

    /// Derives the criteria a mention expands into.
    pub(crate) fn with_expanded_mentions(
        &self,
        match_expr: String,
        mentioned: impl IntoIterator<Item = NoteId>,
    ) -> Self {
        let mut derived = self.clone();
        derived.match_expr = Some(match_expr);
        derived.mentions.clear();
        derived.exclude_ids.extend(mentioned);
        derived
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    #[test]
    fn sorter_parses_names_and_shorthands() {
        assert_eq!(
            "title".parse::<Sorter>().unwrap(),
            Sorter::new(SortField::Title, true)
        );
        assert_eq!(
            "created-".parse::<Sorter>().unwrap(),
            Sorter::new(SortField::Created, false)
        );
        assert_eq!(
            "wc+".parse::<Sorter>().unwrap(),
            Sorter::new(SortField::WordCount, true)
        );
        assert_eq!(
            "r".parse::<Sorter>().unwrap(),
            Sorter::new(SortField::Random, true)
        );
    }

    #[test]
    fn sorter_defaults_dates_to_descending() {
        assert!(!"modified".parse::<Sorter>().unwrap().ascending);
        assert!(!"word-count".parse::<Sorter>().unwrap().ascending);
        assert!("path".parse::<Sorter>().unwrap().ascending);
    }

    #[test]
    fn sorter_rejects_unknown_field() {
        let err = "size".parse::<Sorter>().unwrap_err();
        assert!(err.to_string().contains("size"));
    }

    #[test]
    fn created_on_covers_one_day() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        let range = FilterCriteria::new().created_on(day).created_range();
        assert_eq!(
            range.after,
            Some(Utc.with_ymd_and_hms(2024, 3, 9, 0, 0, 0).unwrap())
        );
        assert_eq!(
            range.before,
            Some(Utc.with_ymd_and_hms(2024, 3, 10, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn link_filter_builder_sets_flags() {
        let filter = LinkFilter::new(["a.md"]).recursive(3);
        assert!(filter.is_recursive());
        assert!(!filter.is_negated());
        assert_eq!(filter.max_distance(), 3);
        assert_eq!(filter.paths(), ["a.md".to_string()]);
    }

    #[test]
    fn expanded_mentions_leave_original_untouched() {
        let original = FilterCriteria::new().mention("x.md").limit(5);
        let derived =
            original.with_expanded_mentions("(\"X\")".into(), [NoteId::from_raw(7)]);

        assert_eq!(original.mentions(), ["x.md".to_string()]);
        assert!(original.excluded_ids().is_empty());
        assert!(derived.mentions().is_empty());
        assert_eq!(derived.match_expression(), Some("(\"X\")"));
        assert!(derived.excluded_ids().contains(&NoteId::from_raw(7)));
        assert_eq!(derived.result_limit(), 5);
    }
}
