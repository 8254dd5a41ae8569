//! Outbound links authored in a note and their relation labels.

use crate::domain::NoteId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A relation label carried by a link (e.g. `up`, `see-also`).
///
/// Relation labels are normalized to lowercase.
///
/// # Validation Rules
/// - Non-empty after normalization
/// - Only alphanumeric characters and hyphens
///
/// # Examples
///
/// ```
/// use notegraph::domain::Rel;
///
/// let rel = Rel::new("See-Also").unwrap();
/// assert_eq!(rel.as_str(), "see-also");
/// ```
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Rel(String); // Always stored lowercase

/// Error returned when parsing an invalid relation label.
#[derive(Debug, Clone)]
pub struct ParseRelError(String);

impl fmt::Display for ParseRelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for ParseRelError {}

impl Rel {
    /// Creates a new Rel from a string.
    ///
    /// # Errors
    ///
    /// Returns `ParseRelError` if the label is empty or contains characters
    /// other than alphanumerics and hyphens.
    pub fn new(s: &str) -> Result<Self, ParseRelError> {
        let normalized = s.trim().to_lowercase();

        if normalized.is_empty() {
            return Err(ParseRelError("relation label cannot be empty".to_string()));
        }

        if !normalized
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-')
        {
            return Err(ParseRelError(format!(
                "invalid relation label '{}': must contain only alphanumeric characters and hyphens",
                normalized
            )));
        }

        Ok(Self(normalized))
    }

    /// Returns the normalized label.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Rel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Rel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Rel(\"{}\")", self.0)
    }
}

impl FromStr for Rel {
    type Err = ParseRelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Serialize for Rel {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Rel {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Delimiter wrapped around and between relation labels in the `rels` column,
/// so a single label can be matched with `LIKE '%\x01label\x01%'`.
pub(crate) const REL_DELIMITER: char = '\x01';

/// Joins relation labels into their persisted form.
pub(crate) fn join_rels(rels: &[Rel]) -> String {
    if rels.is_empty() {
        return String::new();
    }
    let mut joined = String::from(REL_DELIMITER);
    for rel in rels {
        joined.push_str(rel.as_str());
        joined.push(REL_DELIMITER);
    }
    joined
}

/// Splits the persisted form back into labels, skipping invalid entries.
pub(crate) fn split_rels(joined: &str) -> Vec<Rel> {
    joined
        .split(REL_DELIMITER)
        .filter(|s| !s.is_empty())
        .filter_map(|s| Rel::new(s).ok())
        .collect()
}

/// An outbound link as authored in a note.
///
/// The `target` is filled in by the index when the href resolves to an
/// indexed note; it stays `None` for external links and for forward
/// references whose note has not been indexed yet.
///
/// # Examples
///
/// ```
/// use notegraph::domain::Link;
///
/// let link = Link::new("projects/alpha")
///     .title("Alpha")
///     .rel("up")
///     .unwrap()
///     .snippet("See [Alpha] for details", 4, 11);
/// assert_eq!(link.href(), "projects/alpha");
/// assert!(link.target().is_none());
/// ```
#[derive(Clone, Serialize, Deserialize)]
pub struct Link {
    href: String,
    title: String,
    external: bool,
    rels: Vec<Rel>,
    snippet: String,
    snippet_start: usize,
    snippet_end: usize,
    target: Option<NoteId>,
}

impl Link {
    /// Creates an internal link to `href` with no title, rels or snippet.
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            title: String::new(),
            external: false,
            rels: Vec::new(),
            snippet: String::new(),
            snippet_start: 0,
            snippet_end: 0,
            target: None,
        }
    }

    /// Sets the link title (the text shown for the link).
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Marks the link as pointing outside the notebook.
    pub fn external(mut self, external: bool) -> Self {
        self.external = external;
        self
    }

    /// Adds a relation label; duplicates are ignored.
    pub fn rel(mut self, rel: &str) -> Result<Self, ParseRelError> {
        let rel = Rel::new(rel)?;
        if !self.rels.contains(&rel) {
            self.rels.push(rel);
        }
        Ok(self)
    }

    /// Sets the surrounding text and the byte range of the link inside it.
    pub fn snippet(mut self, text: impl Into<String>, start: usize, end: usize) -> Self {
        self.snippet = text.into();
        self.snippet_start = start;
        self.snippet_end = end;
        self
    }

    pub(crate) fn with_target(mut self, target: Option<NoteId>) -> Self {
        self.target = target;
        self
    }

    pub(crate) fn with_rels(mut self, rels: Vec<Rel>) -> Self {
        self.rels = rels;
        self
    }

    /// Returns the href as authored.
    pub fn href(&self) -> &str {
        &self.href
    }

    /// Returns the link title.
    pub fn link_title(&self) -> &str {
        &self.title
    }

    /// Returns true if the link points outside the notebook.
    pub fn is_external(&self) -> bool {
        self.external
    }

    /// Returns the relation labels.
    pub fn rels(&self) -> &[Rel] {
        &self.rels
    }

    /// Returns the snippet text surrounding the link.
    pub fn snippet_text(&self) -> &str {
        &self.snippet
    }

    /// Returns the byte range of the link inside the snippet.
    pub fn snippet_range(&self) -> (usize, usize) {
        (self.snippet_start, self.snippet_end)
    }

    /// Returns the resolved target, if any.
    pub fn target(&self) -> Option<NoteId> {
        self.target
    }
}

impl PartialEq for Link {
    fn eq(&self, other: &Self) -> bool {
        // Target resolution is index state, excluded from equality
        self.href == other.href
            && self.title == other.title
            && self.external == other.external
            && self.rels == other.rels
            && self.snippet == other.snippet
            && self.snippet_start == other.snippet_start
            && self.snippet_end == other.snippet_end
    }
}

impl Eq for Link {}

impl fmt::Debug for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Link")
            .field("href", &self.href)
            .field("title", &self.title)
            .field("external", &self.external)
            .field("rels", &self.rels)
            .field("target", &self.target)
            .finish()
    }
}
