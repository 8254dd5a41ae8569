//! Case-insensitive tags attached to notes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The collection a tag belongs to.
///
/// Only plain tags exist today; the kind is persisted alongside the name so
/// other collections can share the association table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum TagKind {
    Tag,
}

impl TagKind {
    /// Returns the persisted name of the kind.
    pub fn as_str(self) -> &'static str {
        match self {
            TagKind::Tag => "tag",
        }
    }

    /// Parses a persisted kind name.
    pub fn from_name(s: &str) -> Option<Self> {
        match s {
            "tag" => Some(TagKind::Tag),
            _ => None,
        }
    }
}

/// A case-insensitive tag for categorizing notes.
///
/// Tags are normalized to lowercase internally, making `Draft`, `draft`, and
/// `DRAFT` equivalent. Slashes are allowed so hierarchical tags such as
/// `project/alpha` can be matched with globs (`project/*`).
///
/// # Validation Rules
/// - Non-empty after normalization
/// - Alphanumeric characters, hyphens, underscores, dots and slashes only
///
/// # Examples
///
/// ```
/// use notegraph::domain::Tag;
///
/// let tag = Tag::new("Draft").unwrap();
/// assert_eq!(tag.as_str(), "draft");
///
/// // Case-insensitive equality
/// let tag2 = Tag::new("DRAFT").unwrap();
/// assert_eq!(tag, tag2);
/// ```
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tag {
    kind: TagKind,
    name: String, // Always stored lowercase
}

/// Error returned when parsing an invalid tag.
#[derive(Debug, Clone)]
pub struct ParseTagError(String);

impl fmt::Display for ParseTagError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for ParseTagError {}

impl Tag {
    /// Creates a new plain tag from a string.
    ///
    /// # Errors
    ///
    /// Returns `ParseTagError` if the tag is empty or contains characters
    /// other than alphanumerics, `-`, `_`, `.` and `/`.
    pub fn new(s: &str) -> Result<Self, ParseTagError> {
        Self::with_kind(TagKind::Tag, s)
    }

    /// Creates a tag in the given collection.
    pub fn with_kind(kind: TagKind, s: &str) -> Result<Self, ParseTagError> {
        let normalized = s.trim().to_lowercase();

        if normalized.is_empty() {
            return Err(ParseTagError("tag cannot be empty".to_string()));
        }

        if !normalized
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | '/'))
        {
            return Err(ParseTagError(format!(
                "invalid tag '{}': tags may only contain alphanumeric characters, '-', '_', '.' and '/'",
                normalized
            )));
        }

        Ok(Self {
            kind,
            name: normalized,
        })
    }

    /// Returns the tag's collection kind.
    pub fn kind(&self) -> TagKind {
        self.kind
    }

    /// Returns the normalized tag name.
    pub fn as_str(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tag({}:\"{}\")", self.kind.as_str(), self.name)
    }
}

impl FromStr for Tag {
    type Err = ParseTagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Serialize for Tag {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.name)
    }
}

impl<'de> Deserialize<'de> for Tag {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
