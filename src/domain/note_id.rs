//! Store-assigned note identifier.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An opaque identifier assigned to a note by the index store.
///
/// The value is the SQLite rowid of the note and stays stable for as long as
/// the note remains indexed. Ids are never reused while the record lives, but
/// a note removed and added again receives a fresh id.
///
/// # Examples
///
/// ```
/// use notegraph::domain::NoteId;
///
/// let id: NoteId = "42".parse().unwrap();
/// assert_eq!(id.get(), 42);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(i64);

impl NoteId {
    /// Wraps a raw rowid.
    pub fn from_raw(raw: i64) -> Self {
        Self(raw)
    }

    /// Returns the raw rowid.
    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NoteId({})", self.0)
    }
}

/// Error returned when parsing an invalid note id.
#[derive(Debug, Clone)]
pub struct ParseNoteIdError {
    value: String,
}

impl ParseNoteIdError {
    /// Returns the invalid value that caused this error.
    pub fn invalid_value(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for ParseNoteIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid note id '{}'", self.value)
    }
}

impl std::error::Error for ParseNoteIdError {}

impl FromStr for NoteId {
    type Err = ParseNoteIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<i64>()
            .ok()
            .filter(|raw| *raw > 0)
            .map(NoteId)
            .ok_or_else(|| ParseNoteIdError {
                value: s.to_string(),
            })
    }
}

impl rusqlite::ToSql for NoteId {
    fn to_sql(&self) -> rusqlite::Result<rusqlite::types::ToSqlOutput<'_>> {
        Ok(rusqlite::types::ToSqlOutput::from(self.0))
    }
}

impl rusqlite::types::FromSql for NoteId {
    fn column_result(value: rusqlite::types::ValueRef<'_>) -> rusqlite::types::FromSqlResult<Self> {
        value.as_i64().map(NoteId)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_positive_integer() {
        let id: NoteId = "17".parse().unwrap();
        assert_eq!(id, NoteId::from_raw(17));
    }

    #[test]
    fn rejects_zero_and_negative() {
        assert!("0".parse::<NoteId>().is_err());
        assert!("-3".parse::<NoteId>().is_err());
    }

    #[test]
    fn rejects_garbage_and_reports_value() {
        let err = "abc".parse::<NoteId>().unwrap_err();
        assert_eq!(err.invalid_value(), "abc");
        assert!(err.to_string().contains("abc"));
    }

    #[test]
    fn debug_and_display() {
        let id = NoteId::from_raw(5);
        assert_eq!(id.to_string(), "5");
        assert_eq!(format!("{:?}", id), "NoteId(5)");
    }

    #[test]
    fn serializes_as_plain_number() {
        let json = serde_json::to_string(&NoteId::from_raw(9)).unwrap();
        assert_eq!(json, "9");
    }
}
