//! Free-form note metadata (front matter) as a tagged union.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Metadata attached to a note, keyed by front-matter field name.
pub type Metadata = BTreeMap<String, MetadataValue>;

/// A single metadata value.
///
/// Serialized untagged, so a metadata map round-trips through plain JSON
/// (`{"aliases": ["nx"], "draft": true}`). JSON `null` is not a valid value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Bool(bool),
    Number(f64),
    String(String),
    List(Vec<MetadataValue>),
    Map(BTreeMap<String, MetadataValue>),
}

impl MetadataValue {
    /// Returns the string slice if this is a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetadataValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the items if this is a list value.
    pub fn as_list(&self) -> Option<&[MetadataValue]> {
        match self {
            MetadataValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// Renders scalar values as text; lists and maps have no text form.
    pub fn as_text(&self) -> Option<String> {
        match self {
            MetadataValue::String(s) => Some(s.clone()),
            MetadataValue::Number(_) | MetadataValue::Bool(_) => Some(self.to_string()),
            MetadataValue::List(_) | MetadataValue::Map(_) => None,
        }
    }
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataValue::Bool(b) => write!(f, "{}", b),
            MetadataValue::Number(n) => write!(f, "{}", n),
            MetadataValue::String(s) => write!(f, "{}", s),
            MetadataValue::List(_) | MetadataValue::Map(_) => {
                let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
                write!(f, "{}", json)
            }
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(s: &str) -> Self {
        MetadataValue::String(s.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(s: String) -> Self {
        MetadataValue::String(s)
    }
}

impl From<f64> for MetadataValue {
    fn from(n: f64) -> Self {
        MetadataValue::Number(n)
    }
}

impl From<bool> for MetadataValue {
    fn from(b: bool) -> Self {
        MetadataValue::Bool(b)
    }
}

impl<T: Into<MetadataValue>> From<Vec<T>> for MetadataValue {
    fn from(items: Vec<T>) -> Self {
        MetadataValue::List(items.into_iter().map(Into::into).collect())
    }
}

/// Serializes metadata to the JSON blob stored in the index.
///
/// JSON has no NaN or infinity; serde_json would write them as `null`,
/// which the decoder rejects, so they are refused here instead.
pub(crate) fn to_json(metadata: &Metadata) -> Result<String, serde_json::Error> {
    for (key, value) in metadata {
        check_finite(key, value)?;
    }
    serde_json::to_string(metadata)
}

fn check_finite(key: &str, value: &MetadataValue) -> Result<(), serde_json::Error> {
    match value {
        MetadataValue::Number(n) if !n.is_finite() => {
            let message = format!("metadata field '{}' is not a finite number: {}", key, n);
            Err(<serde_json::Error as serde::ser::Error>::custom(message))
        }
        MetadataValue::List(items) => items.iter().try_for_each(|item| check_finite(key, item)),
        MetadataValue::Map(map) => map.iter().try_for_each(|(k, v)| check_finite(k, v)),
        _ => Ok(()),
    }
}

/// Parses the JSON blob stored in the index.
pub(crate) fn from_json(json: &str) -> Result<Metadata, serde_json::Error> {
    serde_json::from_str(json)
}
