//! Result ordering.

use crate::query::{SortField, Sorter};
use chrono::{DateTime, Utc};
use std::cmp::Ordering;

/// One level of the result ordering, most significant first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderKey {
    /// Full-text relevance, best first.
    Relevance,
    /// Hops from the link filter seeds, nearest first.
    Distance,
    Field(Sorter),
}

/// The values a candidate row is ordered by.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SortKey {
    pub relevance: f64,
    pub distance: Option<usize>,
    pub shuffle: i64,
    pub path: String,
    pub title: String,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
    pub word_count: u32,
}

/// Compares two rows key by key; the first unequal key decides.
pub(crate) fn compare(keys: &[OrderKey], a: &SortKey, b: &SortKey) -> Ordering {
    for key in keys {
        let ordering = match key {
            OrderKey::Relevance => b.relevance.total_cmp(&a.relevance),
            OrderKey::Distance => a
                .distance
                .unwrap_or(usize::MAX)
                .cmp(&b.distance.unwrap_or(usize::MAX)),
            OrderKey::Field(sorter) => {
                let ordering = compare_field(sorter.field, a, b);
                if sorter.ascending {
                    ordering
                } else {
                    ordering.reverse()
                }
            }
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

fn compare_field(field: SortField, a: &SortKey, b: &SortKey) -> Ordering {
    match field {
        SortField::Created => a.created.cmp(&b.created),
        SortField::Modified => a.modified.cmp(&b.modified),
        SortField::Path => a.path.cmp(&b.path),
        SortField::Title => a.title.cmp(&b.title),
        SortField::WordCount => a.word_count.cmp(&b.word_count),
        SortField::Random => a.shuffle.cmp(&b.shuffle),
    }
}
