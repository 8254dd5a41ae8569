//! Structured filter predicates produced by the compiler.

use crate::domain::{NoteId, TagKind};
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateField {
    Created,
    Modified,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateBound {
    /// Inclusive lower bound.
    AtOrAfter,
    /// Exclusive upper bound.
    Before,
}

/// A boolean condition over a single note.
///
/// An empty `And` is always true and an empty `Or` always false.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
    Not(Box<Predicate>),
    /// The path matches the glob or lies beneath it.
    PathGlob(String),
    TagGlob { kind: TagKind, pattern: String },
    IdIn(BTreeSet<NoteId>),
    /// At least one resolved link points at the note.
    HasIncomingLink,
    Date {
        field: DateField,
        bound: DateBound,
        at: DateTime<Utc>,
    },
}

impl Predicate {
    /// Matches every note.
    pub fn all() -> Self {
        Predicate::And(Vec::new())
    }

    /// Conjunction, flattening nested `And`s.
    pub fn and(predicates: impl IntoIterator<Item = Predicate>) -> Self {
        let mut flat = Vec::new();
        for p in predicates {
            match p {
                Predicate::And(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        if flat.len() == 1 {
            flat.remove(0)
        } else {
            Predicate::And(flat)
        }
    }

    /// Disjunction. A single operand is returned as-is.
    pub fn or(predicates: impl IntoIterator<Item = Predicate>) -> Self {
        let mut all: Vec<Predicate> = predicates.into_iter().collect();
        if all.len() == 1 {
            all.remove(0)
        } else {
            Predicate::Or(all)
        }
    }

    pub fn negate(self) -> Self {
        match self {
            Predicate::Not(inner) => *inner,
            other => Predicate::Not(Box::new(other)),
        }
    }

    /// Returns true if the predicate trivially matches every note.
    pub fn is_all(&self) -> bool {
        matches!(self, Predicate::And(v) if v.is_empty())
    }
}
