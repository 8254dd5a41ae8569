//! Query pipeline: mention expansion, compilation, traversal and execution.
//!
//! A find runs in four steps:
//!
//! 1. [`expand_mentions`] rewrites mention criteria into full-text terms.
//! 2. [`FilterCompiler`] turns the criteria into a [`QueryPlan`], running
//!    link traversals through [`LinkGraph`] as needed.
//! 3. [`planner::lower`] renders the plan as SQL.
//! 4. The executor reads, orders and limits the matching rows.

mod compiler;
mod criteria;
pub(crate) mod executor;
pub mod fts;
mod mention;
mod order;
pub mod planner;
mod predicate;
mod snippet;
pub mod traversal;

pub use compiler::{FilterCompiler, NoteLookup, QueryPlan, SnippetSource};
pub use criteria::{
    DateRange, FilterCriteria, LinkDirection, LinkFilter, ParseSorterError, SortField, Sorter,
};
pub use mention::expand_mentions;
pub use order::OrderKey;
pub use predicate::{DateBound, DateField, Predicate};
pub use snippet::SnippetStyle;
pub use traversal::{Closure, Hop, LinkGraph, LinkSnippet, Reach};
