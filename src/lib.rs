//! notegraph - persistent notes index with link graph queries
//!
//! Notes are stored in SQLite with a full-text index. Links between notes are
//! resolved by path prefix as notes are indexed, and forward references heal
//! once their target appears. Queries combine path, tag, date, full-text and
//! link-graph filters.
//!
//! ```
//! use notegraph::domain::{Link, NoteRecord};
//! use notegraph::index::{IndexRepository, SqliteIndex};
//! use notegraph::query::{FilterCriteria, LinkFilter};
//! use chrono::Utc;
//!
//! let mut index = SqliteIndex::open_in_memory().unwrap();
//! let now = Utc::now();
//!
//! let a = NoteRecord::builder("a.md", "see b", now)
//!     .title("A")
//!     .links(vec![Link::new("b")])
//!     .build()
//!     .unwrap();
//! index.add(&a).unwrap();
//! index.add(&NoteRecord::builder("b.md", "", now).title("B").build().unwrap()).unwrap();
//!
//! let found = index
//!     .find(&FilterCriteria::new().link_to(LinkFilter::new(["a.md"])))
//!     .unwrap();
//! assert_eq!(found.paths(), vec!["b.md"]);
//! ```

pub mod config;
pub mod domain;
pub mod index;
pub mod infra;
pub mod query;
