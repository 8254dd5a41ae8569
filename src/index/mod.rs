//! SQLite notes index, link resolution and index sync

mod builder;
mod repository;
mod schema;
mod sqlite;

pub use builder::{
    Change, FileResult, IndexBuilder, NoopReporter, NoteParser, ProgressReporter, SyncError,
    SyncResult, diff,
};
pub use repository::{FindResult, IndexError, IndexRepository, IndexResult, NoteMatch};
pub use schema::{SCHEMA_VERSION, create_schema};
pub use sqlite::{IndexedFiles, SqliteIndex, Transaction};

pub(crate) use sqlite::{decode_time, encode_time, join_ids, load_links, load_tags};
