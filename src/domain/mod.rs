//! Core types: NoteRecord, NoteId, Tag, Link, Rel, metadata values

mod link;
mod metadata;
mod note;
mod note_id;
mod tag;

pub(crate) use link::{join_rels, split_rels};
pub use link::{Link, ParseRelError, Rel};
pub(crate) use metadata::{from_json as metadata_from_json, to_json as metadata_to_json};
pub use metadata::{Metadata, MetadataValue};
pub use note::{NoteRecord, NoteRecordBuilder, ParseNoteError};
pub use note_id::{NoteId, ParseNoteIdError};
pub use tag::{ParseTagError, Tag, TagKind};
