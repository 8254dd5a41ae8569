//! Checksums and path handling shared by the index and its callers

mod content_hash;
mod paths;

pub use content_hash::{ContentHash, ContentHashError};
pub(crate) use paths::path_prefixes;
pub use paths::{
    FileMetadata, SORTABLE_SEPARATOR, cmp_sortable, normalize_path, sort_for_diff, sortable_path,
};
