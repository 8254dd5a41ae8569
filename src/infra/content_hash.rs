//! Note checksums for change detection.

use sha2::{Digest, Sha256};
use std::fmt;
use thiserror::Error;

/// SHA-256 checksum of a note's raw content.
///
/// Stored in the index as a 64-character lowercase hex string so a caller can
/// tell whether a file's content changed since it was last indexed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentHash {
    hex: String,
}

/// Errors when parsing a checksum from a hex string.
#[derive(Debug, Error)]
pub enum ContentHashError {
    #[error("invalid checksum: expected 64 hex characters, got {0} characters")]
    InvalidLength(usize),

    #[error("invalid checksum character at position {position}: '{character}'")]
    InvalidCharacter { position: usize, character: char },
}

impl ContentHash {
    /// Computes the checksum of the given bytes.
    pub fn compute(bytes: &[u8]) -> Self {
        let digest = Sha256::digest(bytes);
        Self {
            hex: format!("{:x}", digest),
        }
    }

    /// Parses a checksum previously produced by [`ContentHash::as_str`].
    ///
    /// Upper-case input is normalized to lowercase.
    pub fn from_hex(hex: &str) -> Result<Self, ContentHashError> {
        if hex.len() != 64 {
            return Err(ContentHashError::InvalidLength(hex.len()));
        }

        if let Some((position, character)) =
            hex.chars().enumerate().find(|(_, c)| !c.is_ascii_hexdigit())
        {
            return Err(ContentHashError::InvalidCharacter {
                position,
                character,
            });
        }

        Ok(Self {
            hex: hex.to_ascii_lowercase(),
        })
    }

    /// Returns the checksum as lowercase hex.
    pub fn as_str(&self) -> &str {
        &self.hex
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.hex)
    }
}
