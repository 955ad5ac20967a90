//! Cache entry definitions.

use std::path::PathBuf;
use std::time::SystemTime;

use crate::scanner::{Digest, FileFingerprint};

/// A persisted record of one file's digest.
///
/// Same shape as [`FileFingerprint`] but always carries a digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// Absolute path (cache key)
    pub path: PathBuf,
    /// File size in bytes when hashed
    pub size: u64,
    /// Modification time when hashed
    pub modified: SystemTime,
    /// Content digest
    pub digest: Digest,
}

impl CacheEntry {
    /// Whether this entry still describes a file with the given metadata.
    #[must_use]
    pub fn is_valid_for(&self, size: u64, modified: SystemTime) -> bool {
        self.size == size && self.modified == modified
    }
}

impl TryFrom<FileFingerprint> for CacheEntry {
    type Error = FileFingerprint;

    /// Fails, handing the fingerprint back, when no digest is attached.
    fn try_from(fp: FileFingerprint) -> Result<Self, Self::Error> {
        match fp.digest {
            Some(digest) => Ok(Self {
                path: fp.path,
                size: fp.size,
                modified: fp.modified,
                digest,
            }),
            None => Err(fp),
        }
    }
}
