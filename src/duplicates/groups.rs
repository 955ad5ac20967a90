//! Duplicate groups and the shared digest table.
//!
//! # Overview
//!
//! Hashing workers insert `(digest, path)` pairs into a [`GroupingTable`]
//! concurrently. Once every worker has joined, the table is consumed by
//! [`GroupingTable::into_groups`], which drops singleton buckets and emits
//! [`DuplicateGroup`]s in a deterministic order.
//!
//! # Example
//!
//! ```
//! use dupescan::duplicates::GroupingTable;
//! use std::path::PathBuf;
//!
//! let table = GroupingTable::new();
//! table.insert([1u8; 16], PathBuf::from("/b.txt"), 3);
//! table.insert([1u8; 16], PathBuf::from("/a.txt"), 3);
//! table.insert([2u8; 16], PathBuf::from("/c.txt"), 5);
//!
//! let groups = table.into_groups();
//! assert_eq!(groups.len(), 1);
//! assert_eq!(groups[0].paths, vec![PathBuf::from("/a.txt"), PathBuf::from("/b.txt")]);
//! ```

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::scanner::{digest_to_hex, Digest};

/// Number of independently locked shards.
pub const SHARD_COUNT: usize = 16;

/// A set of two or more files with identical content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateGroup {
    /// Content digest shared by every member
    pub digest: Digest,
    /// File size in bytes (shared by all members)
    pub size: u64,
    /// Member paths, sorted
    pub paths: Vec<PathBuf>,
}

impl DuplicateGroup {
    /// Number of files in this group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Always false for emitted groups; present for API completeness.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Digest as lowercase hex.
    #[must_use]
    pub fn digest_hex(&self) -> String {
        digest_to_hex(&self.digest)
    }

    /// Bytes that would be freed by keeping a single copy.
    #[must_use]
    pub fn wasted_space(&self) -> u64 {
        self.size * (self.paths.len().saturating_sub(1)) as u64
    }
}

type Bucket = Vec<(PathBuf, u64)>;

/// Digest → paths table shared by hashing workers.
///
/// Lock-sharded by the first digest byte. Owned by the finder for one run;
/// consuming it with [`into_groups`](Self::into_groups) requires every
/// worker to have released its reference.
#[derive(Debug)]
pub struct GroupingTable {
    shards: Vec<Mutex<HashMap<Digest, Bucket>>>,
}

impl Default for GroupingTable {
    fn default() -> Self {
        Self::new()
    }
}

impl GroupingTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            shards: (0..SHARD_COUNT).map(|_| Mutex::new(HashMap::new())).collect(),
        }
    }

    fn shard_for(digest: &Digest) -> usize {
        usize::from(digest[0]) % SHARD_COUNT
    }

    /// Record that `path` (of `size` bytes) has content `digest`.
    pub fn insert(&self, digest: Digest, path: PathBuf, size: u64) {
        let mut shard = self.shards[Self::shard_for(&digest)]
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        shard.entry(digest).or_default().push((path, size));
    }

    /// Total number of inserted paths.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shards
            .iter()
            .map(|s| {
                s.lock()
                    .unwrap_or_else(std::sync::PoisonError::into_inner)
                    .values()
                    .map(Vec::len)
                    .sum::<usize>()
            })
            .sum()
    }

    /// Whether nothing has been inserted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Emit every bucket with two or more members.
    ///
    /// Groups are ordered by digest, members by path.
    #[must_use]
    pub fn into_groups(self) -> Vec<DuplicateGroup> {
        let mut groups: Vec<DuplicateGroup> = self
            .shards
            .into_iter()
            .flat_map(|shard| {
                shard
                    .into_inner()
                    .unwrap_or_else(std::sync::PoisonError::into_inner)
            })
            .filter(|(_, members)| members.len() > 1)
            .map(|(digest, members)| {
                let size = members.first().map_or(0, |(_, size)| *size);
                let mut paths: Vec<PathBuf> = members.into_iter().map(|(path, _)| path).collect();
                paths.sort();
                DuplicateGroup {
                    digest,
                    size,
                    paths,
                }
            })
            .collect();

        groups.sort_by(|a, b| a.digest.cmp(&b.digest));
        groups
    }
}
