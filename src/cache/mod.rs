//! Persistent metadata cache for file digests.
//!
//! This module lets repeated runs skip unchanged files: a file whose size and
//! modification time still match its recorded entry reuses the stored digest
//! instead of being rehashed.
//!
//! # Architecture
//!
//! * [`entry`]: The persisted record and its validity check.
//! * [`format`]: The length-prefixed binary layout of the cache file.
//! * [`store`]: [`HashCache`], the synchronized in-memory map with load/save.
//!
//! # Cache Invalidation
//!
//! Entries are validated using:
//! * File path (key)
//! * File size
//! * Modification time (exact match, sub-second precision)
//!
//! If either attribute changes, the entry is stale and the file is rehashed.
//! Content is not re-verified on a hit: a file rewritten with identical size
//! and a restored mtime keeps its old digest.
//!
//! # Pruning
//!
//! Entries for files that no longer exist are kept until the caller asks for
//! [`HashCache::prune_missing`].

pub mod entry;
pub mod format;
pub mod store;

pub use entry::CacheEntry;
pub use store::{default_cache_path, CacheError, CacheResult, HashCache};
