//! Duplicate detection module.
//!
//! This module provides functionality for:
//! - Parallel fingerprinting of candidate files (cache or hasher)
//! - Concurrent accumulation into a lock-sharded digest table
//! - Deterministic emission of duplicate groups

pub mod finder;
pub mod groups;

pub use finder::{
    default_io_threads, find_duplicates_cached, find_duplicates_with_cache, DuplicateFinder, FinderConfig, FinderError,
    HashFailure, ScanReport, ScanSummary, DEFAULT_PROGRESS_BATCH,
};
pub use groups::{DuplicateGroup, GroupingTable, SHARD_COUNT};
