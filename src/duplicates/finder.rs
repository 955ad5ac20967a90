//! Duplicate finder: fan-out hashing over a worker pool, fan-in into one table.
//!
//! # Overview
//!
//! Candidate paths are first resolved to canonical absolute paths. Then, for
//! every distinct file, independently and in parallel:
//! 1. **Stat** the file for its current size and modification time
//! 2. **Cache lookup**: reuse the stored digest if size and mtime match exactly
//! 3. **Hash** on a miss and upsert the cache entry
//! 4. **Insert** `(digest, path)` into the shared [`GroupingTable`]
//!
//! A file that cannot be stat'ed or read is recorded as a [`HashFailure`] and
//! excluded from grouping; the rest of the batch continues. After all workers
//! join, buckets with two or more members become [`DuplicateGroup`]s.
//!
//! # Example
//!
//! ```no_run
//! use dupescan::duplicates::find_duplicates_cached;
//! use dupescan::duplicates::FinderConfig;
//! use dupescan::scanner::Walker;
//! use std::path::{Path, PathBuf};
//!
//! let files = Walker::new(vec![PathBuf::from(".")]).walk().files;
//! let report = find_duplicates_cached(files, Path::new("hashes.bin"), FinderConfig::default()).unwrap();
//!
//! for group in &report.groups {
//!     println!("{} ({} copies)", group.digest_hex(), group.len());
//! }
//! if let Some(e) = &report.cache_error {
//!     eprintln!("Warning: cache not saved: {}", e);
//! }
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rayon::prelude::*;

use super::groups::{DuplicateGroup, GroupingTable};
use crate::cache::{CacheError, HashCache};
use crate::progress::{ProgressCallback, ProgressTracker};
use crate::scanner::{FileFingerprint, HashError, Hasher};

/// Default number of completions between progress reports.
pub const DEFAULT_PROGRESS_BATCH: usize = 64;

/// Worker count used when none is configured: the machine's available parallelism.
#[must_use]
pub fn default_io_threads() -> usize {
    std::thread::available_parallelism().map_or(4, std::num::NonZeroUsize::get)
}

/// Configuration for the duplicate finder.
#[derive(Clone)]
pub struct FinderConfig {
    /// Number of hashing worker threads.
    pub io_threads: usize,
    /// Optional hash cache shared by all workers.
    pub cache: Option<Arc<HashCache>>,
    /// Optional shutdown flag, checked once per file.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
    /// Completions between two progress reports.
    pub progress_batch: usize,
}

impl std::fmt::Debug for FinderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinderConfig")
            .field("io_threads", &self.io_threads)
            .field("cache", &self.cache.as_ref().map(|_| "<cache>"))
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .field("progress_batch", &self.progress_batch)
            .finish()
    }
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            io_threads: default_io_threads(),
            cache: None,
            shutdown_flag: None,
            progress_callback: None,
            progress_batch: DEFAULT_PROGRESS_BATCH,
        }
    }
}

impl FinderConfig {
    /// Set the worker thread count (at least 1).
    #[must_use]
    pub fn with_io_threads(mut self, threads: usize) -> Self {
        self.io_threads = threads.max(1);
        self
    }

    /// Set the hash cache.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<HashCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Set the shutdown flag for cooperative cancellation.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Set how many completions are batched into one progress report.
    #[must_use]
    pub fn with_progress_batch(mut self, batch: usize) -> Self {
        self.progress_batch = batch.max(1);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }
}

/// A file that could not be fingerprinted and was left out of every group.
#[derive(Debug)]
pub struct HashFailure {
    /// Path that failed
    pub path: PathBuf,
    /// Why it failed
    pub error: HashError,
}

/// Statistics from one run.
#[derive(Debug, Default)]
pub struct ScanSummary {
    /// Distinct input files after canonicalization
    pub total_files: usize,
    /// Files whose digest had to be computed
    pub hashed_files: usize,
    /// Files whose digest came from the cache
    pub cache_hits: usize,
    /// Files skipped because shutdown was requested
    pub skipped_files: usize,
    /// Files that could not be stat'ed or read, sorted by path
    pub failures: Vec<HashFailure>,
    /// Number of duplicate groups
    pub duplicate_groups: usize,
    /// Duplicate files, not counting one original per group
    pub duplicate_files: usize,
    /// Bytes freed by keeping one copy per group
    pub reclaimable_space: u64,
    /// Wall time of the run
    pub scan_duration: Duration,
    /// Whether shutdown cut the run short
    pub interrupted: bool,
}

/// Errors that prevent a run from starting.
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    /// The worker pool could not be created.
    #[error("Failed to build hashing thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

enum Fingerprinted {
    Cached(FileFingerprint),
    Hashed(FileFingerprint),
}

/// Runs the hashing pipeline over a list of candidate files.
pub struct DuplicateFinder {
    config: FinderConfig,
    hasher: Hasher,
}

impl DuplicateFinder {
    /// Create a new duplicate finder with the given configuration.
    #[must_use]
    pub fn new(config: FinderConfig) -> Self {
        Self {
            config,
            hasher: Hasher::new(),
        }
    }

    /// Create a new duplicate finder with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(FinderConfig::default())
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &FinderConfig {
        &self.config
    }

    /// Group `paths` by content.
    ///
    /// Inputs are resolved to canonical absolute paths first, so the cache
    /// and the groups only ever see canonical keys and two spellings of one
    /// file are processed once. The returned groups are sorted by digest with
    /// members sorted by path, independent of the worker count.
    ///
    /// If the shutdown flag is raised, remaining files are skipped, the
    /// groups found so far are returned and `summary.interrupted` is set.
    /// Skipped files still count towards progress, so the final report is
    /// always `(total, total)`.
    ///
    /// # Errors
    ///
    /// Returns [`FinderError::ThreadPool`] if the worker pool cannot be built.
    /// Per-file problems never fail the run.
    pub fn find_duplicates(
        &self,
        paths: Vec<PathBuf>,
    ) -> Result<(Vec<DuplicateGroup>, ScanSummary), FinderError> {
        let start_time = Instant::now();

        let (paths, mut failures) = canonicalize_all(paths);

        let total = paths.len() + failures.len();
        let mut summary = ScanSummary {
            total_files: total,
            ..Default::default()
        };
        let tracker = ProgressTracker::new(
            self.config.progress_callback.clone(),
            total,
            self.config.progress_batch,
        );
        for _ in &failures {
            tracker.advance();
        }

        if paths.is_empty() {
            log::debug!("No files to compare");
            tracker.finish();
            summary.failures = failures;
            summary.scan_duration = start_time.elapsed();
            return Ok((Vec::new(), summary));
        }

        log::info!(
            "Comparing {} files with {} worker threads",
            total,
            self.config.io_threads
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.io_threads.max(1))
            .thread_name(|i| format!("dupescan-hash-{}", i))
            .build()?;

        let table = GroupingTable::new();
        let cache_hits = AtomicUsize::new(0);
        let hashed = AtomicUsize::new(0);
        let skipped = AtomicUsize::new(0);

        let hash_failures: Vec<HashFailure> = pool.install(|| {
            paths
                .into_par_iter()
                .filter_map(|path| {
                    if self.config.is_shutdown_requested() {
                        skipped.fetch_add(1, Ordering::Relaxed);
                        tracker.advance();
                        return None;
                    }

                    let failure = match self.fingerprint(path) {
                        Ok(result) => {
                            let fp = match result {
                                Fingerprinted::Cached(fp) => {
                                    cache_hits.fetch_add(1, Ordering::Relaxed);
                                    fp
                                }
                                Fingerprinted::Hashed(fp) => {
                                    hashed.fetch_add(1, Ordering::Relaxed);
                                    fp
                                }
                            };
                            if let Some(digest) = fp.digest {
                                table.insert(digest, fp.path, fp.size);
                            }
                            None
                        }
                        Err(failure) => Some(failure),
                    };

                    tracker.advance();
                    failure
                })
                .collect()
        });
        tracker.finish();

        failures.extend(hash_failures);
        failures.sort_by(|a, b| a.path.cmp(&b.path));
        let groups = table.into_groups();

        summary.cache_hits = cache_hits.into_inner();
        summary.hashed_files = hashed.into_inner();
        summary.skipped_files = skipped.into_inner();
        summary.interrupted = summary.skipped_files > 0;
        summary.failures = failures;
        summary.duplicate_groups = groups.len();
        summary.duplicate_files = groups.iter().map(|g| g.len() - 1).sum();
        summary.reclaimable_space = groups.iter().map(DuplicateGroup::wasted_space).sum();
        summary.scan_duration = start_time.elapsed();

        if summary.interrupted {
            log::info!(
                "Interrupted: {} files skipped, partial results only",
                summary.skipped_files
            );
        }
        log::info!(
            "Found {} duplicate groups ({} cache hits, {} hashed, {} failed) in {:.2?}",
            summary.duplicate_groups,
            summary.cache_hits,
            summary.hashed_files,
            summary.failures.len(),
            summary.scan_duration
        );

        Ok((groups, summary))
    }

    /// Stat, then take the digest from the cache or the hasher.
    fn fingerprint(&self, path: PathBuf) -> Result<Fingerprinted, HashFailure> {
        let fp = match FileFingerprint::from_path(path.clone()) {
            Ok(fp) => fp,
            Err(error) => {
                log::warn!("Cannot stat {}: {}", path.display(), error);
                return Err(HashFailure { path, error });
            }
        };

        if let Some(ref cache) = self.config.cache {
            if let Some(digest) = cache.lookup(&fp.path, fp.size, fp.modified) {
                log::trace!("Cache hit: {}", fp.path.display());
                return Ok(Fingerprinted::Cached(fp.with_digest(digest)));
            }
            log::trace!("Cache miss: {}", fp.path.display());
        }

        match self.hasher.hash_file(&fp.path) {
            Ok(digest) => {
                if let Some(ref cache) = self.config.cache {
                    cache.update(&fp.path, fp.size, fp.modified, digest);
                }
                Ok(Fingerprinted::Hashed(fp.with_digest(digest)))
            }
            Err(error) => {
                log::warn!("Failed to hash {}: {}", fp.path.display(), error);
                Err(HashFailure {
                    path: fp.path,
                    error,
                })
            }
        }
    }
}

/// Resolve every input to its canonical absolute path, then sort and dedup.
///
/// Two spellings of one file collapse into one entry. A path that cannot be
/// resolved becomes a failure under the name it was given.
fn canonicalize_all(mut paths: Vec<PathBuf>) -> (Vec<PathBuf>, Vec<HashFailure>) {
    paths.sort();
    paths.dedup();

    let mut resolved = Vec::with_capacity(paths.len());
    let mut failures = Vec::new();
    for path in paths {
        match std::fs::canonicalize(&path) {
            Ok(canonical) => resolved.push(canonical),
            Err(e) => {
                let error = HashError::from_io(&path, e);
                log::warn!("Cannot resolve {}: {}", path.display(), error);
                failures.push(HashFailure { path, error });
            }
        }
    }

    resolved.sort();
    resolved.dedup();
    (resolved, failures)
}

/// Outcome of [`find_duplicates_cached`].
#[derive(Debug, Default)]
pub struct ScanReport {
    /// Duplicate groups, sorted by digest
    pub groups: Vec<DuplicateGroup>,
    /// Run statistics, including per-file failures
    pub summary: ScanSummary,
    /// Set when the updated cache could not be written back
    pub cache_error: Option<CacheError>,
}

impl ScanReport {
    /// Files excluded from grouping because they could not be read.
    #[must_use]
    pub fn failures(&self) -> &[HashFailure] {
        &self.summary.failures
    }
}

/// Find duplicates among `paths` using the cache file at `cache_location`.
///
/// The cache is loaded fail-closed (an unreadable or corrupt file behaves
/// like an empty cache) and written back only if the run changed it. A save
/// failure is returned in [`ScanReport::cache_error`] next to the groups,
/// never instead of them.
///
/// # Errors
///
/// Returns [`FinderError`] only if the worker pool cannot be built.
pub fn find_duplicates_cached(
    paths: Vec<PathBuf>,
    cache_location: &Path,
    config: FinderConfig,
) -> Result<ScanReport, FinderError> {
    let cache = Arc::new(HashCache::load(cache_location));
    find_duplicates_with_cache(paths, cache, cache_location, config)
}

/// Like [`find_duplicates_cached`], with a cache the caller already loaded.
///
/// # Errors
///
/// Returns [`FinderError`] only if the worker pool cannot be built.
pub fn find_duplicates_with_cache(
    paths: Vec<PathBuf>,
    cache: Arc<HashCache>,
    cache_location: &Path,
    config: FinderConfig,
) -> Result<ScanReport, FinderError> {
    let finder = DuplicateFinder::new(config.with_cache(Arc::clone(&cache)));
    let (groups, summary) = finder.find_duplicates(paths)?;

    let cache_error = if cache.is_dirty() {
        cache.save(cache_location).err()
    } else {
        None
    };
    if let Some(ref e) = cache_error {
        log::warn!("Failed to persist cache: {}", e);
    }

    Ok(ScanReport {
        groups,
        summary,
        cache_error,
    })
}
