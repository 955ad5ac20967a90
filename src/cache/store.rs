//! In-memory hash cache with binary file persistence.

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::SystemTime;

use directories::ProjectDirs;

use super::{format, CacheEntry};
use crate::scanner::Digest;

/// Errors that can occur while loading or saving the cache.
#[derive(thiserror::Error, Debug)]
pub enum CacheError {
    /// The cache file is structurally invalid.
    #[error("Cache file is corrupt: {0}")]
    Corrupt(String),

    /// The cache file was written by an incompatible layout version.
    #[error("Unsupported cache format version: {0}")]
    UnsupportedVersion(u32),

    /// Reading or writing the cache file failed.
    #[error("Cache I/O error for {path}: {source}")]
    Io {
        /// Cache file location
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Mapping from absolute path to the last known `(size, mtime, digest)`.
///
/// Shared between hashing workers as `Arc<HashCache>`. Reads take a shared
/// lock, upserts an exclusive one.
#[derive(Debug, Default)]
pub struct HashCache {
    entries: RwLock<HashMap<PathBuf, CacheEntry>>,
    dirty: AtomicBool,
}

impl HashCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the cache at `location`, degrading to an empty cache on any failure.
    ///
    /// A missing file is the normal first-run case and is not reported.
    /// Corruption, truncation, version mismatch or read errors are logged
    /// and yield an empty cache so the run rehashes everything.
    #[must_use]
    pub fn load(location: &Path) -> Self {
        match Self::try_load(location) {
            Ok(cache) => cache,
            Err(CacheError::Io { ref source, .. })
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                log::debug!("No cache at {}, starting empty", location.display());
                Self::new()
            }
            Err(e) => {
                log::warn!(
                    "Ignoring unusable cache {}: {}. All files will be rehashed.",
                    location.display(),
                    e
                );
                Self::new()
            }
        }
    }

    /// Load the cache at `location`, reporting why it could not be read.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] for I/O failures, corruption or version mismatch.
    pub fn try_load(location: &Path) -> CacheResult<Self> {
        let bytes = fs::read(location).map_err(|source| CacheError::Io {
            path: location.to_path_buf(),
            source,
        })?;
        let decoded = format::decode(&bytes)?;

        // Last write wins on duplicate paths
        let entries: HashMap<PathBuf, CacheEntry> = decoded
            .into_iter()
            .map(|entry| (entry.path.clone(), entry))
            .collect();

        log::debug!(
            "Loaded {} cache entries from {}",
            entries.len(),
            location.display()
        );

        Ok(Self {
            entries: RwLock::new(entries),
            dirty: AtomicBool::new(false),
        })
    }

    /// Return the cached digest if `path` was recorded with exactly this size and mtime.
    #[must_use]
    pub fn lookup(&self, path: &Path, size: u64, modified: SystemTime) -> Option<Digest> {
        self.read()
            .get(path)
            .filter(|entry| entry.is_valid_for(size, modified))
            .map(|entry| entry.digest)
    }

    /// Insert or overwrite the entry for `path`.
    ///
    /// Writing an identical entry again leaves the cache clean.
    pub fn update(&self, path: &Path, size: u64, modified: SystemTime, digest: Digest) {
        let entry = CacheEntry {
            path: path.to_path_buf(),
            size,
            modified,
            digest,
        };
        let mut entries = self.write();
        if entries.get(path) != Some(&entry) {
            entries.insert(entry.path.clone(), entry);
            self.dirty.store(true, Ordering::SeqCst);
        }
    }

    /// Serialize the full mapping to `location`.
    ///
    /// The bytes go to a sibling temporary file that is then renamed over
    /// `location`, so an interrupted save never clobbers the previous cache.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Io`] if the directory, temporary file or rename fails.
    pub fn save(&self, location: &Path) -> CacheResult<()> {
        let io_err = |source| CacheError::Io {
            path: location.to_path_buf(),
            source,
        };

        let bytes = {
            let entries = self.read();
            let mut sorted: Vec<&CacheEntry> = entries.values().collect();
            sorted.sort_by(|a, b| a.path.cmp(&b.path));
            format::encode(sorted.into_iter())
        };

        if let Some(parent) = location.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let tmp = temp_path_for(location);
        let write_result = fs::File::create(&tmp).and_then(|mut file| {
            file.write_all(&bytes)?;
            file.sync_all()
        });
        if let Err(e) = write_result.and_then(|()| fs::rename(&tmp, location)) {
            let _ = fs::remove_file(&tmp);
            return Err(io_err(e));
        }

        self.dirty.store(false, Ordering::SeqCst);
        log::debug!("Saved {} cache entries to {}", self.len(), location.display());
        Ok(())
    }

    /// Whether entries changed since load or the last successful save.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::SeqCst)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Whether the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Snapshot of all entries, sorted by path.
    #[must_use]
    pub fn entries(&self) -> Vec<CacheEntry> {
        let mut all: Vec<CacheEntry> = self.read().values().cloned().collect();
        all.sort_by(|a, b| a.path.cmp(&b.path));
        all
    }

    /// Drop every entry.
    pub fn clear(&self) {
        let mut entries = self.write();
        if !entries.is_empty() {
            entries.clear();
            self.dirty.store(true, Ordering::SeqCst);
        }
    }

    /// Remove entries whose file no longer exists. Returns how many were removed.
    pub fn prune_missing(&self) -> usize {
        let mut entries = self.write();
        let before = entries.len();
        entries.retain(|path, _| path.is_file());
        let removed = before - entries.len();
        if removed > 0 {
            self.dirty.store(true, Ordering::SeqCst);
            log::info!("Pruned {} stale cache entries", removed);
        }
        removed
    }

    // Poison is ignored: an insert is never observable half-done.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<PathBuf, CacheEntry>> {
        self.entries
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<PathBuf, CacheEntry>> {
        self.entries
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

/// Default platform-specific cache location.
///
/// Returns `None` when no home directory can be determined.
#[must_use]
pub fn default_cache_path() -> Option<PathBuf> {
    ProjectDirs::from("com", "dupescan", "dupescan").map(|dirs| dirs.cache_dir().join("hashes.bin"))
}

fn temp_path_for(location: &Path) -> PathBuf {
    let mut name = location
        .file_name()
        .map(std::ffi::OsStr::to_os_string)
        .unwrap_or_default();
    name.push(format!(".tmp.{}", std::process::id()));
    location.with_file_name(name)
}
