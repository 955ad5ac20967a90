//! Directory walker built on walkdir.
//!
//! # Overview
//!
//! This module provides the [`Walker`] struct for enumerating every regular
//! file under one or more root directories. It is the file enumerator the
//! duplicate finder consumes; it never hashes anything itself.
//!
//! # Behavior
//!
//! - Depth-unbounded traversal, symbolic links are never followed
//! - Only regular files are returned (empty files included)
//! - A failing root or subtree is recorded and logged; siblings continue
//! - Overlapping roots never yield the same file twice
//! - Graceful shutdown via atomic flag
//! - Optional running file count through [`WalkProgress`]
//!
//! # Example
//!
//! ```no_run
//! use dupescan::scanner::Walker;
//! use std::path::PathBuf;
//!
//! let outcome = Walker::new(vec![PathBuf::from("/home/user/Downloads")]).walk();
//! println!("{} files, {} errors", outcome.files.len(), outcome.errors.len());
//! ```

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use walkdir::WalkDir;

use super::ScanError;
use crate::progress::WalkProgress;

/// Result of enumerating all roots.
#[derive(Debug, Default)]
pub struct WalkOutcome {
    /// Absolute paths of regular files, sorted and de-duplicated
    pub files: Vec<PathBuf>,
    /// Errors for roots or subtrees that could not be read
    pub errors: Vec<ScanError>,
}

/// Recursive regular-file enumerator over one or more roots.
pub struct Walker {
    roots: Vec<PathBuf>,
    shutdown_flag: Option<Arc<AtomicBool>>,
    progress: Option<Arc<dyn WalkProgress>>,
}

impl std::fmt::Debug for Walker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Walker")
            .field("roots", &self.roots)
            .field("shutdown_flag", &self.shutdown_flag)
            .field("progress", &self.progress.as_ref().map(|_| "<progress>"))
            .finish()
    }
}

impl Walker {
    /// Create a new walker for the given roots.
    #[must_use]
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self {
            roots,
            shutdown_flag: None,
            progress: None,
        }
    }

    /// Report the running file count while walking.
    #[must_use]
    pub fn with_progress(mut self, progress: Arc<dyn WalkProgress>) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Walk every root and collect regular files.
    pub fn walk(&self) -> WalkOutcome {
        let mut files = BTreeSet::new();
        let mut errors = Vec::new();
        if let Some(ref progress) = self.progress {
            progress.on_walk_start();
        }

        for root in &self.roots {
            if self.is_shutdown_requested() {
                log::debug!("Walker: Shutdown requested, stopping enumeration");
                break;
            }

            let root = match resolve_root(root) {
                Ok(root) => root,
                Err(e) => {
                    log::warn!("Skipping root: {}", e);
                    errors.push(e);
                    continue;
                }
            };

            log::info!("Scanning {}", root.display());
            self.walk_root(&root, &mut files, &mut errors);
        }

        log::debug!(
            "Enumeration finished: {} files, {} errors",
            files.len(),
            errors.len()
        );
        if let Some(ref progress) = self.progress {
            progress.on_walk_complete(files.len());
        }

        WalkOutcome {
            files: files.into_iter().collect(),
            errors,
        }
    }

    fn walk_root(&self, root: &Path, files: &mut BTreeSet<PathBuf>, errors: &mut Vec<ScanError>) {
        for entry in WalkDir::new(root).follow_links(false) {
            if self.is_shutdown_requested() {
                return;
            }

            match entry {
                Ok(entry) => {
                    if entry.file_type().is_file() {
                        if files.insert(entry.into_path()) {
                            if let Some(ref progress) = self.progress {
                                progress.on_file_found(files.len());
                            }
                        }
                    } else {
                        log::trace!("Skipping non-regular entry: {}", entry.path().display());
                    }
                }
                Err(e) => {
                    let path = e.path().map_or_else(|| root.to_path_buf(), Path::to_path_buf);
                    log::warn!("Walker error for {}: {}", path.display(), e);
                    errors.push(classify_walk_error(path, e));
                }
            }
        }
    }
}

/// Canonicalize a root and make sure it is a directory.
fn resolve_root(root: &Path) -> Result<PathBuf, ScanError> {
    let canonical = std::fs::canonicalize(root).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => ScanError::NotFound(root.to_path_buf()),
        std::io::ErrorKind::PermissionDenied => ScanError::PermissionDenied(root.to_path_buf()),
        _ => ScanError::Io {
            path: root.to_path_buf(),
            source: e,
        },
    })?;

    if !canonical.is_dir() {
        return Err(ScanError::NotADirectory(root.to_path_buf()));
    }
    Ok(canonical)
}

fn classify_walk_error(path: PathBuf, error: walkdir::Error) -> ScanError {
    match error.io_error().map(std::io::Error::kind) {
        Some(std::io::ErrorKind::PermissionDenied) => ScanError::PermissionDenied(path),
        Some(std::io::ErrorKind::NotFound) => ScanError::NotFound(path),
        _ => ScanError::Io {
            path,
            source: error
                .into_io_error()
                .unwrap_or_else(|| std::io::Error::other("filesystem loop detected")),
        },
    }
}
