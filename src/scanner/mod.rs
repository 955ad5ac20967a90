//! Scanner module for file enumeration and content hashing.
//!
//! This module provides functionality for:
//! - Recursive directory enumeration using walkdir
//! - Streaming content hashing with MD5
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`walker`]: Directory traversal and regular file discovery
//! - [`hasher`]: MD5 file hashing (streaming, 4 KiB chunks)
//!
//! # Example
//!
//! ```no_run
//! use dupescan::scanner::{Hasher, Walker};
//! use std::path::PathBuf;
//!
//! let outcome = Walker::new(vec![PathBuf::from(".")]).walk();
//! let hasher = Hasher::new();
//! for path in &outcome.files {
//!     match hasher.hash_file(path) {
//!         Ok(digest) => println!("{}  {}", dupescan::scanner::digest_to_hex(&digest), path.display()),
//!         Err(e) => eprintln!("Warning: {}", e),
//!     }
//! }
//! ```

pub mod hasher;
pub mod walker;

use std::path::PathBuf;
use std::time::SystemTime;

// Re-export main types
pub use hasher::{digest_to_hex, hex_to_digest, Digest, Hasher, CHUNK_SIZE};
pub use walker::{WalkOutcome, Walker};

/// What the engine knows about one file at one point in time.
///
/// Created per run from the enumerated file list. The digest is attached
/// once, either from the cache or from the hasher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFingerprint {
    /// Absolute path to the file
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
    /// Last modification time
    pub modified: SystemTime,
    /// Content digest, absent until computed
    pub digest: Option<Digest>,
}

impl FileFingerprint {
    /// Create a fingerprint without a digest.
    #[must_use]
    pub fn new(path: PathBuf, size: u64, modified: SystemTime) -> Self {
        Self {
            path,
            size,
            modified,
            digest: None,
        }
    }

    /// Stat `path` and build a fingerprint from its current metadata.
    ///
    /// # Errors
    ///
    /// Returns a [`HashError`] if the file vanished or cannot be stat'ed.
    pub fn from_path(path: PathBuf) -> Result<Self, HashError> {
        let metadata = std::fs::metadata(&path).map_err(|e| HashError::from_io(&path, e))?;
        let modified = metadata
            .modified()
            .map_err(|e| HashError::from_io(&path, e))?;
        Ok(Self::new(path, metadata.len(), modified))
    }

    /// Attach the computed digest.
    #[must_use]
    pub fn with_digest(mut self, digest: Digest) -> Self {
        self.digest = Some(digest);
        self
    }
}

/// Errors that can occur during directory enumeration.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Permission was denied when accessing a file or directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The specified path was not found.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// The specified path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// An I/O error occurred while accessing a file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Errors that can occur during file hashing.
#[derive(thiserror::Error, Debug)]
pub enum HashError {
    /// The specified file was not found.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when reading the file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// An I/O error occurred while reading the file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl HashError {
    /// Classify an I/O error raised while opening, stat'ing or reading `path`.
    #[must_use]
    pub fn from_io(path: &std::path::Path, source: std::io::Error) -> Self {
        match source.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source,
            },
        }
    }

    /// The path the error refers to.
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::NotFound(path) | Self::PermissionDenied(path) => path,
            Self::Io { path, .. } => path,
        }
    }
}
