//! JSON output formatter for scan reports.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "duplicates": [
//!     {
//!       "digest": "8bfa8e0684108f419933a5995264d150",
//!       "size": 12,
//!       "files": ["/data/a.txt", "/data/b.txt"]
//!     }
//!   ],
//!   "failures": [
//!     { "path": "/data/locked.bin", "error": "Permission denied: /data/locked.bin" }
//!   ],
//!   "summary": {
//!     "total_files": 3,
//!     "hashed_files": 1,
//!     "cache_hits": 2,
//!     "skipped_files": 0,
//!     "failed_files": 1,
//!     "duplicate_groups": 1,
//!     "duplicate_files": 1,
//!     "reclaimable_space": 12,
//!     "scan_duration_ms": 4,
//!     "interrupted": false,
//!     "exit_code": 3,
//!     "exit_code_name": "DS003"
//!   },
//!   "cache_warning": null
//! }
//! ```

use std::io::Write;

use serde::Serialize;

use crate::duplicates::{DuplicateGroup, HashFailure, ScanReport, ScanSummary};
use crate::error::ExitCode;

/// A single duplicate group in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonDuplicateGroup {
    /// MD5 digest as 32 lowercase hex characters
    pub digest: String,
    /// File size in bytes
    pub size: u64,
    /// Member paths, sorted
    pub files: Vec<String>,
}

impl From<&DuplicateGroup> for JsonDuplicateGroup {
    fn from(group: &DuplicateGroup) -> Self {
        Self {
            digest: group.digest_hex(),
            size: group.size,
            files: group
                .paths
                .iter()
                .map(|p| p.to_string_lossy().into_owned())
                .collect(),
        }
    }
}

/// A file left out of grouping.
#[derive(Debug, Clone, Serialize)]
pub struct JsonFailure {
    pub path: String,
    pub error: String,
}

impl From<&HashFailure> for JsonFailure {
    fn from(failure: &HashFailure) -> Self {
        Self {
            path: failure.path.to_string_lossy().into_owned(),
            error: failure.error.to_string(),
        }
    }
}

/// Summary statistics in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonSummary {
    pub total_files: usize,
    pub hashed_files: usize,
    pub cache_hits: usize,
    pub skipped_files: usize,
    pub failed_files: usize,
    pub duplicate_groups: usize,
    /// Duplicates excluding one original per group
    pub duplicate_files: usize,
    /// Bytes freed by keeping one copy per group
    pub reclaimable_space: u64,
    pub scan_duration_ms: u64,
    pub interrupted: bool,
    pub exit_code: i32,
    /// Machine-readable exit code name (e.g., "DS000")
    pub exit_code_name: String,
}

impl JsonSummary {
    #[must_use]
    pub fn from_scan_summary(summary: &ScanSummary, exit_code: ExitCode) -> Self {
        Self {
            total_files: summary.total_files,
            hashed_files: summary.hashed_files,
            cache_hits: summary.cache_hits,
            skipped_files: summary.skipped_files,
            failed_files: summary.failures.len(),
            duplicate_groups: summary.duplicate_groups,
            duplicate_files: summary.duplicate_files,
            reclaimable_space: summary.reclaimable_space,
            scan_duration_ms: u64::try_from(summary.scan_duration.as_millis()).unwrap_or(u64::MAX),
            interrupted: summary.interrupted,
            exit_code: exit_code.as_i32(),
            exit_code_name: exit_code.code_prefix().to_string(),
        }
    }
}

/// Complete JSON output structure.
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput {
    pub duplicates: Vec<JsonDuplicateGroup>,
    pub failures: Vec<JsonFailure>,
    pub summary: JsonSummary,
    /// Why the cache could not be saved, if it could not
    pub cache_warning: Option<String>,
}

impl JsonOutput {
    /// Build the JSON view of a report.
    ///
    /// # Example
    ///
    /// ```
    /// use dupescan::duplicates::ScanReport;
    /// use dupescan::error::ExitCode;
    /// use dupescan::output::JsonOutput;
    ///
    /// let output = JsonOutput::new(&ScanReport::default(), ExitCode::NoDuplicates);
    /// assert!(output.duplicates.is_empty());
    /// assert_eq!(output.summary.exit_code, 2);
    /// ```
    #[must_use]
    pub fn new(report: &ScanReport, exit_code: ExitCode) -> Self {
        Self {
            duplicates: report.groups.iter().map(JsonDuplicateGroup::from).collect(),
            failures: report.failures().iter().map(JsonFailure::from).collect(),
            summary: JsonSummary::from_scan_summary(&report.summary, exit_code),
            cache_warning: report.cache_error.as_ref().map(ToString::to_string),
        }
    }

    /// Serialize to compact JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to pretty-printed JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write JSON plus a trailing newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W, pretty: bool) -> Result<(), JsonOutputError> {
        let json = if pretty {
            self.to_json_pretty()?
        } else {
            self.to_json()?
        };
        writer.write_all(json.as_bytes())?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}

/// Errors that can occur during JSON output.
#[derive(thiserror::Error, Debug)]
pub enum JsonOutputError {
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error during JSON generation: {0}")]
    Io(#[from] std::io::Error),
}
