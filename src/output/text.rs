//! Human-readable report for the terminal.

use std::io::{self, Write};

use bytesize::ByteSize;

use crate::duplicates::ScanReport;

/// Format a byte count with IEC units (e.g. "1.5 KiB").
#[must_use]
pub fn format_size(bytes: u64) -> String {
    ByteSize::b(bytes).to_string()
}

/// Plain-text writer for a [`ScanReport`].
#[derive(Debug)]
pub struct TextOutput<'a> {
    report: &'a ScanReport,
}

impl<'a> TextOutput<'a> {
    #[must_use]
    pub fn new(report: &'a ScanReport) -> Self {
        Self { report }
    }

    /// Write groups, unreadable files and a one-line summary.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let report = self.report;
        let summary = &report.summary;

        if report.groups.is_empty() {
            writeln!(writer, "No duplicate files found.")?;
        } else {
            writeln!(writer, "Duplicate files found:")?;
            for group in &report.groups {
                writeln!(writer)?;
                writeln!(
                    writer,
                    "{} ({} each, {} copies)",
                    group.digest_hex(),
                    format_size(group.size),
                    group.len()
                )?;
                for path in &group.paths {
                    writeln!(writer, "  {}", path.display())?;
                }
            }
        }

        if !report.failures().is_empty() {
            writeln!(writer)?;
            writeln!(writer, "Could not read {} file(s):", report.failures().len())?;
            for failure in report.failures() {
                writeln!(writer, "  {}", failure.error)?;
            }
        }

        writeln!(writer)?;
        writeln!(
            writer,
            "{} files compared ({} cached), {} duplicate groups, {} redundant files, {} reclaimable",
            summary.total_files,
            summary.cache_hits,
            summary.duplicate_groups,
            summary.duplicate_files,
            format_size(summary.reclaimable_space)
        )?;
        if summary.interrupted {
            writeln!(
                writer,
                "Interrupted: {} files were not compared, results are partial",
                summary.skipped_files
            )?;
        }
        if let Some(ref e) = report.cache_error {
            writeln!(writer, "Warning: cache not saved: {}", e)?;
        }
        Ok(())
    }
}
