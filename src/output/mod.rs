//! Output formatters for scan reports.
//!
//! - Text for people at a terminal
//! - JSON for automation and scripting
//!
//! # Example
//!
//! ```no_run
//! use dupescan::duplicates::{DuplicateFinder, ScanReport};
//! use dupescan::error::ExitCode;
//! use dupescan::output::JsonOutput;
//! use std::path::PathBuf;
//!
//! let (groups, summary) = DuplicateFinder::with_defaults()
//!     .find_duplicates(vec![PathBuf::from("a.txt"), PathBuf::from("b.txt")])
//!     .unwrap();
//! let report = ScanReport { groups, summary, cache_error: None };
//!
//! let output = JsonOutput::new(&report, ExitCode::for_report(&report, 0));
//! println!("{}", output.to_json_pretty().unwrap());
//! ```

pub mod json;
pub mod text;

pub use json::{JsonOutput, JsonOutputError};
pub use text::{format_size, TextOutput};
