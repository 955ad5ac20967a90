//! dupescan - Incremental Duplicate File Finder
//!
//! Walks one or more directory trees, fingerprints every regular file with an
//! MD5 content digest and reports groups of files with identical content.
//! Digests are kept in a binary cache keyed by path, size and modification
//! time, so a repeat run only reads files that changed.
//!
//! # Library usage
//!
//! ```no_run
//! use dupescan::duplicates::{find_duplicates_cached, FinderConfig};
//! use dupescan::scanner::Walker;
//! use std::path::{Path, PathBuf};
//!
//! let walk = Walker::new(vec![PathBuf::from("/data")]).walk();
//! let report = find_duplicates_cached(walk.files, Path::new("hashes.bin"), FinderConfig::default())?;
//! for group in &report.groups {
//!     println!("{}: {:?}", group.digest_hex(), group.paths);
//! }
//! # Ok::<(), dupescan::duplicates::FinderError>(())
//! ```

pub mod cache;
pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod scanner;
pub mod signal;

use std::io::Write;
use std::sync::Arc;

use anyhow::Context;

use crate::cache::{default_cache_path, HashCache};
use crate::cli::{Cli, OutputFormat};
use crate::config::Config;
use crate::duplicates::{find_duplicates_with_cache, DuplicateFinder, FinderConfig, ScanReport};
use crate::error::ExitCode;
use crate::output::{JsonOutput, TextOutput};
use crate::progress::Progress;
use crate::scanner::Walker;

/// Run the command line application.
///
/// Per-file and cache problems are reported in the output and reflected in
/// the exit code; only setup failures (bad config, thread pool, stdout) are
/// returned as errors.
///
/// # Errors
///
/// Returns an error if configuration cannot be loaded, the signal handler or
/// worker pool cannot be set up, or the report cannot be written.
pub fn run_app(cli: Cli) -> anyhow::Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);

    let config = Config::load_with_overrides(cli.config.as_deref(), &cli.config_overrides())
        .context("Failed to load configuration")?;
    log::debug!("Effective configuration: {:?}", config);

    if cli.print_config {
        let text = config.to_toml().context("Failed to render configuration")?;
        print!("{}", text);
        return Ok(ExitCode::Success);
    }

    let shutdown = signal::install_handler()?;

    let progress = (!cli.quiet && !cli.no_progress).then(|| Arc::new(Progress::new(false)));

    let mut walker = Walker::new(cli.roots.clone()).with_shutdown_flag(shutdown.get_flag());
    if let Some(ref progress) = progress {
        walker = walker.with_progress(progress.clone());
    }
    let walk = walker.walk();
    for e in &walk.errors {
        log::warn!("{}", e);
    }

    let mut finder_config = FinderConfig::default()
        .with_io_threads(config.resolved_io_threads())
        .with_progress_batch(config.progress_batch)
        .with_shutdown_flag(shutdown.get_flag());
    if let Some(progress) = progress {
        finder_config = finder_config.with_progress_callback(progress);
    }

    let cache_location = if config.no_cache {
        None
    } else {
        let location = config.cache_path.clone().or_else(default_cache_path);
        if location.is_none() {
            log::warn!("No cache directory available on this platform, running without cache");
        }
        location
    };

    let mut report = match cache_location {
        Some(location) => {
            let cache = HashCache::load(&location);
            if cli.clear_cache {
                log::info!("Clearing {} cached digests", cache.len());
                cache.clear();
            }
            if cli.prune_cache {
                cache.prune_missing();
            }
            find_duplicates_with_cache(walk.files, Arc::new(cache), &location, finder_config)?
        }
        None => {
            let (groups, summary) = DuplicateFinder::new(finder_config).find_duplicates(walk.files)?;
            ScanReport {
                groups,
                summary,
                cache_error: None,
            }
        }
    };

    // A Ctrl+C during the walk leaves the file list incomplete
    if shutdown.is_shutdown_requested() {
        report.summary.interrupted = true;
    }

    let exit_code = ExitCode::for_report(&report, walk.errors.len());
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match cli.output {
        OutputFormat::Text => TextOutput::new(&report).write_to(&mut out)?,
        OutputFormat::Json => JsonOutput::new(&report, exit_code).write_to(&mut out, true)?,
    }
    out.flush()?;

    Ok(exit_code)
}
