//! Progress reporting utilities.
//!
//! The duplicate finder only talks to the narrow [`ProgressCallback`] trait.
//! [`ProgressTracker`] sits between the hashing workers and the callback and
//! guarantees the reporting contract:
//!
//! - `completed` never decreases, even though workers finish out of order
//! - reports are batched (every `batch` files or every [`REPORT_INTERVAL`])
//! - `(total, total)` is reported exactly once, followed by `on_complete`
//!
//! Directory enumeration has no known total up front, so it reports through
//! the separate [`WalkProgress`] trait as a running file count.
//!
//! [`Progress`] renders both: a spinner while walking and a progress bar
//! while comparing.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};

/// Minimum time between two intermediate reports.
pub const REPORT_INTERVAL: Duration = Duration::from_millis(100);

/// Receiver of `(completed, total)` updates during a run.
///
/// Purely observational: nothing it does feeds back into the result.
pub trait ProgressCallback: Send + Sync {
    /// Called once before any file is processed.
    fn on_start(&self, _total: usize) {}

    /// Called with the number of files finished so far.
    fn on_progress(&self, completed: usize, total: usize);

    /// Called once after the last update.
    fn on_complete(&self) {}
}

/// Receiver of the running file count while directories are enumerated.
pub trait WalkProgress: Send + Sync {
    /// Called once before the first root is read.
    fn on_walk_start(&self) {}

    /// Called each time a new regular file is found.
    fn on_file_found(&self, found: usize);

    /// Called once when enumeration ends, finished or interrupted.
    fn on_walk_complete(&self, _found: usize) {}
}

struct TrackerState {
    completed: usize,
    last_reported: usize,
    last_report_at: Instant,
}

/// Serializes completion counting and throttles reports to a callback.
pub struct ProgressTracker {
    callback: Option<Arc<dyn ProgressCallback>>,
    total: usize,
    batch: usize,
    state: Mutex<TrackerState>,
}

impl ProgressTracker {
    /// Create a tracker for `total` items, reporting every `batch` completions.
    #[must_use]
    pub fn new(callback: Option<Arc<dyn ProgressCallback>>, total: usize, batch: usize) -> Self {
        if let Some(ref cb) = callback {
            cb.on_start(total);
        }
        Self {
            callback,
            total,
            batch: batch.max(1),
            state: Mutex::new(TrackerState {
                completed: 0,
                last_reported: 0,
                last_report_at: Instant::now(),
            }),
        }
    }

    /// Record one finished item. Returns the new completed count.
    pub fn advance(&self) -> usize {
        let mut state = self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        state.completed = (state.completed + 1).min(self.total);
        let completed = state.completed;

        let due = completed == self.total
            || completed - state.last_reported >= self.batch
            || state.last_report_at.elapsed() >= REPORT_INTERVAL;

        // Reported under the lock so updates reach the callback in order
        if due && completed > state.last_reported {
            state.last_reported = completed;
            state.last_report_at = Instant::now();
            if let Some(ref cb) = self.callback {
                cb.on_progress(completed, self.total);
            }
        }
        completed
    }

    /// Number of items finished so far.
    #[must_use]
    pub fn completed(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .completed
    }

    /// Signal the end of the run.
    ///
    /// An empty run reports `(0, 0)` once so the sink still sees `total`.
    pub fn finish(&self) {
        if let Some(ref cb) = self.callback {
            if self.total == 0 {
                cb.on_progress(0, 0);
            }
            cb.on_complete();
        }
    }
}

/// Progress reporter using indicatif.
pub struct Progress {
    spinner: Mutex<Option<ProgressBar>>,
    bar: Mutex<Option<ProgressBar>>,
    quiet: bool,
}

impl Progress {
    /// Create a new progress reporter.
    ///
    /// # Arguments
    ///
    /// * `quiet` - If true, no progress bar will be displayed.
    ///
    /// # Examples
    ///
    /// ```
    /// use dupescan::progress::Progress;
    ///
    /// let progress = Progress::new(false);
    /// ```
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        Self {
            spinner: Mutex::new(None),
            bar: Mutex::new(None),
            quiet,
        }
    }

    fn walking_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.green} {msg} [{elapsed_precise}] {pos} files")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
    }

    fn style() -> ProgressStyle {
        ProgressStyle::with_template(
            "[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg} (ETA: {eta})",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█>-")
    }
}

impl ProgressCallback for Progress {
    fn on_start(&self, total: usize) {
        if self.quiet {
            return;
        }
        let pb = ProgressBar::new(total as u64);
        pb.set_style(Self::style());
        pb.set_message("Comparing files");
        *self.bar.lock().unwrap_or_else(std::sync::PoisonError::into_inner) = Some(pb);
    }

    fn on_progress(&self, completed: usize, _total: usize) {
        if let Some(ref pb) = *self.bar.lock().unwrap_or_else(std::sync::PoisonError::into_inner) {
            pb.set_position(completed as u64);
        }
    }

    fn on_complete(&self) {
        if let Some(pb) = self
            .bar
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .take()
        {
            pb.finish_with_message("Comparison complete");
        }
    }
}

impl WalkProgress for Progress {
    fn on_walk_start(&self) {
        if self.quiet {
            return;
        }
        let pb = ProgressBar::new_spinner();
        pb.set_style(Self::walking_style());
        pb.set_message("Scanning directories");
        pb.enable_steady_tick(Duration::from_millis(100));
        *self.spinner.lock().unwrap_or_else(std::sync::PoisonError::into_inner) = Some(pb);
    }

    fn on_file_found(&self, found: usize) {
        if let Some(ref pb) = *self.spinner.lock().unwrap_or_else(std::sync::PoisonError::into_inner) {
            pb.set_position(found as u64);
        }
    }

    fn on_walk_complete(&self, found: usize) {
        if let Some(pb) = self
            .spinner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .take()
        {
            pb.set_position(found as u64);
            pb.finish_with_message("Scan complete");
        }
    }
}
