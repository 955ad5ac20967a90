use dupescan::cache::HashCache;
use dupescan::duplicates::{find_duplicates_cached, DuplicateFinder, FinderConfig};
use dupescan::progress::ProgressCallback;
use dupescan::scanner::Walker;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::tempdir;

fn populate(root: &Path) -> Vec<PathBuf> {
    for i in 0..120u32 {
        let sub = root.join(format!("d{}", i % 6));
        fs::create_dir_all(&sub).unwrap();
        // 40 distinct contents, each written three times
        let content = format!("payload number {}", i % 40);
        fs::write(sub.join(format!("f{}.txt", i)), content).unwrap();
    }
    fs::write(root.join("unique.bin"), b"only one of these").unwrap();
    Walker::new(vec![root.to_path_buf()]).walk().files
}

#[test]
fn test_results_identical_across_thread_counts() {
    let dir = tempdir().unwrap();
    let files = populate(dir.path());

    let baseline = DuplicateFinder::new(FinderConfig::default().with_io_threads(1))
        .find_duplicates(files.clone())
        .unwrap()
        .0;
    assert_eq!(baseline.len(), 40);
    assert!(baseline.iter().all(|g| g.len() == 3));

    for threads in [2, 8, 32] {
        let (groups, summary) = DuplicateFinder::new(FinderConfig::default().with_io_threads(threads))
            .find_duplicates(files.clone())
            .unwrap();
        assert_eq!(groups, baseline, "differs with {} threads", threads);
        assert_eq!(summary.hashed_files, files.len());
    }
}

#[test]
fn test_input_order_does_not_matter() {
    let dir = tempdir().unwrap();
    let files = populate(dir.path());
    let mut reversed = files.clone();
    reversed.reverse();

    let finder = DuplicateFinder::new(FinderConfig::default().with_io_threads(4));
    assert_eq!(
        finder.find_duplicates(files).unwrap().0,
        finder.find_duplicates(reversed).unwrap().0
    );
}

#[test]
fn test_shared_cache_consistent_under_parallel_updates() {
    let dir = tempdir().unwrap();
    let files = populate(dir.path());
    let cache = Arc::new(HashCache::new());

    let config = FinderConfig::default()
        .with_io_threads(8)
        .with_cache(Arc::clone(&cache));
    DuplicateFinder::new(config).find_duplicates(files.clone()).unwrap();

    assert_eq!(cache.len(), files.len());
    assert!(cache.is_dirty());
}

#[test]
fn test_cached_and_uncached_runs_agree() {
    let dir = tempdir().unwrap();
    let data = dir.path().join("data");
    fs::create_dir(&data).unwrap();
    let files = populate(&data);
    let cache_path = dir.path().join("hashes.bin");

    let cold = find_duplicates_cached(
        files.clone(),
        &cache_path,
        FinderConfig::default().with_io_threads(3),
    )
    .unwrap();
    let warm = find_duplicates_cached(
        files.clone(),
        &cache_path,
        FinderConfig::default().with_io_threads(7),
    )
    .unwrap();
    let (uncached, _) = DuplicateFinder::with_defaults().find_duplicates(files.clone()).unwrap();

    assert_eq!(cold.groups, uncached);
    assert_eq!(warm.groups, uncached);
    assert_eq!(warm.summary.cache_hits, files.len());
}

#[derive(Default)]
struct Recorder {
    updates: Mutex<Vec<(usize, usize)>>,
    completes: Mutex<usize>,
}

impl ProgressCallback for Recorder {
    fn on_progress(&self, completed: usize, total: usize) {
        self.updates.lock().unwrap().push((completed, total));
    }

    fn on_complete(&self) {
        *self.completes.lock().unwrap() += 1;
    }
}

#[test]
fn test_progress_monotonic_and_reaches_total() {
    let dir = tempdir().unwrap();
    let files = populate(dir.path());
    let total = files.len();
    let recorder = Arc::new(Recorder::default());

    let config = FinderConfig::default()
        .with_io_threads(8)
        .with_progress_batch(7)
        .with_progress_callback(recorder.clone());
    DuplicateFinder::new(config).find_duplicates(files).unwrap();

    let updates = recorder.updates.lock().unwrap();
    assert!(!updates.is_empty());
    assert!(updates.windows(2).all(|w| w[0].0 < w[1].0));
    assert!(updates.iter().all(|&(_, t)| t == total));
    assert_eq!(updates.last().copied(), Some((total, total)));
    assert_eq!(*recorder.completes.lock().unwrap(), 1);
}

#[test]
fn test_shutdown_mid_run_returns_partial_result() {
    struct StopAfter {
        flag: Arc<AtomicBool>,
        after: usize,
        updates: Mutex<Vec<(usize, usize)>>,
        completes: Mutex<usize>,
    }
    impl ProgressCallback for StopAfter {
        fn on_progress(&self, completed: usize, total: usize) {
            self.updates.lock().unwrap().push((completed, total));
            if completed >= self.after {
                self.flag.store(true, Ordering::SeqCst);
            }
        }

        fn on_complete(&self) {
            *self.completes.lock().unwrap() += 1;
        }
    }

    let dir = tempdir().unwrap();
    let files = populate(dir.path());
    let total = files.len();
    let flag = Arc::new(AtomicBool::new(false));
    let stop = Arc::new(StopAfter {
        flag: Arc::clone(&flag),
        after: 10,
        updates: Mutex::new(Vec::new()),
        completes: Mutex::new(0),
    });

    let config = FinderConfig::default()
        .with_io_threads(1)
        .with_progress_batch(1)
        .with_shutdown_flag(Arc::clone(&flag))
        .with_progress_callback(stop.clone());
    let (groups, summary) = DuplicateFinder::new(config).find_duplicates(files).unwrap();

    assert!(summary.interrupted);
    assert!(summary.skipped_files > 0);
    assert_eq!(summary.hashed_files + summary.skipped_files, total);
    for group in &groups {
        assert!(group.len() >= 2);
    }

    // Skipped files still advance progress to the end
    let updates = stop.updates.lock().unwrap();
    assert_eq!(updates.last(), Some(&(total, total)));
    assert_eq!(updates.iter().filter(|u| u.0 == total).count(), 1);
    assert!(updates.windows(2).all(|w| w[0].0 < w[1].0));
    assert_eq!(*stop.completes.lock().unwrap(), 1);
}
