use dupescan::cache::HashCache;
use dupescan::duplicates::{find_duplicates_cached, find_duplicates_with_cache, FinderConfig};
use dupescan::scanner::{Hasher, Walker};
use filetime::{set_file_mtime, FileTime};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::tempdir;

fn write_file(path: &Path, content: &[u8]) {
    File::create(path).unwrap().write_all(content).unwrap();
}

fn walk(root: &Path) -> Vec<PathBuf> {
    Walker::new(vec![root.to_path_buf()]).walk().files
}

#[test]
fn test_cache_initial_scan_and_rescan() {
    let dir = tempdir().unwrap();
    let cache_dir = tempdir().unwrap();
    let cache_path = cache_dir.path().join("hashes.bin");

    write_file(&dir.path().join("file1.txt"), b"duplicate content");
    write_file(&dir.path().join("file2.txt"), b"duplicate content");

    let first = find_duplicates_cached(walk(dir.path()), &cache_path, FinderConfig::default()).unwrap();
    assert_eq!(first.groups.len(), 1);
    assert_eq!(first.summary.hashed_files, 2);
    assert_eq!(first.summary.cache_hits, 0);
    assert!(first.cache_error.is_none());
    assert!(cache_path.is_file());

    let second = find_duplicates_cached(walk(dir.path()), &cache_path, FinderConfig::default()).unwrap();
    assert_eq!(second.groups, first.groups);
    assert_eq!(second.summary.hashed_files, 0);
    assert_eq!(second.summary.cache_hits, 2);
}

#[test]
fn test_saved_cache_holds_exact_digests() {
    let dir = tempdir().unwrap();
    let cache_path = dir.path().join("hashes.bin");
    let file = dir.path().join("data.txt");
    write_file(&file, b"Test content");

    find_duplicates_cached(vec![file.clone()], &cache_path, FinderConfig::default()).unwrap();

    let cache = HashCache::try_load(&cache_path).unwrap();
    assert_eq!(cache.len(), 1);
    let entry = &cache.entries()[0];
    assert_eq!(entry.path, fs::canonicalize(&file).unwrap());
    assert_eq!(entry.size, 12);
    assert_eq!(entry.digest, Hasher::new().hash_file(&file).unwrap());
}

#[test]
fn test_cache_invalidation_on_mtime_change() {
    let dir = tempdir().unwrap();
    let cache_dir = tempdir().unwrap();
    let cache_path = cache_dir.path().join("hashes.bin");

    let file1 = dir.path().join("file1.txt");
    let file2 = dir.path().join("file2.txt");
    write_file(&file1, b"identical content 21b");
    write_file(&file2, b"identical content 21b");

    let first = find_duplicates_cached(walk(dir.path()), &cache_path, FinderConfig::default()).unwrap();
    assert_eq!(first.groups.len(), 1);

    // Same size, new content, mtime moved forward
    let before = FileTime::from_last_modification_time(&fs::metadata(&file1).unwrap());
    write_file(&file1, b"different content 21b");
    set_file_mtime(&file1, FileTime::from_unix_time(before.unix_seconds() + 10, 0)).unwrap();

    let second = find_duplicates_cached(walk(dir.path()), &cache_path, FinderConfig::default()).unwrap();
    assert!(second.groups.is_empty());
    assert_eq!(second.summary.hashed_files, 1);
    assert_eq!(second.summary.cache_hits, 1);
}

#[test]
fn test_cache_invalidation_on_size_change() {
    let dir = tempdir().unwrap();
    let cache_path = dir.path().join("cache").join("hashes.bin");
    let data = dir.path().join("data");
    fs::create_dir(&data).unwrap();

    let file = data.join("grow.txt");
    write_file(&file, b"short");
    let mtime = FileTime::from_last_modification_time(&fs::metadata(&file).unwrap());
    find_duplicates_cached(walk(&data), &cache_path, FinderConfig::default()).unwrap();

    write_file(&file, b"much longer content");
    set_file_mtime(&file, mtime).unwrap();

    let report = find_duplicates_cached(walk(&data), &cache_path, FinderConfig::default()).unwrap();
    assert_eq!(report.summary.hashed_files, 1);

    let cache = HashCache::try_load(&cache_path).unwrap();
    assert_eq!(cache.entries()[0].size, 19);
}

#[test]
fn test_unchanged_size_and_mtime_trust_cached_digest() {
    let dir = tempdir().unwrap();
    let cache_path = dir.path().join("hashes.bin");
    let a = dir.path().join("a.txt");
    let b = dir.path().join("b.txt");
    write_file(&a, b"AAAA");
    write_file(&b, b"BBBB");

    let first = find_duplicates_cached(vec![a.clone(), b.clone()], &cache_path, FinderConfig::default()).unwrap();
    assert!(first.groups.is_empty());

    // Rewrite a with b's content but restore its size and mtime exactly
    let mtime = FileTime::from_last_modification_time(&fs::metadata(&a).unwrap());
    write_file(&a, b"BBBB");
    set_file_mtime(&a, mtime).unwrap();

    let second = find_duplicates_cached(vec![a, b], &cache_path, FinderConfig::default()).unwrap();
    assert_eq!(second.summary.cache_hits, 2);
    assert!(second.groups.is_empty());
}

#[test]
fn test_empty_input_leaves_cache_untouched() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("never-written.bin");

    let report = find_duplicates_cached(Vec::new(), &missing, FinderConfig::default()).unwrap();
    assert!(report.groups.is_empty());
    assert!(!missing.exists());

    let existing = dir.path().join("hashes.bin");
    let file = dir.path().join("f.txt");
    write_file(&file, b"x");
    find_duplicates_cached(vec![file], &existing, FinderConfig::default()).unwrap();
    let before = fs::read(&existing).unwrap();

    find_duplicates_cached(Vec::new(), &existing, FinderConfig::default()).unwrap();
    assert_eq!(fs::read(&existing).unwrap(), before);
}

#[test]
fn test_full_cache_hit_run_does_not_rewrite() {
    let dir = tempdir().unwrap();
    let cache_path = dir.path().join("hashes.bin");
    let file = dir.path().join("f.txt");
    write_file(&file, b"stable");

    find_duplicates_cached(vec![file.clone()], &cache_path, FinderConfig::default()).unwrap();
    let stamp = FileTime::from_unix_time(1_000_000, 0);
    set_file_mtime(&cache_path, stamp).unwrap();

    find_duplicates_cached(vec![file], &cache_path, FinderConfig::default()).unwrap();
    let after = FileTime::from_last_modification_time(&fs::metadata(&cache_path).unwrap());
    assert_eq!(after, stamp);
}

#[test]
fn test_clear_and_prune() {
    let dir = tempdir().unwrap();
    let cache_path = dir.path().join("hashes.bin");
    let keep = dir.path().join("keep.txt");
    let gone = dir.path().join("gone.txt");
    write_file(&keep, b"keep");
    write_file(&gone, b"gone");

    find_duplicates_cached(vec![keep.clone(), gone.clone()], &cache_path, FinderConfig::default()).unwrap();
    fs::remove_file(&gone).unwrap();

    let cache = HashCache::load(&cache_path);
    assert_eq!(cache.prune_missing(), 1);
    assert!(cache.is_dirty());
    cache.save(&cache_path).unwrap();
    assert_eq!(
        HashCache::try_load(&cache_path).unwrap().entries()[0].path,
        fs::canonicalize(&keep).unwrap()
    );

    let cache = HashCache::load(&cache_path);
    cache.clear();
    cache.save(&cache_path).unwrap();
    assert!(HashCache::try_load(&cache_path).unwrap().is_empty());
}

#[test]
fn test_cleared_cache_rehashes_every_file() {
    let dir = tempdir().unwrap();
    let cache_path = dir.path().join("hashes.bin");
    write_file(&dir.path().join("a"), b"dup");
    write_file(&dir.path().join("b"), b"dup");
    write_file(&dir.path().join("c"), b"solo");
    let files = walk(dir.path());
    assert_eq!(files.len(), 3);

    find_duplicates_cached(files.clone(), &cache_path, FinderConfig::default()).unwrap();

    let warm = Arc::new(HashCache::load(&cache_path));
    let report =
        find_duplicates_with_cache(files.clone(), warm, &cache_path, FinderConfig::default()).unwrap();
    assert_eq!(report.summary.cache_hits, 3);
    assert_eq!(report.summary.hashed_files, 0);

    let cleared = HashCache::load(&cache_path);
    cleared.clear();
    let report =
        find_duplicates_with_cache(files, Arc::new(cleared), &cache_path, FinderConfig::default())
            .unwrap();
    assert_eq!(report.summary.cache_hits, 0);
    assert_eq!(report.summary.hashed_files, 3);
    assert_eq!(report.groups.len(), 1);
    assert_eq!(HashCache::try_load(&cache_path).unwrap().len(), 3);
}
