use dupescan::cache::format::{FORMAT_VERSION, MAGIC};
use dupescan::cache::{CacheError, HashCache};
use dupescan::duplicates::{find_duplicates_cached, FinderConfig};
use std::fs;
use std::path::PathBuf;
use tempfile::{tempdir, TempDir};

fn setup_duplicates(dir: &TempDir) -> Vec<PathBuf> {
    let a = dir.path().join("a.txt");
    let b = dir.path().join("b.txt");
    fs::write(&a, b"Identical content").unwrap();
    fs::write(&b, b"Identical content").unwrap();
    vec![a, b]
}

fn assert_recovers(dir: &TempDir, cache_path: &std::path::Path) {
    let files = setup_duplicates(dir);
    let report = find_duplicates_cached(files, cache_path, FinderConfig::default()).unwrap();

    assert_eq!(report.groups.len(), 1);
    assert_eq!(report.summary.hashed_files, 2);
    assert_eq!(report.summary.cache_hits, 0);
    assert!(report.cache_error.is_none());

    // The bad file was replaced with a valid one
    let reloaded = HashCache::try_load(cache_path).unwrap();
    assert_eq!(reloaded.len(), 2);
}

#[test]
fn test_garbage_cache_file() {
    let dir = tempdir().unwrap();
    let cache_path = dir.path().join("hashes.bin");
    fs::write(&cache_path, b"this is definitely not a cache file at all, just text").unwrap();

    assert!(matches!(
        HashCache::try_load(&cache_path),
        Err(CacheError::Corrupt(_))
    ));
    assert_recovers(&dir, &cache_path);
}

#[test]
fn test_empty_cache_file() {
    let dir = tempdir().unwrap();
    let cache_path = dir.path().join("hashes.bin");
    fs::write(&cache_path, b"").unwrap();

    assert!(HashCache::load(&cache_path).is_empty());
    assert_recovers(&dir, &cache_path);
}

#[test]
fn test_truncated_cache_file() {
    let dir = tempdir().unwrap();
    let cache_path = dir.path().join("hashes.bin");
    let files = setup_duplicates(&dir);
    find_duplicates_cached(files, &cache_path, FinderConfig::default()).unwrap();

    let bytes = fs::read(&cache_path).unwrap();
    fs::write(&cache_path, &bytes[..bytes.len() / 2]).unwrap();

    assert!(HashCache::try_load(&cache_path).is_err());
    assert_recovers(&dir, &cache_path);
}

#[test]
fn test_flipped_byte_detected() {
    let dir = tempdir().unwrap();
    let cache_path = dir.path().join("hashes.bin");
    let files = setup_duplicates(&dir);
    find_duplicates_cached(files, &cache_path, FinderConfig::default()).unwrap();

    let mut bytes = fs::read(&cache_path).unwrap();
    // Inside the first stored digest, well past the header
    let idx = bytes.len() - 40;
    bytes[idx] ^= 0xff;
    fs::write(&cache_path, &bytes).unwrap();

    assert!(matches!(
        HashCache::try_load(&cache_path),
        Err(CacheError::Corrupt(_))
    ));
    assert_recovers(&dir, &cache_path);
}

#[test]
fn test_future_version_treated_as_empty() {
    let dir = tempdir().unwrap();
    let cache_path = dir.path().join("hashes.bin");

    let mut bytes = Vec::new();
    bytes.extend_from_slice(MAGIC);
    bytes.extend_from_slice(&(FORMAT_VERSION + 1).to_le_bytes());
    bytes.extend_from_slice(&0u64.to_le_bytes());
    bytes.extend_from_slice(&[0u8; 32]);
    fs::write(&cache_path, &bytes).unwrap();

    assert!(matches!(
        HashCache::try_load(&cache_path),
        Err(CacheError::UnsupportedVersion(v)) if v == FORMAT_VERSION + 1
    ));
    assert_recovers(&dir, &cache_path);
}

#[test]
fn test_unreadable_cache_location_is_empty_cache() {
    let dir = tempdir().unwrap();
    // A directory where the cache file should be
    let cache_path = dir.path().join("hashes.bin");
    fs::create_dir(&cache_path).unwrap();

    assert!(HashCache::load(&cache_path).is_empty());

    let files = setup_duplicates(&dir);
    let report = find_duplicates_cached(files, &cache_path, FinderConfig::default()).unwrap();
    assert_eq!(report.groups.len(), 1);
    assert!(matches!(report.cache_error, Some(CacheError::Io { .. })));
}
