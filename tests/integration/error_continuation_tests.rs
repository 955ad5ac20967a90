use dupescan::duplicates::{find_duplicates_cached, DuplicateFinder, FinderConfig};
use dupescan::scanner::{HashError, ScanError, Walker};
use std::fs;
use tempfile::tempdir;

#[test]
fn test_vanished_file_is_reported_and_rest_grouped() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a.txt");
    let b = dir.path().join("b.txt");
    let c = dir.path().join("c.txt");
    fs::write(&a, b"Identical content").unwrap();
    fs::write(&b, b"Identical content").unwrap();
    fs::write(&c, b"Identical content").unwrap();

    let files = Walker::new(vec![dir.path().to_path_buf()]).walk().files;
    // Deleted between enumeration and hashing
    fs::remove_file(&c).unwrap();

    let (groups, summary) = DuplicateFinder::with_defaults().find_duplicates(files).unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].len(), 2);
    assert_eq!(summary.failures.len(), 1);
    assert!(summary.failures[0].path.ends_with("c.txt"));
    assert!(matches!(summary.failures[0].error, HashError::NotFound(_)));
}

#[test]
fn test_failures_sorted_and_not_grouped() {
    let dir = tempdir().unwrap();
    let real = dir.path().join("real.txt");
    fs::write(&real, b"x").unwrap();
    let missing_b = dir.path().join("b-missing");
    let missing_a = dir.path().join("a-missing");

    let (groups, summary) = DuplicateFinder::with_defaults()
        .find_duplicates(vec![missing_b.clone(), real, missing_a.clone()])
        .unwrap();

    assert!(groups.is_empty());
    let failed: Vec<_> = summary.failures.iter().map(|f| f.path.clone()).collect();
    assert_eq!(failed, vec![missing_a, missing_b]);
    assert_eq!(summary.hashed_files, 1);
}

#[test]
fn test_missing_root_is_recorded_other_roots_scanned() {
    let dir = tempdir().unwrap();
    let good = dir.path().join("good");
    fs::create_dir(&good).unwrap();
    fs::write(good.join("1"), b"dup").unwrap();
    fs::write(good.join("2"), b"dup").unwrap();

    let walk = Walker::new(vec![dir.path().join("nope"), good]).walk();
    assert_eq!(walk.errors.len(), 1);
    assert!(matches!(walk.errors[0], ScanError::NotFound(_)));
    assert_eq!(walk.files.len(), 2);

    let report = find_duplicates_cached(
        walk.files,
        &dir.path().join("hashes.bin"),
        FinderConfig::default(),
    )
    .unwrap();
    assert_eq!(report.groups.len(), 1);
}

#[cfg(unix)]
#[test]
fn test_unreadable_file_is_failure() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    let a = dir.path().join("a");
    let b = dir.path().join("b");
    let locked = dir.path().join("locked");
    fs::write(&a, b"same").unwrap();
    fs::write(&b, b"same").unwrap();
    fs::write(&locked, b"same").unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    // Root can read anything; nothing to verify in that case
    if fs::read(&locked).is_ok() {
        return;
    }

    let (groups, summary) = DuplicateFinder::with_defaults()
        .find_duplicates(vec![a, b, locked.clone()])
        .unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].len(), 2);
    assert_eq!(summary.failures.len(), 1);
    assert_eq!(summary.failures[0].path, fs::canonicalize(&locked).unwrap());
    assert!(matches!(
        summary.failures[0].error,
        HashError::PermissionDenied(_)
    ));

    fs::set_permissions(&locked, fs::Permissions::from_mode(0o644)).unwrap();
}

#[test]
fn test_failed_file_not_cached() {
    let dir = tempdir().unwrap();
    let cache_path = dir.path().join("hashes.bin");
    let real = dir.path().join("real");
    fs::write(&real, b"content").unwrap();

    find_duplicates_cached(
        vec![real.clone(), dir.path().join("ghost")],
        &cache_path,
        FinderConfig::default(),
    )
    .unwrap();

    let cache = dupescan::cache::HashCache::try_load(&cache_path).unwrap();
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.entries()[0].path, fs::canonicalize(&real).unwrap());
}
