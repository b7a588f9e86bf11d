use dupfind::duplicates::{
    BaselineDetector, DupDetector, FinderConfig, ProgressiveDetector, ScanResult,
    SizeFilteredDetector, Strategy,
};
use dupfind::scanner::{Walker, WalkerConfig, PREFIX_SIZE};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn write(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
}

/// A tree mixing every elimination case: unique sizes, shared sizes with
/// different prefixes, shared prefixes with different tails, exact copies
/// and empty files.
fn mixed_tree() -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();

    write(root, "unique_size.txt", b"no other file is this long!");
    write(root, "copies/one.txt", b"hello");
    write(root, "copies/two.txt", b"hello");
    write(root, "copies/nested/three.txt", b"hello");
    write(root, "same_size.txt", b"world");

    let big = vec![7u8; 3 * PREFIX_SIZE + 11];
    let mut big_tail = big.clone();
    *big_tail.last_mut().unwrap() = 8;
    let mut big_head = big.clone();
    big_head[0] = 9;
    write(root, "big/a.bin", &big);
    write(root, "big/b.bin", &big);
    write(root, "big/tail_differs.bin", &big_tail);
    write(root, "big/head_differs.bin", &big_head);

    write(root, "empty/1", b"");
    write(root, "empty/2", b"");

    dir
}

fn files_of(dir: &TempDir) -> Vec<PathBuf> {
    let (files, errors) = Walker::new(dir.path(), WalkerConfig::default()).collect();
    assert!(errors.is_empty());
    files
}

fn run_all(files: &[PathBuf], workers: usize) -> Vec<(Strategy, ScanResult)> {
    Strategy::ALL
        .iter()
        .map(|&s| (s, s.detector(FinderConfig::default()).find(files, workers)))
        .collect()
}

#[test]
fn test_all_strategies_find_same_groups() {
    let dir = mixed_tree();
    let files = files_of(&dir);
    let runs = run_all(&files, 4);

    let expected = runs[2].1.group_path_sets();
    assert_eq!(expected.len(), 3, "copies, big copies and empty files");
    for (strategy, result) in &runs {
        assert_eq!(&result.group_path_sets(), &expected, "{} disagrees", strategy);
        assert!(result.failed.is_empty());
        assert_eq!(result.total_files, files.len());
    }
}

#[test]
fn test_groups_are_sorted_and_disjoint() {
    let dir = mixed_tree();
    let files = files_of(&dir);

    for (_, result) in run_all(&files, 3) {
        let sizes: Vec<u64> = result.duplicates.iter().map(|g| g.size).collect();
        let mut sorted = sizes.clone();
        sorted.sort_by(|a, b| b.cmp(a));
        assert_eq!(sizes, sorted);

        let mut seen = std::collections::HashSet::new();
        for group in &result.duplicates {
            assert!(group.len() >= 2);
            for item in &group.items {
                assert_eq!(item.size, group.size);
                assert!(seen.insert(item.path.clone()), "path in two groups");
            }
        }
    }
}

#[test]
fn test_group_members_have_identical_bytes() {
    let dir = mixed_tree();
    let files = files_of(&dir);
    let result = ProgressiveDetector::default().find(&files, 2);

    for group in &result.duplicates {
        let first = fs::read(&group.items[0].path).unwrap();
        for item in &group.items[1..] {
            assert_eq!(fs::read(&item.path).unwrap(), first);
        }
    }
}

#[test]
fn test_counters_relationships() {
    let dir = mixed_tree();
    let files = files_of(&dir);
    let runs = run_all(&files, 4);

    for (strategy, result) in &runs {
        assert!(
            result.total_read_bytes <= result.total_bytes_in_compared_files,
            "{}",
            strategy
        );
        assert!(result.total_compared_files <= result.total_files);
    }

    let baseline = &runs[2].1;
    let size_filtered = &runs[1].1;
    let progressive = &runs[0].1;

    assert_eq!(baseline.total_compared_files, files.len());
    assert_eq!(baseline.total_read_bytes, baseline.total_bytes_in_compared_files);
    assert_eq!(
        size_filtered.total_read_bytes,
        size_filtered.total_bytes_in_compared_files
    );
    // unique_size.txt never reaches a content stage.
    assert_eq!(size_filtered.total_compared_files, files.len() - 1);
    assert_eq!(progressive.total_compared_files, files.len() - 1);

    assert!(progressive.total_read_bytes < size_filtered.total_read_bytes);
    assert!(size_filtered.total_read_bytes < baseline.total_read_bytes);
}

#[test]
fn test_progressive_reads_each_survivor_once() {
    let dir = mixed_tree();
    let files = files_of(&dir);
    let result = ProgressiveDetector::default().find(&files, 4);

    // Every same-size file reads its prefix; only head_differs.bin stops there.
    let big = (3 * PREFIX_SIZE + 11) as u64;
    let expected = 4 * 5 + 3 * big + PREFIX_SIZE as u64;
    assert_eq!(result.total_read_bytes, expected);
}

#[test]
fn test_result_independent_of_worker_count() {
    let dir = mixed_tree();
    let files = files_of(&dir);

    for strategy in Strategy::ALL {
        let detector = strategy.detector(FinderConfig::default());
        let one = detector.find(&files, 1);
        for workers in [2, 7, 32] {
            let other = detector.find(&files, workers);
            assert_eq!(one.group_path_sets(), other.group_path_sets());
            assert_eq!(one.total_read_bytes, other.total_read_bytes);
            assert_eq!(one.total_compared_files, other.total_compared_files);
        }
    }
}

#[test]
fn test_repeated_runs_are_identical() {
    let dir = mixed_tree();
    let files = files_of(&dir);
    let detector = SizeFilteredDetector::default();

    let first = detector.find(&files, 4);
    let second = detector.find(&files, 4);
    let first_paths: Vec<_> = first.duplicates.iter().map(|g| g.paths()).collect();
    let second_paths: Vec<_> = second.duplicates.iter().map(|g| g.paths()).collect();
    assert_eq!(first_paths, second_paths);
}

#[test]
fn test_hello_world_counters() {
    let dir = TempDir::new().unwrap();
    let a = write(dir.path(), "A", b"hello");
    let b = write(dir.path(), "B", b"hello");
    let c = write(dir.path(), "C", b"world");
    let d = dir.path().join("D");
    let files = vec![a.clone(), b.clone(), c, d.clone()];

    let detectors: Vec<Box<dyn DupDetector>> = vec![
        Box::new(BaselineDetector::default()),
        Box::new(SizeFilteredDetector::default()),
        Box::new(ProgressiveDetector::default()),
    ];
    for detector in detectors {
        let result = detector.find(&files, 2);
        assert_eq!(result.group_path_sets(), vec![vec![a.clone(), b.clone()]]);
        assert_eq!(result.failed_paths(), vec![d.as_path()]);
        assert_eq!(result.total_files, 4);
        assert_eq!(result.total_compared_files, 3);
        assert_eq!(result.total_bytes_in_compared_files, 15);
        assert_eq!(result.total_read_bytes, 15);
    }
}

#[test]
fn test_find_never_modifies_files() {
    let dir = mixed_tree();
    let files = files_of(&dir);
    let before: Vec<(PathBuf, Vec<u8>)> = files
        .iter()
        .map(|p| (p.clone(), fs::read(p).unwrap()))
        .collect();

    run_all(&files, 4);

    for (path, content) in before {
        assert_eq!(fs::read(&path).unwrap(), content);
    }
}
