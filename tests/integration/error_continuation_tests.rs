use dupfind::duplicates::{DupDetector, FinderConfig, ProgressiveDetector, Strategy};
use dupfind::scanner::{FileProbe, ProbeError};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn write(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_missing_files_are_reported_not_fatal() {
    let dir = TempDir::new().unwrap();
    let a = write(dir.path(), "a", b"same");
    let b = write(dir.path(), "b", b"same");
    let gone1 = dir.path().join("gone1");
    let gone2 = dir.path().join("gone2");

    for strategy in Strategy::ALL {
        let result = strategy
            .detector(FinderConfig::default())
            .find(&[gone2.clone(), a.clone(), gone1.clone(), b.clone()], 3);

        assert_eq!(result.group_path_sets(), vec![vec![a.clone(), b.clone()]]);
        assert_eq!(result.failed_paths(), vec![gone1.as_path(), gone2.as_path()]);
        for failure in &result.failed {
            assert!(matches!(failure.error, ProbeError::NotFound(_)));
        }
    }
}

#[test]
fn test_all_inputs_missing() {
    let dir = TempDir::new().unwrap();
    let files: Vec<PathBuf> = (0..5).map(|i| dir.path().join(format!("m{}", i))).collect();

    for strategy in Strategy::ALL {
        let result = strategy.detector(FinderConfig::default()).find(&files, 2);
        assert!(result.duplicates.is_empty());
        assert_eq!(result.failed.len(), 5);
        assert_eq!(result.total_files, 5);
        assert_eq!(result.total_compared_files, 0);
        assert_eq!(result.total_read_bytes, 0);
    }
}

#[test]
fn test_failed_file_never_in_group() {
    let dir = TempDir::new().unwrap();
    let a = write(dir.path(), "a", b"x");
    let b = write(dir.path(), "b", b"x");
    let sub = dir.path().join("subdir");
    fs::create_dir(&sub).unwrap();

    for strategy in Strategy::ALL {
        let result = strategy
            .detector(FinderConfig::default())
            .find(&[a.clone(), sub.clone(), b.clone()], 2);

        let failed = result.failed_paths();
        assert_eq!(failed, vec![sub.as_path()]);
        for group in &result.duplicates {
            assert!(!group.paths().contains(&sub));
        }
        assert!(matches!(result.failed[0].error, ProbeError::NotAFile(_)));
    }
}

/// Refuses to open any file named `D`, whatever the caller's privileges.
fn deny_d(path: &Path) -> io::Result<File> {
    if path.file_name().is_some_and(|name| name == "D") {
        return Err(io::Error::from(io::ErrorKind::PermissionDenied));
    }
    File::open(path)
}

#[test]
fn test_unopenable_file_with_unique_size_is_reported_by_every_strategy() {
    let dir = TempDir::new().unwrap();
    let a = write(dir.path(), "A", b"hello");
    let b = write(dir.path(), "B", b"hello");
    let c = write(dir.path(), "C", b"world");
    let d = write(dir.path(), "D", b"unique!");
    let files = vec![a.clone(), b.clone(), c, d.clone()];

    for strategy in Strategy::ALL {
        let config = FinderConfig::default().with_probe(FileProbe::new().with_opener(deny_d));
        let result = strategy.detector(config).find(&files, 2);

        assert_eq!(
            result.group_path_sets(),
            vec![vec![a.clone(), b.clone()]],
            "{}",
            strategy.name()
        );
        assert_eq!(result.failed_paths(), vec![d.as_path()], "{}", strategy.name());
        assert!(matches!(
            result.failed[0].error,
            ProbeError::PermissionDenied(_)
        ));
        assert_eq!(result.total_files, 4);
        assert_eq!(result.total_compared_files, 3);
        assert_eq!(result.total_bytes_in_compared_files, 15);
    }
}

#[cfg(unix)]
mod unix_permissions {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    /// Make `path` unreadable; `false` if the process can read it anyway (root).
    fn make_unreadable(path: &Path) -> bool {
        fs::set_permissions(path, fs::Permissions::from_mode(0o000)).unwrap();
        fs::File::open(path).is_err()
    }

    fn restore(path: &Path) {
        let _ = fs::set_permissions(path, fs::Permissions::from_mode(0o644));
    }

    #[test]
    fn test_unreadable_file_isolated_from_group() {
        let dir = TempDir::new().unwrap();
        let a = write(dir.path(), "a", b"shared content");
        let b = write(dir.path(), "b", b"shared content");
        let locked = write(dir.path(), "locked", b"shared content");

        if !make_unreadable(&locked) {
            restore(&locked);
            eprintln!("skipping: running with permission to read mode 000 files");
            return;
        }

        for strategy in Strategy::ALL {
            let result = strategy
                .detector(FinderConfig::default())
                .find(&[a.clone(), b.clone(), locked.clone()], 2);

            assert_eq!(result.group_path_sets(), vec![vec![a.clone(), b.clone()]]);
            assert_eq!(result.failed_paths(), vec![locked.as_path()]);
            assert!(matches!(
                result.failed[0].error,
                ProbeError::PermissionDenied(_)
            ));
            assert!(result.total_read_bytes <= result.total_bytes_in_compared_files);
        }

        restore(&locked);
    }

    #[test]
    fn test_unreadable_file_with_unique_size_fails_for_every_strategy() {
        let dir = TempDir::new().unwrap();
        let a = write(dir.path(), "a", b"hello");
        let b = write(dir.path(), "b", b"hello");
        let c = write(dir.path(), "c", b"world");
        let d = write(dir.path(), "d", b"seven!!");

        if !make_unreadable(&d) {
            restore(&d);
            eprintln!("skipping: running with permission to read mode 000 files");
            return;
        }

        for strategy in Strategy::ALL {
            let result = strategy
                .detector(FinderConfig::default())
                .find(&[a.clone(), b.clone(), c.clone(), d.clone()], 2);

            assert_eq!(result.group_path_sets(), vec![vec![a.clone(), b.clone()]]);
            assert_eq!(result.failed_paths(), vec![d.as_path()]);
        }

        restore(&d);
    }

    #[test]
    fn test_unreadable_pair_leaves_no_group() {
        let dir = TempDir::new().unwrap();
        let a = write(dir.path(), "a", b"pair");
        let b = write(dir.path(), "b", b"pair");

        if !make_unreadable(&b) {
            restore(&b);
            return;
        }

        let result = ProgressiveDetector::default().find(&[a, b.clone()], 2);
        assert!(result.duplicates.is_empty());
        assert_eq!(result.failed_paths(), vec![b.as_path()]);
        assert_eq!(result.total_compared_files, 0);

        restore(&b);
    }
}
