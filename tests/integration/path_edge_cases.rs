use dupfind::duplicates::{FinderConfig, Strategy};
use dupfind::scanner::{Walker, WalkerConfig};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
fn test_unicode_and_space_names() {
    let dir = TempDir::new().unwrap();
    let a = dir.path().join("日本語 ファイル.txt");
    let b = dir.path().join("with space.txt");
    let c = dir.path().join("émoji_🎉.txt");
    for path in [&a, &b, &c] {
        fs::write(path, b"identical").unwrap();
    }

    for strategy in Strategy::ALL {
        let result = strategy
            .detector(FinderConfig::default())
            .find(&[a.clone(), b.clone(), c.clone()], 2);
        assert_eq!(result.duplicates.len(), 1);
        assert_eq!(result.duplicates[0].len(), 3);
    }
}

#[test]
fn test_walker_descends_and_skips_directories() {
    let dir = TempDir::new().unwrap();
    let deep = dir.path().join("a/b/c/d");
    fs::create_dir_all(&deep).unwrap();
    fs::write(deep.join("leaf.txt"), b"leaf").unwrap();
    fs::write(dir.path().join("top.txt"), b"leaf").unwrap();
    fs::create_dir(dir.path().join("empty_dir")).unwrap();

    let (files, errors) = Walker::new(dir.path(), WalkerConfig::default()).collect();
    assert!(errors.is_empty());
    assert_eq!(files.len(), 2);
    assert!(files.iter().all(|p| p.is_absolute() && p.is_file()));

    let result = Strategy::Progressive
        .detector(FinderConfig::default())
        .find(&files, 2);
    assert_eq!(result.duplicates.len(), 1);
}

#[test]
fn test_relative_paths_are_kept_as_given() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("x"), b"rel").unwrap();
    fs::write(dir.path().join("y"), b"rel").unwrap();

    let base = dir.path().to_path_buf();
    let files: Vec<PathBuf> = vec![base.join(".").join("x"), base.join("y")];
    let result = Strategy::Baseline
        .detector(FinderConfig::default())
        .find(&files, 1);

    assert_eq!(result.duplicates.len(), 1);
    assert!(result.duplicates[0].paths().contains(&files[0]));
}

#[cfg(unix)]
#[test]
fn test_symlinks_skipped_unless_followed() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("target.txt");
    fs::write(&target, b"linked content").unwrap();
    std::os::unix::fs::symlink(&target, dir.path().join("link.txt")).unwrap();

    let (plain, _) = Walker::new(dir.path(), WalkerConfig::default()).collect();
    assert_eq!(plain.len(), 1);

    let follow = WalkerConfig {
        follow_symlinks: true,
        ..Default::default()
    };
    let (followed, _) = Walker::new(dir.path(), follow).collect();
    assert_eq!(followed.len(), 2);

    // A link and its target have the same content, so they group.
    let result = Strategy::Progressive
        .detector(FinderConfig::default())
        .find(&followed, 2);
    assert_eq!(result.duplicates.len(), 1);
}
