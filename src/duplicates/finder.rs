//! Detection strategies.
//!
//! # Overview
//!
//! Three interchangeable detectors implement [`DupDetector`]. They agree on
//! every outcome and differ only in how much they read:
//!
//! - [`BaselineDetector`]: full signature of every file, then group. Reads
//!   every byte and serves as the reference the other two must match.
//! - [`SizeFilteredDetector`]: bucket by size first (metadata only), then
//!   full signatures for files sharing a size.
//! - [`ProgressiveDetector`]: size, then a signature of the first
//!   [`PREFIX_SIZE`](crate::scanner::PREFIX_SIZE) bytes, then the rest of
//!   the file only for prefix matches. The prefix hash state is resumed
//!   rather than recomputed, so a survivor is read exactly once end to end.
//!
//! Every stage runs on a [`WorkerPool`] of the requested size. A file that
//! cannot be probed or read is recorded in [`ScanResult::failed`] and takes
//! no further part in the scan.
//!
//! # Example
//!
//! ```no_run
//! use dupfind::duplicates::{DupDetector, FinderConfig, ProgressiveDetector};
//! use std::path::PathBuf;
//!
//! let files = vec![PathBuf::from("/data/a.bin"), PathBuf::from("/data/b.bin")];
//! let detector = ProgressiveDetector::new(FinderConfig::default());
//! let result = detector.find(&files, 4);
//!
//! for group in &result.duplicates {
//!     println!("{} copies of {} bytes", group.len(), group.size);
//! }
//! ```

use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use super::groups::{into_duplicate_groups, Finalized};
use super::pool::{Outcome, ScanCounters, StageOutput, WorkerPool};
use super::result::{FailedFile, ScanResult};
use crate::progress::ProgressCallback;
use crate::scanner::{
    FileItem, FileProbe, Hash, Hasher, PartialSignature, ProbeError, PREFIX_SIZE,
};

/// Worker count used when a caller passes zero.
pub const DEFAULT_WORKERS: usize = 10;

/// Threshold for logging large files.
const LARGE_FILE_THRESHOLD: u64 = 100 * 1024 * 1024; // 100MB

/// Settings shared by every detector.
#[derive(Clone)]
pub struct FinderConfig {
    /// Bytes covered by a partial signature.
    pub prefix_size: usize,
    /// Probe used for metadata and reads.
    pub probe: FileProbe,
    /// Optional shutdown flag for graceful termination.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl fmt::Debug for FinderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FinderConfig")
            .field("prefix_size", &self.prefix_size)
            .field("probe", &self.probe)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            prefix_size: PREFIX_SIZE,
            probe: FileProbe::new(),
            shutdown_flag: None,
            progress_callback: None,
        }
    }
}

impl FinderConfig {
    /// Set the partial signature prefix length (minimum 1 byte).
    #[must_use]
    pub fn with_prefix_size(mut self, size: usize) -> Self {
        self.prefix_size = size.max(1);
        self
    }

    /// Replace the file probe.
    #[must_use]
    pub fn with_probe(mut self, probe: FileProbe) -> Self {
        self.probe = probe;
        self
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Check if shutdown has been requested.
    pub(crate) fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    fn hasher(&self) -> Hasher {
        let mut probe = self.probe.clone();
        if let Some(ref flag) = self.shutdown_flag {
            probe = probe.with_shutdown_flag(Arc::clone(flag));
        }
        Hasher::new()
            .with_prefix_size(self.prefix_size)
            .with_probe(probe)
    }
}

/// Replace a zero worker count with [`DEFAULT_WORKERS`].
#[must_use]
pub fn normalize_workers(workers: usize) -> usize {
    if workers == 0 {
        log::warn!(
            "Worker count must be positive, using default of {}",
            DEFAULT_WORKERS
        );
        DEFAULT_WORKERS
    } else {
        workers
    }
}

/// A duplicate detection algorithm.
///
/// `find` never fails as a whole: unreadable files end up in
/// [`ScanResult::failed`]. It never writes, moves or deletes files, and its
/// outcome does not depend on `workers`, only its speed does.
pub trait DupDetector: Send + Sync {
    /// Short name of the strategy.
    fn name(&self) -> &'static str;

    /// Group `files` by identical content using up to `workers` threads.
    ///
    /// A `workers` value of zero is replaced by [`DEFAULT_WORKERS`].
    fn find(&self, files: &[PathBuf], workers: usize) -> ScanResult;
}

/// Which detector to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Full signature of every file
    Baseline,
    /// Size buckets, then full signatures
    SizeFiltered,
    /// Size, prefix signature, then full signature
    #[default]
    Progressive,
}

impl Strategy {
    /// All strategies, most selective first.
    pub const ALL: [Strategy; 3] = [
        Strategy::Progressive,
        Strategy::SizeFiltered,
        Strategy::Baseline,
    ];

    /// Build the detector for this strategy.
    #[must_use]
    pub fn detector(self, config: FinderConfig) -> Box<dyn DupDetector> {
        match self {
            Self::Baseline => Box::new(BaselineDetector::new(config)),
            Self::SizeFiltered => Box::new(SizeFilteredDetector::new(config)),
            Self::Progressive => Box::new(ProgressiveDetector::new(config)),
        }
    }

    /// Short name, as used on the command line.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Baseline => "baseline",
            Self::SizeFiltered => "size-filtered",
            Self::Progressive => "progressive",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// State of one `find` invocation.
struct Scan<'a> {
    name: &'static str,
    config: &'a FinderConfig,
    hasher: Hasher,
    pool: WorkerPool,
    counters: ScanCounters,
    failed: Vec<FailedFile>,
    total_files: usize,
    started: Instant,
}

impl<'a> Scan<'a> {
    fn start(
        name: &'static str,
        config: &'a FinderConfig,
        total_files: usize,
        workers: usize,
    ) -> Self {
        let workers = normalize_workers(workers);
        log::info!(
            "{}: scanning {} files with {} workers",
            name,
            total_files,
            workers
        );

        Self {
            name,
            config,
            hasher: config.hasher(),
            pool: WorkerPool::new(workers),
            counters: ScanCounters::new(),
            failed: Vec::new(),
            total_files,
            started: Instant::now(),
        }
    }

    /// Take over a stage's failures; `None` if the stage was interrupted.
    fn absorb<K, V>(&mut self, output: StageOutput<K, V>) -> Option<Finalized<K, V>> {
        self.failed.extend(output.failed);
        if output.interrupted || self.config.is_shutdown_requested() {
            log::info!("{}: interrupted by shutdown signal", self.name);
            None
        } else {
            Some(output.finalized)
        }
    }

    /// Stage 1: probe metadata and bucket by size.
    fn size_stage(&mut self, files: &[PathBuf]) -> Option<Finalized<u64, FileItem>> {
        let probe = self.hasher.probe().clone();
        let output = self
            .pool
            .run_stage("probe", files.to_vec(), self.config, |path: PathBuf| {
                match probe.probe(&path) {
                    Ok(item) => Outcome::Keep(Hasher::size_key(&item), item),
                    Err(e) => failure(path, e),
                }
            });
        self.absorb(output)
    }

    fn finish(self, final_stage: Finalized<(u64, Hash), FileItem>) -> ScanResult {
        let groups = into_duplicate_groups(final_stage);
        let result = ScanResult::new(groups, self.failed, self.total_files, &self.counters, false);

        log::info!(
            "{} complete in {:.2?}: {} groups, {} duplicates, {} compared files, {} of {} bytes read, {} failed",
            self.name,
            self.started.elapsed(),
            result.duplicates.len(),
            result.duplicate_file_count(),
            result.total_compared_files,
            result.total_read_bytes,
            result.total_bytes_in_compared_files,
            result.failed.len()
        );
        result
    }

    fn interrupted(self) -> ScanResult {
        ScanResult::new(Vec::new(), self.failed, self.total_files, &self.counters, true)
    }

    fn empty(self) -> ScanResult {
        self.finish(Finalized {
            buckets: Vec::new(),
            pruned: 0,
        })
    }
}

/// Map a per-file error to its stage outcome.
fn failure<K, V>(path: PathBuf, error: ProbeError) -> Outcome<K, V> {
    if error.is_interrupted() {
        Outcome::Skip
    } else {
        Outcome::Fail(FailedFile::new(path, error))
    }
}

fn log_large_file(item: &FileItem) {
    if item.size > LARGE_FILE_THRESHOLD {
        log::debug!(
            "Hashing large file ({} MB): {}",
            item.size / (1024 * 1024),
            item.path.display()
        );
    }
}

/// Full signature of every file, no filtering.
#[derive(Debug, Clone, Default)]
pub struct BaselineDetector {
    config: FinderConfig,
}

impl BaselineDetector {
    /// Create a baseline detector.
    #[must_use]
    pub fn new(config: FinderConfig) -> Self {
        Self { config }
    }
}

impl DupDetector for BaselineDetector {
    fn name(&self) -> &'static str {
        Strategy::Baseline.name()
    }

    fn find(&self, files: &[PathBuf], workers: usize) -> ScanResult {
        let mut scan = Scan::start(self.name(), &self.config, files.len(), workers);
        if files.is_empty() {
            return scan.empty();
        }

        let hasher = &scan.hasher;
        let counters = &scan.counters;
        let output = scan
            .pool
            .run_stage("full", files.to_vec(), scan.config, |path: PathBuf| {
                let item = match hasher.probe().probe(&path) {
                    Ok(item) => item,
                    Err(e) => return failure(path, e),
                };
                log_large_file(&item);
                match hasher.full_signature(&item) {
                    Ok(digest) => {
                        counters.record_compared(item.size);
                        counters.record_read(digest.bytes_read);
                        if let Some(ref callback) = scan.config.progress_callback {
                            callback.on_item_completed(digest.bytes_read);
                        }
                        Outcome::Keep((item.size, digest.hash), item)
                    }
                    Err(e) => failure(path, e),
                }
            });

        match scan.absorb(output) {
            Some(finalized) => scan.finish(finalized),
            None => scan.interrupted(),
        }
    }
}

/// Size buckets first, then full signatures within them.
#[derive(Debug, Clone, Default)]
pub struct SizeFilteredDetector {
    config: FinderConfig,
}

impl SizeFilteredDetector {
    /// Create a size-filtered detector.
    #[must_use]
    pub fn new(config: FinderConfig) -> Self {
        Self { config }
    }
}

impl DupDetector for SizeFilteredDetector {
    fn name(&self) -> &'static str {
        Strategy::SizeFiltered.name()
    }

    fn find(&self, files: &[PathBuf], workers: usize) -> ScanResult {
        let mut scan = Scan::start(self.name(), &self.config, files.len(), workers);
        if files.is_empty() {
            return scan.empty();
        }

        let Some(sized) = scan.size_stage(files) else {
            return scan.interrupted();
        };
        if sized.is_empty() {
            log::info!("{}: no files share a size", scan.name);
            return scan.empty();
        }
        let candidates: Vec<FileItem> = sized.into_values().collect();

        let hasher = &scan.hasher;
        let counters = &scan.counters;
        let output = scan
            .pool
            .run_stage("full", candidates, scan.config, |item: FileItem| {
                log_large_file(&item);
                match hasher.full_signature(&item) {
                    Ok(digest) => {
                        counters.record_compared(item.size);
                        counters.record_read(digest.bytes_read);
                        if let Some(ref callback) = scan.config.progress_callback {
                            callback.on_item_completed(digest.bytes_read);
                        }
                        Outcome::Keep((item.size, digest.hash), item)
                    }
                    Err(e) => failure(item.path, e),
                }
            });

        match scan.absorb(output) {
            Some(finalized) => scan.finish(finalized),
            None => scan.interrupted(),
        }
    }
}

/// Size, then prefix signature, then full signature.
#[derive(Debug, Clone, Default)]
pub struct ProgressiveDetector {
    config: FinderConfig,
}

impl ProgressiveDetector {
    /// Create a progressive detector.
    #[must_use]
    pub fn new(config: FinderConfig) -> Self {
        Self { config }
    }
}

impl DupDetector for ProgressiveDetector {
    fn name(&self) -> &'static str {
        Strategy::Progressive.name()
    }

    fn find(&self, files: &[PathBuf], workers: usize) -> ScanResult {
        let mut scan = Scan::start(self.name(), &self.config, files.len(), workers);
        if files.is_empty() {
            return scan.empty();
        }

        let Some(sized) = scan.size_stage(files) else {
            return scan.interrupted();
        };
        if sized.is_empty() {
            log::info!("{}: no files share a size", scan.name);
            return scan.empty();
        }
        let candidates: Vec<FileItem> = sized.into_values().collect();

        let hasher = &scan.hasher;
        let counters = &scan.counters;
        let output = scan
            .pool
            .run_stage("partial", candidates, scan.config, |item: FileItem| {
                match hasher.partial_signature(&item) {
                    Ok(partial) => {
                        counters.record_compared(item.size);
                        counters.record_read(partial.bytes_read);
                        Outcome::Keep((item.size, partial.hash), (item, partial))
                    }
                    Err(e) => failure(item.path, e),
                }
            });
        let Some(prefixed) = scan.absorb(output) else {
            return scan.interrupted();
        };
        if prefixed.is_empty() {
            log::info!("{}: every prefix is unique", scan.name);
            return scan.empty();
        }
        let survivors: Vec<_> = prefixed.into_values().collect();

        let hasher = &scan.hasher;
        let counters = &scan.counters;
        let output = scan
            .pool
            .run_stage("full", survivors, scan.config, |(item, partial): (FileItem, PartialSignature)| {
                log_large_file(&item);
                match hasher.complete(&item, partial) {
                    Ok(digest) => {
                        counters.record_read(digest.bytes_read);
                        if let Some(ref callback) = scan.config.progress_callback {
                            callback.on_item_completed(digest.bytes_read);
                        }
                        Outcome::Keep((item.size, digest.hash), item)
                    }
                    Err(e) => failure(item.path, e),
                }
            });

        match scan.absorb(output) {
            Some(finalized) => scan.finish(finalized),
            None => scan.interrupted(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use std::path::Path;
    use std::sync::atomic::AtomicUsize;
    use tempfile::TempDir;

    fn create_test_file(dir: &TempDir, name: &str, content: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        let mut f = File::create(&path).unwrap();
        f.write_all(content).unwrap();
        path
    }

    fn detectors() -> Vec<Box<dyn DupDetector>> {
        Strategy::ALL
            .iter()
            .map(|s| s.detector(FinderConfig::default()))
            .collect()
    }

    #[test]
    fn test_finder_config_default() {
        let config = FinderConfig::default();
        assert_eq!(config.prefix_size, PREFIX_SIZE);
        assert!(config.shutdown_flag.is_none());
        assert!(config.progress_callback.is_none());
        assert!(!config.is_shutdown_requested());
    }

    #[test]
    fn test_finder_config_builder() {
        let shutdown = Arc::new(AtomicBool::new(false));
        let config = FinderConfig::default()
            .with_prefix_size(0)
            .with_shutdown_flag(shutdown.clone());

        assert_eq!(config.prefix_size, 1);
        assert!(!config.is_shutdown_requested());
        shutdown.store(true, Ordering::SeqCst);
        assert!(config.is_shutdown_requested());
    }

    #[test]
    fn test_normalize_workers() {
        assert_eq!(normalize_workers(0), DEFAULT_WORKERS);
        assert_eq!(normalize_workers(3), 3);
    }

    #[test]
    fn test_strategy_names_and_default() {
        assert_eq!(Strategy::default(), Strategy::Progressive);
        assert_eq!(Strategy::SizeFiltered.to_string(), "size-filtered");
        for strategy in Strategy::ALL {
            assert_eq!(strategy.detector(FinderConfig::default()).name(), strategy.name());
        }
    }

    #[test]
    fn test_empty_input_all_strategies() {
        for detector in detectors() {
            let result = detector.find(&[], 4);
            assert!(result.duplicates.is_empty());
            assert!(result.failed.is_empty());
            assert_eq!(result.total_files, 0);
            assert_eq!(result.total_compared_files, 0);
            assert_eq!(result.total_read_bytes, 0);
            assert!(!result.interrupted);
        }
    }

    #[test]
    fn test_hello_world_scenario() {
        let dir = TempDir::new().unwrap();
        let a = create_test_file(&dir, "A", b"hello");
        let b = create_test_file(&dir, "B", b"hello");
        let c = create_test_file(&dir, "C", b"world");
        let d = dir.path().join("D-missing");
        let files = vec![a.clone(), b.clone(), c, d.clone()];

        for detector in detectors() {
            let result = detector.find(&files, 2);
            assert_eq!(result.group_path_sets(), vec![vec![a.clone(), b.clone()]]);
            assert_eq!(result.failed_paths(), vec![d.as_path()]);
            assert_eq!(result.total_files, 4);
            assert!(result.total_read_bytes <= result.total_bytes_in_compared_files);
        }
    }

    #[test]
    fn test_progressive_eliminates_by_prefix() {
        let dir = TempDir::new().unwrap();
        let a = create_test_file(&dir, "A", b"hello");
        let b = create_test_file(&dir, "B", b"hello");
        let c = create_test_file(&dir, "C", b"world");

        let result = ProgressiveDetector::default().find(&[a, b, c], 2);
        assert_eq!(result.duplicates.len(), 1);
        assert_eq!(result.total_compared_files, 3);
        assert_eq!(result.total_bytes_in_compared_files, 15);
        // The 4KB prefix covers each file, so nothing is read twice.
        assert_eq!(result.total_read_bytes, 15);
    }

    #[test]
    fn test_progressive_reads_only_prefix_of_distinct_large_files() {
        let dir = TempDir::new().unwrap();
        let mut x = vec![b'x'; 64 * 1024];
        let mut y = x.clone();
        x[0] = b'1';
        y[0] = b'2';
        let a = create_test_file(&dir, "x.bin", &x);
        let b = create_test_file(&dir, "y.bin", &y);

        let progressive = ProgressiveDetector::default().find(&[a.clone(), b.clone()], 2);
        assert!(progressive.duplicates.is_empty());
        assert_eq!(progressive.total_read_bytes, 2 * PREFIX_SIZE as u64);
        assert_eq!(progressive.total_bytes_in_compared_files, 2 * 64 * 1024);

        let baseline = BaselineDetector::default().find(&[a, b], 2);
        assert_eq!(baseline.total_read_bytes, 2 * 64 * 1024);
    }

    #[test]
    fn test_progressive_prefix_collision_split_by_full_signature() {
        let dir = TempDir::new().unwrap();
        let mut x = vec![b'z'; 10_000];
        let mut y = x.clone();
        x[9_999] = b'1';
        y[9_999] = b'2';
        let a = create_test_file(&dir, "a.bin", &x);
        let b = create_test_file(&dir, "b.bin", &y);
        let c = create_test_file(&dir, "c.bin", &x);

        let result = ProgressiveDetector::default().find(&[a.clone(), b, c.clone()], 3);
        assert_eq!(result.group_path_sets(), vec![vec![a, c]]);
        assert_eq!(result.total_read_bytes, 30_000);
        assert_eq!(result.total_read_bytes, result.total_bytes_in_compared_files);
    }

    #[test]
    fn test_different_sizes_scenario() {
        let dir = TempDir::new().unwrap();
        let a = create_test_file(&dir, "ten", &[1u8; 10]);
        let b = create_test_file(&dir, "twenty", &[1u8; 20]);
        let files = vec![a, b];

        for detector in [
            Strategy::SizeFiltered.detector(FinderConfig::default()),
            Strategy::Progressive.detector(FinderConfig::default()),
        ] {
            let result = detector.find(&files, 2);
            assert!(result.duplicates.is_empty());
            assert_eq!(result.total_compared_files, 0);
            assert_eq!(result.total_read_bytes, 0);
        }

        let baseline = BaselineDetector::default().find(&files, 2);
        assert!(baseline.duplicates.is_empty());
        assert_eq!(baseline.total_compared_files, 2);
        assert_eq!(baseline.total_read_bytes, 30);
    }

    #[test]
    fn test_duplicate_path_entries_group_together() {
        let dir = TempDir::new().unwrap();
        let a = create_test_file(&dir, "same.txt", b"only one file");

        for detector in detectors() {
            let result = detector.find(&[a.clone(), a.clone()], 2);
            assert_eq!(result.duplicates.len(), 1);
            assert_eq!(result.duplicates[0].len(), 2);
        }
    }

    #[test]
    fn test_empty_files_group_together() {
        let dir = TempDir::new().unwrap();
        let a = create_test_file(&dir, "e1", b"");
        let b = create_test_file(&dir, "e2", b"");

        for detector in detectors() {
            let result = detector.find(&[a.clone(), b.clone()], 1);
            assert_eq!(result.duplicates.len(), 1);
            assert_eq!(result.duplicates[0].size, 0);
            assert_eq!(result.total_read_bytes, 0);
        }
    }

    #[test]
    fn test_zero_workers_normalized() {
        let dir = TempDir::new().unwrap();
        let a = create_test_file(&dir, "a", b"dup");
        let b = create_test_file(&dir, "b", b"dup");

        for detector in detectors() {
            assert_eq!(detector.find(&[a.clone(), b.clone()], 0).duplicates.len(), 1);
        }
    }

    #[test]
    fn test_directory_in_input_is_failure() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("sub");
        std::fs::create_dir(&sub).unwrap();

        for detector in detectors() {
            let result = detector.find(&[sub.clone()], 1);
            assert_eq!(result.failed_paths(), vec![Path::new(&sub)]);
        }
    }

    #[test]
    fn test_shutdown_flag_interrupts() {
        let dir = TempDir::new().unwrap();
        let a = create_test_file(&dir, "a", b"content");
        let b = create_test_file(&dir, "b", b"content");

        let shutdown = Arc::new(AtomicBool::new(true));
        for strategy in Strategy::ALL {
            let config = FinderConfig::default().with_shutdown_flag(shutdown.clone());
            let result = strategy.detector(config).find(&[a.clone(), b.clone()], 2);
            assert!(result.interrupted);
            assert!(result.duplicates.is_empty());
            assert!(result.failed.is_empty());
        }
    }

    struct MockProgress {
        starts: AtomicUsize,
        ends: AtomicUsize,
        items: AtomicUsize,
    }

    impl MockProgress {
        fn new() -> Self {
            Self {
                starts: AtomicUsize::new(0),
                ends: AtomicUsize::new(0),
                items: AtomicUsize::new(0),
            }
        }
    }

    impl ProgressCallback for MockProgress {
        fn on_phase_start(&self, _phase: &str, _total: usize) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_progress(&self, _current: usize, _path: &str) {
            self.items.fetch_add(1, Ordering::SeqCst);
        }

        fn on_phase_end(&self, _phase: &str) {
            self.ends.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_progress_callback_sees_every_stage() {
        let dir = TempDir::new().unwrap();
        let a = create_test_file(&dir, "a", b"same");
        let b = create_test_file(&dir, "b", b"same");

        let progress = Arc::new(MockProgress::new());
        let config = FinderConfig::default().with_progress_callback(progress.clone());
        let result = ProgressiveDetector::new(config).find(&[a, b], 2);

        assert_eq!(result.duplicates.len(), 1);
        assert_eq!(progress.starts.load(Ordering::SeqCst), 3);
        assert_eq!(progress.ends.load(Ordering::SeqCst), 3);
        assert_eq!(progress.items.load(Ordering::SeqCst), 6);
    }
}
