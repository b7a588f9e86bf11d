//! Bounded worker pool and per-stage aggregation.
//!
//! # Overview
//!
//! A stage is one pass over a candidate list: every input is handed to a
//! per-file operation that either keeps it under a key, records it as
//! failed, or skips it. [`WorkerPool::run_stage`] runs that operation on a
//! rayon pool sized to the caller's worker count, funnels kept pairs into a
//! [`CandidateBuckets`] and failures into a shared list, and returns the
//! finalized buckets once every input has been processed.
//!
//! Stages never overlap: the next stage only starts from the finalized
//! output of the previous one. Within a stage the processing order is
//! irrelevant to the outcome.
//!
//! Counters live in [`ScanCounters`], which workers update with relaxed
//! atomic adds; they only ever grow.

use std::hash::Hash as StdHash;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use rayon::prelude::*;

use super::groups::{CandidateBuckets, Finalized};
use super::result::FailedFile;
use super::FinderConfig;
use crate::scanner::FileItem;

/// Result of processing one input in a stage.
#[derive(Debug)]
pub enum Outcome<K, V> {
    /// The input stays a candidate under `K`.
    Keep(K, V),
    /// The input could not be processed; it leaves the scan for good.
    Fail(FailedFile),
    /// The input was not processed (cancellation).
    Skip,
}

/// Anything a stage can report progress for.
pub trait StageInput: Send {
    /// Path of the file this input refers to.
    fn path(&self) -> &Path;
}

impl StageInput for PathBuf {
    fn path(&self) -> &Path {
        self
    }
}

impl StageInput for FileItem {
    fn path(&self) -> &Path {
        &self.path
    }
}

impl<T: Send> StageInput for (FileItem, T) {
    fn path(&self) -> &Path {
        &self.0.path
    }
}

/// Monotonic scan counters shared by all workers of a scan.
#[derive(Debug, Default)]
pub struct ScanCounters {
    compared_files: AtomicUsize,
    compared_bytes: AtomicU64,
    read_bytes: AtomicU64,
}

impl ScanCounters {
    /// Create zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that a file of `size` bytes entered content comparison.
    pub fn record_compared(&self, size: u64) {
        self.compared_files.fetch_add(1, Ordering::Relaxed);
        self.compared_bytes.fetch_add(size, Ordering::Relaxed);
    }

    /// Record bytes consumed by a successful read.
    pub fn record_read(&self, bytes: u64) {
        self.read_bytes.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Files that entered content comparison.
    #[must_use]
    pub fn compared_files(&self) -> usize {
        self.compared_files.load(Ordering::Relaxed)
    }

    /// Sum of sizes of files that entered content comparison.
    #[must_use]
    pub fn compared_bytes(&self) -> u64 {
        self.compared_bytes.load(Ordering::Relaxed)
    }

    /// Bytes actually read from disk.
    #[must_use]
    pub fn read_bytes(&self) -> u64 {
        self.read_bytes.load(Ordering::Relaxed)
    }
}

/// Output of one stage.
#[derive(Debug)]
pub struct StageOutput<K, V> {
    /// Buckets with two or more members
    pub finalized: Finalized<K, V>,
    /// Inputs that failed during this stage
    pub failed: Vec<FailedFile>,
    /// Whether cancellation cut the stage short
    pub interrupted: bool,
}

/// A pool of `workers` threads running stage operations.
#[derive(Debug)]
pub struct WorkerPool {
    pool: Option<rayon::ThreadPool>,
    workers: usize,
}

impl WorkerPool {
    /// Build a pool with exactly `workers` threads (minimum 1).
    ///
    /// If the thread pool cannot be built, stages run on rayon's global
    /// pool instead.
    #[must_use]
    pub fn new(workers: usize) -> Self {
        let workers = workers.max(1);
        let pool = match rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("dupfind-worker-{}", i))
            .build()
        {
            Ok(pool) => Some(pool),
            Err(e) => {
                log::warn!(
                    "Failed to create worker pool ({}), using global pool with {} threads",
                    e,
                    rayon::current_num_threads()
                );
                None
            }
        };

        Self { pool, workers }
    }

    /// Number of workers requested for this pool.
    #[must_use]
    pub fn workers(&self) -> usize {
        self.workers
    }

    fn install<R: Send>(&self, op: impl FnOnce() -> R + Send) -> R {
        match &self.pool {
            Some(pool) => pool.install(op),
            None => op(),
        }
    }

    /// Run `op` over every input in parallel and bucket the results.
    ///
    /// `stage` names the stage for progress reporting and logs. Each input
    /// is handed to `op` exactly once unless cancellation is requested
    /// first, in which case the remaining inputs are skipped.
    pub fn run_stage<T, K, V, F>(
        &self,
        stage: &str,
        inputs: Vec<T>,
        config: &FinderConfig,
        op: F,
    ) -> StageOutput<K, V>
    where
        T: StageInput,
        K: Eq + StdHash + Send + Sync,
        V: StageInput + Sync,
        F: Fn(T) -> Outcome<K, V> + Sync + Send,
    {
        let total = inputs.len();
        let buckets: CandidateBuckets<K, V> = CandidateBuckets::new();
        let failed: Mutex<Vec<FailedFile>> = Mutex::new(Vec::new());
        let interrupted = AtomicBool::new(false);
        let processed = AtomicUsize::new(0);

        if let Some(ref callback) = config.progress_callback {
            callback.on_phase_start(stage, total);
        }
        log::debug!(
            "Stage {}: processing {} files with {} workers",
            stage,
            total,
            self.workers
        );

        self.install(|| {
            inputs.into_par_iter().for_each(|input| {
                if config.is_shutdown_requested() {
                    interrupted.store(true, Ordering::Relaxed);
                    return;
                }

                if let Some(ref callback) = config.progress_callback {
                    let current = processed.fetch_add(1, Ordering::Relaxed) + 1;
                    callback.on_progress(current, input.path().to_string_lossy().as_ref());
                }

                match op(input) {
                    Outcome::Keep(key, value) => buckets.insert(key, value),
                    Outcome::Fail(failure) => {
                        log::warn!("Failed to process {}: {}", failure.path.display(), failure.error);
                        failed
                            .lock()
                            .unwrap_or_else(PoisonError::into_inner)
                            .push(failure);
                    }
                    Outcome::Skip => {
                        interrupted.store(true, Ordering::Relaxed);
                    }
                }
            });
        });

        let finalized = buckets.finalize_with(|value| {
            log::trace!("Stage {}: no match for {}", stage, value.path().display());
        });
        let failed = failed.into_inner().unwrap_or_else(PoisonError::into_inner);

        if let Some(ref callback) = config.progress_callback {
            callback.on_phase_end(stage);
        }
        log::debug!(
            "Stage {} complete: {} files → {} candidates in {} buckets ({} unique, {} failed)",
            stage,
            total,
            finalized.survivors(),
            finalized.buckets.len(),
            finalized.pruned,
            failed.len()
        );

        StageOutput {
            finalized,
            failed,
            interrupted: interrupted.into_inner(),
        }
    }
}
