//! Duplicate detection engine.
//!
//! This module provides functionality for:
//! - Concurrent candidate buckets keyed by size or signature
//! - A bounded worker pool that runs one stage at a time
//! - Three interchangeable detection strategies (baseline, size-filtered,
//!   progressive)
//! - The scan result with duplicate groups, failures and counters

pub mod finder;
pub mod groups;
pub mod pool;
pub mod result;

pub use finder::{
    normalize_workers, BaselineDetector, DupDetector, FinderConfig, ProgressiveDetector,
    SizeFilteredDetector, Strategy, DEFAULT_WORKERS,
};
pub use groups::{into_duplicate_groups, CandidateBuckets, DuplicateGroup, Finalized};
pub use pool::{Outcome, ScanCounters, StageInput, StageOutput, WorkerPool};
pub use result::{FailedFile, ScanResult};
