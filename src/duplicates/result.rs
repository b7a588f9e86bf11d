//! Scan results handed back to the caller.

use std::path::{Path, PathBuf};

use serde::Serialize;

use super::groups::DuplicateGroup;
use super::pool::ScanCounters;
use crate::scanner::ProbeError;

/// A file that could not be probed or read.
#[derive(Debug, Clone, Serialize)]
pub struct FailedFile {
    /// Path as supplied by the caller
    pub path: PathBuf,
    /// Why processing failed
    pub error: ProbeError,
}

impl FailedFile {
    /// Create a new failure record.
    #[must_use]
    pub fn new(path: PathBuf, error: ProbeError) -> Self {
        Self { path, error }
    }
}

/// Output of a detection run.
///
/// Groups and failures are sorted (see [`ScanResult::new`]) so repeated
/// runs over unchanged files compare equal.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanResult {
    /// Confirmed duplicate groups, each with two or more files
    pub duplicates: Vec<DuplicateGroup>,
    /// Files that failed; none of them appears in a group
    pub failed: Vec<FailedFile>,
    /// Number of input path entries
    pub total_files: usize,
    /// Files whose content was read by at least one content stage
    pub total_compared_files: usize,
    /// Sum of the sizes of compared files
    pub total_bytes_in_compared_files: u64,
    /// Bytes actually read from disk
    pub total_read_bytes: u64,
    /// Whether cancellation cut the scan short; groups are then incomplete
    pub interrupted: bool,
}

impl ScanResult {
    /// Assemble a result from the final groups, failures and counters.
    ///
    /// Failures are sorted by path; groups are expected to be sorted
    /// already.
    #[must_use]
    pub fn new(
        duplicates: Vec<DuplicateGroup>,
        mut failed: Vec<FailedFile>,
        total_files: usize,
        counters: &ScanCounters,
        interrupted: bool,
    ) -> Self {
        failed.sort_by(|a, b| a.path.cmp(&b.path));
        Self {
            duplicates,
            failed,
            total_files,
            total_compared_files: counters.compared_files(),
            total_bytes_in_compared_files: counters.compared_bytes(),
            total_read_bytes: counters.read_bytes(),
            interrupted,
        }
    }

    /// Paths of the failed files.
    #[must_use]
    pub fn failed_paths(&self) -> Vec<&Path> {
        self.failed.iter().map(|f| f.path.as_path()).collect()
    }

    /// Whether any duplicate group was found.
    #[must_use]
    pub fn has_duplicates(&self) -> bool {
        !self.duplicates.is_empty()
    }

    /// Number of redundant copies across all groups.
    #[must_use]
    pub fn duplicate_file_count(&self) -> usize {
        self.duplicates.iter().map(DuplicateGroup::duplicate_count).sum()
    }

    /// Bytes freed by keeping one copy per group.
    #[must_use]
    pub fn reclaimable_space(&self) -> u64 {
        self.duplicates.iter().map(DuplicateGroup::wasted_space).sum()
    }

    /// Groups as sorted path sets, for comparing outcomes of different runs.
    #[must_use]
    pub fn group_path_sets(&self) -> Vec<Vec<PathBuf>> {
        let mut sets: Vec<Vec<PathBuf>> = self
            .duplicates
            .iter()
            .map(|g| {
                let mut paths = g.paths();
                paths.sort();
                paths
            })
            .collect();
        sets.sort();
        sets
    }
}
