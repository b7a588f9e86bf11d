//! Candidate buckets and confirmed duplicate groups.
//!
//! # Overview
//!
//! Every stage of detection sorts files into buckets keyed by what is known
//! about them so far: size, then (size, partial signature), then
//! (size, full signature). [`CandidateBuckets`] is the concurrent map the
//! workers of a stage insert into. When the stage ends,
//! [`CandidateBuckets::finalize`] drops the buckets holding a single file,
//! since such a file cannot have a content twin, and hands the rest on.
//!
//! The buckets that survive the last stage become [`DuplicateGroup`]s.
//!
//! # Example
//!
//! ```
//! use dupfind::duplicates::CandidateBuckets;
//!
//! let buckets: CandidateBuckets<u64, &str> = CandidateBuckets::new();
//! buckets.insert(100, "/a.txt");
//! buckets.insert(100, "/b.txt");
//! buckets.insert(200, "/c.txt");
//!
//! let finalized = buckets.finalize();
//! assert_eq!(finalized.buckets.len(), 1);
//! assert_eq!(finalized.pruned, 1);
//! ```

use std::hash::Hash as StdHash;
use std::path::PathBuf;

use dashmap::DashMap;
use serde::Serialize;

use crate::scanner::{hash_to_hex, FileItem, Hash};

/// Concurrent mapping from a stage key to the values sharing it.
///
/// Any number of workers may call [`insert`](Self::insert) at once,
/// including for the same key. Insertion order within a bucket is not
/// meaningful.
#[derive(Debug)]
pub struct CandidateBuckets<K, V = FileItem>
where
    K: Eq + StdHash,
{
    map: DashMap<K, Vec<V>>,
}

impl<K, V> Default for CandidateBuckets<K, V>
where
    K: Eq + StdHash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> CandidateBuckets<K, V>
where
    K: Eq + StdHash,
{
    /// Create an empty bucket map.
    #[must_use]
    pub fn new() -> Self {
        Self {
            map: DashMap::new(),
        }
    }

    /// Append `value` to the bucket for `key`.
    pub fn insert(&self, key: K, value: V) {
        self.map.entry(key).or_default().push(value);
    }

    #[cfg(test)]
    fn key_count(&self) -> usize {
        self.map.len()
    }

    #[cfg(test)]
    fn value_count(&self) -> usize {
        self.map.iter().map(|entry| entry.value().len()).sum()
    }

    /// Close the stage: keep only buckets with two or more values.
    #[must_use]
    pub fn finalize(self) -> Finalized<K, V> {
        self.finalize_with(|_| {})
    }

    /// Like [`finalize`](Self::finalize), calling `on_pruned` for every
    /// value dropped with its singleton bucket.
    pub fn finalize_with(self, mut on_pruned: impl FnMut(&V)) -> Finalized<K, V> {
        let mut pruned = 0;
        let buckets = self
            .map
            .into_iter()
            .filter(|(_, values)| {
                if values.len() < 2 {
                    values.iter().for_each(&mut on_pruned);
                    pruned += values.len();
                    false
                } else {
                    true
                }
            })
            .collect();

        Finalized { buckets, pruned }
    }
}

/// Buckets surviving a stage.
#[derive(Debug)]
pub struct Finalized<K, V = FileItem> {
    /// Buckets holding at least two values
    pub buckets: Vec<(K, Vec<V>)>,
    /// Number of values dropped because their bucket was a singleton
    pub pruned: usize,
}

impl<K, V> Finalized<K, V> {
    /// Number of values still in play.
    #[must_use]
    pub fn survivors(&self) -> usize {
        self.buckets.iter().map(|(_, values)| values.len()).sum()
    }

    /// Whether no bucket survived.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Flatten surviving buckets, discarding keys.
    pub fn into_values(self) -> impl Iterator<Item = V> {
        self.buckets.into_iter().flat_map(|(_, values)| values)
    }
}

/// A set of two or more files with byte-identical content.
#[derive(Debug, Clone, Serialize)]
pub struct DuplicateGroup {
    /// BLAKE3 of the full content shared by every item
    pub signature: Hash,
    /// File size in bytes, shared by every item
    pub size: u64,
    /// The identical files, sorted by path
    pub items: Vec<FileItem>,
}

impl DuplicateGroup {
    /// Create a group; items are sorted by path.
    #[must_use]
    pub fn new(signature: Hash, size: u64, mut items: Vec<FileItem>) -> Self {
        items.sort_by(|a, b| a.path.cmp(&b.path));
        Self {
            signature,
            size,
            items,
        }
    }

    /// Number of files in this group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if this group is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Signature as hexadecimal string.
    #[must_use]
    pub fn signature_hex(&self) -> String {
        hash_to_hex(&self.signature)
    }

    /// Paths of the files in this group.
    #[must_use]
    pub fn paths(&self) -> Vec<PathBuf> {
        self.items.iter().map(|f| f.path.clone()).collect()
    }

    /// The most recently modified item, the copy a caller would keep.
    ///
    /// Ties are broken by path so the choice is stable.
    #[must_use]
    pub fn latest(&self) -> Option<&FileItem> {
        self.items
            .iter()
            .max_by(|a, b| a.modified.cmp(&b.modified).then_with(|| b.path.cmp(&a.path)))
    }

    /// Every item except [`latest`](Self::latest), newest first.
    #[must_use]
    pub fn redundant(&self) -> Vec<&FileItem> {
        let latest = self.latest().map(|f| f.path.as_path());
        let mut rest: Vec<&FileItem> = self.items.iter().collect();
        rest.sort_by(|a, b| b.modified.cmp(&a.modified).then_with(|| a.path.cmp(&b.path)));
        if let Some(pos) = rest.iter().position(|f| Some(f.path.as_path()) == latest) {
            rest.remove(pos);
        }
        rest
    }

    /// Number of duplicate copies (total - 1 kept).
    #[must_use]
    pub fn duplicate_count(&self) -> usize {
        self.items.len().saturating_sub(1)
    }

    /// Bytes freed by keeping a single copy.
    #[must_use]
    pub fn wasted_space(&self) -> u64 {
        self.size * self.duplicate_count() as u64
    }
}

/// Turn the buckets of a final stage into sorted duplicate groups.
///
/// Groups are ordered by size (largest first), then by first path.
#[must_use]
pub fn into_duplicate_groups(finalized: Finalized<(u64, Hash), FileItem>) -> Vec<DuplicateGroup> {
    let mut groups: Vec<DuplicateGroup> = finalized
        .buckets
        .into_iter()
        .map(|((size, signature), items)| {
            log::debug!(
                "Duplicate group {}: {} files, {} bytes each",
                hash_to_hex(&signature),
                items.len(),
                size
            );
            DuplicateGroup::new(signature, size, items)
        })
        .collect();

    groups.sort_by(|a, b| {
        b.size
            .cmp(&a.size)
            .then_with(|| a.items[0].path.cmp(&b.items[0].path))
    });
    groups
}
