//! Content signatures with BLAKE3.
//!
//! # Overview
//!
//! Three keys narrow the candidate set, cheapest first:
//!
//! 1. **Size** - free, taken from metadata ([`Hasher::size_key`])
//! 2. **Partial signature** - BLAKE3 of the first [`PREFIX_SIZE`] bytes
//!    ([`Hasher::partial_signature`])
//! 3. **Full signature** - BLAKE3 of the whole file ([`Hasher::full_signature`]
//!    or [`Hasher::complete`])
//!
//! A [`PartialSignature`] keeps the BLAKE3 state it was finalized from.
//! [`Hasher::complete`] resumes that state on the bytes after the prefix,
//! so the resulting digest equals a from-scratch [`Hasher::full_signature`]
//! while the prefix is read only once. Files no longer than the prefix are
//! already fully covered by the partial signature and need no second read.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use super::{FileItem, FileProbe, ProbeError};

/// A 32-byte BLAKE3 digest.
pub type Hash = [u8; 32];

/// Number of leading bytes covered by a partial signature (4KB).
pub const PREFIX_SIZE: usize = 4096;

/// A computed signature and the number of bytes read to produce it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Digest {
    /// The signature
    pub hash: Hash,
    /// Bytes read from disk for this computation
    pub bytes_read: u64,
}

/// Signature over a file prefix, resumable into a full signature.
#[derive(Clone)]
pub struct PartialSignature {
    /// BLAKE3 of the prefix
    pub hash: Hash,
    /// Bytes read for the prefix
    pub bytes_read: u64,
    state: blake3::Hasher,
}

impl PartialSignature {
    /// Whether the prefix spans the whole file of `size` bytes.
    #[must_use]
    pub fn covers(&self, size: u64) -> bool {
        self.bytes_read >= size
    }
}

impl std::fmt::Debug for PartialSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PartialSignature")
            .field("hash", &hash_to_hex(&self.hash))
            .field("bytes_read", &self.bytes_read)
            .finish_non_exhaustive()
    }
}

/// Computes size keys and content signatures.
#[derive(Debug, Clone)]
pub struct Hasher {
    probe: FileProbe,
    prefix_size: usize,
}

impl Default for Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher {
    /// Create a hasher with the default probe and [`PREFIX_SIZE`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            probe: FileProbe::new(),
            prefix_size: PREFIX_SIZE,
        }
    }

    /// Set the prefix length for partial signatures (minimum 1 byte).
    #[must_use]
    pub fn with_prefix_size(mut self, size: usize) -> Self {
        self.prefix_size = size.max(1);
        self
    }

    /// Replace the file probe used for reads.
    #[must_use]
    pub fn with_probe(mut self, probe: FileProbe) -> Self {
        self.probe = probe;
        self
    }

    /// Set the shutdown flag checked during reads.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.probe = self.probe.with_shutdown_flag(flag);
        self
    }

    /// The configured prefix length.
    #[must_use]
    pub fn prefix_size(&self) -> usize {
        self.prefix_size
    }

    /// The probe used for reads.
    #[must_use]
    pub fn probe(&self) -> &FileProbe {
        &self.probe
    }

    /// Stage 1 key: the file size. Performs no I/O.
    #[must_use]
    pub fn size_key(item: &FileItem) -> u64 {
        item.size
    }

    /// Stage 2: BLAKE3 over the first `prefix_size` bytes (or the whole
    /// file if it is shorter).
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError`] if the file cannot be read.
    pub fn partial_signature(&self, item: &FileItem) -> Result<PartialSignature, ProbeError> {
        let len = item.size.min(self.prefix_size as u64);
        let mut state = blake3::Hasher::new();
        let bytes_read = self.probe.read_range(item, 0, len, &mut |chunk| {
            state.update(chunk);
        })?;

        Ok(PartialSignature {
            hash: *state.finalize().as_bytes(),
            bytes_read,
            state,
        })
    }

    /// Stage 3 from scratch: BLAKE3 over the entire file.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError`] if the file cannot be read.
    pub fn full_signature(&self, item: &FileItem) -> Result<Digest, ProbeError> {
        let mut state = blake3::Hasher::new();
        let bytes_read = self.probe.read_range(item, 0, item.size, &mut |chunk| {
            state.update(chunk);
        })?;

        Ok(Digest {
            hash: *state.finalize().as_bytes(),
            bytes_read,
        })
    }

    /// Stage 3 resumed: extend a partial signature with the rest of the file.
    ///
    /// `bytes_read` of the returned digest counts only the tail, since the
    /// prefix was already accounted for by the partial stage.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError`] if the tail cannot be read.
    pub fn complete(
        &self,
        item: &FileItem,
        partial: PartialSignature,
    ) -> Result<Digest, ProbeError> {
        if partial.covers(item.size) {
            return Ok(Digest {
                hash: partial.hash,
                bytes_read: 0,
            });
        }

        let mut state = partial.state;
        let offset = partial.bytes_read;
        let bytes_read = self
            .probe
            .read_range(item, offset, item.size - offset, &mut |chunk| {
                state.update(chunk);
            })?;

        Ok(Digest {
            hash: *state.finalize().as_bytes(),
            bytes_read,
        })
    }
}

/// Convert a hash to its lowercase hexadecimal form.
#[must_use]
pub fn hash_to_hex(hash: &Hash) -> String {
    hash.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Parse a 64-character hexadecimal string into a hash.
#[must_use]
pub fn hex_to_hash(hex: &str) -> Option<Hash> {
    if hex.len() != 64 || !hex.is_ascii() {
        return None;
    }

    let mut hash = [0u8; 32];
    for (i, byte) in hash.iter_mut().enumerate() {
        *byte = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16).ok()?;
    }
    Some(hash)
}
