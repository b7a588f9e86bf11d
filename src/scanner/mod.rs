//! File access layer for duplicate detection.
//!
//! This module provides functionality for:
//! - Probing file metadata (size, modification time)
//! - Reading bounded byte ranges of a file
//! - Content signatures with BLAKE3 (prefix and full)
//! - Enumerating a directory tree for the command-line driver
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`probe`]: Metadata probing and bounded range reads
//! - [`hasher`]: Size key, partial (prefix) signature and full signature
//! - [`walker`]: Directory traversal for the driver (the engine never walks)
//!
//! # Example
//!
//! ```no_run
//! use dupfind::scanner::{FileProbe, Hasher};
//! use std::path::Path;
//!
//! let probe = FileProbe::new();
//! let item = probe.probe(Path::new("photo.jpg")).unwrap();
//!
//! let hasher = Hasher::new();
//! let partial = hasher.partial_signature(&item).unwrap();
//! let full = hasher.complete(&item, partial).unwrap();
//! println!("{} bytes, read {}", item.size, full.bytes_read);
//! ```

pub mod hasher;
pub mod probe;
pub mod walker;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::SystemTime;

use serde::Serialize;

// Re-export main types
pub use hasher::{hash_to_hex, hex_to_hash, Digest, Hash, Hasher, PartialSignature, PREFIX_SIZE};
pub use probe::FileProbe;
pub use walker::{Walker, WalkerConfig};

/// One scanned file.
///
/// Created when the engine first probes a path and immutable afterwards;
/// workers share it read-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileItem {
    /// Path as supplied by the caller
    pub path: PathBuf,
    /// File size in bytes at probe time
    pub size: u64,
    /// Last modification time
    pub modified: SystemTime,
}

impl FileItem {
    /// Create a new FileItem.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the file
    /// * `size` - File size in bytes
    /// * `modified` - Last modification time
    #[must_use]
    pub fn new(path: PathBuf, size: u64, modified: SystemTime) -> Self {
        Self {
            path,
            size,
            modified,
        }
    }
}

/// Errors that can occur while probing or reading a single file.
///
/// All variants describe an unreadable file: the engine records the path
/// as failed and keeps going.
#[derive(thiserror::Error, Debug, Clone)]
pub enum ProbeError {
    /// The file vanished or never existed.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when opening or reading the file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The path exists but is not a regular file.
    #[error("Not a regular file: {0}")]
    NotAFile(PathBuf),

    /// The file length no longer matches the probed size.
    #[error("File changed during scan: {path} (expected {expected} bytes)")]
    SizeChanged {
        /// Path of the changed file
        path: PathBuf,
        /// Size recorded when the file was probed
        expected: u64,
    },

    /// The read was abandoned because cancellation was requested.
    #[error("Interrupted while reading {0}")]
    Interrupted(PathBuf),

    /// Any other I/O error.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: Arc<std::io::Error>,
    },
}

impl ProbeError {
    /// Map an I/O error for `path` to the matching variant.
    #[must_use]
    pub fn from_io(path: &std::path::Path, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: Arc::new(err),
            },
        }
    }

    /// Whether this error stems from cancellation rather than the file itself.
    #[must_use]
    pub fn is_interrupted(&self) -> bool {
        matches!(self, Self::Interrupted(_))
    }
}

impl Serialize for ProbeError {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}
