//! File probe: metadata and bounded byte-range reads.
//!
//! # Overview
//!
//! [`FileProbe`] is the only component that touches the filesystem on
//! behalf of the engine. It turns a path into a [`FileItem`] and streams
//! byte ranges of that file into a caller-supplied sink. Every I/O failure
//! comes back as a [`ProbeError`] so the caller can record the file as
//! failed and move on.
//!
//! Reads are bounded by the size recorded at probe time. A file that is
//! shorter or longer than probed when it is read yields
//! [`ProbeError::SizeChanged`], so stale metadata can never let two
//! different files be grouped.

use std::fmt;
use std::fs::File;
use std::io::{self, ErrorKind, Read, Seek, SeekFrom};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::SystemTime;

use memmap2::Mmap;

use super::{FileItem, ProbeError};

/// Default read buffer size (64KB).
pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

/// Default threshold above which ranges are read through a memory map (64MB).
pub const DEFAULT_MMAP_THRESHOLD: u64 = 64 * 1024 * 1024;

/// Opens a file for reading.
pub type Opener = fn(&Path) -> io::Result<File>;

/// Reads file metadata and byte ranges.
#[derive(Clone)]
pub struct FileProbe {
    buffer_size: usize,
    use_mmap: bool,
    mmap_threshold: u64,
    shutdown_flag: Option<Arc<AtomicBool>>,
    opener: Opener,
}

impl fmt::Debug for FileProbe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileProbe")
            .field("buffer_size", &self.buffer_size)
            .field("use_mmap", &self.use_mmap)
            .field("mmap_threshold", &self.mmap_threshold)
            .field("shutdown_flag", &self.shutdown_flag)
            .finish_non_exhaustive()
    }
}

impl Default for FileProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl FileProbe {
    /// Create a probe with buffered reads and mmap for large ranges.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            use_mmap: true,
            mmap_threshold: DEFAULT_MMAP_THRESHOLD,
            shutdown_flag: None,
            opener: |path| File::open(path),
        }
    }

    /// Set the read buffer size (minimum 1 byte).
    #[must_use]
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size.max(1);
        self
    }

    /// Enable or disable memory-mapped reads.
    #[must_use]
    pub fn with_mmap(mut self, enabled: bool) -> Self {
        self.use_mmap = enabled;
        self
    }

    /// Set the range length from which memory-mapped reads are used.
    #[must_use]
    pub fn with_mmap_threshold(mut self, threshold: u64) -> Self {
        self.mmap_threshold = threshold;
        self
    }

    /// Set the shutdown flag checked between buffered chunks.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Replace how files are opened. Defaults to [`File::open`].
    #[must_use]
    pub fn with_opener(mut self, opener: Opener) -> Self {
        self.opener = opener;
        self
    }

    fn open(&self, path: &Path) -> Result<File, ProbeError> {
        (self.opener)(path).map_err(|e| ProbeError::from_io(path, e))
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Open `path` and read its size and modification time.
    ///
    /// Symbolic links are followed; anything that is not a regular file
    /// after resolution is rejected. A file that cannot be opened fails
    /// here, before any strategy drops it for having a unique size.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError`] if the file cannot be opened, its metadata
    /// cannot be read, or it is not a regular file.
    pub fn probe(&self, path: &Path) -> Result<FileItem, ProbeError> {
        // Checked before opening: opening a FIFO would block.
        let kind = std::fs::metadata(path).map_err(|e| ProbeError::from_io(path, e))?;
        if !kind.is_file() {
            return Err(ProbeError::NotAFile(path.to_path_buf()));
        }

        let file = self.open(path)?;
        let metadata = file.metadata().map_err(|e| ProbeError::from_io(path, e))?;
        if !metadata.is_file() {
            return Err(ProbeError::NotAFile(path.to_path_buf()));
        }

        // Some filesystems cannot report mtime; the item stays usable.
        let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        Ok(FileItem::new(path.to_path_buf(), metadata.len(), modified))
    }

    /// Stream `len` bytes starting at `offset` of `item` into `sink`.
    ///
    /// Returns the number of bytes delivered, which is always `len` on
    /// success. When the range ends at the probed end of file, the probe
    /// also verifies that the file has not grown since it was probed.
    ///
    /// # Errors
    ///
    /// - [`ProbeError::SizeChanged`] if the file is shorter than the range,
    ///   or longer than probed when reading up to the end
    /// - [`ProbeError::Interrupted`] if shutdown was requested mid-read
    /// - any open/read failure mapped through [`ProbeError::from_io`]
    pub fn read_range(
        &self,
        item: &FileItem,
        offset: u64,
        len: u64,
        sink: &mut dyn FnMut(&[u8]),
    ) -> Result<u64, ProbeError> {
        let path = item.path.as_path();
        let size_changed = || ProbeError::SizeChanged {
            path: path.to_path_buf(),
            expected: item.size,
        };

        let end = offset.checked_add(len).ok_or_else(size_changed)?;
        if end > item.size {
            return Err(size_changed());
        }

        let mut file = self.open(path)?;

        if self.use_mmap && len >= self.mmap_threshold && len > 0 {
            return self.read_mapped(&file, item, offset, len, sink);
        }

        if offset > 0 {
            file.seek(SeekFrom::Start(offset))
                .map_err(|e| ProbeError::from_io(path, e))?;
        }

        let mut buffer = vec![0u8; self.buffer_size.min(len.max(1) as usize)];
        let mut remaining = len;
        while remaining > 0 {
            if self.is_shutdown_requested() {
                return Err(ProbeError::Interrupted(path.to_path_buf()));
            }

            let want = remaining.min(buffer.len() as u64) as usize;
            let read = match file.read(&mut buffer[..want]) {
                Ok(0) => return Err(size_changed()),
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(ProbeError::from_io(path, e)),
            };
            sink(&buffer[..read]);
            remaining -= read as u64;
        }

        if end == item.size && has_trailing_bytes(&mut file, path)? {
            return Err(size_changed());
        }

        Ok(len)
    }

    fn read_mapped(
        &self,
        file: &File,
        item: &FileItem,
        offset: u64,
        len: u64,
        sink: &mut dyn FnMut(&[u8]),
    ) -> Result<u64, ProbeError> {
        let path = item.path.as_path();

        // SAFETY: the map is only read, and a concurrent truncation shows up
        // as a length mismatch that is rejected below before any byte is used.
        let map = unsafe { Mmap::map(file) }.map_err(|e| ProbeError::from_io(path, e))?;
        if map.len() as u64 != item.size {
            return Err(ProbeError::SizeChanged {
                path: path.to_path_buf(),
                expected: item.size,
            });
        }

        log::trace!(
            "Memory-mapped read of {} bytes from {}",
            len,
            path.display()
        );

        let start = offset as usize;
        let end = start + len as usize;
        for chunk in map[start..end].chunks(DEFAULT_MMAP_THRESHOLD as usize) {
            if self.is_shutdown_requested() {
                return Err(ProbeError::Interrupted(path.to_path_buf()));
            }
            sink(chunk);
        }

        Ok(len)
    }
}

/// Whether any byte follows the current position.
fn has_trailing_bytes(file: &mut File, path: &Path) -> Result<bool, ProbeError> {
    let mut probe_byte = [0u8; 1];
    loop {
        match file.read(&mut probe_byte) {
            Ok(n) => return Ok(n > 0),
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(ProbeError::from_io(path, e)),
        }
    }
}
