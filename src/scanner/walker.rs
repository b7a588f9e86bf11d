//! Directory enumeration for the command-line driver.
//!
//! # Overview
//!
//! The engine only ever receives an already-expanded list of paths. This
//! module produces that list for the `dupfind` binary: it walks a root
//! directory with [`jwalk`] and yields absolute paths of regular files.
//! Directory read errors are yielded as [`WalkError`] values rather than
//! stopping iteration.
//!
//! # Example
//!
//! ```no_run
//! use dupfind::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let walker = Walker::new(Path::new("/home/user/Downloads"), WalkerConfig::default());
//! let (paths, errors) = walker.collect();
//! println!("{} files, {} errors", paths.len(), errors.len());
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use jwalk::WalkDir;

/// Configuration for directory walking.
#[derive(Debug, Clone, Default)]
pub struct WalkerConfig {
    /// Follow symbolic links during traversal.
    /// Warning: May cause infinite loops with symlink cycles.
    pub follow_symlinks: bool,

    /// Skip hidden files and directories (names starting with `.`).
    pub skip_hidden: bool,
}

/// Errors that can occur while enumerating a directory tree.
#[derive(thiserror::Error, Debug)]
pub enum WalkError {
    /// The root path was not found.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// The root path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// A directory or entry could not be read.
    #[error("Failed to read {path}: {message}")]
    Entry {
        /// Path that failed
        path: PathBuf,
        /// Description from the walker
        message: String,
    },
}

/// Recursive file enumerator.
#[derive(Debug)]
pub struct Walker {
    root: PathBuf,
    config: WalkerConfig,
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Walker {
    /// Create a new walker for the given root directory.
    ///
    /// Relative roots are resolved against the current directory so every
    /// yielded path is absolute.
    #[must_use]
    pub fn new(path: &Path, config: WalkerConfig) -> Self {
        let root = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
        Self {
            root,
            config,
            shutdown_flag: None,
        }
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// The absolute root being walked.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Check that the root exists and is a directory.
    ///
    /// # Errors
    ///
    /// Returns [`WalkError::NotFound`] or [`WalkError::NotADirectory`].
    pub fn validate(&self) -> Result<(), WalkError> {
        if !self.root.exists() {
            return Err(WalkError::NotFound(self.root.clone()));
        }
        if !self.root.is_dir() {
            return Err(WalkError::NotADirectory(self.root.clone()));
        }
        Ok(())
    }

    /// Walk the tree, yielding file paths in sorted directory order.
    pub fn walk(&self) -> impl Iterator<Item = Result<PathBuf, WalkError>> + '_ {
        let walk_dir = WalkDir::new(&self.root)
            .follow_links(self.config.follow_symlinks)
            .skip_hidden(self.config.skip_hidden)
            .sort(true);

        walk_dir.into_iter().filter_map(move |entry_result| {
            if self.is_shutdown_requested() {
                log::debug!("Walker: Shutdown requested, stopping iteration");
                return None;
            }

            match entry_result {
                Ok(entry) => {
                    let file_type = entry.file_type();
                    if file_type.is_dir() {
                        return None;
                    }

                    let path = entry.path();
                    if file_type.is_symlink() && !self.config.follow_symlinks {
                        log::trace!("Skipping symlink: {}", path.display());
                        return None;
                    }

                    Some(Ok(path))
                }
                Err(e) => {
                    let path = e
                        .path()
                        .map_or_else(|| self.root.clone(), Path::to_path_buf);
                    log::warn!("Failed to read {}: {}", path.display(), e);
                    Some(Err(WalkError::Entry {
                        path,
                        message: e.to_string(),
                    }))
                }
            }
        })
    }

    /// Walk the tree and split the results into paths and errors.
    #[must_use]
    pub fn collect(&self) -> (Vec<PathBuf>, Vec<WalkError>) {
        let mut paths = Vec::new();
        let mut errors = Vec::new();
        for result in self.walk() {
            match result {
                Ok(path) => paths.push(path),
                Err(e) => errors.push(e),
            }
        }
        log::debug!(
            "Enumerated {} files under {} ({} errors)",
            paths.len(),
            self.root.display(),
            errors.len()
        );
        (paths, errors)
    }
}
