//! dupfind - content-based duplicate file detection.
//!
//! Given a list of file paths, [`duplicates::DupDetector::find`] groups them
//! by identical content. Three strategies produce the same groups with
//! different amounts of I/O:
//!
//! - **baseline**: hash every file in full
//! - **size-filtered**: compare sizes first, hash only files sharing a size
//! - **progressive**: size, then a hash of the first 4 KiB, then the rest
//!
//! Files that cannot be read are reported in [`duplicates::ScanResult`]
//! instead of aborting the scan.
//!
//! ```no_run
//! use dupfind::duplicates::{FinderConfig, Strategy};
//! use std::path::PathBuf;
//!
//! let files = vec![PathBuf::from("a.txt"), PathBuf::from("b.txt")];
//! let result = Strategy::Progressive
//!     .detector(FinderConfig::default())
//!     .find(&files, 4);
//! println!("{} duplicate groups", result.duplicates.len());
//! ```

pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod progress;
pub mod runner;
pub mod scanner;
pub mod signal;

pub use runner::run_app;
