//! Command-line interface definitions for dupfind.
//!
//! Options left unset fall back to the loaded [`Config`](crate::config::Config),
//! so `--workers`, `--strategy`, `--times` and `--prefix-size` are `Option`s
//! rather than carrying clap defaults.
//!
//! ```bash
//! # Find duplicates with the configured strategy
//! dupfind ~/Downloads
//!
//! # Run all three strategies and print each report
//! dupfind ~/Downloads --mode compare --workers 4
//!
//! # Time every strategy five times
//! dupfind ~/Downloads --mode test --times 5
//! ```

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::duplicates::Strategy;

/// Content-based duplicate file finder.
///
/// Groups files under a directory by identical content. Sizes are compared
/// first, then a hash of the first few kilobytes, and only then the full
/// content.
#[derive(Debug, Parser)]
#[command(name = "dupfind")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory to search for duplicates
    #[arg(value_name = "DIR")]
    pub path: PathBuf,

    /// What to do with the files found under DIR
    #[arg(short, long, value_enum, default_value_t = RunMode::Find)]
    pub mode: RunMode,

    /// Number of concurrent workers (0 uses the default of 10)
    #[arg(short, long, value_name = "N")]
    pub workers: Option<usize>,

    /// Detection strategy used in find mode
    #[arg(short, long, value_enum)]
    pub strategy: Option<Strategy>,

    /// Repetitions per strategy in test mode
    #[arg(short, long, value_name = "N")]
    pub times: Option<u32>,

    /// Bytes covered by the prefix signature (e.g. 4096, 4KiB, 1MiB)
    #[arg(long, value_name = "SIZE", value_parser = parse_size)]
    pub prefix_size: Option<usize>,

    /// Follow symbolic links while enumerating DIR
    #[arg(long)]
    pub follow_symlinks: bool,

    /// Report format for find and compare modes
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,

    /// Configuration file (defaults to the platform config directory)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only print errors and the report
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Print errors as JSON on stderr
    #[arg(long)]
    pub json_errors: bool,
}

/// Driver mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RunMode {
    /// Run one strategy and print its groups
    Find,
    /// Run every strategy once and print each report
    Compare,
    /// Time every strategy over several runs
    Test,
}

/// Report format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// The scan result as JSON
    Json,
}

/// Parse a byte count with an optional binary or decimal suffix.
///
/// ```
/// use dupfind::cli::parse_size;
///
/// assert_eq!(parse_size("4096").unwrap(), 4096);
/// assert_eq!(parse_size("4KiB").unwrap(), 4096);
/// assert_eq!(parse_size("1k").unwrap(), 1000);
/// ```
///
/// # Errors
///
/// Returns a message for empty input, a zero size, an unknown suffix or a
/// value that does not fit in `usize`.
pub fn parse_size(s: &str) -> Result<usize, String> {
    let s = s.trim();
    let split = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    let (digits, suffix) = s.split_at(split);
    if digits.is_empty() {
        return Err(format!("Invalid size: '{s}'"));
    }

    let value: usize = digits
        .parse()
        .map_err(|_| format!("Invalid size: '{s}'"))?;
    let multiplier: usize = match suffix.trim().to_ascii_lowercase().as_str() {
        "" | "b" => 1,
        "k" | "kb" => 1_000,
        "kib" => 1 << 10,
        "m" | "mb" => 1_000_000,
        "mib" => 1 << 20,
        other => return Err(format!("Unknown size suffix: '{other}'")),
    };

    match value.checked_mul(multiplier) {
        Some(0) => Err("Size must be at least one byte".to_string()),
        Some(bytes) => Ok(bytes),
        None => Err(format!("Size too large: '{s}'")),
    }
}
