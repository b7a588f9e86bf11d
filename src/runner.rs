//! The `dupfind` driver: resolve settings, enumerate a directory, run the
//! requested mode and print reports.

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use bytesize::ByteSize;
use serde::Serialize;

use crate::cli::{Cli, OutputFormat, RunMode};
use crate::config::Config;
use crate::duplicates::{DuplicateGroup, FinderConfig, ScanResult, Strategy};
use crate::error::ExitCode;
use crate::progress::Progress;
use crate::scanner::{Walker, WalkerConfig};
use crate::signal::{create_handler, install_handler, ShutdownHandler};

/// Effective settings after merging the config layers with CLI flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Worker count handed to every `find` call
    pub workers: usize,
    /// Prefix signature length
    pub prefix_size: usize,
    /// Strategy for find mode
    pub strategy: Strategy,
    /// Repetitions per strategy in test mode
    pub times: u32,
    /// Follow symlinks during enumeration
    pub follow_symlinks: bool,
}

impl Settings {
    /// Overlay CLI flags on a loaded configuration.
    #[must_use]
    pub fn merge(config: Config, cli: &Cli) -> Self {
        Self {
            workers: cli.workers.unwrap_or(config.workers),
            prefix_size: cli.prefix_size.unwrap_or(config.prefix_size),
            strategy: cli.strategy.unwrap_or(config.strategy),
            times: cli.times.unwrap_or(config.bench_iterations).max(1),
            follow_symlinks: cli.follow_symlinks || config.follow_symlinks,
        }
    }

    /// Load the configuration named by `--config` (strictly) or the default
    /// one (leniently), then apply CLI flags.
    ///
    /// # Errors
    ///
    /// Fails if an explicit config file is missing or invalid.
    pub fn resolve(cli: &Cli) -> Result<Self> {
        let config = match &cli.config {
            Some(path) => {
                if !path.is_file() {
                    bail!("Configuration file not found: {}", path.display());
                }
                Config::try_load_from_path(path)
                    .with_context(|| format!("Failed to load configuration from {}", path.display()))?
            }
            None => Config::load(),
        };
        Ok(Self::merge(config, cli))
    }
}

/// Run the application with a process-wide Ctrl+C handler, printing to stdout.
///
/// # Errors
///
/// Returns an error for invalid configuration or an unusable root directory.
/// Per-file failures are part of the report, not errors.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    let handler = install_handler().unwrap_or_else(|e| {
        log::warn!("{}; Ctrl+C will not stop scans gracefully", e);
        create_handler()
    });
    let stdout = io::stdout();
    let mut out = stdout.lock();
    run_with_handler(&cli, &handler, &mut out)
}

/// Run the application against an explicit shutdown handler and writer.
///
/// # Errors
///
/// See [`run_app`].
pub fn run_with_handler(
    cli: &Cli,
    shutdown: &ShutdownHandler,
    out: &mut dyn Write,
) -> Result<ExitCode> {
    let settings = Settings::resolve(cli)?;
    log::debug!("Effective settings: {:?}", settings);

    let walker = Walker::new(
        &cli.path,
        WalkerConfig {
            follow_symlinks: settings.follow_symlinks,
            skip_hidden: false,
        },
    )
    .with_shutdown_flag(shutdown.get_flag());
    walker
        .validate()
        .with_context(|| format!("Cannot search {}", cli.path.display()))?;

    let (files, walk_errors) = walker.collect();
    if shutdown.is_shutdown_requested() {
        return Ok(ExitCode::Interrupted);
    }
    log::info!(
        "Found {} files under {} ({} unreadable entries)",
        files.len(),
        walker.root().display(),
        walk_errors.len()
    );

    let mut finder = FinderConfig::default()
        .with_prefix_size(settings.prefix_size)
        .with_shutdown_flag(shutdown.get_flag());

    let code = match cli.mode {
        RunMode::Find => {
            if !cli.quiet && cli.output == OutputFormat::Text {
                finder = finder.with_progress_callback(Arc::new(Progress::new(false)));
            }
            run_find(&files, &settings, finder, cli.output, out)?
        }
        RunMode::Compare => run_compare(&files, &settings, finder, cli.output, out)?,
        RunMode::Test => run_benchmark(&files, &settings, finder, out)?,
    };
    out.flush().context("Failed to flush output")?;

    if code == ExitCode::Success && !walk_errors.is_empty() {
        return Ok(ExitCode::PartialSuccess);
    }
    Ok(code)
}

/// One strategy run, as reported in JSON.
#[derive(Debug, Serialize)]
struct StrategyReport<'a> {
    strategy: Strategy,
    elapsed_ms: f64,
    result: &'a ScanResult,
}

fn timed_find(
    strategy: Strategy,
    files: &[PathBuf],
    settings: &Settings,
    finder: &FinderConfig,
) -> (ScanResult, Duration) {
    let detector = strategy.detector(finder.clone());
    let started = Instant::now();
    let result = detector.find(files, settings.workers);
    (result, started.elapsed())
}

fn run_find(
    files: &[PathBuf],
    settings: &Settings,
    finder: FinderConfig,
    output: OutputFormat,
    out: &mut dyn Write,
) -> Result<ExitCode> {
    let (result, elapsed) = timed_find(settings.strategy, files, settings, &finder);
    if result.interrupted {
        return Ok(ExitCode::Interrupted);
    }

    match output {
        OutputFormat::Text => write_report(out, settings.strategy, &result, elapsed)?,
        OutputFormat::Json => {
            let report = StrategyReport {
                strategy: settings.strategy,
                elapsed_ms: elapsed.as_secs_f64() * 1000.0,
                result: &result,
            };
            serde_json::to_writer_pretty(&mut *out, &report)
                .context("Failed to serialize report")?;
            writeln!(out)?;
        }
    }
    Ok(exit_code_for(&result))
}

fn run_compare(
    files: &[PathBuf],
    settings: &Settings,
    finder: FinderConfig,
    output: OutputFormat,
    out: &mut dyn Write,
) -> Result<ExitCode> {
    let mut runs = Vec::with_capacity(Strategy::ALL.len());
    for strategy in Strategy::ALL {
        let (result, elapsed) = timed_find(strategy, files, settings, &finder);
        if result.interrupted {
            return Ok(ExitCode::Interrupted);
        }
        runs.push((strategy, result, elapsed));
    }

    let reference = runs.last().map(|(_, r, _)| r.group_path_sets());
    let agree = runs
        .iter()
        .all(|(_, r, _)| Some(r.group_path_sets()) == reference);
    if !agree {
        log::error!("Strategies disagree on duplicate groups");
    }

    match output {
        OutputFormat::Text => {
            for (strategy, result, elapsed) in &runs {
                write_report(out, *strategy, result, *elapsed)?;
                writeln!(out)?;
            }
            writeln!(out, "Strategies agree: {}", if agree { "yes" } else { "NO" })?;
        }
        OutputFormat::Json => {
            let reports: Vec<StrategyReport<'_>> = runs
                .iter()
                .map(|(strategy, result, elapsed)| StrategyReport {
                    strategy: *strategy,
                    elapsed_ms: elapsed.as_secs_f64() * 1000.0,
                    result,
                })
                .collect();
            serde_json::to_writer_pretty(&mut *out, &reports)
                .context("Failed to serialize report")?;
            writeln!(out)?;
        }
    }

    if !agree {
        return Ok(ExitCode::GeneralError);
    }
    Ok(runs
        .last()
        .map_or(ExitCode::NoDuplicates, |(_, r, _)| exit_code_for(r)))
}

fn run_benchmark(
    files: &[PathBuf],
    settings: &Settings,
    finder: FinderConfig,
    out: &mut dyn Write,
) -> Result<ExitCode> {
    writeln!(
        out,
        "{:<14} {:>7} {:>7} {:>10} {:>14}",
        "strategy", "workers", "groups", "iterations", "mean"
    )?;

    let mut code = ExitCode::NoDuplicates;
    for strategy in Strategy::ALL {
        let mut total = Duration::ZERO;
        let mut groups = 0;
        for iteration in 1..=settings.times {
            let (result, elapsed) = timed_find(strategy, files, settings, &finder);
            if result.interrupted {
                return Ok(ExitCode::Interrupted);
            }
            log::debug!("{} iteration {}: {:.2?}", strategy, iteration, elapsed);
            total += elapsed;
            groups = result.duplicates.len();
            code = exit_code_for(&result);
        }

        writeln!(
            out,
            "{:<14} {:>7} {:>7} {:>10} {:>14.2?}",
            strategy.name(),
            settings.workers,
            groups,
            settings.times,
            total / settings.times
        )?;
    }
    Ok(code)
}

/// Exit code for a completed scan.
#[must_use]
pub fn exit_code_for(result: &ScanResult) -> ExitCode {
    if result.interrupted {
        ExitCode::Interrupted
    } else if !result.failed.is_empty() {
        ExitCode::PartialSuccess
    } else if result.has_duplicates() {
        ExitCode::Success
    } else {
        ExitCode::NoDuplicates
    }
}

fn write_group(out: &mut dyn Write, index: usize, group: &DuplicateGroup) -> io::Result<()> {
    let hex = group.signature_hex();
    writeln!(
        out,
        "Group {}: {} files of {} (blake3 {})",
        index,
        group.len(),
        ByteSize(group.size),
        &hex[..16]
    )?;
    if let Some(latest) = group.latest() {
        writeln!(out, "  Latest one: {}", latest.path.display())?;
    }
    for item in group.redundant() {
        writeln!(out, "    {}", item.path.display())?;
    }
    Ok(())
}

/// Print one strategy's groups, failures and counters.
///
/// # Errors
///
/// Returns any error from the writer.
pub fn write_report(
    out: &mut dyn Write,
    strategy: Strategy,
    result: &ScanResult,
    elapsed: Duration,
) -> io::Result<()> {
    writeln!(out, "== {} ({:.2?}) ==", strategy, elapsed)?;

    if result.duplicates.is_empty() {
        writeln!(out, "No duplicates found.")?;
    }
    for (i, group) in result.duplicates.iter().enumerate() {
        write_group(out, i + 1, group)?;
    }

    if !result.failed.is_empty() {
        writeln!(out, "Failed files ({}):", result.failed.len())?;
        for failure in &result.failed {
            writeln!(out, "  {}: {}", failure.path.display(), failure.error)?;
        }
    }

    writeln!(out, "TotalFiles: {}", result.total_files)?;
    writeln!(out, "TotalComparedFiles: {}", result.total_compared_files)?;
    writeln!(
        out,
        "TotalBytesInComparedFiles: {}",
        result.total_bytes_in_compared_files
    )?;
    writeln!(out, "TotalReadBytes: {}", result.total_read_bytes)?;
    writeln!(
        out,
        "Reclaimable: {} in {} redundant files",
        ByteSize(result.reclaimable_space()),
        result.duplicate_file_count()
    )
}
