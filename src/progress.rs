//! Progress reporting utilities using indicatif.
//!
//! This module provides the [`ProgressCallback`] trait the engine reports
//! through, and [`Progress`], which renders one terminal bar per stage.
//!
//! Stages are reported by name: `"probe"` (metadata and size buckets),
//! `"partial"` (prefix signatures) and `"full"` (full signatures). The
//! baseline strategy only runs `"full"`.

use std::sync::{Mutex, MutexGuard, PoisonError};

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

/// Progress callback for detection stages.
///
/// Implement this trait to receive progress updates during a scan.
/// Calls arrive from worker threads, in no particular order within a stage.
pub trait ProgressCallback: Send + Sync {
    /// Called when a stage starts.
    ///
    /// # Arguments
    ///
    /// * `phase` - Name of the stage (`"probe"`, `"partial"`, `"full"`)
    /// * `total` - Total number of files the stage will process
    fn on_phase_start(&self, phase: &str, total: usize);

    /// Called for each file picked up by a worker.
    ///
    /// # Arguments
    ///
    /// * `current` - Number of files started so far in this stage (1-based)
    /// * `path` - Path being processed
    fn on_progress(&self, current: usize, path: &str);

    /// Called when a full signature has been computed, with the bytes read.
    fn on_item_completed(&self, _bytes: u64) {}

    /// Called when a stage completes.
    fn on_phase_end(&self, phase: &str);
}

/// Progress reporter using indicatif.
pub struct Progress {
    multi: MultiProgress,
    active: Mutex<Option<(String, ProgressBar)>>,
    quiet: bool,
}

impl Progress {
    /// Create a new progress reporter.
    ///
    /// # Arguments
    ///
    /// * `quiet` - If true, no progress bars will be displayed.
    ///
    /// # Examples
    ///
    /// ```
    /// use dupfind::progress::Progress;
    ///
    /// let progress = Progress::new(false);
    /// ```
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        Self {
            multi: MultiProgress::new(),
            active: Mutex::new(None),
            quiet,
        }
    }

    fn active(&self) -> MutexGuard<'_, Option<(String, ProgressBar)>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn style_for(phase: &str) -> ProgressStyle {
        let template = match phase {
            "full" => "[{elapsed_precise}] [{bar:40.green/blue}] {pos}/{len} ({percent}%) {msg} (ETA: {eta})",
            _ => "[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
        };
        ProgressStyle::with_template(template)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█>-")
    }
}

/// Human-facing label for a stage name.
fn phase_label(phase: &str) -> &str {
    match phase {
        "probe" => "Reading metadata",
        "partial" => "Hashing prefixes",
        "full" => "Full hashing",
        other => other,
    }
}

impl ProgressCallback for Progress {
    fn on_phase_start(&self, phase: &str, total: usize) {
        if self.quiet {
            return;
        }

        let pb = self.multi.add(ProgressBar::new(total as u64));
        pb.set_style(Self::style_for(phase));
        pb.set_message(phase_label(phase).to_string());
        *self.active() = Some((phase.to_string(), pb));
    }

    fn on_progress(&self, current: usize, path: &str) {
        if self.quiet {
            return;
        }

        if let Some((phase, pb)) = self.active().as_ref() {
            pb.set_position(current as u64);
            pb.set_message(format!("{}: {}", phase_label(phase), truncate_path(path, 30)));
        }
    }

    fn on_phase_end(&self, phase: &str) {
        if self.quiet {
            return;
        }

        let mut active = self.active();
        if active.as_ref().is_some_and(|(name, _)| name == phase) {
            if let Some((_, pb)) = active.take() {
                pb.finish_with_message(format!("{} complete", phase_label(phase)));
            }
        }
    }
}

/// Truncate a path for display in the progress bar.
fn truncate_path(path: &str, max_len: usize) -> String {
    if path.len() <= max_len {
        return path.to_string();
    }

    let file_name = std::path::Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    if file_name.chars().count() >= max_len {
        let tail: String = file_name
            .chars()
            .rev()
            .take(max_len - 3)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        return format!("...{}", tail);
    }

    format!(".../{}", file_name)
}
