use indicatif::{ProgressBar, ProgressStyle};
use near_duper_core::ProgressReporter;
use std::sync::Mutex;
use std::time::Duration;

/// Progress bar over the extraction phase of a batch; written to stderr.
pub struct CliReporter {
    bar: Mutex<Option<ProgressBar>>,
}

impl CliReporter {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn finish_bar(&self) {
        if let Ok(mut guard) = self.bar.lock() {
            if let Some(pb) = guard.take() {
                pb.finish_and_clear();
            }
        }
    }
}

impl ProgressReporter for CliReporter {
    fn on_extract_start(&self, unique_files: usize) {
        let pb = ProgressBar::new(unique_files as u64);
        let style = ProgressStyle::with_template(
            "  {spinner:.cyan} Extracting [{bar:30.cyan/dim}] {pos}/{len} files ({eta} remaining)",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("━╸─")
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");
        pb.set_style(style);
        pb.enable_steady_tick(Duration::from_millis(80));

        if let Ok(mut guard) = self.bar.lock() {
            if let Some(old) = guard.replace(pb) {
                old.finish_and_clear();
            }
        }
    }

    fn on_extract_progress(&self, files_done: usize, _total_files: usize) {
        if let Ok(guard) = self.bar.lock() {
            if let Some(pb) = guard.as_ref() {
                pb.set_position(files_done as u64);
            }
        }
    }

    fn on_extract_complete(&self, failures: usize, duration_secs: f64) {
        self.finish_bar();
        eprintln!(
            "  \x1b[32m✓\x1b[0m Extraction complete: {} unreadable files in {:.2}s",
            failures, duration_secs
        );
    }

    fn on_score_complete(&self, comparisons: usize, similar: usize) {
        eprintln!(
            "  \x1b[32m✓\x1b[0m Scoring complete: {} of {} pairs similar",
            similar, comparisons
        );
    }
}
