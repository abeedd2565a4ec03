/// Trait for reporting batch progress.
///
/// The CLI implements it with indicatif. All methods have default no-op implementations.
/// Extraction callbacks are invoked from worker threads.
pub trait ProgressReporter: Send + Sync {
    fn on_extract_start(&self, _unique_files: usize) {}
    fn on_extract_progress(&self, _files_done: usize, _total_files: usize) {}
    fn on_extract_complete(&self, _failures: usize, _duration_secs: f64) {}
    fn on_score_complete(&self, _comparisons: usize, _similar: usize) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}
