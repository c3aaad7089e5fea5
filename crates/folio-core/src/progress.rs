/// Trait for reporting engine progress.
///
/// The CLI implements it with indicatif bars. All methods have default
/// no-op implementations.
pub trait ProgressReporter: Send + Sync {
    fn on_phase_start(&self, _phase: &str) {}
    fn on_phase_complete(&self, _phase: &str, _summary: &str) {}
    fn on_file_progress(&self, _done: usize, _total: usize, _current_path: &str) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}
