use folio_core::ProgressReporter;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Mutex;

/// CLI progress reporter using indicatif.
///
/// - Phases without a known size get a spinner
/// - Per-file work (ingest) switches the spinner to a bar once a total is known
pub struct CliReporter {
    bar: Mutex<Option<ProgressBar>>,
}

impl CliReporter {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn set_bar(&self, pb: ProgressBar) {
        let mut guard = self.bar.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(old) = guard.take() {
            old.finish_and_clear();
        }
        *guard = Some(pb);
    }

    fn finish_bar(&self) {
        let mut guard = self.bar.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(pb) = guard.take() {
            pb.finish_and_clear();
        }
    }

    fn spinner(message: String) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
        }
        pb.set_message(message);
        pb.enable_steady_tick(std::time::Duration::from_millis(80));
        pb
    }

    fn file_bar(total: usize) -> ProgressBar {
        let pb = ProgressBar::new(total as u64);
        if let Ok(style) = ProgressStyle::with_template(
            "  {spinner:.cyan} [{bar:30.cyan/dim}] {pos}/{len} files ({eta} remaining) {wide_msg}",
        ) {
            pb.set_style(style.progress_chars("━╸─").tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
        }
        pb.enable_steady_tick(std::time::Duration::from_millis(80));
        pb
    }
}

impl ProgressReporter for CliReporter {
    fn on_phase_start(&self, phase: &str) {
        self.set_bar(Self::spinner(format!("{}...", phase)));
    }

    fn on_phase_complete(&self, phase: &str, summary: &str) {
        self.finish_bar();
        eprintln!("  \x1b[32m✓\x1b[0m {}: {}", phase, summary);
    }

    fn on_file_progress(&self, done: usize, total: usize, current_path: &str) {
        let mut guard = self.bar.lock().unwrap_or_else(|e| e.into_inner());
        let needs_bar = guard
            .as_ref()
            .map_or(true, |pb| pb.length() != Some(total as u64));
        if needs_bar {
            if let Some(old) = guard.take() {
                old.finish_and_clear();
            }
            *guard = Some(Self::file_bar(total));
        }
        if let Some(pb) = guard.as_ref() {
            pb.set_position(done as u64);
            pb.set_message(current_path.to_string());
        }
    }
}
