use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// `target` absorbs every folder in `sources`. Paths are root-relative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergePlan {
    pub target: String,
    pub sources: Vec<String>,
}

/// Outcome of one compaction pass, persisted as `_cleanup_report.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CleanupReport {
    pub dry_run: bool,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub merged_files: usize,
    pub deduped_files: usize,
    pub removed_folders: usize,
    pub empty_cleaned: usize,
    pub ai_renames: usize,
    /// Per-file I/O failures that were logged and skipped.
    pub errors: usize,
    pub plans: Vec<MergePlan>,
    pub log: Vec<String>,
}

impl CleanupReport {
    pub fn log(&mut self, line: impl Into<String>) {
        let line = line.into();
        info!("{}", line);
        self.log.push(line);
    }

    pub fn error(&mut self, line: impl Into<String>) {
        let line = line.into();
        warn!("{}", line);
        self.errors += 1;
        self.log.push(format!("error: {}", line));
    }

    /// True when the pass changed nothing in the tree.
    pub fn is_noop(&self) -> bool {
        self.merged_files == 0
            && self.deduped_files == 0
            && self.removed_folders == 0
            && self.empty_cleaned == 0
            && self.ai_renames == 0
    }
}
