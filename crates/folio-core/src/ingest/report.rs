//! Per-batch Markdown report and JSON manifest under `_reports/`.

use crate::config::AppConfig;
use crate::error::Error;
use crate::ingest::provenance::ProvenanceSource;
use crate::storage::json::write_json_atomic;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Placed,
    ReusedFolder,
    Duplicate,
    Failed,
}

impl OutcomeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeStatus::Placed => "placed",
            OutcomeStatus::ReusedFolder => "placed (reused folder)",
            OutcomeStatus::Duplicate => "duplicate skipped",
            OutcomeStatus::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestOutcome {
    pub file_name: String,
    pub source_path: PathBuf,
    pub sender: String,
    pub sender_source: ProvenanceSource,
    pub suggested_folder: String,
    pub folder: Option<String>,
    pub destination_path: Option<PathBuf>,
    pub status: OutcomeStatus,
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
struct Manifest<'a> {
    generated_at: DateTime<Utc>,
    source_dir: &'a Path,
    organize_root: &'a Path,
    total: usize,
    placed: usize,
    duplicates: usize,
    reused_folders: usize,
    failed: usize,
    files: &'a [IngestOutcome],
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Tally {
    pub placed: usize,
    pub duplicates: usize,
    pub reused_folders: usize,
    pub failed: usize,
}

impl Tally {
    pub fn from_outcomes(outcomes: &[IngestOutcome]) -> Self {
        let mut tally = Tally::default();
        for outcome in outcomes {
            match outcome.status {
                OutcomeStatus::Placed => tally.placed += 1,
                OutcomeStatus::ReusedFolder => {
                    tally.placed += 1;
                    tally.reused_folders += 1;
                }
                OutcomeStatus::Duplicate => tally.duplicates += 1,
                OutcomeStatus::Failed => tally.failed += 1,
            }
        }
        tally
    }
}

/// Write both artifacts and return `(markdown, json)` paths. Existing
/// reports are never overwritten; a numeric suffix is appended instead.
pub fn write_reports(
    config: &AppConfig,
    source_dir: &Path,
    outcomes: &[IngestOutcome],
    generated_at: DateTime<Utc>,
) -> Result<(PathBuf, PathBuf), Error> {
    let dir = config.reports_dir();
    fs::create_dir_all(&dir)?;

    let stamp = generated_at.format("%Y%m%d_%H%M%S").to_string();
    let (md_path, json_path) = free_report_paths(&dir, &stamp);
    let tally = Tally::from_outcomes(outcomes);

    let markdown = render_markdown(source_dir, outcomes, &tally, generated_at);
    fs::write(&md_path, markdown)?;

    let manifest = Manifest {
        generated_at,
        source_dir,
        organize_root: &config.organize_root,
        total: outcomes.len(),
        placed: tally.placed,
        duplicates: tally.duplicates,
        reused_folders: tally.reused_folders,
        failed: tally.failed,
        files: outcomes,
    };
    write_json_atomic(&json_path, &manifest)?;

    Ok((md_path, json_path))
}

fn free_report_paths(dir: &Path, stamp: &str) -> (PathBuf, PathBuf) {
    let mut suffix = 0usize;
    loop {
        let base = if suffix == 0 {
            format!("ingest_{}", stamp)
        } else {
            format!("ingest_{}_{}", stamp, suffix)
        };
        let md = dir.join(format!("{}.md", base));
        let json = dir.join(format!("{}.json", base));
        if !md.exists() && !json.exists() {
            return (md, json);
        }
        suffix += 1;
    }
}

fn render_markdown(
    source_dir: &Path,
    outcomes: &[IngestOutcome],
    tally: &Tally,
    generated_at: DateTime<Utc>,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# Ingest report\n");
    let _ = writeln!(out, "- Source: `{}`", source_dir.display());
    let _ = writeln!(out, "- Generated: {}", generated_at.to_rfc3339());
    let _ = writeln!(
        out,
        "- Files: {} total, {} placed ({} into existing folders), {} duplicates, {} failed\n",
        outcomes.len(),
        tally.placed,
        tally.reused_folders,
        tally.duplicates,
        tally.failed
    );
    let _ = writeln!(out, "| File | Sender | Sender source | Destination folder | Outcome |");
    let _ = writeln!(out, "|------|--------|---------------|--------------------|---------|");
    for o in outcomes {
        let outcome = match &o.error {
            Some(err) => format!("{}: {}", o.status.as_str(), err),
            None => o.status.as_str().to_string(),
        };
        let _ = writeln!(
            out,
            "| {} | {} | {} | {} | {} |",
            cell(&o.file_name),
            cell(&o.sender),
            o.sender_source,
            cell(o.folder.as_deref().unwrap_or("-")),
            cell(&outcome)
        );
    }
    out
}

fn cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}
