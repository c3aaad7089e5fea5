//! Batch ingestion: walk a source directory, work out who sent each file,
//! ask the classifier where it goes, and hand it to the placement engine.

pub mod provenance;
pub mod report;

pub use provenance::{extract_provenance, Provenance, ProvenanceSource};
pub use report::{IngestOutcome, OutcomeStatus};

use crate::collaborator::{Classification, Classifier};
use crate::config::AppConfig;
use crate::error::Error;
use crate::placement::{PlacementEngine, PlacementRequest};
use crate::progress::ProgressReporter;
use crate::scanner::walk::log_walk_error;
use chrono::Utc;
use glob::Pattern;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

#[derive(Debug, Clone, Serialize)]
pub struct IngestSummary {
    pub source_dir: PathBuf,
    pub total: usize,
    pub placed: usize,
    pub duplicates: usize,
    pub reused_folders: usize,
    pub failed: usize,
    pub markdown_report: PathBuf,
    pub json_manifest: PathBuf,
    pub outcomes: Vec<IngestOutcome>,
}

pub struct BatchIngestor {
    placement: PlacementEngine,
    classifier: Box<dyn Classifier>,
}

impl BatchIngestor {
    pub fn new(config: AppConfig, classifier: Box<dyn Classifier>) -> Self {
        Self {
            placement: PlacementEngine::new(config),
            classifier,
        }
    }

    pub fn config(&self) -> &AppConfig {
        self.placement.config()
    }

    pub fn ingest_directory(
        &self,
        source_dir: &Path,
        recursive: bool,
        reporter: &dyn ProgressReporter,
    ) -> Result<IngestSummary, Error> {
        if !source_dir.is_dir() {
            return Err(Error::validation(format!(
                "source directory {} does not exist or is not a directory",
                source_dir.display()
            )));
        }
        let source_dir = source_dir.canonicalize()?;

        reporter.on_phase_start("collect");
        let files = self.collect_files(&source_dir, recursive);
        reporter.on_phase_complete("collect", &format!("{} files", files.len()));
        info!("Ingesting {} files from {}", files.len(), source_dir.display());

        reporter.on_phase_start("place");
        let total = files.len();
        let mut outcomes = Vec::with_capacity(total);
        for (i, file) in files.iter().enumerate() {
            let outcome = self.ingest_file(file);
            reporter.on_file_progress(i + 1, total, &file.to_string_lossy());
            outcomes.push(outcome);
        }

        let generated_at = Utc::now();
        let (markdown_report, json_manifest) =
            report::write_reports(self.config(), &source_dir, &outcomes, generated_at)?;
        let tally = report::Tally::from_outcomes(&outcomes);
        reporter.on_phase_complete(
            "place",
            &format!(
                "{} placed, {} duplicates, {} failed",
                tally.placed, tally.duplicates, tally.failed
            ),
        );
        info!(
            "Ingest complete: {} placed, {} duplicates, {} failed. Report: {}",
            tally.placed,
            tally.duplicates,
            tally.failed,
            markdown_report.display()
        );

        Ok(IngestSummary {
            source_dir,
            total,
            placed: tally.placed,
            duplicates: tally.duplicates,
            reused_folders: tally.reused_folders,
            failed: tally.failed,
            markdown_report,
            json_manifest,
            outcomes,
        })
    }

    fn collect_files(&self, source_dir: &Path, recursive: bool) -> Vec<PathBuf> {
        let config = self.config();
        let ignore = compile_patterns(&config.ignore_patterns);
        let organize_root = config.organize_root.canonicalize().ok();

        let walker = WalkDir::new(source_dir)
            .min_depth(1)
            .max_depth(if recursive { usize::MAX } else { 1 })
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| !skip_entry(config, &ignore, organize_root.as_deref(), e));

        let mut files = Vec::new();
        for entry in walker {
            match entry {
                Ok(entry) if entry.file_type().is_file() => files.push(entry.into_path()),
                Ok(_) => {}
                Err(err) => log_walk_error(&err),
            }
        }
        files.sort();
        files
    }

    fn ingest_file(&self, file: &Path) -> IngestOutcome {
        let file_name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let provenance = extract_provenance(file);
        debug!(
            "{}: sender {} ({})",
            file_name, provenance.sender, provenance.source
        );

        let classification = self.classifier.classify(file).unwrap_or_else(|e| {
            warn!(
                "Classifier failed for {}: {}. Falling back to {}",
                file.display(),
                e,
                self.config().default_folder
            );
            Classification {
                suggested_folder: self.config().default_folder.clone(),
                ..Classification::default()
            }
        });

        let mut request = PlacementRequest::new(file, classification.suggested_folder.clone())
            .with_metadata("sender", provenance.sender.clone())
            .with_metadata("sender_source", provenance.source.as_str());
        if let Some(entity) = classification.entity.as_deref() {
            request = request.with_entity(entity, classification.entity_type.clone());
        }

        let mut outcome = IngestOutcome {
            file_name,
            source_path: file.to_path_buf(),
            sender: provenance.sender,
            sender_source: provenance.source,
            suggested_folder: classification.suggested_folder,
            folder: None,
            destination_path: None,
            status: OutcomeStatus::Failed,
            error: None,
        };

        match self.placement.place(&request) {
            Ok(placed) => {
                outcome.status = if placed.skipped_duplicate {
                    OutcomeStatus::Duplicate
                } else if placed.folder_reused {
                    OutcomeStatus::ReusedFolder
                } else {
                    OutcomeStatus::Placed
                };
                outcome.folder = Some(placed.folder);
                outcome.destination_path = Some(placed.destination_path);
            }
            Err(e) => {
                warn!("Failed to place {}: {}", file.display(), e);
                outcome.error = Some(e.to_string());
            }
        }
        outcome
    }
}

fn compile_patterns(patterns: &[String]) -> Vec<Pattern> {
    patterns
        .iter()
        .filter_map(|p| match Pattern::new(p) {
            Ok(pattern) => Some(pattern),
            Err(e) => {
                warn!("Ignoring invalid ignore pattern {:?}: {}", p, e);
                None
            }
        })
        .collect()
}

fn skip_entry(
    config: &AppConfig,
    ignore: &[Pattern],
    organize_root: Option<&Path>,
    entry: &DirEntry,
) -> bool {
    if entry.depth() == 0 {
        return false;
    }
    if config.is_reserved_os(Some(entry.file_name())) {
        return true;
    }
    if organize_root == Some(entry.path()) {
        debug!("Skipping organize root inside source: {}", entry.path().display());
        return true;
    }
    let name = entry.file_name().to_string_lossy();
    ignore
        .iter()
        .any(|p| p.matches(&name) || p.matches_path(entry.path()))
}
