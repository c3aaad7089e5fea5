//! The offline maintenance path: merge near-duplicate folders, drop
//! duplicate content, prune empty folders, and regenerate the index from
//! what is left on disk.

pub mod cluster;
pub mod dedup;
pub mod execute;
pub mod ledger;
pub mod plan;
pub mod rename;
pub mod report;
pub mod scan;
pub mod sweep;

pub use cluster::MergeGroup;
pub use ledger::ProvenanceLedger;
pub use report::{CleanupReport, MergePlan};

use crate::collaborator::FolderRenamer;
use crate::config::AppConfig;
use crate::error::Error;
use crate::hasher::HashCache;
use crate::lock::RootLock;
use crate::progress::ProgressReporter;
use crate::scanner::{list_real_files, walk_folders};
use crate::storage::json::write_json_atomic;
use crate::storage::sidecar::write_sidecar;
use crate::storage::Index;
use chrono::Utc;
use std::time::Instant;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, Default)]
pub struct CompactOptions {
    /// Scan, cluster and plan only; leave the tree untouched.
    pub dry_run: bool,
    /// Offer second-level folders to the configured renamer.
    pub enable_rename: bool,
}

/// State threaded through the phases of one pass.
pub struct CompactionRun<'a> {
    pub config: &'a AppConfig,
    pub cache: &'a HashCache,
    pub ledger: ProvenanceLedger,
    pub report: CleanupReport,
}

impl<'a> CompactionRun<'a> {
    pub fn new(config: &'a AppConfig, cache: &'a HashCache, dry_run: bool) -> Self {
        Self {
            config,
            cache,
            ledger: ProvenanceLedger::default(),
            report: CleanupReport {
                dry_run,
                started_at: Some(Utc::now()),
                ..Default::default()
            },
        }
    }

    /// Rewrite the sidecar of every folder that still holds real files,
    /// carrying provenance collected in the ledger.
    pub fn refresh_sidecars(&mut self) {
        let config = self.config;
        let mut refreshed = 0usize;
        for dir in walk_folders(config, &config.organize_root) {
            match list_real_files(config, &dir) {
                Ok(files) if files.is_empty() => continue,
                Ok(_) => {}
                Err(e) => {
                    self.report
                        .error(format!("sidecar: cannot read {}: {}", config.relative(&dir), e));
                    continue;
                }
            }
            let provenance = self.ledger.for_folder(&dir);
            match write_sidecar(config, &dir, &provenance) {
                Ok(_) => refreshed += 1,
                Err(e) => self.report.error(format!(
                    "sidecar: cannot write for {}: {}",
                    config.relative(&dir),
                    e
                )),
            }
        }
        debug!("Refreshed {} sidecars", refreshed);
    }
}

pub struct CompactionEngine {
    config: AppConfig,
    cache: HashCache,
    renamer: Option<Box<dyn FolderRenamer>>,
}

impl CompactionEngine {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            cache: HashCache::new(),
            renamer: None,
        }
    }

    pub fn with_renamer(mut self, renamer: Box<dyn FolderRenamer>) -> Self {
        self.renamer = Some(renamer);
        self
    }

    /// Run a full compaction pass:
    /// 1. Scan folders and hash every real file
    /// 2. Cluster leaf folders by cleaned name similarity
    /// 3. Plan merges (canonical target per cluster)
    /// 4. Execute merges, dedup within folders, sweep empty folders
    /// 5. Optionally rename folders via the renamer
    /// 6. Refresh sidecars and rebuild the index
    ///
    /// Per-file failures are counted in the report, never fatal. The pass
    /// holds the root lock throughout.
    pub fn compact(
        &self,
        options: &CompactOptions,
        reporter: &dyn ProgressReporter,
    ) -> Result<CleanupReport, Error> {
        let _lock = RootLock::acquire(&self.config)?;
        let start = Instant::now();
        let mut run = CompactionRun::new(&self.config, &self.cache, options.dry_run);

        reporter.on_phase_start("scan");
        let folders = scan::scan_tree(&mut run);
        match Index::open(&self.config) {
            Ok(previous) => run.ledger.fill_from_index(&self.config, previous.entries()),
            Err(e) => warn!("Previous index unreadable, provenance comes from sidecars only: {}", e),
        }
        reporter.on_phase_complete("scan", &format!("{} folders", folders.len()));

        reporter.on_phase_start("plan");
        let groups = cluster::cluster_folders(&folders, &self.config.thresholds);
        let plans = plan::plan_merges(&groups, &folders);
        for p in &plans {
            run.report.log(format!(
                "plan: merge [{}] into '{}'",
                p.sources.join(", "),
                p.target
            ));
        }
        run.report.plans = plans.clone();
        reporter.on_phase_complete("plan", &format!("{} merge plans", plans.len()));

        if options.dry_run {
            run.report.log("dry run: no changes made");
            return self.finish(run, start);
        }

        reporter.on_phase_start("merge");
        execute::execute_plans(&mut run, &plans);
        reporter.on_phase_complete(
            "merge",
            &format!(
                "{} moved, {} duplicates dropped",
                run.report.merged_files, run.report.deduped_files
            ),
        );

        reporter.on_phase_start("dedup");
        dedup::dedup_within_folders(&mut run);
        reporter.on_phase_complete("dedup", &format!("{} duplicates", run.report.deduped_files));

        reporter.on_phase_start("sweep");
        sweep::sweep_empty_folders(&mut run);
        reporter.on_phase_complete("sweep", &format!("{} empty folders", run.report.empty_cleaned));

        if options.enable_rename {
            match self.renamer.as_deref() {
                Some(renamer) => {
                    reporter.on_phase_start("rename");
                    rename::rename_folders(&mut run, renamer);
                    reporter.on_phase_complete("rename", &format!("{} renamed", run.report.ai_renames));
                }
                None => run.report.log("rename: no renamer configured, skipping"),
            }
        }

        reporter.on_phase_start("index");
        run.refresh_sidecars();
        let index = Index::rebuild(&self.config, &self.cache)?;
        run.report
            .log(format!("index: rebuilt with {} files", index.total_files()));
        reporter.on_phase_complete("index", &format!("{} files", index.total_files()));

        self.finish(run, start)
    }

    /// Discard and regenerate the index from the tree, under the root lock.
    pub fn rebuild_index(&self) -> Result<Index, Error> {
        let _lock = RootLock::acquire(&self.config)?;
        Index::rebuild(&self.config, &self.cache)
    }

    fn finish(&self, run: CompactionRun<'_>, start: Instant) -> Result<CleanupReport, Error> {
        let mut report = run.report;
        report.finished_at = Some(Utc::now());
        write_json_atomic(&self.config.cleanup_report_path(), &report)?;
        info!(
            "Compaction finished in {:.2}s: {} merged, {} deduped, {} folders removed, {} empty cleaned, {} renamed, {} errors",
            start.elapsed().as_secs_f64(),
            report.merged_files,
            report.deduped_files,
            report.removed_folders,
            report.empty_cleaned,
            report.ai_renames,
            report.errors,
        );
        Ok(report)
    }
}
