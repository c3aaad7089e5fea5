mod commands;
mod logging;
mod progress;

use std::path::Path;
use std::process;
use std::time::Duration;

use anyhow::Context;
use clap::{CommandFactory, Parser};
use colored::*;
use commands::{Cli, Commands};
use dotenv::dotenv;
use folio_core::collaborator::{CommandRenamer, ExtensionClassifier};
use folio_core::{
    AppConfig, BatchIngestor, CompactOptions, CompactionEngine, PlacementEngine,
    PlacementRequest,
};
use progress::CliReporter;
use tracing::{error, info, warn};

fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let _guard = logging::init_logger();

    let config = match folio_core::config::load_configuration() {
        Ok(config) => config,
        Err(err) => {
            error!("Error loading configuration: {}", err);
            process::exit(1);
        }
    };

    let args = Cli::parse();

    let result = match args.command {
        Some(Commands::Place {
            file,
            folder,
            entity,
            entity_type,
            sender,
        }) => run_place(&config, &file, &folder, entity, entity_type, sender),
        Some(Commands::Compact { dry_run, rename }) => run_compact(&config, dry_run, rename),
        Some(Commands::Ingest { dir, recursive }) => run_ingest(&config, &dir, recursive),
        Some(Commands::RebuildIndex) => run_rebuild_index(&config),
        Some(Commands::FindEntity { name }) => run_find_entity(&config, &name),
        Some(Commands::PrintConfig) => {
            println!("Configuration: {:#?}", config);
            Ok(())
        }
        None => {
            let _ = Cli::command().print_long_help();
            Ok(())
        }
    };

    if let Err(err) = result {
        error!("Error: {:#}", err);
        process::exit(1);
    }
    Ok(())
}

fn run_place(
    config: &AppConfig,
    file: &Path,
    folder: &str,
    entity: Option<String>,
    entity_type: Option<String>,
    sender: Option<String>,
) -> anyhow::Result<()> {
    let engine = PlacementEngine::new(config.clone());
    let mut request = PlacementRequest::new(file, folder);
    if let Some(entity) = entity {
        request = request.with_entity(entity, entity_type);
    }
    if let Some(sender) = sender {
        request = request
            .with_metadata("sender", sender)
            .with_metadata("sender_source", "manual");
    }

    let outcome = engine
        .place(&request)
        .with_context(|| format!("placing {}", file.display()))?;

    if outcome.skipped_duplicate {
        info!(
            "{} already stored as {}",
            file.display(),
            outcome.destination_path.display().to_string().yellow()
        );
    } else {
        info!(
            "Placed {} in {}{}",
            file.display(),
            outcome.folder.green(),
            if outcome.folder_reused { " (existing folder)" } else { "" }
        );
    }
    Ok(())
}

fn run_compact(config: &AppConfig, dry_run: bool, rename: bool) -> anyhow::Result<()> {
    let mut engine = CompactionEngine::new(config.clone());
    if rename {
        match &config.rename_command {
            Some(argv) => {
                let renamer = CommandRenamer::new(argv.clone())?
                    .with_timeout(Duration::from_secs(config.rename_timeout_secs));
                engine = engine.with_renamer(Box::new(renamer));
            }
            None => warn!("--rename given but no rename_command is configured; skipping renames"),
        }
    }

    let reporter = CliReporter::new();
    let report = engine.compact(
        &CompactOptions {
            dry_run,
            enable_rename: rename,
        },
        &reporter,
    )?;

    println!();
    for plan in &report.plans {
        info!(
            "{} <- {}",
            plan.target.cyan(),
            plan.sources.join(", ")
        );
    }
    if dry_run {
        info!(
            "Dry run: {} merge plans, nothing changed",
            format!("{}", report.plans.len()).cyan()
        );
        return Ok(());
    }
    info!(
        "{} files merged, {} duplicates removed, {} folders merged away, {} empty folders cleaned, {} renamed",
        format!("{}", report.merged_files).green(),
        format!("{}", report.deduped_files).red(),
        format!("{}", report.removed_folders).cyan(),
        format!("{}", report.empty_cleaned).cyan(),
        format!("{}", report.ai_renames).cyan(),
    );
    if report.errors > 0 {
        error!(
            "{} errors during compaction; see {}",
            format!("{}", report.errors).red(),
            config.cleanup_report_path().display()
        );
    }
    Ok(())
}

fn run_ingest(config: &AppConfig, dir: &Path, recursive: bool) -> anyhow::Result<()> {
    let ingestor = BatchIngestor::new(config.clone(), Box::new(ExtensionClassifier));
    let reporter = CliReporter::new();
    let summary = ingestor.ingest_directory(dir, recursive, &reporter)?;

    println!();
    info!(
        "{} files: {} placed ({} into existing folders), {} duplicates, {} failed",
        summary.total,
        format!("{}", summary.placed).green(),
        summary.reused_folders,
        format!("{}", summary.duplicates).yellow(),
        format!("{}", summary.failed).red(),
    );
    info!("Report: {}", summary.markdown_report.display());
    info!("Manifest: {}", summary.json_manifest.display());
    Ok(())
}

fn run_rebuild_index(config: &AppConfig) -> anyhow::Result<()> {
    let engine = CompactionEngine::new(config.clone());
    let index = engine.rebuild_index()?;
    info!(
        "Index rebuilt: {} files",
        format!("{}", index.total_files()).green()
    );
    Ok(())
}

fn run_find_entity(config: &AppConfig, name: &str) -> anyhow::Result<()> {
    let engine = PlacementEngine::new(config.clone());
    match engine.find_entity_folder(name)? {
        Some(folder) => println!("{}", folder),
        None => {
            info!("No folder recorded for {}", name.yellow());
            process::exit(2);
        }
    }
    Ok(())
}
