use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "folio")]
#[command(about = "Deduplicating file organizer", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Copy one file into the organized tree
    Place {
        /// File to place
        file: PathBuf,
        /// Suggested destination folder, relative to the organize root
        folder: String,
        /// Entity the file belongs to; routes to that entity's existing folder
        #[arg(long)]
        entity: Option<String>,
        #[arg(long)]
        entity_type: Option<String>,
        /// Record who sent the file
        #[arg(long)]
        sender: Option<String>,
    },
    /// Merge similar folders, remove duplicates and empty folders, rebuild the index
    Compact {
        /// Report the merge plan without touching the tree
        #[arg(long)]
        dry_run: bool,
        /// Ask the configured rename command for better folder labels
        #[arg(long)]
        rename: bool,
    },
    /// Place every file from a directory and write an ingest report
    Ingest {
        dir: PathBuf,
        #[arg(short, long)]
        recursive: bool,
    },
    /// Rebuild the index from the files on disk
    RebuildIndex,
    /// Show the top-level folder an entity is filed under
    FindEntity { name: String },
    /// Print configuration values
    PrintConfig,
}
