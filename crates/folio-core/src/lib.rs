pub mod collaborator;
pub mod compaction;
pub mod config;
pub mod error;
pub mod fsops;
pub mod hasher;
pub mod ingest;
pub mod lock;
pub mod naming;
pub mod placement;
pub mod progress;
pub mod scanner;
pub mod storage;

pub use collaborator::{Classification, Classifier, FolderRenamer};
pub use compaction::{CleanupReport, CompactOptions, CompactionEngine};
pub use config::AppConfig;
pub use error::Error;
pub use ingest::{BatchIngestor, IngestSummary};
pub use placement::{PlacementEngine, PlacementOutcome, PlacementRequest};
pub use progress::{ProgressReporter, SilentReporter};
pub use storage::{Index, IndexEntry};
