//! Name handling shared by placement and compaction: sanitation of
//! suggested paths, stripping of revision decorations, and fuzzy scoring.

pub mod clean;
pub mod file_name;
pub mod sanitize;
pub mod similarity;

pub use clean::clean_folder_name;
pub use file_name::{file_stem, numbered_name};
pub use sanitize::{sanitize_folder_path, sanitize_segment};
pub use similarity::{cluster_similar, placement_score, sequence_ratio};
