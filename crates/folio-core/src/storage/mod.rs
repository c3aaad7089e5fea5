pub mod index;
pub mod json;
pub mod models;
pub mod sidecar;

pub use index::Index;
pub use models::{FileProvenance, FolderSidecar, IndexEntry, IndexFile};
