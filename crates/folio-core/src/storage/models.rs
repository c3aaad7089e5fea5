use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One organized file. `organized_path` is unique across the index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub source_path: Option<String>,
    /// Root-relative, `/` separated.
    pub organized_path: String,
    /// Root-relative category path of the containing folder.
    pub folder: String,
    pub file_name: String,
    pub file_size: u64,
    pub content_hash: Option<String>,
    pub entity: Option<String>,
    pub entity_type: Option<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    pub organized_at: DateTime<Utc>,
}

/// On-disk shape of `_organize_index.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexFile {
    pub entries: Vec<IndexEntry>,
    pub total_files: usize,
    #[serde(default)]
    pub folder_counts: BTreeMap<String, usize>,
    pub last_updated: DateTime<Utc>,
}

impl Default for IndexFile {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            total_files: 0,
            folder_counts: BTreeMap::new(),
            last_updated: Utc::now(),
        }
    }
}

/// Index fields that cannot be recovered from the file itself. Kept in the
/// folder sidecar so they survive an index rebuild.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileProvenance {
    pub source_path: Option<String>,
    pub entity: Option<String>,
    pub entity_type: Option<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    pub organized_at: Option<DateTime<Utc>>,
}

impl FileProvenance {
    pub fn from_entry(entry: &IndexEntry) -> Self {
        Self {
            source_path: entry.source_path.clone(),
            entity: entry.entity.clone(),
            entity_type: entry.entity_type.clone(),
            metadata: entry.metadata.clone(),
            organized_at: Some(entry.organized_at),
        }
    }
}

/// On-disk shape of `_folder_meta.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FolderSidecar {
    pub folder: String,
    pub file_count: usize,
    pub last_updated: DateTime<Utc>,
    pub files: Vec<String>,
    #[serde(default)]
    pub provenance: BTreeMap<String, FileProvenance>,
}
