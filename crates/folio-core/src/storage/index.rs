use super::json::{read_json, write_json_atomic};
use super::models::{FileProvenance, IndexEntry, IndexFile};
use super::sidecar::read_provenance;
use crate::config::AppConfig;
use crate::error::Error;
use crate::hasher::HashCache;
use crate::scanner::walk_real_files;
use ahash::AHashMap;
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// The JSON metadata store. Derived data: it can always be regenerated from
/// the tree with [`Index::rebuild`].
#[derive(Debug)]
pub struct Index {
    path: PathBuf,
    data: IndexFile,
}

impl Index {
    /// Load the index at `path`. A missing file yields an empty index; a
    /// corrupt one is logged and replaced by an empty index.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let data = match read_json::<IndexFile>(path) {
            Ok(Some(data)) => data,
            Ok(None) => IndexFile::default(),
            Err(Error::Json(e)) => {
                warn!("Index {} is unreadable ({}), starting empty", path.display(), e);
                IndexFile::default()
            }
            Err(e) => return Err(e),
        };
        Ok(Self {
            path: path.to_path_buf(),
            data,
        })
    }

    pub fn open(config: &AppConfig) -> Result<Self, Error> {
        Self::load(&config.index_path())
    }

    pub fn save(&mut self) -> Result<(), Error> {
        self.data.total_files = self.data.entries.len();
        self.data.last_updated = Utc::now();
        write_json_atomic(&self.path, &self.data)
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.data.entries
    }

    pub fn data(&self) -> &IndexFile {
        &self.data
    }

    pub fn total_files(&self) -> usize {
        self.data.total_files
    }

    pub fn folder_count(&self, folder: &str) -> usize {
        self.data.folder_counts.get(folder).copied().unwrap_or(0)
    }

    pub fn get(&self, organized_path: &str) -> Option<&IndexEntry> {
        self.data
            .entries
            .iter()
            .find(|e| e.organized_path == organized_path)
    }

    /// Insert `entry`, or bump the timestamp of the entry already holding its
    /// `organized_path`. Returns true when a new row was appended.
    pub fn upsert(&mut self, entry: IndexEntry) -> bool {
        if let Some(existing) = self
            .data
            .entries
            .iter_mut()
            .find(|e| e.organized_path == entry.organized_path)
        {
            existing.organized_at = entry.organized_at;
            return false;
        }

        let folder = entry.folder.clone();
        self.data.entries.push(entry);
        let count = self
            .data
            .entries
            .iter()
            .filter(|e| e.folder == folder)
            .count();
        self.data.folder_counts.insert(folder, count);
        self.data.total_files = self.data.entries.len();
        true
    }

    /// Top-level folder segment most recently used for `entity`, compared
    /// case- and whitespace-insensitively.
    pub fn find_entity_folder(&self, entity: &str) -> Option<String> {
        let wanted = normalize_entity(entity);
        if wanted.is_empty() {
            return None;
        }
        self.data
            .entries
            .iter()
            .filter(|e| {
                e.entity
                    .as_deref()
                    .map(|name| normalize_entity(name) == wanted)
                    .unwrap_or(false)
            })
            .max_by_key(|e| e.organized_at)
            .and_then(|e| e.folder.split('/').find(|s| !s.is_empty()))
            .map(str::to_string)
    }

    /// Discard the index and regenerate it from the files now under the
    /// organize root. Provenance is restored from folder sidecars.
    pub fn rebuild(config: &AppConfig, cache: &HashCache) -> Result<Self, Error> {
        let root = &config.organize_root;
        let files = walk_real_files(config, root);
        info!("Rebuilding index from {} files", files.len());

        let mut provenance: AHashMap<PathBuf, BTreeMap<String, FileProvenance>> =
            AHashMap::new();
        for file in &files {
            if let Some(parent) = file.parent() {
                provenance
                    .entry(parent.to_path_buf())
                    .or_insert_with(|| read_provenance(parent));
            }
        }

        let mut entries: Vec<IndexEntry> = files
            .par_iter()
            .filter_map(|file| {
                let metadata = match fs::metadata(file) {
                    Ok(m) => m,
                    Err(e) => {
                        warn!("Skipping {} during rebuild: {}", file.display(), e);
                        return None;
                    }
                };
                let content_hash = match cache.get_content_hash(file) {
                    Ok(h) => Some(h),
                    Err(e) => {
                        warn!("Could not hash {}: {}", file.display(), e);
                        None
                    }
                };
                let file_name = file.file_name()?.to_string_lossy().into_owned();
                let parent = file.parent()?;
                let prov = provenance
                    .get(parent)
                    .and_then(|m| m.get(&file_name))
                    .cloned()
                    .unwrap_or_default();
                let modified: DateTime<Utc> = metadata
                    .modified()
                    .map(DateTime::<Utc>::from)
                    .unwrap_or_else(|_| Utc::now());

                Some(IndexEntry {
                    source_path: prov.source_path,
                    organized_path: config.relative(file),
                    folder: config.relative(parent),
                    file_name,
                    file_size: metadata.len(),
                    content_hash,
                    entity: prov.entity,
                    entity_type: prov.entity_type,
                    metadata: prov.metadata,
                    organized_at: prov.organized_at.unwrap_or(modified),
                })
            })
            .collect();
        entries.sort_by(|a, b| a.organized_path.cmp(&b.organized_path));

        let mut folder_counts = BTreeMap::new();
        for entry in &entries {
            *folder_counts.entry(entry.folder.clone()).or_insert(0) += 1;
        }

        let mut index = Self {
            path: config.index_path(),
            data: IndexFile {
                total_files: entries.len(),
                entries,
                folder_counts,
                last_updated: Utc::now(),
            },
        };
        index.save()?;
        debug!(
            "Index rebuilt: {} entries across {} folders",
            index.data.total_files,
            index.data.folder_counts.len()
        );
        Ok(index)
    }
}

fn normalize_entity(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
