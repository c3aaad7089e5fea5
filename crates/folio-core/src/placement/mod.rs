//! The online write path: route one file into the tree without ever storing
//! the same bytes twice in a folder.

pub mod resolve;

pub use resolve::{resolve_folder, ResolvedFolder};

use crate::config::AppConfig;
use crate::error::Error;
use crate::fsops::{self, Destination};
use crate::hasher::hash_file;
use crate::lock::RootLock;
use crate::naming::{sanitize_folder_path, sanitize_segment};
use crate::scanner::list_real_files;
use crate::storage::sidecar;
use crate::storage::{FileProvenance, Index, IndexEntry};
use chrono::Utc;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Default)]
pub struct PlacementRequest {
    pub source_path: PathBuf,
    /// Destination hint, typically from a classifier. Untrusted.
    pub suggested_folder: String,
    pub entity: Option<String>,
    pub entity_type: Option<String>,
    pub metadata: BTreeMap<String, String>,
}

impl PlacementRequest {
    pub fn new(source_path: impl Into<PathBuf>, suggested_folder: impl Into<String>) -> Self {
        Self {
            source_path: source_path.into(),
            suggested_folder: suggested_folder.into(),
            ..Default::default()
        }
    }

    pub fn with_entity(mut self, entity: impl Into<String>, entity_type: Option<String>) -> Self {
        self.entity = Some(entity.into());
        self.entity_type = entity_type;
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacementOutcome {
    /// The new copy, or the existing file holding the same content.
    pub destination_path: PathBuf,
    /// Root-relative folder the file was routed to.
    pub folder: String,
    pub folder_reused: bool,
    pub skipped_duplicate: bool,
}

pub struct PlacementEngine {
    config: AppConfig,
}

impl PlacementEngine {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Place one file:
    /// 1. Validate the source (no side effects on failure)
    /// 2. Resolve the destination folder, reusing a similar existing one
    /// 3. Skip if the folder already holds identical content
    /// 4. Copy under a unique name, then update the index and sidecar
    ///
    /// The whole sequence runs under the root lock.
    pub fn place(&self, request: &PlacementRequest) -> Result<PlacementOutcome, Error> {
        let source = &request.source_path;
        let source_meta = match fs::metadata(source) {
            Ok(m) => m,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(Error::validation(format!(
                    "source file {} does not exist",
                    source.display()
                )))
            }
            Err(e) => return Err(e.into()),
        };
        if !source_meta.is_file() {
            return Err(Error::validation(format!(
                "source {} is not a regular file",
                source.display()
            )));
        }
        let file_name = source
            .file_name()
            .map(|n| sanitize_segment(&n.to_string_lossy()))
            .filter(|n| !n.is_empty())
            .ok_or_else(|| Error::validation(format!("{} has no usable file name", source.display())))?;
        let mut suggested =
            sanitize_folder_path(&request.suggested_folder, &self.config.default_folder)?;

        let _lock = RootLock::acquire(&self.config)?;
        let mut index = Index::open(&self.config)?;

        if let Some(entity) = request.entity.as_deref() {
            if let Some(top) = index.find_entity_folder(entity) {
                suggested = replace_top_segment(&suggested, &top);
                debug!("Entity '{}' pinned to top-level folder '{}'", entity, top);
            }
        }

        let resolved = resolve_folder(&self.config, &suggested);
        let dest_dir = self.config.organize_root.join(&resolved.relative);
        let source_hash = hash_file(source)?;

        if dest_dir.is_dir() {
            if let Some(existing) = find_by_hash(&self.config, &dest_dir, &source_hash)? {
                info!(
                    "Skipping {}: identical content already at {}",
                    source.display(),
                    existing.display()
                );
                return Ok(PlacementOutcome {
                    destination_path: existing,
                    folder: resolved.relative,
                    folder_reused: resolved.reused,
                    skipped_duplicate: true,
                });
            }
        }

        fs::create_dir_all(&dest_dir)?;
        let dest_path = match fsops::unique_destination(&dest_dir, &file_name, Some(&source_hash))? {
            Destination::Free(path) => path,
            Destination::SameContent(existing) => {
                return Ok(PlacementOutcome {
                    destination_path: existing,
                    folder: resolved.relative,
                    folder_reused: resolved.reused,
                    skipped_duplicate: true,
                });
            }
        };
        fsops::copy_preserving(source, &dest_path)?;

        let stored_name = dest_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or(file_name);
        let entry = IndexEntry {
            source_path: Some(source.to_string_lossy().into_owned()),
            organized_path: self.config.relative(&dest_path),
            folder: resolved.relative.clone(),
            file_name: stored_name.clone(),
            file_size: source_meta.len(),
            content_hash: Some(source_hash),
            entity: request.entity.clone(),
            entity_type: request.entity_type.clone(),
            metadata: request.metadata.clone(),
            organized_at: Utc::now(),
        };
        let provenance = FileProvenance::from_entry(&entry);
        index.upsert(entry);
        index.save()?;
        // the index already holds the entry; compaction rewrites sidecars from it
        if let Err(e) = sidecar::record_file(&self.config, &dest_dir, &stored_name, provenance) {
            warn!(
                "Placed {} but could not update the sidecar in {}: {}",
                stored_name,
                self.config.relative(&dest_dir),
                e
            );
        }

        info!(
            "Placed {} -> {}{}",
            source.display(),
            self.config.relative(&dest_path),
            if resolved.reused { " (reused folder)" } else { "" }
        );
        Ok(PlacementOutcome {
            destination_path: dest_path,
            folder: resolved.relative,
            folder_reused: resolved.reused,
            skipped_duplicate: false,
        })
    }

    /// Top-level folder previously used for `entity`, if any.
    pub fn find_entity_folder(&self, entity: &str) -> Result<Option<String>, Error> {
        Ok(Index::open(&self.config)?.find_entity_folder(entity))
    }
}

fn replace_top_segment(path: &str, top: &str) -> String {
    match path.split_once('/') {
        Some((_, rest)) => format!("{}/{}", top, rest),
        None => top.to_string(),
    }
}

fn find_by_hash(config: &AppConfig, dir: &Path, hash: &str) -> io::Result<Option<PathBuf>> {
    for file in list_real_files(config, dir)? {
        if hash_file(&file)? == hash {
            return Ok(Some(file));
        }
    }
    Ok(None)
}
