use crate::config::AppConfig;
use crate::storage::sidecar::read_provenance;
use crate::storage::{FileProvenance, IndexEntry};
use ahash::AHashMap;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Provenance of every file seen during a pass, keyed by absolute path and
/// kept in step with moves, deletes and folder renames so it can be written
/// back into the surviving sidecars.
#[derive(Debug, Default)]
pub struct ProvenanceLedger {
    by_path: AHashMap<PathBuf, FileProvenance>,
}

impl ProvenanceLedger {
    pub fn load_folder(&mut self, dir: &Path) {
        for (name, provenance) in read_provenance(dir) {
            self.by_path.insert(dir.join(name), provenance);
        }
    }

    /// Take provenance from the previous index for files whose sidecar did
    /// not record them.
    pub fn fill_from_index(&mut self, config: &AppConfig, entries: &[IndexEntry]) {
        for entry in entries {
            self.by_path
                .entry(config.organize_root.join(&entry.organized_path))
                .or_insert_with(|| FileProvenance::from_entry(entry));
        }
    }

    pub fn rekey(&mut self, from: &Path, to: &Path) {
        if let Some(provenance) = self.by_path.remove(from) {
            self.by_path.insert(to.to_path_buf(), provenance);
        }
    }

    pub fn forget(&mut self, path: &Path) {
        self.by_path.remove(path);
    }

    /// Re-home every entry under `from` after a directory rename.
    pub fn rekey_dir(&mut self, from: &Path, to: &Path) {
        let moved: Vec<PathBuf> = self
            .by_path
            .keys()
            .filter(|p| p.starts_with(from))
            .cloned()
            .collect();
        for old in moved {
            if let (Some(provenance), Ok(rest)) = (self.by_path.remove(&old), old.strip_prefix(from)) {
                self.by_path.insert(to.join(rest), provenance);
            }
        }
    }

    pub fn for_folder(&self, dir: &Path) -> BTreeMap<String, FileProvenance> {
        self.by_path
            .iter()
            .filter(|(path, _)| path.parent() == Some(dir))
            .filter_map(|(path, p)| {
                path.file_name()
                    .map(|n| (n.to_string_lossy().into_owned(), p.clone()))
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.by_path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_path.is_empty()
    }
}
