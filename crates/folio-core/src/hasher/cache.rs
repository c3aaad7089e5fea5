use super::content::hash_file;
use dashmap::DashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct Stamp {
    size: u64,
    modified_secs: u64,
    modified_nanos: u32,
}

/// Per-run memo of content hashes.
///
/// An entry is only reused while the file's size and modification time
/// (with subsecond precision) are unchanged, so an edited file is rehashed.
#[derive(Debug, Default)]
pub struct HashCache {
    entries: DashMap<PathBuf, (Stamp, String)>,
}

impl HashCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_content_hash(&self, file: &Path) -> io::Result<String> {
        let stamp = stamp_for(file)?;
        if let Some(entry) = self.entries.get(file) {
            if entry.0 == stamp {
                trace!("Found hash for {} in cache", file.display());
                return Ok(entry.1.clone());
            }
        }
        let hash = hash_file(file)?;
        trace!("No hash found for {} in cache, adding", file.display());
        self.entries.insert(file.to_path_buf(), (stamp, hash.clone()));
        Ok(hash)
    }

    /// Carry a cached hash across a rename.
    pub fn rekey(&self, from: &Path, to: &Path) {
        if let Some((_, value)) = self.entries.remove(from) {
            self.entries.insert(to.to_path_buf(), value);
        }
    }

    pub fn forget(&self, file: &Path) {
        self.entries.remove(file);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn stamp_for(file: &Path) -> io::Result<Stamp> {
    let metadata = fs::metadata(file)?;
    let modified = metadata
        .modified()?
        .duration_since(UNIX_EPOCH)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
    Ok(Stamp {
        size: metadata.len(),
        modified_secs: modified.as_secs(),
        modified_nanos: modified.subsec_nanos(),
    })
}
