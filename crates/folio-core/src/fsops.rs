//! File operations shared by the placement and compaction paths.

use crate::config::{AppConfig, SIDECAR_FILE_NAME};
use crate::hasher::hash_file;
use crate::naming::numbered_name;
use std::fs::{self, FileTimes, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Where a file named `file_name` may land in `dir`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// Free path to write to.
    Free(PathBuf),
    /// A file with the same content already sits at this path.
    SameContent(PathBuf),
}

/// Find a free name in `dir`, appending `_1`, `_2`, ... on collision. When
/// `content_hash` is given, every occupied candidate is hashed and an equal
/// one is reported instead of allocating another name.
pub fn unique_destination(
    dir: &Path,
    file_name: &str,
    content_hash: Option<&str>,
) -> io::Result<Destination> {
    let mut candidate = dir.join(file_name);
    let mut n = 0usize;
    loop {
        if !candidate.exists() {
            return Ok(Destination::Free(candidate));
        }
        if let Some(hash) = content_hash {
            if candidate.is_file() && hash_file(&candidate)? == hash {
                return Ok(Destination::SameContent(candidate));
            }
        }
        n += 1;
        candidate = dir.join(numbered_name(file_name, n));
    }
}

/// Copy `from` to `to`, carrying over permissions and timestamps. A partial
/// copy is removed on failure; failing to set timestamps is not fatal.
pub fn copy_preserving(from: &Path, to: &Path) -> io::Result<()> {
    if let Err(e) = fs::copy(from, to) {
        if to.exists() {
            let _ = fs::remove_file(to);
        }
        return Err(e);
    }
    if let Err(e) = copy_times(from, to) {
        debug!("Could not carry timestamps to {}: {}", to.display(), e);
    }
    Ok(())
}

fn copy_times(from: &Path, to: &Path) -> io::Result<()> {
    let metadata = fs::metadata(from)?;
    let mut times = FileTimes::new().set_modified(metadata.modified()?);
    if let Ok(accessed) = metadata.accessed() {
        times = times.set_accessed(accessed);
    }
    let dest = OpenOptions::new().write(true).open(to)?;
    dest.set_times(times)
}

/// Rename `from` to `to`, falling back to copy-then-delete when a plain
/// rename is refused (for example across filesystems).
pub fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(rename_err) => {
            if !from.exists() || to.exists() {
                return Err(rename_err);
            }
            debug!(
                "rename {} -> {} failed ({}), copying instead",
                from.display(),
                to.display(),
                rename_err
            );
            copy_preserving(from, to)?;
            fs::remove_file(from)
        }
    }
}

/// Remove `dir` when nothing but its folder sidecar is left in it. Any other
/// entry, reserved or not, keeps the folder. Returns whether it was removed.
pub fn remove_folder_if_empty(config: &AppConfig, dir: &Path) -> io::Result<bool> {
    if dir == config.organize_root || !dir.starts_with(&config.organize_root) || !dir.is_dir() {
        return Ok(false);
    }
    let mut sidecar = None;
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_name() == SIDECAR_FILE_NAME && entry.file_type()?.is_file() {
            sidecar = Some(entry.path());
        } else {
            return Ok(false);
        }
    }
    if let Some(sidecar) = sidecar {
        fs::remove_file(sidecar)?;
    }
    fs::remove_dir(dir)?;
    Ok(true)
}

/// Remove `dir` if empty, then each now-empty ancestor up to (not
/// including) the organize root. Returns the removed directories.
pub fn prune_upwards(config: &AppConfig, dir: &Path) -> Vec<PathBuf> {
    let mut removed = Vec::new();
    let mut current = Some(dir.to_path_buf());
    while let Some(path) = current {
        match remove_folder_if_empty(config, &path) {
            Ok(true) => {
                current = path.parent().map(Path::to_path_buf);
                removed.push(path);
            }
            Ok(false) => break,
            Err(e) => {
                warn!("Could not remove {}: {}", path.display(), e);
                break;
            }
        }
    }
    removed
}
