use crate::config::AppConfig;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{error, warn};
use walkdir::{DirEntry, WalkDir};

/// Direct, non-reserved regular files of `dir`, sorted by name.
/// Symlinks are skipped.
pub fn list_real_files(config: &AppConfig, dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        if !file_type.is_file() || config.is_reserved_os(Some(entry.file_name().as_os_str())) {
            continue;
        }
        files.push(entry.path());
    }
    files.sort();
    Ok(files)
}

pub fn has_real_subdirs(config: &AppConfig, dir: &Path) -> io::Result<bool> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() && !config.is_reserved_os(Some(entry.file_name().as_os_str())) {
            return Ok(true);
        }
    }
    Ok(false)
}

fn is_reserved_entry(config: &AppConfig, entry: &DirEntry) -> bool {
    entry.depth() > 0 && config.is_reserved_os(Some(entry.file_name()))
}

/// Every non-reserved directory strictly below `root`, sorted by path.
/// Unreadable directories are logged and skipped.
pub fn walk_folders(config: &AppConfig, root: &Path) -> Vec<PathBuf> {
    let mut folders = Vec::new();
    let walker = WalkDir::new(root)
        .min_depth(1)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| !is_reserved_entry(config, e));

    for entry in walker {
        match entry {
            Ok(entry) if entry.file_type().is_dir() => folders.push(entry.into_path()),
            Ok(_) => {}
            Err(err) => log_walk_error(&err),
        }
    }
    folders.sort();
    folders
}

/// Every real file below `root`, including files directly in `root`.
pub fn walk_real_files(config: &AppConfig, root: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let walker = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| !is_reserved_entry(config, e));

    for entry in walker {
        match entry {
            Ok(entry) if entry.file_type().is_file() => files.push(entry.into_path()),
            Ok(_) => {}
            Err(err) => log_walk_error(&err),
        }
    }
    files.sort();
    files
}

pub(crate) fn log_walk_error(err: &walkdir::Error) {
    let path = err
        .path()
        .map(|p| p.display().to_string())
        .unwrap_or_default();
    match err.io_error().map(|e| e.kind()) {
        Some(io::ErrorKind::PermissionDenied) => {
            error!("Access denied reading directory {}: {}", path, err)
        }
        _ => warn!("Error walking {}: {}", path, err),
    }
}
