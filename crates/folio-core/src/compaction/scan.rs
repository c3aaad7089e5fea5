use super::CompactionRun;
use crate::scanner::{has_real_subdirs, list_real_files, walk_folders};
use rayon::prelude::*;
use std::io;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct ScannedFile {
    pub path: PathBuf,
    pub name: String,
    pub hash: String,
}

/// A folder's real files with their content hashes. Folders with no real
/// files are kept with an empty list as pruning candidates.
#[derive(Debug, Clone)]
pub struct FolderScan {
    pub path: PathBuf,
    pub relative: String,
    pub files: Vec<ScannedFile>,
    pub has_subdirs: bool,
}

impl FolderScan {
    pub fn leaf_name(&self) -> &str {
        self.relative.rsplit('/').next().unwrap_or(&self.relative)
    }

    pub fn is_leaf(&self) -> bool {
        !self.has_subdirs
    }
}

/// Walk every non-reserved folder, hash its real files, and load sidecar
/// provenance into the run's ledger. Unreadable folders and files are
/// recorded as errors and left out.
pub fn scan_tree(run: &mut CompactionRun<'_>) -> Vec<FolderScan> {
    let config = run.config;
    let mut folders = Vec::new();

    for path in walk_folders(config, &config.organize_root) {
        let listing = list_real_files(config, &path)
            .and_then(|files| Ok((files, has_real_subdirs(config, &path)?)));
        let (files, has_subdirs) = match listing {
            Ok(listing) => listing,
            Err(e) => {
                run.report
                    .error(format!("scan: cannot read {}: {}", config.relative(&path), e));
                continue;
            }
        };

        let cache = run.cache;
        let hashed: Vec<Result<ScannedFile, (PathBuf, io::Error)>> = files
            .into_par_iter()
            .map(|file| match cache.get_content_hash(&file) {
                Ok(hash) => Ok(ScannedFile {
                    name: file
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_default(),
                    path: file,
                    hash,
                }),
                Err(e) => Err((file, e)),
            })
            .collect();

        let mut scanned = Vec::with_capacity(hashed.len());
        for result in hashed {
            match result {
                Ok(file) => scanned.push(file),
                Err((file, e)) => run
                    .report
                    .error(format!("scan: cannot hash {}: {}", config.relative(&file), e)),
            }
        }

        run.ledger.load_folder(&path);
        folders.push(FolderScan {
            relative: config.relative(&path),
            path,
            files: scanned,
            has_subdirs,
        });
    }

    let file_count: usize = folders.iter().map(|f| f.files.len()).sum();
    run.report.log(format!(
        "scan: {} folders, {} files",
        folders.len(),
        file_count
    ));
    folders
}
