use super::json::{read_json, write_json_atomic};
use super::models::{FileProvenance, FolderSidecar};
use crate::config::{AppConfig, SIDECAR_FILE_NAME};
use crate::error::Error;
use crate::scanner::list_real_files;
use chrono::Utc;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub fn sidecar_path(dir: &Path) -> PathBuf {
    dir.join(SIDECAR_FILE_NAME)
}

/// A missing or unreadable sidecar is treated as absent.
pub fn read_sidecar(dir: &Path) -> Option<FolderSidecar> {
    let path = sidecar_path(dir);
    match read_json::<FolderSidecar>(&path) {
        Ok(sidecar) => sidecar,
        Err(e) => {
            warn!("Ignoring unreadable sidecar {}: {}", path.display(), e);
            None
        }
    }
}

pub fn read_provenance(dir: &Path) -> BTreeMap<String, FileProvenance> {
    read_sidecar(dir).map(|s| s.provenance).unwrap_or_default()
}

/// Rewrite the sidecar of `dir` from its current real files. Provenance for
/// names no longer present is dropped.
pub fn write_sidecar(
    config: &AppConfig,
    dir: &Path,
    provenance: &BTreeMap<String, FileProvenance>,
) -> Result<FolderSidecar, Error> {
    let files: Vec<String> = list_real_files(config, dir)?
        .iter()
        .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .collect();

    let provenance = provenance
        .iter()
        .filter(|(name, _)| files.contains(name))
        .map(|(name, p)| (name.clone(), p.clone()))
        .collect();

    let sidecar = FolderSidecar {
        folder: config.relative(dir),
        file_count: files.len(),
        last_updated: Utc::now(),
        files,
        provenance,
    };
    write_json_atomic(&sidecar_path(dir), &sidecar)?;
    debug!("Sidecar for '{}' now lists {} files", sidecar.folder, sidecar.file_count);
    Ok(sidecar)
}

/// Record provenance for one newly placed file and refresh the sidecar.
pub fn record_file(
    config: &AppConfig,
    dir: &Path,
    file_name: &str,
    provenance: FileProvenance,
) -> Result<FolderSidecar, Error> {
    let mut existing = read_provenance(dir);
    existing.insert(file_name.to_string(), provenance);
    write_sidecar(config, dir, &existing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_sidecar_tracks_files_and_drops_stale_provenance() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let folder = root.join("clients/acme");
        fs::create_dir_all(&folder).unwrap();
        fs::write(folder.join("a.txt"), "a").unwrap();
        let config = AppConfig::new(root);

        let prov = FileProvenance {
            source_path: Some("/in/a.txt".to_string()),
            ..Default::default()
        };
        let sidecar = record_file(&config, &folder, "a.txt", prov.clone()).unwrap();
        assert_eq!(sidecar.folder, "clients/acme");
        assert_eq!(sidecar.file_count, 1);
        assert_eq!(sidecar.files, vec!["a.txt".to_string()]);

        fs::remove_file(folder.join("a.txt")).unwrap();
        fs::write(folder.join("b.txt"), "b").unwrap();
        let sidecar = write_sidecar(&config, &folder, &read_provenance(&folder)).unwrap();
        assert_eq!(sidecar.files, vec!["b.txt".to_string()]);
        assert!(sidecar.provenance.is_empty());
    }
}
