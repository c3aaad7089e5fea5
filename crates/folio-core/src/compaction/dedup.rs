use super::CompactionRun;
use crate::naming::file_stem;
use crate::scanner::{list_real_files, walk_folders};
use ahash::AHashMap;
use std::fs;
use std::iter;
use std::path::PathBuf;

/// Inside each folder, keep one file per content hash: the one with the
/// shortest name stem (decorated re-downloads tend to have longer names),
/// ties going to the lexicographically first name. The organize root counts
/// as a folder.
pub fn dedup_within_folders(run: &mut CompactionRun<'_>) {
    let config = run.config;
    let folders = iter::once(config.organize_root.clone())
        .chain(walk_folders(config, &config.organize_root));
    for dir in folders {
        let files = match list_real_files(config, &dir) {
            Ok(files) => files,
            Err(e) => {
                run.report
                    .error(format!("dedup: cannot read {}: {}", config.relative(&dir), e));
                continue;
            }
        };
        if files.len() < 2 {
            continue;
        }

        let mut by_hash: AHashMap<String, Vec<PathBuf>> = AHashMap::new();
        for file in files {
            match run.cache.get_content_hash(&file) {
                Ok(hash) => by_hash.entry(hash).or_default().push(file),
                Err(e) => run
                    .report
                    .error(format!("dedup: cannot hash {}: {}", config.relative(&file), e)),
            }
        }

        let mut groups: Vec<Vec<PathBuf>> =
            by_hash.into_values().filter(|g| g.len() > 1).collect();
        groups.sort();

        for mut group in groups {
            group.sort_by_key(|path| {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                (file_stem(&name).chars().count(), name)
            });
            let keep = group.remove(0);
            for duplicate in group {
                match fs::remove_file(&duplicate) {
                    Ok(()) => {
                        run.cache.forget(&duplicate);
                        run.ledger.forget(&duplicate);
                        run.report.deduped_files += 1;
                        run.report.log(format!(
                            "dedup: removed {} (same content as {})",
                            config.relative(&duplicate),
                            config.relative(&keep)
                        ));
                    }
                    Err(e) => run.report.error(format!(
                        "dedup: cannot delete {}: {}",
                        config.relative(&duplicate),
                        e
                    )),
                }
            }
        }
    }
}
