use super::CompactionRun;
use crate::collaborator::FolderRenamer;
use crate::naming::sanitize_segment;
use crate::scanner::{has_real_subdirs, list_real_files, walk_folders};
use std::fs;
use std::path::{Component, Path};

pub const RENAME_SAMPLE_SIZE: usize = 20;

/// Offer each second-level leaf folder to the renamer. Renamer failures and
/// occupied target names are logged and skipped.
pub fn rename_folders(run: &mut CompactionRun<'_>, renamer: &dyn FolderRenamer) {
    let config = run.config;
    let candidates: Vec<_> = walk_folders(config, &config.organize_root)
        .into_iter()
        .filter(|dir| config.relative(dir).split('/').count() == 2)
        .filter(|dir| matches!(has_real_subdirs(config, dir), Ok(false)))
        .collect();

    for dir in candidates {
        let current = match dir.file_name() {
            Some(name) => name.to_string_lossy().into_owned(),
            None => continue,
        };
        let sample: Vec<String> = match list_real_files(config, &dir) {
            Ok(files) => files
                .iter()
                .filter_map(|f| f.file_name().map(|n| n.to_string_lossy().into_owned()))
                .take(RENAME_SAMPLE_SIZE)
                .collect(),
            Err(e) => {
                run.report
                    .error(format!("rename: cannot read {}: {}", config.relative(&dir), e));
                continue;
            }
        };
        if sample.is_empty() {
            continue;
        }

        let label = match renamer.suggest_name(&current, &sample) {
            Ok(Some(label)) => sanitize_segment(&label),
            Ok(None) => continue,
            Err(e) => {
                run.report.log(format!(
                    "rename: renamer failed for '{}', keeping name: {}",
                    config.relative(&dir),
                    e
                ));
                continue;
            }
        };
        if label.is_empty() || label == current {
            continue;
        }
        if !is_single_segment(&label) {
            run.report.log(format!(
                "rename: rejected label '{}' for '{}'",
                label,
                config.relative(&dir)
            ));
            continue;
        }

        let Some(parent) = dir.parent() else { continue };
        let new_dir = parent.join(&label);
        if new_dir.parent() != Some(parent) || !new_dir.starts_with(&config.organize_root) {
            run.report.log(format!(
                "rename: '{}' would leave its parent, keeping '{}'",
                label,
                config.relative(&dir)
            ));
            continue;
        }
        if new_dir.exists() {
            run.report.log(format!(
                "rename: '{}' already exists, keeping '{}'",
                config.relative(&new_dir),
                config.relative(&dir)
            ));
            continue;
        }

        match fs::rename(&dir, &new_dir) {
            Ok(()) => {
                run.ledger.rekey_dir(&dir, &new_dir);
                run.report.ai_renames += 1;
                run.report.log(format!(
                    "rename: '{}' -> '{}'",
                    config.relative(&dir),
                    config.relative(&new_dir)
                ));
            }
            Err(e) => run
                .report
                .error(format!("rename: cannot rename {}: {}", config.relative(&dir), e)),
        }
    }
}

fn is_single_segment(label: &str) -> bool {
    let mut components = Path::new(label).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}
