use super::CompactionRun;
use crate::fsops::remove_folder_if_empty;
use crate::scanner::walk_folders;

/// Remove, deepest first, every folder left holding nothing but its sidecar.
pub fn sweep_empty_folders(run: &mut CompactionRun<'_>) {
    let config = run.config;
    let mut folders = walk_folders(config, &config.organize_root);
    folders.sort_by_key(|p| std::cmp::Reverse(p.components().count()));

    for dir in folders {
        match remove_folder_if_empty(config, &dir) {
            Ok(true) => {
                run.report.empty_cleaned += 1;
                run.report
                    .log(format!("sweep: removed empty folder '{}'", config.relative(&dir)));
            }
            Ok(false) => {}
            Err(e) => run
                .report
                .error(format!("sweep: cannot remove {}: {}", config.relative(&dir), e)),
        }
    }
}
