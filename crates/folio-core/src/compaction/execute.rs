use super::report::MergePlan;
use super::CompactionRun;
use crate::fsops::{self, Destination};
use crate::scanner::list_real_files;
use ahash::AHashSet;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Drain every source folder of every plan into its target. A file whose
/// content the target already holds is deleted; anything else is moved in,
/// renamed with a numeric suffix on a name clash. Drained sources and their
/// newly empty ancestors are removed.
pub fn execute_plans(run: &mut CompactionRun<'_>, plans: &[MergePlan]) {
    for plan in plans {
        execute_plan(run, plan);
    }
}

fn execute_plan(run: &mut CompactionRun<'_>, plan: &MergePlan) {
    let config = run.config;
    let target_dir = config.organize_root.join(&plan.target);
    let mut target_hashes = match current_hashes(run, &target_dir) {
        Ok(hashes) => hashes,
        Err(e) => {
            run.report
                .error(format!("merge: cannot read target '{}': {}", plan.target, e));
            return;
        }
    };

    for source in &plan.sources {
        let source_dir = config.organize_root.join(source);
        let files = match list_real_files(config, &source_dir) {
            Ok(files) => files,
            Err(e) => {
                run.report
                    .error(format!("merge: cannot read source '{}': {}", source, e));
                continue;
            }
        };

        for file in files {
            let hash = match run.cache.get_content_hash(&file) {
                Ok(hash) => hash,
                Err(e) => {
                    run.report
                        .error(format!("merge: cannot hash {}: {}", config.relative(&file), e));
                    continue;
                }
            };

            if target_hashes.contains(&hash) {
                match fs::remove_file(&file) {
                    Ok(()) => {
                        run.cache.forget(&file);
                        run.ledger.forget(&file);
                        run.report.deduped_files += 1;
                        run.report.log(format!(
                            "merge: dropped duplicate {} (already in '{}')",
                            config.relative(&file),
                            plan.target
                        ));
                    }
                    Err(e) => run.report.error(format!(
                        "merge: cannot delete {}: {}",
                        config.relative(&file),
                        e
                    )),
                }
                continue;
            }

            if let Err(e) = move_into(run, &file, &target_dir) {
                run.report
                    .error(format!("merge: cannot move {}: {}", config.relative(&file), e));
                continue;
            }
            target_hashes.insert(hash);
        }

        for removed in fsops::prune_upwards(config, &source_dir) {
            run.report.removed_folders += 1;
            run.report
                .log(format!("merge: removed folder '{}'", config.relative(&removed)));
        }
    }
}

fn move_into(run: &mut CompactionRun<'_>, file: &Path, target_dir: &Path) -> std::io::Result<()> {
    let name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let dest = match fsops::unique_destination(target_dir, &name, None)? {
        Destination::Free(path) | Destination::SameContent(path) => path,
    };
    fsops::move_file(file, &dest)?;
    run.cache.rekey(file, &dest);
    run.ledger.rekey(file, &dest);
    run.report.merged_files += 1;
    run.report.log(format!(
        "merge: moved {} -> {}",
        run.config.relative(file),
        run.config.relative(&dest)
    ));
    debug!("moved {} to {}", file.display(), dest.display());
    Ok(())
}

fn current_hashes(run: &CompactionRun<'_>, dir: &Path) -> std::io::Result<AHashSet<String>> {
    let mut hashes = AHashSet::new();
    for file in list_real_files(run.config, dir)? {
        hashes.insert(run.cache.get_content_hash(&file)?);
    }
    Ok(hashes)
}
