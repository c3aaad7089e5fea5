use super::cluster::MergeGroup;
use super::report::MergePlan;
use super::scan::FolderScan;
use crate::naming::clean_folder_name;
use ahash::AHashMap;
use std::cmp::Ordering;

/// Pick the canonical folder of each group: most real files, then longest
/// cleaned name, then the lexicographically smallest path.
pub fn plan_merges(groups: &[MergeGroup], folders: &[FolderScan]) -> Vec<MergePlan> {
    let by_relative: AHashMap<&str, &FolderScan> =
        folders.iter().map(|f| (f.relative.as_str(), f)).collect();

    let mut plans = Vec::new();
    for group in groups {
        let mut members: Vec<(&String, usize, usize)> = group
            .iter()
            .map(|relative| {
                let file_count = by_relative
                    .get(relative.as_str())
                    .map(|f| f.files.len())
                    .unwrap_or(0);
                let leaf = relative.rsplit('/').next().unwrap_or(relative);
                let name_len = clean_folder_name(leaf).chars().count();
                (relative, file_count, name_len)
            })
            .collect();
        if members.len() < 2 {
            continue;
        }

        members.sort_by(|a, b| match b.1.cmp(&a.1) {
            Ordering::Equal => match b.2.cmp(&a.2) {
                Ordering::Equal => a.0.cmp(b.0),
                other => other,
            },
            other => other,
        });

        let target = members[0].0.clone();
        let sources = members[1..].iter().map(|m| m.0.clone()).collect();
        plans.push(MergePlan { target, sources });
    }
    plans
}
