use std::fs;
use std::path::Path;
use tempfile::tempdir;

use folio_core::compaction::CleanupReport;
use folio_core::scanner::{list_real_files, walk_real_files};
use folio_core::{
    AppConfig, CompactOptions, CompactionEngine, Error, FolderRenamer, Index, PlacementEngine,
    PlacementRequest, SilentReporter,
};

/// Layout:
///   root/
///     projX/                    a.txt ("alpha"), shared.txt ("SHARED")
///     projX_revised(1)/         b.txt ("beta"),  shared.txt ("SHARED")
///     projX_revised_20260101/   c.txt ("gamma"), shared copy.txt ("SHARED")
fn create_revision_tree(root: &Path) {
    let folders = [
        ("projX", "a.txt", "alpha", "shared.txt"),
        ("projX_revised(1)", "b.txt", "beta", "shared.txt"),
        ("projX_revised_20260101", "c.txt", "gamma", "shared copy.txt"),
    ];
    for (folder, name, content, shared) in folders {
        let dir = root.join(folder);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(name), content).unwrap();
        fs::write(dir.join(shared), "SHARED").unwrap();
    }
}

fn compact(config: &AppConfig) -> CleanupReport {
    CompactionEngine::new(config.clone())
        .compact(&CompactOptions::default(), &SilentReporter)
        .unwrap()
}

fn names_in(config: &AppConfig, dir: &Path) -> Vec<String> {
    list_real_files(config, dir)
        .unwrap()
        .iter()
        .map(|f| f.file_name().unwrap().to_string_lossy().into_owned())
        .collect()
}

#[test]
fn test_revision_folders_collapse_into_one() {
    let root = tempdir().unwrap();
    create_revision_tree(root.path());
    let config = AppConfig::new(root.path());

    let report = compact(&config);

    assert_eq!(report.plans.len(), 1);
    assert_eq!(report.plans[0].target, "projX");
    assert!(root.path().join("projX").is_dir());
    assert!(!root.path().join("projX_revised(1)").exists());
    assert!(!root.path().join("projX_revised_20260101").exists());

    // every distinct content survives exactly once
    assert_eq!(
        names_in(&config, &root.path().join("projX")),
        vec!["a.txt", "b.txt", "c.txt", "shared.txt"]
    );
    assert_eq!(report.deduped_files, 2);
    assert_eq!(report.merged_files, 2);
    assert_eq!(report.removed_folders, 2);
    assert_eq!(report.errors, 0);

    let index = Index::open(&config).unwrap();
    assert_eq!(index.total_files(), 4);
    assert_eq!(index.folder_count("projX"), 4);

    let persisted: CleanupReport = serde_json::from_str(
        &fs::read_to_string(config.cleanup_report_path()).unwrap(),
    )
    .unwrap();
    assert_eq!(persisted.deduped_files, 2);
    assert!(!persisted.dry_run);
}

#[test]
fn test_second_pass_is_a_noop() {
    let root = tempdir().unwrap();
    create_revision_tree(root.path());
    fs::create_dir_all(root.path().join("empty/deeper")).unwrap();
    let config = AppConfig::new(root.path());

    let first = compact(&config);
    assert!(!first.is_noop());

    let second = compact(&config);
    assert!(second.is_noop(), "second pass changed the tree: {:?}", second.log);
    assert!(second.plans.is_empty());
    assert_eq!(Index::open(&config).unwrap().total_files(), 4);
}

#[test]
fn test_dry_run_changes_nothing() {
    let root = tempdir().unwrap();
    create_revision_tree(root.path());
    let config = AppConfig::new(root.path());

    let report = CompactionEngine::new(config.clone())
        .compact(
            &CompactOptions {
                dry_run: true,
                enable_rename: false,
            },
            &SilentReporter,
        )
        .unwrap();

    assert!(report.dry_run);
    assert_eq!(report.plans.len(), 1);
    assert!(report.is_noop());
    for folder in ["projX", "projX_revised(1)", "projX_revised_20260101"] {
        assert_eq!(names_in(&config, &root.path().join(folder)).len(), 2);
    }
    assert!(config.cleanup_report_path().is_file());
    assert!(!config.index_path().exists());
}

#[test]
fn test_empty_folders_are_swept() {
    let root = tempdir().unwrap();
    let config = AppConfig::new(root.path());
    fs::create_dir_all(root.path().join("old/2019/q1")).unwrap();
    fs::create_dir_all(root.path().join("docs")).unwrap();
    fs::write(root.path().join("docs/readme.txt"), "hi").unwrap();
    fs::create_dir_all(root.path().join("stale")).unwrap();
    fs::write(root.path().join("stale/_folder_meta.json"), "{}").unwrap();

    let report = compact(&config);

    assert!(!root.path().join("old").exists());
    assert!(!root.path().join("stale").exists());
    assert!(root.path().join("docs/readme.txt").is_file());
    assert_eq!(report.empty_cleaned, 4);
}

#[test]
fn test_duplicates_inside_one_folder_keep_shortest_name() {
    let root = tempdir().unwrap();
    let config = AppConfig::new(root.path());
    let dir = root.path().join("photos");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("beach.jpg"), "sand").unwrap();
    fs::write(dir.join("beach (1).jpg"), "sand").unwrap();
    fs::write(dir.join("beach copy.jpg"), "sand").unwrap();
    fs::write(dir.join("sunset.jpg"), "sun").unwrap();

    let report = compact(&config);

    assert_eq!(report.deduped_files, 2);
    assert_eq!(names_in(&config, &dir), vec!["beach.jpg", "sunset.jpg"]);
}

#[test]
fn test_index_matches_tree_and_keeps_provenance() {
    let inbox = tempdir().unwrap();
    let root = tempdir().unwrap();
    let config = AppConfig::new(root.path());

    let contract = inbox.path().join("contract.pdf");
    fs::write(&contract, "terms").unwrap();
    PlacementEngine::new(config.clone())
        .place(
            &PlacementRequest::new(&contract, "vendors/acme")
                .with_entity("Acme", Some("company".to_string()))
                .with_metadata("sender", "alice"),
        )
        .unwrap();

    // a larger revision of the same folder becomes the merge target
    let revision = root.path().join("vendors/acme_v2");
    fs::create_dir_all(&revision).unwrap();
    for name in ["po1.pdf", "po2.pdf", "po3.pdf"] {
        fs::write(revision.join(name), name).unwrap();
    }

    let report = compact(&config);
    assert_eq!(report.plans[0].target, "vendors/acme_v2");
    assert!(!root.path().join("vendors/acme").exists());

    let index = Index::open(&config).unwrap();
    assert_eq!(index.total_files(), walk_real_files(&config, root.path()).len());
    let moved = index.get("vendors/acme_v2/contract.pdf").unwrap();
    assert_eq!(moved.entity.as_deref(), Some("Acme"));
    assert_eq!(moved.metadata.get("sender").map(String::as_str), Some("alice"));

    let rebuilt = CompactionEngine::new(config.clone()).rebuild_index().unwrap();
    let again = rebuilt.get("vendors/acme_v2/contract.pdf").unwrap();
    assert_eq!(again.entity_type.as_deref(), Some("company"));
    assert_eq!(again.organized_at, moved.organized_at);
}

struct LabelRenamer(&'static str);

impl FolderRenamer for LabelRenamer {
    fn suggest_name(&self, _folder_name: &str, sample: &[String]) -> Result<Option<String>, Error> {
        assert!(!sample.is_empty());
        Ok(Some(self.0.to_string()))
    }
}

struct PathRenamer(String);

impl FolderRenamer for PathRenamer {
    fn suggest_name(&self, _folder_name: &str, _sample: &[String]) -> Result<Option<String>, Error> {
        Ok(Some(self.0.clone()))
    }
}

struct OfflineRenamer;

impl FolderRenamer for OfflineRenamer {
    fn suggest_name(&self, _folder_name: &str, _sample: &[String]) -> Result<Option<String>, Error> {
        Err(Error::Collaborator("service unavailable".to_string()))
    }
}

#[test]
fn test_rename_uses_renamer_label() {
    let root = tempdir().unwrap();
    let config = AppConfig::new(root.path());
    let dir = root.path().join("documents/misc");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("1040.pdf"), "irs").unwrap();

    let options = CompactOptions {
        dry_run: false,
        enable_rename: true,
    };
    let report = CompactionEngine::new(config.clone())
        .with_renamer(Box::new(LabelRenamer("Tax: Returns")))
        .compact(&options, &SilentReporter)
        .unwrap();

    assert_eq!(report.ai_renames, 1);
    assert!(root.path().join("documents/Tax_ Returns/1040.pdf").is_file());
    assert!(Index::open(&config)
        .unwrap()
        .get("documents/Tax_ Returns/1040.pdf")
        .is_some());
}

#[test]
fn test_renamer_failure_keeps_names() {
    let root = tempdir().unwrap();
    let config = AppConfig::new(root.path());
    let dir = root.path().join("documents/misc");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("1040.pdf"), "irs").unwrap();

    let report = CompactionEngine::new(config)
        .with_renamer(Box::new(OfflineRenamer))
        .compact(
            &CompactOptions {
                dry_run: false,
                enable_rename: true,
            },
            &SilentReporter,
        )
        .unwrap();

    assert_eq!(report.ai_renames, 0);
    assert_eq!(report.errors, 0);
    assert!(dir.join("1040.pdf").is_file());
}

fn rename_with(config: &AppConfig, renamer: PathRenamer) -> CleanupReport {
    CompactionEngine::new(config.clone())
        .with_renamer(Box::new(renamer))
        .compact(
            &CompactOptions {
                dry_run: false,
                enable_rename: true,
            },
            &SilentReporter,
        )
        .unwrap()
}

#[test]
fn test_absolute_rename_label_stays_inside_root() {
    let outside = tempdir().unwrap();
    let root = tempdir().unwrap();
    let config = AppConfig::new(root.path());
    let dir = root.path().join("documents/misc");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("1040.pdf"), "irs").unwrap();

    let target = outside.path().join("stolen");
    let report = rename_with(&config, PathRenamer(target.to_string_lossy().into_owned()));

    assert!(!target.exists());
    let files = walk_real_files(&config, root.path());
    assert_eq!(files.len(), 1);
    let renamed_dir = files[0].parent().unwrap();
    assert_eq!(renamed_dir.parent(), Some(root.path().join("documents").as_path()));
    assert_eq!(report.errors, 0);
    assert_eq!(Index::open(&config).unwrap().total_files(), 1);
}

#[test]
fn test_traversing_rename_label_stays_under_its_parent() {
    let root = tempdir().unwrap();
    let config = AppConfig::new(root.path());
    let dir = root.path().join("documents/misc");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("1040.pdf"), "irs").unwrap();

    let report = rename_with(&config, PathRenamer("../../../escaped".to_string()));

    assert_eq!(report.ai_renames, 1);
    assert!(root.path().join("documents/escaped/1040.pdf").is_file());
    assert!(!root.path().join("escaped").exists());
    assert!(!root.path().parent().unwrap().join("escaped").exists());
}

#[test]
fn test_dot_only_rename_label_keeps_name() {
    let root = tempdir().unwrap();
    let config = AppConfig::new(root.path());
    let dir = root.path().join("documents/misc");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("1040.pdf"), "irs").unwrap();

    let report = rename_with(&config, PathRenamer("..".to_string()));

    assert_eq!(report.ai_renames, 0);
    assert!(dir.join("1040.pdf").is_file());
}

#[test]
fn test_merge_keeps_reserved_subfolders_of_sources() {
    let root = tempdir().unwrap();
    let config = AppConfig::new(root.path());
    let target = root.path().join("projX");
    let source = root.path().join("projX_revised(1)");
    fs::create_dir_all(&target).unwrap();
    fs::write(target.join("a.txt"), "alpha").unwrap();
    fs::create_dir_all(source.join("_drafts")).unwrap();
    fs::write(source.join("c.txt"), "gamma").unwrap();
    fs::write(source.join("_drafts/important.txt"), "draft").unwrap();
    fs::create_dir_all(root.path().join("repo/.git")).unwrap();
    fs::write(root.path().join("repo/.git/HEAD"), "ref").unwrap();

    let report = compact(&config);

    assert_eq!(report.plans.len(), 1);
    assert_eq!(names_in(&config, &target), vec!["a.txt", "c.txt"]);
    assert_eq!(
        fs::read_to_string(source.join("_drafts/important.txt")).unwrap(),
        "draft"
    );
    assert_eq!(fs::read_to_string(root.path().join("repo/.git/HEAD")).unwrap(), "ref");
    assert_eq!(report.removed_folders, 0);
    assert_eq!(report.empty_cleaned, 0);
    assert_eq!(report.errors, 0);
}

#[test]
fn test_duplicates_at_the_root_are_deduplicated() {
    let root = tempdir().unwrap();
    let config = AppConfig::new(root.path());
    fs::write(root.path().join("a.txt"), "same").unwrap();
    fs::write(root.path().join("a copy.txt"), "same").unwrap();
    fs::write(root.path().join("b.txt"), "other").unwrap();

    let report = compact(&config);

    assert_eq!(report.deduped_files, 1);
    assert_eq!(names_in(&config, root.path()), vec!["a.txt", "b.txt"]);
    assert_eq!(Index::open(&config).unwrap().total_files(), 2);
}
