use std::fs;
use std::path::Path;
use tempfile::tempdir;

use folio_core::scanner::list_real_files;
use folio_core::storage::FolderSidecar;
use folio_core::{
    AppConfig, CompactOptions, CompactionEngine, Error, Index, PlacementEngine, PlacementRequest,
    SilentReporter,
};

fn real_file_count(config: &AppConfig, dir: &Path) -> usize {
    list_real_files(config, dir).map(|f| f.len()).unwrap_or(0)
}

#[test]
fn test_place_dedups_and_reuses_similar_folder() {
    let inbox = tempdir().unwrap();
    let root = tempdir().unwrap();
    let config = AppConfig::new(root.path());
    let engine = PlacementEngine::new(config.clone());
    let acme = root.path().join("acme");

    let a = inbox.path().join("report.txt");
    fs::write(&a, "A").unwrap();
    let first = engine.place(&PlacementRequest::new(&a, "acme")).unwrap();
    assert!(!first.skipped_duplicate);
    assert!(!first.folder_reused);
    assert_eq!(first.folder, "acme");
    assert_eq!(first.destination_path, acme.join("report.txt"));

    let copy = inbox.path().join("report_copy.txt");
    fs::write(&copy, "A").unwrap();
    let second = engine
        .place(&PlacementRequest::new(&copy, "acme_revised"))
        .unwrap();
    assert_eq!(second.folder, "acme");
    assert!(second.folder_reused);
    assert!(second.skipped_duplicate);
    assert_eq!(second.destination_path, acme.join("report.txt"));
    assert_eq!(real_file_count(&config, &acme), 1);
    assert!(!root.path().join("acme_revised").exists());

    let b_dir = inbox.path().join("b");
    fs::create_dir_all(&b_dir).unwrap();
    let b = b_dir.join("report.txt");
    fs::write(&b, "B").unwrap();
    let third = engine.place(&PlacementRequest::new(&b, "acme")).unwrap();
    assert!(!third.skipped_duplicate);
    assert_eq!(third.destination_path, acme.join("report_1.txt"));
    assert_eq!(fs::read_to_string(acme.join("report_1.txt")).unwrap(), "B");
    assert_eq!(fs::read_to_string(acme.join("report.txt")).unwrap(), "A");
    assert_eq!(real_file_count(&config, &acme), 2);

    let index = Index::open(&config).unwrap();
    assert_eq!(index.total_files(), 2);
    assert_eq!(index.folder_count("acme"), 2);
}

#[test]
fn test_missing_source_has_no_side_effects() {
    let root = tempdir().unwrap();
    let config = AppConfig::new(root.path().join("organized"));
    let engine = PlacementEngine::new(config.clone());

    let err = engine
        .place(&PlacementRequest::new(root.path().join("ghost.pdf"), "acme"))
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    assert!(!config.organize_root.exists());
}

#[test]
fn test_parent_traversal_is_rejected() {
    let inbox = tempdir().unwrap();
    let root = tempdir().unwrap();
    let file = inbox.path().join("x.txt");
    fs::write(&file, "x").unwrap();

    let engine = PlacementEngine::new(AppConfig::new(root.path()));
    let err = engine
        .place(&PlacementRequest::new(&file, "../escape"))
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    assert!(!root.path().join("escape").exists());
    assert!(!inbox.path().parent().unwrap().join("escape").exists());
}

#[test]
fn test_unsafe_folder_names_are_sanitized() {
    let inbox = tempdir().unwrap();
    let root = tempdir().unwrap();
    let file = inbox.path().join("q.txt");
    fs::write(&file, "q").unwrap();

    let engine = PlacementEngine::new(AppConfig::new(root.path()));
    let outcome = engine
        .place(&PlacementRequest::new(&file, "  _taxes:2024?  "))
        .unwrap();
    assert_eq!(outcome.folder, "taxes_2024_");
    assert!(root.path().join("taxes_2024_/q.txt").is_file());

    let outcome = engine.place(&PlacementRequest::new(&file, "")).unwrap();
    assert_eq!(outcome.folder, "unsorted");
}

#[test]
fn test_index_paths_stay_unique_across_repeated_placements() {
    let inbox = tempdir().unwrap();
    let root = tempdir().unwrap();
    let config = AppConfig::new(root.path());
    let engine = PlacementEngine::new(config.clone());

    for i in 0..5 {
        let file = inbox.path().join("scan.pdf");
        fs::write(&file, format!("page {}", i)).unwrap();
        engine.place(&PlacementRequest::new(&file, "scans")).unwrap();
        engine.place(&PlacementRequest::new(&file, "scans")).unwrap();
    }

    let index = Index::open(&config).unwrap();
    let mut paths: Vec<&str> = index
        .entries()
        .iter()
        .map(|e| e.organized_path.as_str())
        .collect();
    let before = paths.len();
    paths.sort();
    paths.dedup();
    assert_eq!(paths.len(), before);
    assert_eq!(index.total_files(), 5);
    assert_eq!(real_file_count(&config, &root.path().join("scans")), 5);
}

#[test]
fn test_entity_routes_to_its_existing_top_folder() {
    let inbox = tempdir().unwrap();
    let root = tempdir().unwrap();
    let config = AppConfig::new(root.path());
    let engine = PlacementEngine::new(config.clone());

    let contract = inbox.path().join("contract.pdf");
    fs::write(&contract, "signed").unwrap();
    engine
        .place(
            &PlacementRequest::new(&contract, "clients/acme")
                .with_entity("Acme Corp", Some("company".to_string()))
                .with_metadata("sender", "alice"),
        )
        .unwrap();
    assert_eq!(
        engine.find_entity_folder("  acme   CORP ").unwrap().as_deref(),
        Some("clients")
    );

    let invoice = inbox.path().join("invoice.pdf");
    fs::write(&invoice, "due").unwrap();
    let outcome = engine
        .place(&PlacementRequest::new(&invoice, "invoices/2024").with_entity("acme corp", None))
        .unwrap();
    assert_eq!(outcome.folder, "clients/2024");
    assert!(!root.path().join("invoices").exists());

    let sidecar: FolderSidecar = serde_json::from_str(
        &fs::read_to_string(root.path().join("clients/acme/_folder_meta.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(sidecar.file_count, 1);
    assert_eq!(sidecar.files, vec!["contract.pdf".to_string()]);
    assert_eq!(
        sidecar.provenance["contract.pdf"].metadata.get("sender").map(String::as_str),
        Some("alice")
    );
}

#[test]
fn test_unwritable_sidecar_does_not_fail_placement() {
    let inbox = tempdir().unwrap();
    let root = tempdir().unwrap();
    let config = AppConfig::new(root.path());
    let acme = root.path().join("acme");
    // a directory squatting on the sidecar name makes the sidecar write fail
    fs::create_dir_all(acme.join("_folder_meta.json")).unwrap();

    let invoice = inbox.path().join("invoice.pdf");
    fs::write(&invoice, "due").unwrap();
    let outcome = PlacementEngine::new(config.clone())
        .place(
            &PlacementRequest::new(&invoice, "acme")
                .with_entity("Acme", Some("company".to_string())),
        )
        .unwrap();
    assert!(!outcome.skipped_duplicate);
    assert_eq!(fs::read_to_string(acme.join("invoice.pdf")).unwrap(), "due");
    assert!(Index::open(&config).unwrap().get("acme/invoice.pdf").is_some());

    // a later compaction restores the sidecar from the index
    fs::remove_dir(acme.join("_folder_meta.json")).unwrap();
    CompactionEngine::new(config.clone())
        .compact(&CompactOptions::default(), &SilentReporter)
        .unwrap();
    let sidecar: FolderSidecar =
        serde_json::from_str(&fs::read_to_string(acme.join("_folder_meta.json")).unwrap())
            .unwrap();
    assert_eq!(
        sidecar.provenance.get("invoice.pdf").and_then(|p| p.entity.as_deref()),
        Some("Acme")
    );
    let rebuilt = Index::open(&config).unwrap();
    assert_eq!(
        rebuilt.get("acme/invoice.pdf").and_then(|e| e.entity.as_deref()),
        Some("Acme")
    );
}
