use std::fs;

use super::*;

fn temp_workspace(label: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("esia-qa-analyze-{label}-{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(dir.join("input")).expect("input dir");
    dir
}

fn args_for(workspace: &Path) -> AnalyzeArgs {
    AnalyzeArgs {
        input_dir: workspace.join("input"),
        facts_file: PathBuf::from("facts.jsonl"),
        metadata_file: PathBuf::from("document_metadata.json"),
        config_dir: None,
        output_dir: workspace.join("output"),
        document_name: None,
        skip_sqlite: false,
        skip_markdown: false,
    }
}

const FACTS: &str = concat!(
    "{\"text\": \"The construction workforce will peak at 3,000 people.\", \"page\": 5}\n",
    "{\"text\": \"The study area covers 5,000 ha.\", \"page\": 12}\n",
    "this line is not json\n",
    "\n",
    "{\"text\": \"The study area covers 50,000,000 sq m.\", \"page\": 30}\n",
    "{\"text\": \"The workforce will comprise 20 persons during operation.\", \"page_number\": 41}\n",
);

#[test]
fn render_analyze_command_includes_optional_flags() {
    let mut args = args_for(Path::new("/tmp/esia"));
    args.config_dir = Some(PathBuf::from("config"));
    args.document_name = Some("Solar ESIA".to_string());
    args.skip_sqlite = true;

    let command = render_analyze_command(&args);
    assert!(command.starts_with("esia-qa analyze --input-dir /tmp/esia/input"));
    assert!(command.contains("--config-dir config"));
    assert!(command.contains("--document-name Solar ESIA"));
    assert!(command.contains("--skip-sqlite"));
    assert!(!command.contains("--skip-markdown"));
}

#[test]
fn missing_fragment_file_names_expected_path() {
    let workspace = temp_workspace("missing");
    let error = run(args_for(&workspace)).expect_err("missing facts must fail");
    let message = error.to_string();
    assert!(message.contains("facts.jsonl"), "unexpected error: {message}");
    assert!(message.contains("input/facts.jsonl"));
    let _ = fs::remove_dir_all(&workspace);
}

#[test]
fn analyze_writes_all_outputs_and_stable_summary() {
    let workspace = temp_workspace("outputs");
    fs::write(workspace.join("input").join("facts.jsonl"), FACTS).expect("write facts");
    fs::write(
        workspace.join("input").join("document_metadata.json"),
        r#"{"filename": "solar-esia.pdf", "page_count": 180, "table_count": 22}"#,
    )
    .expect("write metadata");

    let args = args_for(&workspace);
    run(args.clone()).expect("first analysis run");
    let first = fs::read(args.output_dir.join(SUMMARY_FILE)).expect("read summary");
    run(args.clone()).expect("second analysis run");
    let second = fs::read(args.output_dir.join(SUMMARY_FILE)).expect("read summary again");
    assert_eq!(first, second);

    for file in [OBSERVATIONS_FILE, FINDINGS_FILE, REVIEW_FILE, MANIFEST_FILE] {
        assert!(args.output_dir.join(file).exists(), "{file} should exist");
    }

    let summary: serde_json::Value = serde_json::from_slice(&first).expect("summary json");
    assert_eq!(summary["document"]["name"], "solar-esia");
    assert_eq!(summary["document"]["page_count"], 180);
    assert_eq!(summary["document"]["fragment_count"], 4);
    assert_eq!(summary["totals"]["high_severity_issues"], 1);

    let raw_manifest = fs::read(args.output_dir.join(MANIFEST_FILE)).expect("read manifest");
    let manifest: RunManifest = serde_json::from_slice(&raw_manifest).expect("manifest json");
    assert_eq!(manifest.status, "completed");
    assert_eq!(manifest.counts.fragments_read, 4);
    assert_eq!(manifest.counts.records_skipped, 1);
    assert_eq!(manifest.input_sha256.len(), 64);
    assert!(manifest.run_id.starts_with("run-"));
    assert!(manifest.warnings.iter().any(|warning| warning.contains("line 3")));

    let observations = fs::read_to_string(args.output_dir.join(OBSERVATIONS_FILE))
        .expect("read observations");
    assert_eq!(observations.lines().count(), 4);

    let _ = fs::remove_dir_all(&workspace);
}

#[test]
fn skip_flags_suppress_optional_outputs() {
    let workspace = temp_workspace("skips");
    fs::write(workspace.join("input").join("facts.jsonl"), FACTS).expect("write facts");

    let mut args = args_for(&workspace);
    args.skip_sqlite = true;
    args.skip_markdown = true;
    args.document_name = Some("Named Run".to_string());
    run(args.clone()).expect("analysis run");

    assert!(args.output_dir.join(SUMMARY_FILE).exists());
    assert!(!args.output_dir.join(FINDINGS_FILE).exists());
    assert!(!args.output_dir.join(REVIEW_FILE).exists());

    let raw_manifest = fs::read(args.output_dir.join(MANIFEST_FILE)).expect("read manifest");
    let manifest: RunManifest = serde_json::from_slice(&raw_manifest).expect("manifest json");
    assert_eq!(manifest.document_name, "Named Run");
    assert!(manifest.paths.sqlite_path.is_none());
    assert!(manifest.paths.metadata_path.is_none());

    let _ = fs::remove_dir_all(&workspace);
}
