use std::path::PathBuf;

use super::*;
use crate::config::AnalysisConfig;
use crate::engine::{AnalysisOutcome, Engine, RunContext, assemble};
use crate::model::{DocumentInfo, FactFragment};

fn temp_dir(label: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("esia-qa-export-{label}-{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).expect("temp dir");
    dir
}

fn sample_outcome(config: &AnalysisConfig) -> AnalysisOutcome {
    let engine = Engine::new(config).expect("engine should build");
    let fragments = vec![
        FactFragment::new(0, 5, "The construction workforce will peak at 3,000 people."),
        FactFragment::new(1, 12, "The study area covers 5,000 ha."),
        FactFragment::new(2, 30, "The study area covers 50,000,000 sq m."),
        FactFragment::new(3, 41, "The workforce will comprise 20 persons | two shifts."),
    ];
    engine.run(fragments, RunContext::new())
}

fn query_count(connection: &Connection, sql: &str) -> i64 {
    connection
        .query_row(sql, [], |row| row.get(0))
        .expect("count query")
}

#[test]
fn findings_database_holds_every_table() {
    let config = AnalysisConfig::embedded().expect("embedded config");
    let outcome = sample_outcome(&config);
    let summary = assemble(&outcome, &DocumentInfo::new("sample", None));
    let dir = temp_dir("sqlite");
    let path = dir.join("findings.sqlite");

    let counts =
        write_findings(&path, "run-test", &summary, &outcome.records).expect("write findings");
    assert_eq!(counts.observations, outcome.records.len());
    assert_eq!(counts.comparisons, 2);
    assert_eq!(counts.gap_findings, config.checklist.item_count());

    let connection = Connection::open(&path).expect("open findings");
    assert_eq!(
        query_count(&connection, "SELECT COUNT(*) FROM comparisons WHERE severity = 'HIGH'"),
        1
    );
    assert_eq!(
        query_count(&connection, "SELECT COUNT(*) FROM comparisons WHERE severity IS NULL"),
        1
    );
    assert_eq!(
        query_count(&connection, "SELECT COUNT(*) FROM comparison_values"),
        4
    );
    assert_eq!(
        query_count(
            &connection,
            "SELECT COUNT(*) FROM gap_findings WHERE item_id = 'location_coordinates' AND status = 'MISSING'"
        ),
        1
    );
    let run_id: String = connection
        .query_row("SELECT value FROM metadata WHERE key = 'run_id'", [], |row| {
            row.get(0)
        })
        .expect("run id row");
    assert_eq!(run_id, "run-test");
    drop(connection);

    write_findings(&path, "run-again", &summary, &outcome.records)
        .expect("rewriting replaces the previous database");

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn review_markdown_lists_issues_and_gaps() {
    let config = AnalysisConfig::embedded().expect("embedded config");
    let outcome = sample_outcome(&config);
    let summary = assemble(&outcome, &DocumentInfo::new("sample-esia", None));

    let review = render_review(&summary);
    assert!(review.starts_with("# ESIA QA Review: sample-esia"));
    assert!(review.contains("### [HIGH] Workforce"));
    assert!(review.contains("### Study Area (recommended unit: ha)"));
    assert!(review.contains("| Location Coordinates | MISSING | 0 |  |"));
    assert!(review.contains("20 persons \\| two shifts"));
    assert!(review.ends_with('\n'));
}

#[test]
fn format_number_groups_thousands() {
    assert_eq!(format_number(50_000_000.0), "50,000,000");
    assert_eq!(format_number(120.0), "120");
    assert_eq!(format_number(0.5), "0.5");
    assert_eq!(format_number(-1234.0), "-1,234");
}
