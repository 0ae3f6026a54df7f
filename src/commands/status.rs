use std::fs;

use anyhow::{Context, Result};
use rusqlite::Connection;
use tracing::{info, warn};

use crate::cli::StatusArgs;
use crate::commands::analyze::{FINDINGS_FILE, MANIFEST_FILE, SUMMARY_FILE};
use crate::model::RunManifest;

pub fn run(args: StatusArgs) -> Result<()> {
    let manifest_path = args.output_dir.join(MANIFEST_FILE);
    let summary_path = args.output_dir.join(SUMMARY_FILE);
    let db_path = args.output_dir.join(FINDINGS_FILE);

    info!(output_dir = %args.output_dir.display(), "status requested");

    if manifest_path.exists() {
        let raw = fs::read(&manifest_path)
            .with_context(|| format!("failed to read {}", manifest_path.display()))?;
        let manifest: RunManifest = serde_json::from_slice(&raw)
            .with_context(|| format!("failed to parse {}", manifest_path.display()))?;

        info!(
            run_id = %manifest.run_id,
            status = %manifest.status,
            started_at = %manifest.started_at,
            updated_at = %manifest.updated_at,
            document = %manifest.document_name,
            input_sha256 = %manifest.input_sha256,
            config_source = %manifest.paths.config_source,
            fragments = manifest.counts.fragments_read,
            skipped = manifest.counts.records_skipped,
            observations = manifest.counts.observations_extracted,
            consistency_issues = manifest.counts.consistency_issues,
            high_severity = manifest.counts.high_severity_issues,
            unit_issues = manifest.counts.unit_issues,
            gap_items_missing = manifest.counts.gap_items_missing,
            warnings = manifest.warnings.len(),
            command = %manifest.command,
            "loaded run manifest"
        );
    } else {
        warn!(path = %manifest_path.display(), "run manifest missing");
    }

    if summary_path.exists() {
        let raw = fs::read(&summary_path)
            .with_context(|| format!("failed to read {}", summary_path.display()))?;
        let summary: serde_json::Value = serde_json::from_slice(&raw)
            .with_context(|| format!("failed to parse {}", summary_path.display()))?;

        info!(
            document = %summary["document"]["name"].as_str().unwrap_or_default(),
            gap_coverage = summary["gap_analysis"]["coverage"].as_f64().unwrap_or_default(),
            parameter_comparisons = summary["totals"]["parameter_comparisons"].as_u64().unwrap_or_default(),
            "loaded summary"
        );
    } else {
        warn!(path = %summary_path.display(), "summary missing");
    }

    if db_path.exists() {
        let conn = Connection::open(&db_path)
            .with_context(|| format!("failed to open {}", db_path.display()))?;
        let observations = query_count(&conn, "SELECT COUNT(*) FROM observations").unwrap_or(0);
        let flagged =
            query_count(&conn, "SELECT COUNT(*) FROM comparisons WHERE severity IS NOT NULL")
                .unwrap_or(0);
        let missing = query_count(
            &conn,
            "SELECT COUNT(*) FROM gap_findings WHERE status = 'MISSING'",
        )
        .unwrap_or(0);

        info!(
            path = %db_path.display(),
            observations,
            flagged_comparisons = flagged,
            missing_items = missing,
            "findings database status"
        );
    } else {
        warn!(path = %db_path.display(), "findings database missing");
    }

    Ok(())
}

fn query_count(conn: &Connection, sql: &str) -> Result<i64> {
    let count = conn.query_row(sql, [], |row| row.get(0))?;
    Ok(count)
}
