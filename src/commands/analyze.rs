use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use chrono::Utc;
use tracing::{info, warn};

use crate::cli::AnalyzeArgs;
use crate::config::AnalysisConfig;
use crate::engine::{AnalysisOutcome, AnalysisSummary, Engine, RunContext, assemble};
use crate::export::{write_findings, write_review};
use crate::input::{load_document_metadata, open_fragments};
use crate::model::{DocumentInfo, DocumentMetadata, RunCounts, RunManifest, RunPaths};
use crate::util::{
    ensure_directory, now_utc_string, sha256_file, utc_compact_string, write_json_lines,
    write_json_pretty,
};

#[cfg(test)]
mod tests;

const MANIFEST_VERSION: u32 = 1;

pub const SUMMARY_FILE: &str = "summary.json";
pub const OBSERVATIONS_FILE: &str = "observations.jsonl";
pub const FINDINGS_FILE: &str = "findings.sqlite";
pub const REVIEW_FILE: &str = "review.md";
pub const MANIFEST_FILE: &str = "run_manifest.json";

pub fn run(args: AnalyzeArgs) -> Result<()> {
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("run-{}", utc_compact_string(started_ts));

    let facts_path = resolve_input_path(&args.input_dir, &args.facts_file);
    let metadata_path = resolve_input_path(&args.input_dir, &args.metadata_file);
    if !facts_path.exists() {
        bail!(
            "fact fragments not found at {} (expected JSON Lines at input/facts.jsonl by default; use --input-dir or --facts-file)",
            facts_path.display()
        );
    }

    let config = AnalysisConfig::load(args.config_dir.as_deref())?;
    let metadata = load_document_metadata(&metadata_path)?;
    let document = DocumentInfo::new(
        document_name(&args, &facts_path, metadata.as_ref()),
        metadata.as_ref(),
    );

    info!(
        run_id = %run_id,
        facts = %facts_path.display(),
        config = %config.source.describe(),
        document = %document.name,
        "starting analysis"
    );

    let input_sha256 = sha256_file(&facts_path)?;
    let engine = Engine::new(&config)?;
    let mut reader = open_fragments(&facts_path)?;
    let mut outcome = engine.run(reader.by_ref(), RunContext::new());

    for skipped in reader.skipped() {
        outcome.context.record_skipped(skipped.line, &skipped.reason);
    }
    if let Some(error) = reader.read_error() {
        bail!("failed to read {}: {error}", facts_path.display());
    }
    if outcome.context.fragments_read == 0 {
        warn!(path = %facts_path.display(), "no fact fragments were read");
        outcome
            .context
            .warn(format!("no fact fragments were read from {}", facts_path.display()));
    }

    let summary = assemble(&outcome, &document);

    ensure_directory(&args.output_dir)?;
    let summary_path = args.output_dir.join(SUMMARY_FILE);
    let observations_path = args.output_dir.join(OBSERVATIONS_FILE);
    let manifest_path = args.output_dir.join(MANIFEST_FILE);

    write_json_pretty(&summary_path, &summary)?;
    write_json_lines(&observations_path, &outcome.records)?;
    info!(
        summary = %summary_path.display(),
        observations = %observations_path.display(),
        "wrote analysis outputs"
    );

    let sqlite_path = if args.skip_sqlite {
        None
    } else {
        let path = args.output_dir.join(FINDINGS_FILE);
        write_findings(&path, &run_id, &summary, &outcome.records)?;
        Some(path)
    };

    let review_path = if args.skip_markdown {
        None
    } else {
        let path = args.output_dir.join(REVIEW_FILE);
        write_review(&path, &summary)?;
        Some(path)
    };

    let manifest = RunManifest {
        manifest_version: MANIFEST_VERSION,
        run_id: run_id.clone(),
        status: "completed".to_string(),
        started_at,
        updated_at: now_utc_string(),
        command: render_analyze_command(&args),
        document_name: document.name.clone(),
        input_sha256,
        paths: RunPaths {
            input_dir: args.input_dir.display().to_string(),
            facts_path: facts_path.display().to_string(),
            metadata_path: metadata
                .as_ref()
                .map(|_| metadata_path.display().to_string()),
            config_source: config.source.describe(),
            output_dir: args.output_dir.display().to_string(),
            summary_path: summary_path.display().to_string(),
            observations_path: observations_path.display().to_string(),
            sqlite_path: sqlite_path.map(|path| path.display().to_string()),
            review_path: review_path.map(|path| path.display().to_string()),
        },
        counts: run_counts(&outcome, &summary),
        warnings: outcome.context.warning_lines(),
        notes: vec![
            "summary.json carries no timestamps; identical inputs and configuration yield a byte-identical summary."
                .to_string(),
            format!(
                "Thresholds: significance {} / high severity {}.",
                config.settings.significance_threshold, config.settings.high_severity_threshold
            ),
        ],
    };

    write_json_pretty(&manifest_path, &manifest)?;

    info!(path = %manifest_path.display(), "wrote run manifest");
    info!(
        fragments = summary.document.fragment_count,
        consistency_issues = summary.totals.consistency_issues,
        high_severity = summary.totals.high_severity_issues,
        unit_issues = summary.totals.unit_issues,
        gap_items_missing = summary.totals.gap_items_missing,
        "analysis completed"
    );

    Ok(())
}

fn resolve_input_path(input_dir: &Path, file: &Path) -> PathBuf {
    if file.is_absolute() {
        file.to_path_buf()
    } else {
        input_dir.join(file)
    }
}

fn document_name(
    args: &AnalyzeArgs,
    facts_path: &Path,
    metadata: Option<&DocumentMetadata>,
) -> String {
    if let Some(name) = args
        .document_name
        .as_ref()
        .map(|name| name.trim())
        .filter(|name| !name.is_empty())
    {
        return name.to_string();
    }

    metadata
        .and_then(|metadata| metadata.filename.as_deref())
        .map(Path::new)
        .or_else(|| facts_path.parent().filter(|parent| parent.file_name().is_some()))
        .and_then(|path| path.file_stem())
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string())
}

fn run_counts(outcome: &AnalysisOutcome, summary: &AnalysisSummary) -> RunCounts {
    RunCounts {
        fragments_read: outcome.context.fragments_read,
        records_skipped: outcome.context.records_skipped,
        observations_extracted: outcome.context.observations_extracted,
        normalized_observations: outcome.context.normalized_observations,
        parameter_comparisons: summary.totals.parameter_comparisons,
        consistency_issues: summary.totals.consistency_issues,
        high_severity_issues: summary.totals.high_severity_issues,
        unit_issues: summary.totals.unit_issues,
        gap_items_present: summary.totals.gap_items_present,
        gap_items_missing: summary.totals.gap_items_missing,
    }
}

fn render_analyze_command(args: &AnalyzeArgs) -> String {
    let mut command = vec![
        "esia-qa".to_string(),
        "analyze".to_string(),
        "--input-dir".to_string(),
        args.input_dir.display().to_string(),
        "--facts-file".to_string(),
        args.facts_file.display().to_string(),
        "--metadata-file".to_string(),
        args.metadata_file.display().to_string(),
        "--output-dir".to_string(),
        args.output_dir.display().to_string(),
    ];

    if let Some(path) = &args.config_dir {
        command.push("--config-dir".to_string());
        command.push(path.display().to_string());
    }
    if let Some(name) = &args.document_name {
        command.push("--document-name".to_string());
        command.push(name.clone());
    }
    if args.skip_sqlite {
        command.push("--skip-sqlite".to_string());
    }
    if args.skip_markdown {
        command.push("--skip-markdown".to_string());
    }

    command.join(" ")
}
