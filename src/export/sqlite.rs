use super::*;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FindingsRowCounts {
    pub observations: usize,
    pub comparisons: usize,
    pub unit_issues: usize,
    pub gap_findings: usize,
}

pub fn write_findings(
    path: &Path,
    run_id: &str,
    summary: &AnalysisSummary,
    records: &[ObservationRecord],
) -> Result<FindingsRowCounts> {
    if let Some(parent) = path.parent() {
        ensure_directory(parent)?;
    }
    remove_previous_database(path)?;

    let mut connection =
        Connection::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    configure_connection(&connection)?;
    ensure_schema(&connection)?;

    let tx = connection.transaction()?;
    insert_metadata(&tx, run_id, summary)?;
    let counts = FindingsRowCounts {
        observations: insert_observations(&tx, records)?,
        comparisons: insert_comparisons(&tx, &summary.parameter_comparisons)?,
        unit_issues: insert_unit_issues(&tx, &summary.unit_issues)?,
        gap_findings: insert_gap_findings(&tx, summary)?,
    };
    insert_categories(&tx, summary)?;
    tx.commit()?;

    info!(
        path = %path.display(),
        observations = counts.observations,
        comparisons = counts.comparisons,
        unit_issues = counts.unit_issues,
        gap_findings = counts.gap_findings,
        "wrote findings database"
    );

    Ok(counts)
}

fn remove_previous_database(path: &Path) -> Result<()> {
    for suffix in ["", "-wal", "-shm"] {
        let candidate = path.with_file_name(format!(
            "{}{suffix}",
            path.file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default()
        ));
        if candidate.exists() {
            fs::remove_file(&candidate)
                .with_context(|| format!("failed to remove {}", candidate.display()))?;
        }
    }
    Ok(())
}

fn configure_connection(connection: &Connection) -> Result<()> {
    connection
        .pragma_update(None, "journal_mode", "WAL")
        .context("failed to set journal_mode=WAL")?;
    connection
        .pragma_update(None, "synchronous", "NORMAL")
        .context("failed to set synchronous=NORMAL")?;
    Ok(())
}

fn ensure_schema(connection: &Connection) -> Result<()> {
    connection
        .execute_batch(
            "
        CREATE TABLE IF NOT EXISTS metadata (
          key TEXT PRIMARY KEY,
          value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS observations (
          observation_id INTEGER PRIMARY KEY,
          fragment_index INTEGER NOT NULL,
          page INTEGER NOT NULL,
          value REAL NOT NULL,
          number_text TEXT NOT NULL,
          scale TEXT,
          raw_unit TEXT NOT NULL,
          unit TEXT NOT NULL,
          span_start INTEGER NOT NULL,
          span_end INTEGER NOT NULL,
          rule TEXT NOT NULL,
          status TEXT NOT NULL,
          contexts TEXT NOT NULL,
          base_unit TEXT,
          normalized_value REAL,
          excerpt TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS comparisons (
          comparison_id INTEGER PRIMARY KEY,
          context TEXT NOT NULL,
          label TEXT NOT NULL,
          base_unit TEXT NOT NULL,
          member_count INTEGER NOT NULL,
          min_value REAL NOT NULL,
          max_value REAL NOT NULL,
          percent_difference REAL NOT NULL,
          severity TEXT,
          UNIQUE(context, base_unit)
        );

        CREATE TABLE IF NOT EXISTS comparison_values (
          comparison_id INTEGER NOT NULL REFERENCES comparisons(comparison_id),
          position INTEGER NOT NULL,
          page INTEGER NOT NULL,
          fragment_index INTEGER NOT NULL,
          value REAL NOT NULL,
          raw_unit TEXT NOT NULL,
          normalized_value REAL NOT NULL,
          excerpt TEXT NOT NULL,
          PRIMARY KEY(comparison_id, position)
        );

        CREATE TABLE IF NOT EXISTS unit_issues (
          context TEXT PRIMARY KEY,
          label TEXT NOT NULL,
          recommended_unit TEXT NOT NULL,
          distinct_units TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS unit_usages (
          context TEXT NOT NULL REFERENCES unit_issues(context),
          unit TEXT NOT NULL,
          base_unit TEXT NOT NULL,
          occurrences INTEGER NOT NULL,
          example_pages TEXT NOT NULL,
          PRIMARY KEY(context, unit)
        );

        CREATE TABLE IF NOT EXISTS gap_findings (
          item_id TEXT PRIMARY KEY,
          section_id TEXT NOT NULL,
          section_title TEXT NOT NULL,
          name TEXT NOT NULL,
          status TEXT NOT NULL,
          matching_fragments INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS gap_evidence (
          item_id TEXT NOT NULL REFERENCES gap_findings(item_id),
          position INTEGER NOT NULL,
          page INTEGER NOT NULL,
          fragment_index INTEGER NOT NULL,
          location TEXT,
          excerpt TEXT NOT NULL,
          PRIMARY KEY(item_id, position)
        );

        CREATE TABLE IF NOT EXISTS categories (
          name TEXT PRIMARY KEY,
          label TEXT NOT NULL,
          fragment_count INTEGER NOT NULL,
          pages TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_observations_page ON observations(page);
        CREATE INDEX IF NOT EXISTS idx_observations_status ON observations(status);
        CREATE INDEX IF NOT EXISTS idx_gap_findings_status ON gap_findings(status);
        ",
        )
        .context("failed to create findings schema")?;
    Ok(())
}

fn insert_metadata(tx: &Transaction<'_>, run_id: &str, summary: &AnalysisSummary) -> Result<()> {
    let mut statement = tx.prepare("INSERT INTO metadata(key, value) VALUES(?1, ?2)")?;
    let document = &summary.document;
    let entries = [
        ("schema_version", FINDINGS_SCHEMA_VERSION.to_string()),
        ("run_id", run_id.to_string()),
        ("document_name", document.name.clone()),
        (
            "source_filename",
            document.source_filename.clone().unwrap_or_default(),
        ),
        ("fragment_count", document.fragment_count.to_string()),
        (
            "gap_coverage",
            format!("{:.4}", summary.gap_analysis.coverage),
        ),
    ];
    for (key, value) in entries {
        statement.execute(params![key, value])?;
    }
    Ok(())
}

fn insert_observations(tx: &Transaction<'_>, records: &[ObservationRecord]) -> Result<usize> {
    let mut statement = tx.prepare(
        "
        INSERT INTO observations(
          observation_id, fragment_index, page, value, number_text, scale, raw_unit, unit,
          span_start, span_end, rule, status, contexts, base_unit, normalized_value, excerpt
        )
        VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
        ",
    )?;

    for (position, record) in records.iter().enumerate() {
        let observation = &record.observation;
        statement.execute(params![
            position as i64,
            observation.fragment_index as i64,
            observation.page,
            observation.value,
            &observation.number_text,
            observation.scale.as_deref(),
            &observation.raw_unit,
            &observation.unit,
            observation.start as i64,
            observation.end as i64,
            &observation.rule,
            record.status.as_str(),
            record.contexts.join(","),
            record.base_unit.as_deref(),
            record.normalized_value,
            &observation.excerpt,
        ])?;
    }

    Ok(records.len())
}

fn insert_comparisons(tx: &Transaction<'_>, comparisons: &[ParameterComparison]) -> Result<usize> {
    let mut comparison_statement = tx.prepare(
        "
        INSERT INTO comparisons(
          comparison_id, context, label, base_unit, member_count,
          min_value, max_value, percent_difference, severity
        )
        VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        ",
    )?;
    let mut value_statement = tx.prepare(
        "
        INSERT INTO comparison_values(
          comparison_id, position, page, fragment_index, value, raw_unit, normalized_value, excerpt
        )
        VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        ",
    )?;

    for (comparison_id, comparison) in comparisons.iter().enumerate() {
        comparison_statement.execute(params![
            comparison_id as i64,
            &comparison.context,
            &comparison.label,
            &comparison.base_unit,
            comparison.member_count as i64,
            comparison.min_value,
            comparison.max_value,
            comparison.percent_difference,
            comparison.severity.map(|severity| severity.as_str()),
        ])?;

        for (position, value) in comparison.values.iter().enumerate() {
            value_statement.execute(params![
                comparison_id as i64,
                position as i64,
                value.page,
                value.fragment_index as i64,
                value.value,
                &value.raw_unit,
                value.normalized_value,
                &value.excerpt,
            ])?;
        }
    }

    Ok(comparisons.len())
}

fn insert_unit_issues(tx: &Transaction<'_>, issues: &[UnitIssue]) -> Result<usize> {
    let mut issue_statement = tx.prepare(
        "
        INSERT INTO unit_issues(context, label, recommended_unit, distinct_units)
        VALUES(?1, ?2, ?3, ?4)
        ",
    )?;
    let mut usage_statement = tx.prepare(
        "
        INSERT INTO unit_usages(context, unit, base_unit, occurrences, example_pages)
        VALUES(?1, ?2, ?3, ?4, ?5)
        ",
    )?;

    for issue in issues {
        issue_statement.execute(params![
            &issue.context,
            &issue.label,
            &issue.recommended_unit,
            issue.distinct_units.join(","),
        ])?;

        for usage in &issue.usages {
            let pages = usage
                .examples
                .iter()
                .map(|example| example.page.to_string())
                .collect::<Vec<String>>()
                .join(",");
            usage_statement.execute(params![
                &issue.context,
                &usage.unit,
                &usage.base_unit,
                usage.occurrences as i64,
                pages,
            ])?;
        }
    }

    Ok(issues.len())
}

fn insert_gap_findings(tx: &Transaction<'_>, summary: &AnalysisSummary) -> Result<usize> {
    let mut finding_statement = tx.prepare(
        "
        INSERT INTO gap_findings(item_id, section_id, section_title, name, status, matching_fragments)
        VALUES(?1, ?2, ?3, ?4, ?5, ?6)
        ",
    )?;
    let mut evidence_statement = tx.prepare(
        "
        INSERT INTO gap_evidence(item_id, position, page, fragment_index, location, excerpt)
        VALUES(?1, ?2, ?3, ?4, ?5, ?6)
        ",
    )?;

    let mut inserted = 0;
    for section in &summary.gap_analysis.sections {
        for finding in &section.findings {
            finding_statement.execute(params![
                &finding.id,
                &section.id,
                &section.title,
                &finding.name,
                finding.status.as_str(),
                finding.matching_fragments as i64,
            ])?;
            inserted += 1;

            for (position, evidence) in finding.evidence.iter().enumerate() {
                evidence_statement.execute(params![
                    &finding.id,
                    position as i64,
                    evidence.page,
                    evidence.fragment_index as i64,
                    evidence.location.as_deref(),
                    &evidence.excerpt,
                ])?;
            }
        }
    }

    Ok(inserted)
}

fn insert_categories(tx: &Transaction<'_>, summary: &AnalysisSummary) -> Result<()> {
    let mut statement = tx.prepare(
        "
        INSERT INTO categories(name, label, fragment_count, pages)
        VALUES(?1, ?2, ?3, ?4)
        ",
    )?;
    for category in &summary.categories {
        let pages = category
            .pages
            .iter()
            .map(u32::to_string)
            .collect::<Vec<String>>()
            .join(",");
        statement.execute(params![
            &category.name,
            &category.label,
            category.fragment_count as i64,
            pages,
        ])?;
    }
    Ok(())
}
