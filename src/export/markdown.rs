use super::*;

const MARKDOWN_EXCERPT_CHARS: usize = 160;

pub fn write_review(path: &Path, summary: &AnalysisSummary) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_directory(parent)?;
    }
    fs::write(path, render_review(summary))
        .with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), "wrote review markdown");
    Ok(())
}

pub fn render_review(summary: &AnalysisSummary) -> String {
    let mut lines = Vec::<String>::new();
    let document = &summary.document;
    let totals = &summary.totals;

    lines.push(format!("# ESIA QA Review: {}", document.name));
    lines.push(String::new());
    if let Some(filename) = &document.source_filename {
        lines.push(format!("- Source file: {filename}"));
    }
    if let Some(page_count) = document.page_count {
        lines.push(format!("- Pages: {page_count}"));
    }
    if let Some(table_count) = document.table_count {
        lines.push(format!("- Tables: {table_count}"));
    }
    lines.push(format!(
        "- Fragments analysed: {} across {} pages",
        document.fragment_count, document.pages_with_fragments
    ));
    lines.push(String::new());

    lines.push("## Overview".to_string());
    lines.push(String::new());
    lines.extend(markdown_table(&[
        vec!["Measure".to_string(), "Count".to_string()],
        vec!["Numeric observations".to_string(), totals.observations_extracted.to_string()],
        vec![
            "Normalized observations".to_string(),
            totals.normalized_observations.to_string(),
        ],
        vec!["Parameter comparisons".to_string(), totals.parameter_comparisons.to_string()],
        vec![
            "Consistency issues (HIGH / MEDIUM)".to_string(),
            format!(
                "{} ({} / {})",
                totals.consistency_issues,
                totals.high_severity_issues,
                totals.medium_severity_issues
            ),
        ],
        vec!["Unit issues".to_string(), totals.unit_issues.to_string()],
        vec![
            "Checklist items present".to_string(),
            format!(
                "{} of {} ({})",
                totals.gap_items_present,
                totals.gap_items_present + totals.gap_items_missing,
                format_percent(summary.gap_analysis.coverage * 100.0)
            ),
        ],
    ]));
    lines.push(String::new());

    push_consistency_section(&mut lines, summary);
    push_unit_section(&mut lines, summary);
    push_gap_section(&mut lines, summary);
    push_category_section(&mut lines, summary);

    let mut rendered = lines.join("\n");
    rendered.push('\n');
    rendered
}

fn push_consistency_section(lines: &mut Vec<String>, summary: &AnalysisSummary) {
    lines.push("## Consistency Issues".to_string());
    lines.push(String::new());

    if summary.consistency_issues.is_empty() {
        lines.push("No numeric contradictions exceeded the significance threshold.".to_string());
        lines.push(String::new());
        return;
    }

    for issue in &summary.consistency_issues {
        let severity = issue
            .severity
            .map(|severity| severity.as_str())
            .unwrap_or("INFO");
        lines.push(format!(
            "### [{severity}] {} ({} differs by {})",
            issue.label,
            issue.base_unit,
            format_percent(issue.percent_difference)
        ));
        lines.push(String::new());
        lines.push(format!(
            "Minimum {} {} on page(s) {}; maximum {} {} on page(s) {}.",
            format_number(issue.min_value),
            issue.base_unit,
            join_pages(&issue.min_pages),
            format_number(issue.max_value),
            issue.base_unit,
            join_pages(&issue.max_pages)
        ));
        lines.push(String::new());

        let mut rows = vec![vec![
            "Page".to_string(),
            "Stated".to_string(),
            format!("Normalized ({})", issue.base_unit),
            "Excerpt".to_string(),
        ]];
        for value in &issue.values {
            rows.push(vec![
                value.page.to_string(),
                format!("{} {}", format_number(value.value), value.raw_unit)
                    .trim()
                    .to_string(),
                format_number(value.normalized_value),
                excerpt_cell(&value.excerpt),
            ]);
        }
        lines.extend(markdown_table(&rows));
        lines.push(String::new());
    }
}

fn push_unit_section(lines: &mut Vec<String>, summary: &AnalysisSummary) {
    lines.push("## Unit Standardization".to_string());
    lines.push(String::new());

    if summary.unit_issues.is_empty() {
        lines.push("Each parameter is reported in a single unit.".to_string());
        lines.push(String::new());
        return;
    }

    for issue in &summary.unit_issues {
        lines.push(format!(
            "### {} (recommended unit: {})",
            issue.label,
            display_unit(&issue.recommended_unit)
        ));
        lines.push(String::new());

        let mut rows = vec![vec![
            "Unit".to_string(),
            "Occurrences".to_string(),
            "Example pages".to_string(),
            "Example".to_string(),
        ]];
        for usage in &issue.usages {
            let pages = usage
                .examples
                .iter()
                .map(|example| example.page)
                .collect::<Vec<u32>>();
            rows.push(vec![
                display_unit(&usage.unit),
                usage.occurrences.to_string(),
                join_pages(&pages),
                usage
                    .examples
                    .first()
                    .map(|example| excerpt_cell(&example.excerpt))
                    .unwrap_or_default(),
            ]);
        }
        lines.extend(markdown_table(&rows));
        lines.push(String::new());
    }
}

fn push_gap_section(lines: &mut Vec<String>, summary: &AnalysisSummary) {
    let gaps = &summary.gap_analysis;
    lines.push("## Completeness".to_string());
    lines.push(String::new());
    lines.push(format!(
        "Overall coverage: {} of {} items ({}).",
        gaps.present,
        gaps.total,
        format_percent(gaps.coverage * 100.0)
    ));
    lines.push(String::new());

    for section in &gaps.sections {
        lines.push(format!(
            "### {} ({}/{})",
            section.title, section.present, section.total
        ));
        lines.push(String::new());

        let mut rows = vec![vec![
            "Item".to_string(),
            "Status".to_string(),
            "Matches".to_string(),
            "Evidence".to_string(),
        ]];
        for finding in &section.findings {
            let evidence = finding
                .evidence
                .first()
                .map(|item| format!("p. {}: {}", item.page, excerpt_cell(&item.excerpt)))
                .unwrap_or_default();
            rows.push(vec![
                finding.name.clone(),
                finding.status.as_str().to_string(),
                finding.matching_fragments.to_string(),
                evidence,
            ]);
        }
        lines.extend(markdown_table(&rows));
        lines.push(String::new());
    }
}

fn push_category_section(lines: &mut Vec<String>, summary: &AnalysisSummary) {
    lines.push("## Fact Categories".to_string());
    lines.push(String::new());

    let mut rows = vec![vec![
        "Category".to_string(),
        "Fragments".to_string(),
        "Pages".to_string(),
    ]];
    for category in &summary.categories {
        rows.push(vec![
            category.label.clone(),
            category.fragment_count.to_string(),
            join_pages(&category.pages),
        ]);
    }
    rows.push(vec![
        "Uncategorized".to_string(),
        summary.uncategorized_fragments.to_string(),
        String::new(),
    ]);
    lines.extend(markdown_table(&rows));
}

fn markdown_table(rows: &[Vec<String>]) -> Vec<String> {
    let col_count = rows.iter().map(|row| row.len()).max().unwrap_or(1).max(1);
    let mut lines = Vec::<String>::new();

    for (index, row) in rows.iter().enumerate() {
        let mut cells = row
            .iter()
            .map(|cell| escape_cell(cell))
            .collect::<Vec<String>>();
        while cells.len() < col_count {
            cells.push(String::new());
        }
        lines.push(format!("| {} |", cells.join(" | ")));

        if index == 0 {
            lines.push(format!(
                "| {} |",
                (0..col_count).map(|_| "---").collect::<Vec<&str>>().join(" | ")
            ));
        }
    }

    lines
}

fn escape_cell(cell: &str) -> String {
    cell.replace('|', "\\|").replace('\n', " ")
}

fn excerpt_cell(excerpt: &str) -> String {
    truncate_chars(excerpt, MARKDOWN_EXCERPT_CHARS)
}

fn display_unit(unit: &str) -> String {
    if unit.is_empty() {
        "(no unit)".to_string()
    } else {
        unit.to_string()
    }
}

fn join_pages(pages: &[u32]) -> String {
    pages
        .iter()
        .map(u32::to_string)
        .collect::<Vec<String>>()
        .join(", ")
}

pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        let digits = format!("{}", value.abs() as u64);
        let mut grouped = String::new();
        for (index, digit) in digits.chars().enumerate() {
            if index > 0 && (digits.len() - index) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(digit);
        }
        if value < 0.0 {
            format!("-{grouped}")
        } else {
            grouped
        }
    } else {
        let rendered = format!("{value:.4}");
        rendered
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_string()
    }
}

fn format_percent(value: f64) -> String {
    format!("{value:.1}%")
}
