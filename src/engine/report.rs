use super::*;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentHeader {
    pub name: String,
    pub source_filename: Option<String>,
    pub page_count: Option<u32>,
    pub table_count: Option<u32>,
    pub fragment_count: usize,
    pub pages_with_fragments: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryTotals {
    pub observations_extracted: usize,
    pub observations_classified: usize,
    pub observations_unclassified: usize,
    pub observations_unrecognized_unit: usize,
    pub normalized_observations: usize,
    pub parameter_comparisons: usize,
    pub consistency_issues: usize,
    pub high_severity_issues: usize,
    pub medium_severity_issues: usize,
    pub unit_issues: usize,
    pub gap_items_present: usize,
    pub gap_items_missing: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisSummary {
    pub document: DocumentHeader,
    pub totals: SummaryTotals,
    pub categories: Vec<CategoryBreakdown>,
    pub uncategorized_fragments: usize,
    pub parameter_comparisons: Vec<ParameterComparison>,
    pub consistency_issues: Vec<ParameterComparison>,
    pub unit_issues: Vec<UnitIssue>,
    pub gap_analysis: GapReport,
}

pub fn assemble(outcome: &AnalysisOutcome, document: &DocumentInfo) -> AnalysisSummary {
    let mut consistency_issues = outcome
        .consistency_issues()
        .cloned()
        .collect::<Vec<ParameterComparison>>();
    consistency_issues.sort_by(|left, right| {
        left.severity
            .cmp(&right.severity)
            .then(right.percent_difference.total_cmp(&left.percent_difference))
            .then(left.context.cmp(&right.context))
            .then(left.base_unit.cmp(&right.base_unit))
    });

    let count_severity = |severity: Severity| {
        consistency_issues
            .iter()
            .filter(|issue| issue.severity == Some(severity))
            .count()
    };
    let high_severity_issues = count_severity(Severity::High);
    let medium_severity_issues = count_severity(Severity::Medium);

    let context = &outcome.context;
    let totals = SummaryTotals {
        observations_extracted: context.observations_extracted,
        observations_classified: context.observations_classified,
        observations_unclassified: context.observations_unclassified,
        observations_unrecognized_unit: context.observations_unrecognized_unit,
        normalized_observations: context.normalized_observations,
        parameter_comparisons: outcome.comparisons.len(),
        consistency_issues: consistency_issues.len(),
        high_severity_issues,
        medium_severity_issues,
        unit_issues: outcome.unit_issues.len(),
        gap_items_present: outcome.gaps.present,
        gap_items_missing: outcome.gaps.total - outcome.gaps.present,
    };

    AnalysisSummary {
        document: DocumentHeader {
            name: document.name.clone(),
            source_filename: document.source_filename.clone(),
            page_count: document.page_count,
            table_count: document.table_count,
            fragment_count: context.fragments_read,
            pages_with_fragments: context.pages.len(),
        },
        totals,
        categories: outcome.categories.breakdown.clone(),
        uncategorized_fragments: outcome.categories.uncategorized_fragments,
        parameter_comparisons: outcome.comparisons.clone(),
        consistency_issues,
        unit_issues: outcome.unit_issues.clone(),
        gap_analysis: outcome.gaps.clone(),
    }
}
