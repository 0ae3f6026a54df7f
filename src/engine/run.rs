use super::*;

const MAX_RECORDED_WARNINGS: usize = 50;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunContext {
    pub fragments_read: usize,
    pub records_skipped: usize,
    pub observations_extracted: usize,
    pub observations_classified: usize,
    pub observations_unclassified: usize,
    pub observations_unrecognized_unit: usize,
    pub normalized_observations: usize,
    pub pages: BTreeSet<u32>,
    pub warnings: Vec<String>,
    pub suppressed_warnings: usize,
}

impl RunContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_skipped(&mut self, line: usize, reason: &str) {
        self.records_skipped += 1;
        self.warn(format!("skipped input line {line}: {reason}"));
    }

    pub fn warn(&mut self, message: String) {
        if self.warnings.len() < MAX_RECORDED_WARNINGS {
            self.warnings.push(message);
        } else {
            self.suppressed_warnings += 1;
        }
    }

    pub fn warning_lines(&self) -> Vec<String> {
        let mut lines = self.warnings.clone();
        if self.suppressed_warnings > 0 {
            lines.push(format!(
                "{} further warnings suppressed",
                self.suppressed_warnings
            ));
        }
        lines
    }

    fn record_fragment(&mut self, fragment: &FactFragment) {
        self.fragments_read += 1;
        self.pages.insert(fragment.page);
    }

    fn record_observation(&mut self, status: ObservationStatus) {
        self.observations_extracted += 1;
        match status {
            ObservationStatus::Normalized => self.observations_classified += 1,
            ObservationStatus::Unclassified => self.observations_unclassified += 1,
            ObservationStatus::UnrecognizedUnit => self.observations_unrecognized_unit += 1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub context: RunContext,
    pub records: Vec<ObservationRecord>,
    pub normalized: Vec<NormalizedObservation>,
    pub comparisons: Vec<ParameterComparison>,
    pub unit_issues: Vec<UnitIssue>,
    pub categories: CategoryReport,
    pub gaps: GapReport,
}

impl AnalysisOutcome {
    pub fn consistency_issues(&self) -> impl Iterator<Item = &ParameterComparison> {
        self.comparisons
            .iter()
            .filter(|comparison| comparison.is_flagged())
    }
}

#[derive(Debug, Default)]
pub struct FragmentInspection {
    pub records: Vec<ObservationRecord>,
    pub normalized: Vec<NormalizedObservation>,
}

#[derive(Debug)]
pub struct Engine<'a> {
    config: &'a AnalysisConfig,
    extractor: ValueExtractor,
}

impl<'a> Engine<'a> {
    pub fn new(config: &'a AnalysisConfig) -> Result<Self> {
        let extractor = ValueExtractor::new(
            &config.units,
            &config.contexts,
            config.settings.observation_excerpt_chars,
        )?;
        Ok(Self { config, extractor })
    }

    pub fn extractor(&self) -> &ValueExtractor {
        &self.extractor
    }

    pub fn inspect(&self, fragment: &FactFragment) -> FragmentInspection {
        let mut inspection = FragmentInspection::default();

        for observation in self.extractor.extract(fragment) {
            let matched = classify(&self.config.contexts, &observation, &fragment.text);
            let conversion = self.config.units.normalize(&observation.unit, observation.value);

            let status = match (matched.is_empty(), conversion) {
                (true, _) => ObservationStatus::Unclassified,
                (false, None) => ObservationStatus::UnrecognizedUnit,
                (false, Some(_)) => ObservationStatus::Normalized,
            };

            if let Some(conversion) = conversion {
                for context in &matched {
                    inspection.normalized.push(NormalizedObservation {
                        context: context.name.clone(),
                        base_unit: conversion.base_unit.to_string(),
                        factor: conversion.factor,
                        normalized_value: conversion.value,
                        observation: observation.clone(),
                    });
                }
            }

            inspection.records.push(ObservationRecord {
                status,
                contexts: matched.iter().map(|context| context.name.clone()).collect(),
                base_unit: conversion.map(|value| value.base_unit.to_string()),
                normalized_value: conversion.map(|value| value.value),
                observation,
            });
        }

        inspection
    }

    pub fn run<I>(&self, fragments: I, mut context: RunContext) -> AnalysisOutcome
    where
        I: IntoIterator<Item = FactFragment>,
    {
        let mut categories = CategoryScan::new(&self.config.categories);
        let mut gaps = GapScan::new(&self.config.checklist, &self.config.settings);
        let mut records = Vec::new();
        let mut normalized = Vec::new();

        for fragment in fragments {
            context.record_fragment(&fragment);

            let inspection = self.inspect(&fragment);
            for record in &inspection.records {
                context.record_observation(record.status);
            }
            context.normalized_observations += inspection.normalized.len();
            records.extend(inspection.records);
            normalized.extend(inspection.normalized);

            categories.observe(&fragment);
            gaps.observe(&fragment);
        }

        let comparisons =
            check_consistency(&normalized, &self.config.contexts, &self.config.settings);
        let unit_issues =
            check_unit_standardization(&normalized, &self.config.contexts, &self.config.settings);
        let categories = categories.finish();
        let gaps = gaps.finish();

        info!(
            fragments = context.fragments_read,
            observations = context.observations_extracted,
            normalized = context.normalized_observations,
            unclassified = context.observations_unclassified,
            unrecognized_units = context.observations_unrecognized_unit,
            comparisons = comparisons.len(),
            consistency_issues = comparisons.iter().filter(|item| item.is_flagged()).count(),
            unit_issues = unit_issues.len(),
            gap_coverage = gaps.coverage,
            "analysis complete"
        );

        AnalysisOutcome {
            context,
            records,
            normalized,
            comparisons,
            unit_issues,
            categories,
            gaps,
        }
    }
}
