use super::*;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericObservation {
    pub fragment_index: usize,
    pub page: u32,
    pub value: f64,
    pub number_text: String,
    pub scale: Option<String>,
    pub raw_unit: String,
    pub unit: String,
    pub start: usize,
    pub end: usize,
    pub matched_text: String,
    pub rule: String,
    pub excerpt: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedObservation {
    pub context: String,
    pub base_unit: String,
    pub factor: f64,
    pub normalized_value: f64,
    pub observation: NumericObservation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ObservationStatus {
    Normalized,
    Unclassified,
    UnrecognizedUnit,
}

impl ObservationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Normalized => "normalized",
            Self::Unclassified => "unclassified",
            Self::UnrecognizedUnit => "unrecognized_unit",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObservationRecord {
    #[serde(flatten)]
    pub observation: NumericObservation,
    pub status: ObservationStatus,
    pub contexts: Vec<String>,
    pub base_unit: Option<String>,
    pub normalized_value: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    High,
    Medium,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparedValue {
    pub page: u32,
    pub fragment_index: usize,
    pub value: f64,
    pub raw_unit: String,
    pub normalized_value: f64,
    pub excerpt: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterComparison {
    pub context: String,
    pub label: String,
    pub base_unit: String,
    pub member_count: usize,
    pub min_value: f64,
    pub max_value: f64,
    pub min_pages: Vec<u32>,
    pub max_pages: Vec<u32>,
    pub percent_difference: f64,
    pub severity: Option<Severity>,
    pub values: Vec<ComparedValue>,
}

impl ParameterComparison {
    pub fn is_flagged(&self) -> bool {
        self.severity.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitExample {
    pub page: u32,
    pub fragment_index: usize,
    pub value: f64,
    pub excerpt: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitUsage {
    pub unit: String,
    pub base_unit: String,
    pub occurrences: usize,
    pub examples: Vec<UnitExample>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitIssue {
    pub context: String,
    pub label: String,
    pub distinct_units: Vec<String>,
    pub recommended_unit: String,
    pub usages: Vec<UnitUsage>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryAssignment {
    pub fragment_index: usize,
    pub page: u32,
    pub categories: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryBreakdown {
    pub name: String,
    pub label: String,
    pub fragment_count: usize,
    pub pages: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryReport {
    pub assignments: Vec<CategoryAssignment>,
    pub breakdown: Vec<CategoryBreakdown>,
    pub uncategorized_fragments: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GapStatus {
    Present,
    Missing,
}

impl GapStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Present => "PRESENT",
            Self::Missing => "MISSING",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GapEvidence {
    pub page: u32,
    pub fragment_index: usize,
    pub location: Option<String>,
    pub excerpt: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GapFinding {
    pub id: String,
    pub name: String,
    pub status: GapStatus,
    pub matching_fragments: usize,
    pub evidence: Vec<GapEvidence>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GapSection {
    pub id: String,
    pub title: String,
    pub present: usize,
    pub total: usize,
    pub coverage: f64,
    pub findings: Vec<GapFinding>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GapReport {
    pub present: usize,
    pub total: usize,
    pub coverage: f64,
    pub sections: Vec<GapSection>,
}

impl GapReport {
    pub fn finding(&self, id: &str) -> Option<&GapFinding> {
        self.sections
            .iter()
            .flat_map(|section| section.findings.iter())
            .find(|finding| finding.id == id)
    }
}
