use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FactFragment {
    pub index: usize,
    pub page: u32,
    pub text: String,
    pub section: Option<String>,
    pub headings: Vec<String>,
}

impl FactFragment {
    pub fn new(index: usize, page: u32, text: impl Into<String>) -> Self {
        Self {
            index,
            page,
            text: text.into(),
            section: None,
            headings: Vec::new(),
        }
    }

    pub fn location_label(&self) -> Option<&str> {
        self.section
            .as_deref()
            .or_else(|| self.headings.last().map(String::as_str))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FragmentRecord {
    pub text: String,
    #[serde(alias = "page_number")]
    pub page: u32,
    #[serde(default)]
    pub section: Option<String>,
    #[serde(default)]
    pub metadata: Option<FragmentRecordMetadata>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FragmentRecordMetadata {
    #[serde(default, alias = "breadcrumbs", alias = "heading_path")]
    pub headings: Vec<String>,
}

impl FragmentRecord {
    pub fn into_fragment(self, index: usize) -> FactFragment {
        FactFragment {
            index,
            page: self.page,
            text: self.text,
            section: self
                .section
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty()),
            headings: self
                .metadata
                .map(|metadata| metadata.headings)
                .unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentMetadata {
    #[serde(default, alias = "file_name", alias = "name")]
    pub filename: Option<String>,
    #[serde(default, alias = "pages")]
    pub page_count: Option<u32>,
    #[serde(default, alias = "tables")]
    pub table_count: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentInfo {
    pub name: String,
    pub source_filename: Option<String>,
    pub page_count: Option<u32>,
    pub table_count: Option<u32>,
}

impl DocumentInfo {
    pub fn new(name: impl Into<String>, metadata: Option<&DocumentMetadata>) -> Self {
        Self {
            name: name.into(),
            source_filename: metadata.and_then(|value| value.filename.clone()),
            page_count: metadata.and_then(|value| value.page_count),
            table_count: metadata.and_then(|value| value.table_count),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunPaths {
    pub input_dir: String,
    pub facts_path: String,
    pub metadata_path: Option<String>,
    pub config_source: String,
    pub output_dir: String,
    pub summary_path: String,
    pub observations_path: String,
    pub sqlite_path: Option<String>,
    pub review_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunCounts {
    pub fragments_read: usize,
    pub records_skipped: usize,
    pub observations_extracted: usize,
    pub normalized_observations: usize,
    pub parameter_comparisons: usize,
    pub consistency_issues: usize,
    pub high_severity_issues: usize,
    pub unit_issues: usize,
    pub gap_items_present: usize,
    pub gap_items_missing: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub status: String,
    pub started_at: String,
    pub updated_at: String,
    pub command: String,
    pub document_name: String,
    pub input_sha256: String,
    pub paths: RunPaths,
    pub counts: RunCounts,
    pub warnings: Vec<String>,
    pub notes: Vec<String>,
}
