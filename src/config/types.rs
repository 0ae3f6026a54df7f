use super::*;

#[derive(Debug, Clone, Deserialize)]
pub struct UnitRegistryFile {
    pub quantities: Vec<QuantityDefinition>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuantityDefinition {
    pub quantity: String,
    pub base_unit: String,
    #[serde(default)]
    pub prefix: bool,
    pub units: Vec<UnitDefinition>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UnitDefinition {
    pub unit: String,
    pub factor: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContextsFile {
    pub contexts: Vec<ContextDefinition>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContextDefinition {
    pub name: String,
    #[serde(default)]
    pub label: Option<String>,
    pub patterns: Vec<String>,
    pub valid_units: Vec<String>,
    pub preferred_unit: String,
    #[serde(default)]
    pub proximity_chars: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CategoriesFile {
    pub categories: Vec<CategoryDefinition>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CategoryDefinition {
    pub name: String,
    #[serde(default)]
    pub label: Option<String>,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChecklistFile {
    pub sections: Vec<ChecklistSectionDefinition>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChecklistSectionDefinition {
    pub id: String,
    pub title: String,
    pub items: Vec<ChecklistItemDefinition>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChecklistItemDefinition {
    pub id: String,
    pub name: String,
    #[serde(alias = "pattern")]
    pub patterns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    pub significance_threshold: f64,
    pub high_severity_threshold: f64,
    pub max_evidence: usize,
    pub evidence_excerpt_chars: usize,
    pub observation_excerpt_chars: usize,
    pub unit_issue_examples: usize,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            significance_threshold: 0.05,
            high_severity_threshold: 0.20,
            max_evidence: 3,
            evidence_excerpt_chars: 200,
            observation_excerpt_chars: 160,
            unit_issue_examples: 2,
        }
    }
}

impl AnalysisSettings {
    pub fn validate(&self) -> Result<()> {
        if !self.significance_threshold.is_finite() || self.significance_threshold < 0.0 {
            bail!(
                "significance_threshold must be a non-negative number, found {}",
                self.significance_threshold
            );
        }
        if !self.high_severity_threshold.is_finite()
            || self.high_severity_threshold < self.significance_threshold
        {
            bail!(
                "high_severity_threshold ({}) must be at least significance_threshold ({})",
                self.high_severity_threshold,
                self.significance_threshold
            );
        }
        if self.max_evidence == 0 {
            bail!("max_evidence must be at least 1");
        }
        if self.evidence_excerpt_chars < MIN_EXCERPT_CHARS
            || self.observation_excerpt_chars < MIN_EXCERPT_CHARS
        {
            bail!("excerpt lengths must be at least {MIN_EXCERPT_CHARS} characters");
        }
        if self.unit_issue_examples == 0 {
            bail!("unit_issue_examples must be at least 1");
        }
        Ok(())
    }
}
