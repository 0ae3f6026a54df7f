use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use regex::{Regex, RegexBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::units::{UnitRegistry, normalize_unit};

mod compiled;
#[cfg(test)]
mod tests;
mod types;

pub use compiled::*;
pub use types::*;

const MIN_EXCERPT_CHARS: usize = 20;

pub const UNITS_FILE: &str = "units.json";
pub const CONTEXTS_FILE: &str = "contexts.json";
pub const CATEGORIES_FILE: &str = "categories.json";
pub const CHECKLIST_FILE: &str = "checklist.json";
pub const ANALYSIS_FILE: &str = "analysis.json";

const EMBEDDED_UNITS: &str = include_str!("../../config/units.json");
const EMBEDDED_CONTEXTS: &str = include_str!("../../config/contexts.json");
const EMBEDDED_CATEGORIES: &str = include_str!("../../config/categories.json");
const EMBEDDED_CHECKLIST: &str = include_str!("../../config/checklist.json");
const EMBEDDED_ANALYSIS: &str = include_str!("../../config/analysis.json");

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    Embedded,
    Directory(PathBuf),
}

impl ConfigSource {
    pub fn describe(&self) -> String {
        match self {
            Self::Embedded => "embedded defaults".to_string(),
            Self::Directory(path) => path.display().to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub source: ConfigSource,
    pub units: UnitRegistry,
    pub contexts: Vec<ParameterContext>,
    pub categories: Vec<FactCategory>,
    pub checklist: Checklist,
    pub settings: AnalysisSettings,
}

#[derive(Debug, Clone)]
pub struct RawConfigTables {
    pub units: UnitRegistryFile,
    pub contexts: ContextsFile,
    pub categories: CategoriesFile,
    pub checklist: ChecklistFile,
    pub settings: AnalysisSettings,
}

impl AnalysisConfig {
    pub fn load(config_dir: Option<&Path>) -> Result<Self> {
        match config_dir {
            Some(dir) => Self::load_dir(dir),
            None => Self::embedded(),
        }
    }

    pub fn embedded() -> Result<Self> {
        Self::from_tables(embedded_tables()?, ConfigSource::Embedded)
    }

    pub fn load_dir(dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            bail!("configuration directory not found: {}", dir.display());
        }

        let settings_path = dir.join(ANALYSIS_FILE);
        let settings = if settings_path.exists() {
            read_table(&settings_path)?
        } else {
            info!(path = %settings_path.display(), "analysis settings absent; using defaults");
            AnalysisSettings::default()
        };

        let tables = RawConfigTables {
            units: read_required_table(dir, UNITS_FILE)?,
            contexts: read_required_table(dir, CONTEXTS_FILE)?,
            categories: read_required_table(dir, CATEGORIES_FILE)?,
            checklist: read_required_table(dir, CHECKLIST_FILE)?,
            settings,
        };
        Self::from_tables(tables, ConfigSource::Directory(dir.to_path_buf()))
    }

    pub fn from_tables(tables: RawConfigTables, source: ConfigSource) -> Result<Self> {
        tables
            .settings
            .validate()
            .context("invalid analysis settings")?;
        let units =
            UnitRegistry::from_file(&tables.units).context("invalid unit registry table")?;
        let contexts =
            compile_contexts(&tables.contexts, &units).context("invalid context table")?;
        let categories =
            compile_categories(&tables.categories).context("invalid category table")?;
        let checklist = compile_checklist(&tables.checklist).context("invalid checklist table")?;

        info!(
            source = %source.describe(),
            units = units.len(),
            quantities = units.quantities().len(),
            contexts = contexts.len(),
            categories = categories.len(),
            checklist_sections = checklist.sections.len(),
            checklist_items = checklist.item_count(),
            "loaded analysis configuration"
        );

        Ok(Self {
            source,
            units,
            contexts,
            categories,
            checklist,
            settings: tables.settings,
        })
    }
}

pub fn embedded_tables() -> Result<RawConfigTables> {
    Ok(RawConfigTables {
        units: parse_table(EMBEDDED_UNITS, "embedded units.json")?,
        contexts: parse_table(EMBEDDED_CONTEXTS, "embedded contexts.json")?,
        categories: parse_table(EMBEDDED_CATEGORIES, "embedded categories.json")?,
        checklist: parse_table(EMBEDDED_CHECKLIST, "embedded checklist.json")?,
        settings: parse_table(EMBEDDED_ANALYSIS, "embedded analysis.json")?,
    })
}

fn read_required_table<T: DeserializeOwned>(dir: &Path, filename: &str) -> Result<T> {
    let path = dir.join(filename);
    if !path.exists() {
        bail!("required configuration table missing: {}", path.display());
    }
    read_table(&path)
}

fn read_table<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_table(&raw, &path.display().to_string())
}

fn parse_table<T: DeserializeOwned>(raw: &str, name: &str) -> Result<T> {
    serde_json::from_str(raw).with_context(|| format!("failed to parse {name}"))
}
