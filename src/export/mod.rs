use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{Connection, Transaction, params};
use tracing::info;

use crate::engine::{AnalysisSummary, ObservationRecord, ParameterComparison, UnitIssue};
use crate::util::{ensure_directory, truncate_chars};

const FINDINGS_SCHEMA_VERSION: &str = "1";

mod markdown;
mod sqlite;
#[cfg(test)]
mod tests;

pub use markdown::*;
pub use sqlite::*;
