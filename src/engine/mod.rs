use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::ops::Range;

use anyhow::{Context, Result};
use regex::{Captures, Regex};
use serde::Serialize;
use tracing::{debug, info};

use crate::config::{AnalysisConfig, AnalysisSettings, Checklist, FactCategory, ParameterContext};
use crate::model::{DocumentInfo, FactFragment};
use crate::units::{UnitRegistry, normalize_unit, pluralizable_suffix};
use crate::util::{char_window, excerpt_around, normalize_whitespace};

mod categorize;
mod classify;
mod consistency;
mod extract;
mod gaps;
mod report;
mod run;
mod spans;
mod standardization;
mod types;

pub use categorize::*;
pub use classify::*;
pub use consistency::*;
pub use extract::*;
pub use gaps::*;
pub use report::*;
pub use run::*;
pub use spans::*;
pub use standardization::*;
pub use types::*;
