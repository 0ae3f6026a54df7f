use anyhow::Result;
use tracing::info;

use crate::cli::CheckConfigArgs;
use crate::config::AnalysisConfig;
use crate::engine::Engine;

pub fn run(args: CheckConfigArgs) -> Result<()> {
    let config = AnalysisConfig::load(args.config_dir.as_deref())?;
    let engine = Engine::new(&config)?;

    for quantity in config.units.quantities() {
        info!(
            quantity = %quantity.name,
            base_unit = %quantity.base_unit,
            units = quantity.units.len(),
            prefix = quantity.prefix,
            "unit quantity"
        );
    }
    for context in &config.contexts {
        info!(
            context = %context.name,
            patterns = context.patterns.len(),
            valid_units = context.valid_units.len(),
            preferred_unit = %context.preferred_unit,
            proximity_chars = context.proximity_chars.unwrap_or(0),
            "parameter context"
        );
    }
    for section in &config.checklist.sections {
        info!(section = %section.id, items = section.items.len(), "checklist section");
    }

    info!(
        source = %config.source.describe(),
        registered_units = config.units.entries().count(),
        extraction_rules = %engine.extractor().rule_names().join(","),
        significance_threshold = config.settings.significance_threshold,
        high_severity_threshold = config.settings.high_severity_threshold,
        max_evidence = config.settings.max_evidence,
        "configuration is valid"
    );

    Ok(())
}
