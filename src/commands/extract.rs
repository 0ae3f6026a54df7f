use std::io::{self, Write};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::cli::ExtractArgs;
use crate::config::AnalysisConfig;
use crate::engine::{Engine, ObservationRecord, categorize};
use crate::model::FactFragment;

#[derive(Debug, Serialize)]
struct ExtractResponse<'a> {
    page: u32,
    text: &'a str,
    categories: Vec<String>,
    observations: &'a [ObservationRecord],
}

pub fn run(args: ExtractArgs) -> Result<()> {
    let config = AnalysisConfig::load(args.config_dir.as_deref())?;
    let engine = Engine::new(&config)?;
    let fragment = FactFragment::new(0, args.page, args.text.clone());

    let inspection = engine.inspect(&fragment);
    let categories = categorize(&config.categories, &fragment.text)
        .into_iter()
        .map(|category| category.name.clone())
        .collect::<Vec<String>>();

    info!(
        observations = inspection.records.len(),
        normalized = inspection.normalized.len(),
        categories = categories.len(),
        "inspected fragment"
    );

    let response = ExtractResponse {
        page: fragment.page,
        text: &fragment.text,
        categories,
        observations: &inspection.records,
    };

    if args.json {
        write_json_response(&response)
    } else {
        write_text_response(&response)
    }
}

fn write_json_response(response: &ExtractResponse<'_>) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());
    serde_json::to_writer_pretty(&mut output, response)
        .context("failed to serialize extract json output")?;
    writeln!(output)?;
    output.flush()?;
    Ok(())
}

fn write_text_response(response: &ExtractResponse<'_>) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());

    writeln!(output, "Page: {}", response.page)?;
    writeln!(
        output,
        "Categories: {}",
        if response.categories.is_empty() {
            "(none)".to_string()
        } else {
            response.categories.join(", ")
        }
    )?;
    writeln!(output, "Observations: {}", response.observations.len())?;

    for (position, record) in response.observations.iter().enumerate() {
        let observation = &record.observation;
        let unit = if observation.unit.is_empty() {
            "(none)"
        } else {
            observation.unit.as_str()
        };
        writeln!(
            output,
            "{}.\t\"{}\"\tvalue={} unit={} rule={} status={}",
            position + 1,
            observation.matched_text,
            observation.value,
            unit,
            observation.rule,
            record.status.as_str()
        )?;

        match (&record.base_unit, record.normalized_value) {
            (Some(base_unit), Some(value)) => writeln!(
                output,
                "\tnormalized={value} {base_unit} contexts={}",
                display_contexts(&record.contexts)
            )?,
            _ => writeln!(output, "\tcontexts={}", display_contexts(&record.contexts))?,
        }
    }

    output.flush()?;
    Ok(())
}

fn display_contexts(contexts: &[String]) -> String {
    if contexts.is_empty() {
        "(none)".to_string()
    } else {
        contexts.join(",")
    }
}
