use crate::metrics::compute_metrics;
use crate::models::{ExperimentRecord, RunOutcome, RunRecord};
use crate::statistics::calculate_statistics;
use anyhow::{Context, Result};
use csv::{QuoteStyle, WriterBuilder};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Flat per-run row for spreadsheet export; failed runs leave the result columns empty
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportRow {
    #[serde(rename = "runId")]
    pub run_id: String,
    pub temperature: f64,
    pub top_p: f64,
    pub max_tokens: u32,
    pub model: String,
    #[serde(rename = "latencyMs")]
    pub latency_ms: Option<u64>,
    pub tokens: Option<u32>,
    pub composite: Option<f64>,
    pub completeness: Option<f64>,
    pub coherence: Option<f64>,
    pub repetition: Option<f64>,
    pub readability: Option<f64>,
    #[serde(rename = "lengthFit")]
    pub length_fit: Option<f64>,
    pub structure: Option<f64>,
    pub text: String,
}

impl ExportRow {
    pub fn from_run(run: &RunRecord, model: &str) -> Self {
        let combination = run.outcome.combination();
        let mut row = ExportRow {
            run_id: run.run_id.to_string(),
            temperature: combination.temperature,
            top_p: combination.top_p,
            max_tokens: combination.max_tokens,
            model: model.to_string(),
            latency_ms: None,
            tokens: None,
            composite: None,
            completeness: None,
            coherence: None,
            repetition: None,
            readability: None,
            length_fit: None,
            structure: None,
            text: String::new(),
        };

        if let RunOutcome::Success { generation, metrics, .. } = &run.outcome {
            row.latency_ms = Some(generation.latency_ms);
            row.tokens = Some(generation.tokens_used);
            row.composite = Some(metrics.composite);
            row.completeness = Some(metrics.completeness);
            row.coherence = Some(metrics.coherence);
            row.repetition = Some(metrics.repetition);
            row.readability = Some(metrics.readability);
            row.length_fit = Some(metrics.length_fit);
            row.structure = Some(metrics.structure);
            row.text = generation.text.clone();
        }

        row
    }
}

/// Export rows for every run of every record, in order
pub fn export_rows(records: &[ExperimentRecord]) -> Vec<ExportRow> {
    records
        .iter()
        .flat_map(|record| {
            record
                .runs
                .iter()
                .map(|run| ExportRow::from_run(run, &record.grid.model))
        })
        .collect()
}

/// Column names of `ExportRow`, in field order
const EXPORT_HEADERS: [&str; 15] = [
    "runId",
    "temperature",
    "top_p",
    "max_tokens",
    "model",
    "latencyMs",
    "tokens",
    "composite",
    "completeness",
    "coherence",
    "repetition",
    "readability",
    "lengthFit",
    "structure",
    "text",
];

/// Render rows as CSV with every field quoted; the header is written even without rows
pub fn to_csv(rows: &[ExportRow]) -> Result<String> {
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .quote_style(QuoteStyle::Always)
        .from_writer(Vec::new());

    writer.write_record(EXPORT_HEADERS).context("Failed to write CSV header")?;
    for row in rows {
        writer.serialize(row).context("Failed to write CSV row")?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush CSV output: {}", e))?;
    String::from_utf8(bytes).context("CSV output is not valid UTF-8")
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ImportDocument {
    Many(Vec<ExperimentRecord>),
    One(Box<ExperimentRecord>),
}

/// Load experiment records previously written by `run -o json` or the storage sink
pub fn import_records(path: &Path) -> Result<Vec<ExperimentRecord>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read import file: {}", path.display()))?;

    let document: ImportDocument = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse experiment records: {}", path.display()))?;

    Ok(match document {
        ImportDocument::Many(records) => records,
        ImportDocument::One(record) => vec![*record],
    })
}

/// Recompute every successful run's metrics from its text and refresh the statistics
pub fn rescore(record: &mut ExperimentRecord) {
    for run in &mut record.runs {
        if let RunOutcome::Success { generation, metrics, .. } = &mut run.outcome {
            *metrics = compute_metrics(&generation.text, &record.prompt, record.grid.desired_length);
        }
    }
    record.statistics = calculate_statistics(&record.runs);
}
