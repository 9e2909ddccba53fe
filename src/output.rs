use crate::export::{export_rows, to_csv};
use crate::models::{ExperimentRecord, RunOutcome, Statistics};
use crate::statistics::{best_run, failed_runs, metric_names, ranked_runs};
use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Write};

/// Output format options
#[derive(Debug, Clone, Copy, ValueEnum, Serialize, Deserialize)]
pub enum OutputFormat {
    Plain,
    Json,
    Csv,
}

/// Print experiment records in the specified format
pub fn print_records(records: &[ExperimentRecord], format: OutputFormat) -> Result<()> {
    let rendered = render_records(records, format)?;
    print!("{}", rendered);
    Ok(())
}

/// Render experiment records in the specified format
pub fn render_records(records: &[ExperimentRecord], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Plain => {
            let mut out = String::new();
            render_plain(&mut out, records).context("Failed to render plain output")?;
            Ok(out)
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(records).context("Failed to serialize records to JSON")?;
            Ok(format!("{}\n", json))
        }
        OutputFormat::Csv => to_csv(&export_rows(records)),
    }
}

fn render_plain(out: &mut String, records: &[ExperimentRecord]) -> fmt::Result {
    for (i, record) in records.iter().enumerate() {
        writeln!(out, "=== Experiment {}: {} ===", i + 1, record.name)?;
        writeln!(out, "Prompt: {}", record.prompt)?;
        writeln!(out, "Model: {}", record.grid.model)?;
        writeln!(out)?;

        writeln!(out, "📊 STATISTICS")?;
        writeln!(out, "-------------")?;
        render_statistics(out, &record.statistics)?;
        writeln!(out)?;

        writeln!(out, "🏆 BEST RUN")?;
        writeln!(out, "-----------")?;
        match best_run(&record.runs) {
            Some(best) => {
                writeln!(
                    out,
                    "temperature={} top_p={} max_tokens={} composite={:.3}",
                    best.combination.temperature,
                    best.combination.top_p,
                    best.combination.max_tokens,
                    best.metrics.composite
                )?;
                writeln!(out, "Response: {}", best.generation.text)?;
            }
            None => writeln!(out, "No successful runs.")?,
        }
        writeln!(out)?;

        writeln!(out, "📝 RANKED RUNS")?;
        writeln!(out, "--------------")?;
        writeln!(
            out,
            "{:<6} {:<6} {:<6} {:<10} {:<10} {:<10} {:<8}",
            "Rank", "Temp", "Top-p", "MaxTokens", "Composite", "Latency", "Tokens"
        )?;
        writeln!(out, "{}", "-".repeat(62))?;
        for (rank, scored) in ranked_runs(&record.runs).into_iter().enumerate() {
            writeln!(
                out,
                "{:<6} {:<6} {:<6} {:<10} {:<10.3} {:<10} {:<8}",
                rank + 1,
                scored.combination.temperature,
                scored.combination.top_p,
                scored.combination.max_tokens,
                scored.metrics.composite,
                format!("{}ms", scored.generation.latency_ms),
                scored.generation.tokens_used
            )?;
        }

        let failures: Vec<_> = failed_runs(&record.runs).collect();
        if !failures.is_empty() {
            writeln!(out)?;
            writeln!(out, "⚠️  FAILED RUNS")?;
            writeln!(out, "--------------")?;
            for run in failures {
                if let RunOutcome::Failure {
                    combination,
                    kind,
                    error,
                } = &run.outcome
                {
                    writeln!(
                        out,
                        "temperature={} top_p={} max_tokens={} ({:?}): {}",
                        combination.temperature, combination.top_p, combination.max_tokens, kind, error
                    )?;
                }
            }
        }

        if i < records.len() - 1 {
            writeln!(out)?;
            writeln!(out, "{}", "=".repeat(50))?;
            writeln!(out)?;
        }
    }

    Ok(())
}

fn render_statistics(out: &mut String, stats: &Statistics) -> fmt::Result {
    writeln!(out, "Runs: {} succeeded, {} failed", stats.succeeded, stats.failed)?;
    if stats.succeeded == 0 {
        return writeln!(out, "No statistics available.");
    }

    writeln!(out, "{:<15} {:<8} {:<8} {:<8}", "Metric", "Mean", "Median", "Mode")?;
    writeln!(out, "{}", "-".repeat(45))?;

    for name in metric_names() {
        let mean = stats.mean.get(name).unwrap_or(&0.0);
        let median = stats.median.get(name).unwrap_or(&0.0);
        let mode = stats.mode.get(name).unwrap_or(&0.0);

        writeln!(out, "{:<15} {:<8.3} {:<8.3} {:<8.3}", name, mean, median, mode)?;
    }

    Ok(())
}
