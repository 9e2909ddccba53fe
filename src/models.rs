use crate::error::SweepError;
use crate::grid::{Combination, ParamGrid};
use crate::metrics::Metrics;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Text produced by the generation service for one combination
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    /// The generated text
    pub text: String,
    /// Total tokens reported by the service
    pub tokens_used: u32,
    /// Latency of the attempt that succeeded, in milliseconds
    pub latency_ms: u64,
}

/// Whether a failed combination gave up after retries or failed outright
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    Transient,
    Terminal,
}

/// Result of running one combination
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum RunOutcome {
    Success {
        combination: Combination,
        generation: GenerationResult,
        metrics: Metrics,
    },
    Failure {
        combination: Combination,
        kind: FailureKind,
        error: String,
    },
}

impl RunOutcome {
    /// Record a per-combination error
    pub fn failed(combination: Combination, error: &SweepError) -> Self {
        let kind = match error {
            SweepError::TransientService { .. } => FailureKind::Transient,
            _ => FailureKind::Terminal,
        };
        RunOutcome::Failure {
            combination,
            kind,
            error: error.to_string(),
        }
    }

    pub fn combination(&self) -> &Combination {
        match self {
            RunOutcome::Success { combination, .. } | RunOutcome::Failure { combination, .. } => {
                combination
            }
        }
    }

    pub fn metrics(&self) -> Option<&Metrics> {
        match self {
            RunOutcome::Success { metrics, .. } => Some(metrics),
            RunOutcome::Failure { .. } => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Success { .. })
    }
}

/// A run as handed to storage and export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRecord {
    pub run_id: Uuid,
    #[serde(flatten)]
    pub outcome: RunOutcome,
}

/// Statistics calculated across the successful runs of an experiment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    /// Number of runs that produced metrics
    pub succeeded: usize,
    /// Number of runs that failed
    pub failed: usize,
    /// Mean of each metric
    pub mean: HashMap<String, f64>,
    /// Median of each metric
    pub median: HashMap<String, f64>,
    /// Mode of each metric (most frequent value, rounded to 1 decimal place)
    pub mode: HashMap<String, f64>,
}

/// A completed experiment: its inputs, runs in enumeration order and summary statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentRecord {
    pub id: Uuid,
    pub name: String,
    pub prompt: String,
    pub grid: ParamGrid,
    pub statistics: Statistics,
    pub runs: Vec<RunRecord>,
}
