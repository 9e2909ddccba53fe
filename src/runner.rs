use crate::client::OpenAiService;
use crate::config::{Config, ExperimentConfig};
use crate::error::SweepError;
use crate::executor::{RetryPolicy, RunExecutor};
use crate::models::{ExperimentRecord, RunRecord};
use crate::orchestrator::{Orchestrator, SweepReport};
use crate::statistics::calculate_statistics;
use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;
use uuid::Uuid;

/// Main runner that sweeps every experiment in the configuration
pub struct Runner {
    config: Config,
    policy: RetryPolicy,
}

impl Runner {
    /// Create a new runner with the default retry policy
    pub fn new(config: Config) -> Self {
        Self::with_policy(config, RetryPolicy::default())
    }

    pub fn with_policy(config: Config, policy: RetryPolicy) -> Self {
        Self { config, policy }
    }

    /// Run all experiments defined in the configuration.
    ///
    /// Every experiment's prompt, grid and credential are checked before the
    /// first request of any experiment is sent.
    pub async fn run_experiments(&self) -> Result<Vec<ExperimentRecord>> {
        let total_experiments = self.config.experiments.len();

        let mut prepared = Vec::with_capacity(total_experiments);
        for (index, experiment) in self.config.experiments.iter().enumerate() {
            let name = experiment.display_name(index + 1);
            let service =
                prepare_experiment(experiment).with_context(|| format!("Experiment {} is invalid", name))?;
            prepared.push((name, experiment, service));
        }

        let mut records = Vec::with_capacity(total_experiments);
        for (index, (name, experiment, service)) in prepared.into_iter().enumerate() {
            info!("Running experiment {}/{}: {}", index + 1, total_experiments, name);

            let record = self
                .run_single_experiment(experiment, service, name.clone())
                .await
                .with_context(|| format!("Experiment {} failed", name))?;
            records.push(record);
        }

        Ok(records)
    }

    /// Sweep one experiment and store the record if configured
    async fn run_single_experiment(
        &self,
        experiment: &ExperimentConfig,
        service: OpenAiService,
        name: String,
    ) -> Result<ExperimentRecord> {
        let orchestrator = Orchestrator::new(RunExecutor::new(service, self.policy.clone()));

        let report = orchestrator.run(&experiment.prompt, &experiment.grid).await?;
        let record = build_record(name, report);

        info!(
            "Experiment {} finished: {} succeeded, {} failed",
            record.name, record.statistics.succeeded, record.statistics.failed
        );

        if let Some(storage_path) = &experiment.storage_path {
            store_record(&record, storage_path)?;
        }

        Ok(record)
    }
}

/// Check the prompt and grid, then read the credential
fn prepare_experiment(experiment: &ExperimentConfig) -> Result<OpenAiService, SweepError> {
    if experiment.prompt.trim().is_empty() {
        return Err(SweepError::EmptyPrompt);
    }
    experiment.grid.expand()?;
    OpenAiService::from_env(&experiment.api_endpoint, &experiment.env_var_api_key)
}

/// Assign ids to a sweep's outcomes and summarize them
pub fn build_record(name: String, report: SweepReport) -> ExperimentRecord {
    let runs: Vec<RunRecord> = report
        .outcomes
        .into_iter()
        .map(|outcome| RunRecord {
            run_id: Uuid::new_v4(),
            outcome,
        })
        .collect();
    let statistics = calculate_statistics(&runs);

    ExperimentRecord {
        id: Uuid::new_v4(),
        name,
        prompt: report.prompt,
        grid: report.grid,
        statistics,
        runs,
    }
}

/// Store an experiment record to a JSON file
pub fn store_record(record: &ExperimentRecord, path: &str) -> Result<()> {
    let json_content =
        serde_json::to_string_pretty(record).context("Failed to serialize experiment record to JSON")?;

    if let Some(parent) = Path::new(path).parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    std::fs::write(path, json_content).with_context(|| format!("Failed to write results to: {}", path))?;

    info!("Results stored to: {}", path);
    Ok(())
}
