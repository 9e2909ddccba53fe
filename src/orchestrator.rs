use crate::client::GenerationService;
use crate::error::SweepError;
use crate::executor::RunExecutor;
use crate::grid::ParamGrid;
use crate::metrics::compute_metrics;
use crate::models::RunOutcome;
use tracing::{info, warn};

/// Outcomes of a sweep together with the inputs that produced them
#[derive(Debug, Clone)]
pub struct SweepReport {
    pub prompt: String,
    pub grid: ParamGrid,
    /// One outcome per combination, in enumeration order
    pub outcomes: Vec<RunOutcome>,
}

/// Drives a grid sweep: expansion, one generation per combination, scoring
pub struct Orchestrator<S> {
    executor: RunExecutor<S>,
}

impl<S: GenerationService> Orchestrator<S> {
    pub fn new(executor: RunExecutor<S>) -> Self {
        Self { executor }
    }

    /// Run every combination of the grid in order.
    ///
    /// Grid and prompt errors abort before any request is made; a failed
    /// combination is recorded in its outcome and the sweep moves on.
    pub async fn run(&self, prompt: &str, grid: &ParamGrid) -> Result<SweepReport, SweepError> {
        if prompt.trim().is_empty() {
            return Err(SweepError::EmptyPrompt);
        }
        let combinations = grid.expand()?;
        let total = combinations.len();

        let mut outcomes = Vec::with_capacity(total);
        for (index, combination) in combinations.into_iter().enumerate() {
            info!(
                "Running combination {}/{} (temperature={}, top_p={}, max_tokens={})",
                index + 1,
                total,
                combination.temperature,
                combination.top_p,
                combination.max_tokens
            );

            let outcome = match self.executor.execute(prompt, &grid.model, combination).await {
                Ok(generation) => {
                    let metrics = compute_metrics(&generation.text, prompt, grid.desired_length);
                    RunOutcome::Success {
                        combination,
                        generation,
                        metrics,
                    }
                }
                Err(error) => {
                    warn!("Combination {}/{} failed: {}", index + 1, total, error);
                    RunOutcome::failed(combination, &error)
                }
            };
            outcomes.push(outcome);
        }

        Ok(SweepReport {
            prompt: prompt.to_string(),
            grid: grid.clone(),
            outcomes,
        })
    }
}
