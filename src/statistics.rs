use crate::grid::Combination;
use crate::metrics::Metrics;
use crate::models::{GenerationResult, RunOutcome, RunRecord, Statistics};
use std::collections::HashMap;

/// Calculate per-metric statistics across the successful runs
pub fn calculate_statistics(runs: &[RunRecord]) -> Statistics {
    let scored: Vec<&Metrics> = runs.iter().filter_map(|r| r.outcome.metrics()).collect();
    let mut statistics = Statistics {
        succeeded: scored.len(),
        failed: runs.len() - scored.len(),
        ..Statistics::default()
    };

    for name in metric_names() {
        let scores = collect_metric_scores(&scored, name);

        if scores.is_empty() {
            statistics.mean.insert(name.to_string(), 0.0);
            statistics.median.insert(name.to_string(), 0.0);
            statistics.mode.insert(name.to_string(), 0.0);
            continue;
        }

        statistics.mean.insert(name.to_string(), calculate_mean(&scores));
        statistics.median.insert(name.to_string(), calculate_median(&scores));
        statistics.mode.insert(name.to_string(), calculate_mode(&scores));
    }

    statistics
}

/// Metric names in display order
pub fn metric_names() -> [&'static str; 7] {
    [
        "composite",
        "completeness",
        "coherence",
        "repetition",
        "readability",
        "lengthFit",
        "structure",
    ]
}

/// A successful run with its parts borrowed out of the outcome
#[derive(Debug, Clone, Copy)]
pub struct ScoredRun<'a> {
    pub run: &'a RunRecord,
    pub combination: &'a Combination,
    pub generation: &'a GenerationResult,
    pub metrics: &'a Metrics,
}

/// Successful runs, best composite first; ties keep enumeration order
pub fn ranked_runs(runs: &[RunRecord]) -> Vec<ScoredRun<'_>> {
    let mut ranked: Vec<ScoredRun<'_>> = runs
        .iter()
        .filter_map(|run| match &run.outcome {
            RunOutcome::Success {
                combination,
                generation,
                metrics,
            } => Some(ScoredRun {
                run,
                combination,
                generation,
                metrics,
            }),
            RunOutcome::Failure { .. } => None,
        })
        .collect();
    ranked.sort_by(|a, b| b.metrics.composite.total_cmp(&a.metrics.composite));
    ranked
}

/// The run with the highest composite score, if any succeeded
pub fn best_run(runs: &[RunRecord]) -> Option<ScoredRun<'_>> {
    ranked_runs(runs).into_iter().next()
}

/// Failed runs in enumeration order
pub fn failed_runs(runs: &[RunRecord]) -> impl Iterator<Item = &RunRecord> {
    runs.iter().filter(|r| !r.outcome.is_success())
}

fn collect_metric_scores(scored: &[&Metrics], name: &str) -> Vec<f64> {
    scored
        .iter()
        .filter_map(|m| {
            m.named_scores()
                .into_iter()
                .find(|(metric, _)| *metric == name)
                .map(|(_, value)| value)
        })
        .collect()
}

fn calculate_mean(scores: &[f64]) -> f64 {
    let sum: f64 = scores.iter().sum();
    sum / scores.len() as f64
}

fn calculate_median(scores: &[f64]) -> f64 {
    let mut sorted_scores = scores.to_vec();
    sorted_scores.sort_by(|a, b| a.total_cmp(b));

    let mid = sorted_scores.len() / 2;
    if sorted_scores.len() % 2 == 0 {
        (sorted_scores[mid - 1] + sorted_scores[mid]) / 2.0
    } else {
        sorted_scores[mid]
    }
}

/// Most frequent score after rounding to one decimal place; ties go to the lower value
fn calculate_mode(scores: &[f64]) -> f64 {
    let mut frequency: HashMap<i64, usize> = HashMap::new();
    for &score in scores {
        *frequency.entry((score * 10.0).round() as i64).or_insert(0) += 1;
    }

    frequency
        .into_iter()
        .max_by(|(a_key, a_count), (b_key, b_count)| a_count.cmp(b_count).then(b_key.cmp(a_key)))
        .map(|(key, _)| key as f64 / 10.0)
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FailureKind;
    use uuid::Uuid;

    fn metrics(composite: f64, completeness: f64) -> Metrics {
        Metrics {
            completeness,
            coherence: 0.5,
            repetition: 1.0,
            readability: 0.6,
            length_fit: 0.7,
            structure: 0.0,
            composite,
        }
    }

    fn combination(temperature: f64) -> Combination {
        Combination {
            temperature,
            top_p: 1.0,
            max_tokens: 100,
        }
    }

    fn success(temperature: f64, composite: f64, completeness: f64) -> RunRecord {
        RunRecord {
            run_id: Uuid::new_v4(),
            outcome: RunOutcome::Success {
                combination: combination(temperature),
                generation: GenerationResult {
                    text: "text".to_string(),
                    tokens_used: 10,
                    latency_ms: 100,
                },
                metrics: metrics(composite, completeness),
            },
        }
    }

    fn failure(temperature: f64) -> RunRecord {
        RunRecord {
            run_id: Uuid::new_v4(),
            outcome: RunOutcome::Failure {
                combination: combination(temperature),
                kind: FailureKind::Terminal,
                error: "bad request".to_string(),
            },
        }
    }

    #[test]
    fn test_calculate_statistics_normal_case() {
        let runs = vec![
            success(0.1, 0.8, 0.9),
            failure(0.2),
            success(0.3, 0.6, 0.7),
            success(0.4, 0.8, 0.8),
        ];

        let stats = calculate_statistics(&runs);

        assert_eq!(stats.succeeded, 3);
        assert_eq!(stats.failed, 1);
        // Mean: (0.8 + 0.6 + 0.8) / 3 = 0.733...
        assert!((stats.mean["composite"] - 0.7333333333333333).abs() < 0.0001);
        assert_eq!(stats.median["composite"], 0.8);
        assert_eq!(stats.mode["composite"], 0.8);
        assert!((stats.mean["completeness"] - 0.8).abs() < 1e-9);
        assert!((stats.mean["lengthFit"] - 0.7).abs() < 1e-9);
        assert_eq!(stats.mean.len(), 7);
    }

    #[test]
    fn test_calculate_statistics_without_successes() {
        let runs = vec![failure(0.1), failure(0.2)];
        let stats = calculate_statistics(&runs);

        assert_eq!(stats.succeeded, 0);
        assert_eq!(stats.failed, 2);
        assert_eq!(stats.mean["composite"], 0.0);
        assert_eq!(stats.median["composite"], 0.0);
        assert_eq!(stats.mode["composite"], 0.0);
    }

    #[test]
    fn test_calculate_statistics_even_number_results() {
        let runs: Vec<RunRecord> = [0.6, 0.7, 0.8, 0.9]
            .into_iter()
            .map(|c| success(0.5, c, 0.5))
            .collect();
        let stats = calculate_statistics(&runs);

        assert!((stats.mean["composite"] - 0.75).abs() < 1e-6);
        assert!((stats.median["composite"] - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_calculate_mode() {
        assert_eq!(calculate_mode(&[0.75, 0.8, 0.8, 0.8, 0.9]), 0.8);
        // Rounded to 1 decimal
        assert_eq!(calculate_mode(&[0.75]), 0.8);
        assert_eq!(calculate_mode(&[0.3, 0.1]), 0.1);
    }

    #[test]
    fn test_ranked_runs_and_best_run() {
        let runs = vec![
            success(0.1, 0.4, 0.5),
            failure(0.2),
            success(0.3, 0.9, 0.5),
            success(0.4, 0.9, 0.5),
            success(0.5, 0.7, 0.5),
        ];

        let ranked: Vec<f64> = ranked_runs(&runs)
            .iter()
            .map(|scored| scored.combination.temperature)
            .collect();
        assert_eq!(ranked, vec![0.3, 0.4, 0.5, 0.1]);

        let best = best_run(&runs).unwrap();
        assert_eq!(best.run.run_id, runs[2].run_id);
        assert_eq!(best.metrics.composite, 0.9);
        assert_eq!(failed_runs(&runs).count(), 1);
    }

    #[test]
    fn test_best_run_none_when_all_failed() {
        assert!(best_run(&[failure(0.1)]).is_none());
        assert!(best_run(&[]).is_none());
    }
}
