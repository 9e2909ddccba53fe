use crate::error::SweepError;
use serde::{Deserialize, Serialize};

/// Upper bound on the number of combinations a single sweep may run
pub const MAX_COMBINATIONS: usize = 30;

/// Model used when the grid does not name one
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

const MAX_TOKENS_LIMIT: f64 = 4096.0;

/// Desired output length class used by the length-fit scorer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DesiredLength {
    Short,
    Medium,
    Long,
}

impl DesiredLength {
    /// Target word count for this length class
    pub fn target_words(self) -> usize {
        match self {
            DesiredLength::Short => 120,
            DesiredLength::Medium => 300,
            DesiredLength::Long => 600,
        }
    }
}

/// A raw grid value as written by the user, coerced to a number during expansion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GridValue {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl GridValue {
    /// Numeric value, or `None` when the value is not a finite number
    pub fn as_number(&self) -> Option<f64> {
        let value = match self {
            GridValue::Integer(i) => *i as f64,
            GridValue::Float(f) => *f,
            GridValue::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        value.is_finite().then_some(value)
    }
}

impl From<f64> for GridValue {
    fn from(value: f64) -> Self {
        GridValue::Float(value)
    }
}

impl From<i64> for GridValue {
    fn from(value: i64) -> Self {
        GridValue::Integer(value)
    }
}

impl From<&str> for GridValue {
    fn from(value: &str) -> Self {
        GridValue::Text(value.to_string())
    }
}

/// Candidate values for each generation parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamGrid {
    pub temperature: Vec<GridValue>,
    pub top_p: Vec<GridValue>,
    pub max_tokens: Vec<GridValue>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desired_length: Option<DesiredLength>,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

/// One concrete point of the grid
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Combination {
    pub temperature: f64,
    pub top_p: f64,
    pub max_tokens: u32,
}

impl ParamGrid {
    /// Build a grid from plain numeric values with the default model
    #[cfg(test)]
    pub fn new(temperature: Vec<f64>, top_p: Vec<f64>, max_tokens: Vec<i64>) -> Self {
        Self {
            temperature: temperature.into_iter().map(GridValue::from).collect(),
            top_p: top_p.into_iter().map(GridValue::from).collect(),
            max_tokens: max_tokens.into_iter().map(GridValue::from).collect(),
            model: default_model(),
            desired_length: None,
        }
    }

    /// Expand the grid into its ordered cartesian product.
    ///
    /// Values outside their domain are dropped first; temperature varies slowest
    /// and max_tokens fastest, each in input order.
    pub fn expand(&self) -> Result<Vec<Combination>, SweepError> {
        let temperatures = filter_dimension(&self.temperature, |t| (0.0..=2.0).contains(&t));
        let top_ps = filter_dimension(&self.top_p, |p| p > 0.0 && p <= 1.0);
        let max_tokens: Vec<u32> =
            filter_dimension(&self.max_tokens, |n| n.fract() == 0.0 && n >= 1.0 && n <= MAX_TOKENS_LIMIT)
                .into_iter()
                .map(|n| n as u32)
                .collect();

        if temperatures.is_empty() {
            return Err(SweepError::InvalidGrid { dimension: "temperature" });
        }
        if top_ps.is_empty() {
            return Err(SweepError::InvalidGrid { dimension: "top_p" });
        }
        if max_tokens.is_empty() {
            return Err(SweepError::InvalidGrid { dimension: "max_tokens" });
        }

        let combinations = temperatures.len() * top_ps.len() * max_tokens.len();
        if combinations > MAX_COMBINATIONS {
            return Err(SweepError::GridTooLarge {
                combinations,
                cap: MAX_COMBINATIONS,
            });
        }

        let mut expanded = Vec::with_capacity(combinations);
        for &temperature in &temperatures {
            for &top_p in &top_ps {
                for &max in &max_tokens {
                    expanded.push(Combination {
                        temperature,
                        top_p,
                        max_tokens: max,
                    });
                }
            }
        }

        Ok(expanded)
    }
}

fn filter_dimension(values: &[GridValue], in_bounds: impl Fn(f64) -> bool) -> Vec<f64> {
    values
        .iter()
        .filter_map(GridValue::as_number)
        .filter(|&v| in_bounds(v))
        .collect()
}
