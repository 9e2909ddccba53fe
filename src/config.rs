use crate::grid::ParamGrid;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for a single parameter sweep
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExperimentConfig {
    /// Display name, defaults to `experiment-<n>`
    #[serde(default)]
    pub name: Option<String>,
    /// Prompt sent for every combination
    pub prompt: String,
    /// OpenAI-compatible API endpoint
    #[serde(default = "default_api_endpoint")]
    pub api_endpoint: String,
    /// Environment variable name containing the API key
    #[serde(default = "default_env_var_api_key")]
    pub env_var_api_key: String,
    /// Parameter values to sweep, plus model and desired length
    pub grid: ParamGrid,
    /// Optional local path to store the experiment record as JSON
    #[serde(default)]
    pub storage_path: Option<String>,
}

fn default_api_endpoint() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_env_var_api_key() -> String {
    "OPENAI_API_KEY".to_string()
}

impl ExperimentConfig {
    /// Name to record, falling back to the experiment's position in the file
    pub fn display_name(&self, experiment_num: usize) -> String {
        match &self.name {
            Some(name) if !name.trim().is_empty() => name.clone(),
            _ => format!("experiment-{}", experiment_num),
        }
    }
}

/// Root configuration containing list of experiments
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// List of experiment configurations
    pub experiments: Vec<ExperimentConfig>,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config: {}", path.display()))
    }
}
