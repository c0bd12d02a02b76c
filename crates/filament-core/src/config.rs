use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{FilamentError, Result};

/// What to do when a node fails mid-run.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// Record the failure and keep executing downstream nodes with whatever
    /// inputs are available.
    #[default]
    ContinueOnError,
    /// Stop the run at the first failed node; remaining nodes stay idle.
    FailFast,
}

/// What to do when the graph contains a cycle.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CyclePolicy {
    /// Exclude cyclic nodes from the order, log a warning, run the rest.
    #[default]
    Warn,
    /// Abort the run before any node executes.
    Fail,
}

/// Run-scoped configuration for a workflow execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// API key for the generative-text provider. Must be non-empty.
    #[serde(default)]
    pub api_key: String,
    /// Model id sent to the provider.
    #[serde(default = "default_model_id")]
    pub model_id: String,
    /// Sampling temperature. Zero disables the field on the wire.
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Max output tokens per generation request.
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
    /// Per-run failure policy.
    #[serde(default)]
    pub error_policy: ErrorPolicy,
    /// Per-run cycle policy.
    #[serde(default)]
    pub cycle_policy: CyclePolicy,
    /// Round-trip one validation request to the provider before running.
    #[serde(default)]
    pub validate_key: bool,
}

fn default_model_id() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_output_tokens() -> u32 {
    2048
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model_id: default_model_id(),
            temperature: default_temperature(),
            max_output_tokens: default_max_output_tokens(),
            error_policy: ErrorPolicy::default(),
            cycle_policy: CyclePolicy::default(),
            validate_key: false,
        }
    }
}

impl RunConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    /// Load config from a TOML file, with env var expansion.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|_| FilamentError::ConfigNotFound(path.display().to_string()))?;

        // Expand ${ENV_VAR} references
        let expanded = expand_env_vars(&content);

        toml::from_str(&expanded).map_err(|e| FilamentError::Config(e.to_string()))
    }

    /// Fail-fast precondition: the key must be non-empty before any node runs.
    pub fn require_api_key(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(FilamentError::MissingApiKey);
        }
        Ok(())
    }
}

/// Expand `${ENV_VAR}` references; unset variables are left as written.
fn expand_env_vars(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            // Unterminated reference; keep the remainder verbatim
            out.push_str(&rest[start..]);
            return out;
        };
        let name = &after[..end];
        match std::env::var(name) {
            Ok(value) => out.push_str(&value),
            Err(_) => {
                out.push_str("${");
                out.push_str(name);
                out.push('}');
            }
        }
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    out
}
