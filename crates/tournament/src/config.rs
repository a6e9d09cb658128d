//! Tournament configuration file (`tournament.toml`)

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::backoff::RetryPolicy;
use crate::client::PromptMode;
use crate::protocol::MoveSettings;
use crate::tournament::TournamentSettings;

/// Environment variable that overrides `api.api_key`.
pub const API_KEY_ENV: &str = "TOURNAMENT_API_KEY";

/// Configuration problems. All of them stop the process before any match.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("at least two models are required, found {0}")]
    TooFewModels(usize),

    #[error("model {0:?} is listed more than once")]
    DuplicateModel(String),

    #[error("model ids must not be empty")]
    EmptyModelId,

    #[error("rounds must be at least 1")]
    NoRounds,

    #[error("API key is missing or still a placeholder; set api.api_key or TOURNAMENT_API_KEY")]
    MissingApiKey,

    #[error("invalid retry policy: {0}")]
    InvalidRetry(String),

    #[error("timeout_ms must be greater than zero")]
    ZeroTimeout,
}

/// Top-level config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub models: Vec<String>,
    #[serde(default)]
    pub tournament: TournamentSection,
    #[serde(default)]
    pub api: ApiSection,
    #[serde(default)]
    pub retry: RetryPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TournamentSection {
    pub rounds: u32,
    pub output_dir: PathBuf,
}

impl Default for TournamentSection {
    fn default() -> Self {
        Self {
            rounds: 1,
            output_dir: PathBuf::from("tournament_logs"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSection {
    pub base_url: String,
    pub api_key: String,
    pub timeout_ms: u64,
    pub max_tokens: u32,
    pub mode: PromptMode,
    pub reasoning_effort: Option<String>,
}

impl Default for ApiSection {
    fn default() -> Self {
        Self {
            base_url: "https://openrouter.ai/api/v1".to_string(),
            api_key: String::new(),
            timeout_ms: 60_000,
            max_tokens: 1024,
            mode: PromptMode::Verbose,
            reasoning_effort: None,
        }
    }
}

/// Placeholder keys shipped in example configs.
pub fn is_placeholder_key(key: &str) -> bool {
    let key = key.trim();
    let lower = key.to_ascii_lowercase();
    key.is_empty()
        || lower.starts_with("your")
        || lower.contains("api-key-here")
        || lower.contains("api_key_here")
        || key.starts_with('<')
        || key.ends_with("...")
        || key.chars().all(|c| c == 'x' || c == 'X' || c == '*')
}

impl Config {
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Read and parse a config file. Does not validate.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&contents)
    }

    /// Replace the file's API key with `key` when one is given.
    pub fn with_api_key_override(mut self, key: Option<String>) -> Self {
        if let Some(key) = key.filter(|k| !k.trim().is_empty()) {
            self.api.api_key = key;
        }
        self
    }

    /// Check everything a tournament needs before the first match.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.models.len() < 2 {
            return Err(ConfigError::TooFewModels(self.models.len()));
        }
        let mut seen = HashSet::new();
        for model in &self.models {
            if model.trim().is_empty() {
                return Err(ConfigError::EmptyModelId);
            }
            if !seen.insert(model) {
                return Err(ConfigError::DuplicateModel(model.clone()));
            }
        }
        if self.tournament.rounds == 0 {
            return Err(ConfigError::NoRounds);
        }
        if is_placeholder_key(&self.api.api_key) {
            return Err(ConfigError::MissingApiKey);
        }
        if self.api.timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.retry.max_retries == 0 {
            return Err(ConfigError::InvalidRetry("max_retries must be at least 1".into()));
        }
        if self.retry.multiplier < 1.0 {
            return Err(ConfigError::InvalidRetry("multiplier must be >= 1.0".into()));
        }
        if !(0.0..=1.0).contains(&self.retry.jitter) {
            return Err(ConfigError::InvalidRetry("jitter must be within [0, 1]".into()));
        }
        Ok(())
    }

    pub fn move_settings(&self) -> MoveSettings {
        MoveSettings {
            timeout: Duration::from_millis(self.api.timeout_ms),
            max_tokens: self.api.max_tokens,
            mode: self.api.mode,
            reasoning_effort: self.api.reasoning_effort.clone(),
        }
    }

    pub fn tournament_settings(&self) -> TournamentSettings {
        TournamentSettings {
            models: self.models.clone(),
            rounds: self.tournament.rounds,
            retry: self.retry.clone(),
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
