//! Configuration management for product-design
//!
//! Settings live in `config.toml` (platform config dir or `--config`).
//! API keys are kept out of it; see [`credentials`].

pub mod credentials;

pub use credentials::{ConfigError, Credentials, SecretsFile};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub llm: LlmConfig,
    pub search: SearchConfig,
    pub crew: CrewConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub model: String,
    /// Base URL of an OpenAI-compatible API (without `/chat/completions`)
    pub base_url: String,
    pub temperature: f32,
    pub max_tokens: usize,
    pub request_timeout_secs: u64,
    /// Retries on rate limits, 5xx and network failures
    pub max_retries: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            temperature: 0.5,
            max_tokens: 1024,
            request_timeout_secs: 60,
            max_retries: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub base_url: String,
    /// Number of organic results requested per query
    pub results: usize,
    pub request_timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            base_url: "https://google.serper.dev".to_string(),
            results: 5,
            request_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrewConfig {
    /// Rounds of tool calls an agent may make before it must answer
    pub max_tool_rounds: usize,
    /// Print agent progress while running from the CLI
    pub verbose: bool,
    /// Project-level storage directory (kickoff logs for replay)
    pub data_dir: PathBuf,
    /// Trained guidance file produced by `train`, applied when present
    pub guidance_file: Option<PathBuf>,
}

impl Default for CrewConfig {
    fn default() -> Self {
        Self {
            max_tool_rounds: 2,
            verbose: true,
            data_dir: PathBuf::from(".product-design"),
            guidance_file: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8501,
        }
    }
}

impl Config {
    /// Load configuration from default location or create default
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Config::default()),
        }
    }

    /// Load configuration from an explicit path; a missing file yields defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No config at {:?}, using defaults", path);
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    /// Get the configuration file path
    pub fn config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "product-design")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }
}
