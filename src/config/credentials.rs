//! API credentials for the model and search services
//!
//! Resolution order per key: process environment, then `.env` in the
//! working directory, then `secrets.toml`. Empty values count as missing.
//! The `.env` file is read into a map; the process environment is never
//! modified.

use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use thiserror::Error;

pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const SERPER_API_KEY: &str = "SERPER_API_KEY";

/// Keys that must be present before any run starts, in reporting order
pub const REQUIRED_KEYS: [&str; 2] = [OPENAI_API_KEY, SERPER_API_KEY];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(
        "Missing required API keys: {}. Please set them either in .env file or secrets.toml.",
        .missing.join(", ")
    )]
    MissingCredentials { missing: Vec<&'static str> },

    #[error("Failed to read secrets file {path}: {message}")]
    Secrets { path: String, message: String },
}

/// Flat `KEY = "value"` secrets file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct SecretsFile {
    values: HashMap<String, toml::Value>,
}

impl SecretsFile {
    /// Load a secrets file; a missing file is empty
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Secrets {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Secrets {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(|v| v.as_str())
    }
}

/// Validated API keys, passed explicitly to the provider and tool constructors
#[derive(Clone)]
pub struct Credentials {
    pub openai_api_key: String,
    pub serper_api_key: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("openai_api_key", &"<redacted>")
            .field("serper_api_key", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    /// Resolve from the environment, `.env` in `working_dir` and `secrets_path`
    pub fn resolve(working_dir: &Path, secrets_path: &Path) -> Result<Self, ConfigError> {
        let dotenv = read_dotenv(&working_dir.join(".env"));
        let secrets = SecretsFile::load(secrets_path)?;
        Self::from_sources(
            |key| {
                std::env::var(key)
                    .ok()
                    .filter(|v| !v.trim().is_empty())
                    .or_else(|| dotenv.get(key).cloned())
            },
            &secrets,
        )
    }

    /// Resolve from an environment lookup and a secrets file, listing every missing key
    pub fn from_sources(
        env: impl Fn(&str) -> Option<String>,
        secrets: &SecretsFile,
    ) -> Result<Self, ConfigError> {
        let lookup = |key: &str| {
            env(key)
                .filter(|v| !v.trim().is_empty())
                .or_else(|| {
                    secrets
                        .get(key)
                        .filter(|v| !v.trim().is_empty())
                        .map(str::to_string)
                })
        };

        match REQUIRED_KEYS.map(lookup) {
            [Some(openai_api_key), Some(serper_api_key)] => Ok(Self {
                openai_api_key,
                serper_api_key,
            }),
            found => {
                let missing = REQUIRED_KEYS
                    .iter()
                    .zip(found.iter())
                    .filter(|(_, value)| value.is_none())
                    .map(|(key, _)| *key)
                    .collect();
                Err(ConfigError::MissingCredentials { missing })
            }
        }
    }
}

/// Parse a `.env` file into a map; a missing or unreadable file is empty
fn read_dotenv(path: &Path) -> HashMap<String, String> {
    if !path.exists() {
        return HashMap::new();
    }
    let iter = match dotenvy::from_path_iter(path) {
        Ok(iter) => iter,
        Err(e) => {
            tracing::warn!("Failed to read {}: {}", path.display(), e);
            return HashMap::new();
        }
    };
    let mut values = HashMap::new();
    for item in iter {
        match item {
            Ok((key, value)) => {
                values.insert(key, value);
            }
            Err(e) => tracing::warn!("Skipping malformed line in {}: {}", path.display(), e),
        }
    }
    values
}
