//! Configuration management for the skill matcher

use crate::error::{Result, SkillMatcherError};
use crate::matching::matcher::DEFAULT_THRESHOLD;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub matching: MatchingConfig,
    pub embedding: EmbeddingConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchingConfig {
    pub threshold: f32,
    /// Canonicalize both skill lists before matching
    pub normalize_labels: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    pub provider: EmbeddingProvider,
    pub enable_cache: bool,
    pub local: LocalEmbeddingConfig,
    pub remote: RemoteEmbeddingConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    #[serde(alias = "Local")]
    Local,
    #[serde(alias = "Remote")]
    Remote,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalEmbeddingConfig {
    pub models_dir: PathBuf,
    /// Model id from the registry, a Hugging Face repo id, or a local path
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalize: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteEmbeddingConfig {
    pub api_format: RemoteApiFormat,
    pub base_url: String,
    pub model: String,
    /// Name of the environment variable holding the API key
    pub api_key_env: String,
    pub timeout_secs: u64,
    pub max_batch_size: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_type: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemoteApiFormat {
    #[serde(alias = "OpenAi")]
    OpenAi,
    #[serde(alias = "Cohere")]
    Cohere,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub detailed: bool,
    pub color_output: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[serde(alias = "Console")]
    Console,
    #[serde(alias = "Json")]
    Json,
}

impl Default for Config {
    fn default() -> Self {
        let models_dir = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".skill-matcher")
            .join("models");

        Self {
            matching: MatchingConfig {
                threshold: DEFAULT_THRESHOLD,
                normalize_labels: false,
            },
            embedding: EmbeddingConfig {
                provider: EmbeddingProvider::Local,
                enable_cache: true,
                local: LocalEmbeddingConfig {
                    models_dir,
                    model: "potion-base-8M".to_string(),
                    normalize: None,
                },
                remote: RemoteEmbeddingConfig {
                    api_format: RemoteApiFormat::OpenAi,
                    base_url: "https://api.openai.com".to_string(),
                    model: "text-embedding-3-small".to_string(),
                    api_key_env: "OPENAI_API_KEY".to_string(),
                    timeout_secs: 30,
                    max_batch_size: 96,
                    dimensions: None,
                    input_type: None,
                },
            },
            output: OutputConfig {
                format: OutputFormat::Console,
                detailed: false,
                color_output: true,
            },
        }
    }
}

impl Config {
    /// Load from the default location, writing defaults on first use
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = toml::from_str(&content)
                .map_err(|e| SkillMatcherError::Configuration(format!("Failed to parse config: {}", e)))?;
            config.validate()?;
            Ok(config)
        } else {
            let config = Self::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| SkillMatcherError::Configuration(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
            .join("skill-matcher")
            .join("config.toml")
    }

    pub fn models_dir(&self) -> &PathBuf {
        &self.embedding.local.models_dir
    }

    pub fn validate(&self) -> Result<()> {
        let threshold = self.matching.threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(SkillMatcherError::Configuration(format!(
                "matching.threshold must be within [0, 1], got {}",
                threshold
            )));
        }
        if self.embedding.remote.max_batch_size == 0 {
            return Err(SkillMatcherError::Configuration(
                "embedding.remote.max_batch_size must be greater than zero".to_string(),
            ));
        }
        if self.embedding.remote.timeout_secs == 0 {
            return Err(SkillMatcherError::Configuration(
                "embedding.remote.timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Set a value by dotted key (e.g. `matching.threshold`).
    ///
    /// Existing keys keep their TOML type; unset optional keys are parsed as
    /// integer, float, boolean, then string.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let unknown = || SkillMatcherError::Configuration(format!("Unknown configuration key: {}", key));

        let mut root = toml::Value::try_from(&*self)
            .map_err(|e| SkillMatcherError::Configuration(format!("Failed to serialize config: {}", e)))?;

        let parts: Vec<&str> = key.split('.').collect();
        let (last, parents) = parts.split_last().ok_or_else(unknown)?;

        let mut current = &mut root;
        for part in parents {
            current = current.get_mut(*part).ok_or_else(unknown)?;
        }
        let table = current.as_table_mut().ok_or_else(unknown)?;

        let parsed = match table.get(*last) {
            Some(toml::Value::Table(_)) => {
                return Err(SkillMatcherError::Configuration(format!(
                    "{} is a section, not a value",
                    key
                )))
            }
            Some(existing) => Self::parse_like(existing, value, key)?,
            None => Self::parse_untyped(value),
        };
        table.insert(last.to_string(), parsed);

        let updated: Config = root
            .try_into()
            .map_err(|e| SkillMatcherError::Configuration(format!("Invalid value for {}: {}", key, e)))?;

        // Unknown keys are silently dropped by deserialization; catch them here
        let check = toml::Value::try_from(&updated)
            .map_err(|e| SkillMatcherError::Configuration(format!("Failed to serialize config: {}", e)))?;
        let mut probe = &check;
        for part in &parts {
            probe = probe.get(*part).ok_or_else(unknown)?;
        }

        updated.validate()?;
        *self = updated;
        Ok(())
    }

    fn parse_like(existing: &toml::Value, value: &str, key: &str) -> Result<toml::Value> {
        let invalid = |kind: &str| {
            SkillMatcherError::Configuration(format!("{} expects {}, got '{}'", key, kind, value))
        };

        match existing {
            toml::Value::String(_) => Ok(toml::Value::String(value.to_string())),
            toml::Value::Integer(_) => value
                .parse::<i64>()
                .map(toml::Value::Integer)
                .map_err(|_| invalid("an integer")),
            toml::Value::Float(_) => value
                .parse::<f64>()
                .map(toml::Value::Float)
                .map_err(|_| invalid("a number")),
            toml::Value::Boolean(_) => value
                .parse::<bool>()
                .map(toml::Value::Boolean)
                .map_err(|_| invalid("true or false")),
            _ => Err(invalid("a scalar value")),
        }
    }

    fn parse_untyped(value: &str) -> toml::Value {
        if let Ok(i) = value.parse::<i64>() {
            toml::Value::Integer(i)
        } else if let Ok(f) = value.parse::<f64>() {
            toml::Value::Float(f)
        } else if let Ok(b) = value.parse::<bool>() {
            toml::Value::Boolean(b)
        } else {
            toml::Value::String(value.to_string())
        }
    }
}
