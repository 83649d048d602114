// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Pattern Engine Configuration
//
// YAML-backed settings for the matcher, the deduplicator and the embedding
// provider. Every field has a default so an empty file is a valid config.
// Discovery and env overrides follow the node configuration conventions.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::application::{DeduplicationOptions, MatchOptions};
use crate::infrastructure::DEFAULT_EMBEDDING_DIMENSION;

pub const CONFIG_PATH_ENV: &str = "AEGIS_PATTERN_CONFIG_PATH";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatternEngineConfig {
    #[serde(default)]
    pub matcher: MatchOptions,

    #[serde(default)]
    pub deduplicator: DeduplicationOptions,

    #[serde(default)]
    pub embedding: EmbeddingConfig,
}

/// Which embedding backend to use
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum EmbeddingConfig {
    Hash {
        #[serde(default = "default_dimension")]
        dimension: usize,
    },
    Ollama {
        endpoint: String,
        model: String,
        #[serde(default = "default_dimension")]
        dimension: usize,
    },
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        EmbeddingConfig::Hash {
            dimension: default_dimension(),
        }
    }
}

fn default_dimension() -> usize {
    DEFAULT_EMBEDDING_DIMENSION
}

impl PatternEngineConfig {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config at {:?}", path))?;
        Self::from_yaml_str(&content)
    }

    /// Save configuration to YAML file
    pub fn to_yaml_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Parse configuration from YAML string
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Discover configuration file using precedence order
    /// 1. AEGIS_PATTERN_CONFIG_PATH environment variable
    /// 2. ./aegis-patterns.yaml (working directory)
    /// 3. ~/.aegis/patterns.yaml (user home)
    pub fn discover_config() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let cwd = PathBuf::from("./aegis-patterns.yaml");
        if cwd.exists() {
            return Some(cwd);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".aegis").join("patterns.yaml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        None
    }

    /// Load configuration with discovery, fallback to default
    pub fn load_or_default(explicit_path: Option<PathBuf>) -> anyhow::Result<Self> {
        let mut config = if let Some(path) = explicit_path {
            tracing::info!("Loading pattern engine configuration from explicit path: {:?}", path);
            Self::from_yaml_file(&path)?
        } else if let Some(path) = Self::discover_config() {
            tracing::info!("Loading pattern engine configuration from discovered path: {:?}", path);
            Self::from_yaml_file(&path)?
        } else {
            tracing::debug!("No pattern engine configuration found, using defaults");
            Self::default()
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        if let Some(value) = env_f64("AEGIS_PATTERN_MIN_CONFIDENCE") {
            tracing::info!("Environment override: AEGIS_PATTERN_MIN_CONFIDENCE={}", value);
            self.matcher.min_confidence = value;
        }

        if let Some(value) = env_f64("AEGIS_PATTERN_SIMILARITY_THRESHOLD") {
            tracing::info!("Environment override: AEGIS_PATTERN_SIMILARITY_THRESHOLD={}", value);
            self.deduplicator.similarity_threshold = value;
        }

        if let Ok(val) = std::env::var("AEGIS_PATTERN_USE_SEMANTIC") {
            match val.to_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => self.matcher.use_semantic = true,
                "false" | "0" | "no" | "off" => self.matcher.use_semantic = false,
                _ => tracing::warn!(
                    "Invalid value for AEGIS_PATTERN_USE_SEMANTIC: '{}'. Expected true/false. Ignoring.",
                    val
                ),
            }
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.matcher.limit == 0 {
            anyhow::bail!("matcher.limit must be greater than 0");
        }

        if !(0.0..=1.0).contains(&self.matcher.min_confidence) {
            anyhow::bail!(
                "matcher.min_confidence must be within [0, 1], got {}",
                self.matcher.min_confidence
            );
        }

        if !(0.0..=1.0).contains(&self.deduplicator.similarity_threshold) {
            anyhow::bail!(
                "deduplicator.similarity_threshold must be within [0, 1], got {}",
                self.deduplicator.similarity_threshold
            );
        }

        match &self.embedding {
            EmbeddingConfig::Hash { dimension } => {
                if *dimension == 0 {
                    anyhow::bail!("embedding.dimension must be greater than 0");
                }
            }
            EmbeddingConfig::Ollama { endpoint, model, dimension } => {
                if endpoint.is_empty() {
                    anyhow::bail!("embedding.endpoint cannot be empty");
                }
                if model.is_empty() {
                    anyhow::bail!("embedding.model cannot be empty");
                }
                if *dimension == 0 {
                    anyhow::bail!("embedding.dimension must be greater than 0");
                }
            }
        }

        Ok(())
    }
}

fn env_f64(key: &str) -> Option<f64> {
    let raw = std::env::var(key).ok()?;
    match raw.parse::<f64>() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Invalid value for {}: '{}'. Expected a number. Ignoring.", key, raw);
            None
        }
    }
}
