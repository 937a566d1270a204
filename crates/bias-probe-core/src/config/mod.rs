//! Configuration management for bias-probe.

mod sub_configs;


use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{BiasError, BiasResult};

pub use sub_configs::{
    ClusteringConfig, DescriptionConfig, EmbeddingConfig, HypotestConfig, LoggingConfig,
    PermutationConfig,
};

/// Environment variable prefix for configuration overrides.
pub const ENV_PREFIX: &str = "BIAS_PROBE";

/// Main configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct BiasConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub permutation: PermutationConfig,
    #[serde(default)]
    pub hypotest: HypotestConfig,
    #[serde(default)]
    pub clustering: ClusteringConfig,
    #[serde(default)]
    pub description: DescriptionConfig,
}

impl BiasConfig {
    /// Load configuration from an optional file and the environment.
    ///
    /// Sources are layered in order:
    /// 1. Built-in defaults
    /// 2. `path` (TOML), when given; it must exist
    /// 3. Environment variables with the `BIAS_PROBE` prefix and `__` separator,
    ///    e.g. `BIAS_PROBE__PERMUTATION__ITERATIONS=5000`
    ///
    /// The result is validated before it is returned.
    pub fn load(path: Option<&Path>) -> BiasResult<Self> {
        let config = Self::load_sources(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Layer the same sources as [`load`](Self::load) without validating, for
    /// callers that apply their own overrides first.
    pub fn load_sources(path: Option<&Path>) -> BiasResult<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );

        Ok(builder.build()?.try_deserialize()?)
    }

    /// Load configuration from a TOML file, without environment overrides.
    pub fn from_file(path: &Path) -> BiasResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            BiasError::ConfigError(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        let config: BiasConfig = toml::from_str(&content)
            .map_err(|e| BiasError::ConfigError(format!("Failed to parse config file: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Runs once, after CLI overrides are applied and before any case is
    /// processed. A non-positive iteration count is reported as
    /// [`BiasError::IterationCount`]; everything else as
    /// [`BiasError::ConfigError`].
    pub fn validate(&self) -> BiasResult<()> {
        self.permutation.validate()?;
        self.clustering.validate()?;

        if self.description.neighbors == 0 {
            return Err(BiasError::ConfigError(
                "description.neighbors must be greater than 0".into(),
            ));
        }

        if self.embedding.limit == Some(0) {
            return Err(BiasError::ConfigError(
                "embedding.limit must be greater than 0 when set".into(),
            ));
        }

        Ok(())
    }
}
