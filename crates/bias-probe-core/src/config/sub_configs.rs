//! Sub-configuration structures.
//!
//! Each section of `BiasConfig` lives here together with its serde defaults.

use serde::{Deserialize, Serialize};

use crate::embedding::EmbeddingFormat;
use crate::error::{BiasError, BiasResult};
use crate::weat::{DegeneratePolicy, PValueMethod, DEFAULT_ITERATIONS};

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Default `EnvFilter` directive when neither `-v` nor `RUST_LOG` is given.
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Embedding file configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct EmbeddingConfig {
    /// On-disk layout of the vectors file.
    #[serde(default)]
    pub format: EmbeddingFormat,

    /// Maximum number of vectors to read (whole file when unset).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

/// Permutation test configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PermutationConfig {
    /// Number of label-shuffled resamples per case.
    ///
    /// Signed so that a negative value from a file or the environment is
    /// reported as an iteration count error instead of a parse failure.
    #[serde(default = "default_iterations")]
    pub iterations: i64,

    /// Seed for the per-iteration ChaCha streams.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Spread iterations over the rayon thread pool.
    #[serde(default = "default_parallel")]
    pub parallel: bool,

    /// Monte-Carlo p-value convention.
    #[serde(default)]
    pub p_value: PValueMethod,
}

fn default_iterations() -> i64 {
    DEFAULT_ITERATIONS as i64
}

fn default_seed() -> u64 {
    42
}

fn default_parallel() -> bool {
    true
}

impl Default for PermutationConfig {
    fn default() -> Self {
        Self {
            iterations: default_iterations(),
            seed: default_seed(),
            parallel: default_parallel(),
            p_value: PValueMethod::default(),
        }
    }
}

impl PermutationConfig {
    /// Iteration count as `usize`, or [`BiasError::IterationCount`] if below 1.
    pub fn checked_iterations(&self) -> BiasResult<usize> {
        if self.iterations < 1 {
            return Err(BiasError::IterationCount {
                iterations: self.iterations,
            });
        }
        usize::try_from(self.iterations).map_err(|_| BiasError::IterationCount {
            iterations: self.iterations,
        })
    }

    pub fn validate(&self) -> BiasResult<()> {
        self.checked_iterations().map(|_| ())
    }
}

/// Case batch configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct HypotestConfig {
    /// What to do when Cohen's d is undefined for a case.
    #[serde(default)]
    pub degenerate: DegeneratePolicy,

    /// Append the comma-joined X and Y target words to each output record.
    #[serde(default)]
    pub include_words: bool,

    /// Abort the batch on the first failed case.
    #[serde(default)]
    pub fail_fast: bool,
}

/// Mini-batch k-means configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClusteringConfig {
    #[serde(default = "default_k")]
    pub k: usize,

    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Consecutive batches without inertia improvement before stopping.
    #[serde(default = "default_max_no_improvement")]
    pub max_no_improvement: usize,

    /// Upper bound on the number of mini-batch steps.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_k() -> usize {
    10
}

fn default_batch_size() -> usize {
    100
}

fn default_max_no_improvement() -> usize {
    10
}

fn default_max_iterations() -> usize {
    100
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            k: default_k(),
            batch_size: default_batch_size(),
            max_no_improvement: default_max_no_improvement(),
            max_iterations: default_max_iterations(),
            seed: default_seed(),
        }
    }
}

impl ClusteringConfig {
    pub fn validate(&self) -> BiasResult<()> {
        if self.k == 0 {
            return Err(BiasError::ConfigError(
                "clustering.k must be greater than 0".into(),
            ));
        }
        if self.batch_size == 0 {
            return Err(BiasError::ConfigError(
                "clustering.batch_size must be greater than 0".into(),
            ));
        }
        if self.max_iterations == 0 {
            return Err(BiasError::ConfigError(
                "clustering.max_iterations must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

/// Cluster description configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DescriptionConfig {
    /// Nearest neighbours of the centroid used to describe a cluster.
    #[serde(default = "default_neighbors")]
    pub neighbors: usize,
}

fn default_neighbors() -> usize {
    10
}

impl Default for DescriptionConfig {
    fn default() -> Self {
        Self {
            neighbors: default_neighbors(),
        }
    }
}
