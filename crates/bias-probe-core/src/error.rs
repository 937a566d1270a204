//! Error types for bias-probe-core.
//!
//! This module defines the central error type [`BiasError`] used throughout
//! the crate, the [`BiasResult<T>`] alias, and [`CaseError`] which attaches a
//! test case name to an engine failure.
//!
//! # Examples
//!
//! ```rust
//! use bias_probe_core::BiasError;
//!
//! fn lookup(word: &str) -> Result<(), BiasError> {
//!     Err(BiasError::UnresolvedWord { word: word.to_string() })
//! }
//!
//! let err = lookup("qwerty").unwrap_err();
//! assert!(err.to_string().contains("qwerty"));
//! ```

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for bias-probe-core operations.
///
/// None of these failures are transient: every variant is a deterministic
/// function of the input data or configuration, so nothing is retried.
#[derive(Debug, Error)]
pub enum BiasError {
    /// A word required by a computation is absent from the embedding space.
    ///
    /// # When This Occurs
    ///
    /// - Scoring a target word that was not filtered against the vocabulary
    /// - Attribute groups built by hand instead of through `filter_known`
    #[error("Word not found in embedding space: '{word}'")]
    UnresolvedWord {
        /// The word that could not be resolved
        word: String,
    },

    /// A group that must be non-empty is empty.
    ///
    /// Aborts the current case only.
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// Permutation iteration count is below 1.
    ///
    /// Checked once at configuration time, before any case runs.
    #[error("Invalid iteration count: {iterations} (must be >= 1)")]
    IterationCount {
        /// The rejected iteration count
        iterations: i64,
    },

    /// Pooled standard deviation of the two association distributions is zero
    /// or undefined, so Cohen's d has no value.
    #[error("Degenerate variance: pooled standard deviation is zero or undefined (n_x={n_x}, n_y={n_y})")]
    DegenerateVariance {
        /// Size of the X distribution
        n_x: usize,
        /// Size of the Y distribution
        n_y: usize,
    },

    /// Embedding vector dimension does not match the store dimension.
    #[error("Invalid embedding dimension: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Configuration is invalid or could not be loaded.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Reading or writing a file failed.
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A line of an input file is malformed.
    #[error("Parse error in {} at line {line}: {message}", path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    /// K-means clustering could not run.
    #[error("Clustering error: {0}")]
    Clustering(String),
}

impl BiasError {
    /// Build an [`BiasError::Io`] for `path`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BiasError::Io {
            path: path.into(),
            source,
        }
    }

    /// Build a [`BiasError::Parse`] for `path` at 1-based `line`.
    pub fn parse(path: impl Into<PathBuf>, line: usize, message: impl Into<String>) -> Self {
        BiasError::Parse {
            path: path.into(),
            line,
            message: message.into(),
        }
    }

    /// Whether this failure is fixed by changing configuration rather than data.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            BiasError::IterationCount { .. } | BiasError::ConfigError(_)
        )
    }
}

impl From<config::ConfigError> for BiasError {
    fn from(err: config::ConfigError) -> Self {
        BiasError::ConfigError(err.to_string())
    }
}

/// Result type alias for bias-probe-core operations.
pub type BiasResult<T> = std::result::Result<T, BiasError>;

/// An engine failure attributed to a named test case.
///
/// Case errors abort only the case they belong to; the batch keeps going
/// unless the caller decides otherwise.
#[derive(Debug, Error)]
#[error("case '{case}' failed: {source}")]
pub struct CaseError {
    /// Name of the failed case, as given in the cases file
    pub case: String,
    /// Underlying failure
    #[source]
    pub source: BiasError,
}

impl CaseError {
    pub fn new(case: impl Into<String>, source: BiasError) -> Self {
        Self {
            case: case.into(),
            source,
        }
    }
}
