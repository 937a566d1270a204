//! Bias Probe Core Library
//!
//! Measures gender association in word embeddings.
//!
//! # Architecture
//!
//! This crate defines:
//! - The [`SimilarityProvider`] seam and an in-memory [`EmbeddingStore`]
//!   loaded from word2vec files
//! - Word lists and attribute/target groups ([`words`])
//! - The testing engine ([`weat`]): association scores, a seeded permutation
//!   test, Cohen's d, and batches of named test cases
//! - Vocabulary clustering and per-cluster gender scoring ([`clustering`])
//! - Error types and configuration
//!
//! # Example
//!
//! ```
//! use bias_probe_core::weat::{cohens_d, group_distribution, PermutationTest};
//! use bias_probe_core::words::{AttributePair, WordGroup};
//! use bias_probe_core::EmbeddingStore;
//!
//! let store = EmbeddingStore::from_entries(
//!     2,
//!     vec![
//!         ("he", vec![1.0, 0.0]),
//!         ("she", vec![0.0, 1.0]),
//!         ("doctor", vec![0.9, 0.2]),
//!         ("engineer", vec![0.95, 0.1]),
//!         ("nurse", vec![0.15, 0.9]),
//!         ("teacher", vec![0.3, 0.8]),
//!     ],
//! )?;
//! let attrs = AttributePair::new(
//!     WordGroup::new("male", ["he"]),
//!     WordGroup::new("female", ["she"]),
//! )?;
//!
//! let x = group_distribution(&store, &WordGroup::new("X", ["doctor", "engineer"]), &attrs)?;
//! let y = group_distribution(&store, &WordGroup::new("Y", ["nurse", "teacher"]), &attrs)?;
//!
//! let outcome = PermutationTest::new(1000)?.run(&x, &y)?;
//! assert!(outcome.p_value > 0.0 && outcome.p_value <= 1.0);
//! assert!(cohens_d(&x, &y)? > 0.0);
//! # Ok::<(), bias_probe_core::BiasError>(())
//! ```

pub mod clustering;
pub mod config;
pub mod embedding;
pub mod error;
pub mod weat;
pub mod words;

// Re-exports for convenience
pub use config::BiasConfig;
pub use embedding::{load_word2vec, EmbeddingFormat, EmbeddingStore, SimilarityProvider};
pub use error::{BiasError, BiasResult, CaseError};
