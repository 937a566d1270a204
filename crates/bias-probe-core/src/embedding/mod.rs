//! Word vectors: the similarity capability, the in-memory store, and loaders.
//!
//! The testing engine only sees [`SimilarityProvider`]. [`EmbeddingStore`] is
//! the implementation used by the command line tools, constructed once at
//! start-up from a word2vec file and shared read-only afterwards.

mod loader;
mod provider;
mod similarity;
mod store;

pub use loader::{load_word2vec, EmbeddingFormat};
pub use provider::SimilarityProvider;
pub use similarity::{cosine_similarity, l2_norm};
pub use store::EmbeddingStore;
