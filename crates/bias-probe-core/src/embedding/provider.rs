//! The vector similarity capability consumed by the testing engine.

use crate::error::{BiasError, BiasResult};

use super::similarity::cosine_similarity;

/// Read-only access to word vectors and their cosine similarities.
///
/// The engine never mutates a provider, so implementations must be safe to
/// share across the rayon pool (`Send + Sync`).
///
/// Only [`resolve`](Self::resolve), [`dimension`](Self::dimension) and
/// [`nearest_neighbors`](Self::nearest_neighbors) are required; the similarity
/// methods have defaults built on `resolve`.
pub trait SimilarityProvider: Send + Sync {
    /// Dimension shared by every vector.
    fn dimension(&self) -> usize;

    /// Look up the vector of `word`.
    ///
    /// # Errors
    ///
    /// [`BiasError::UnresolvedWord`](crate::BiasError::UnresolvedWord) if the
    /// word is not in the vocabulary.
    fn resolve(&self, word: &str) -> BiasResult<&[f32]>;

    /// The `k` vocabulary words most cosine-similar to `vector`, best first.
    fn nearest_neighbors(&self, vector: &[f32], k: usize) -> Vec<(String, f64)>;

    /// Whether `word` resolves.
    fn contains(&self, word: &str) -> bool {
        self.resolve(word).is_ok()
    }

    /// Cosine similarity between two words.
    fn cosine(&self, a: &str, b: &str) -> BiasResult<f64> {
        Ok(cosine_similarity(self.resolve(a)?, self.resolve(b)?))
    }

    /// Cosine similarity between `word` and each of `others`, in order.
    fn cosine_many(&self, word: &str, others: &[String]) -> BiasResult<Vec<f64>> {
        let target = self.resolve(word)?;
        others
            .iter()
            .map(|other| Ok(cosine_similarity(target, self.resolve(other)?)))
            .collect()
    }

    /// Mean vector of `words`, accumulated in f64.
    ///
    /// # Errors
    ///
    /// [`BiasError::InsufficientData`] for an empty slice,
    /// [`BiasError::UnresolvedWord`] for an unknown member.
    fn centroid(&self, words: &[String]) -> BiasResult<Vec<f32>> {
        if words.is_empty() {
            return Err(BiasError::InsufficientData(
                "centroid of an empty word set".into(),
            ));
        }

        let mut sum = vec![0.0f64; self.dimension()];
        for word in words {
            for (acc, &x) in sum.iter_mut().zip(self.resolve(word)?) {
                *acc += x as f64;
            }
        }
        let n = words.len() as f64;
        Ok(sum.into_iter().map(|s| (s / n) as f32).collect())
    }
}
