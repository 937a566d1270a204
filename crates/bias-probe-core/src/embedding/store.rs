//! In-memory embedding table.

use std::cmp::Ordering;
use std::collections::HashMap;

use rayon::prelude::*;

use crate::error::{BiasError, BiasResult};

use super::provider::SimilarityProvider;
use super::similarity::{cosine_with_norms, l2_norm};

/// Immutable word → vector table backing [`SimilarityProvider`].
///
/// Vectors are stored row-major in one contiguous buffer, in vocabulary
/// order, with their L2 norms precomputed. The store is filled once by a
/// loader and is read-only afterwards.
#[derive(Debug, Clone)]
pub struct EmbeddingStore {
    dimension: usize,
    words: Vec<String>,
    index: HashMap<String, usize>,
    data: Vec<f32>,
    norms: Vec<f64>,
}

impl EmbeddingStore {
    /// Create an empty store for vectors of `dimension` components.
    pub fn new(dimension: usize) -> Self {
        Self::with_capacity(dimension, 0)
    }

    /// Empty store with room for `capacity` vectors. The matrix reservation
    /// is skipped when `capacity * dimension` overflows.
    pub fn with_capacity(dimension: usize, capacity: usize) -> Self {
        Self {
            dimension,
            words: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
            data: Vec::with_capacity(capacity.checked_mul(dimension).unwrap_or(0)),
            norms: Vec::with_capacity(capacity),
        }
    }

    /// Build a store from `(word, vector)` pairs.
    ///
    /// # Errors
    ///
    /// [`BiasError::DimensionMismatch`] if any vector is not `dimension` long.
    pub fn from_entries<S, I>(dimension: usize, entries: I) -> BiasResult<Self>
    where
        S: Into<String>,
        I: IntoIterator<Item = (S, Vec<f32>)>,
    {
        let mut store = Self::new(dimension);
        for (word, vector) in entries {
            store.insert(word.into(), &vector)?;
        }
        Ok(store)
    }

    /// Append a word. Returns `false` and keeps the existing vector when the
    /// word is already present.
    pub fn insert(&mut self, word: String, vector: &[f32]) -> BiasResult<bool> {
        if vector.len() != self.dimension {
            return Err(BiasError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        if self.index.contains_key(&word) {
            return Ok(false);
        }

        self.index.insert(word.clone(), self.words.len());
        self.words.push(word);
        self.data.extend_from_slice(vector);
        self.norms.push(l2_norm(vector));
        Ok(true)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.words.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Vocabulary in load order.
    pub fn words(&self) -> &[String] {
        &self.words
    }

    /// Row index of `word`.
    pub fn index_of(&self, word: &str) -> Option<usize> {
        self.index.get(word).copied()
    }

    /// Vector at row `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx >= self.len()`.
    #[inline]
    pub fn vector_at(&self, idx: usize) -> &[f32] {
        let start = idx * self.dimension;
        &self.data[start..start + self.dimension]
    }

    fn resolve_with_norm(&self, word: &str) -> BiasResult<(&[f32], f64)> {
        let idx = self
            .index_of(word)
            .ok_or_else(|| BiasError::UnresolvedWord {
                word: word.to_string(),
            })?;
        Ok((self.vector_at(idx), self.norms[idx]))
    }
}

/// Descending similarity, ties by ascending row index.
fn neighbor_order(a: &(usize, f64), b: &(usize, f64)) -> Ordering {
    b.1.total_cmp(&a.1).then(a.0.cmp(&b.0))
}

impl SimilarityProvider for EmbeddingStore {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn resolve(&self, word: &str) -> BiasResult<&[f32]> {
        self.resolve_with_norm(word).map(|(v, _)| v)
    }

    fn contains(&self, word: &str) -> bool {
        self.index.contains_key(word)
    }

    fn cosine(&self, a: &str, b: &str) -> BiasResult<f64> {
        let (va, na) = self.resolve_with_norm(a)?;
        let (vb, nb) = self.resolve_with_norm(b)?;
        Ok(cosine_with_norms(va, na, vb, nb))
    }

    fn cosine_many(&self, word: &str, others: &[String]) -> BiasResult<Vec<f64>> {
        let (target, target_norm) = self.resolve_with_norm(word)?;
        others
            .iter()
            .map(|other| {
                let (v, n) = self.resolve_with_norm(other)?;
                Ok(cosine_with_norms(target, target_norm, v, n))
            })
            .collect()
    }

    fn nearest_neighbors(&self, vector: &[f32], k: usize) -> Vec<(String, f64)> {
        if k == 0 || self.is_empty() || vector.len() != self.dimension {
            return Vec::new();
        }

        let query_norm = l2_norm(vector);
        let mut scored: Vec<(usize, f64)> = (0..self.len())
            .into_par_iter()
            .map(|idx| {
                (
                    idx,
                    cosine_with_norms(vector, query_norm, self.vector_at(idx), self.norms[idx]),
                )
            })
            .collect();

        if k < scored.len() {
            scored.select_nth_unstable_by(k - 1, neighbor_order);
            scored.truncate(k);
        }
        scored.sort_by(neighbor_order);

        scored
            .into_iter()
            .map(|(idx, sim)| (self.words[idx].clone(), sim))
            .collect()
    }
}
