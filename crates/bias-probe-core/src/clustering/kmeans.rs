//! Mini-batch k-means over the embedding vocabulary.
//!
//! # Algorithm
//!
//! 1. Seed `k` centres with k-means++ (D² sampling) on a random subsample of
//!    `max(3 * batch_size, k)` vectors.
//! 2. Draw a batch of `batch_size` vectors without replacement, assign each to
//!    its nearest centre, and move that centre towards it with learning rate
//!    `1 / count`, where `count` is the number of vectors the centre has
//!    absorbed so far.
//! 3. Track the batch inertia with an exponentially weighted average; stop
//!    after `max_no_improvement` batches without a new minimum, or after
//!    `max_iterations` batches.
//! 4. Label every vector with its nearest final centre.
//!
//! All randomness comes from one `ChaCha8Rng` seeded from the configuration,
//! so a fit is reproducible for a given store and seed.

use std::io::Write;

use rand::distributions::{Distribution, WeightedIndex};
use rand::seq::index;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::config::ClusteringConfig;
use crate::embedding::EmbeddingStore;
use crate::error::{BiasError, BiasResult};

/// Outcome of [`MiniBatchKMeans::fit`].
#[derive(Debug, Clone)]
pub struct KMeansResult {
    /// Cluster id of every vocabulary word, in store order.
    pub labels: Vec<usize>,
    /// `k` centres, each of the store dimension.
    pub centroids: Vec<Vec<f32>>,
    /// Mini-batch steps taken.
    pub batches: usize,
    /// Sum of squared distances of every vector to its centre.
    pub inertia: f64,
}

impl KMeansResult {
    /// Number of words per cluster id.
    pub fn cluster_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0usize; self.centroids.len()];
        for &label in &self.labels {
            sizes[label] += 1;
        }
        sizes
    }

    /// Write `word<TAB>cluster` lines in store order.
    pub fn write_labels<W: Write>(
        &self,
        words: &[String],
        writer: &mut W,
    ) -> std::io::Result<()> {
        for (word, label) in words.iter().zip(&self.labels) {
            writeln!(writer, "{}\t{}", word, label)?;
        }
        Ok(())
    }
}

/// Mini-batch k-means with k-means++ initialisation.
#[derive(Debug, Clone)]
pub struct MiniBatchKMeans {
    config: ClusteringConfig,
}

impl MiniBatchKMeans {
    /// # Errors
    ///
    /// [`BiasError::ConfigError`] if `config` does not validate.
    pub fn new(config: ClusteringConfig) -> BiasResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ClusteringConfig {
        &self.config
    }

    /// Cluster every vector of `store`.
    ///
    /// # Errors
    ///
    /// [`BiasError::Clustering`] if the store is empty or holds fewer than
    /// `k` words.
    pub fn fit(&self, store: &EmbeddingStore) -> BiasResult<KMeansResult> {
        let n = store.len();
        let k = self.config.k;
        if n == 0 {
            return Err(BiasError::Clustering("embedding store is empty".into()));
        }
        if k > n {
            return Err(BiasError::Clustering(format!(
                "k ({}) must be <= vocabulary size ({})",
                k, n
            )));
        }

        info!(
            k,
            n,
            batch_size = self.config.batch_size,
            seed = self.config.seed,
            "Starting mini-batch k-means"
        );

        let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed);
        let mut centroids = self.init_centroids(store, &mut rng)?;
        let mut counts = vec![0usize; k];

        let batch_len = self.config.batch_size.min(n);
        let alpha = (2.0 * batch_len as f64 / (n as f64 + 1.0)).min(1.0);
        let mut ewa_inertia: Option<f64> = None;
        let mut best_inertia = f64::INFINITY;
        let mut no_improvement = 0usize;
        let mut batches = 0usize;

        for step in 0..self.config.max_iterations {
            batches = step + 1;
            let batch = index::sample(&mut rng, n, batch_len).into_vec();

            let assigned: Vec<(usize, usize, f64)> = batch
                .iter()
                .map(|&idx| {
                    let (centre, dist) = nearest_centre(store.vector_at(idx), &centroids);
                    (idx, centre, dist)
                })
                .collect();
            let batch_inertia =
                assigned.iter().map(|&(_, _, d)| d).sum::<f64>() / batch_len as f64;

            for &(idx, centre, _) in &assigned {
                counts[centre] += 1;
                let eta = 1.0 / counts[centre] as f32;
                for (c, &x) in centroids[centre].iter_mut().zip(store.vector_at(idx)) {
                    *c += eta * (x - *c);
                }
            }

            let smoothed = match ewa_inertia {
                Some(prev) => prev * (1.0 - alpha) + batch_inertia * alpha,
                None => batch_inertia,
            };
            ewa_inertia = Some(smoothed);

            if smoothed < best_inertia {
                best_inertia = smoothed;
                no_improvement = 0;
            } else {
                no_improvement += 1;
            }

            let patience = self.config.max_no_improvement;
            if patience > 0 && no_improvement >= patience {
                debug!(step, smoothed, "Smoothed inertia stopped improving");
                break;
            }
        }

        let (labels, distances): (Vec<usize>, Vec<f64>) = (0..n)
            .into_par_iter()
            .map(|idx| nearest_centre(store.vector_at(idx), &centroids))
            .unzip();
        let inertia: f64 = distances.iter().sum();

        info!(batches, inertia, "Mini-batch k-means finished");

        Ok(KMeansResult {
            labels,
            centroids,
            batches,
            inertia,
        })
    }

    /// k-means++ on a random subsample of the vocabulary.
    fn init_centroids(
        &self,
        store: &EmbeddingStore,
        rng: &mut ChaCha8Rng,
    ) -> BiasResult<Vec<Vec<f32>>> {
        let n = store.len();
        let k = self.config.k;
        let init_size = (3 * self.config.batch_size).max(k).min(n);
        let sample = index::sample(rng, n, init_size).into_vec();

        let first = rng.gen_range(0..sample.len());
        let mut chosen = Vec::with_capacity(k);
        chosen.push(first);
        let first_centre = store.vector_at(sample[first]);
        let mut min_dist: Vec<f64> = sample
            .iter()
            .map(|&idx| squared_distance(store.vector_at(idx), first_centre))
            .collect();

        while chosen.len() < k {
            let total: f64 = min_dist.iter().sum();
            let next = if total > 0.0 && total.is_finite() {
                let weights = WeightedIndex::new(&min_dist).map_err(|e| {
                    BiasError::Clustering(format!("k-means++ sampling failed: {}", e))
                })?;
                weights.sample(rng)
            } else {
                // every sampled vector coincides with a centre
                match (0..sample.len()).find(|i| !chosen.contains(i)) {
                    Some(i) => i,
                    None => break,
                }
            };
            chosen.push(next);

            let centre = store.vector_at(sample[next]);
            for (d, &idx) in min_dist.iter_mut().zip(&sample) {
                *d = d.min(squared_distance(store.vector_at(idx), centre));
            }
        }

        debug!(init_size, centres = chosen.len(), "k-means++ initialisation done");
        Ok(chosen
            .into_iter()
            .map(|i| store.vector_at(sample[i]).to_vec())
            .collect())
    }
}

#[inline]
fn squared_distance(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(&x, &y)| {
            let d = (x - y) as f64;
            d * d
        })
        .sum()
}

/// Index of and squared distance to the closest centre; ties go to the lower index.
fn nearest_centre(vector: &[f32], centroids: &[Vec<f32>]) -> (usize, f64) {
    let mut best = (0, f64::INFINITY);
    for (j, centre) in centroids.iter().enumerate() {
        let dist = squared_distance(vector, centre);
        if dist < best.1 {
            best = (j, dist);
        }
    }
    best
}
