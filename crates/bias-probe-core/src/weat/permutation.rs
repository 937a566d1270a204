//! WEAT-style permutation significance test.
//!
//! # Algorithm
//!
//! 1. Observed statistic `s_obs = mean(X scores) - mean(Y scores)`.
//! 2. Pool the `(word, score)` pairs of both groups and order the pool by word
//!    (then score), so the pool does not depend on which group was passed as X.
//! 3. For each iteration `i`, seed a ChaCha stream from `(seed, i)`, pick a
//!    uniform random subset of size `min(|X|, |Y|)` with a partial
//!    Fisher-Yates shuffle, and record `s_i = mean(subset) - mean(rest)`.
//! 4. Count the iterations with `|s_i| >= |s_obs|` and turn the count into a
//!    two-sided Monte-Carlo p-value.
//!
//! Association scores are computed once per word by the caller
//! ([`GroupDistribution`]); iterations only reshuffle group membership.
//! Because every iteration owns its RNG stream, the sequential and the rayon
//! paths produce the same count.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{BiasError, BiasResult};

use super::association::GroupDistribution;
use super::stats::Moments;

/// Default number of resamples.
pub const DEFAULT_ITERATIONS: usize = 1000;

/// Absolute slack when comparing a null statistic with the observed one, so
/// relabelings equal to the observed split are not lost to rounding.
pub const TIE_TOLERANCE: f64 = 1e-12;

/// How the extreme count becomes a p-value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PValueMethod {
    /// `(count + 1) / (iterations + 1)`; never 0.
    #[default]
    Smoothed,
    /// `count / iterations`; 0 when no resample is as extreme.
    Raw,
}

impl PValueMethod {
    pub fn p_value(&self, extreme_count: usize, iterations: usize) -> f64 {
        match self {
            PValueMethod::Smoothed => (extreme_count + 1) as f64 / (iterations + 1) as f64,
            PValueMethod::Raw => extreme_count as f64 / iterations as f64,
        }
    }
}

/// Result of one permutation test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PermutationOutcome {
    /// `mean(X) - mean(Y)` under the true assignment.
    pub observed: f64,
    /// Two-sided p-value in `[0, 1]`.
    pub p_value: f64,
    /// Null statistics with `|s_i| >= |s_obs|`.
    pub extreme_count: usize,
    pub iterations: usize,
}

/// Configured permutation test.
#[derive(Debug, Clone)]
pub struct PermutationTest {
    iterations: usize,
    seed: u64,
    parallel: bool,
    method: PValueMethod,
}

impl PermutationTest {
    /// Test with `iterations` resamples, seed 42, parallel, smoothed p-value.
    ///
    /// # Errors
    ///
    /// [`BiasError::IterationCount`] if `iterations` is 0.
    pub fn new(iterations: usize) -> BiasResult<Self> {
        if iterations == 0 {
            return Err(BiasError::IterationCount { iterations: 0 });
        }
        Ok(Self {
            iterations,
            seed: 42,
            parallel: true,
            method: PValueMethod::default(),
        })
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_method(mut self, method: PValueMethod) -> Self {
        self.method = method;
        self
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn method(&self) -> PValueMethod {
        self.method
    }

    /// Run the test on the association distributions of X and Y.
    ///
    /// # Errors
    ///
    /// [`BiasError::InsufficientData`] if either distribution is empty.
    pub fn run(&self, x: &GroupDistribution, y: &GroupDistribution) -> BiasResult<PermutationOutcome> {
        if x.is_empty() || y.is_empty() {
            return Err(BiasError::InsufficientData(format!(
                "permutation test needs non-empty groups (|X|={}, |Y|={})",
                x.len(),
                y.len()
            )));
        }

        let observed = x.mean() - y.mean();
        let threshold = observed.abs() - TIE_TOLERANCE;
        let pool = canonical_pool(x, y);
        let split = x.len().min(y.len());

        let is_extreme = |i: usize| null_statistic(&pool, split, self.seed, i).abs() >= threshold;
        let extreme_count = if self.parallel {
            (0..self.iterations)
                .into_par_iter()
                .filter(|&i| is_extreme(i))
                .count()
        } else {
            (0..self.iterations).filter(|&i| is_extreme(i)).count()
        };

        let p_value = self.method.p_value(extreme_count, self.iterations);
        debug!(
            observed,
            extreme_count,
            iterations = self.iterations,
            p_value,
            "Permutation test finished"
        );

        Ok(PermutationOutcome {
            observed,
            p_value,
            extreme_count,
            iterations: self.iterations,
        })
    }

    /// The full null distribution, in iteration order.
    ///
    /// Same statistics as [`run`](Self::run) counts; mostly useful for
    /// inspection and tests.
    pub fn null_distribution(
        &self,
        x: &GroupDistribution,
        y: &GroupDistribution,
    ) -> BiasResult<Vec<f64>> {
        if x.is_empty() || y.is_empty() {
            return Err(BiasError::InsufficientData(
                "permutation test needs non-empty groups".into(),
            ));
        }
        let pool = canonical_pool(x, y);
        let split = x.len().min(y.len());
        Ok((0..self.iterations)
            .map(|i| null_statistic(&pool, split, self.seed, i))
            .collect())
    }
}

/// Pooled scores ordered by `(word, score)`.
fn canonical_pool(x: &GroupDistribution, y: &GroupDistribution) -> Vec<f64> {
    let mut pairs: Vec<(&str, f64)> = x.iter().chain(y.iter()).collect();
    pairs.sort_by(|a, b| a.0.cmp(b.0).then(a.1.total_cmp(&b.1)));
    pairs.into_iter().map(|(_, score)| score).collect()
}

/// `mean(first split) - mean(rest)` for the relabeling of iteration `i`.
fn null_statistic(pool: &[f64], split: usize, seed: u64, iteration: usize) -> f64 {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(iteration as u64);

    let mut shuffled = pool.to_vec();
    let (chosen, rest) = shuffled.partial_shuffle(&mut rng, split);
    let chosen: Moments = chosen.iter().collect();
    let rest: Moments = rest.iter().collect();
    chosen.mean() - rest.mean()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dist(pairs: &[(&str, f64)]) -> GroupDistribution {
        GroupDistribution::from_parts(
            pairs.iter().map(|(w, _)| w.to_string()).collect(),
            pairs.iter().map(|(_, s)| *s).collect(),
        )
    }

    fn separated() -> (GroupDistribution, GroupDistribution) {
        let x = dist(&[
            ("a1", 0.30),
            ("a2", 0.28),
            ("a3", 0.33),
            ("a4", 0.31),
            ("a5", 0.29),
            ("a6", 0.32),
        ]);
        let y = dist(&[
            ("b1", -0.30),
            ("b2", -0.27),
            ("b3", -0.34),
            ("b4", -0.31),
            ("b5", -0.29),
            ("b6", -0.33),
        ]);
        (x, y)
    }

    #[test]
    fn test_zero_iterations_rejected() {
        assert!(matches!(
            PermutationTest::new(0),
            Err(BiasError::IterationCount { iterations: 0 })
        ));
    }

    #[test]
    fn test_empty_group_rejected() {
        let test = PermutationTest::new(10).unwrap();
        let (x, _) = separated();
        let empty = dist(&[]);
        assert!(matches!(
            test.run(&x, &empty),
            Err(BiasError::InsufficientData(_))
        ));
        assert!(matches!(
            test.run(&empty, &x),
            Err(BiasError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_separated_groups_small_p_value() {
        let (x, y) = separated();
        let outcome = PermutationTest::new(1000).unwrap().run(&x, &y).unwrap();
        assert!(outcome.observed > 0.5);
        // only the true split and its mirror reach the observed gap: 2 of 924
        assert!(outcome.p_value < 0.05, "p = {}", outcome.p_value);
    }

    #[test]
    fn test_identical_groups_p_value_is_one() {
        let (x, _) = separated();
        let outcome = PermutationTest::new(200).unwrap().run(&x, &x).unwrap();
        assert_eq!(outcome.observed, 0.0);
        assert_eq!(outcome.extreme_count, 200);
        assert_eq!(outcome.p_value, 1.0);
    }

    #[test]
    fn test_swap_invariance_equal_sizes() {
        let (x, y) = separated();
        let test = PermutationTest::new(500).unwrap();
        let xy = test.run(&x, &y).unwrap();
        let yx = test.run(&y, &x).unwrap();
        assert_eq!(xy.p_value, yx.p_value);
        assert_eq!(xy.observed, -yx.observed);
    }

    #[test]
    fn test_swap_invariance_unequal_sizes() {
        let x = dist(&[("m", 0.1), ("k", -0.2), ("q", 0.05)]);
        let y = dist(&[("z", 0.0), ("c", 0.12), ("d", -0.07), ("e", 0.3), ("f", 0.01)]);
        let test = PermutationTest::new(300).unwrap().with_seed(9);
        assert_eq!(
            test.run(&x, &y).unwrap().p_value,
            test.run(&y, &x).unwrap().p_value
        );
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let (x, y) = separated();
        let par = PermutationTest::new(400).unwrap().with_parallel(true);
        let seq = PermutationTest::new(400).unwrap().with_parallel(false);
        assert_eq!(par.run(&x, &y).unwrap(), seq.run(&x, &y).unwrap());
    }

    #[test]
    fn test_seed_changes_draws() {
        let (x, y) = separated();
        let a = PermutationTest::new(50).unwrap().with_seed(1);
        let b = PermutationTest::new(50).unwrap().with_seed(2);
        assert_ne!(
            a.null_distribution(&x, &y).unwrap(),
            b.null_distribution(&x, &y).unwrap()
        );
    }

    #[test]
    fn test_input_order_does_not_matter() {
        let (x, y) = separated();
        let mut rev_words = x.words().to_vec();
        let mut rev_scores = x.scores().to_vec();
        rev_words.reverse();
        rev_scores.reverse();
        let x_rev = GroupDistribution::from_parts(rev_words, rev_scores);

        let test = PermutationTest::new(300).unwrap();
        assert_eq!(
            test.run(&x, &y).unwrap().extreme_count,
            test.run(&x_rev, &y).unwrap().extreme_count
        );
    }

    #[test]
    fn test_smoothed_p_value_bounds() {
        let (x, y) = separated();
        let iterations = 100;
        let outcome = PermutationTest::new(iterations).unwrap().run(&x, &y).unwrap();
        assert!(outcome.p_value >= 1.0 / (iterations as f64 + 1.0));
        assert!(outcome.p_value <= 1.0);
    }

    #[test]
    fn test_raw_p_value_can_be_zero() {
        assert_eq!(PValueMethod::Raw.p_value(0, 100), 0.0);
        assert_eq!(PValueMethod::Smoothed.p_value(0, 100), 1.0 / 101.0);
        assert_eq!(PValueMethod::Smoothed.p_value(100, 100), 1.0);
    }

    #[test]
    fn test_null_distribution_is_centered() {
        let (x, y) = separated();
        let null = PermutationTest::new(2000)
            .unwrap()
            .null_distribution(&x, &y)
            .unwrap();
        let m: Moments = null.iter().collect();
        assert!(m.mean().abs() < 0.05, "null mean {}", m.mean());
    }

    #[test]
    fn test_single_iteration_works() {
        let (x, y) = separated();
        let outcome = PermutationTest::new(1).unwrap().run(&x, &y).unwrap();
        assert_eq!(outcome.iterations, 1);
        assert!(outcome.p_value == 0.5 || outcome.p_value == 1.0);
    }
}
