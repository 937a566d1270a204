//! Per-word association scores and group distributions.

use crate::embedding::SimilarityProvider;
use crate::error::BiasResult;
use crate::words::{AttributePair, WordGroup};

use super::stats::Moments;

/// Directional association of `word` with the attribute poles:
/// `mean cos(word, male) - mean cos(word, female)`.
///
/// Positive means closer to the male pole, negative closer to the female one.
///
/// # Errors
///
/// [`BiasError::UnresolvedWord`](crate::BiasError::UnresolvedWord) if `word`
/// or any attribute word is unknown to `provider`. Attribute words are never
/// skipped here; filter them once beforehand.
pub fn association_score<P: SimilarityProvider + ?Sized>(
    provider: &P,
    word: &str,
    attrs: &AttributePair,
) -> BiasResult<f64> {
    let male: Moments = provider.cosine_many(word, attrs.male().words())?.into_iter().collect();
    let female: Moments = provider
        .cosine_many(word, attrs.female().words())?
        .into_iter()
        .collect();
    Ok(male.mean() - female.mean())
}

/// Association scores of every word of a group, in the group's order.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupDistribution {
    words: Vec<String>,
    scores: Vec<f64>,
}

impl GroupDistribution {
    /// Build from already computed scores.
    ///
    /// # Panics
    ///
    /// Panics if `words` and `scores` differ in length.
    pub fn from_parts(words: Vec<String>, scores: Vec<f64>) -> Self {
        assert_eq!(
            words.len(),
            scores.len(),
            "every word needs exactly one score"
        );
        Self { words, scores }
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn scores(&self) -> &[f64] {
        &self.scores
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn moments(&self) -> Moments {
        self.scores.iter().collect()
    }

    /// Mean score; 0.0 when empty.
    pub fn mean(&self) -> f64 {
        self.moments().mean()
    }

    /// `(word, score)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.words
            .iter()
            .map(String::as_str)
            .zip(self.scores.iter().copied())
    }
}

/// Score every word of `words` against `attrs`, preserving order.
pub fn association_distribution<P: SimilarityProvider + ?Sized>(
    provider: &P,
    words: &[String],
    attrs: &AttributePair,
) -> BiasResult<GroupDistribution> {
    let scores = words
        .iter()
        .map(|w| association_score(provider, w, attrs))
        .collect::<BiasResult<Vec<f64>>>()?;
    Ok(GroupDistribution {
        words: words.to_vec(),
        scores,
    })
}

/// [`association_distribution`] over a [`WordGroup`].
pub fn group_distribution<P: SimilarityProvider + ?Sized>(
    provider: &P,
    group: &WordGroup,
    attrs: &AttributePair,
) -> BiasResult<GroupDistribution> {
    association_distribution(provider, group.words(), attrs)
}
