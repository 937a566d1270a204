//! Word lists and word groups.
//!
//! Word list files are newline-delimited. Duplicates are removed on load
//! (first occurrence wins, so the order stays reproducible) and words unknown
//! to the embedding space are dropped without error by
//! [`WordGroup::filter_known`]. Everything that reaches the testing engine has
//! passed through that filter.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::{debug, warn};

use crate::embedding::SimilarityProvider;
use crate::error::{BiasError, BiasResult};

/// Read a newline-delimited word list, dropping blank lines and duplicates.
pub fn load_word_list(path: &Path) -> BiasResult<Vec<String>> {
    let file = File::open(path).map_err(|e| BiasError::io(path, e))?;
    let mut words = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line.map_err(|e| BiasError::io(path, e))?;
        let word = line.trim_end();
        if !word.is_empty() {
            words.push(word.to_string());
        }
    }
    let words = dedup_preserving_order(words);
    debug!(path = %path.display(), words = words.len(), "Loaded word list");
    Ok(words)
}

/// Remove repeated words, keeping the first occurrence.
pub fn dedup_preserving_order<I>(words: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    words
        .into_iter()
        .filter(|w| seen.insert(w.clone()))
        .collect()
}

/// A named set of words: an attribute pole or a target group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordGroup {
    name: String,
    words: Vec<String>,
}

impl WordGroup {
    /// Build a group; repeated words are dropped.
    pub fn new<S, I>(name: impl Into<String>, words: I) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = S>,
    {
        Self {
            name: name.into(),
            words: dedup_preserving_order(words.into_iter().map(Into::into)),
        }
    }

    /// Load a group from a word list file.
    pub fn load(name: impl Into<String>, path: &Path) -> BiasResult<Self> {
        Ok(Self {
            name: name.into(),
            words: load_word_list(path)?,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Keep only the words `provider` can resolve.
    pub fn filter_known<P: SimilarityProvider + ?Sized>(self, provider: &P) -> Self {
        let before = self.words.len();
        let words: Vec<String> = self
            .words
            .into_iter()
            .filter(|w| provider.contains(w))
            .collect();
        let dropped = before - words.len();
        if dropped > 0 {
            warn!(
                group = %self.name,
                dropped,
                kept = words.len(),
                "Dropped words missing from the embedding space"
            );
        }
        Self {
            name: self.name,
            words,
        }
    }
}

/// The two poles of the bias axis.
#[derive(Debug, Clone)]
pub struct AttributePair {
    male: WordGroup,
    female: WordGroup,
}

impl AttributePair {
    /// # Errors
    ///
    /// [`BiasError::InsufficientData`] if either group is empty.
    pub fn new(male: WordGroup, female: WordGroup) -> BiasResult<Self> {
        for group in [&male, &female] {
            if group.is_empty() {
                return Err(BiasError::InsufficientData(format!(
                    "attribute group '{}' has no words",
                    group.name()
                )));
            }
        }
        Ok(Self { male, female })
    }

    pub fn male(&self) -> &WordGroup {
        &self.male
    }

    pub fn female(&self) -> &WordGroup {
        &self.female
    }

    /// The same pair with the poles exchanged.
    pub fn swapped(&self) -> Self {
        Self {
            male: self.female.clone(),
            female: self.male.clone(),
        }
    }
}
