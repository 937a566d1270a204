//! Per-word gender labels for every cluster.

use std::fmt;
use std::io::Write;

use serde::Serialize;
use tracing::{debug, info};

use crate::embedding::SimilarityProvider;
use crate::error::BiasResult;
use crate::weat::association_score;
use crate::words::AttributePair;

use super::assignments::ClusterAssignments;

/// Neighbours used for a cluster description unless configured otherwise.
pub const DEFAULT_NEIGHBORS: usize = 10;

/// Pole a word leans towards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GenderLabel {
    Male,
    Female,
}

impl GenderLabel {
    /// `Female` for a negative score, `Male` otherwise.
    ///
    /// An exact 0.0 is labelled `Male`, as is NaN.
    pub fn from_score(score: f64) -> Self {
        if score < 0.0 {
            GenderLabel::Female
        } else {
            GenderLabel::Male
        }
    }

    pub fn as_char(&self) -> char {
        match self {
            GenderLabel::Male => 'M',
            GenderLabel::Female => 'F',
        }
    }
}

impl fmt::Display for GenderLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// One output line of the cluster scorer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterWordRecord {
    pub cluster: usize,
    /// Comma-joined nearest neighbours of the cluster centroid.
    pub description: String,
    pub word: String,
    pub label: GenderLabel,
    pub score: f64,
}

impl ClusterWordRecord {
    /// `cluster  description  word  label  score`, without the newline.
    pub fn to_tsv_line(&self) -> String {
        format!(
            "{}\t{}\t{}\t{}\t{}",
            self.cluster, self.description, self.word, self.label, self.score
        )
    }
}

/// Write records, one line each.
pub fn write_cluster_records<W: Write>(
    writer: &mut W,
    records: &[ClusterWordRecord],
) -> std::io::Result<()> {
    for record in records {
        writeln!(writer, "{}", record.to_tsv_line())?;
    }
    Ok(())
}

/// Labels cluster members against fixed attribute groups.
pub struct ClusterGenderScorer<'a, P: SimilarityProvider + ?Sized> {
    provider: &'a P,
    attrs: &'a AttributePair,
    neighbors: usize,
}

impl<'a, P: SimilarityProvider + ?Sized> ClusterGenderScorer<'a, P> {
    /// `attrs` must already be filtered against `provider`.
    pub fn new(provider: &'a P, attrs: &'a AttributePair) -> Self {
        Self {
            provider,
            attrs,
            neighbors: DEFAULT_NEIGHBORS,
        }
    }

    pub fn with_neighbors(mut self, neighbors: usize) -> Self {
        self.neighbors = neighbors;
        self
    }

    /// Nearest vocabulary words of the centroid of `words`, comma-joined.
    pub fn describe(&self, words: &[String]) -> BiasResult<String> {
        let centroid = self.provider.centroid(words)?;
        let neighbors: Vec<String> = self
            .provider
            .nearest_neighbors(&centroid, self.neighbors)
            .into_iter()
            .map(|(word, _)| word)
            .collect();
        Ok(neighbors.join(","))
    }

    /// Score every word of every cluster.
    ///
    /// Records come by ascending cluster id, then in each cluster's stored
    /// word order. Empty clusters produce no records.
    pub fn score_clusters(
        &self,
        assignments: &ClusterAssignments,
    ) -> BiasResult<Vec<ClusterWordRecord>> {
        let mut records = Vec::with_capacity(assignments.total_words());
        for (cluster, words) in assignments.iter() {
            if words.is_empty() {
                continue;
            }
            let description = self.describe(words)?;
            for word in words {
                let score = association_score(self.provider, word, self.attrs)?;
                records.push(ClusterWordRecord {
                    cluster,
                    description: description.clone(),
                    word: word.clone(),
                    label: GenderLabel::from_score(score),
                    score,
                });
            }
            debug!(cluster, words = words.len(), "Scored cluster");
        }

        let female = records
            .iter()
            .filter(|r| r.label == GenderLabel::Female)
            .count();
        info!(
            clusters = assignments.len(),
            words = records.len(),
            female,
            male = records.len() - female,
            "Cluster scoring finished"
        );
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::EmbeddingStore;
    use crate::error::BiasError;
    use crate::words::WordGroup;

    fn fixture() -> (EmbeddingStore, AttributePair) {
        let store = EmbeddingStore::from_entries(
            2,
            vec![
                ("he", vec![1.0, 0.0]),
                ("she", vec![0.0, 1.0]),
                ("doctor", vec![0.9, 0.2]),
                ("nurse", vec![0.1, 0.9]),
                ("table", vec![1.0, 1.0]),
            ],
        )
        .unwrap();
        let attrs = AttributePair::new(
            WordGroup::new("male", ["he"]),
            WordGroup::new("female", ["she"]),
        )
        .unwrap();
        (store, attrs)
    }

    #[test]
    fn test_label_tie_break() {
        assert_eq!(GenderLabel::from_score(-1e-9), GenderLabel::Female);
        assert_eq!(GenderLabel::from_score(0.0), GenderLabel::Male);
        assert_eq!(GenderLabel::from_score(-0.0), GenderLabel::Male);
        assert_eq!(GenderLabel::from_score(f64::NAN), GenderLabel::Male);
        assert_eq!(GenderLabel::Female.as_char(), 'F');
    }

    #[test]
    fn test_single_nurse_cluster_is_female() {
        let (store, attrs) = fixture();
        let mut assignments = ClusterAssignments::new();
        assignments.push(4, "nurse");

        let records = ClusterGenderScorer::new(&store, &attrs)
            .with_neighbors(2)
            .score_clusters(&assignments)
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].label, GenderLabel::Female);
        assert!(records[0].score < 0.0);
        assert!(records[0].description.starts_with("nurse,"));
    }

    #[test]
    fn test_records_ordered_by_cluster_then_word() {
        let (store, attrs) = fixture();
        let mut assignments = ClusterAssignments::new();
        assignments.push(7, "table");
        assignments.push(2, "nurse");
        assignments.push(7, "doctor");

        let records = ClusterGenderScorer::new(&store, &attrs)
            .score_clusters(&assignments)
            .unwrap();
        let order: Vec<(usize, &str)> = records
            .iter()
            .map(|r| (r.cluster, r.word.as_str()))
            .collect();
        assert_eq!(order, vec![(2, "nurse"), (7, "table"), (7, "doctor")]);
        assert_eq!(records[1].label, GenderLabel::Male);
        assert_eq!(records[1].description, records[2].description);
    }

    #[test]
    fn test_describe_uses_centroid_neighbors() {
        let (store, attrs) = fixture();
        let scorer = ClusterGenderScorer::new(&store, &attrs).with_neighbors(1);
        let desc = scorer
            .describe(&["he".to_string(), "she".to_string()])
            .unwrap();
        assert_eq!(desc, "table");
    }

    #[test]
    fn test_unknown_member_fails() {
        let (store, attrs) = fixture();
        let mut assignments = ClusterAssignments::new();
        assignments.push(0, "ghost");
        assert!(matches!(
            ClusterGenderScorer::new(&store, &attrs).score_clusters(&assignments),
            Err(BiasError::UnresolvedWord { .. })
        ));
    }

    #[test]
    fn test_tsv_line() {
        let record = ClusterWordRecord {
            cluster: 3,
            description: "a,b".into(),
            word: "nurse".into(),
            label: GenderLabel::Female,
            score: -0.5,
        };
        assert_eq!(record.to_tsv_line(), "3\ta,b\tnurse\tF\t-0.5");
    }
}
