//! Cluster assignment files (`word<TAB>cluster`) and size reports.

use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use tracing::{debug, warn};

use crate::embedding::SimilarityProvider;
use crate::error::{BiasError, BiasResult};

/// Words grouped by cluster id.
///
/// Iteration is in ascending cluster id; words keep the order in which they
/// were added.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClusterAssignments {
    clusters: BTreeMap<usize, Vec<String>>,
}

impl ClusterAssignments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Group `words` by the parallel `labels` slice.
    pub fn from_labels(words: &[String], labels: &[usize]) -> Self {
        let mut assignments = Self::new();
        for (word, &label) in words.iter().zip(labels) {
            assignments.push(label, word.clone());
        }
        assignments
    }

    pub fn push(&mut self, cluster: usize, word: impl Into<String>) {
        self.clusters.entry(cluster).or_default().push(word.into());
    }

    /// Read a `word<TAB>cluster` file.
    ///
    /// Lines without exactly two fields are skipped, as are words `provider`
    /// cannot resolve.
    ///
    /// # Errors
    ///
    /// [`BiasError::Io`] if the file cannot be read, [`BiasError::Parse`] if a
    /// cluster id is not a non-negative integer.
    pub fn load<P: SimilarityProvider + ?Sized>(path: &Path, provider: &P) -> BiasResult<Self> {
        let file = File::open(path).map_err(|e| BiasError::io(path, e))?;
        let mut assignments = Self::new();
        let mut malformed = 0usize;
        let mut unknown = 0usize;

        for (idx, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| BiasError::io(path, e))?;
            let fields: Vec<&str> = line.trim().split('\t').collect();
            if fields.len() != 2 {
                malformed += 1;
                continue;
            }
            let cluster = parse_cluster_id(fields[1], path, idx + 1)?;
            if !provider.contains(fields[0]) {
                unknown += 1;
                continue;
            }
            assignments.push(cluster, fields[0]);
        }

        if unknown > 0 {
            warn!(
                path = %path.display(),
                unknown,
                "Skipped clustered words missing from the embedding space"
            );
        }
        debug!(
            path = %path.display(),
            clusters = assignments.len(),
            words = assignments.total_words(),
            malformed,
            "Loaded cluster assignments"
        );
        Ok(assignments)
    }

    /// Write `word<TAB>cluster` lines, by ascending cluster id.
    pub fn write<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        for (cluster, words) in self.iter() {
            for word in words {
                writeln!(writer, "{}\t{}", word, cluster)?;
            }
        }
        Ok(())
    }

    /// Number of clusters.
    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    pub fn total_words(&self) -> usize {
        self.clusters.values().map(Vec::len).sum()
    }

    pub fn get(&self, cluster: usize) -> Option<&[String]> {
        self.clusters.get(&cluster).map(Vec::as_slice)
    }

    /// `(cluster, words)` by ascending cluster id.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &[String])> + '_ {
        self.clusters.iter().map(|(&c, words)| (c, words.as_slice()))
    }
}

fn parse_cluster_id(field: &str, path: &Path, line: usize) -> BiasResult<usize> {
    field
        .trim()
        .parse()
        .map_err(|_| BiasError::parse(path, line, format!("invalid cluster id '{}'", field)))
}

/// Member counts per cluster id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClusterSizeReport {
    sizes: BTreeMap<usize, usize>,
}

impl ClusterSizeReport {
    /// Count cluster ids in `cluster` or `word<TAB>cluster` lines.
    ///
    /// Blank lines are ignored. `source` is only used in error messages.
    pub fn from_lines<I, S>(lines: I, source: &Path) -> BiasResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut sizes = BTreeMap::new();
        for (idx, line) in lines.into_iter().enumerate() {
            let line = line.as_ref().trim();
            if line.is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split('\t').collect();
            let id_field = match fields.as_slice() {
                [id] => id,
                [_, id, ..] => id,
                [] => continue,
            };
            let cluster = parse_cluster_id(id_field, source, idx + 1)?;
            *sizes.entry(cluster).or_insert(0) += 1;
        }
        Ok(Self { sizes })
    }

    /// Read and count a cluster file.
    pub fn load(path: &Path) -> BiasResult<Self> {
        let file = File::open(path).map_err(|e| BiasError::io(path, e))?;
        let lines = BufReader::new(file)
            .lines()
            .collect::<std::io::Result<Vec<String>>>()
            .map_err(|e| BiasError::io(path, e))?;
        Self::from_lines(lines, path)
    }

    /// `(cluster, size)` by ascending cluster id.
    pub fn sizes(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.sizes.iter().map(|(&c, &n)| (c, n))
    }

    pub fn cluster_count(&self) -> usize {
        self.sizes.len()
    }

    /// Mean cluster size; `None` when there are no clusters.
    pub fn mean_size(&self) -> Option<f64> {
        if self.sizes.is_empty() {
            return None;
        }
        let total: usize = self.sizes.values().sum();
        Some(total as f64 / self.sizes.len() as f64)
    }
}

impl fmt::Display for ClusterSizeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (cluster, size) in self.sizes() {
            writeln!(f, "{}\t{}", cluster, size)?;
        }
        writeln!(f)?;
        match self.mean_size() {
            Some(mean) => write!(f, "Mean cluster size {}", mean),
            None => write!(f, "No clusters"),
        }
    }
}
