//! Named test cases: input parsing, batch execution, and output records.
//!
//! # Input
//!
//! One case per line, tab-separated: `name  x_targets_path  y_targets_path`.
//! Target paths are used as given (relative paths resolve against the
//! working directory).
//!
//! # Output
//!
//! One record per successful case, in input order:
//! `name  p_value  cohens_d`, optionally followed by the comma-joined X and Y
//! target words.

use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::embedding::SimilarityProvider;
use crate::error::{BiasError, BiasResult, CaseError};
use crate::words::{AttributePair, WordGroup};

use super::association::group_distribution;
use super::effect_size::cohens_d;
use super::permutation::PermutationTest;

/// What to do with a case whose Cohen's d is undefined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DegeneratePolicy {
    /// Fail the case with `DegenerateVariance`.
    #[default]
    Skip,
    /// Keep the case and record Cohen's d as undefined (`nan`).
    Report,
}

/// One line of the cases file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCase {
    pub name: String,
    pub x_path: PathBuf,
    pub y_path: PathBuf,
}

/// Parse a cases file. Blank lines are skipped; extra fields are ignored.
pub fn load_cases(path: &Path) -> BiasResult<Vec<TestCase>> {
    let file = File::open(path).map_err(|e| BiasError::io(path, e))?;
    let mut cases = Vec::new();

    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|e| BiasError::io(path, e))?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 3 {
            return Err(BiasError::parse(
                path,
                idx + 1,
                format!("expected 'name<TAB>x_path<TAB>y_path', got {} field(s)", fields.len()),
            ));
        }
        cases.push(TestCase {
            name: fields[0].to_string(),
            x_path: PathBuf::from(fields[1]),
            y_path: PathBuf::from(fields[2]),
        });
    }

    debug!(path = %path.display(), cases = cases.len(), "Loaded cases");
    Ok(cases)
}

/// Terminal output of one case.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestCaseRecord {
    pub name: String,
    /// `mean(X) - mean(Y)` of the association scores.
    pub observed: f64,
    pub p_value: f64,
    /// `None` when undefined and the policy is [`DegeneratePolicy::Report`].
    pub cohens_d: Option<f64>,
    /// X targets that survived vocabulary filtering.
    pub x_words: Vec<String>,
    /// Y targets that survived vocabulary filtering.
    pub y_words: Vec<String>,
}

impl TestCaseRecord {
    /// Tab-separated output line, without the trailing newline.
    pub fn to_tsv_line(&self, include_words: bool) -> String {
        let d = match self.cohens_d {
            Some(d) => d.to_string(),
            None => "nan".to_string(),
        };
        let mut line = format!("{}\t{}\t{}", self.name, self.p_value, d);
        if include_words {
            line.push('\t');
            line.push_str(&self.x_words.join(","));
            line.push('\t');
            line.push_str(&self.y_words.join(","));
        }
        line
    }
}

/// Write records, one line each.
pub fn write_records<W: Write>(
    writer: &mut W,
    records: &[TestCaseRecord],
    include_words: bool,
) -> std::io::Result<()> {
    for record in records {
        writeln!(writer, "{}", record.to_tsv_line(include_words))?;
    }
    Ok(())
}

/// Runs cases against fixed attribute groups.
pub struct CaseRunner<'a, P: SimilarityProvider + ?Sized> {
    provider: &'a P,
    attrs: &'a AttributePair,
    test: PermutationTest,
    policy: DegeneratePolicy,
}

impl<'a, P: SimilarityProvider + ?Sized> CaseRunner<'a, P> {
    pub fn new(provider: &'a P, attrs: &'a AttributePair, test: PermutationTest) -> Self {
        Self {
            provider,
            attrs,
            test,
            policy: DegeneratePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: DegeneratePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Load the target lists of `case` and run it.
    pub fn run_case(&self, case: &TestCase) -> Result<TestCaseRecord, CaseError> {
        let load = |label: &str, path: &Path| {
            WordGroup::load(format!("{}:{}", case.name, label), path)
                .map_err(|e| CaseError::new(&case.name, e))
        };
        let x = load("X", &case.x_path)?;
        let y = load("Y", &case.y_path)?;
        self.run_groups(&case.name, x, y)
    }

    /// Run one case on in-memory target groups.
    ///
    /// Unknown targets are dropped first; association scores are computed
    /// once and shared by the permutation test and Cohen's d.
    pub fn run_groups(
        &self,
        name: &str,
        x: WordGroup,
        y: WordGroup,
    ) -> Result<TestCaseRecord, CaseError> {
        self.evaluate(name, x, y).map_err(|e| CaseError::new(name, e))
    }

    fn evaluate(&self, name: &str, x: WordGroup, y: WordGroup) -> BiasResult<TestCaseRecord> {
        let x = x.filter_known(self.provider);
        let y = y.filter_known(self.provider);
        for group in [&x, &y] {
            if group.is_empty() {
                return Err(BiasError::InsufficientData(format!(
                    "target group '{}' has no words in the embedding space",
                    group.name()
                )));
            }
        }

        let dist_x = group_distribution(self.provider, &x, self.attrs)?;
        let dist_y = group_distribution(self.provider, &y, self.attrs)?;

        let outcome = self.test.run(&dist_x, &dist_y)?;
        let d = match cohens_d(&dist_x, &dist_y) {
            Ok(d) => Some(d),
            Err(err @ BiasError::DegenerateVariance { .. }) => match self.policy {
                DegeneratePolicy::Skip => return Err(err),
                DegeneratePolicy::Report => {
                    warn!(error = %err, "Cohen's d undefined, reporting as nan");
                    None
                }
            },
            Err(err) => return Err(err),
        };

        debug!(
            x = dist_x.len(),
            y = dist_y.len(),
            observed = outcome.observed,
            p_value = outcome.p_value,
            cohens_d = ?d,
            "Case evaluated"
        );

        Ok(TestCaseRecord {
            name: name.to_string(),
            observed: outcome.observed,
            p_value: outcome.p_value,
            cohens_d: d,
            x_words: dist_x.words().to_vec(),
            y_words: dist_y.words().to_vec(),
        })
    }

    /// Run every case, in order. A failed case does not stop the batch.
    pub fn run_all(&self, cases: &[TestCase]) -> Vec<Result<TestCaseRecord, CaseError>> {
        let results: Vec<_> = cases
            .iter()
            .map(|case| {
                let result = self.run_case(case);
                if let Err(err) = &result {
                    warn!(error = %err, "Case failed");
                }
                result
            })
            .collect();

        let ok = results.iter().filter(|r| r.is_ok()).count();
        info!(total = cases.len(), ok, failed = cases.len() - ok, "Case batch finished");
        results
    }
}

/// Order result lines by total target word count, largest first.
///
/// Lines must carry the word columns (`to_tsv_line(true)`); ties keep their
/// input order. Blank lines are dropped.
pub fn sort_by_word_count(lines: Vec<String>, source: &Path) -> BiasResult<Vec<String>> {
    let mut keyed = Vec::with_capacity(lines.len());
    for (idx, line) in lines.into_iter().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line
            .trim_end_matches(|c| c == '\r' || c == '\n')
            .split('\t')
            .collect();
        if fields.len() < 5 {
            return Err(BiasError::parse(
                source,
                idx + 1,
                "record has no target word columns (run hypotest with --include-words)",
            ));
        }
        let count = fields[3].split(',').count() + fields[4].split(',').count();
        keyed.push((count, line));
    }

    keyed.sort_by(|a, b| b.0.cmp(&a.0));
    Ok(keyed.into_iter().map(|(_, line)| line).collect())
}
