//! Word Embedding Association Test.
//!
//! Scores target words against two attribute poles, tests whether two target
//! groups differ more than random relabelings would, and sizes the difference
//! with Cohen's d.

mod association;
mod case;
mod effect_size;
mod permutation;
mod stats;

pub use association::{
    association_distribution, association_score, group_distribution, GroupDistribution,
};
pub use case::{
    load_cases, sort_by_word_count, write_records, CaseRunner, DegeneratePolicy, TestCase,
    TestCaseRecord,
};
pub use effect_size::cohens_d;
pub use permutation::{
    PValueMethod, PermutationOutcome, PermutationTest, DEFAULT_ITERATIONS, TIE_TOLERANCE,
};
pub use stats::Moments;
