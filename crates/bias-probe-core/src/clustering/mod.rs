//! Vocabulary clustering and per-cluster gender scoring.
//!
//! [`MiniBatchKMeans`] partitions the whole embedding vocabulary and writes a
//! `word<TAB>cluster` file; [`ClusterAssignments`] reads such a file back and
//! [`ClusterGenderScorer`] labels each member word with the attribute pole it
//! leans towards.

mod assignments;
mod gender;
mod kmeans;

pub use assignments::{ClusterAssignments, ClusterSizeReport};
pub use gender::{
    write_cluster_records, ClusterGenderScorer, ClusterWordRecord, GenderLabel, DEFAULT_NEIGHBORS,
};
pub use kmeans::{KMeansResult, MiniBatchKMeans};
