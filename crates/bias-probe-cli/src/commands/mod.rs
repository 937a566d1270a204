//! CLI command handlers
//!
//! # Modules
//!
//! - `hypotest`: batch of named WEAT cases
//! - `associations`: per-cluster gender labels
//! - `cluster`: mini-batch k-means over the vocabulary
//! - `sizes`: cluster size report
//! - `sort`: order hypotest results by target word count

pub mod associations;
pub mod cluster;
pub mod hypotest;
pub mod shared;
pub mod sizes;
pub mod sort;
