//! `associations`: label every clustered word with its gender association.
//!
//! Output lines are `cluster  description  word  M|F  score`, clusters in
//! ascending id order. Negative scores lean female.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use tracing::info;

use bias_probe_core::clustering::{write_cluster_records, ClusterAssignments, ClusterGenderScorer};
use bias_probe_core::BiasConfig;

use super::shared::{create_output, load_attributes, load_store, AttributeArgs, EmbeddingArgs};
use crate::error::CliExitCode;

/// Arguments for the associations command.
#[derive(Args, Debug)]
pub struct AssociationsArgs {
    #[command(flatten)]
    pub embedding: EmbeddingArgs,

    #[command(flatten)]
    pub attributes: AttributeArgs,

    /// Cluster file with `word<TAB>cluster` lines
    #[arg(short = 'c', long)]
    pub clusters: PathBuf,

    /// Output file
    #[arg(short = 'o', long)]
    pub out: PathBuf,

    /// Centroid neighbours listed in each cluster description
    #[arg(short = 'n', long)]
    pub neighbors: Option<usize>,
}

/// Execute the associations command.
pub fn handle_associations(
    args: AssociationsArgs,
    mut config: BiasConfig,
) -> anyhow::Result<CliExitCode> {
    args.embedding.apply(&mut config);
    if let Some(neighbors) = args.neighbors {
        config.description.neighbors = neighbors;
    }
    config.validate()?;

    let store = load_store(&args.embedding, &config)?;
    let attrs = load_attributes(&args.attributes, &store)?;
    let clusters = ClusterAssignments::load(&args.clusters, &store)?;
    info!(
        clusters = clusters.len(),
        words = clusters.total_words(),
        "Loaded clusters"
    );

    let records = ClusterGenderScorer::new(&store, &attrs)
        .with_neighbors(config.description.neighbors)
        .score_clusters(&clusters)?;

    let mut out = create_output(&args.out)?;
    write_cluster_records(&mut out, &records)
        .and_then(|_| out.flush())
        .with_context(|| format!("failed to write {}", args.out.display()))?;

    info!(records = records.len(), out = %args.out.display(), "Associations done");
    Ok(CliExitCode::Success)
}
