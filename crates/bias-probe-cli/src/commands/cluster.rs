//! `cluster`: partition the vocabulary with mini-batch k-means.
//!
//! Writes one `word<TAB>cluster` line per vocabulary word, in file order.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use tracing::{debug, info};

use bias_probe_core::clustering::MiniBatchKMeans;
use bias_probe_core::BiasConfig;

use super::shared::{create_output, load_store, EmbeddingArgs};
use crate::error::CliExitCode;

/// Arguments for the cluster command.
#[derive(Args, Debug)]
pub struct ClusterArgs {
    #[command(flatten)]
    pub embedding: EmbeddingArgs,

    /// Output file
    #[arg(short = 'o', long)]
    pub out: PathBuf,

    /// Number of clusters
    #[arg(short = 'k', long)]
    pub k: Option<usize>,

    /// Vectors per mini-batch
    #[arg(short = 'b', long)]
    pub batch_size: Option<usize>,

    /// Seed for initialisation and batch sampling
    #[arg(long)]
    pub seed: Option<u64>,
}

impl ClusterArgs {
    fn apply(&self, config: &mut BiasConfig) {
        self.embedding.apply(config);
        if let Some(k) = self.k {
            config.clustering.k = k;
        }
        if let Some(batch_size) = self.batch_size {
            config.clustering.batch_size = batch_size;
        }
        if let Some(seed) = self.seed {
            config.clustering.seed = seed;
        }
    }
}

/// Execute the cluster command.
pub fn handle_cluster(args: ClusterArgs, mut config: BiasConfig) -> anyhow::Result<CliExitCode> {
    args.apply(&mut config);
    config.validate()?;

    let kmeans = MiniBatchKMeans::new(config.clustering.clone())?;
    let store = load_store(&args.embedding, &config)?;
    let result = kmeans.fit(&store)?;

    let mut out = create_output(&args.out)?;
    result
        .write_labels(store.words(), &mut out)
        .and_then(|_| out.flush())
        .with_context(|| format!("failed to write {}", args.out.display()))?;

    for (cluster, size) in result.cluster_sizes().into_iter().enumerate() {
        debug!(cluster, size, "Cluster size");
    }
    info!(
        words = store.len(),
        k = result.centroids.len(),
        batches = result.batches,
        inertia = result.inertia,
        out = %args.out.display(),
        "Clustering done"
    );
    Ok(CliExitCode::Success)
}
