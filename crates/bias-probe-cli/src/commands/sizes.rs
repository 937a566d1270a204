//! `cluster-sizes`: print the size of every cluster and the mean size.

use std::path::PathBuf;

use clap::Args;

use bias_probe_core::clustering::ClusterSizeReport;

use crate::error::CliExitCode;

/// Arguments for the cluster-sizes command.
#[derive(Args, Debug)]
pub struct SizesArgs {
    /// Cluster file with `cluster` or `word<TAB>cluster` lines
    #[arg(short = 'c', long)]
    pub clusters: PathBuf,
}

/// Execute the cluster-sizes command. The report goes to stdout.
pub fn handle_sizes(args: SizesArgs) -> anyhow::Result<CliExitCode> {
    let report = ClusterSizeReport::load(&args.clusters)?;
    println!("{}", report);
    Ok(CliExitCode::Success)
}
