//! Bias Probe CLI
//!
//! Command line tools for measuring gender bias in word embeddings.
//!
//! # Commands
//!
//! - `hypotest`: permutation test and Cohen's d for a batch of target pairs
//! - `associations`: label every clustered word M or F with its score
//! - `cluster`: cluster the vocabulary with mini-batch k-means
//! - `cluster-sizes`: print cluster sizes and their mean
//! - `sort`: order hypotest results by target word count
//!
//! Logs go to stderr; result files are written where `--out` points.
//!
//! # Exit codes
//! - 0: success
//! - 1: general failure
//! - 2: invalid configuration or input
//! - 3: one or more cases failed

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::{fmt, EnvFilter};

use bias_probe_core::BiasConfig;

mod commands;
mod error;

pub use error::{exit_code_for_error, CliExitCode};

/// Bias Probe - Gender Association Tests for Word Embeddings
#[derive(Parser)]
#[command(name = "bias-probe")]
#[command(version)]
#[command(about = "Gender association tests over word embeddings")]
#[command(propagate_version = true)]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// TOML configuration file; BIAS_PROBE__* environment variables apply on top
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run WEAT permutation tests for every case of a cases file
    Hypotest(commands::hypotest::HypotestArgs),
    /// Score and label every word of every cluster against the attribute groups
    Associations(commands::associations::AssociationsArgs),
    /// Cluster the embedding vocabulary with mini-batch k-means
    Cluster(commands::cluster::ClusterArgs),
    /// Print cluster sizes and the mean cluster size
    ClusterSizes(commands::sizes::SizesArgs),
    /// Sort hypotest results by total target word count
    Sort(commands::sort::SortArgs),
}

fn init_logging(verbose: u8, default_level: &str) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();

    let config = BiasConfig::load_sources(cli.config.as_deref());
    let level = match &config {
        Ok(config) => config.logging.level.clone(),
        Err(_) => "info".to_string(),
    };
    init_logging(cli.verbose, &level);

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Failed to load configuration");
            std::process::exit(CliExitCode::InvalidInput.into());
        }
    };

    // Dispatch to command handlers
    let result = match cli.command {
        Commands::Hypotest(args) => commands::hypotest::handle_hypotest(args, config),
        Commands::Associations(args) => {
            commands::associations::handle_associations(args, config)
        }
        Commands::Cluster(args) => commands::cluster::handle_cluster(args, config),
        Commands::ClusterSizes(args) => commands::sizes::handle_sizes(args),
        Commands::Sort(args) => commands::sort::handle_sort(args),
    };

    let exit_code = match result {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            exit_code_for_error(&e)
        }
    };

    std::process::exit(exit_code.into());
}
