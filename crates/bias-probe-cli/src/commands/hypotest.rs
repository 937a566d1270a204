//! `hypotest`: run a batch of named WEAT cases.
//!
//! # Usage
//!
//! ```bash
//! bias-probe hypotest --vectors vectors.bin -m male.txt -f female.txt \
//!     --cases cases.tsv --out results.tsv --iter 5000
//! ```
//!
//! Each output line is `name  p_value  cohens_d`, in case order. Failed cases
//! are logged and left out; the exit code is then 3.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use tracing::{error, info};

use bias_probe_core::weat::{load_cases, CaseRunner, DegeneratePolicy, PermutationTest};
use bias_probe_core::BiasConfig;

use super::shared::{create_output, load_attributes, load_store, AttributeArgs, EmbeddingArgs};
use crate::error::CliExitCode;

/// Arguments for the hypotest command.
#[derive(Args, Debug)]
pub struct HypotestArgs {
    #[command(flatten)]
    pub embedding: EmbeddingArgs,

    #[command(flatten)]
    pub attributes: AttributeArgs,

    /// Tab-separated cases: name, X targets file, Y targets file
    #[arg(short = 'c', long)]
    pub cases: PathBuf,

    /// Output file, one line per successful case
    #[arg(short = 'o', long)]
    pub out: PathBuf,

    /// Permutation resamples per case
    #[arg(short = 'i', long = "iter", allow_negative_numbers = true)]
    pub iterations: Option<i64>,

    /// Seed for the permutation streams
    #[arg(long)]
    pub seed: Option<u64>,

    /// Append the X and Y target words to each line
    #[arg(long)]
    pub include_words: bool,

    /// Stop at the first failed case
    #[arg(long)]
    pub fail_fast: bool,

    /// Keep cases whose Cohen's d is undefined and write it as nan
    #[arg(long)]
    pub report_degenerate: bool,
}

impl HypotestArgs {
    fn apply(&self, config: &mut BiasConfig) {
        self.embedding.apply(config);
        if let Some(iterations) = self.iterations {
            config.permutation.iterations = iterations;
        }
        if let Some(seed) = self.seed {
            config.permutation.seed = seed;
        }
        if self.include_words {
            config.hypotest.include_words = true;
        }
        if self.fail_fast {
            config.hypotest.fail_fast = true;
        }
        if self.report_degenerate {
            config.hypotest.degenerate = DegeneratePolicy::Report;
        }
    }
}

/// Execute the hypotest command.
pub fn handle_hypotest(args: HypotestArgs, mut config: BiasConfig) -> anyhow::Result<CliExitCode> {
    args.apply(&mut config);
    config.validate()?;

    let iterations = config.permutation.checked_iterations()?;
    let test = PermutationTest::new(iterations)?
        .with_seed(config.permutation.seed)
        .with_parallel(config.permutation.parallel)
        .with_method(config.permutation.p_value);

    let cases = load_cases(&args.cases)?;
    info!(cases = cases.len(), iterations, "Loaded cases");

    let store = load_store(&args.embedding, &config)?;
    let attrs = load_attributes(&args.attributes, &store)?;
    let runner = CaseRunner::new(&store, &attrs, test).with_policy(config.hypotest.degenerate);

    let mut out = create_output(&args.out)?;
    let mut written = 0usize;
    let mut failed = 0usize;

    for case in &cases {
        match runner.run_case(case) {
            Ok(record) => {
                writeln!(out, "{}", record.to_tsv_line(config.hypotest.include_words))
                    .with_context(|| format!("failed to write {}", args.out.display()))?;
                written += 1;
            }
            Err(err) => {
                error!(case = %err.case, error = %err.source, "Case failed");
                failed += 1;
                if config.hypotest.fail_fast {
                    break;
                }
            }
        }
    }
    out.flush()
        .with_context(|| format!("failed to write {}", args.out.display()))?;

    info!(
        written,
        failed,
        skipped = cases.len() - written - failed,
        out = %args.out.display(),
        "Hypothesis tests done"
    );

    Ok(if failed > 0 {
        CliExitCode::CasesFailed
    } else {
        CliExitCode::Success
    })
}
