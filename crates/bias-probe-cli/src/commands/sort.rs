//! `sort`: order hypotest results by target word count, largest first.
//!
//! The input must have been written with `hypotest --include-words`.

use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use tracing::info;

use bias_probe_core::weat::sort_by_word_count;
use bias_probe_core::BiasError;

use super::shared::create_output;
use crate::error::CliExitCode;

/// Arguments for the sort command.
#[derive(Args, Debug)]
pub struct SortArgs {
    /// hypotest output file (with word columns)
    #[arg(short = 't', long)]
    pub tests: PathBuf,

    /// Output file
    #[arg(short = 'o', long)]
    pub out: PathBuf,
}

/// Execute the sort command.
pub fn handle_sort(args: SortArgs) -> anyhow::Result<CliExitCode> {
    let file = std::fs::File::open(&args.tests).map_err(|e| BiasError::io(&args.tests, e))?;
    let lines = BufReader::new(file)
        .lines()
        .collect::<std::io::Result<Vec<String>>>()
        .map_err(|e| BiasError::io(&args.tests, e))?;

    let sorted = sort_by_word_count(lines, &args.tests)?;

    let mut out = create_output(&args.out)?;
    for line in &sorted {
        writeln!(out, "{}", line)
            .with_context(|| format!("failed to write {}", args.out.display()))?;
    }
    out.flush()
        .with_context(|| format!("failed to write {}", args.out.display()))?;

    info!(lines = sorted.len(), out = %args.out.display(), "Sorted results");
    Ok(CliExitCode::Success)
}
