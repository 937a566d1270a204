//! Arguments and loading steps shared by several commands.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use tracing::info;

use bias_probe_core::words::{AttributePair, WordGroup};
use bias_probe_core::{load_word2vec, BiasConfig, EmbeddingFormat, EmbeddingStore};

/// Where to read the word vectors from.
#[derive(Args, Debug)]
pub struct EmbeddingArgs {
    /// word2vec file containing the embeddings
    #[arg(long)]
    pub vectors: PathBuf,

    /// File layout: binary or text (default from config: binary)
    #[arg(short = 't', long = "format")]
    pub format: Option<EmbeddingFormat>,

    /// Read at most this many vectors from the top of the file
    #[arg(long)]
    pub limit: Option<usize>,
}

impl EmbeddingArgs {
    pub fn apply(&self, config: &mut BiasConfig) {
        if let Some(format) = self.format {
            config.embedding.format = format;
        }
        if self.limit.is_some() {
            config.embedding.limit = self.limit;
        }
    }
}

/// Male and female attribute word lists.
#[derive(Args, Debug)]
pub struct AttributeArgs {
    /// Male attribute words, one per line
    #[arg(short = 'm', long)]
    pub mattr: PathBuf,

    /// Female attribute words, one per line
    #[arg(short = 'f', long)]
    pub fattr: PathBuf,
}

/// Load the embedding store described by `args` and `config`.
pub fn load_store(args: &EmbeddingArgs, config: &BiasConfig) -> anyhow::Result<EmbeddingStore> {
    let format = config.embedding.format;
    info!(path = %args.vectors.display(), %format, "Loading embeddings");
    let store = load_word2vec(&args.vectors, format, config.embedding.limit)
        .with_context(|| format!("failed to load embeddings from {}", args.vectors.display()))?;
    Ok(store)
}

/// Load both attribute groups and drop the words `store` does not know.
pub fn load_attributes(
    args: &AttributeArgs,
    store: &EmbeddingStore,
) -> anyhow::Result<AttributePair> {
    let male = WordGroup::load("male", &args.mattr)?.filter_known(store);
    let female = WordGroup::load("female", &args.fattr)?.filter_known(store);
    info!(
        male = male.len(),
        female = female.len(),
        "Attribute groups ready"
    );
    Ok(AttributePair::new(male, female)?)
}

/// Create (or truncate) an output file behind a buffered writer.
pub fn create_output(path: &Path) -> anyhow::Result<BufWriter<File>> {
    let file = File::create(path)
        .with_context(|| format!("failed to create output file {}", path.display()))?;
    Ok(BufWriter::new(file))
}
