//! Train command: build a gallery from a corpus directory.

use clap::Args;
use giztoy_faceid::{FaceModel, FeatureExtractor, read_dir_corpus};
use serde::Serialize;

use super::{StoreRef, get_config, open_location, output_result, print_success, resolve_store};
use crate::Cli;
use crate::extractor::EmbeddingExtractor;

/// Enroll every file of a corpus directory, one identity per file.
///
/// The file name without extension is the identity label. The gallery at
/// --store is replaced, including identities absent from the new corpus; on
/// any extraction error nothing is written.
#[derive(Args)]
pub struct TrainCommand {
    /// Corpus directory
    #[arg(long)]
    corpus: String,

    /// Expected embedding length (overrides config file)
    #[arg(long)]
    dim: Option<usize>,

    /// L2-normalize every embedding
    #[arg(long)]
    normalize: bool,

    /// Only read files with this extension (repeatable)
    #[arg(long = "ext")]
    extensions: Vec<String>,
}

#[derive(Serialize)]
struct TrainSummary {
    store: StoreRef,
    identities: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    dim: Option<usize>,
    labels: Vec<String>,
}

impl TrainCommand {
    pub fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let cfg = get_config(cli)?;
        let store = resolve_store(cli, &cfg)?;

        let mut ec = cfg.extractor.clone();
        if self.dim.is_some() {
            ec.dim = self.dim;
        }
        ec.normalize |= self.normalize;
        let model = FaceModel::new(EmbeddingExtractor::from_config(ec)?);

        let exts: Vec<&str> = self.extensions.iter().map(String::as_str).collect();
        let corpus = read_dir_corpus(&self.corpus, &exts)?;
        if corpus.is_empty() {
            anyhow::bail!("corpus {} has no files", self.corpus);
        }
        tracing::info!(corpus = %self.corpus, files = corpus.len(), "training");

        let n = model.train(corpus)?;
        let location = open_location(&store)?;
        model.save_clean(&*location)?;

        let snapshot = model.snapshot();
        let summary = TrainSummary {
            store,
            identities: n,
            dim: snapshot.dim(),
            labels: snapshot.labels().map(str::to_string).collect(),
        };
        output_result(&summary, cli.output.as_deref(), cli.json)?;
        print_success(&format!("enrolled {n} identities"));
        Ok(())
    }
}
