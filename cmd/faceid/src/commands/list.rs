//! List command: show what a gallery holds.

use clap::Args;
use serde::Serialize;

use super::{StoreRef, get_config, load_model, output_result, resolve_store};
use crate::Cli;
use crate::extractor::EmbeddingConfig;

/// List enrolled identities in enumeration order.
#[derive(Args)]
pub struct ListCommand {}

#[derive(Serialize)]
struct ListOutput {
    store: StoreRef,
    extractor: EmbeddingConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    dim: Option<usize>,
    identities: Vec<String>,
}

impl ListCommand {
    pub fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let cfg = get_config(cli)?;
        let store = resolve_store(cli, &cfg)?;
        let model = load_model(&store)?;
        let snapshot = model.snapshot();

        let out = ListOutput {
            store,
            extractor: giztoy_faceid::FeatureExtractor::config(model.extractor()),
            dim: snapshot.dim(),
            identities: snapshot.labels().map(str::to_string).collect(),
        };
        output_result(&out, cli.output.as_deref(), cli.json)
    }
}
