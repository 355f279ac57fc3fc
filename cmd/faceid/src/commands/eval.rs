//! Eval command: identification accuracy over a probe directory.

use clap::Args;
use giztoy_faceid::{evaluate, read_dir_corpus};
use serde::Serialize;

use super::{get_config, load_model, output_result, print_success, resolve_store};
use crate::Cli;

const DEFAULT_K: usize = 5;

/// Query the gallery with every file of a probe directory.
///
/// Probe labels follow the corpus convention: the file name without
/// extension names the identity the probe belongs to.
#[derive(Args)]
pub struct EvalCommand {
    /// Probe directory
    #[arg(long)]
    probes: String,

    /// Rank cutoff for top-k accuracy (overrides config file, default 5)
    #[arg(long)]
    k: Option<usize>,

    /// Only read files with this extension (repeatable)
    #[arg(long = "ext")]
    extensions: Vec<String>,

    /// Include per-probe outcomes in the report
    #[arg(long)]
    details: bool,
}

#[derive(Serialize)]
struct EvalReport<'a> {
    k: usize,
    total: usize,
    top1: usize,
    topk: usize,
    missing: usize,
    top1_accuracy: f64,
    topk_accuracy: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    outcomes: Option<&'a [giztoy_faceid::eval::ProbeOutcome]>,
}

impl EvalCommand {
    pub fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let cfg = get_config(cli)?;
        let store = resolve_store(cli, &cfg)?;
        let model = load_model(&store)?;

        let k = self.k.or(cfg.query.k).unwrap_or(DEFAULT_K);
        if k == 0 {
            anyhow::bail!("k must be positive");
        }

        let exts: Vec<&str> = self.extensions.iter().map(String::as_str).collect();
        let probes = read_dir_corpus(&self.probes, &exts)?;
        let eval = evaluate(&model, probes, k)?;

        let report = EvalReport {
            k: eval.k,
            total: eval.total,
            top1: eval.top1,
            topk: eval.topk,
            missing: eval.missing,
            top1_accuracy: eval.top1_accuracy(),
            topk_accuracy: eval.topk_accuracy(),
            outcomes: self.details.then_some(eval.outcomes.as_slice()),
        };
        output_result(&report, cli.output.as_deref(), cli.json)?;
        print_success(&format!(
            "rank-1 {}/{}, rank-{k} {}/{}",
            eval.top1, eval.total, eval.topk, eval.total
        ));
        Ok(())
    }
}
