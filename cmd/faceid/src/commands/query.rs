//! Query command: rank gallery identities against one probe.

use std::path::Path;

use clap::Args;

use super::{get_config, load_model, output_result, print_warning, resolve_store};
use crate::Cli;

/// Rank every enrolled identity by distance to a probe embedding.
#[derive(Args)]
pub struct QueryCommand {
    /// Probe embedding file
    #[arg(long)]
    probe: String,

    /// Claimed identity of the probe (default: probe file name without extension)
    #[arg(long)]
    subject: Option<String>,

    /// Maximum number of matches (overrides config file)
    #[arg(short = 'n', long)]
    limit: Option<usize>,

    /// Print a ranked table instead of YAML/JSON
    #[arg(long)]
    plain: bool,
}

impl QueryCommand {
    pub fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let cfg = get_config(cli)?;
        let store = resolve_store(cli, &cfg)?;
        let model = load_model(&store)?;

        let probe = Path::new(&self.probe);
        let subject = match &self.subject {
            Some(s) => s.clone(),
            None => probe
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or_default()
                .to_string(),
        };
        let limit = self.limit.or(cfg.query.limit);

        let rs = model.query(&subject, probe, limit)?;
        if !subject.is_empty() && !model.snapshot().contains(&subject) {
            print_warning(&format!("subject {subject:?} is not enrolled"));
        }

        if self.plain {
            let text = rs.to_string();
            match cli.output.as_deref() {
                Some(path) => std::fs::write(path, text)?,
                None => print!("{text}"),
            }
            return Ok(());
        }
        output_result(&rs, cli.output.as_deref(), cli.json)
    }
}
