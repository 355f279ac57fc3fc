//! faceid - identify faces against a gallery of precomputed embeddings.

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod extractor;

use commands::{EvalCommand, ListCommand, QueryCommand, TrainCommand};
use config::Backend;

/// faceid - identify faces against a gallery of precomputed embeddings.
///
/// A gallery is one reference vector per identity, built from a corpus
/// directory where each file holds the embedding of one face image and the
/// file name (without extension) is the identity label.
#[derive(Parser)]
#[command(name = "faceid")]
#[command(about = "Face identity gallery: train, query, evaluate")]
#[command(version)]
pub struct Cli {
    /// Config file (YAML)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Gallery location: a directory, or a redb file with --backend redb
    #[arg(short = 's', long, global = true)]
    pub store: Option<String>,

    /// Storage backend (overrides config file)
    #[arg(long, global = true, value_enum)]
    pub backend: Option<Backend>,

    /// Namespace inside a redb file (overrides config file)
    #[arg(long, global = true)]
    pub namespace: Option<String>,

    /// Output file (default: stdout)
    #[arg(short = 'o', long, global = true)]
    pub output: Option<String>,

    /// Output as JSON (default: YAML)
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbose output
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build a gallery from a corpus directory (replaces its contents)
    Train(TrainCommand),
    /// Rank gallery identities against one probe
    Query(QueryCommand),
    /// Measure rank-1 / rank-k accuracy over a probe directory
    Eval(EvalCommand),
    /// List the identities in a gallery
    List(ListCommand),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    run(&cli)
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Train(cmd) => cmd.run(cli),
        Commands::Query(cmd) => cmd.run(cli),
        Commands::Eval(cmd) => cmd.run(cli),
        Commands::List(cmd) => cmd.run(cli),
    }
}
