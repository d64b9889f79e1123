//! Quire: documentation index and substring search for markdown doc sites.

mod cli;

use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "quire",
    version,
    about = "Documentation index and search"
)]
struct Cli {
    #[command(subcommand)]
    command: cli::Commands,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout is reserved for command output
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        cli::Commands::Tree { json } => cli::tree::run(json).await,
        cli::Commands::Search { query, json } => cli::search::run(query, json).await,
        cli::Commands::Doctor => cli::doctor::run().await,
    }
}
