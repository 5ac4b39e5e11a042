//! `roster` binary.
//!
//! Reads `roster.toml` (or the path given with `--config`) and `ROSTER_*`
//! environment variables, opens the SQLite store, and runs one command
//! against the caller's own record. Records are read and printed as JSON.

use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use roster_cli::{Action, CliConfig, Command, execute};
use roster_store_sqlite::SqliteStore;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Roster self-service profile tool")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "roster.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing on stderr; stdout carries the JSON output.
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let cfg = CliConfig::load(&cli.config)?;
  let action = Action::from_command(cli.command)?;

  let store = SqliteStore::open(&cfg.store_path)
    .await
    .with_context(|| format!("failed to open store at {:?}", cfg.store_path))?
    .with_context(cfg.request_context());

  if let Some(person) = execute(&store, action).await? {
    let json = serde_json::to_string_pretty(&person).context("failed to serialise record")?;
    println!("{json}");
  }

  Ok(())
}
