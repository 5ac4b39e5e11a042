//! Configuration and command dispatch for the `roster` binary.
//!
//! Every command acts on the caller's own record, identified by the
//! configured `auth_id`.

use std::{
  path::{Path, PathBuf},
  time::Duration,
};

use anyhow::Context as _;
use clap::Subcommand;
use roster_core::{auth::RequestContext, person::Person, store::PersonStore};
use serde::Deserialize;
use tracing::info;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime configuration, deserialised from `roster.toml` and `ROSTER_*`
/// environment variables.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct CliConfig {
  pub store_path: PathBuf,
  /// Identity the caller authenticates as. Without one every command is
  /// refused.
  pub auth_id:    Option<String>,
  /// Per-command deadline; `0` disables it.
  pub timeout_ms: u64,
}

pub const DEFAULT_STORE_PATH: &str = "~/.local/share/roster/roster.db";
pub const DEFAULT_TIMEOUT_MS: u64 = 5_000;

impl CliConfig {
  /// Layer the optional TOML file at `path` under the environment.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .set_default("store_path", DEFAULT_STORE_PATH)?
      .set_default("timeout_ms", DEFAULT_TIMEOUT_MS)?
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("ROSTER"))
      .build()
      .context("failed to read config file")?;

    let mut cfg: Self = settings
      .try_deserialize()
      .context("failed to deserialise CliConfig")?;
    cfg.store_path = expand_tilde(&cfg.store_path);
    Ok(cfg)
  }

  /// The request context every command runs under.
  pub fn request_context(&self) -> RequestContext {
    let ctx = match &self.auth_id {
      Some(id) => RequestContext::authenticated(id.as_str()),
      None => RequestContext::new(),
    };
    match self.timeout_ms {
      0 => ctx,
      ms => ctx.with_timeout(Duration::from_millis(ms)),
    }
  }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

// ─── Commands ────────────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
  /// Create your record from a JSON file.
  Create { file: PathBuf },
  /// Print your record as JSON.
  Show,
  /// Overwrite your record from a JSON file. Addresses are fully replaced.
  Update { file: PathBuf },
  /// Archive your record. This cannot be undone.
  Archive,
}

/// A command with its input already read.
#[derive(Debug)]
pub enum Action {
  Create(Person),
  Show,
  Update(Person),
  Archive,
}

impl Action {
  pub fn from_command(command: Command) -> anyhow::Result<Self> {
    Ok(match command {
      Command::Create { file } => Self::Create(read_person(&file)?),
      Command::Show => Self::Show,
      Command::Update { file } => Self::Update(read_person(&file)?),
      Command::Archive => Self::Archive,
    })
  }
}

fn read_person(path: &Path) -> anyhow::Result<Person> {
  let text = std::fs::read_to_string(path)
    .with_context(|| format!("failed to read {path:?}"))?;
  parse_person(&text).with_context(|| format!("failed to parse person from {path:?}"))
}

pub fn parse_person(text: &str) -> anyhow::Result<Person> {
  Ok(serde_json::from_str(text).map_err(roster_core::Error::from)?)
}

/// Run `action` against `store`, returning the resulting record if there is
/// one.
pub async fn execute<S: PersonStore>(store: &S, action: Action) -> anyhow::Result<Option<Person>> {
  match action {
    Action::Create(person) => {
      let person = store.create_self(person).await.context("failed to create record")?;
      info!(id = person.identity.id, "record created");
      Ok(Some(person))
    }
    Action::Show => Ok(Some(store.retrieve_self().await.context("failed to load record")?)),
    Action::Update(person) => {
      let person = store.update_self(person).await.context("failed to update record")?;
      info!(id = person.identity.id, "record updated");
      Ok(Some(person))
    }
    Action::Archive => {
      store.archive_self().await.context("failed to archive record")?;
      info!("record archived");
      Ok(None)
    }
  }
}
