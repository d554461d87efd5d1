//! Startup pieces of the roster server: configuration and sample data.

pub mod seed;

use std::path::PathBuf;

use serde::Deserialize;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `ROSTER_*` environment variables. Every field has a default.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
  /// People generated when the person table is empty at startup.
  pub seed_count: usize,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:       "127.0.0.1".to_string(),
      port:       8080,
      store_path: PathBuf::from("~/.local/share/roster/roster.db"),
      seed_count: 40,
    }
  }
}
