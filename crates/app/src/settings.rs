//! Application settings.
//!
//! Loaded from an optional `Nidhi.toml` next to the binary, overridable
//! through `NIDHI_*` environment variables (e.g. `NIDHI_SERVER__PORT`).

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub app: App,
    pub server: Option<Server>,
}

#[derive(Debug, Deserialize)]
pub struct App {
    /// Log level filter (trace, debug, info, warn, error).
    pub level: String,
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub bind: Option<String>,
    pub port: u16,
    pub database: Database,
}

/// Database location: the literal string `memory` or a SQLite file path.
#[derive(Debug, Clone, Deserialize)]
#[serde(from = "String")]
pub enum Database {
    Memory,
    Sqlite(String),
}

impl From<String> for Database {
    fn from(value: String) -> Self {
        if value == "memory" {
            Database::Memory
        } else {
            Database::Sqlite(value)
        }
    }
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("app.level", "info")?
            .add_source(File::with_name("Nidhi").required(false))
            .add_source(Environment::with_prefix("NIDHI").separator("__"))
            .build()?
            .try_deserialize()
    }
}
