//! Handles settings for the application. Configuration is written in
//! `settings.toml` and can be overridden with `PATRONAGE__*` environment
//! variables (e.g. `PATRONAGE__APP__LEVEL=debug`).
//!
//! ```toml
//! [app]
//! level = "info"
//!
//! [database]
//! sqlite = "patronage.db"
//!
//! [ledger]
//! platform_budget = "<token printed by `patronage bootstrap`>"
//! ```
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

const DEFAULT_CONFIG_PATH: &str = "settings";

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct App {
    pub level: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    Sqlite(String),
}

impl Default for Database {
    fn default() -> Self {
        Self::Sqlite("patronage.db".to_string())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct Ledger {
    /// Token of the budget collecting processing cuts.
    pub platform_budget: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub app: App,
    pub database: Database,
    pub ledger: Ledger,
}

impl Settings {
    pub fn new(path: Option<&str>) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name(path.unwrap_or(DEFAULT_CONFIG_PATH)).required(path.is_some()))
            .add_source(Environment::with_prefix("PATRONAGE").separator("__"))
            .build()?;

        settings.try_deserialize()
    }
}
