//! Plan seeding from config.toml
//!
//! Operators grant plans (including admin) by listing accounts in config.toml.
//! The entries are applied on every start, so the file stays the source of truth
//! for the users it names.

use crate::core::policy::Role;
use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Accounts whose plan is set at startup
    #[serde(default)]
    pub accounts: Vec<AccountConfig>,
}

/// Plan assignment for a single user
#[derive(Debug, Deserialize, Clone)]
pub struct AccountConfig {
    /// Discord user ID
    pub user_id: String,
    /// Plan name: "admin", "free", "starter" or "pro"
    pub plan: Role,
}

/// Loads the account configuration from a TOML file.
///
/// # Errors
/// Returns [`Error::Config`] if the file cannot be read, the TOML syntax is invalid,
/// or a plan name is unknown.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}

/// Loads the configuration named by `CONFIG_PATH` (default `./config.toml`).
/// A missing file yields an empty configuration.
pub fn load_default_config() -> Result<Config> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    if !Path::new(&path).exists() {
        tracing::warn!("No configuration file at {path}; skipping plan seeding");
        return Ok(Config::default());
    }
    load_config(path)
}
