//! Configuration loading: defaults, a JSON file and environment overrides.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::save::JsonFleetFile;

const CONFIG_FILE: &str = "fleetwatch/config.json";
const ENV_PREFIX: &str = "FLEETWATCH";

/// Runtime settings for the companion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory the game writes `Journal.*.log` files into.
    pub journal_dir: PathBuf,
    /// Where the fleet is persisted between runs.
    pub state_path: PathBuf,
    /// Commander profile endpoint; remote polling is off when unset.
    pub profile_url: Option<String>,
    /// Fleet carrier endpoint, fetched alongside the profile.
    pub carrier_url: Option<String>,
    /// Bearer token sent with both requests.
    pub profile_token: Option<String>,
    /// Seconds between scheduled profile fetches.
    pub profile_poll_secs: u64,
    /// Delay before a debounced profile refresh fires.
    pub refresh_delay_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            journal_dir: default_journal_dir(),
            state_path: JsonFleetFile::default_path(),
            profile_url: None,
            carrier_url: None,
            profile_token: None,
            profile_poll_secs: 300,
            refresh_delay_secs: 20,
        }
    }
}

fn default_journal_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Saved Games")
        .join("Frontier Developments")
        .join("Elite Dangerous")
}

impl AppConfig {
    /// `<config_dir>/fleetwatch/config.json`.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(CONFIG_FILE)
    }

    /// Load from [`AppConfig::default_path`].
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path())
    }

    /// Layer defaults, the JSON file at `path` (if present) and `FLEETWATCH_*` variables.
    pub fn load_from(path: &Path) -> Result<Self> {
        let defaults = Config::try_from(&AppConfig::default())
            .context("failed to serialise default configuration")?;
        let settings = Config::builder()
            .add_source(defaults)
            .add_source(
                File::from(path)
                    .format(FileFormat::Json)
                    .required(false),
            )
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()
            .with_context(|| format!("failed to read configuration {}", path.display()))?;
        settings
            .try_deserialize()
            .with_context(|| format!("invalid configuration in {}", path.display()))
    }

    /// Poll interval, never shorter than a second.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.profile_poll_secs.max(1))
    }

    /// Debounce delay for refresh requests.
    pub fn refresh_delay(&self) -> Duration {
        Duration::from_secs(self.refresh_delay_secs)
    }
}

/// Write a pretty-printed default configuration to `path` unless one exists.
///
/// Returns `true` when a file was written.
pub fn ensure_default_config(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(&AppConfig::default())?;
    fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), "Wrote default configuration");
    Ok(true)
}
