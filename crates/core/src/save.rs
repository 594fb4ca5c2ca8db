//! Fleet persistence.

use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::fleet::Vehicle;
use crate::models::{Fleet, Ship};

/// Location of the fleet file under the user's data directory.
pub const DEFAULT_STATE_FILE: &str = "fleetwatch/fleet.json";

/// Somewhere to keep the fleet between runs.
pub trait FleetRepository: Send + Sync {
    /// Load the last persisted fleet, `None` when nothing has been saved yet.
    fn load(&self) -> Result<Option<Fleet>>;

    /// Replace whatever was saved with `fleet`.
    fn persist(&self, fleet: &Fleet) -> Result<()>;
}

/// The fleet as one pretty-printed JSON document.
#[derive(Debug, Clone)]
pub struct JsonFleetFile {
    path: PathBuf,
}

impl JsonFleetFile {
    /// Repository backed by the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<data_dir>/fleetwatch/fleet.json`.
    pub fn default_path() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(DEFAULT_STATE_FILE)
    }

    /// The backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Early versions sometimes recorded the SRV as a ship.
fn is_srv(ship: &Ship) -> bool {
    Vehicle::from_edname(&ship.edname) == Vehicle::Srv || ship.model.eq_ignore_ascii_case("srv")
}

fn sanitize(fleet: &mut Fleet) {
    let srvs: Vec<_> = fleet
        .ships()
        .iter()
        .filter(|ship| is_srv(ship))
        .map(|ship| ship.local_id)
        .collect();
    for id in srvs {
        warn!(ship_id = %id, "Dropping SRV recorded as a ship");
        fleet.remove_ship(id);
    }
    let stored = fleet.stored_modules().to_vec();
    fleet.replace_stored_modules(stored);
}

impl FleetRepository for JsonFleetFile {
    fn load(&self) -> Result<Option<Fleet>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read fleet file {}", self.path.display()))?;
        let mut fleet: Fleet = serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse fleet file {}", self.path.display()))?;
        sanitize(&mut fleet);
        debug!(path = %self.path.display(), ships = fleet.ships().len(), "Loaded fleet");
        Ok(Some(fleet))
    }

    /// Write to a sibling temp file and rename it over the target, so readers
    /// never see a half-written fleet.
    fn persist(&self, fleet: &Fleet) -> Result<()> {
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;

        let serialized = serde_json::to_vec_pretty(fleet).context("failed to serialize fleet")?;
        let mut file = NamedTempFile::new_in(parent)
            .with_context(|| format!("failed to create temp file in {}", parent.display()))?;
        file.write_all(&serialized)
            .context("failed to write fleet to temp file")?;
        file.persist(&self.path)
            .with_context(|| format!("failed to replace {}", self.path.display()))?;
        debug!(path = %self.path.display(), "Persisted fleet");
        Ok(())
    }
}
