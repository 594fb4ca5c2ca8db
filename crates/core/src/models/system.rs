#![allow(missing_docs)]

use serde::{Deserialize, Serialize};

use super::catalog::CanonicalName;
use super::location::Coordinates;

/// A minor faction present in a star system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Faction {
    pub name: String,
    pub allegiance: CanonicalName,
    #[serde(default)]
    pub influence: f64,
    pub state: Option<String>,
}

/// The star system the player is in, as reported on arrival.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StarSystem {
    pub name: String,
    pub address: Option<u64>,
    pub coords: Option<Coordinates>,
    pub allegiance: Option<CanonicalName>,
    #[serde(default)]
    pub economies: Vec<CanonicalName>,
    pub controlling_faction: Option<String>,
    #[serde(default)]
    pub factions: Vec<Faction>,
    pub controlling_power: Option<CanonicalName>,
    #[serde(default)]
    pub powers: Vec<CanonicalName>,
    pub powerplay_state: Option<String>,
    #[serde(default)]
    pub population: i64,
}

impl StarSystem {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: None,
            coords: None,
            allegiance: None,
            economies: Vec::new(),
            controlling_faction: None,
            factions: Vec::new(),
            controlling_power: None,
            powers: Vec::new(),
            powerplay_state: None,
            population: 0,
        }
    }

    pub fn faction(&self, name: &str) -> Option<&Faction> {
        self.factions
            .iter()
            .find(|faction| faction.name.eq_ignore_ascii_case(name))
    }
}
