use serde::{Deserialize, Serialize};

/// Galactic coordinates in light years.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Coordinates {
    /// Coordinates from the journal's `StarPos` triple.
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Straight-line distance, rounded to two decimals like the in-game panels.
    pub fn distance_to(&self, other: &Coordinates) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        ((dx * dx + dy * dy + dz * dz).sqrt() * 100.0).round() / 100.0
    }
}

/// Where a stored ship or module sits.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ShipLocation {
    /// Star system name.
    pub system: Option<String>,
    /// Station name; absent for remote listings that only give the system.
    pub station: Option<String>,
    /// Market id of the station.
    pub market_id: Option<u64>,
    /// Coordinates of the system, when known.
    #[serde(default)]
    pub coords: Option<Coordinates>,
}

impl ShipLocation {
    /// True when no field carries any information.
    pub fn is_empty(&self) -> bool {
        self.system.is_none()
            && self.station.is_none()
            && self.market_id.is_none()
            && self.coords.is_none()
    }
}
