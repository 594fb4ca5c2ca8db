use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::carrier::FleetCarrier;
use super::location::{Coordinates, ShipLocation};
use super::module::Module;
use super::ship::{LocalId, Ship};

/// A module parked at a station rather than installed in a ship.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredModule {
    /// Slot in the commander's module storage; unique per stored item.
    pub storage_slot: u32,
    /// The module as stored, with any engineering.
    pub module: Module,
    /// Station holding the module.
    #[serde(default)]
    pub location: ShipLocation,
    /// Being shipped to the player's station.
    #[serde(default)]
    pub in_transit: bool,
    /// Credits paid to have it shipped.
    #[serde(default)]
    pub transfer_cost: Option<i64>,
    /// Remaining delivery time in seconds.
    #[serde(default)]
    pub transfer_time: Option<i64>,
}

/// Every ship and stored module the commander owns.
///
/// Ship ids are unique and the current ship never carries a location; both hold
/// after every method here, so callers only reach ships through these accessors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fleet {
    #[serde(default)]
    current_ship_id: Option<LocalId>,
    #[serde(default)]
    ships: Vec<Ship>,
    #[serde(default)]
    stored_modules: Vec<StoredModule>,
    #[serde(default = "epoch")]
    updated_at: DateTime<Utc>,
    #[serde(default)]
    carrier: Option<FleetCarrier>,
    #[serde(default)]
    carrier_updated_at: Option<DateTime<Utc>>,
}

fn epoch() -> DateTime<Utc> {
    DateTime::<Utc>::default()
}

impl Default for Fleet {
    fn default() -> Self {
        Self {
            current_ship_id: None,
            ships: Vec::new(),
            stored_modules: Vec::new(),
            updated_at: epoch(),
            carrier: None,
            carrier_updated_at: None,
        }
    }
}

impl Fleet {
    /// Every ship, in insertion order.
    pub fn ships(&self) -> &[Ship] {
        &self.ships
    }

    /// The ship with `id`.
    pub fn ship(&self, id: LocalId) -> Option<&Ship> {
        self.ships.iter().find(|ship| ship.local_id == id)
    }

    /// Mutable access to the ship with `id`.
    ///
    /// Changing `local_id` through this breaks id uniqueness; use
    /// [`Fleet::add_ship`] to replace a ship.
    pub fn ship_mut(&mut self, id: LocalId) -> Option<&mut Ship> {
        self.ships.iter_mut().find(|ship| ship.local_id == id)
    }

    /// Id of the ship being flown, if any.
    pub fn current_ship_id(&self) -> Option<LocalId> {
        self.current_ship_id
    }

    /// The ship being flown.
    pub fn current_ship(&self) -> Option<&Ship> {
        self.current_ship_id.and_then(|id| self.ship(id))
    }

    /// Mutable access to the ship being flown.
    pub fn current_ship_mut(&mut self) -> Option<&mut Ship> {
        let id = self.current_ship_id?;
        self.ship_mut(id)
    }

    /// Whether `id` is the ship being flown.
    pub fn is_current(&self, id: LocalId) -> bool {
        self.current_ship_id == Some(id)
    }

    /// Modules in storage, ordered by storage slot.
    pub fn stored_modules(&self) -> &[StoredModule] {
        &self.stored_modules
    }

    /// Timestamp of the last applied journal event.
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub(crate) fn set_updated_at(&mut self, timestamp: DateTime<Utc>) {
        if timestamp > self.updated_at {
            self.updated_at = timestamp;
        }
    }

    /// The fleet carrier, once one has been seen.
    pub fn carrier(&self) -> Option<&FleetCarrier> {
        self.carrier.as_ref()
    }

    /// Journal time of the last carrier change.
    pub fn carrier_updated_at(&self) -> Option<DateTime<Utc>> {
        self.carrier_updated_at
    }

    /// Mutable carrier, created empty if unknown, stamping the journal time it changed.
    pub(crate) fn carrier_mut(&mut self, timestamp: DateTime<Utc>) -> &mut FleetCarrier {
        self.carrier_updated_at = Some(timestamp);
        self.carrier.get_or_insert_with(FleetCarrier::default)
    }

    pub(crate) fn replace_carrier(&mut self, carrier: FleetCarrier) {
        self.carrier = Some(carrier);
    }

    /// Insert a ship, replacing any ship with the same id.
    pub fn add_ship(&mut self, mut ship: Ship) {
        if self.is_current(ship.local_id) {
            ship.location = None;
            ship.distance = None;
        }
        match self.ship_mut(ship.local_id) {
            Some(existing) => *existing = ship,
            None => self.ships.push(ship),
        }
    }

    /// Look up a ship by id, creating it from `edname` when unknown.
    pub fn ship_or_insert(&mut self, id: LocalId, edname: &str) -> &mut Ship {
        match self.ships.iter().position(|ship| ship.local_id == id) {
            Some(index) => &mut self.ships[index],
            None => {
                self.ships.push(Ship::new(id, edname));
                let last = self.ships.len() - 1;
                &mut self.ships[last]
            }
        }
    }

    /// Remove and return the ship with `id`, clearing the current ship if it was that one.
    pub fn remove_ship(&mut self, id: LocalId) -> Option<Ship> {
        let index = self.ships.iter().position(|ship| ship.local_id == id)?;
        if self.current_ship_id == Some(id) {
            self.current_ship_id = None;
        }
        Some(self.ships.remove(index))
    }

    /// Make `id` the current ship, creating it from `edname` when unknown.
    ///
    /// Returns `None` when the ship is unknown and no edname was given.
    pub fn set_current_ship(&mut self, id: LocalId, edname: Option<&str>) -> Option<&mut Ship> {
        if self.ship(id).is_none() {
            let edname = edname?;
            self.ships.push(Ship::new(id, edname));
        }
        self.current_ship_id = Some(id);
        let ship = self.ship_mut(id)?;
        ship.location = None;
        ship.distance = None;
        Some(ship)
    }

    /// Forget which ship is current, e.g. while a purchased hull is being delivered.
    pub fn clear_current_ship(&mut self) {
        self.current_ship_id = None;
    }

    /// The most valuable ship; the first listed wins a tie.
    pub fn highest_value_ship_id(&self) -> Option<LocalId> {
        self.ships
            .iter()
            .fold(None::<&Ship>, |best, ship| match best {
                Some(best) if best.value >= ship.value => Some(best),
                _ => Some(ship),
            })
            .map(|ship| ship.local_id)
    }

    /// Recompute the distance from `coords` to every stored ship.
    pub fn update_distances(&mut self, coords: &Coordinates) {
        let current = self.current_ship_id;
        for ship in &mut self.ships {
            ship.distance = if Some(ship.local_id) == current {
                None
            } else {
                ship.distance_from(coords)
            };
        }
    }

    pub(crate) fn stored_modules_mut(&mut self) -> &mut Vec<StoredModule> {
        &mut self.stored_modules
    }

    /// Replace the stored module list wholesale, ordered by storage slot.
    pub fn replace_stored_modules(&mut self, mut modules: Vec<StoredModule>) {
        modules.sort_by_key(|stored| stored.storage_slot);
        self.stored_modules = modules;
    }

    /// Drop ships matching `predicate`; the current ship is never removed this way.
    pub fn retain_ships(&mut self, mut predicate: impl FnMut(&Ship) -> bool) -> Vec<LocalId> {
        let current = self.current_ship_id;
        let mut removed = Vec::new();
        self.ships.retain(|ship| {
            let keep = Some(ship.local_id) == current || predicate(ship);
            if !keep {
                removed.push(ship.local_id);
            }
            keep
        });
        removed
    }
}
