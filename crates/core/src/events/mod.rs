#![allow(missing_docs)]

//! Typed journal events.
//!
//! One variant per journal record shape the fleet cares about. Payloads carry
//! only the fields consumers use; ednames are already stripped of localisation
//! markers and catalog-backed values are canonicalised.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{
    CanonicalName, LocalId, Module, ShipLocation, StarSystem, StoredModule,
};

/// A parsed journal record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub timestamp: DateTime<Utc>,
    /// Set when the record was replayed from an existing journal at startup.
    #[serde(default)]
    pub from_load: bool,
    pub kind: EventKind,
}

impl Event {
    pub fn new(timestamp: DateTime<Utc>, kind: EventKind) -> Self {
        Self {
            timestamp,
            from_load: false,
            kind,
        }
    }

    /// Mark the event as replayed history.
    pub fn replayed(mut self) -> Self {
        self.from_load = true;
        self
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum EventKind {
    CommanderContinued(CommanderContinued),
    Location(Location),
    Jumped(Jumped),
    Docked(Docked),
    Undocked(Undocked),
    CrewJoined(CrewJoined),
    CrewLeft(CrewLeft),
    ShipPurchased(ShipPurchased),
    ShipDelivered(ShipDelivered),
    ShipSwapped(ShipSwapped),
    ShipRenamed(ShipRenamed),
    ShipSold(ShipSold),
    ShipSoldOnRebuy(ShipSold),
    ShipLoadout(Box<ShipLoadout>),
    StoredShips(StoredShips),
    StoredModules(StoredModules),
    ShipRebooted(ShipRebooted),
    ShipRefuelled(ShipRefuelled),
    ShipAfmuRepaired(ShipAfmuRepaired),
    ShipRepaired(ShipRepaired),
    ShipRepairDrone(ShipRepairDrone),
    ShipRestocked(ShipRestocked),
    ModulePurchased(ModulePurchased),
    ModuleRetrieved(ModuleRetrieved),
    ModuleSold(ModuleSold),
    ModuleSoldFromStorage(ModuleSoldFromStorage),
    ModuleStored(ModuleStored),
    ModulesStored(ModulesStored),
    ModuleSwapped(ModuleSwapped),
    ModuleTransferred(ModuleTransferred),
    ModuleInfo(ModuleInfo),
    BountyIncurred(BountyIncurred),
    BountyPaid(BountyPaid),
    MaterialCollected(MaterialCollected),
    CarrierStats(CarrierStats),
    CarrierJumpRequested(CarrierJumpRequested),
    CarrierJumped(CarrierJumped),
}

impl EventKind {
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::CommanderContinued(_) => "CommanderContinued",
            EventKind::Location(_) => "Location",
            EventKind::Jumped(_) => "Jumped",
            EventKind::Docked(_) => "Docked",
            EventKind::Undocked(_) => "Undocked",
            EventKind::CrewJoined(_) => "CrewJoined",
            EventKind::CrewLeft(_) => "CrewLeft",
            EventKind::ShipPurchased(_) => "ShipPurchased",
            EventKind::ShipDelivered(_) => "ShipDelivered",
            EventKind::ShipSwapped(_) => "ShipSwapped",
            EventKind::ShipRenamed(_) => "ShipRenamed",
            EventKind::ShipSold(_) => "ShipSold",
            EventKind::ShipSoldOnRebuy(_) => "ShipSoldOnRebuy",
            EventKind::ShipLoadout(_) => "ShipLoadout",
            EventKind::StoredShips(_) => "StoredShips",
            EventKind::StoredModules(_) => "StoredModules",
            EventKind::ShipRebooted(_) => "ShipRebooted",
            EventKind::ShipRefuelled(_) => "ShipRefuelled",
            EventKind::ShipAfmuRepaired(_) => "ShipAfmuRepaired",
            EventKind::ShipRepaired(_) => "ShipRepaired",
            EventKind::ShipRepairDrone(_) => "ShipRepairDrone",
            EventKind::ShipRestocked(_) => "ShipRestocked",
            EventKind::ModulePurchased(_) => "ModulePurchased",
            EventKind::ModuleRetrieved(_) => "ModuleRetrieved",
            EventKind::ModuleSold(_) => "ModuleSold",
            EventKind::ModuleSoldFromStorage(_) => "ModuleSoldFromStorage",
            EventKind::ModuleStored(_) => "ModuleStored",
            EventKind::ModulesStored(_) => "ModulesStored",
            EventKind::ModuleSwapped(_) => "ModuleSwapped",
            EventKind::ModuleTransferred(_) => "ModuleTransferred",
            EventKind::ModuleInfo(_) => "ModuleInfo",
            EventKind::BountyIncurred(_) => "BountyIncurred",
            EventKind::BountyPaid(_) => "BountyPaid",
            EventKind::MaterialCollected(_) => "MaterialCollected",
            EventKind::CarrierStats(_) => "CarrierStats",
            EventKind::CarrierJumpRequested(_) => "CarrierJumpRequested",
            EventKind::CarrierJumped(_) => "CarrierJumped",
        }
    }

    /// Whether the event only moves the player around and leaves fleet state alone.
    pub fn is_context_only(&self) -> bool {
        matches!(
            self,
            EventKind::Docked(_)
                | EventKind::Undocked(_)
                | EventKind::CrewJoined(_)
                | EventKind::CrewLeft(_)
                | EventKind::MaterialCollected(_)
        )
    }
}

/// Game loaded; reports the ship (or vehicle) the commander is in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommanderContinued {
    pub commander: String,
    pub ship_id: Option<LocalId>,
    pub ship_edname: String,
    pub ship_name: Option<String>,
    pub ship_ident: Option<String>,
    pub credits: i64,
    pub fuel_level: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub system: StarSystem,
    pub station: Option<String>,
    pub market_id: Option<u64>,
    pub docked: bool,
    pub multicrew: bool,
    pub taxi: bool,
}

/// Arrived in a new star system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Jumped {
    pub system: StarSystem,
    pub distance: f64,
    pub fuel_used: f64,
    pub fuel_level: f64,
    pub boost_used: Option<u8>,
    pub multicrew: bool,
    pub taxi: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Docked {
    pub system: String,
    pub station: String,
    pub station_type: Option<String>,
    pub market_id: Option<u64>,
    pub economies: Vec<CanonicalName>,
    pub multicrew: bool,
    pub taxi: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Undocked {
    pub station: String,
    pub market_id: Option<u64>,
}

/// Joined another commander's ship as crew.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrewJoined {
    pub captain: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrewLeft {
    pub captain: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipPurchased {
    pub ship_edname: String,
    pub price: i64,
    pub market_id: Option<u64>,
    pub stored_ship_id: Option<LocalId>,
    pub stored_ship_edname: Option<String>,
    pub sold_ship_id: Option<LocalId>,
    pub sold_ship_edname: Option<String>,
    pub sold_price: Option<i64>,
}

/// A purchased ship was handed over and is now the current ship.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipDelivered {
    pub ship_id: LocalId,
    pub ship_edname: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipSwapped {
    pub ship_id: LocalId,
    pub ship_edname: String,
    pub market_id: Option<u64>,
    pub stored_ship_id: Option<LocalId>,
    pub stored_ship_edname: Option<String>,
    pub sold_ship_id: Option<LocalId>,
    pub sold_ship_edname: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipRenamed {
    pub ship_id: LocalId,
    pub ship_edname: String,
    pub name: Option<String>,
    pub ident: Option<String>,
}

/// A ship left the fleet, sold outright or on the rebuy screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipSold {
    pub ship_id: LocalId,
    pub ship_edname: String,
    pub price: i64,
    pub system: Option<String>,
}

/// A module as listed in a loadout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadoutSlot {
    pub slot: String,
    pub module: Module,
}

/// Full description of the current ship.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipLoadout {
    pub ship_id: LocalId,
    pub ship_edname: String,
    pub name: Option<String>,
    pub ident: Option<String>,
    pub hull_value: i64,
    pub modules_value: i64,
    pub rebuy: i64,
    /// Hull integrity in percent.
    pub hull_health: f64,
    pub unladen_mass: f64,
    pub cargo_capacity: u32,
    pub max_jump_range: f64,
    pub fuel_main: Option<f64>,
    pub fuel_reserve: Option<f64>,
    pub hot: bool,
    pub paintjob: Option<String>,
    pub slots: Vec<LoadoutSlot>,
    /// The record as written by the game.
    pub raw: String,
}

/// A ship listed by the shipyard's stored-ships panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredShip {
    pub ship_id: LocalId,
    pub ship_edname: String,
    pub name: Option<String>,
    pub value: i64,
    pub hot: bool,
    pub location: ShipLocation,
    pub in_transit: bool,
    pub transfer_price: Option<i64>,
    pub transfer_time: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredShips {
    pub system: String,
    pub station: String,
    pub market_id: Option<u64>,
    pub here: Vec<StoredShip>,
    pub remote: Vec<StoredShip>,
}

impl StoredShips {
    pub fn all(&self) -> impl Iterator<Item = &StoredShip> {
        self.here.iter().chain(self.remote.iter())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredModules {
    pub system: String,
    pub station: String,
    pub market_id: Option<u64>,
    pub items: Vec<StoredModule>,
}

/// A reboot/repair sequence ran on the named slots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipRebooted {
    pub slots: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RefuelSource {
    /// Bought a full tank at a station.
    MarketFull,
    MarketPartial,
    Scoop,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipRefuelled {
    pub source: RefuelSource,
    pub amount: f64,
    pub price: i64,
    /// Fuel in tanks afterwards, when the record reports it.
    pub total: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipAfmuRepaired {
    pub module_edname: String,
    pub fully_repaired: bool,
    pub health: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipRepaired {
    /// Repaired items; `All` and `Wear` denote a full repair.
    pub items: Vec<String>,
    pub price: i64,
}

impl ShipRepaired {
    pub fn is_full_repair(&self) -> bool {
        self.items
            .iter()
            .any(|item| item.eq_ignore_ascii_case("all") || item.eq_ignore_ascii_case("wear"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipRepairDrone {
    pub hull_repaired: f64,
    pub cockpit_repaired: f64,
    pub corrosion_repaired: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipRestocked {
    pub loadout: String,
    pub cost: i64,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModulePurchased {
    pub ship_id: LocalId,
    pub ship_edname: String,
    pub slot: String,
    pub module: Module,
    pub price: i64,
    pub sold_module: Option<String>,
    pub sold_price: Option<i64>,
    pub stored_module: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleRetrieved {
    pub ship_id: LocalId,
    pub ship_edname: String,
    pub slot: String,
    pub module: Module,
    pub swapped_out: Option<String>,
    pub cost: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleSold {
    pub ship_id: LocalId,
    pub ship_edname: String,
    pub slot: String,
    pub module_edname: String,
    pub price: i64,
}

/// A stored module sold without retrieving it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleSoldFromStorage {
    pub storage_slot: u32,
    pub module_edname: String,
    pub price: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleStored {
    pub ship_id: LocalId,
    pub ship_edname: String,
    pub slot: String,
    pub module_edname: String,
    /// Module installed in place of the stored one, in the same step.
    pub replacement: Option<Module>,
    pub cost: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModulesStored {
    pub ship_id: LocalId,
    pub ship_edname: String,
    pub slots: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleSwapped {
    pub ship_id: LocalId,
    pub ship_edname: String,
    pub from_slot: String,
    pub to_slot: String,
    pub from_module: String,
    /// `None` when the destination slot was empty.
    pub to_module: Option<String>,
}

/// A stored module was sent for transfer to the current station.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleTransferred {
    pub storage_slot: u32,
    pub module_edname: String,
    pub transfer_cost: i64,
    pub transfer_time: i64,
    pub ship_id: Option<LocalId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleInfoEntry {
    pub slot: String,
    pub module_edname: String,
    pub power: Option<f64>,
    pub priority: Option<u8>,
}

/// Power draw and priorities of the current ship's modules, in panel order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleInfo {
    pub modules: Vec<ModuleInfoEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BountyIncurred {
    pub crime: String,
    pub faction: String,
    pub victim: Option<String>,
    pub bounty: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BountyPaid {
    pub amount: i64,
    pub faction: Option<String>,
    pub ship_id: Option<LocalId>,
    pub broker_percentage: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialCollected {
    pub material: CanonicalName,
    pub category: String,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarrierStats {
    pub carrier_id: u64,
    pub callsign: String,
    pub name: String,
    pub docking_access: String,
    pub notorious_access: bool,
    pub fuel: u32,
    pub used_capacity: u32,
    pub free_capacity: u32,
    pub bank_balance: i64,
    pub bank_reserved_balance: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarrierJumpRequested {
    pub carrier_id: u64,
    pub system: String,
    pub system_address: Option<u64>,
}

/// The player was aboard a carrier when it jumped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarrierJumped {
    pub system: StarSystem,
    pub station: Option<String>,
    pub market_id: Option<u64>,
    pub docked: bool,
}
