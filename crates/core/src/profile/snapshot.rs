#![allow(missing_docs)]

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::ProfileError;
use crate::models::catalog::strip_localisation;
use crate::models::slot::compartment_size;
use crate::models::{
    CarrierLocker, CarrierOrders, Engineering, FleetCarrier, LaunchBay, LaunchVehicle, LocalId,
    Module, RemoteCarrier, ShipLocation,
};

/// Remote module health runs 0..=1_000_000.
const HEALTH_SCALE: f64 = 10_000.0;

/// A module as the remote profile reports it, with the slot it sits in.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileModule {
    pub slot: String,
    pub module: Module,
}

/// One ship from the remote profile. Only the fields the profile carries are set.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileShip {
    pub local_id: LocalId,
    pub edname: String,
    pub name: Option<String>,
    pub ident: Option<String>,
    pub value: Option<i64>,
    pub hull_value: Option<i64>,
    pub modules_value: Option<i64>,
    /// Hull health, percent.
    pub health: Option<f64>,
    pub hot: Option<bool>,
    pub location: Option<ShipLocation>,
    pub in_transit: Option<bool>,
    pub modules: Vec<ProfileModule>,
    pub launch_bays: Vec<LaunchBay>,
}

impl ProfileShip {
    /// Lower bound on the ship's military slot size from what is fitted there.
    pub fn military_size(&self) -> Option<u8> {
        self.modules
            .iter()
            .filter(|entry| entry.slot.to_ascii_lowercase().starts_with("military"))
            .map(|entry| entry.module.class)
            .max()
    }
}

/// A point-in-time pull of the commander profile.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileSnapshot {
    pub fetched_at: DateTime<Utc>,
    pub current_ship: Option<ProfileShip>,
    pub shipyard: Vec<ProfileShip>,
    pub carrier: Option<RemoteCarrier>,
}

impl ProfileSnapshot {
    pub fn from_json(value: &Value, fetched_at: DateTime<Utc>) -> Result<Self, ProfileError> {
        let raw = RawProfile::deserialize(value)?;
        let current_id = raw.commander.as_ref().and_then(|c| c.current_ship_id);

        let current_ship = raw
            .ship
            .as_ref()
            .map(|ship| build_ship(ship, current_id))
            .transpose()?;
        let mut shipyard = Vec::new();
        for entry in entries(&raw.ships) {
            let ship = RawShip::deserialize(entry)?;
            shipyard.push(build_ship(&ship, None)?);
        }
        shipyard.sort_by_key(|ship| ship.local_id);

        Ok(Self {
            fetched_at,
            current_ship,
            shipyard,
            carrier: None,
        })
    }

    pub fn with_carrier(mut self, carrier: Option<RemoteCarrier>) -> Self {
        self.carrier = carrier;
        self
    }
}

impl RemoteCarrier {
    /// Decode the fleet carrier payload.
    pub fn from_json(value: &Value, fetched_at: DateTime<Utc>) -> Result<Self, ProfileError> {
        let raw = RawCarrier::deserialize(value)?;
        let name = raw.name.unwrap_or_default();
        let callsign = name
            .callsign
            .filter(|callsign| !callsign.is_empty())
            .ok_or_else(|| ProfileError::Malformed("carrier has no callsign".to_string()))?;
        let vanity = name
            .vanity_name
            .map(|vanity| decode_hex(&vanity).unwrap_or(vanity))
            .or(name.filtered_vanity_name)
            .filter(|vanity| !vanity.trim().is_empty());

        let capacity = raw.capacity.unwrap_or_default();
        let used_capacity = capacity.ship_packs
            + capacity.module_packs
            + capacity.cargo_for_sale
            + capacity.cargo_not_for_sale
            + capacity.cargo_space_reserved
            + capacity.crew;
        let finance = raw.finance.unwrap_or_default();
        let fuel_in_cargo = raw
            .cargo
            .iter()
            .filter(|item| {
                item.get("commodity")
                    .and_then(Value::as_str)
                    .is_some_and(|name| name.eq_ignore_ascii_case("tritium"))
            })
            .filter_map(|item| item.get("qty").and_then(loose_i64))
            .sum::<i64>();

        let locker = raw.carrier_locker.unwrap_or_default();
        let orders = raw.orders.unwrap_or_default();
        let carrier = FleetCarrier {
            callsign: Some(callsign),
            carrier_id: raw.market.as_ref().and_then(|market| market.id),
            name: vanity,
            current_system: raw.current_star_system.filter(|system| !system.is_empty()),
            next_system: None,
            docking_access: raw.docking_access,
            notorious_access: raw.notorious_access.unwrap_or(false),
            fuel: raw.fuel.as_ref().and_then(loose_i64).map_or(0, clamp_u32),
            fuel_in_cargo: clamp_u32(fuel_in_cargo),
            state: raw.state,
            bank_balance: finance.bank_balance.as_ref().and_then(loose_i64).unwrap_or(0),
            bank_reserved_balance: finance
                .bank_reserved_balance
                .as_ref()
                .and_then(loose_i64)
                .unwrap_or(0),
            used_capacity,
            free_capacity: capacity.free_space,
            cargo: raw.cargo,
            locker: CarrierLocker {
                assets: entries(&locker.assets).cloned().collect(),
                goods: entries(&locker.goods).cloned().collect(),
                data: entries(&locker.data).cloned().collect(),
            },
            orders: CarrierOrders {
                commodity_purchases: entries(&orders.commodities.purchases).cloned().collect(),
                commodity_sales: entries(&orders.commodities.sales).cloned().collect(),
                microresource_purchases: entries(&orders.onfootmicroresources.purchases)
                    .cloned()
                    .collect(),
                microresource_sales: entries(&orders.onfootmicroresources.sales)
                    .cloned()
                    .collect(),
            },
        };
        Ok(RemoteCarrier {
            carrier,
            market_id: raw.market.and_then(|market| market.id),
            fetched_at,
        })
    }
}

/// Elements of a JSON array, or values of a JSON object; the remote API
/// sends empty maps as `[]` and keyed lists as objects.
fn entries(value: &Value) -> impl Iterator<Item = &Value> {
    let items: Box<dyn Iterator<Item = &Value> + '_> = match value {
        Value::Array(items) => Box::new(items.iter()),
        Value::Object(map) => Box::new(map.values()),
        _ => Box::new(std::iter::empty()),
    };
    items.filter(|item| !item.is_null())
}

fn loose_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|float| float as i64)),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn clamp_u32(value: i64) -> u32 {
    u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}

fn decode_hex(text: &str) -> Option<String> {
    if text.is_empty() || text.len() % 2 != 0 {
        return None;
    }
    let bytes = (0..text.len())
        .step_by(2)
        .map(|index| u8::from_str_radix(text.get(index..index + 2)?, 16).ok())
        .collect::<Option<Vec<u8>>>()?;
    String::from_utf8(bytes).ok()
}

fn build_ship(raw: &RawShip, fallback_id: Option<u32>) -> Result<ProfileShip, ProfileError> {
    let id = raw
        .id
        .or(fallback_id)
        .ok_or_else(|| ProfileError::Malformed("ship without an id".to_string()))?;
    let edname = raw
        .name
        .as_deref()
        .map(|name| strip_localisation(name).to_string())
        .filter(|name| !name.is_empty())
        .ok_or_else(|| ProfileError::Malformed(format!("ship {id} has no model")))?;

    let system = raw.starsystem.as_ref().and_then(|s| s.name.clone());
    let station = raw.station.as_ref().and_then(|s| s.name.clone());
    let location = (system.is_some() || station.is_some()).then(|| ShipLocation {
        system,
        station,
        market_id: raw.station.as_ref().and_then(|s| s.id),
        coords: None,
    });

    let mut modules = Vec::new();
    for (slot, entry) in object_entries(&raw.modules) {
        match RawSlot::deserialize(entry) {
            Ok(RawSlot {
                module: Some(module),
                engineer,
            }) => modules.push(ProfileModule {
                slot: slot.clone(),
                module: build_module(&module, engineer.as_ref()),
            }),
            Ok(_) => {}
            Err(err) => debug!(ship_id = id, slot = %slot, %err, "Skipping unreadable profile slot"),
        }
    }
    modules.sort_by(|a, b| a.slot.cmp(&b.slot));

    let mut launch_bays = Vec::new();
    for (slot, bay) in object_entries(&raw.launch_bays) {
        let mut vehicles = Vec::new();
        let mut sub_slots: Vec<_> = object_entries(bay).collect();
        sub_slots.sort_by(|a, b| a.0.cmp(b.0));
        for (_, vehicle) in sub_slots {
            if let Ok(vehicle) = RawLaunchVehicle::deserialize(vehicle) {
                vehicles.push(LaunchVehicle {
                    edname: vehicle.name,
                    loadout: vehicle.loadout_name,
                    rebuilds: vehicle.rebuilds.unwrap_or(0),
                });
            }
        }
        launch_bays.push(LaunchBay {
            name: slot.clone(),
            size: compartment_size(slot, None).unwrap_or(0),
            vehicles,
        });
    }
    launch_bays.sort_by(|a, b| a.name.cmp(&b.name));

    let value = raw.value.as_ref();
    Ok(ProfileShip {
        local_id: LocalId(id),
        edname,
        name: raw.ship_name.clone().filter(|name| !name.trim().is_empty()),
        ident: raw.ship_ident.clone().filter(|ident| !ident.trim().is_empty()),
        value: value.and_then(|v| v.total.or(v.hull.zip(v.modules).map(|(h, m)| h + m))),
        hull_value: value.and_then(|v| v.hull),
        modules_value: value.and_then(|v| v.modules),
        health: raw
            .health
            .as_ref()
            .and_then(|health| health.hull)
            .map(|hull| hull / HEALTH_SCALE),
        hot: raw.hot,
        location,
        in_transit: raw.in_transit,
        modules,
        launch_bays,
    })
}

fn object_entries(value: &Value) -> impl Iterator<Item = (&String, &Value)> {
    value
        .as_object()
        .into_iter()
        .flat_map(|map| map.iter())
        .filter(|(_, entry)| !entry.is_null())
}

fn build_module(raw: &RawModule, engineer: Option<&RawEngineer>) -> Module {
    let mut module = Module::from_edname(&raw.name);
    if let Some(health) = raw.health {
        module.health = health / HEALTH_SCALE;
    }
    module.enabled = raw.on.unwrap_or(true);
    module.priority = raw.priority.and_then(|p| u8::try_from(p + 1).ok());
    module.value = raw.value.unwrap_or(0);
    module.engineering = engineer
        .and_then(|engineer| {
            let blueprint = engineer.recipe_name.clone()?;
            Some(Engineering {
                engineer: engineer.engineer_name.clone(),
                blueprint,
                level: engineer.recipe_level.unwrap_or(0),
                quality: 0.0,
                experimental_effect: None,
                modifiers: Vec::new(),
            })
        });
    module
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawProfile {
    commander: Option<RawCommander>,
    ship: Option<RawShip>,
    #[serde(default)]
    ships: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCommander {
    current_ship_id: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawShip {
    id: Option<u32>,
    name: Option<String>,
    ship_name: Option<String>,
    #[serde(rename = "shipID")]
    ship_ident: Option<String>,
    value: Option<RawShipValue>,
    health: Option<RawHealth>,
    hot: Option<bool>,
    starsystem: Option<RawPlace>,
    station: Option<RawPlace>,
    #[serde(alias = "intransit")]
    in_transit: Option<bool>,
    #[serde(default)]
    modules: Value,
    #[serde(default)]
    launch_bays: Value,
}

#[derive(Debug, Deserialize)]
struct RawShipValue {
    hull: Option<i64>,
    modules: Option<i64>,
    total: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct RawHealth {
    hull: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawPlace {
    name: Option<String>,
    id: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct RawSlot {
    module: Option<RawModule>,
    engineer: Option<RawEngineer>,
}

#[derive(Debug, Deserialize)]
struct RawModule {
    name: String,
    value: Option<i64>,
    health: Option<f64>,
    on: Option<bool>,
    priority: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEngineer {
    engineer_name: Option<String>,
    recipe_name: Option<String>,
    recipe_level: Option<u8>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawLaunchVehicle {
    name: String,
    loadout_name: Option<String>,
    rebuilds: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCarrier {
    name: Option<RawCarrierName>,
    current_star_system: Option<String>,
    fuel: Option<Value>,
    state: Option<String>,
    docking_access: Option<String>,
    notorious_access: Option<bool>,
    capacity: Option<RawCapacity>,
    finance: Option<RawFinance>,
    #[serde(default)]
    cargo: Vec<Value>,
    carrier_locker: Option<RawLocker>,
    orders: Option<RawOrders>,
    market: Option<RawPlace>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCarrierName {
    callsign: Option<String>,
    vanity_name: Option<String>,
    filtered_vanity_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawCapacity {
    ship_packs: u32,
    module_packs: u32,
    cargo_for_sale: u32,
    cargo_not_for_sale: u32,
    cargo_space_reserved: u32,
    crew: u32,
    free_space: u32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawFinance {
    bank_balance: Option<Value>,
    bank_reserved_balance: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawLocker {
    assets: Value,
    goods: Value,
    data: Value,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawOrders {
    commodities: RawOrderBook,
    onfootmicroresources: RawOrderBook,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawOrderBook {
    sales: Value,
    purchases: Value,
}
