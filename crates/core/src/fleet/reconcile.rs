//! Applying journal events to the fleet.
//!
//! [`apply_event`] is the single entry point. It keeps the player context in
//! step with every event, drops fleet changes older than the last one applied,
//! and dispatches to one handler per event kind. Handlers mutate the fleet in
//! place; the store gives them a scratch copy so a rejected event leaves the
//! shared state untouched.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use tracing::{debug, error, warn};

use super::slots;
use super::{Applied, ApplyStatus, FleetError, PlayerContext, RefreshRequest, Vehicle};
use crate::events::*;
use crate::models::module::canonical_edname;
use crate::models::{Compartment, Fleet, LocalId, Module, Ship, ShipLocation, SlotKind};

/// Apply one event to `fleet`, updating `context` on the way.
///
/// Events older than or equal to the fleet's `updated_at` only touch the
/// context. A module mutation that cannot be performed consistently is logged
/// and returned as an error; the caller is expected to discard `fleet`.
pub fn apply_event(
    fleet: &mut Fleet,
    context: &mut PlayerContext,
    event: &Event,
) -> Result<Applied, FleetError> {
    update_context(context, &event.kind);
    if event.kind.is_context_only() {
        return Ok(Applied::with_status(ApplyStatus::ContextOnly));
    }
    if event.timestamp <= fleet.updated_at() {
        debug!(
            event = event.name(),
            timestamp = %event.timestamp,
            updated_at = %fleet.updated_at(),
            "Dropping stale event"
        );
        return Ok(Applied::with_status(ApplyStatus::Stale));
    }

    let applied = dispatch(fleet, context, event)?;
    fleet.set_updated_at(event.timestamp);
    Ok(applied)
}

fn update_context(context: &mut PlayerContext, kind: &EventKind) {
    match kind {
        EventKind::CommanderContinued(e) => {
            context.vehicle = Vehicle::from_edname(&e.ship_edname);
        }
        EventKind::Location(e) => {
            context.system = Some(e.system.name.clone());
            context.coords = e.system.coords;
            context.docked = e.docked;
            context.station = e.station.clone().filter(|_| e.docked);
            context.market_id = e.market_id.filter(|_| e.docked);
            context.vehicle = passenger_vehicle(e.multicrew, e.taxi, context.vehicle);
        }
        EventKind::Jumped(e) => {
            context.system = Some(e.system.name.clone());
            context.coords = e.system.coords;
            context.docked = false;
            context.station = None;
            context.market_id = None;
            context.vehicle = passenger_vehicle(e.multicrew, e.taxi, context.vehicle);
        }
        EventKind::Docked(e) => {
            context.system = Some(e.system.clone());
            context.station = Some(e.station.clone());
            context.market_id = e.market_id;
            context.docked = true;
            context.vehicle = passenger_vehicle(e.multicrew, e.taxi, context.vehicle);
        }
        EventKind::Undocked(_) => {
            context.docked = false;
            context.station = None;
            context.market_id = None;
        }
        EventKind::CrewJoined(_) => context.vehicle = Vehicle::Multicrew,
        EventKind::CrewLeft(_) => context.vehicle = Vehicle::Ship,
        EventKind::CarrierJumped(e) => {
            context.system = Some(e.system.name.clone());
            context.coords = e.system.coords;
            context.docked = e.docked;
            context.station = e.station.clone().filter(|_| e.docked);
            context.market_id = e.market_id.filter(|_| e.docked);
        }
        _ => {}
    }
}

fn passenger_vehicle(multicrew: bool, taxi: bool, current: Vehicle) -> Vehicle {
    if multicrew {
        Vehicle::Multicrew
    } else if taxi {
        Vehicle::Taxi
    } else if matches!(current, Vehicle::Multicrew | Vehicle::Taxi) {
        Vehicle::Ship
    } else {
        current
    }
}

fn dispatch(
    fleet: &mut Fleet,
    context: &PlayerContext,
    event: &Event,
) -> Result<Applied, FleetError> {
    let timestamp = event.timestamp;
    let applied = match &event.kind {
        EventKind::CommanderContinued(e) => commander_continued(fleet, e),
        EventKind::Location(e) => location(fleet, e),
        EventKind::Jumped(e) => jumped(fleet, context, e),
        EventKind::ShipPurchased(e) => ship_purchased(fleet, context, e),
        EventKind::ShipDelivered(e) => {
            fleet.set_current_ship(e.ship_id, Some(&e.ship_edname));
            Applied::changed()
        }
        EventKind::ShipSwapped(e) => ship_swapped(fleet, context, e),
        EventKind::ShipRenamed(e) => ship_renamed(fleet, e),
        EventKind::ShipSold(e) | EventKind::ShipSoldOnRebuy(e) => ship_sold(fleet, e),
        EventKind::ShipLoadout(e) => loadout(fleet, e, event.from_load),
        EventKind::StoredShips(e) => stored_ships(fleet, context, e),
        EventKind::StoredModules(e) => {
            fleet.replace_stored_modules(e.items.clone());
            Applied::changed()
        }
        EventKind::ShipRebooted(e) => rebooted(fleet, e),
        EventKind::ShipRefuelled(e) => refuelled(fleet, e),
        EventKind::ShipRepaired(e) => repaired(fleet, e),
        EventKind::ShipRepairDrone(_) => Applied::unchanged().refresh(RefreshRequest::Immediate),
        EventKind::ShipAfmuRepaired(_) | EventKind::ShipRestocked(_) => Applied::unchanged(),
        EventKind::ModulePurchased(e) => {
            install(fleet, e.ship_id, &e.ship_edname, &e.slot, e.module.clone())?
        }
        EventKind::ModuleRetrieved(e) => {
            install(fleet, e.ship_id, &e.ship_edname, &e.slot, e.module.clone())?
        }
        EventKind::ModuleSold(e) => remove(
            fleet,
            e.ship_id,
            &e.ship_edname,
            &e.slot,
            &e.module_edname,
            None,
        )?,
        EventKind::ModuleStored(e) => remove(
            fleet,
            e.ship_id,
            &e.ship_edname,
            &e.slot,
            &e.module_edname,
            e.replacement.clone(),
        )?,
        EventKind::ModulesStored(e) => modules_stored(fleet, e)?,
        EventKind::ModuleSwapped(e) => module_swapped(fleet, e)?,
        EventKind::ModuleSoldFromStorage(e) => sold_from_storage(fleet, e),
        EventKind::ModuleTransferred(e) => module_transferred(fleet, e),
        EventKind::ModuleInfo(e) => module_info(fleet, e),
        EventKind::BountyIncurred(_) => bounty_incurred(fleet, context),
        EventKind::BountyPaid(e) => bounty_paid(fleet, e),
        EventKind::CarrierStats(e) => carrier_stats(fleet, timestamp, e),
        EventKind::CarrierJumpRequested(e) => carrier_jump_requested(fleet, timestamp, e),
        EventKind::CarrierJumped(e) => carrier_jumped(fleet, timestamp, e),
        EventKind::Docked(_)
        | EventKind::Undocked(_)
        | EventKind::CrewJoined(_)
        | EventKind::CrewLeft(_)
        | EventKind::MaterialCollected(_) => Applied::with_status(ApplyStatus::ContextOnly),
    };
    Ok(applied)
}

/// Drop the placeholder the game writes for unset or redacted names.
fn user_text(value: &Option<String>) -> Option<String> {
    value.clone().filter(|text| !text.contains("***"))
}

fn commander_continued(fleet: &mut Fleet, e: &CommanderContinued) -> Applied {
    if Vehicle::from_edname(&e.ship_edname) != Vehicle::Ship {
        return Applied::unchanged();
    }
    let Some(id) = e.ship_id else {
        return Applied::unchanged();
    };
    let Some(ship) = fleet.set_current_ship(id, Some(&e.ship_edname)) else {
        return Applied::unchanged();
    };
    if let Some(name) = user_text(&e.ship_name) {
        ship.name = Some(name);
    }
    if let Some(ident) = user_text(&e.ship_ident) {
        ship.ident = Some(ident);
    }
    if e.fuel_level.is_some() {
        ship.fuel_in_tanks = e.fuel_level;
    }
    Applied::changed()
}

fn location(fleet: &mut Fleet, e: &Location) -> Applied {
    match &e.system.coords {
        Some(coords) => {
            fleet.update_distances(coords);
            Applied::changed()
        }
        None => Applied::unchanged(),
    }
}

fn jumped(fleet: &mut Fleet, context: &PlayerContext, e: &Jumped) -> Applied {
    if let Some(coords) = &e.system.coords {
        fleet.update_distances(coords);
    }
    if context.vehicle == Vehicle::Ship {
        if let Some(ship) = fleet.current_ship_mut() {
            ship.fuel_in_tanks = Some(e.fuel_level);
        }
    }
    Applied::changed()
}

/// Park a ship at the player's current station.
fn store_at_station(
    fleet: &mut Fleet,
    context: &PlayerContext,
    id: LocalId,
    edname: Option<&str>,
    market_id: Option<u64>,
) {
    if fleet.ship(id).is_none() {
        match edname {
            Some(edname) => fleet.add_ship(Ship::new(id, edname)),
            None => return,
        }
    }
    if fleet.is_current(id) {
        fleet.clear_current_ship();
    }
    if let Some(ship) = fleet.ship_mut(id) {
        ship.location = Some(ShipLocation {
            system: context.system.clone(),
            station: context.station.clone(),
            market_id: market_id.or(context.market_id),
            coords: context.coords,
        });
        ship.distance = Some(0.0);
        ship.in_transit = false;
    }
}

fn ship_purchased(fleet: &mut Fleet, context: &PlayerContext, e: &ShipPurchased) -> Applied {
    if let Some(stored) = e.stored_ship_id {
        store_at_station(
            fleet,
            context,
            stored,
            e.stored_ship_edname.as_deref(),
            e.market_id,
        );
    }
    if let Some(sold) = e.sold_ship_id {
        fleet.remove_ship(sold);
    }
    Applied::changed()
}

fn ship_swapped(fleet: &mut Fleet, context: &PlayerContext, e: &ShipSwapped) -> Applied {
    if let Some(stored) = e.stored_ship_id {
        store_at_station(
            fleet,
            context,
            stored,
            e.stored_ship_edname.as_deref(),
            e.market_id,
        );
    }
    if let Some(sold) = e.sold_ship_id {
        fleet.remove_ship(sold);
    }
    fleet.set_current_ship(e.ship_id, Some(&e.ship_edname));
    Applied::changed().refresh(RefreshRequest::Immediate)
}

fn ship_renamed(fleet: &mut Fleet, e: &ShipRenamed) -> Applied {
    let ship = fleet.ship_or_insert(e.ship_id, &e.ship_edname);
    ship.name = user_text(&e.name);
    ship.ident = user_text(&e.ident);
    Applied::changed()
}

fn ship_sold(fleet: &mut Fleet, e: &ShipSold) -> Applied {
    match fleet.remove_ship(e.ship_id) {
        Some(_) => Applied::changed(),
        None => Applied::unchanged(),
    }
}

/// Rebuild a ship from a full loadout. Remote-only data (launch bays,
/// confirmed military size, location of other ships) survives.
fn loadout(fleet: &mut Fleet, e: &ShipLoadout, from_load: bool) -> Applied {
    if Vehicle::from_edname(&e.ship_edname) != Vehicle::Ship {
        return Applied::unchanged();
    }
    let template = Ship::new(e.ship_id, &e.ship_edname);
    let mut ship = fleet.ship(e.ship_id).cloned().unwrap_or_else(|| template.clone());

    ship.military_size = template.military_size.or(ship.military_size);
    ship.edname = template.edname;
    ship.model = template.model;
    ship.manufacturer = template.manufacturer;
    if let Some(name) = user_text(&e.name) {
        ship.name = Some(name);
    }
    if let Some(ident) = user_text(&e.ident) {
        ship.ident = Some(ident);
    }
    ship.hull_value = e.hull_value;
    ship.modules_value = e.modules_value;
    ship.value = e.hull_value + e.modules_value;
    ship.rebuy = e.rebuy;
    ship.health = e.hull_health;
    ship.hot = e.hot;
    ship.unladen_mass = e.unladen_mass;
    ship.reservoir_capacity = e.fuel_reserve.unwrap_or(template.reservoir_capacity);
    ship.paintjob = e.paintjob.clone();
    ship.raw = Some(e.raw.clone());

    ship.core = Default::default();
    ship.compartments.clear();
    ship.hardpoints.clear();
    for entry in &e.slots {
        match slots::install(&mut ship, &entry.slot, entry.module.clone()) {
            Ok(()) => {}
            Err(FleetError::UnknownSlotSize { .. })
                if SlotKind::classify(&entry.slot) == SlotKind::Compartment =>
            {
                // Without a catalog size the fitted module's class is the best lower bound.
                debug!(
                    ship_id = %ship.local_id,
                    slot = %entry.slot,
                    "Sizing compartment from its module"
                );
                ship.compartments.push(Compartment {
                    name: entry.slot.clone(),
                    size: entry.module.class,
                    module: Some(entry.module.clone()),
                });
            }
            Err(err) => {
                warn!(ship_id = %ship.local_id, slot = %entry.slot, %err, "Skipping loadout slot");
            }
        }
    }
    crate::models::slot::sort_compartments(&mut ship.compartments);

    fleet.add_ship(ship);
    fleet.set_current_ship(e.ship_id, None);

    let applied = Applied::changed();
    if from_load {
        applied
    } else {
        applied.refresh(RefreshRequest::Delayed)
    }
}

fn stored_ships(fleet: &mut Fleet, context: &PlayerContext, e: &StoredShips) -> Applied {
    let listed: HashSet<LocalId> = e.all().map(|stored| stored.ship_id).collect();
    let pruned = fleet.retain_ships(|ship| listed.contains(&ship.local_id));
    if !pruned.is_empty() {
        debug!(?pruned, "Dropped ships missing from the shipyard listing");
    }

    let here = e.here.iter().map(|stored| (stored, true));
    let remote = e.remote.iter().map(|stored| (stored, false));
    for (stored, is_here) in here.chain(remote) {
        if fleet.is_current(stored.ship_id) {
            continue;
        }
        let ship = fleet.ship_or_insert(stored.ship_id, &stored.ship_edname);
        if let Some(name) = user_text(&stored.name) {
            ship.name = Some(name);
        }
        ship.value = stored.value;
        ship.hot = stored.hot;
        ship.in_transit = stored.in_transit;
        ship.transfer_price = stored.transfer_price;
        ship.transfer_time = stored.transfer_time;

        let mut location = stored.location.clone();
        let known_coords = ship
            .location
            .as_ref()
            .filter(|previous| previous.system == location.system)
            .and_then(|previous| previous.coords);
        location.coords = if is_here { context.coords } else { known_coords };
        ship.distance = match (is_here, &location.coords, &context.coords) {
            (true, _, _) => Some(0.0),
            (false, Some(ship_coords), Some(player)) => Some(ship_coords.distance_to(player)),
            _ => None,
        };
        ship.location = Some(location);
    }
    Applied::changed()
}

fn rebooted(fleet: &mut Fleet, e: &ShipRebooted) -> Applied {
    let Some(ship) = fleet.current_ship_mut() else {
        return Applied::unchanged();
    };
    let mut affected = Vec::new();
    for slot in &e.slots {
        if let Some(module) = ship.module_in_mut(slot) {
            module.health = 1.0;
            affected.push(module.clone());
        }
    }
    Applied {
        affected_modules: affected,
        ..Applied::changed()
    }
}

fn refuelled(fleet: &mut Fleet, e: &ShipRefuelled) -> Applied {
    let Some(ship) = fleet.current_ship_mut() else {
        return Applied::unchanged();
    };
    let capacity = ship.fuel_tank_total_capacity();
    let fuel = match e.source {
        RefuelSource::Scoop => e.total.or(ship.fuel_in_tanks),
        RefuelSource::MarketFull if capacity > 0.0 => Some(capacity),
        RefuelSource::MarketFull | RefuelSource::MarketPartial => ship
            .fuel_in_tanks
            .map(|fuel| fuel + e.amount)
            .map(|fuel| if capacity > 0.0 { fuel.min(capacity) } else { fuel }),
    };
    ship.fuel_in_tanks = fuel;
    let full_tank = match (fuel, capacity > 0.0) {
        (Some(fuel), true) => Some(fuel >= capacity - 0.01),
        _ => None,
    };
    Applied {
        full_tank,
        ..Applied::changed()
    }
}

fn repaired(fleet: &mut Fleet, e: &ShipRepaired) -> Applied {
    if !e.is_full_repair() {
        return Applied::unchanged().refresh(RefreshRequest::Immediate);
    }
    match fleet.current_ship_mut() {
        Some(ship) => {
            ship.health = 100.0;
            Applied::changed()
        }
        None => Applied::unchanged(),
    }
}

fn log_rejection(ship_id: LocalId, slot: &str, module: &str, err: &FleetError) {
    error!(ship_id = %ship_id, slot, module, %err, "Rejecting module change");
}

fn install(
    fleet: &mut Fleet,
    ship_id: LocalId,
    ship_edname: &str,
    slot: &str,
    module: Module,
) -> Result<Applied, FleetError> {
    let edname = module.edname.clone();
    let ship = fleet.ship_or_insert(ship_id, ship_edname);
    slots::install(ship, slot, module).map_err(|err| {
        log_rejection(ship_id, slot, &edname, &err);
        err
    })?;
    Ok(Applied::changed())
}

fn remove(
    fleet: &mut Fleet,
    ship_id: LocalId,
    ship_edname: &str,
    slot: &str,
    module_edname: &str,
    replacement: Option<Module>,
) -> Result<Applied, FleetError> {
    let ship = fleet.ship_or_insert(ship_id, ship_edname);
    slots::remove(ship, slot, replacement).map_err(|err| {
        log_rejection(ship_id, slot, module_edname, &err);
        err
    })?;
    Ok(Applied::changed())
}

fn modules_stored(fleet: &mut Fleet, e: &ModulesStored) -> Result<Applied, FleetError> {
    let ship = fleet.ship_or_insert(e.ship_id, &e.ship_edname);
    for slot in &e.slots {
        slots::remove(ship, slot, None).map_err(|err| {
            log_rejection(e.ship_id, slot, "", &err);
            err
        })?;
    }
    Ok(Applied::changed())
}

/// Swap two slots, then make both match what the game reports they now hold.
fn module_swapped(fleet: &mut Fleet, e: &ModuleSwapped) -> Result<Applied, FleetError> {
    let ship = fleet.ship_or_insert(e.ship_id, &e.ship_edname);
    let reject = |err: FleetError| {
        log_rejection(e.ship_id, &e.from_slot, &e.from_module, &err);
        err
    };
    slots::swap(ship, &e.from_slot, &e.to_slot).map_err(reject)?;

    let holds = |ship: &Ship, slot: &str, edname: &str| {
        ship.module_in(slot)
            .is_some_and(|module| module.canonical_name() == canonical_edname(edname))
    };
    if !holds(&*ship, &e.to_slot, &e.from_module) {
        slots::install(ship, &e.to_slot, Module::from_edname(&e.from_module)).map_err(reject)?;
    }
    match &e.to_module {
        Some(to_module) if !holds(&*ship, &e.from_slot, to_module) => {
            slots::install(ship, &e.from_slot, Module::from_edname(to_module)).map_err(reject)?;
        }
        Some(_) => {}
        None => {
            slots::remove(ship, &e.from_slot, None).map_err(reject)?;
        }
    }
    Ok(Applied::changed())
}

fn sold_from_storage(fleet: &mut Fleet, e: &ModuleSoldFromStorage) -> Applied {
    let stored = fleet.stored_modules_mut();
    let before = stored.len();
    stored.retain(|item| item.storage_slot != e.storage_slot);
    if stored.len() == before {
        Applied::unchanged()
    } else {
        Applied::changed()
    }
}

fn module_transferred(fleet: &mut Fleet, e: &ModuleTransferred) -> Applied {
    let Some(item) = fleet
        .stored_modules_mut()
        .iter_mut()
        .find(|item| item.storage_slot == e.storage_slot)
    else {
        return Applied::unchanged();
    };
    item.in_transit = true;
    item.transfer_cost = Some(e.transfer_cost);
    item.transfer_time = Some(e.transfer_time);
    Applied::changed()
}

fn module_info(fleet: &mut Fleet, e: &ModuleInfo) -> Applied {
    let Some(ship) = fleet.current_ship_mut() else {
        return Applied::unchanged();
    };
    for (index, entry) in e.modules.iter().enumerate() {
        let position = u32::try_from(index + 1).ok();
        if ship.module_in(&entry.slot).is_none() {
            if !matches!(SlotKind::classify(&entry.slot), SlotKind::Core(_)) {
                continue;
            }
            let module = Module::from_edname(&entry.module_edname);
            if let Err(err) = slots::install(ship, &entry.slot, module) {
                warn!(ship_id = %ship.local_id, slot = %entry.slot, %err, "Skipping module info entry");
                continue;
            }
        }
        if let Some(module) = ship.module_in_mut(&entry.slot) {
            module.power = entry.power;
            module.priority = entry.priority;
            module.position = position;
        }
    }
    Applied::changed()
}

fn bounty_incurred(fleet: &mut Fleet, context: &PlayerContext) -> Applied {
    // Crewing for someone else: the game charges the bounty to the highest-value hull.
    let target = if context.vehicle == Vehicle::Multicrew {
        fleet.highest_value_ship_id()
    } else {
        fleet.current_ship_id()
    };
    match target.and_then(|id| fleet.ship_mut(id)) {
        Some(ship) => {
            ship.hot = true;
            Applied::changed()
        }
        None => Applied::unchanged(),
    }
}

fn bounty_paid(fleet: &mut Fleet, e: &BountyPaid) -> Applied {
    let target = e.ship_id.or(fleet.current_ship_id());
    match target.and_then(|id| fleet.ship_mut(id)) {
        Some(ship) => {
            ship.hot = false;
            Applied::changed()
        }
        None => Applied::unchanged(),
    }
}

fn carrier_stats(fleet: &mut Fleet, timestamp: DateTime<Utc>, e: &CarrierStats) -> Applied {
    let carrier = fleet.carrier_mut(timestamp);
    carrier.carrier_id = Some(e.carrier_id);
    carrier.callsign = Some(e.callsign.clone());
    if !e.name.is_empty() {
        carrier.name = Some(e.name.clone());
    }
    if !e.docking_access.is_empty() {
        carrier.docking_access = Some(e.docking_access.clone());
    }
    carrier.notorious_access = e.notorious_access;
    carrier.fuel = e.fuel;
    carrier.used_capacity = e.used_capacity;
    carrier.free_capacity = e.free_capacity;
    carrier.bank_balance = e.bank_balance;
    carrier.bank_reserved_balance = e.bank_reserved_balance;
    Applied::changed()
}

fn owns_carrier(fleet: &Fleet, carrier_id: Option<u64>) -> bool {
    match (fleet.carrier().and_then(|carrier| carrier.carrier_id), carrier_id) {
        (Some(known), Some(id)) => known == id,
        (None, _) => true,
        (Some(_), None) => false,
    }
}

fn carrier_jump_requested(
    fleet: &mut Fleet,
    timestamp: DateTime<Utc>,
    e: &CarrierJumpRequested,
) -> Applied {
    if !owns_carrier(fleet, Some(e.carrier_id)) {
        return Applied::unchanged();
    }
    let carrier = fleet.carrier_mut(timestamp);
    carrier.carrier_id = Some(e.carrier_id);
    carrier.next_system = Some(e.system.clone());
    Applied::changed()
}

fn carrier_jumped(fleet: &mut Fleet, timestamp: DateTime<Utc>, e: &CarrierJumped) -> Applied {
    if let Some(coords) = &e.system.coords {
        fleet.update_distances(coords);
    }
    if fleet.carrier().is_some() && owns_carrier(fleet, e.market_id) {
        let carrier = fleet.carrier_mut(timestamp);
        carrier.current_system = Some(e.system.name.clone());
        carrier.next_system = None;
    }
    Applied::changed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journal::parse_line;

    fn event(line: &str) -> Event {
        parse_line(line).unwrap().unwrap()
    }

    fn apply(fleet: &mut Fleet, context: &mut PlayerContext, line: &str) -> Applied {
        apply_event(fleet, context, &event(line)).unwrap()
    }

    const LOADOUT_T1: &str = r#"{"timestamp":"2024-03-01T10:00:00Z","event":"Loadout","Ship":"krait_mkii","ShipID":5,"ShipName":"Dusk","ShipIdent":"KR-05","HullValue":40000000,"ModulesValue":20000000,"HullHealth":0.9,"UnladenMass":500,"CargoCapacity":32,"MaxJumpRange":20,"FuelCapacity":{"Main":32,"Reserve":0.63},"Rebuy":3000000,"Modules":[{"Slot":"FrameShiftDrive","Item":"int_hyperdrive_size5_class5","On":true,"Priority":0,"Health":1.0,"Value":5000000},{"Slot":"FuelTank","Item":"int_fueltank_size5_class3","On":true,"Priority":1,"Health":1.0},{"Slot":"Slot01_Size6","Item":"int_cargorack_size5_class1","On":true,"Priority":1,"Health":1.0},{"Slot":"MediumHardpoint1","Item":"hpt_pulselaser_gimbal_medium","On":true,"Priority":0,"Health":1.0},{"Slot":"TinyHardpoint1","Item":"hpt_heatsinklauncher_turret_tiny","On":true,"Priority":0,"Health":1.0}]}"#;

    fn loadout_at(timestamp: &str) -> String {
        LOADOUT_T1.replace("2024-03-01T10:00:00Z", timestamp)
    }

    #[test]
    fn loadout_builds_current_ship() {
        let mut fleet = Fleet::default();
        let mut context = PlayerContext::default();
        let applied = apply(&mut fleet, &mut context, LOADOUT_T1);

        assert_eq!(applied.status, ApplyStatus::Applied);
        assert_eq!(applied.refresh, Some(RefreshRequest::Delayed));
        let ship = fleet.current_ship().unwrap();
        assert_eq!(ship.local_id, LocalId(5));
        assert_eq!(ship.model, "Krait Mk. II");
        assert_eq!(ship.name.as_deref(), Some("Dusk"));
        assert_eq!(ship.value, 60_000_000);
        assert_eq!(ship.health, 90.0);
        assert_eq!(ship.reservoir_capacity, 0.63);
        assert_eq!(ship.cargo_capacity(), 32);
        assert_eq!(ship.hardpoints.len(), 2);
        assert_eq!(ship.hardpoints[0].name, "TinyHardpoint1");
        assert!(ship.location.is_none());
    }

    #[test]
    fn same_loadout_twice_is_idempotent() {
        let mut once = Fleet::default();
        let mut context = PlayerContext::default();
        apply(&mut once, &mut context, LOADOUT_T1);

        let mut twice = once.clone();
        let applied = apply(&mut twice, &mut context, LOADOUT_T1);
        assert_eq!(applied.status, ApplyStatus::Stale);
        assert_eq!(once, twice);
    }

    #[test]
    fn older_event_after_newer_is_dropped() {
        let newer = loadout_at("2024-03-01T11:00:00Z");
        let older = LOADOUT_T1.replace("\"Dusk\"", "\"Dawn\"");

        let mut expected = Fleet::default();
        apply(&mut expected, &mut PlayerContext::default(), &newer);

        let mut fleet = Fleet::default();
        let mut context = PlayerContext::default();
        apply(&mut fleet, &mut context, &newer);
        let applied = apply(&mut fleet, &mut context, &older);

        assert_eq!(applied.status, ApplyStatus::Stale);
        assert_eq!(fleet, expected);
        assert_eq!(fleet.current_ship().and_then(|s| s.name.as_deref()), Some("Dusk"));
    }

    #[test]
    fn purchase_then_loadout_yields_one_ship() {
        let mut fleet = Fleet::default();
        let mut context = PlayerContext::default();
        apply(
            &mut fleet,
            &mut context,
            r#"{"timestamp":"2024-03-01T10:00:00Z","event":"ShipyardBuy","ShipType":"krait_mkii","ShipPrice":45000000,"MarketID":128666762}"#,
        );
        apply(&mut fleet, &mut context, &loadout_at("2024-03-01T10:01:00Z"));

        assert_eq!(fleet.ships().len(), 1);
        assert_eq!(fleet.ships()[0].model, "Krait Mk. II");
        assert_eq!(fleet.current_ship_id(), Some(LocalId(5)));
        assert_eq!(fleet.updated_at().to_rfc3339(), "2024-03-01T10:01:00+00:00");
    }

    #[test]
    fn swap_stores_previous_ship_at_station() {
        let mut fleet = Fleet::default();
        let mut context = PlayerContext::default();
        apply(&mut fleet, &mut context, LOADOUT_T1);
        apply(
            &mut fleet,
            &mut context,
            r#"{"timestamp":"2024-03-01T10:01:00Z","event":"Docked","StarSystem":"Shinrarta Dezhra","StationName":"Jameson Memorial","MarketID":128666762}"#,
        );
        let applied = apply(
            &mut fleet,
            &mut context,
            r#"{"timestamp":"2024-03-01T10:02:00Z","event":"ShipyardSwap","ShipType":"sidewinder","ShipID":1,"StoreOldShip":"Krait_MkII","StoreShipID":5,"MarketID":128666762}"#,
        );

        assert_eq!(applied.refresh, Some(RefreshRequest::Immediate));
        assert_eq!(fleet.current_ship_id(), Some(LocalId(1)));
        let stored = fleet.ship(LocalId(5)).unwrap();
        let location = stored.location.as_ref().unwrap();
        assert_eq!(location.station.as_deref(), Some("Jameson Memorial"));
        assert_eq!(location.market_id, Some(128666762));
        assert_eq!(stored.distance, Some(0.0));
        assert!(fleet.current_ship().unwrap().location.is_none());
    }

    #[test]
    fn context_events_bypass_the_timestamp_gate() {
        let mut fleet = Fleet::default();
        let mut context = PlayerContext::default();
        apply(&mut fleet, &mut context, &loadout_at("2024-03-01T12:00:00Z"));
        let applied = apply(
            &mut fleet,
            &mut context,
            r#"{"timestamp":"2024-03-01T10:00:00Z","event":"JoinACrew","Captain":"Bob"}"#,
        );
        assert_eq!(applied.status, ApplyStatus::ContextOnly);
        assert_eq!(context.vehicle, Vehicle::Multicrew);
    }

    #[test]
    fn multicrew_bounty_marks_most_valuable_ship() {
        let mut fleet = Fleet::default();
        let mut cheap = Ship::new(LocalId(1), "SideWinder");
        cheap.value = 30_000;
        fleet.add_ship(cheap);
        let mut pricey = Ship::new(LocalId(2), "Anaconda");
        pricey.value = 150_000_000;
        fleet.add_ship(pricey);
        fleet.set_current_ship(LocalId(1), None);

        let mut context = PlayerContext::default();
        apply(
            &mut fleet,
            &mut context,
            r#"{"timestamp":"2024-03-01T10:00:00Z","event":"JoinACrew","Captain":"Bob"}"#,
        );
        let bounty = r#"{"timestamp":"2024-03-01T10:01:00Z","event":"CommitCrime","CrimeType":"murder","Faction":"Mother Gaia","Victim":"Alice","Bounty":5000}"#;
        apply(&mut fleet, &mut context, bounty);
        assert!(fleet.ship(LocalId(2)).unwrap().hot);
        assert!(!fleet.ship(LocalId(1)).unwrap().hot);

        apply(
            &mut fleet,
            &mut context,
            r#"{"timestamp":"2024-03-01T10:02:00Z","event":"QuitACrew","Captain":"Bob"}"#,
        );
        apply(&mut fleet, &mut context, &bounty.replace("10:01:00", "10:03:00"));
        assert!(fleet.ship(LocalId(1)).unwrap().hot);
    }

    #[test]
    fn reboot_sets_named_slots_to_one_percent() {
        let mut fleet = Fleet::default();
        let mut context = PlayerContext::default();
        apply(&mut fleet, &mut context, LOADOUT_T1);
        let applied = apply(
            &mut fleet,
            &mut context,
            r#"{"timestamp":"2024-03-01T10:05:00Z","event":"RebootRepair","Modules":["FrameShiftDrive","MediumHardpoint1","Slot09_Size1"]}"#,
        );

        assert_eq!(applied.affected_modules.len(), 2);
        let ship = fleet.current_ship().unwrap();
        assert_eq!(ship.core.frame_shift_drive.as_ref().unwrap().health, 1.0);
        assert_eq!(ship.module_in("MediumHardpoint1").unwrap().health, 1.0);
        assert_eq!(ship.module_in("FuelTank").unwrap().health, 100.0);
    }

    #[test]
    fn full_repair_restores_hull_and_partial_asks_for_refresh() {
        let mut fleet = Fleet::default();
        let mut context = PlayerContext::default();
        apply(&mut fleet, &mut context, LOADOUT_T1);

        let partial = apply(
            &mut fleet,
            &mut context,
            r#"{"timestamp":"2024-03-01T10:05:00Z","event":"Repair","Item":"int_hyperdrive_size5_class5","Cost":100}"#,
        );
        assert_eq!(partial.status, ApplyStatus::Unchanged);
        assert_eq!(partial.refresh, Some(RefreshRequest::Immediate));

        apply(
            &mut fleet,
            &mut context,
            r#"{"timestamp":"2024-03-01T10:06:00Z","event":"RepairAll","Cost":1200}"#,
        );
        assert_eq!(fleet.current_ship().unwrap().health, 100.0);
    }

    #[test]
    fn refuel_reports_full_tank() {
        let mut fleet = Fleet::default();
        let mut context = PlayerContext::default();
        apply(&mut fleet, &mut context, LOADOUT_T1);
        let applied = apply(
            &mut fleet,
            &mut context,
            r#"{"timestamp":"2024-03-01T10:05:00Z","event":"RefuelAll","Cost":100,"Amount":4.5}"#,
        );
        assert_eq!(applied.full_tank, Some(true));
        assert_eq!(fleet.current_ship().unwrap().fuel_in_tanks, Some(32.0));
    }

    #[test]
    fn module_swap_twice_restores_and_matches_journal() {
        let mut fleet = Fleet::default();
        let mut context = PlayerContext::default();
        apply(&mut fleet, &mut context, LOADOUT_T1);
        let before = fleet.current_ship().unwrap().clone();

        apply(
            &mut fleet,
            &mut context,
            r#"{"timestamp":"2024-03-01T10:05:00Z","event":"ModuleSwap","FromSlot":"Slot01_Size6","ToSlot":"Slot02_Size6","FromItem":"int_cargorack_size5_class1","ToItem":"Null","Ship":"krait_mkii","ShipID":5}"#,
        );
        let ship = fleet.current_ship().unwrap();
        assert!(ship.module_in("Slot01_Size6").is_none());
        assert!(ship.module_in("Slot02_Size6").unwrap().is_cargo_rack());

        apply(
            &mut fleet,
            &mut context,
            r#"{"timestamp":"2024-03-01T10:06:00Z","event":"ModuleSwap","FromSlot":"Slot02_Size6","ToSlot":"Slot01_Size6","FromItem":"int_cargorack_size5_class1","ToItem":"Null","Ship":"krait_mkii","ShipID":5}"#,
        );
        let ship = fleet.current_ship().unwrap();
        assert_eq!(ship.module_in("Slot01_Size6"), before.module_in("Slot01_Size6"));
        assert_eq!(ship.cargo_capacity(), 32);
    }

    #[test]
    fn stored_ships_prunes_and_places() {
        let mut fleet = Fleet::default();
        let mut context = PlayerContext::default();
        apply(&mut fleet, &mut context, LOADOUT_T1);
        fleet.add_ship(Ship::new(LocalId(9), "Type9"));

        apply(
            &mut fleet,
            &mut context,
            r#"{"timestamp":"2024-03-01T10:05:00Z","event":"StoredShips","StationName":"Jameson Memorial","MarketID":128666762,"StarSystem":"Shinrarta Dezhra","ShipsHere":[{"ShipID":1,"ShipType":"SideWinder","Name":"***","Value":30000,"Hot":false}],"ShipsRemote":[{"ShipID":2,"ShipType":"Anaconda","StarSystem":"Sol","ShipMarketID":128016640,"TransferPrice":100000,"TransferTime":3600,"Value":150000000,"Hot":true}]}"#,
        );

        assert!(fleet.ship(LocalId(9)).is_none());
        assert!(fleet.ship(LocalId(5)).is_some());
        let here = fleet.ship(LocalId(1)).unwrap();
        assert_eq!(here.name, None);
        assert_eq!(here.distance, Some(0.0));
        let remote = fleet.ship(LocalId(2)).unwrap();
        assert!(remote.hot);
        assert_eq!(remote.location.as_ref().unwrap().system.as_deref(), Some("Sol"));
        assert_eq!(remote.transfer_time, Some(3600));
    }

    #[test]
    fn carrier_jump_moves_known_carrier() {
        let mut fleet = Fleet::default();
        let mut context = PlayerContext::default();
        apply(
            &mut fleet,
            &mut context,
            r#"{"timestamp":"2024-03-01T10:00:00Z","event":"CarrierStats","CarrierID":3700000000,"Callsign":"K7Q-1HT","Name":"HOME","DockingAccess":"all","AllowNotorious":false,"FuelLevel":500,"SpaceUsage":{"TotalCapacity":25000,"FreeSpace":20000},"Finance":{"CarrierBalance":1000000,"ReserveBalance":10000}}"#,
        );
        apply(
            &mut fleet,
            &mut context,
            r#"{"timestamp":"2024-03-01T10:01:00Z","event":"CarrierJumpRequest","CarrierID":3700000000,"SystemName":"Sol"}"#,
        );
        assert_eq!(fleet.carrier().unwrap().next_system.as_deref(), Some("Sol"));

        apply(
            &mut fleet,
            &mut context,
            r#"{"timestamp":"2024-03-01T10:16:00Z","event":"CarrierJump","StarSystem":"Sol","StarPos":[0,0,0],"StationName":"K7Q-1HT","MarketID":3700000000,"Docked":true}"#,
        );
        let carrier = fleet.carrier().unwrap();
        assert_eq!(carrier.current_system.as_deref(), Some("Sol"));
        assert_eq!(carrier.next_system, None);
        assert_eq!(context.system.as_deref(), Some("Sol"));
    }

    #[test]
    fn paid_bounty_clears_the_named_ship() {
        let mut fleet = Fleet::default();
        let mut context = PlayerContext::default();
        apply(&mut fleet, &mut context, LOADOUT_T1);
        let mut wanted = Ship::new(LocalId(9), "Anaconda");
        wanted.hot = true;
        fleet.add_ship(wanted);
        if let Some(current) = fleet.current_ship_mut() {
            current.hot = true;
        }

        apply(
            &mut fleet,
            &mut context,
            r#"{"timestamp":"2024-03-01T10:05:00Z","event":"PayBounties","Amount":1000,"ShipID":9,"BrokerPercentage":25.0}"#,
        );
        assert!(!fleet.ship(LocalId(9)).unwrap().hot);
        assert!(fleet.current_ship().unwrap().hot);
    }

    #[test]
    fn module_store_installs_the_replacement() {
        let mut fleet = Fleet::default();
        let mut context = PlayerContext::default();
        apply(&mut fleet, &mut context, LOADOUT_T1);
        apply(
            &mut fleet,
            &mut context,
            r#"{"timestamp":"2024-03-01T10:05:00Z","event":"ModuleStore","MarketID":128666762,"Slot":"FrameShiftDrive","StoredItem":"$int_hyperdrive_size5_class5_name;","ReplacementItem":"$int_hyperdrive_size5_class1_name;","Ship":"krait_mkii","ShipID":5,"Hot":false,"Cost":0}"#,
        );

        let drive = fleet.current_ship().unwrap().module_in("FrameShiftDrive").unwrap();
        assert_eq!(drive.canonical_name(), "int_hyperdrive_size5_class1");
        assert_eq!(drive.class, 5);
    }

    #[test]
    fn sold_module_leaves_an_empty_slot_of_the_same_size() {
        let mut fleet = Fleet::default();
        let mut context = PlayerContext::default();
        apply(&mut fleet, &mut context, LOADOUT_T1);
        let compartments = fleet.current_ship().unwrap().compartments.len();

        apply(
            &mut fleet,
            &mut context,
            r#"{"timestamp":"2024-03-01T10:05:00Z","event":"ModuleSell","MarketID":128666762,"Slot":"Slot01_Size6","SellItem":"$int_cargorack_size5_class1_name;","SellPrice":100000,"Ship":"krait_mkii","ShipID":5}"#,
        );

        let ship = fleet.current_ship().unwrap();
        assert_eq!(ship.compartments.len(), compartments);
        let slot = ship
            .compartments
            .iter()
            .find(|compartment| compartment.name == "Slot01_Size6")
            .unwrap();
        assert_eq!(slot.size, 6);
        assert!(slot.module.is_none());
        assert_eq!(ship.cargo_capacity(), 0);
    }

    #[test]
    fn retrieved_module_is_fitted() {
        let mut fleet = Fleet::default();
        let mut context = PlayerContext::default();
        apply(&mut fleet, &mut context, LOADOUT_T1);
        apply(
            &mut fleet,
            &mut context,
            r#"{"timestamp":"2024-03-01T10:05:00Z","event":"ModuleRetrieve","MarketID":128666762,"Slot":"Slot02_Size6","RetrievedItem":"$int_cargorack_size6_class1_name;","Ship":"krait_mkii","ShipID":5,"Hot":false,"Cost":0}"#,
        );

        let retrieved = fleet.current_ship().unwrap().module_in("Slot02_Size6").unwrap();
        assert!(retrieved.is_cargo_rack());
        assert_eq!(retrieved.class, 6);
    }

    #[test]
    fn mass_store_empties_every_listed_slot() {
        let mut fleet = Fleet::default();
        let mut context = PlayerContext::default();
        apply(&mut fleet, &mut context, LOADOUT_T1);
        apply(
            &mut fleet,
            &mut context,
            r#"{"timestamp":"2024-03-01T10:05:00Z","event":"MassModuleStore","MarketID":128666762,"Ship":"krait_mkii","ShipID":5,"Items":[{"Slot":"MediumHardpoint1","Name":"$hpt_pulselaser_gimbal_medium_name;","Hot":false},{"Slot":"Slot01_Size6","Name":"$int_cargorack_size5_class1_name;","Hot":false}]}"#,
        );

        let ship = fleet.current_ship().unwrap();
        assert!(ship.module_in("MediumHardpoint1").is_none());
        assert!(ship.module_in("Slot01_Size6").is_none());
        assert!(ship.module_in("TinyHardpoint1").is_some());
        assert_eq!(ship.hardpoints.len(), 2);
    }

    #[test]
    fn module_info_sets_power_order_and_fills_core_slots() {
        let mut fleet = Fleet::default();
        let mut context = PlayerContext::default();
        apply(&mut fleet, &mut context, LOADOUT_T1);
        apply(
            &mut fleet,
            &mut context,
            r#"{"timestamp":"2024-03-01T10:05:00Z","event":"ModuleInfo","Modules":[{"Slot":"FrameShiftDrive","Item":"int_hyperdrive_size5_class5","Power":0.45,"Priority":0},{"Slot":"PowerPlant","Item":"int_powerplant_size7_class5","Power":0.0,"Priority":1},{"Slot":"Slot05_Size3","Item":"int_shieldgenerator_size3_class5","Power":2.1,"Priority":2}]}"#,
        );

        let ship = fleet.current_ship().unwrap();
        let drive = ship.module_in("FrameShiftDrive").unwrap();
        assert_eq!(drive.priority, Some(1));
        assert_eq!(drive.position, Some(1));
        assert_eq!(drive.power, Some(0.45));
        let plant = ship.module_in("PowerPlant").unwrap();
        assert_eq!(plant.class, 7);
        assert_eq!(plant.priority, Some(2));
        assert_eq!(plant.position, Some(2));
        assert!(ship.module_in("Slot05_Size3").is_none());
    }

    #[test]
    fn load_game_keeps_real_names_and_ignores_other_vehicles() {
        let mut fleet = Fleet::default();
        let mut context = PlayerContext::default();
        apply(&mut fleet, &mut context, LOADOUT_T1);
        apply(
            &mut fleet,
            &mut context,
            r#"{"timestamp":"2024-03-01T10:01:00Z","event":"LoadGame","Commander":"Jameson","Ship":"Krait_MkII","ShipID":5,"ShipName":"***","ShipIdent":"KR-55","FuelLevel":12.5,"Credits":1000}"#,
        );
        let ship = fleet.current_ship().unwrap();
        assert_eq!(ship.name.as_deref(), Some("Dusk"));
        assert_eq!(ship.ident.as_deref(), Some("KR-55"));
        assert_eq!(ship.fuel_in_tanks, Some(12.5));

        let vehicles = ["independent_fighter", "testbuggy", "ExplorationSuit_Class1", "adder_taxi"];
        for (minute, vehicle) in (2..).zip(vehicles) {
            let line = format!(
                r#"{{"timestamp":"2024-03-01T10:{minute:02}:00Z","event":"LoadGame","Commander":"Jameson","Ship":"{vehicle}","ShipID":99,"Credits":1000}}"#
            );
            let applied = apply(&mut fleet, &mut context, &line);
            assert_eq!(applied.status, ApplyStatus::Unchanged, "{vehicle}");
        }
        assert!(fleet.ship(LocalId(99)).is_none());
        assert_eq!(fleet.current_ship_id(), Some(LocalId(5)));
    }

    #[test]
    fn renaming_drops_redacted_names() {
        let mut fleet = Fleet::default();
        let mut context = PlayerContext::default();
        apply(&mut fleet, &mut context, LOADOUT_T1);
        apply(
            &mut fleet,
            &mut context,
            r#"{"timestamp":"2024-03-01T10:05:00Z","event":"SetUserShipName","Ship":"krait_mkii","ShipID":5,"UserShipName":"Nightfall","UserShipId":"***"}"#,
        );

        let ship = fleet.current_ship().unwrap();
        assert_eq!(ship.name.as_deref(), Some("Nightfall"));
        assert_eq!(ship.ident, None);
    }

    #[test]
    fn selling_a_ship_removes_it() {
        let mut fleet = Fleet::default();
        let mut context = PlayerContext::default();
        apply(&mut fleet, &mut context, LOADOUT_T1);
        fleet.add_ship(Ship::new(LocalId(9), "Type9"));

        let sell = r#"{"timestamp":"2024-03-01T10:05:00Z","event":"ShipyardSell","ShipType":"type9","SellShipID":9,"ShipPrice":60000000,"MarketID":128666762}"#;
        let applied = apply(&mut fleet, &mut context, sell);
        assert_eq!(applied.status, ApplyStatus::Applied);
        assert!(fleet.ship(LocalId(9)).is_none());
        assert_eq!(fleet.ships().len(), 1);

        let again = apply(&mut fleet, &mut context, &sell.replace("10:05:00", "10:06:00"));
        assert_eq!(again.status, ApplyStatus::Unchanged);
    }

    #[test]
    fn stored_modules_replace_the_previous_list() {
        let mut fleet = Fleet::default();
        let mut context = PlayerContext::default();
        apply(
            &mut fleet,
            &mut context,
            r#"{"timestamp":"2024-03-01T10:00:00Z","event":"StoredModules","MarketID":128666762,"StationName":"Jameson Memorial","StarSystem":"Shinrarta Dezhra","Items":[{"Name":"$int_shieldgenerator_size3_class5_name;","StorageSlot":7,"StarSystem":"Sol","MarketID":128016640,"TransferCost":1000,"TransferTime":600,"BuyPrice":500000,"Hot":false},{"Name":"$hpt_pulselaser_gimbal_medium_name;","StorageSlot":2,"BuyPrice":35000,"Hot":false}]}"#,
        );
        let slots: Vec<u32> = fleet.stored_modules().iter().map(|item| item.storage_slot).collect();
        assert_eq!(slots, vec![2, 7]);

        apply(
            &mut fleet,
            &mut context,
            r#"{"timestamp":"2024-03-01T10:05:00Z","event":"StoredModules","MarketID":128666762,"StationName":"Jameson Memorial","StarSystem":"Shinrarta Dezhra","Items":[{"Name":"$int_cargorack_size4_class1_name;","StorageSlot":4,"BuyPrice":34000,"Hot":true}]}"#,
        );
        let stored = fleet.stored_modules();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].storage_slot, 4);
        assert!(stored[0].module.hot);
        assert!(stored[0].module.is_cargo_rack());
    }

    #[test]
    fn fuel_scoop_reports_the_scooped_total() {
        let mut fleet = Fleet::default();
        let mut context = PlayerContext::default();
        apply(&mut fleet, &mut context, LOADOUT_T1);

        let partial = apply(
            &mut fleet,
            &mut context,
            r#"{"timestamp":"2024-03-01T10:05:00Z","event":"FuelScoop","Scooped":5.0,"Total":20.0}"#,
        );
        assert_eq!(partial.full_tank, Some(false));
        assert_eq!(fleet.current_ship().unwrap().fuel_in_tanks, Some(20.0));

        let full = apply(
            &mut fleet,
            &mut context,
            r#"{"timestamp":"2024-03-01T10:06:00Z","event":"FuelScoop","Scooped":12.0,"Total":32.0}"#,
        );
        assert_eq!(full.full_tank, Some(true));
    }

    #[test]
    fn arrival_recomputes_stored_ship_distances() {
        let mut fleet = Fleet::default();
        let mut context = PlayerContext::default();
        apply(&mut fleet, &mut context, LOADOUT_T1);
        let mut parked = Ship::new(LocalId(2), "Anaconda");
        parked.location = Some(ShipLocation {
            system: Some("Sol".to_string()),
            station: Some("Abraham Lincoln".to_string()),
            market_id: Some(128016640),
            coords: Some(crate::models::Coordinates::new(0.0, 0.0, 0.0)),
        });
        fleet.add_ship(parked);

        apply(
            &mut fleet,
            &mut context,
            r#"{"timestamp":"2024-03-01T10:05:00Z","event":"Location","StarSystem":"Nearby","StarPos":[3.0,4.0,0.0],"Docked":false}"#,
        );
        assert_eq!(fleet.ship(LocalId(2)).unwrap().distance, Some(5.0));
        assert_eq!(fleet.current_ship().unwrap().distance, None);

        apply(
            &mut fleet,
            &mut context,
            r#"{"timestamp":"2024-03-01T10:10:00Z","event":"FSDJump","StarSystem":"Further","StarPos":[0.0,0.0,10.0],"JumpDist":11.2,"FuelUsed":2.5,"FuelLevel":29.5}"#,
        );
        assert_eq!(fleet.ship(LocalId(2)).unwrap().distance, Some(10.0));
        assert_eq!(fleet.current_ship().unwrap().fuel_in_tanks, Some(29.5));
        assert_eq!(context.system.as_deref(), Some("Further"));
    }
}
