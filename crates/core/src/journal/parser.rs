//! Table-driven translation of journal records into typed events.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde_json::{Map, Value};

use super::fields::Fields;
use super::ParseError;
use crate::events::*;
use crate::models::catalog::{ECONOMIES, MATERIALS, POWERS, SUPERPOWERS};
use crate::models::{
    Coordinates, Engineering, Faction, Modifier, Module, ShipLocation, StarSystem,
    StoredModule,
};

type ParseFn = fn(&Fields<'_>) -> Result<Option<EventKind>, ParseError>;

static PARSERS: Lazy<HashMap<&'static str, ParseFn>> = Lazy::new(|| {
    let table: [(&'static str, ParseFn); 40] = [
        ("LoadGame", load_game),
        ("Location", location),
        ("FSDJump", fsd_jump),
        ("Docked", docked),
        ("Undocked", undocked),
        ("JoinACrew", join_crew),
        ("QuitACrew", quit_crew),
        ("ShipyardBuy", shipyard_buy),
        ("ShipyardNew", shipyard_new),
        ("ShipyardSwap", shipyard_swap),
        ("SetUserShipName", set_user_ship_name),
        ("ShipyardSell", shipyard_sell),
        ("SellShipOnRebuy", sell_ship_on_rebuy),
        ("Loadout", loadout),
        ("StoredShips", stored_ships),
        ("StoredModules", stored_modules),
        ("RebootRepair", reboot_repair),
        ("RefuelAll", refuel_all),
        ("RefuelPartial", refuel_partial),
        ("FuelScoop", fuel_scoop),
        ("AfmuRepairs", afmu_repairs),
        ("Repair", repair),
        ("RepairAll", repair_all),
        ("RepairDrone", repair_drone),
        ("RestockVehicle", restock_vehicle),
        ("ModuleBuy", module_buy),
        ("ModuleRetrieve", module_retrieve),
        ("ModuleSell", module_sell),
        ("ModuleSellRemote", module_sell_remote),
        ("ModuleStore", module_store),
        ("MassModuleStore", mass_module_store),
        ("ModuleSwap", module_swap),
        ("FetchRemoteModule", fetch_remote_module),
        ("ModuleInfo", module_info),
        ("CommitCrime", commit_crime),
        ("PayBounties", pay_bounties),
        ("MaterialCollected", material_collected),
        ("CarrierStats", carrier_stats),
        ("CarrierJumpRequest", carrier_jump_request),
        ("CarrierJump", carrier_jump),
    ];
    table.into_iter().collect()
});

/// Whether a parser exists for `tag`.
pub fn is_known(tag: &str) -> bool {
    PARSERS.contains_key(tag)
}

/// Parse one journal line. Unknown event tags yield `Ok(None)`.
pub fn parse_line(line: &str) -> Result<Option<Event>, ParseError> {
    let record: Value = serde_json::from_str(line)?;
    parse_record(&record)
}

/// Parse a decoded record, reading its `event` tag.
pub fn parse_record(record: &Value) -> Result<Option<Event>, ParseError> {
    let map = record.as_object().ok_or(ParseError::NotAnObject)?;
    let tag = map
        .get("event")
        .and_then(Value::as_str)
        .ok_or(ParseError::MissingEventTag)?;
    parse_tagged(tag, map)
}

/// Parse a record whose event tag the caller already extracted.
pub fn parse_tagged(tag: &str, map: &Map<String, Value>) -> Result<Option<Event>, ParseError> {
    let Some(parser) = PARSERS.get(tag) else {
        return Ok(None);
    };
    let fields = Fields::new(tag, map);
    let timestamp = fields.timestamp()?;
    Ok(parser(&fields)?.map(|kind| Event::new(timestamp, kind)))
}

fn coordinates(fields: &Fields<'_>, key: &str) -> Result<Option<Coordinates>, ParseError> {
    let values = fields.array(key)?;
    if values.is_empty() {
        return Ok(None);
    }
    match values {
        [x, y, z] => match (x.as_f64(), y.as_f64(), z.as_f64()) {
            (Some(x), Some(y), Some(z)) => Ok(Some(Coordinates::new(x, y, z))),
            _ => Err(ParseError::InvalidField {
                event: fields.event().to_string(),
                field: key.to_string(),
                expected: "three numbers",
            }),
        },
        _ => Err(ParseError::InvalidField {
            event: fields.event().to_string(),
            field: key.to_string(),
            expected: "three numbers",
        }),
    }
}

// `SystemFaction` was a plain string before 3.3 and an object after.
fn controlling_faction(fields: &Fields<'_>) -> Result<Option<String>, ParseError> {
    if let Some(Value::Object(map)) = fields.get("SystemFaction") {
        return Fields::new(fields.event(), map).opt_string("Name");
    }
    fields.opt_string("SystemFaction")
}

fn star_system(fields: &Fields<'_>) -> Result<StarSystem, ParseError> {
    let mut system = StarSystem::named(fields.string("StarSystem")?);
    system.address = fields.opt_u64("SystemAddress")?;
    system.coords = coordinates(fields, "StarPos")?;
    system.allegiance = fields
        .opt_str("SystemAllegiance")?
        .filter(|raw| !raw.is_empty())
        .map(|raw| SUPERPOWERS.canonical(raw));
    for key in ["SystemEconomy", "SystemSecondEconomy"] {
        if let Some(raw) = fields.opt_str(key)? {
            let economy = ECONOMIES.canonical(raw);
            if !economy.is_none() {
                system.economies.push(economy);
            }
        }
    }
    system.controlling_faction = controlling_faction(fields)?;
    for faction in fields.objects("Factions")? {
        system.factions.push(Faction {
            name: faction.string("Name")?,
            allegiance: SUPERPOWERS.canonical(faction.opt_str("Allegiance")?.unwrap_or("None")),
            influence: faction.f64_or("Influence", 0.0)?,
            state: faction.opt_string("FactionState")?,
        });
    }
    system.controlling_power = fields
        .opt_str("ControllingPower")?
        .map(|raw| POWERS.canonical(raw));
    system.powers = fields
        .strings("Powers")?
        .iter()
        .map(|raw| POWERS.canonical(raw))
        .collect();
    system.powerplay_state = fields.opt_string("PowerplayState")?;
    system.population = fields.i64_or_zero("Population")?;
    Ok(system)
}

fn load_game(fields: &Fields<'_>) -> Result<Option<EventKind>, ParseError> {
    Ok(Some(EventKind::CommanderContinued(CommanderContinued {
        commander: fields.string("Commander")?,
        ship_id: fields.opt_local_id("ShipID")?,
        ship_edname: fields.opt_edname("Ship")?.unwrap_or_default(),
        ship_name: fields.opt_string("ShipName")?,
        ship_ident: fields.opt_string("ShipIdent")?,
        credits: fields.i64_or_zero("Credits")?,
        fuel_level: fields.opt_f64("FuelLevel")?,
    })))
}

fn location(fields: &Fields<'_>) -> Result<Option<EventKind>, ParseError> {
    Ok(Some(EventKind::Location(Location {
        system: star_system(fields)?,
        station: fields.opt_string("StationName")?,
        market_id: fields.opt_u64("MarketID")?,
        docked: fields.flag("Docked")?,
        multicrew: fields.flag("Multicrew")?,
        taxi: fields.flag("Taxi")?,
    })))
}

fn fsd_jump(fields: &Fields<'_>) -> Result<Option<EventKind>, ParseError> {
    let boost_used = fields
        .opt_u64("BoostUsed")?
        .and_then(|boost| u8::try_from(boost).ok());
    Ok(Some(EventKind::Jumped(Jumped {
        system: star_system(fields)?,
        distance: fields.f64_or("JumpDist", 0.0)?,
        fuel_used: fields.f64_or("FuelUsed", 0.0)?,
        fuel_level: fields.f64_or("FuelLevel", 0.0)?,
        boost_used,
        multicrew: fields.flag("Multicrew")?,
        taxi: fields.flag("Taxi")?,
    })))
}

fn docked(fields: &Fields<'_>) -> Result<Option<EventKind>, ParseError> {
    // Before 3.0 a single `StationEconomy` was reported.
    let mut economies = Vec::new();
    for economy in fields.objects("StationEconomies")? {
        economies.push(ECONOMIES.canonical(economy.str("Name")?));
    }
    if economies.is_empty() {
        if let Some(raw) = fields.opt_str("StationEconomy")? {
            economies.push(ECONOMIES.canonical(raw));
        }
    }
    Ok(Some(EventKind::Docked(Docked {
        system: fields.string("StarSystem")?,
        station: fields.string("StationName")?,
        station_type: fields.opt_string("StationType")?,
        market_id: fields.opt_u64("MarketID")?,
        economies,
        multicrew: fields.flag("Multicrew")?,
        taxi: fields.flag("Taxi")?,
    })))
}

fn undocked(fields: &Fields<'_>) -> Result<Option<EventKind>, ParseError> {
    Ok(Some(EventKind::Undocked(Undocked {
        station: fields.opt_string("StationName")?.unwrap_or_default(),
        market_id: fields.opt_u64("MarketID")?,
    })))
}

fn join_crew(fields: &Fields<'_>) -> Result<Option<EventKind>, ParseError> {
    Ok(Some(EventKind::CrewJoined(CrewJoined {
        captain: fields.string("Captain")?,
    })))
}

fn quit_crew(fields: &Fields<'_>) -> Result<Option<EventKind>, ParseError> {
    Ok(Some(EventKind::CrewLeft(CrewLeft {
        captain: fields.string("Captain")?,
    })))
}

fn shipyard_buy(fields: &Fields<'_>) -> Result<Option<EventKind>, ParseError> {
    Ok(Some(EventKind::ShipPurchased(ShipPurchased {
        ship_edname: fields.edname("ShipType")?,
        price: fields.i64_or_zero("ShipPrice")?,
        market_id: fields.opt_u64("MarketID")?,
        stored_ship_id: fields.opt_local_id("StoreShipID")?,
        stored_ship_edname: fields.opt_edname("StoreOldShip")?,
        sold_ship_id: fields.opt_local_id("SellShipID")?,
        sold_ship_edname: fields.opt_edname("SellOldShip")?,
        sold_price: fields.opt_i64("SellPrice")?,
    })))
}

fn shipyard_new(fields: &Fields<'_>) -> Result<Option<EventKind>, ParseError> {
    Ok(Some(EventKind::ShipDelivered(ShipDelivered {
        ship_id: fields.local_id("NewShipID")?,
        ship_edname: fields.edname("ShipType")?,
    })))
}

fn shipyard_swap(fields: &Fields<'_>) -> Result<Option<EventKind>, ParseError> {
    Ok(Some(EventKind::ShipSwapped(ShipSwapped {
        ship_id: fields.local_id("ShipID")?,
        ship_edname: fields.edname("ShipType")?,
        market_id: fields.opt_u64("MarketID")?,
        stored_ship_id: fields.opt_local_id("StoreShipID")?,
        stored_ship_edname: fields.opt_edname("StoreOldShip")?,
        sold_ship_id: fields.opt_local_id("SellShipID")?,
        sold_ship_edname: fields.opt_edname("SellOldShip")?,
    })))
}

fn set_user_ship_name(fields: &Fields<'_>) -> Result<Option<EventKind>, ParseError> {
    Ok(Some(EventKind::ShipRenamed(ShipRenamed {
        ship_id: fields.local_id("ShipID")?,
        ship_edname: fields.edname("Ship")?,
        name: fields.opt_string("UserShipName")?,
        ident: fields.opt_string("UserShipId")?,
    })))
}

fn ship_sold(fields: &Fields<'_>) -> Result<ShipSold, ParseError> {
    Ok(ShipSold {
        ship_id: fields.local_id("SellShipID")?,
        ship_edname: fields.edname("ShipType")?,
        price: fields.i64_or_zero("ShipPrice")?,
        system: fields.opt_string("System")?,
    })
}

fn shipyard_sell(fields: &Fields<'_>) -> Result<Option<EventKind>, ParseError> {
    Ok(Some(EventKind::ShipSold(ship_sold(fields)?)))
}

fn sell_ship_on_rebuy(fields: &Fields<'_>) -> Result<Option<EventKind>, ParseError> {
    Ok(Some(EventKind::ShipSoldOnRebuy(ship_sold(fields)?)))
}

fn engineering(fields: &Fields<'_>) -> Result<Engineering, ParseError> {
    let mut modifiers = Vec::new();
    for modifier in fields.objects("Modifiers")? {
        // String-valued modifiers carry no numbers to compare.
        let Some(value) = modifier.opt_f64("Value")? else {
            continue;
        };
        modifiers.push(Modifier {
            label: modifier.string("Label")?,
            value,
            original_value: modifier.f64_or("OriginalValue", value)?,
            less_is_good: modifier.flag("LessIsGood")?,
        });
    }
    let level = fields.opt_u64("Level")?.unwrap_or(0);
    Ok(Engineering {
        engineer: fields.opt_string("Engineer")?,
        blueprint: fields.string("BlueprintName")?,
        level: u8::try_from(level).unwrap_or(u8::MAX),
        quality: fields.f64_or("Quality", 0.0)?,
        experimental_effect: fields.opt_string("ExperimentalEffect")?,
        modifiers,
    })
}

fn priority(fields: &Fields<'_>) -> Result<Option<u8>, ParseError> {
    Ok(fields
        .opt_u64("Priority")?
        .and_then(|priority| priority.checked_add(1))
        .and_then(|priority| u8::try_from(priority).ok()))
}

fn loadout_slot(fields: &Fields<'_>) -> Result<LoadoutSlot, ParseError> {
    let mut module = Module::from_edname(fields.str("Item")?);
    module.enabled = fields.bool_or("On", true)?;
    module.priority = priority(fields)?;
    module.health = fields.f64_or("Health", 1.0)? * 100.0;
    module.value = fields.i64_or_zero("Value")?;
    module.engineering = fields
        .object("Engineering")?
        .map(|engineered| engineering(&engineered))
        .transpose()?;
    Ok(LoadoutSlot {
        slot: fields.string("Slot")?,
        module,
    })
}

fn loadout(fields: &Fields<'_>) -> Result<Option<EventKind>, ParseError> {
    let slots = fields
        .objects("Modules")?
        .iter()
        .map(loadout_slot)
        .collect::<Result<Vec<_>, _>>()?;
    let paintjob = slots
        .iter()
        .find(|entry| entry.slot.eq_ignore_ascii_case("PaintJob"))
        .map(|entry| entry.module.edname.clone());
    let capacity = fields.object("FuelCapacity")?;
    let fuel_main = capacity.map(|c| c.opt_f64("Main")).transpose()?.flatten();
    let fuel_reserve = capacity.map(|c| c.opt_f64("Reserve")).transpose()?.flatten();
    Ok(Some(EventKind::ShipLoadout(Box::new(ShipLoadout {
        ship_id: fields.local_id("ShipID")?,
        ship_edname: fields.edname("Ship")?,
        name: fields.opt_string("ShipName")?,
        ident: fields.opt_string("ShipIdent")?,
        hull_value: fields.i64_or_zero("HullValue")?,
        modules_value: fields.i64_or_zero("ModulesValue")?,
        rebuy: fields.i64_or_zero("Rebuy")?,
        hull_health: fields.f64_or("HullHealth", 1.0)? * 100.0,
        unladen_mass: fields.f64_or("UnladenMass", 0.0)?,
        cargo_capacity: fields.u32_or_zero("CargoCapacity")?,
        max_jump_range: fields.f64_or("MaxJumpRange", 0.0)?,
        fuel_main,
        fuel_reserve,
        hot: fields.flag("Hot")?,
        paintjob,
        slots,
        raw: fields.raw(),
    }))))
}

fn stored_ship(
    fields: &Fields<'_>,
    here: Option<&ShipLocation>,
) -> Result<StoredShip, ParseError> {
    let location = match here {
        Some(location) => location.clone(),
        None => ShipLocation {
            system: fields.opt_string("StarSystem")?,
            station: None,
            market_id: fields.opt_u64("ShipMarketID")?,
            coords: None,
        },
    };
    Ok(StoredShip {
        ship_id: fields.local_id("ShipID")?,
        ship_edname: fields.edname("ShipType")?,
        name: fields.opt_string("Name")?,
        value: fields.i64_or_zero("Value")?,
        hot: fields.flag("Hot")?,
        location,
        in_transit: fields.flag("InTransit")?,
        transfer_price: fields.opt_i64("TransferPrice")?,
        transfer_time: fields.opt_i64("TransferTime")?,
    })
}

fn stored_ships(fields: &Fields<'_>) -> Result<Option<EventKind>, ParseError> {
    let system = fields.string("StarSystem")?;
    let station = fields.string("StationName")?;
    let market_id = fields.opt_u64("MarketID")?;
    let here_location = ShipLocation {
        system: Some(system.clone()),
        station: Some(station.clone()),
        market_id,
        coords: None,
    };
    let here = fields
        .objects("ShipsHere")?
        .iter()
        .map(|ship| stored_ship(ship, Some(&here_location)))
        .collect::<Result<Vec<_>, _>>()?;
    let remote = fields
        .objects("ShipsRemote")?
        .iter()
        .map(|ship| stored_ship(ship, None))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Some(EventKind::StoredShips(StoredShips {
        system,
        station,
        market_id,
        here,
        remote,
    })))
}

fn stored_module(fields: &Fields<'_>) -> Result<StoredModule, ParseError> {
    let mut module = Module::from_edname(fields.str("Name")?);
    module.value = fields.i64_or_zero("BuyPrice")?;
    module.hot = fields.flag("Hot")?;
    if let Some(blueprint) = fields.opt_string("EngineerModifications")? {
        let level = fields.opt_u64("Level")?.unwrap_or(0);
        module.engineering = Some(Engineering {
            engineer: None,
            blueprint,
            level: u8::try_from(level).unwrap_or(u8::MAX),
            quality: fields.f64_or("Quality", 0.0)?,
            experimental_effect: None,
            modifiers: Vec::new(),
        });
    }
    let storage_slot = fields.opt_u64("StorageSlot")?.unwrap_or(0);
    Ok(StoredModule {
        storage_slot: u32::try_from(storage_slot).unwrap_or(u32::MAX),
        module,
        location: ShipLocation {
            system: fields.opt_string("StarSystem")?,
            station: None,
            market_id: fields.opt_u64("MarketID")?,
            coords: None,
        },
        in_transit: fields.flag("InTransit")?,
        transfer_cost: fields.opt_i64("TransferCost")?,
        transfer_time: fields.opt_i64("TransferTime")?,
    })
}

fn stored_modules(fields: &Fields<'_>) -> Result<Option<EventKind>, ParseError> {
    let items = fields
        .objects("Items")?
        .iter()
        .map(stored_module)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Some(EventKind::StoredModules(StoredModules {
        system: fields.opt_string("StarSystem")?.unwrap_or_default(),
        station: fields.opt_string("StationName")?.unwrap_or_default(),
        market_id: fields.opt_u64("MarketID")?,
        items,
    })))
}

fn reboot_repair(fields: &Fields<'_>) -> Result<Option<EventKind>, ParseError> {
    Ok(Some(EventKind::ShipRebooted(ShipRebooted {
        slots: fields.strings("Modules")?,
    })))
}

fn refuel_all(fields: &Fields<'_>) -> Result<Option<EventKind>, ParseError> {
    refuel_market(fields, RefuelSource::MarketFull)
}

fn refuel_partial(fields: &Fields<'_>) -> Result<Option<EventKind>, ParseError> {
    refuel_market(fields, RefuelSource::MarketPartial)
}

fn refuel_market(
    fields: &Fields<'_>,
    source: RefuelSource,
) -> Result<Option<EventKind>, ParseError> {
    Ok(Some(EventKind::ShipRefuelled(ShipRefuelled {
        source,
        amount: fields.f64_or("Amount", 0.0)?,
        price: fields.i64_or_zero("Cost")?,
        total: None,
    })))
}

fn fuel_scoop(fields: &Fields<'_>) -> Result<Option<EventKind>, ParseError> {
    Ok(Some(EventKind::ShipRefuelled(ShipRefuelled {
        source: RefuelSource::Scoop,
        amount: fields.f64_or("Scooped", 0.0)?,
        price: 0,
        total: fields.opt_f64("Total")?,
    })))
}

fn afmu_repairs(fields: &Fields<'_>) -> Result<Option<EventKind>, ParseError> {
    let module_edname = fields.edname("Module")?;
    Ok(Some(EventKind::ShipAfmuRepaired(ShipAfmuRepaired {
        module_edname,
        fully_repaired: fields.flag("FullyRepaired")?,
        health: fields.f64_or("Health", 1.0)? * 100.0,
    })))
}

fn repair(fields: &Fields<'_>) -> Result<Option<EventKind>, ParseError> {
    // Older records name a single `Item`; newer ones list `Items`.
    let mut items = fields.strings("Items")?;
    if let Some(item) = fields.opt_edname("Item")? {
        items.push(item);
    }
    Ok(Some(EventKind::ShipRepaired(ShipRepaired {
        items,
        price: fields.i64_or_zero("Cost")?,
    })))
}

fn repair_all(fields: &Fields<'_>) -> Result<Option<EventKind>, ParseError> {
    Ok(Some(EventKind::ShipRepaired(ShipRepaired {
        items: vec!["All".to_string()],
        price: fields.i64_or_zero("Cost")?,
    })))
}

fn repair_drone(fields: &Fields<'_>) -> Result<Option<EventKind>, ParseError> {
    Ok(Some(EventKind::ShipRepairDrone(ShipRepairDrone {
        hull_repaired: fields.f64_or("HullRepaired", 0.0)?,
        cockpit_repaired: fields.f64_or("CockpitRepaired", 0.0)?,
        corrosion_repaired: fields.f64_or("CorrosionRepaired", 0.0)?,
    })))
}

fn restock_vehicle(fields: &Fields<'_>) -> Result<Option<EventKind>, ParseError> {
    Ok(Some(EventKind::ShipRestocked(ShipRestocked {
        loadout: fields.opt_string("Loadout")?.unwrap_or_default(),
        cost: fields.i64_or_zero("Cost")?,
        count: fields.u32_or_zero("Count")?,
    })))
}

fn module_buy(fields: &Fields<'_>) -> Result<Option<EventKind>, ParseError> {
    let price = fields.i64_or_zero("BuyPrice")?;
    let mut module = Module::from_edname(fields.str("BuyItem")?);
    module.value = price;
    Ok(Some(EventKind::ModulePurchased(ModulePurchased {
        ship_id: fields.local_id("ShipID")?,
        ship_edname: fields.edname("Ship")?,
        slot: fields.string("Slot")?,
        module,
        price,
        sold_module: fields.opt_edname("SellItem")?,
        sold_price: fields.opt_i64("SellPrice")?,
        stored_module: fields.opt_edname("StoredItem")?,
    })))
}

fn module_retrieve(fields: &Fields<'_>) -> Result<Option<EventKind>, ParseError> {
    let mut module = Module::from_edname(fields.str("RetrievedItem")?);
    module.hot = fields.flag("Hot")?;
    if let Some(blueprint) = fields.opt_string("EngineerModifications")? {
        let level = fields.opt_u64("Level")?.unwrap_or(0);
        module.engineering = Some(Engineering {
            engineer: None,
            blueprint,
            level: u8::try_from(level).unwrap_or(u8::MAX),
            quality: fields.f64_or("Quality", 0.0)?,
            experimental_effect: None,
            modifiers: Vec::new(),
        });
    }
    Ok(Some(EventKind::ModuleRetrieved(ModuleRetrieved {
        ship_id: fields.local_id("ShipID")?,
        ship_edname: fields.edname("Ship")?,
        slot: fields.string("Slot")?,
        module,
        swapped_out: fields.opt_edname("SwapOutItem")?,
        cost: fields.i64_or_zero("Cost")?,
    })))
}

fn module_sell(fields: &Fields<'_>) -> Result<Option<EventKind>, ParseError> {
    Ok(Some(EventKind::ModuleSold(ModuleSold {
        ship_id: fields.local_id("ShipID")?,
        ship_edname: fields.edname("Ship")?,
        slot: fields.string("Slot")?,
        module_edname: fields.edname("SellItem")?,
        price: fields.i64_or_zero("SellPrice")?,
    })))
}

fn module_sell_remote(fields: &Fields<'_>) -> Result<Option<EventKind>, ParseError> {
    let storage_slot = fields.opt_u64("StorageSlot")?.unwrap_or(0);
    Ok(Some(EventKind::ModuleSoldFromStorage(ModuleSoldFromStorage {
        storage_slot: u32::try_from(storage_slot).unwrap_or(u32::MAX),
        module_edname: fields.edname("SellItem")?,
        price: fields.i64_or_zero("SellPrice")?,
    })))
}

fn module_store(fields: &Fields<'_>) -> Result<Option<EventKind>, ParseError> {
    Ok(Some(EventKind::ModuleStored(ModuleStored {
        ship_id: fields.local_id("ShipID")?,
        ship_edname: fields.edname("Ship")?,
        slot: fields.string("Slot")?,
        module_edname: fields.edname("StoredItem")?,
        replacement: fields
            .opt_edname("ReplacementItem")?
            .map(|edname| Module::from_edname(&edname)),
        cost: fields.i64_or_zero("Cost")?,
    })))
}

fn mass_module_store(fields: &Fields<'_>) -> Result<Option<EventKind>, ParseError> {
    let slots = fields
        .objects("Items")?
        .iter()
        .map(|item| item.string("Slot"))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Some(EventKind::ModulesStored(ModulesStored {
        ship_id: fields.local_id("ShipID")?,
        ship_edname: fields.edname("Ship")?,
        slots,
    })))
}

fn module_swap(fields: &Fields<'_>) -> Result<Option<EventKind>, ParseError> {
    Ok(Some(EventKind::ModuleSwapped(ModuleSwapped {
        ship_id: fields.local_id("ShipID")?,
        ship_edname: fields.edname("Ship")?,
        from_slot: fields.string("FromSlot")?,
        to_slot: fields.string("ToSlot")?,
        from_module: fields.edname("FromItem")?,
        to_module: fields.opt_edname("ToItem")?,
    })))
}

fn fetch_remote_module(fields: &Fields<'_>) -> Result<Option<EventKind>, ParseError> {
    let storage_slot = fields.opt_u64("StorageSlot")?.unwrap_or(0);
    Ok(Some(EventKind::ModuleTransferred(ModuleTransferred {
        storage_slot: u32::try_from(storage_slot).unwrap_or(u32::MAX),
        module_edname: fields.edname("StoredItem")?,
        transfer_cost: fields.i64_or_zero("TransferCost")?,
        transfer_time: fields.i64_or_zero("TransferTime")?,
        ship_id: fields.opt_local_id("ShipID")?,
    })))
}

fn module_info(fields: &Fields<'_>) -> Result<Option<EventKind>, ParseError> {
    let modules = fields
        .objects("Modules")?
        .iter()
        .map(|entry| {
            Ok(ModuleInfoEntry {
                slot: entry.string("Slot")?,
                module_edname: entry.edname("Item")?,
                power: entry.opt_f64("Power")?,
                priority: priority(entry)?,
            })
        })
        .collect::<Result<Vec<_>, ParseError>>()?;
    Ok(Some(EventKind::ModuleInfo(ModuleInfo { modules })))
}

fn commit_crime(fields: &Fields<'_>) -> Result<Option<EventKind>, ParseError> {
    // Fines do not make a ship wanted.
    let Some(bounty) = fields.opt_i64("Bounty")? else {
        return Ok(None);
    };
    Ok(Some(EventKind::BountyIncurred(BountyIncurred {
        crime: fields.string("CrimeType")?,
        faction: fields.opt_string("Faction")?.unwrap_or_default(),
        victim: fields.opt_string("Victim")?,
        bounty,
    })))
}

fn pay_bounties(fields: &Fields<'_>) -> Result<Option<EventKind>, ParseError> {
    Ok(Some(EventKind::BountyPaid(BountyPaid {
        amount: fields.i64_or_zero("Amount")?,
        faction: fields.opt_edname("Faction")?,
        ship_id: fields.opt_local_id("ShipID")?,
        broker_percentage: fields.opt_f64("BrokerPercentage")?,
    })))
}

fn material_collected(fields: &Fields<'_>) -> Result<Option<EventKind>, ParseError> {
    Ok(Some(EventKind::MaterialCollected(MaterialCollected {
        material: MATERIALS.canonical(fields.str("Name")?),
        category: fields.opt_string("Category")?.unwrap_or_default(),
        count: fields.u32_or_zero("Count")?,
    })))
}

fn carrier_stats(fields: &Fields<'_>) -> Result<Option<EventKind>, ParseError> {
    let usage = fields.object("SpaceUsage")?;
    let finance = fields.object("Finance")?;
    let total = usage.map(|u| u.u32_or_zero("TotalCapacity")).transpose()?.unwrap_or(0);
    let free = usage.map(|u| u.u32_or_zero("FreeSpace")).transpose()?.unwrap_or(0);
    Ok(Some(EventKind::CarrierStats(CarrierStats {
        carrier_id: fields.u64("CarrierID")?,
        callsign: fields.string("Callsign")?,
        name: fields.opt_string("Name")?.unwrap_or_default(),
        docking_access: fields.opt_string("DockingAccess")?.unwrap_or_default(),
        notorious_access: fields.flag("AllowNotorious")?,
        fuel: fields.u32_or_zero("FuelLevel")?,
        used_capacity: total.saturating_sub(free),
        free_capacity: free,
        bank_balance: finance
            .map(|f| f.i64_or_zero("CarrierBalance"))
            .transpose()?
            .unwrap_or(0),
        bank_reserved_balance: finance
            .map(|f| f.i64_or_zero("ReserveBalance"))
            .transpose()?
            .unwrap_or(0),
    })))
}

fn carrier_jump_request(fields: &Fields<'_>) -> Result<Option<EventKind>, ParseError> {
    Ok(Some(EventKind::CarrierJumpRequested(CarrierJumpRequested {
        carrier_id: fields.u64("CarrierID")?,
        system: fields.string("SystemName")?,
        system_address: fields.opt_u64("SystemAddress")?,
    })))
}

fn carrier_jump(fields: &Fields<'_>) -> Result<Option<EventKind>, ParseError> {
    Ok(Some(EventKind::CarrierJumped(CarrierJumped {
        system: star_system(fields)?,
        station: fields.opt_string("StationName")?,
        market_id: fields.opt_u64("MarketID")?,
        docked: fields.flag("Docked")?,
    })))
}
