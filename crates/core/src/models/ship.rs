//! Ships, their installed modules and derived performance figures.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use super::catalog::{self, CanonicalName, ShipDefinition, ROLES};
use super::location::{Coordinates, ShipLocation};
use super::module::{Grade, Module};
use super::slot::{Compartment, CoreSlot, Hardpoint, LaunchBay};

/// Session-scoped ship identifier assigned by the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocalId(pub u32);

impl fmt::Display for LocalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The ten core slots, each possibly empty.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CoreModules {
    pub armour: Option<Module>,
    pub power_plant: Option<Module>,
    pub main_engines: Option<Module>,
    pub frame_shift_drive: Option<Module>,
    pub life_support: Option<Module>,
    pub power_distributor: Option<Module>,
    pub radar: Option<Module>,
    pub fuel_tank: Option<Module>,
    pub cargo_hatch: Option<Module>,
    pub ship_cockpit: Option<Module>,
}

impl CoreModules {
    /// The module in `slot`, if fitted.
    pub fn get(&self, slot: CoreSlot) -> Option<&Module> {
        self.slot(slot).as_ref()
    }

    /// Mutable counterpart of [`CoreModules::get`].
    pub fn get_mut(&mut self, slot: CoreSlot) -> Option<&mut Module> {
        self.slot_mut(slot).as_mut()
    }

    /// Replace the module in `slot`, returning what was there.
    pub fn set(&mut self, slot: CoreSlot, module: Option<Module>) -> Option<Module> {
        std::mem::replace(self.slot_mut(slot), module)
    }

    /// The field backing `slot`.
    pub fn slot(&self, slot: CoreSlot) -> &Option<Module> {
        match slot {
            CoreSlot::Armour => &self.armour,
            CoreSlot::PowerPlant => &self.power_plant,
            CoreSlot::MainEngines => &self.main_engines,
            CoreSlot::FrameShiftDrive => &self.frame_shift_drive,
            CoreSlot::LifeSupport => &self.life_support,
            CoreSlot::PowerDistributor => &self.power_distributor,
            CoreSlot::Radar => &self.radar,
            CoreSlot::FuelTank => &self.fuel_tank,
            CoreSlot::CargoHatch => &self.cargo_hatch,
            CoreSlot::ShipCockpit => &self.ship_cockpit,
        }
    }

    /// Mutable field backing `slot`.
    pub fn slot_mut(&mut self, slot: CoreSlot) -> &mut Option<Module> {
        match slot {
            CoreSlot::Armour => &mut self.armour,
            CoreSlot::PowerPlant => &mut self.power_plant,
            CoreSlot::MainEngines => &mut self.main_engines,
            CoreSlot::FrameShiftDrive => &mut self.frame_shift_drive,
            CoreSlot::LifeSupport => &mut self.life_support,
            CoreSlot::PowerDistributor => &mut self.power_distributor,
            CoreSlot::Radar => &mut self.radar,
            CoreSlot::FuelTank => &mut self.fuel_tank,
            CoreSlot::CargoHatch => &mut self.cargo_hatch,
            CoreSlot::ShipCockpit => &mut self.ship_cockpit,
        }
    }
}

/// Which jump figure to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpKind {
    /// Range of the next jump with the fuel currently aboard.
    Next,
    /// Longest single jump with an optimal fuel load.
    Max,
    /// Total distance over consecutive jumps with current fuel.
    Total,
    /// Total distance over consecutive jumps with full tanks.
    Full,
}

/// Result of a jump computation.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct JumpDetail {
    /// Light years covered.
    pub distance: f64,
    /// Jumps made; zero for single-jump figures.
    pub jumps: u32,
}

/// Parameters of a frame shift drive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FsdParameters {
    /// Optimal mass in tonnes, engineered if applicable.
    pub optimal_mass: f64,
    /// Fuel limit of a single jump in tonnes.
    pub max_fuel_per_jump: f64,
    /// Rating constant of the fuel formula.
    pub linear_constant: f64,
    /// Class exponent of the fuel formula.
    pub power_constant: f64,
}

const GRADES: [Grade; 5] = [Grade::E, Grade::D, Grade::C, Grade::B, Grade::A];

// Rows are FSD class 2..=7, columns follow GRADES.
const OPTIMAL_MASS: [[f64; 5]; 6] = [
    [48.0, 54.0, 60.0, 75.0, 90.0],
    [80.0, 90.0, 100.0, 125.0, 150.0],
    [280.0, 315.0, 350.0, 438.0, 525.0],
    [560.0, 630.0, 700.0, 875.0, 1050.0],
    [960.0, 1080.0, 1200.0, 1500.0, 1800.0],
    [1440.0, 1620.0, 1800.0, 2250.0, 2700.0],
];

const MAX_FUEL_PER_JUMP: [[f64; 5]; 6] = [
    [0.6, 0.6, 0.6, 0.8, 0.9],
    [1.2, 1.2, 1.2, 1.5, 1.8],
    [2.0, 2.0, 2.0, 2.5, 3.0],
    [3.3, 3.3, 3.3, 4.1, 5.0],
    [5.3, 5.3, 5.3, 6.6, 8.0],
    [8.5, 8.5, 8.5, 10.6, 12.8],
];

const POWER_CONSTANT: [f64; 6] = [2.00, 2.15, 2.30, 2.45, 2.60, 2.75];

fn linear_constant(grade: Grade) -> f64 {
    match grade {
        Grade::A => 12.0,
        Grade::B => 10.0,
        Grade::C => 8.0,
        Grade::D => 10.0,
        Grade::E | Grade::I => 11.0,
    }
}

fn guardian_booster_range(class: u8) -> f64 {
    match class {
        1 => 4.0,
        2 => 6.0,
        3 => 7.75,
        4 => 9.25,
        5 => 10.5,
        _ => 0.0,
    }
}

/// FSD parameters for a drive module, honouring engineered optimal mass and fuel limits.
pub fn fsd_parameters(module: &Module) -> Option<FsdParameters> {
    if !module.is_frame_shift_drive() || !(2..=7).contains(&module.class) {
        return None;
    }
    let grade = module.grade?;
    let column = GRADES.iter().position(|candidate| *candidate == grade)?;
    let row = usize::from(module.class - 2);
    Some(FsdParameters {
        optimal_mass: module
            .modifier("FSDOptimalMass")
            .unwrap_or(OPTIMAL_MASS[row][column]),
        max_fuel_per_jump: module
            .modifier("MaxFuelPerJump")
            .unwrap_or(MAX_FUEL_PER_JUMP[row][column]),
        linear_constant: linear_constant(grade),
        power_constant: POWER_CONSTANT[row],
    })
}

/// A ship owned by the commander.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ship {
    /// Id assigned by the game, unique within the fleet.
    pub local_id: LocalId,
    /// Canonical hull edname, e.g. `Krait_MkII`.
    pub edname: String,
    /// Display model, e.g. `Krait Mk. II`.
    pub model: String,
    /// Hull manufacturer from the catalog.
    #[serde(default)]
    pub manufacturer: Option<String>,
    /// Name given by the player.
    #[serde(default)]
    pub name: Option<String>,
    /// Player-chosen ident painted on the hull.
    #[serde(default)]
    pub ident: Option<String>,
    /// Role edname, e.g. `BountyHunting`.
    #[serde(default = "default_role", deserialize_with = "canonical_role")]
    pub role: String,
    /// Hull plus modules, in credits.
    #[serde(default)]
    pub value: i64,
    /// Hull alone.
    #[serde(default)]
    pub hull_value: i64,
    /// Fitted modules alone.
    #[serde(default)]
    pub modules_value: i64,
    /// Insurance excess.
    #[serde(default)]
    pub rebuy: i64,
    /// Hull integrity in percent (0 to 100).
    #[serde(default = "full_health")]
    pub health: f64,
    /// Wanted; carrying an unpaid bounty.
    #[serde(default)]
    pub hot: bool,
    /// Paint job edname.
    #[serde(default)]
    pub paintjob: Option<String>,
    /// Location while stored; `None` for the ship being flown.
    #[serde(default)]
    pub location: Option<ShipLocation>,
    /// Distance from the player in light years; `None` for the ship being flown.
    #[serde(default)]
    pub distance: Option<f64>,
    /// Being shipped to another station.
    #[serde(default)]
    pub in_transit: bool,
    /// Cost to have the ship delivered here, from the shipyard listing.
    #[serde(default)]
    pub transfer_price: Option<i64>,
    /// Delivery time in seconds.
    #[serde(default)]
    pub transfer_time: Option<i64>,
    /// Hull and modules without fuel or cargo, in tonnes; zero until a loadout reports it.
    #[serde(default)]
    pub unladen_mass: f64,
    /// Fuel in the main and auxiliary tanks, when known.
    #[serde(default)]
    pub fuel_in_tanks: Option<f64>,
    /// Fuel in the active reservoir that feeds the power plant.
    #[serde(default)]
    pub fuel_in_reservoir: Option<f64>,
    /// Active fuel reservoir capacity in tonnes.
    #[serde(default)]
    pub reservoir_capacity: f64,
    /// Size of the military compartments, once known.
    #[serde(default)]
    pub military_size: Option<u8>,
    /// Fixed core internals.
    #[serde(default)]
    pub core: CoreModules,
    /// Optional internals, sorted by slot.
    #[serde(default)]
    pub compartments: Vec<Compartment>,
    /// Weapon and utility mounts, sorted by size then slot.
    #[serde(default)]
    pub hardpoints: Vec<Hardpoint>,
    /// Hangars reported by the remote profile.
    #[serde(default)]
    pub launch_bays: Vec<LaunchBay>,
    /// Raw loadout record, kept for export to third-party tools.
    #[serde(default)]
    pub raw: Option<String>,
}

fn default_role() -> String {
    "MultiPurpose".to_string()
}

/// Older saves hold the role's display name.
fn canonical_role<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let raw = String::deserialize(deserializer)?;
    Ok(ROLES.canonical(&raw).edname)
}

fn full_health() -> f64 {
    100.0
}

impl Ship {
    /// Create a ship from its edname, seeding hull data from the ship catalog when known.
    pub fn new(local_id: LocalId, edname: &str) -> Self {
        let definition = catalog::ship_by_edname(edname);
        let edname = definition
            .map(|definition| definition.edname.to_string())
            .unwrap_or_else(|| catalog::strip_localisation(edname).to_string());
        Self {
            local_id,
            model: definition
                .map(|definition| definition.model.to_string())
                .unwrap_or_else(|| edname.clone()),
            edname,
            manufacturer: definition.map(|definition| definition.manufacturer.to_string()),
            name: None,
            ident: None,
            role: default_role(),
            value: 0,
            hull_value: 0,
            modules_value: 0,
            rebuy: 0,
            health: full_health(),
            hot: false,
            paintjob: None,
            location: None,
            distance: None,
            in_transit: false,
            transfer_price: None,
            transfer_time: None,
            unladen_mass: 0.0,
            fuel_in_tanks: None,
            fuel_in_reservoir: None,
            reservoir_capacity: definition.map(|definition| definition.reservoir).unwrap_or(0.0),
            military_size: definition.and_then(|definition| definition.military_size),
            core: CoreModules::default(),
            compartments: Vec::new(),
            hardpoints: Vec::new(),
            launch_bays: Vec::new(),
            raw: None,
        }
    }

    /// Catalog entry for the hull, if known.
    pub fn definition(&self) -> Option<&'static ShipDefinition> {
        catalog::ship_by_edname(&self.edname)
    }

    /// The role with its display name.
    pub fn role(&self) -> CanonicalName {
        ROLES.canonical(&self.role)
    }

    /// Display label: the ship's name when set, otherwise role and model.
    pub fn label(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => format!("{} {}", self.role().name, self.model),
        }
    }

    /// Every installed module, core slots first.
    pub fn modules(&self) -> impl Iterator<Item = &Module> {
        CoreSlot::ALL
            .into_iter()
            .filter_map(|slot| self.core.get(slot))
            .chain(self.compartments.iter().filter_map(|c| c.module.as_ref()))
            .chain(self.hardpoints.iter().filter_map(|h| h.module.as_ref()))
    }

    /// Look up the module in any slot by its journal slot name.
    pub fn module_in(&self, slot: &str) -> Option<&Module> {
        if let Some(core) = CoreSlot::from_slot_name(slot) {
            return self.core.get(core);
        }
        self.compartments
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(slot))
            .and_then(|c| c.module.as_ref())
            .or_else(|| {
                self.hardpoints
                    .iter()
                    .find(|h| h.name.eq_ignore_ascii_case(slot))
                    .and_then(|h| h.module.as_ref())
            })
    }

    /// Mutable counterpart of [`Ship::module_in`].
    pub fn module_in_mut(&mut self, slot: &str) -> Option<&mut Module> {
        if let Some(core) = CoreSlot::from_slot_name(slot) {
            return self.core.get_mut(core);
        }
        if let Some(compartment) = self
            .compartments
            .iter_mut()
            .find(|c| c.name.eq_ignore_ascii_case(slot))
        {
            return compartment.module.as_mut();
        }
        self.hardpoints
            .iter_mut()
            .find(|h| h.name.eq_ignore_ascii_case(slot))
            .and_then(|h| h.module.as_mut())
    }

    /// Cargo capacity in tonnes: each rack holds 2^class.
    pub fn cargo_capacity(&self) -> u32 {
        self.compartments
            .iter()
            .filter_map(|c| c.module.as_ref())
            .filter(|module| module.is_cargo_rack())
            .map(|module| 1u32 << module.class.min(16))
            .sum()
    }

    /// Capacity of the core fuel tank.
    pub fn fuel_tank_capacity(&self) -> f64 {
        self.core
            .fuel_tank
            .as_ref()
            .map(|tank| f64::from(1u32 << tank.class.min(16)))
            .unwrap_or(0.0)
    }

    /// Core tank plus every auxiliary fuel tank.
    pub fn fuel_tank_total_capacity(&self) -> f64 {
        let auxiliary: f64 = self
            .compartments
            .iter()
            .filter_map(|c| c.module.as_ref())
            .filter(|module| module.is_fuel_tank())
            .map(|module| f64::from(1u32 << module.class.min(16)))
            .sum();
        self.fuel_tank_capacity() + auxiliary
    }

    /// Parameters of the fitted drive.
    pub fn fsd(&self) -> Option<FsdParameters> {
        self.core.frame_shift_drive.as_ref().and_then(fsd_parameters)
    }

    /// Zero without a drive.
    pub fn max_fuel_per_jump(&self) -> f64 {
        self.fsd().map(|fsd| fsd.max_fuel_per_jump).unwrap_or(0.0)
    }

    fn guardian_boost(&self) -> f64 {
        self.compartments
            .iter()
            .filter_map(|c| c.module.as_ref())
            .filter(|module| module.is_guardian_fsd_booster())
            .map(|module| guardian_booster_range(module.class))
            .fold(0.0, f64::max)
    }

    /// Range of a single jump with `fuel` tonnes aboard and `cargo` tonnes of cargo.
    ///
    /// Zero until a loadout has reported the unladen mass.
    pub fn jump_range(&self, fuel: f64, cargo: f64) -> f64 {
        if self.unladen_mass <= 0.0 {
            return 0.0;
        }
        let Some(fsd) = self.fsd() else {
            return 0.0;
        };
        let mass = self.unladen_mass + fuel + cargo;
        if mass <= 0.0 {
            return 0.0;
        }
        let fuel_used = fuel.min(fsd.max_fuel_per_jump);
        if fuel_used <= 0.0 {
            return 0.0;
        }
        let base = fsd.optimal_mass / mass
            * (fuel_used * 1000.0 / fsd.linear_constant).powf(1.0 / fsd.power_constant);
        base + self.guardian_boost()
    }

    /// Single jump range on a minimal fuel load; derived, never stored.
    pub fn max_jump_range(&self) -> f64 {
        self.jump_range(self.max_fuel_per_jump(), 0.0)
    }

    /// Jump figures of the requested kind. `fuel` and `cargo` override the current loads.
    pub fn jump_details(&self, kind: JumpKind, fuel: Option<f64>, cargo: Option<f64>) -> JumpDetail {
        let cargo = cargo.unwrap_or(0.0);
        let reservoir = self.fuel_in_reservoir.unwrap_or(self.reservoir_capacity);
        let current_fuel = fuel.or(self.fuel_in_tanks).unwrap_or(0.0);
        match kind {
            JumpKind::Next => JumpDetail {
                distance: self.jump_range(current_fuel + reservoir, cargo),
                jumps: 1,
            },
            JumpKind::Max => JumpDetail {
                distance: self.jump_range(self.max_fuel_per_jump(), cargo),
                jumps: 1,
            },
            JumpKind::Total => self.consecutive_jumps(current_fuel + reservoir, cargo),
            JumpKind::Full => {
                self.consecutive_jumps(self.fuel_tank_total_capacity() + reservoir, cargo)
            }
        }
    }

    fn consecutive_jumps(&self, mut fuel: f64, cargo: f64) -> JumpDetail {
        let per_jump = self.max_fuel_per_jump();
        let mut detail = JumpDetail::default();
        if per_jump <= 0.0 || !fuel.is_finite() {
            return detail;
        }
        while fuel > 0.0 {
            detail.distance += self.jump_range(fuel, cargo);
            detail.jumps += 1;
            fuel -= per_jump.min(fuel);
        }
        detail
    }

    /// Distance from the player's coordinates to this ship's stored location.
    pub fn distance_from(&self, coords: &Coordinates) -> Option<f64> {
        self.location
            .as_ref()
            .and_then(|location| location.coords.as_ref())
            .map(|ship_coords| ship_coords.distance_to(coords))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rack(class: u8) -> Compartment {
        Compartment {
            name: format!("Slot0{class}_Size{class}"),
            size: class,
            module: Some(Module::from_edname(&format!("int_cargorack_size{class}_class1"))),
        }
    }

    #[test]
    fn new_ship_uses_catalog_definition() {
        let ship = Ship::new(LocalId(7), "federation_corvette");
        assert_eq!(ship.edname, "Federation_Corvette");
        assert_eq!(ship.model, "Federal Corvette");
        assert_eq!(ship.military_size, Some(5));

        let unknown = Ship::new(LocalId(8), "Krait");
        assert_eq!(unknown.model, "Krait");
        assert_eq!(unknown.manufacturer, None);
    }

    #[test]
    fn cargo_capacity_sums_racks() {
        let mut ship = Ship::new(LocalId(1), "Python");
        ship.compartments = vec![rack(4), rack(2)];
        assert_eq!(ship.cargo_capacity(), 20);
    }

    #[test]
    fn fuel_capacity_includes_auxiliary_tanks() {
        let mut ship = Ship::new(LocalId(1), "Python");
        ship.core.fuel_tank = Some(Module::from_edname("int_fueltank_size5_class3"));
        ship.compartments.push(Compartment {
            name: "Slot05_Size3".to_string(),
            size: 3,
            module: Some(Module::from_edname("int_fueltank_size3_class3")),
        });
        assert_eq!(ship.fuel_tank_capacity(), 32.0);
        assert_eq!(ship.fuel_tank_total_capacity(), 40.0);
    }

    #[test]
    fn jump_range_matches_drive_formula() {
        let mut ship = Ship::new(LocalId(1), "Asp");
        ship.unladen_mass = 300.0;
        ship.core.frame_shift_drive = Some(Module::from_edname("int_hyperdrive_size5_class5"));

        let expected = 1050.0 / 305.0 * (5.0f64 * 1000.0 / 12.0).powf(1.0 / 2.45);
        assert!((ship.max_jump_range() - expected).abs() < 1e-9);

        ship.compartments.push(Compartment {
            name: "Slot03_Size5".to_string(),
            size: 5,
            module: Some(Module::from_edname("int_guardianfsdbooster_size5")),
        });
        assert!((ship.max_jump_range() - expected - 10.5).abs() < 1e-9);
    }

    #[test]
    fn engineered_optimal_mass_is_used() {
        let mut drive = Module::from_edname("int_hyperdrive_size5_class5");
        drive.engineering = Some(crate::models::module::Engineering {
            engineer: Some("Felicity Farseer".to_string()),
            blueprint: "FSD_LongRange".to_string(),
            level: 5,
            quality: 1.0,
            experimental_effect: None,
            modifiers: vec![crate::models::module::Modifier {
                label: "FSDOptimalMass".to_string(),
                value: 1627.5,
                original_value: 1050.0,
                less_is_good: false,
            }],
        });
        let params = fsd_parameters(&drive).expect("drive parameters");
        assert_eq!(params.optimal_mass, 1627.5);
        assert_eq!(params.max_fuel_per_jump, 5.0);
    }

    #[test]
    fn full_tank_jumps_terminate() {
        let mut ship = Ship::new(LocalId(1), "Asp");
        ship.unladen_mass = 300.0;
        ship.reservoir_capacity = 0.0;
        ship.core.frame_shift_drive = Some(Module::from_edname("int_hyperdrive_size5_class5"));
        ship.core.fuel_tank = Some(Module::from_edname("int_fueltank_size5_class3"));

        let detail = ship.jump_details(JumpKind::Full, None, None);
        assert_eq!(detail.jumps, 7);
        assert!(detail.distance > ship.max_jump_range());

        let no_drive = Ship::new(LocalId(2), "Asp");
        assert_eq!(no_drive.jump_details(JumpKind::Full, None, None).jumps, 0);

        let endless = ship.jump_details(JumpKind::Total, Some(f64::INFINITY), None);
        assert_eq!(endless.jumps, 0);
    }

    #[test]
    fn unknown_unladen_mass_has_no_range() {
        let mut ship = Ship::new(LocalId(1), "Anaconda");
        ship.core.frame_shift_drive = Some(Module::from_edname("int_hyperdrive_size5_class5"));
        assert_eq!(ship.unladen_mass, 0.0);
        assert_eq!(ship.max_jump_range(), 0.0);
        assert_eq!(ship.jump_details(JumpKind::Next, Some(10.0), None).distance, 0.0);
    }

    #[test]
    fn saved_role_names_are_canonicalised() -> anyhow::Result<()> {
        let mut saved = serde_json::to_value(Ship::new(LocalId(1), "Anaconda"))?;
        saved["role"] = serde_json::json!("Bounty Hunting");
        let ship: Ship = serde_json::from_value(saved)?;

        assert_eq!(ship.role, "BountyHunting");
        assert_eq!(ship.label(), "Bounty Hunting Anaconda");

        let named = Ship {
            name: Some("Hunter".to_string()),
            ..ship
        };
        assert_eq!(named.label(), "Hunter");
        Ok(())
    }
}
