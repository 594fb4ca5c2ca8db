//! Slot naming rules: classification, derived sizes and canonical ordering.

use std::cmp::Ordering;
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::module::Module;

static SIZE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)size([0-9]+)").expect("valid size regex"));
static COMPARTMENT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?i)(slot|military)([0-9]+)(?:_size([0-9]+))?$").expect("valid compartment regex")
});
static HARDPOINT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?i)(tiny|small|medium|large|huge)hardpoint([0-9]+)$").expect("valid hardpoint regex")
});

/// Core internal slots every hull carries exactly once.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CoreSlot {
    Armour,
    PowerPlant,
    MainEngines,
    FrameShiftDrive,
    LifeSupport,
    PowerDistributor,
    Radar,
    FuelTank,
    CargoHatch,
    ShipCockpit,
}

impl CoreSlot {
    /// Every core slot, in the order the outfitting screen lists them.
    pub const ALL: [CoreSlot; 10] = [
        CoreSlot::Armour,
        CoreSlot::PowerPlant,
        CoreSlot::MainEngines,
        CoreSlot::FrameShiftDrive,
        CoreSlot::LifeSupport,
        CoreSlot::PowerDistributor,
        CoreSlot::Radar,
        CoreSlot::FuelTank,
        CoreSlot::CargoHatch,
        CoreSlot::ShipCockpit,
    ];

    /// The journal's slot name.
    pub fn slot_name(self) -> &'static str {
        match self {
            CoreSlot::Armour => "Armour",
            CoreSlot::PowerPlant => "PowerPlant",
            CoreSlot::MainEngines => "MainEngines",
            CoreSlot::FrameShiftDrive => "FrameShiftDrive",
            CoreSlot::LifeSupport => "LifeSupport",
            CoreSlot::PowerDistributor => "PowerDistributor",
            CoreSlot::Radar => "Radar",
            CoreSlot::FuelTank => "FuelTank",
            CoreSlot::CargoHatch => "CargoHatch",
            CoreSlot::ShipCockpit => "ShipCockpit",
        }
    }

    /// Case-insensitive inverse of [`CoreSlot::slot_name`].
    pub fn from_slot_name(name: &str) -> Option<Self> {
        CoreSlot::ALL
            .into_iter()
            .find(|slot| slot.slot_name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for CoreSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slot_name())
    }
}

/// What kind of slot a journal slot name refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotKind {
    /// One of the fixed core slots.
    Core(CoreSlot),
    /// `SlotNN_SizeN` or `MilitaryNN`.
    Compartment,
    /// `<Size>HardpointN`, weapons and utilities alike.
    Hardpoint,
    /// The hull paint job.
    PaintJob,
    /// Decals, nameplates, voice packs and other cosmetic slots.
    Cosmetic,
}

impl SlotKind {
    /// Classify a journal slot name; anything unrecognised is cosmetic.
    pub fn classify(slot: &str) -> Self {
        if let Some(core) = CoreSlot::from_slot_name(slot) {
            return SlotKind::Core(core);
        }
        if slot.eq_ignore_ascii_case("PaintJob") {
            return SlotKind::PaintJob;
        }
        if HARDPOINT_RE.is_match(slot) {
            return SlotKind::Hardpoint;
        }
        if COMPARTMENT_RE.is_match(slot) {
            return SlotKind::Compartment;
        }
        SlotKind::Cosmetic
    }
}

/// Hardpoint size tiers; declaration order is the canonical order.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HardpointSize {
    Tiny,
    Small,
    Medium,
    Large,
    Huge,
}

impl HardpointSize {
    fn from_word(word: &str) -> Option<Self> {
        match word.to_ascii_lowercase().as_str() {
            "tiny" => Some(HardpointSize::Tiny),
            "small" => Some(HardpointSize::Small),
            "medium" => Some(HardpointSize::Medium),
            "large" => Some(HardpointSize::Large),
            "huge" => Some(HardpointSize::Huge),
            _ => None,
        }
    }
}

/// Derive a compartment's size from its slot name.
///
/// `Slot03_Size4` carries its size. `Military01` slots take the hull's military
/// size, which may be unknown; `None` means the size cannot be determined.
pub fn compartment_size(slot: &str, military_size: Option<u8>) -> Option<u8> {
    if slot.to_ascii_lowercase().starts_with("military") {
        return military_size;
    }
    SIZE_RE
        .captures(slot)
        .and_then(|caps| caps[1].parse::<u8>().ok())
        .filter(|size| (1..=8).contains(size))
}

/// Derive a hardpoint's size tier from its slot name.
pub fn hardpoint_size(slot: &str) -> Option<HardpointSize> {
    HARDPOINT_RE
        .captures(slot)
        .and_then(|caps| HardpointSize::from_word(&caps[1]))
}

/// An optional internal slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Compartment {
    /// Journal slot name.
    pub name: String,
    /// Size class, 1 to 8.
    pub size: u8,
    /// Fitted module; `None` for an empty slot.
    pub module: Option<Module>,
}

/// A weapon or utility mount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hardpoint {
    /// Journal slot name.
    pub name: String,
    /// Mount size tier.
    pub size: HardpointSize,
    /// Fitted weapon or utility; `None` for an empty mount.
    pub module: Option<Module>,
}

/// A fighter or SRV in a hangar bay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaunchVehicle {
    /// Fighter or SRV edname.
    pub edname: String,
    /// Loadout variant, when the source names one.
    pub loadout: Option<String>,
    /// Replacement vehicles left in the bay.
    #[serde(default)]
    pub rebuilds: u32,
}

/// A hangar compartment and the vehicles docked in it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaunchBay {
    /// Compartment slot name holding the bay.
    pub name: String,
    /// Size class of the bay module.
    pub size: u8,
    /// One entry per vehicle type the bay carries.
    #[serde(default)]
    pub vehicles: Vec<LaunchVehicle>,
}

fn compartment_key(name: &str) -> (u8, u32, u32) {
    match COMPARTMENT_RE.captures(name) {
        Some(caps) => {
            let military = u8::from(caps[1].eq_ignore_ascii_case("military"));
            let index = caps[2].parse().unwrap_or(u32::MAX);
            let size = caps
                .get(3)
                .and_then(|size| size.as_str().parse().ok())
                .unwrap_or(0);
            (military, index, size)
        }
        None => (2, u32::MAX, u32::MAX),
    }
}

fn hardpoint_key(hardpoint: &Hardpoint) -> (HardpointSize, u32) {
    let index = HARDPOINT_RE
        .captures(&hardpoint.name)
        .and_then(|caps| caps[2].parse().ok())
        .unwrap_or(u32::MAX);
    (hardpoint.size, index)
}

/// Order compartments by slot index then size, military slots last.
pub fn sort_compartments(compartments: &mut [Compartment]) {
    compartments.sort_by(|a, b| {
        compartment_key(&a.name)
            .cmp(&compartment_key(&b.name))
            .then_with(|| a.name.cmp(&b.name))
    });
}

/// Order hardpoints by size tier (tiny to huge) then mount index.
pub fn sort_hardpoints(hardpoints: &mut [Hardpoint]) {
    hardpoints.sort_by(|a, b| match hardpoint_key(a).cmp(&hardpoint_key(b)) {
        Ordering::Equal => a.name.cmp(&b.name),
        other => other,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_slot_names() {
        assert_eq!(
            SlotKind::classify("FrameShiftDrive"),
            SlotKind::Core(CoreSlot::FrameShiftDrive)
        );
        assert_eq!(SlotKind::classify("Slot03_Size4"), SlotKind::Compartment);
        assert_eq!(SlotKind::classify("Military02"), SlotKind::Compartment);
        assert_eq!(SlotKind::classify("MediumHardpoint2"), SlotKind::Hardpoint);
        assert_eq!(SlotKind::classify("TinyHardpoint1"), SlotKind::Hardpoint);
        assert_eq!(SlotKind::classify("PaintJob"), SlotKind::PaintJob);
        assert_eq!(SlotKind::classify("Decal1"), SlotKind::Cosmetic);
        assert_eq!(SlotKind::classify("ShipName0"), SlotKind::Cosmetic);
    }

    #[test]
    fn compartment_size_comes_from_name() {
        assert_eq!(compartment_size("Slot03_Size4", None), Some(4));
        assert_eq!(compartment_size("Slot01_Size8", Some(5)), Some(8));
        assert_eq!(compartment_size("Military01", Some(5)), Some(5));
        assert_eq!(compartment_size("Military01", None), None);
        assert_eq!(compartment_size("Slot01", None), None);
        assert_eq!(compartment_size("slot01_size3", None), Some(3));
    }

    #[test]
    fn hardpoint_size_comes_from_name() {
        assert_eq!(hardpoint_size("HugeHardpoint1"), Some(HardpointSize::Huge));
        assert_eq!(hardpoint_size("TinyHardpoint4"), Some(HardpointSize::Tiny));
        assert_eq!(hardpoint_size("Armour"), None);
    }

    #[test]
    fn compartments_sort_by_index_then_military() {
        let mut compartments: Vec<Compartment> =
            ["Military01", "Slot10_Size2", "Slot02_Size6", "Slot01_Size6"]
                .iter()
                .map(|name| Compartment {
                    name: name.to_string(),
                    size: 1,
                    module: None,
                })
                .collect();
        sort_compartments(&mut compartments);
        let names: Vec<&str> = compartments.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(
            names,
            ["Slot01_Size6", "Slot02_Size6", "Slot10_Size2", "Military01"]
        );
    }

    #[test]
    fn hardpoints_sort_tiny_to_huge() {
        let mut hardpoints: Vec<Hardpoint> =
            ["LargeHardpoint1", "TinyHardpoint2", "SmallHardpoint1", "TinyHardpoint1"]
                .iter()
                .filter_map(|name| {
                    hardpoint_size(name).map(|size| Hardpoint {
                        name: name.to_string(),
                        size,
                        module: None,
                    })
                })
                .collect();
        sort_hardpoints(&mut hardpoints);
        let names: Vec<&str> = hardpoints.iter().map(|h| h.name.as_str()).collect();
        assert_eq!(
            names,
            ["TinyHardpoint1", "TinyHardpoint2", "SmallHardpoint1", "LargeHardpoint1"]
        );
    }
}
