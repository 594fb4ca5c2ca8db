//! Ship modules and their engineering state.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::catalog::strip_localisation;

static SIZE_CLASS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"_size(\d+)_class(\d+)").expect("valid module size regex"));
static SIZE_ONLY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"_size(\d+)$").expect("valid module size regex"));
static ARMOUR_GRADE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"_armour_grade(\d+)").expect("valid armour grade regex"));

/// Module rating letter. `I` marks the few modules rated outside A to E.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    E,
    I,
}

impl Grade {
    /// Map the `classN` suffix of an edname (1 = E .. 5 = A).
    pub fn from_class_suffix(suffix: u8) -> Option<Self> {
        match suffix {
            1 => Some(Grade::E),
            2 => Some(Grade::D),
            3 => Some(Grade::C),
            4 => Some(Grade::B),
            5 => Some(Grade::A),
            _ => None,
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::E => "E",
            Grade::I => "I",
        };
        f.write_str(letter)
    }
}

/// One engineered modifier on a module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Modifier {
    /// Attribute name, e.g. `FSDOptimalMass`.
    pub label: String,
    /// Engineered value.
    pub value: f64,
    /// Value before engineering.
    pub original_value: f64,
    /// Whether a lower value is the improvement.
    #[serde(default)]
    pub less_is_good: bool,
}

/// Engineering applied to a module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Engineering {
    /// Engineer who applied the blueprint; absent for stored modules.
    pub engineer: Option<String>,
    /// Blueprint edname, e.g. `FSD_LongRange`.
    pub blueprint: String,
    /// Blueprint grade, 1 to 5.
    pub level: u8,
    /// Progress through the current grade, 0 to 1.
    #[serde(default)]
    pub quality: f64,
    /// Experimental effect edname, if any.
    pub experimental_effect: Option<String>,
    /// Modified attributes; empty when the source did not list them.
    #[serde(default)]
    pub modifiers: Vec<Modifier>,
}

impl Engineering {
    /// Engineered value for a modifier label, if present.
    pub fn modifier(&self, label: &str) -> Option<f64> {
        self.modifiers
            .iter()
            .find(|modifier| modifier.label.eq_ignore_ascii_case(label))
            .map(|modifier| modifier.value)
    }
}

/// An installed or stored ship module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    /// Item edname without localisation markers.
    pub edname: String,
    /// Size class from the edname, 0 when it carries none.
    pub class: u8,
    /// Rating, when the edname encodes one.
    pub grade: Option<Grade>,
    /// Integrity in percent (0 to 100).
    #[serde(default = "full_health")]
    pub health: f64,
    /// Purchase or buyback value in credits.
    #[serde(default)]
    pub value: i64,
    /// Bought on the black market.
    #[serde(default)]
    pub hot: bool,
    /// Powered on.
    #[serde(default = "enabled_default")]
    pub enabled: bool,
    /// Power priority group, 1-based.
    #[serde(default)]
    pub priority: Option<u8>,
    /// Row in the in-game power panel, 1-based.
    #[serde(default)]
    pub position: Option<u32>,
    /// Power draw in megawatts.
    #[serde(default)]
    pub power: Option<f64>,
    /// Applied blueprint, if engineered.
    #[serde(default)]
    pub engineering: Option<Engineering>,
}

fn full_health() -> f64 {
    100.0
}

fn enabled_default() -> bool {
    true
}

impl Module {
    /// Build a module from its edname, deriving class and grade where the name encodes them.
    pub fn from_edname(raw: &str) -> Self {
        let edname = strip_localisation(raw).to_string();
        let (class, grade) = class_and_grade(&edname);
        Self {
            edname,
            class,
            grade,
            health: full_health(),
            value: 0,
            hot: false,
            enabled: true,
            priority: None,
            position: None,
            power: None,
            engineering: None,
        }
    }

    /// Lowercase edname with localisation decoration removed; used to match modules across sources.
    pub fn canonical_name(&self) -> String {
        canonical_edname(&self.edname)
    }

    /// Standard cargo rack.
    pub fn is_cargo_rack(&self) -> bool {
        self.canonical_name().starts_with("int_cargorack_")
    }

    /// Core or auxiliary fuel tank.
    pub fn is_fuel_tank(&self) -> bool {
        self.canonical_name().starts_with("int_fueltank_")
    }

    /// Frame shift drive.
    pub fn is_frame_shift_drive(&self) -> bool {
        self.canonical_name().starts_with("int_hyperdrive_")
    }

    /// Guardian FSD booster.
    pub fn is_guardian_fsd_booster(&self) -> bool {
        self.canonical_name().starts_with("int_guardianfsdbooster_")
    }

    /// Engineered modifier value, when the module is engineered and carries that label.
    pub fn modifier(&self, label: &str) -> Option<f64> {
        self.engineering
            .as_ref()
            .and_then(|engineering| engineering.modifier(label))
    }

    /// Copy maintenance fields (health, power state, priority, value, engineering identity)
    /// from another reading of the same module. Class and grade never change.
    pub fn update_maintenance(&mut self, other: &Module) {
        self.health = other.health;
        self.enabled = other.enabled;
        if other.priority.is_some() {
            self.priority = other.priority;
        }
        if other.value > 0 {
            self.value = other.value;
        }
        if let Some(remote) = &other.engineering {
            match &mut self.engineering {
                Some(local) => {
                    local.blueprint = remote.blueprint.clone();
                    local.level = remote.level;
                    if remote.engineer.is_some() {
                        local.engineer = remote.engineer.clone();
                    }
                }
                None => self.engineering = Some(remote.clone()),
            }
        }
    }
}

/// Canonical form of a module edname.
pub fn canonical_edname(raw: &str) -> String {
    strip_localisation(raw).to_ascii_lowercase()
}

fn class_and_grade(edname: &str) -> (u8, Option<Grade>) {
    let lower = edname.to_ascii_lowercase();
    if let Some(caps) = SIZE_CLASS_RE.captures(&lower) {
        let class = caps[1].parse::<u8>().unwrap_or(0);
        let grade = caps[2].parse::<u8>().ok().and_then(Grade::from_class_suffix);
        return (class, grade);
    }
    if let Some(caps) = SIZE_ONLY_RE.captures(&lower) {
        return (caps[1].parse::<u8>().unwrap_or(0), None);
    }
    if ARMOUR_GRADE_RE.is_match(&lower) {
        return (1, Some(Grade::I));
    }
    if lower.starts_with("hpt_") {
        let class = if lower.ends_with("_huge") {
            4
        } else if lower.ends_with("_large") {
            3
        } else if lower.ends_with("_medium") {
            2
        } else if lower.ends_with("_small") {
            1
        } else {
            0
        };
        return (class, None);
    }
    (0, None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_class_and_grade_from_edname() {
        let rack = Module::from_edname("$int_cargorack_size4_class1_name;");
        assert_eq!(rack.edname, "int_cargorack_size4_class1");
        assert_eq!(rack.class, 4);
        assert_eq!(rack.grade, Some(Grade::E));
        assert!(rack.is_cargo_rack());

        let fsd = Module::from_edname("Int_Hyperdrive_Size5_Class5");
        assert_eq!(fsd.class, 5);
        assert_eq!(fsd.grade, Some(Grade::A));
        assert!(fsd.is_frame_shift_drive());
    }

    #[test]
    fn weapons_take_class_from_mount_size() {
        let gun = Module::from_edname("Hpt_PulseLaser_Gimbal_Medium");
        assert_eq!(gun.class, 2);
        assert_eq!(gun.grade, None);
        assert_eq!(Module::from_edname("hpt_heatsinklauncher_turret_tiny").class, 0);
        assert_eq!(Module::from_edname("Int_GuardianFSDBooster_Size3").class, 3);
    }

    #[test]
    fn maintenance_update_keeps_structure() {
        let mut local = Module::from_edname("int_powerplant_size5_class5");
        local.value = 1_000;
        let mut remote = local.clone();
        remote.class = 2;
        remote.health = 87.5;
        remote.enabled = false;
        remote.value = 0;
        remote.engineering = Some(Engineering {
            engineer: None,
            blueprint: "PowerPlant_Boosted".to_string(),
            level: 3,
            quality: 0.0,
            experimental_effect: None,
            modifiers: Vec::new(),
        });

        local.update_maintenance(&remote);
        assert_eq!(local.class, 5);
        assert_eq!(local.health, 87.5);
        assert!(!local.enabled);
        assert_eq!(local.value, 1_000);
        assert_eq!(local.engineering.as_ref().map(|e| e.level), Some(3));
    }
}
