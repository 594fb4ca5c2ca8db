//! Static game definitions and edname canonicalisation.
//!
//! Journal strings arrive in several shapes depending on the game version:
//! plain ednames (`HighTech`), localisation markers (`$economy_HighTech;`),
//! item markers (`$int_cargorack_size4_class1_name;`) or display names
//! (`High Tech`). Catalog lookups tidy all of these down to one key. A miss is
//! never an error: the stripped raw string becomes the canonical key.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// A known definition in one of the static catalogs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Definition {
    /// Internal, non-localised identifier.
    pub edname: &'static str,
    /// Invariant display name.
    pub name: &'static str,
}

const fn def(edname: &'static str, name: &'static str) -> Definition {
    Definition { edname, name }
}

/// Canonical key plus display name produced by a catalog lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CanonicalName {
    /// Canonical lookup key.
    pub edname: String,
    /// Display name; equal to `edname` when the catalog did not know the value.
    pub name: String,
}

impl CanonicalName {
    fn known(definition: &Definition) -> Self {
        Self {
            edname: definition.edname.to_string(),
            name: definition.name.to_string(),
        }
    }

    fn unknown(raw: &str) -> Self {
        Self {
            edname: raw.to_string(),
            name: raw.to_string(),
        }
    }

    /// Whether this name is the catalog's "None" placeholder.
    pub fn is_none(&self) -> bool {
        self.edname.eq_ignore_ascii_case("none") || self.edname.is_empty()
    }
}

/// A named table of definitions sharing one localisation prefix.
#[derive(Debug)]
pub struct Catalog {
    kind: &'static str,
    prefix: Option<&'static str>,
    entries: &'static [Definition],
}

impl Catalog {
    /// Find the definition matching `raw`, whatever decoration it carries.
    pub fn lookup(&self, raw: &str) -> Option<&'static Definition> {
        let stripped = self.strip(raw);
        let key = tidy(stripped);
        if key.is_empty() {
            return None;
        }
        self.entries
            .iter()
            .find(|entry| tidy(entry.edname) == key || tidy(entry.name) == key)
    }

    /// Resolve `raw` to its canonical name, falling back to the stripped raw value.
    pub fn canonical(&self, raw: &str) -> CanonicalName {
        match self.lookup(raw) {
            Some(definition) => CanonicalName::known(definition),
            None => {
                let stripped = self.strip(raw);
                debug!(catalog = self.kind, raw, "No catalog entry; using raw key");
                CanonicalName::unknown(stripped)
            }
        }
    }

    fn strip<'a>(&self, raw: &'a str) -> &'a str {
        let inner = strip_localisation(raw);
        match self.prefix {
            Some(prefix) => strip_prefix_ignore_case(inner, prefix).unwrap_or(inner),
            None => inner,
        }
    }
}

/// Remove `$...;` localisation wrappers and a trailing `_name` marker.
pub fn strip_localisation(raw: &str) -> &str {
    let trimmed = raw.trim();
    let inner = trimmed
        .strip_prefix('$')
        .map(|value| value.strip_suffix(';').unwrap_or(value))
        .unwrap_or(trimmed);
    inner.strip_suffix("_name").unwrap_or(inner)
}

fn strip_prefix_ignore_case<'a>(value: &'a str, prefix: &str) -> Option<&'a str> {
    if value.len() >= prefix.len()
        && value.is_char_boundary(prefix.len())
        && value[..prefix.len()].eq_ignore_ascii_case(prefix)
    {
        Some(&value[prefix.len()..])
    } else {
        None
    }
}

fn tidy(value: &str) -> String {
    value
        .chars()
        .filter(|ch| !matches!(ch, ' ' | '.' | '-' | '_' | '\''))
        .flat_map(char::to_lowercase)
        .collect()
}

/// System economies.
pub static ECONOMIES: Catalog = Catalog {
    kind: "economy",
    prefix: Some("economy_"),
    entries: &[
        def("Agri", "Agriculture"),
        def("Colony", "Colony"),
        def("Damaged", "Damaged"),
        def("Extraction", "Extraction"),
        def("HighTech", "High Tech"),
        def("Industrial", "Industrial"),
        def("Military", "Military"),
        def("Refinery", "Refinery"),
        def("Repair", "Repair"),
        def("Rescue", "Rescue"),
        def("Service", "Service"),
        def("Terraforming", "Terraforming"),
        def("Tourism", "Tourism"),
        def("Prison", "Prison"),
        def("Engineer", "Engineering"),
        def("Carrier", "Private Enterprise"),
        def("None", "None"),
    ],
};

/// Powerplay powers.
pub static POWERS: Catalog = Catalog {
    kind: "power",
    prefix: None,
    entries: &[
        def("ALavignyDuval", "Arissa Lavigny-Duval"),
        def("AislingDuval", "Aisling Duval"),
        def("ArchonDelaine", "Archon Delaine"),
        def("DentonPatreus", "Denton Patreus"),
        def("EdmundMahon", "Edmund Mahon"),
        def("FeliciaWinters", "Felicia Winters"),
        def("LiYongRui", "Li Yong-Rui"),
        def("PranavAntal", "Pranav Antal"),
        def("YuriGrom", "Yuri Grom"),
        def("ZeminaTorval", "Zemina Torval"),
        def("NakatoKaine", "Nakato Kaine"),
        def("JeromeArcher", "Jerome Archer"),
        def("None", "None"),
    ],
};

/// Ship roles assigned by the player.
pub static ROLES: Catalog = Catalog {
    kind: "role",
    prefix: None,
    entries: &[
        def("MultiPurpose", "Multipurpose"),
        def("Exploration", "Exploration"),
        def("Trading", "Trading"),
        def("Mining", "Mining"),
        def("Smuggling", "Smuggling"),
        def("Piracy", "Piracy"),
        def("BountyHunting", "Bounty Hunting"),
        def("Combat", "Combat"),
    ],
};

/// Superpower allegiances, used for factions and systems.
pub static SUPERPOWERS: Catalog = Catalog {
    kind: "superpower",
    prefix: Some("faction_"),
    entries: &[
        def("Federation", "Federation"),
        def("Empire", "Empire"),
        def("Alliance", "Alliance"),
        def("Independent", "Independent"),
        def("Guardian", "Guardian"),
        def("Thargoid", "Thargoid"),
        def("PilotsFederation", "Pilots Federation"),
        def("None", "None"),
    ],
};

/// Engineering materials.
pub static MATERIALS: Catalog = Catalog {
    kind: "material",
    prefix: None,
    entries: &[
        def("carbon", "Carbon"),
        def("iron", "Iron"),
        def("nickel", "Nickel"),
        def("phosphorus", "Phosphorus"),
        def("sulphur", "Sulphur"),
        def("chromium", "Chromium"),
        def("germanium", "Germanium"),
        def("manganese", "Manganese"),
        def("vanadium", "Vanadium"),
        def("zinc", "Zinc"),
        def("arsenic", "Arsenic"),
        def("niobium", "Niobium"),
        def("tungsten", "Tungsten"),
        def("polonium", "Polonium"),
        def("conductivecomponents", "Conductive Components"),
        def("heatconductionwiring", "Heat Conduction Wiring"),
        def("mechanicalscrap", "Mechanical Scrap"),
        def("gridresistors", "Grid Resistors"),
        def("shieldemitters", "Shield Emitters"),
        def("legacyfirmware", "Specialised Legacy Firmware"),
        def("scrambledemissiondata", "Exceptional Scrambled Emission Data"),
        def("disruptedwakeechoes", "Atypical Disrupted Wake Echoes"),
    ],
};

/// Landing pad needed by a hull.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LandingPad {
    Small,
    Medium,
    Large,
}

/// Static properties of a ship hull.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShipDefinition {
    /// Canonical hull edname.
    pub edname: &'static str,
    /// Display model name.
    pub model: &'static str,
    /// Manufacturer display name.
    pub manufacturer: &'static str,
    /// Size of the military compartments, for hulls that have them.
    pub military_size: Option<u8>,
    /// Smallest pad the hull fits.
    pub pad: LandingPad,
    /// Active fuel reservoir capacity in tonnes.
    pub reservoir: f64,
}

const fn hull(
    edname: &'static str,
    model: &'static str,
    manufacturer: &'static str,
    military_size: Option<u8>,
    pad: LandingPad,
    reservoir: f64,
) -> ShipDefinition {
    ShipDefinition {
        edname,
        model,
        manufacturer,
        military_size,
        pad,
        reservoir,
    }
}

static SHIPS: &[ShipDefinition] = &[
    hull("SideWinder", "Sidewinder", "Faulcon DeLacy", None, LandingPad::Small, 0.3),
    hull("Eagle", "Eagle", "Core Dynamics", None, LandingPad::Small, 0.34),
    hull("Hauler", "Hauler", "Zorgon Peterson", None, LandingPad::Small, 0.25),
    hull("Adder", "Adder", "Zorgon Peterson", None, LandingPad::Small, 0.36),
    hull("Viper", "Viper Mk. III", "Faulcon DeLacy", None, LandingPad::Small, 0.41),
    hull("CobraMkIII", "Cobra Mk. III", "Faulcon DeLacy", None, LandingPad::Small, 0.49),
    hull("Type6", "Type-6 Transporter", "Lakon", None, LandingPad::Medium, 0.39),
    hull("Dolphin", "Dolphin", "Saud Kruger", None, LandingPad::Small, 0.5),
    hull("Type7", "Type-7 Transporter", "Lakon", None, LandingPad::Large, 0.52),
    hull("Asp", "Asp Explorer", "Lakon", None, LandingPad::Medium, 0.63),
    hull("Vulture", "Vulture", "Core Dynamics", None, LandingPad::Small, 0.57),
    hull("Empire_Trader", "Imperial Clipper", "Gutamaya", None, LandingPad::Large, 0.74),
    hull("Federation_Dropship", "Federal Dropship", "Core Dynamics", Some(4), LandingPad::Medium, 0.83),
    hull("Orca", "Orca", "Saud Kruger", None, LandingPad::Large, 0.79),
    hull("Type9", "Type-9 Heavy", "Lakon", None, LandingPad::Large, 0.77),
    hull("Python", "Python", "Faulcon DeLacy", None, LandingPad::Medium, 0.83),
    hull("BelugaLiner", "Beluga Liner", "Saud Kruger", None, LandingPad::Large, 0.81),
    hull("FerDeLance", "Fer-de-Lance", "Zorgon Peterson", None, LandingPad::Medium, 0.67),
    hull("Anaconda", "Anaconda", "Faulcon DeLacy", None, LandingPad::Large, 1.07),
    hull("Federation_Corvette", "Federal Corvette", "Core Dynamics", Some(5), LandingPad::Large, 1.13),
    hull("Cutter", "Imperial Cutter", "Gutamaya", None, LandingPad::Large, 1.16),
    hull("Krait_MkII", "Krait Mk. II", "Faulcon DeLacy", None, LandingPad::Medium, 0.63),
    hull("Krait_Light", "Krait Phantom", "Faulcon DeLacy", None, LandingPad::Medium, 0.63),
    hull("Mamba", "Mamba", "Zorgon Peterson", None, LandingPad::Medium, 0.5),
    hull("TypeX", "Alliance Chieftain", "Lakon", Some(4), LandingPad::Medium, 0.77),
    hull("TypeX_2", "Alliance Crusader", "Lakon", Some(4), LandingPad::Medium, 0.77),
    hull("TypeX_3", "Alliance Challenger", "Lakon", Some(4), LandingPad::Medium, 0.77),
    hull("Federation_Gunship", "Federal Gunship", "Core Dynamics", Some(4), LandingPad::Medium, 0.82),
    hull("Federation_Dropship_MkII", "Federal Assault Ship", "Core Dynamics", Some(4), LandingPad::Medium, 0.72),
    hull("Python_NX", "Python Mk. II", "Faulcon DeLacy", None, LandingPad::Medium, 0.83),
    hull("Type8", "Type-8 Transporter", "Lakon", None, LandingPad::Medium, 0.52),
];

/// Look up a hull by its edname (case-insensitive, localisation markers stripped).
pub fn ship_by_edname(raw: &str) -> Option<&'static ShipDefinition> {
    let key = strip_localisation(raw);
    SHIPS
        .iter()
        .find(|definition| definition.edname.eq_ignore_ascii_case(key))
}
