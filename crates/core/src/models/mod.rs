//! Shared domain models: ships, modules, slots, the fleet and static catalogs.

/// The commander's fleet carrier, from journal and remote sources.
pub mod carrier;
pub mod catalog;
/// The fleet aggregate and stored modules.
pub mod fleet;
/// Coordinates and station locations.
pub mod location;
pub mod module;
pub mod ship;
pub mod slot;
/// Star systems and their factions.
pub mod system;

pub use carrier::{CarrierLocker, CarrierOrders, FleetCarrier, RemoteCarrier};
pub use catalog::{CanonicalName, LandingPad, ShipDefinition};
pub use fleet::{Fleet, StoredModule};
pub use location::{Coordinates, ShipLocation};
pub use module::{Engineering, Grade, Modifier, Module};
pub use ship::{CoreModules, JumpDetail, JumpKind, LocalId, Ship};
pub use slot::{
    Compartment, CoreSlot, Hardpoint, HardpointSize, LaunchBay, LaunchVehicle, SlotKind,
};
pub use system::{Faction, StarSystem};
