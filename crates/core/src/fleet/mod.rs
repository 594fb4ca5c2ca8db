//! Fleet state: journal reconciliation, remote snapshot merging and the shared store.

pub mod merge;
pub mod reconcile;
mod slots;
pub mod store;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{Coordinates, LocalId, Module};

pub use merge::{merge_carrier, merge_profile, CarrierMerge, MergeOutcome};
pub use reconcile::apply_event;
pub use store::{FleetChanged, FleetStore};

/// A module mutation that would leave the fleet inconsistent.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FleetError {
    /// A new compartment or hardpoint whose size neither its name nor the hull gives.
    #[error("ship {ship_id}: cannot determine the size of slot {slot}")]
    UnknownSlotSize {
        /// Ship being changed.
        ship_id: LocalId,
        /// Journal slot name.
        slot: String,
    },
    /// The module is larger than the slot.
    #[error("ship {ship_id}: slot {slot} cannot hold module {module}")]
    UnsupportedSlot {
        /// Ship being changed.
        ship_id: LocalId,
        /// Journal slot name.
        slot: String,
        /// Edname of the refused module.
        module: String,
    },
    /// Swaps only move modules between slots of the same kind.
    #[error("ship {ship_id}: cannot swap {from_slot} with {to_slot}")]
    IncompatibleSwap {
        /// Ship being changed.
        ship_id: LocalId,
        /// Slot the module left.
        from_slot: String,
        /// Slot the module went to.
        to_slot: String,
    },
}

/// What the player is currently flying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Vehicle {
    /// One of the commander's own ships.
    #[default]
    Ship,
    /// A ship-launched fighter.
    Fighter,
    /// A surface recon vehicle.
    Srv,
    /// On foot, in a suit.
    OnFoot,
    /// A passenger in an Apex taxi or dropship.
    Taxi,
    /// Crewing another commander's ship.
    Multicrew,
}

impl Vehicle {
    /// Infer the vehicle from the ship edname reported on game load.
    pub fn from_edname(edname: &str) -> Self {
        let lower = edname.to_ascii_lowercase();
        if lower.contains("fighter") {
            Vehicle::Fighter
        } else if lower.contains("buggy") || lower == "srv" {
            Vehicle::Srv
        } else if lower.contains("suit") {
            Vehicle::OnFoot
        } else if lower.contains("_taxi") {
            Vehicle::Taxi
        } else {
            Vehicle::Ship
        }
    }
}

/// Where the player is, as far as the fleet handlers need to know.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PlayerContext {
    /// Current star system.
    pub system: Option<String>,
    /// Station docked at; `None` in flight.
    pub station: Option<String>,
    /// Market of the station docked at.
    pub market_id: Option<u64>,
    /// Coordinates of the current system.
    pub coords: Option<Coordinates>,
    /// What the player is flying.
    pub vehicle: Vehicle,
    /// Docked at a station or carrier.
    pub docked: bool,
}

/// How an event or snapshot related to the fleet's timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApplyStatus {
    /// The fleet changed.
    #[default]
    Applied,
    /// The event was relevant but changed nothing.
    Unchanged,
    /// The event carries no fleet state; only the player context moved.
    ContextOnly,
    /// Older than the last applied event; dropped.
    Stale,
}

/// A request for the remote profile to be fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshRequest {
    /// Fetch now.
    Immediate,
    /// Debounced: at most one delayed refresh is outstanding.
    Delayed,
}

/// Outcome of applying one event.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Applied {
    /// How the event related to the fleet.
    pub status: ApplyStatus,
    /// Profile fetch the event calls for, if any.
    pub refresh: Option<RefreshRequest>,
    /// Modules touched by a reboot, for announcers.
    pub affected_modules: Vec<Module>,
    /// After a refuel: whether the tanks are now full.
    pub full_tank: Option<bool>,
}

impl Applied {
    /// The fleet changed.
    pub fn changed() -> Self {
        Self::default()
    }

    /// Relevant, but nothing changed.
    pub fn unchanged() -> Self {
        Self::with_status(ApplyStatus::Unchanged)
    }

    /// Outcome with `status` and nothing else.
    pub fn with_status(status: ApplyStatus) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }

    /// Ask for a profile fetch as well.
    pub fn refresh(mut self, request: RefreshRequest) -> Self {
        self.refresh = Some(request);
        self
    }

    /// Whether subscribers should hear about this.
    pub fn is_change(&self) -> bool {
        self.status == ApplyStatus::Applied
    }
}
