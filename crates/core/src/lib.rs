#![warn(clippy::all, missing_docs)]

//! Core domain logic for fleetwatch.
//!
//! This crate hosts the ship and fleet models, the journal event catalog
//! and parser, the reconciler that folds events into the fleet, the merger
//! for remote profile snapshots, and the configuration and persistence
//! layers used by the command-line companion.

pub mod config;
pub mod events;
pub mod fleet;
pub mod journal;
pub mod models;
pub mod profile;
pub mod refresh;
pub mod save;

pub use config::AppConfig;
pub use events::{Event, EventKind};
pub use fleet::{Applied, ApplyStatus, FleetChanged, FleetStore, MergeOutcome, PlayerContext};
pub use journal::{ingest_line, Ingested, JournalReader};
pub use models::{Fleet, LocalId, Ship};
pub use profile::{ProfileClient, ProfileSnapshot};
pub use refresh::{RefreshScheduler, RefreshSignal};
pub use save::{FleetRepository, JsonFleetFile};
