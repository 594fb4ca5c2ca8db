//! The remote commander profile: fetching and decoding.

mod client;
mod snapshot;

use thiserror::Error;

pub use client::ProfileClient;
pub use snapshot::{ProfileModule, ProfileShip, ProfileSnapshot};

/// Why a profile fetch produced no snapshot.
#[derive(Debug, Error)]
pub enum ProfileError {
    /// Transport failure or timeout.
    #[error("profile request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Any non-success status other than 204.
    #[error("profile endpoint answered with status {0}")]
    Status(u16),
    /// The body was not JSON.
    #[error("profile payload is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),
    /// JSON, but not shaped like a profile.
    #[error("profile payload is malformed: {0}")]
    Malformed(String),
}
