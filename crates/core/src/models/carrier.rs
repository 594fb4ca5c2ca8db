#![allow(missing_docs)]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The commander's fleet carrier as known locally.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FleetCarrier {
    pub callsign: Option<String>,
    pub carrier_id: Option<u64>,
    pub name: Option<String>,
    pub current_system: Option<String>,
    pub next_system: Option<String>,
    pub docking_access: Option<String>,
    #[serde(default)]
    pub notorious_access: bool,
    #[serde(default)]
    pub fuel: u32,
    #[serde(default)]
    pub fuel_in_cargo: u32,
    pub state: Option<String>,
    #[serde(default)]
    pub bank_balance: i64,
    #[serde(default)]
    pub bank_reserved_balance: i64,
    #[serde(default)]
    pub used_capacity: u32,
    #[serde(default)]
    pub free_capacity: u32,
    #[serde(default)]
    pub cargo: Vec<Value>,
    #[serde(default)]
    pub locker: CarrierLocker,
    #[serde(default)]
    pub orders: CarrierOrders,
}

/// On-foot goods held in the carrier locker. Only the remote profile reports these.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CarrierLocker {
    #[serde(default)]
    pub assets: Vec<Value>,
    #[serde(default)]
    pub goods: Vec<Value>,
    #[serde(default)]
    pub data: Vec<Value>,
}

/// Market orders placed on the carrier. Only the remote profile reports these.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CarrierOrders {
    #[serde(default)]
    pub commodity_purchases: Vec<Value>,
    #[serde(default)]
    pub commodity_sales: Vec<Value>,
    #[serde(default)]
    pub microresource_purchases: Vec<Value>,
    #[serde(default)]
    pub microresource_sales: Vec<Value>,
}

/// A carrier reading from the remote profile.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteCarrier {
    pub carrier: FleetCarrier,
    pub market_id: Option<u64>,
    pub fetched_at: DateTime<Utc>,
}
