//! Folding remote profile snapshots into the journal-derived fleet.
//!
//! The journal is the fresher source for anything the player can change
//! directly. A snapshot fetched before the last applied event may only fill
//! gaps; a newer one is trusted for the fields the remote side owns (launch
//! bays, module maintenance, stored-ship existence and placement). Snapshots
//! never move the fleet's `updated_at`.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use super::slots;
use super::RefreshRequest;
use crate::models::{CoreSlot, FleetCarrier, Fleet, LocalId, RemoteCarrier, Ship};
use crate::profile::{ProfileShip, ProfileSnapshot};

/// What a snapshot merge did.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MergeOutcome {
    /// Anything in the fleet was modified.
    pub changed: bool,
    /// Fetched no later than the last applied journal event.
    pub stale: bool,
    /// Follow-up fetch requested when the snapshot lagged the journal.
    pub refresh: Option<RefreshRequest>,
    /// Ships the snapshot introduced.
    pub added: Vec<LocalId>,
    /// Ships dropped because the shipyard no longer lists them.
    pub removed: Vec<LocalId>,
}

/// Merge `snapshot` into `fleet`.
pub fn merge_profile(fleet: &mut Fleet, snapshot: &ProfileSnapshot) -> MergeOutcome {
    let before = fleet.clone();
    let mut outcome = MergeOutcome {
        stale: snapshot.fetched_at <= fleet.updated_at(),
        ..MergeOutcome::default()
    };
    if outcome.stale {
        debug!(
            fetched_at = %snapshot.fetched_at,
            updated_at = %fleet.updated_at(),
            "Snapshot predates the last journal event; filling gaps only"
        );
    }

    if let Some(remote) = &snapshot.current_ship {
        merge_current_ship(fleet, remote, &mut outcome);
    }
    let remote_current = snapshot.current_ship.as_ref().map(|ship| ship.local_id);
    merge_shipyard(fleet, &snapshot.shipyard, remote_current, &mut outcome);

    if let Some(remote) = &snapshot.carrier {
        let merged = merge_carrier(fleet.carrier(), remote, fleet.carrier_updated_at());
        if !merged.mismatch {
            fleet.replace_carrier(merged.carrier);
        }
    }

    outcome.changed = *fleet != before;
    outcome
}

fn merge_current_ship(fleet: &mut Fleet, remote: &ProfileShip, outcome: &mut MergeOutcome) {
    match fleet.current_ship_id() {
        None => {
            if fleet.ship(remote.local_id).is_none() {
                fleet.add_ship(ship_from_remote(remote));
                outcome.added.push(remote.local_id);
            } else if let Some(ship) = fleet.ship_mut(remote.local_id) {
                merge_ship_details(ship, remote, outcome.stale);
            }
            fleet.set_current_ship(remote.local_id, None);
        }
        Some(id) if id == remote.local_id => {
            if let Some(ship) = fleet.current_ship_mut() {
                merge_ship_details(ship, remote, outcome.stale);
            }
        }
        Some(id) => {
            debug!(
                local = %id,
                remote = %remote.local_id,
                "Remote current ship differs; asking for a later refresh"
            );
            outcome.refresh = Some(RefreshRequest::Delayed);
        }
    }
}

/// Build a ship seen only remotely.
fn ship_from_remote(remote: &ProfileShip) -> Ship {
    let mut ship = Ship::new(remote.local_id, &remote.edname);
    ship.name = remote.name.clone();
    ship.ident = remote.ident.clone();
    ship.value = remote.value.unwrap_or(0);
    ship.hull_value = remote.hull_value.unwrap_or(0);
    ship.modules_value = remote.modules_value.unwrap_or(0);
    if let Some(health) = remote.health {
        ship.health = health;
    }
    ship.hot = remote.hot.unwrap_or(false);
    ship.location = remote.location.clone();
    ship.in_transit = remote.in_transit.unwrap_or(false);
    ship.launch_bays = remote.launch_bays.clone();
    if ship.military_size.is_none() {
        ship.military_size = remote.military_size();
    }
    for entry in &remote.modules {
        if let Err(err) = slots::install(&mut ship, &entry.slot, entry.module.clone()) {
            debug!(ship_id = %ship.local_id, slot = %entry.slot, %err, "Skipping remote module");
        }
    }
    ship
}

/// Slots holding a module, core slots first.
fn occupied_slots(ship: &Ship) -> Vec<String> {
    CoreSlot::ALL
        .into_iter()
        .filter(|slot| ship.core.get(*slot).is_some())
        .map(|slot| slot.slot_name().to_string())
        .chain(
            ship.compartments
                .iter()
                .filter(|c| c.module.is_some())
                .map(|c| c.name.clone()),
        )
        .chain(
            ship.hardpoints
                .iter()
                .filter(|h| h.module.is_some())
                .map(|h| h.name.clone()),
        )
        .collect()
}

fn merge_ship_details(ship: &mut Ship, remote: &ProfileShip, stale: bool) {
    if ship.name.is_none() {
        ship.name = remote.name.clone();
    }
    if ship.ident.is_none() {
        ship.ident = remote.ident.clone();
    }
    if ship.military_size.is_none() {
        if let Some(size) = remote.military_size() {
            ship.military_size = Some(size);
            for compartment in &mut ship.compartments {
                if compartment.name.to_ascii_lowercase().starts_with("military") {
                    compartment.size = compartment.size.max(size);
                }
            }
        }
    }
    if stale {
        if ship.launch_bays.is_empty() {
            ship.launch_bays = remote.launch_bays.clone();
        }
        return;
    }

    if let Some(health) = remote.health {
        ship.health = health;
    }
    ship.launch_bays = remote.launch_bays.clone();

    // Match each remote module to a local one by canonical name, preferring
    // the slot the remote reports it in.
    let slots = occupied_slots(ship);
    let mut claimed: HashSet<String> = HashSet::new();
    for entry in &remote.modules {
        let canonical = entry.module.canonical_name();
        let holds = |slot: &String| {
            !claimed.contains(slot)
                && ship
                    .module_in(slot)
                    .is_some_and(|module| module.canonical_name() == canonical)
        };
        let target = slots
            .iter()
            .find(|slot| slot.eq_ignore_ascii_case(&entry.slot) && holds(slot))
            .or_else(|| slots.iter().find(|slot| holds(slot)))
            .cloned();
        let Some(slot) = target else {
            debug!(ship_id = %ship.local_id, slot = %entry.slot, "Remote module not fitted locally");
            continue;
        };
        if let Some(module) = ship.module_in_mut(&slot) {
            module.update_maintenance(&entry.module);
        }
        claimed.insert(slot);
    }
}

fn merge_shipyard(
    fleet: &mut Fleet,
    shipyard: &[ProfileShip],
    remote_current: Option<LocalId>,
    outcome: &mut MergeOutcome,
) {
    if outcome.stale {
        for remote in shipyard {
            if fleet.is_current(remote.local_id) {
                continue;
            }
            if let Some(ship) = fleet.ship_mut(remote.local_id) {
                if ship.name.is_none() {
                    ship.name = remote.name.clone();
                }
                if ship.location.is_none() {
                    ship.location = remote.location.clone();
                }
            }
        }
        return;
    }

    let listed: HashSet<LocalId> = shipyard
        .iter()
        .map(|ship| ship.local_id)
        .chain(remote_current)
        .collect();
    outcome.removed = fleet.retain_ships(|ship| listed.contains(&ship.local_id));
    if !outcome.removed.is_empty() {
        debug!(removed = ?outcome.removed, "Pruned ships missing from the remote shipyard");
    }

    for remote in shipyard {
        if fleet.is_current(remote.local_id) {
            continue;
        }
        let Some(ship) = fleet.ship_mut(remote.local_id) else {
            fleet.add_ship(ship_from_remote(remote));
            outcome.added.push(remote.local_id);
            continue;
        };
        if let Some(name) = remote.name.clone() {
            ship.name = Some(name);
        }
        if let Some(value) = remote.value {
            ship.value = value;
        }
        if let Some(hot) = remote.hot {
            ship.hot = hot;
        }
        if let Some(in_transit) = remote.in_transit {
            ship.in_transit = in_transit;
            if !in_transit {
                ship.transfer_price = None;
                ship.transfer_time = None;
            }
        }
        if let Some(location) = &remote.location {
            let same_system = ship
                .location
                .as_ref()
                .is_some_and(|previous| previous.system == location.system);
            let mut location = location.clone();
            if same_system {
                location.coords = ship.location.as_ref().and_then(|previous| previous.coords);
            } else {
                ship.distance = None;
            }
            ship.location = Some(location);
        }
    }
}

/// Result of folding a remote carrier payload into the local one.
#[derive(Debug, Clone, PartialEq)]
pub struct CarrierMerge {
    /// The merged carrier.
    pub carrier: FleetCarrier,
    /// The payload described a different carrier; `carrier` is the local one, untouched.
    pub mismatch: bool,
}

fn fill<T: Clone>(local: &mut Option<T>, remote: &Option<T>) {
    if local.is_none() {
        local.clone_from(remote);
    }
}

/// Merge a remote carrier payload into the local carrier.
///
/// Cargo, locker and orders only ever come from the remote side and are
/// always taken. Fields the journal also reports are taken from the remote
/// payload only when it was fetched after the last carrier journal event, and
/// even then identity fields (name, systems) only fill gaps.
pub fn merge_carrier(
    current: Option<&FleetCarrier>,
    remote: &RemoteCarrier,
    journal_updated_at: Option<DateTime<Utc>>,
) -> CarrierMerge {
    let Some(current) = current else {
        return CarrierMerge {
            carrier: remote.carrier.clone(),
            mismatch: false,
        };
    };
    if let (Some(local), Some(incoming)) = (&current.callsign, &remote.carrier.callsign) {
        if local != incoming {
            warn!(local = %local, remote = %incoming, "Remote carrier payload is for another carrier; ignoring");
            return CarrierMerge {
                carrier: current.clone(),
                mismatch: true,
            };
        }
    }

    let incoming = &remote.carrier;
    let mut carrier = current.clone();
    fill(&mut carrier.callsign, &incoming.callsign);
    fill(&mut carrier.carrier_id, &incoming.carrier_id.or(remote.market_id));
    carrier.cargo = incoming.cargo.clone();
    carrier.locker = incoming.locker.clone();
    carrier.orders = incoming.orders.clone();

    let remote_is_newer = journal_updated_at.map_or(true, |journal| remote.fetched_at > journal);
    if remote_is_newer {
        fill(&mut carrier.name, &incoming.name);
        fill(&mut carrier.current_system, &incoming.current_system);
        fill(&mut carrier.next_system, &incoming.next_system);
        if incoming.docking_access.is_some() {
            carrier.docking_access = incoming.docking_access.clone();
        }
        if incoming.state.is_some() {
            carrier.state = incoming.state.clone();
        }
        carrier.notorious_access = incoming.notorious_access;
        carrier.fuel = incoming.fuel;
        carrier.fuel_in_cargo = incoming.fuel_in_cargo;
        carrier.bank_balance = incoming.bank_balance;
        carrier.bank_reserved_balance = incoming.bank_reserved_balance;
        carrier.used_capacity = incoming.used_capacity;
        carrier.free_capacity = incoming.free_capacity;
    } else {
        fill(&mut carrier.name, &incoming.name);
        fill(&mut carrier.current_system, &incoming.current_system);
        fill(&mut carrier.docking_access, &incoming.docking_access);
        fill(&mut carrier.state, &incoming.state);
    }
    CarrierMerge {
        carrier,
        mismatch: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Module, ShipLocation};
    use crate::profile::ProfileModule;
    use chrono::Duration;
    use serde_json::json;

    fn remote_ship(id: u32, edname: &str) -> ProfileShip {
        ProfileShip {
            local_id: LocalId(id),
            edname: edname.to_string(),
            name: None,
            ident: None,
            value: None,
            hull_value: None,
            modules_value: None,
            health: None,
            hot: None,
            location: None,
            in_transit: None,
            modules: Vec::new(),
            launch_bays: Vec::new(),
        }
    }

    fn located(system: &str) -> Option<ShipLocation> {
        Some(ShipLocation {
            system: Some(system.to_string()),
            ..ShipLocation::default()
        })
    }

    fn fleet_with_current(ids: &[u32], current: u32, updated_at: DateTime<Utc>) -> Fleet {
        let mut fleet = Fleet::default();
        for id in ids {
            let mut ship = Ship::new(LocalId(*id), "SideWinder");
            ship.location = located("Sol");
            fleet.add_ship(ship);
        }
        fleet.set_current_ship(LocalId(current), None);
        fleet.set_updated_at(updated_at);
        fleet
    }

    fn snapshot(
        fetched_at: DateTime<Utc>,
        current: Option<ProfileShip>,
        shipyard: Vec<ProfileShip>,
    ) -> ProfileSnapshot {
        ProfileSnapshot {
            fetched_at,
            current_ship: current,
            shipyard,
            carrier: None,
        }
    }

    #[test]
    fn current_ship_is_exempt_from_pruning() {
        let now = Utc::now();
        let mut fleet = fleet_with_current(&[1, 2, 3], 3, now - Duration::minutes(5));
        let mut one = remote_ship(1, "SideWinder");
        one.name = Some("Scout".to_string());
        let two = remote_ship(2, "SideWinder");

        let outcome = merge_profile(&mut fleet, &snapshot(now, None, vec![one, two]));

        assert!(outcome.removed.is_empty());
        let ids: Vec<LocalId> = fleet.ships().iter().map(|s| s.local_id).collect();
        assert_eq!(ids, vec![LocalId(1), LocalId(2), LocalId(3)]);
        assert_eq!(fleet.current_ship_id(), Some(LocalId(3)));
        assert_eq!(fleet.ship(LocalId(1)).unwrap().name.as_deref(), Some("Scout"));
        assert!(outcome.changed);
    }

    #[test]
    fn fresh_shipyard_prunes_adds_and_relocates() {
        let now = Utc::now();
        let mut fleet = fleet_with_current(&[1, 2, 3], 3, now - Duration::minutes(5));
        let mut two = remote_ship(2, "SideWinder");
        two.location = located("Achenar");
        two.hot = Some(true);
        let mut four = remote_ship(4, "Anaconda");
        four.value = Some(150_000_000);

        let outcome = merge_profile(&mut fleet, &snapshot(now, None, vec![two, four]));

        assert_eq!(outcome.removed, vec![LocalId(1)]);
        assert_eq!(outcome.added, vec![LocalId(4)]);
        let two = fleet.ship(LocalId(2)).unwrap();
        assert!(two.hot);
        assert_eq!(
            two.location.as_ref().and_then(|l| l.system.as_deref()),
            Some("Achenar")
        );
        assert_eq!(fleet.ship(LocalId(4)).unwrap().model, "Anaconda");
    }

    #[test]
    fn stale_snapshot_only_fills_gaps() {
        let now = Utc::now();
        let mut fleet = fleet_with_current(&[1, 2, 3], 3, now);
        fleet.ship_mut(LocalId(3)).unwrap().health = 80.0;
        fleet.ship_mut(LocalId(2)).unwrap().name = Some("Local".to_string());
        let updated_at = fleet.updated_at();

        let mut current = remote_ship(3, "SideWinder");
        current.health = Some(100.0);
        current.name = Some("Filled".to_string());
        let mut two = remote_ship(2, "SideWinder");
        two.name = Some("Remote".to_string());
        two.location = located("Achenar");

        let outcome = merge_profile(
            &mut fleet,
            &snapshot(now - Duration::minutes(1), Some(current), vec![two]),
        );

        assert!(outcome.stale);
        assert_eq!(outcome.removed, Vec::<LocalId>::new());
        assert_eq!(fleet.ships().len(), 3);
        let current = fleet.current_ship().unwrap();
        assert_eq!(current.health, 80.0);
        assert_eq!(current.name.as_deref(), Some("Filled"));
        let two = fleet.ship(LocalId(2)).unwrap();
        assert_eq!(two.name.as_deref(), Some("Local"));
        assert_eq!(
            two.location.as_ref().and_then(|l| l.system.as_deref()),
            Some("Sol")
        );
        assert_eq!(fleet.updated_at(), updated_at);
    }

    #[test]
    fn mismatched_current_ship_requests_refresh() {
        let now = Utc::now();
        let mut fleet = fleet_with_current(&[1, 3], 3, now - Duration::minutes(5));
        let mut remote = remote_ship(1, "SideWinder");
        remote.health = Some(10.0);

        let outcome = merge_profile(&mut fleet, &snapshot(now, Some(remote), Vec::new()));

        assert_eq!(outcome.refresh, Some(RefreshRequest::Delayed));
        assert_eq!(fleet.ship(LocalId(1)).unwrap().health, 100.0);
        assert_eq!(fleet.current_ship_id(), Some(LocalId(3)));
    }

    #[test]
    fn diverged_remote_current_ship_is_still_added() {
        let now = Utc::now();
        let mut fleet = fleet_with_current(&[3], 3, now - Duration::minutes(5));
        let mut four = remote_ship(4, "Anaconda");
        four.name = Some("Remote".to_string());

        let outcome = merge_profile(
            &mut fleet,
            &snapshot(now, Some(four.clone()), vec![remote_ship(3, "SideWinder"), four]),
        );

        assert_eq!(outcome.refresh, Some(RefreshRequest::Delayed));
        assert_eq!(outcome.added, vec![LocalId(4)]);
        assert!(outcome.removed.is_empty());
        assert_eq!(fleet.current_ship_id(), Some(LocalId(3)));
        let added = fleet.ship(LocalId(4)).unwrap();
        assert_eq!(added.model, "Anaconda");
        assert_eq!(added.name.as_deref(), Some("Remote"));
    }

    #[test]
    fn maintenance_matched_by_canonical_name() {
        let now = Utc::now();
        let mut fleet = fleet_with_current(&[3], 3, now - Duration::minutes(5));
        {
            let ship = fleet.current_ship_mut().unwrap();
            slots::install(ship, "Slot01_Size3", Module::from_edname("int_repairer_size3_class5"))
                .unwrap();
            slots::install(ship, "Slot02_Size3", Module::from_edname("int_repairer_size3_class5"))
                .unwrap();
        }

        let mut worn = Module::from_edname("Int_Repairer_Size3_Class5");
        worn.health = 42.0;
        let mut remote = remote_ship(3, "SideWinder");
        remote.modules = vec![ProfileModule {
            slot: "Slot02_Size3".to_string(),
            module: worn,
        }];
        merge_profile(&mut fleet, &snapshot(now, Some(remote), Vec::new()));

        let ship = fleet.current_ship().unwrap();
        assert_eq!(ship.module_in("Slot01_Size3").unwrap().health, 100.0);
        assert_eq!(ship.module_in("Slot02_Size3").unwrap().health, 42.0);
        assert_eq!(ship.module_in("Slot02_Size3").unwrap().class, 3);
    }

    fn remote_carrier(callsign: &str, fetched_at: DateTime<Utc>) -> RemoteCarrier {
        RemoteCarrier {
            carrier: FleetCarrier {
                callsign: Some(callsign.to_string()),
                name: Some("REMOTE".to_string()),
                current_system: Some("Sol".to_string()),
                fuel: 900,
                cargo: vec![json!({"commodity": "Tritium", "qty": 200})],
                ..FleetCarrier::default()
            },
            market_id: Some(3700000000),
            fetched_at,
        }
    }

    #[test]
    fn carrier_for_another_callsign_is_ignored() {
        let local = FleetCarrier {
            callsign: Some("K7Q-1HT".to_string()),
            fuel: 100,
            ..FleetCarrier::default()
        };
        let merged = merge_carrier(Some(&local), &remote_carrier("X9X-9XX", Utc::now()), None);
        assert!(merged.mismatch);
        assert_eq!(merged.carrier, local);
    }

    #[test]
    fn older_carrier_payload_keeps_journal_fields() {
        let journal_at = Utc::now();
        let local = FleetCarrier {
            callsign: Some("K7Q-1HT".to_string()),
            name: None,
            current_system: Some("Achenar".to_string()),
            fuel: 100,
            ..FleetCarrier::default()
        };

        let older = remote_carrier("K7Q-1HT", journal_at - Duration::minutes(1));
        let merged = merge_carrier(Some(&local), &older, Some(journal_at)).carrier;
        assert_eq!(merged.fuel, 100);
        assert_eq!(merged.current_system.as_deref(), Some("Achenar"));
        assert_eq!(merged.name.as_deref(), Some("REMOTE"));
        assert_eq!(merged.cargo.len(), 1);

        let newer = remote_carrier("K7Q-1HT", journal_at + Duration::minutes(1));
        let merged = merge_carrier(Some(&local), &newer, Some(journal_at)).carrier;
        assert_eq!(merged.fuel, 900);
        assert_eq!(merged.current_system.as_deref(), Some("Achenar"));
    }
}
