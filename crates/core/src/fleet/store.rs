//! The fleet behind a lock, with change notification.

use std::sync::Arc;

use anyhow::Result;
use parking_lot::{Mutex, RwLock};
use tokio::sync::broadcast;
use tracing::{debug, info};

use super::{
    merge::merge_profile, reconcile::apply_event, Applied, FleetError, MergeOutcome,
    PlayerContext, RefreshRequest,
};
use crate::events::Event;
use crate::models::{Fleet, LocalId, Ship, StoredModule};
use crate::profile::ProfileSnapshot;
use crate::refresh::RefreshScheduler;
use crate::save::FleetRepository;

const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// Broadcast after every mutation that changed the fleet. Subscribers re-read the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FleetChanged {
    /// Caused by replayed journal history rather than live play.
    pub replayed: bool,
}

/// Thread-safe home of the fleet, shared by journal ingest, profile merging and readers.
///
/// Every mutation runs against a copy under the write lock and is committed
/// only when it succeeds, so a rejected event leaves no partial state behind.
/// Notification, refresh scheduling and persistence all happen after the lock
/// is released.
#[derive(Clone)]
pub struct FleetStore {
    inner: Arc<RwLock<Inner>>,
    changes: broadcast::Sender<FleetChanged>,
    refresh: Option<RefreshScheduler>,
    /// Held from snapshot to rename so an older copy never lands over a newer one.
    persisting: Arc<Mutex<()>>,
}

struct Inner {
    fleet: Fleet,
    context: PlayerContext,
}

impl FleetStore {
    /// Store holding `fleet`, with no refresh scheduler.
    pub fn new(fleet: Fleet) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(RwLock::new(Inner {
                fleet,
                context: PlayerContext::default(),
            })),
            changes,
            refresh: None,
            persisting: Arc::new(Mutex::new(())),
        }
    }

    /// Route refresh requests raised by events and merges to `scheduler`.
    pub fn with_refresh(mut self, scheduler: RefreshScheduler) -> Self {
        self.refresh = Some(scheduler);
        self
    }

    /// Receive a [`FleetChanged`] after each committed change.
    pub fn subscribe(&self) -> broadcast::Receiver<FleetChanged> {
        self.changes.subscribe()
    }

    /// Apply one journal event.
    pub fn apply_event(&self, event: &Event) -> Result<Applied, FleetError> {
        let applied = {
            let mut inner = self.inner.write();
            let mut fleet = inner.fleet.clone();
            let mut context = inner.context.clone();
            let applied = apply_event(&mut fleet, &mut context, event)?;
            inner.fleet = fleet;
            inner.context = context;
            applied
        };

        if applied.is_change() {
            self.notify(event.from_load);
        }
        if let Some(request) = applied.refresh {
            if !event.from_load {
                self.schedule_refresh(request);
            }
        }
        Ok(applied)
    }

    /// Merge a remote profile snapshot.
    pub fn merge_profile(&self, snapshot: &ProfileSnapshot) -> MergeOutcome {
        let outcome = {
            let mut inner = self.inner.write();
            merge_profile(&mut inner.fleet, snapshot)
        };
        debug!(
            changed = outcome.changed,
            stale = outcome.stale,
            added = outcome.added.len(),
            removed = outcome.removed.len(),
            "Merged profile snapshot"
        );
        if outcome.changed {
            self.notify(false);
        }
        if let Some(request) = outcome.refresh {
            self.schedule_refresh(request);
        }
        outcome
    }

    /// Copy the fleet under the read lock and hand it to `repository`.
    ///
    /// Concurrent callers are serialised, each taking its copy once the
    /// previous write has finished.
    pub fn persist_with(&self, repository: &dyn FleetRepository) -> Result<()> {
        let _persisting = self.persisting.lock();
        let fleet = self.fleet();
        repository.persist(&fleet)?;
        info!(ships = fleet.ships().len(), "Persisted fleet");
        Ok(())
    }

    /// Snapshot of the whole fleet.
    pub fn fleet(&self) -> Fleet {
        self.inner.read().fleet.clone()
    }

    /// Snapshot of every ship.
    pub fn ships(&self) -> Vec<Ship> {
        self.inner.read().fleet.ships().to_vec()
    }

    /// Snapshot of the ship being flown.
    pub fn current_ship(&self) -> Option<Ship> {
        self.inner.read().fleet.current_ship().cloned()
    }

    /// Snapshot of one ship.
    pub fn ship(&self, id: LocalId) -> Option<Ship> {
        self.inner.read().fleet.ship(id).cloned()
    }

    /// Snapshot of module storage.
    pub fn stored_modules(&self) -> Vec<StoredModule> {
        self.inner.read().fleet.stored_modules().to_vec()
    }

    /// Where the player is now.
    pub fn context(&self) -> PlayerContext {
        self.inner.read().context.clone()
    }

    fn notify(&self, replayed: bool) {
        // No subscribers is fine.
        let _ = self.changes.send(FleetChanged { replayed });
    }

    fn schedule_refresh(&self, request: RefreshRequest) {
        let Some(scheduler) = &self.refresh else {
            debug!(?request, "No refresh scheduler; dropping request");
            return;
        };
        match request {
            RefreshRequest::Immediate => scheduler.request_now(),
            RefreshRequest::Delayed => {
                scheduler.request_delayed();
            }
        }
    }
}

impl std::fmt::Debug for FleetStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("FleetStore")
            .field("ships", &inner.fleet.ships().len())
            .field("current_ship_id", &inner.fleet.current_ship_id())
            .field("updated_at", &inner.fleet.updated_at())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journal::parse_line;
    use crate::refresh::RefreshSignal;
    use crate::save::JsonFleetFile;
    use std::time::Duration;
    use tokio::sync::mpsc;

    fn event(line: &str) -> Event {
        parse_line(line).unwrap().unwrap()
    }

    const SWAP: &str = r#"{"timestamp":"2024-03-01T10:00:00Z","event":"ShipyardSwap","ShipType":"krait_mkii","ShipID":5,"MarketID":128666762}"#;

    fn repair_drone(minute: u32) -> Event {
        event(&format!(
            r#"{{"timestamp":"2024-03-01T10:{minute:02}:00Z","event":"RepairDrone","HullRepaired":0.1}}"#
        ))
    }

    #[tokio::test]
    async fn change_is_broadcast_after_commit() -> anyhow::Result<()> {
        let store = FleetStore::new(Fleet::default());
        let mut changes = store.subscribe();

        let applied = store.apply_event(&event(SWAP))?;
        assert!(applied.is_change());
        assert_eq!(changes.recv().await?, FleetChanged { replayed: false });
        assert_eq!(store.current_ship().map(|ship| ship.local_id), Some(LocalId(5)));

        let again = store.apply_event(&event(SWAP))?;
        assert!(!again.is_change());
        assert!(changes.try_recv().is_err());
        Ok(())
    }

    #[test]
    fn rejected_event_leaves_fleet_untouched() {
        let store = FleetStore::new(Fleet::default());
        let bad = event(
            r#"{"timestamp":"2024-03-01T10:00:00Z","event":"ModuleBuy","Slot":"Military01","BuyItem":"int_hullreinforcement_size5_class2","BuyPrice":100,"Ship":"krait_mkii","ShipID":3}"#,
        );
        let before = store.fleet();
        assert!(store.apply_event(&bad).is_err());
        assert_eq!(store.fleet(), before);
    }

    #[tokio::test]
    async fn refresh_requests_skip_replayed_events() -> anyhow::Result<()> {
        let (sender, mut receiver) = mpsc::channel(4);
        let scheduler = RefreshScheduler::new(Arc::new(sender), Duration::from_secs(60));
        let store = FleetStore::new(Fleet::default()).with_refresh(scheduler);

        store.apply_event(&repair_drone(5).replayed())?;
        assert!(receiver.try_recv().is_err());

        store.apply_event(&repair_drone(6))?;
        assert_eq!(receiver.recv().await, Some(RefreshSignal));
        Ok(())
    }

    /// Records every write and whether two ever overlapped.
    #[derive(Default)]
    struct RecordingRepository {
        writing: std::sync::atomic::AtomicBool,
        overlapped: std::sync::atomic::AtomicBool,
        written: Mutex<Vec<Fleet>>,
    }

    impl FleetRepository for RecordingRepository {
        fn load(&self) -> anyhow::Result<Option<Fleet>> {
            Ok(self.written.lock().last().cloned())
        }

        fn persist(&self, fleet: &Fleet) -> anyhow::Result<()> {
            use std::sync::atomic::Ordering;
            if self.writing.swap(true, Ordering::SeqCst) {
                self.overlapped.store(true, Ordering::SeqCst);
            }
            std::thread::sleep(Duration::from_millis(2));
            self.written.lock().push(fleet.clone());
            self.writing.store(false, Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn concurrent_persists_are_serialised() -> anyhow::Result<()> {
        let store = FleetStore::new(Fleet::default());
        let repository = Arc::new(RecordingRepository::default());

        let writers: Vec<_> = (0..4u32)
            .map(|minute| {
                let store = store.clone();
                let repository = Arc::clone(&repository);
                std::thread::spawn(move || -> anyhow::Result<()> {
                    let swap = format!(
                        r#"{{"timestamp":"2024-03-01T10:{minute:02}:00Z","event":"ShipyardSwap","ShipType":"sidewinder","ShipID":{},"MarketID":1}}"#,
                        minute + 1
                    );
                    store.apply_event(&event(&swap))?;
                    store.persist_with(repository.as_ref())
                })
            })
            .collect();
        for writer in writers {
            writer.join().expect("writer thread")?;
        }

        assert!(!repository.overlapped.load(std::sync::atomic::Ordering::SeqCst));
        assert_eq!(repository.written.lock().len(), 4);
        assert_eq!(repository.load()?, Some(store.fleet()));
        Ok(())
    }

    #[test]
    fn persists_a_copy_of_the_fleet() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let file = JsonFleetFile::new(dir.path().join("fleet.json"));
        let store = FleetStore::new(Fleet::default());
        store.apply_event(&event(SWAP))?;

        store.persist_with(&file)?;
        let restored = file.load()?.expect("fleet was written");
        assert_eq!(restored.current_ship_id(), Some(LocalId(5)));
        Ok(())
    }
}
