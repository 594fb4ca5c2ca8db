use std::{sync::Arc, time::Duration};

use tokio::{sync::mpsc, time::MissedTickBehavior};
use tracing::{debug, info, warn};
use fleetwatch_core::{FleetStore, JsonFleetFile, ProfileClient, RefreshSignal};

/// Fetches the remote profile on a timer and on request, merging each snapshot.
pub struct ProfilePoller {
    client: ProfileClient,
    store: FleetStore,
    repository: Arc<JsonFleetFile>,
    interval: Duration,
}

impl ProfilePoller {
    pub fn new(
        client: ProfileClient,
        store: FleetStore,
        repository: Arc<JsonFleetFile>,
        interval: Duration,
    ) -> Self {
        Self {
            client,
            store,
            repository,
            interval,
        }
    }

    pub async fn run(self, mut requests: mpsc::Receiver<RefreshSignal>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                request = requests.recv() => {
                    if request.is_none() {
                        debug!("Refresh channel closed; polling on timer only");
                        self.poll_forever(ticker).await;
                        return;
                    }
                    ticker.reset();
                }
            }
            self.refresh().await;
        }
    }

    async fn poll_forever(&self, mut ticker: tokio::time::Interval) {
        loop {
            ticker.tick().await;
            self.refresh().await;
        }
    }

    async fn refresh(&self) {
        let snapshot = match self.client.fetch_profile().await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!(%err, "Profile fetch failed");
                return;
            }
        };
        let outcome = self.store.merge_profile(&snapshot);
        if !outcome.changed {
            return;
        }
        info!(
            added = outcome.added.len(),
            removed = outcome.removed.len(),
            stale = outcome.stale,
            "Profile merged into fleet"
        );
        if let Err(err) = self.store.persist_with(self.repository.as_ref()) {
            warn!(?err, "Failed to persist fleet");
        }
    }
}
