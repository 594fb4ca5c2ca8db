//! Requests for the remote profile to be fetched again.

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use tokio::{runtime::Handle, sync::mpsc};
use tracing::{debug, warn};

/// Message sent to whoever polls the remote profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshSignal;

/// Something that can fetch the remote profile on demand.
pub trait ProfileRefresher: Send + Sync {
    /// Ask for a fetch. Must not block.
    fn request_refresh(&self);
}

impl ProfileRefresher for mpsc::Sender<RefreshSignal> {
    fn request_refresh(&self) {
        match self.try_send(RefreshSignal) {
            Ok(()) => debug!("Profile refresh requested"),
            // A queued signal already covers this request.
            Err(mpsc::error::TrySendError::Full(_)) => {}
            Err(mpsc::error::TrySendError::Closed(_)) => {
                warn!("Profile poller has stopped; dropping refresh request")
            }
        }
    }
}

/// Issues refresh requests, immediately or after a debounced delay.
///
/// At most one delayed request is outstanding; asking again while one is
/// pending does nothing.
#[derive(Clone)]
pub struct RefreshScheduler {
    refresher: Arc<dyn ProfileRefresher>,
    delay: Duration,
    pending: Arc<AtomicBool>,
}

impl RefreshScheduler {
    /// Scheduler that debounces delayed requests by `delay`.
    pub fn new(refresher: Arc<dyn ProfileRefresher>, delay: Duration) -> Self {
        Self {
            refresher,
            delay,
            pending: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Forward a request straight away, regardless of any pending delayed one.
    pub fn request_now(&self) {
        self.refresher.request_refresh();
    }

    /// Whether a delayed request is waiting to fire.
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    /// Schedule a refresh after the configured delay.
    ///
    /// Returns `false` when a delayed refresh was already pending or no tokio
    /// runtime is available.
    pub fn request_delayed(&self) -> bool {
        if self
            .pending
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Delayed profile refresh already pending");
            return false;
        }
        let handle = match Handle::try_current() {
            Ok(handle) => handle,
            Err(err) => {
                warn!(%err, "No runtime to schedule a delayed profile refresh");
                self.pending.store(false, Ordering::Release);
                return false;
            }
        };

        let refresher = Arc::clone(&self.refresher);
        let pending = Arc::clone(&self.pending);
        let delay = self.delay;
        handle.spawn(async move {
            tokio::time::sleep(delay).await;
            pending.store(false, Ordering::Release);
            refresher.request_refresh();
        });
        debug!(delay_secs = delay.as_secs(), "Scheduled delayed profile refresh");
        true
    }
}

impl std::fmt::Debug for RefreshScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshScheduler")
            .field("delay", &self.delay)
            .field("pending", &self.is_pending())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[derive(Default)]
    struct Counter(AtomicUsize);

    impl ProfileRefresher for Counter {
        fn request_refresh(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn delayed_requests_are_debounced() {
        let counter = Arc::new(Counter::default());
        let scheduler = RefreshScheduler::new(counter.clone(), Duration::from_millis(50));

        assert!(scheduler.request_delayed());
        assert!(!scheduler.request_delayed());
        assert!(!scheduler.request_delayed());
        assert!(scheduler.is_pending());

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(counter.0.load(Ordering::SeqCst), 1);
        assert!(!scheduler.is_pending());

        assert!(scheduler.request_delayed());
    }

    #[tokio::test]
    async fn channel_refresher_coalesces_when_full() {
        let (sender, mut receiver) = mpsc::channel(1);
        let scheduler = RefreshScheduler::new(Arc::new(sender), Duration::from_secs(60));

        scheduler.request_now();
        scheduler.request_now();
        assert_eq!(receiver.recv().await, Some(RefreshSignal));
        assert!(receiver.try_recv().is_err());
    }

    #[test]
    fn delayed_request_without_runtime_is_refused() {
        let counter = Arc::new(Counter::default());
        let scheduler = RefreshScheduler::new(counter, Duration::from_millis(1));
        assert!(!scheduler.request_delayed());
        assert!(!scheduler.is_pending());
    }
}
