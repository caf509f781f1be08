//! Log Synchronizer - periodic full-buffer fetches
//!
//! One poll task at a time. `restart` aborts the running poller before
//! scheduling the next, so a cadence change never leaves two pollers
//! fetching side by side. Every successful fetch replaces the published
//! snapshot wholesale; failed fetches are dropped.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, trace, warn};

use crate::core::LogEntry;
use crate::gateway::BackendGateway;

/// What the presentation renders: the latest full buffer
pub type LogSnapshot = Arc<Vec<LogEntry>>;

pub struct LogSynchronizer<G: BackendGateway> {
    gateway: Arc<G>,
    sink: watch::Sender<LogSnapshot>,
    poller: Option<JoinHandle<()>>,
    period: Option<Duration>,
}

impl<G: BackendGateway> LogSynchronizer<G> {
    pub fn new(gateway: Arc<G>, sink: watch::Sender<LogSnapshot>) -> Self {
        Self {
            gateway,
            sink,
            poller: None,
            period: None,
        }
    }

    /// Replace the running poller with one ticking every `period`.
    ///
    /// The first tick comes one full period after the restart.
    pub fn restart(&mut self, period: Duration) {
        self.stop();

        debug!("Log polling every {:?}", period);
        let gateway = Arc::clone(&self.gateway);
        let sink = self.sink.clone();
        self.poller = Some(tokio::spawn(poll_loop(gateway, sink, period)));
        self.period = Some(period);
    }

    pub fn stop(&mut self) {
        if let Some(poller) = self.poller.take() {
            poller.abort();
        }
        self.period = None;
    }

    /// Interval of the running poller, if any
    pub fn period(&self) -> Option<Duration> {
        self.period
    }

    /// One fetch outside the schedule
    pub async fn fetch_now(&self) {
        fetch_into(self.gateway.as_ref(), &self.sink).await;
    }

    /// Clear the backend buffer, then show an empty list right away
    pub async fn clear(&self) {
        match self.gateway.clear_logs().await {
            Ok(()) => {
                self.sink.send_replace(Arc::new(Vec::new()));
            }
            Err(e) => warn!("Failed to clear logs: {}", e),
        }
    }
}

impl<G: BackendGateway> Drop for LogSynchronizer<G> {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn poll_loop<G: BackendGateway>(
    gateway: Arc<G>,
    sink: watch::Sender<LogSnapshot>,
    period: Duration,
) {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        fetch_into(gateway.as_ref(), &sink).await;
    }
}

async fn fetch_into<G: BackendGateway>(gateway: &G, sink: &watch::Sender<LogSnapshot>) {
    match gateway.fetch_logs().await {
        Ok(entries) => {
            sink.send_if_modified(|current| {
                if current.as_slice() == entries.as_slice() {
                    false
                } else {
                    *current = Arc::new(entries);
                    true
                }
            });
        }
        // Best effort: the next tick tries again
        Err(e) => trace!("Log fetch failed: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::LogLevel;
    use crate::gateway::{ConversionWorker, LocalGateway, LogStore, PresetPicker};

    fn setup() -> (
        LogStore,
        LogSynchronizer<LocalGateway<PresetPicker>>,
        watch::Receiver<LogSnapshot>,
    ) {
        let store = LogStore::new(100);
        let gateway = Arc::new(LocalGateway::new(
            PresetPicker::default(),
            store.clone(),
            ConversionWorker::default(),
        ));
        let (tx, rx) = watch::channel(LogSnapshot::default());
        (store, LogSynchronizer::new(gateway, tx), rx)
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_tick_waits_one_period() {
        let (store, mut sync, rx) = setup();
        store.record(LogLevel::Info, "hello");

        sync.restart(Duration::from_millis(100));
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(rx.borrow().is_empty());

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(rx.borrow().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_replaces_cadence() {
        let (store, mut sync, rx) = setup();
        sync.restart(Duration::from_millis(100));
        assert_eq!(sync.period(), Some(Duration::from_millis(100)));

        sync.restart(Duration::from_secs(1));
        assert_eq!(sync.period(), Some(Duration::from_secs(1)));
        store.record(LogLevel::Info, "slow");

        // The fast poller must be gone
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(rx.borrow().is_empty());

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(rx.borrow().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_halts_polling() {
        let (store, mut sync, rx) = setup();
        sync.restart(Duration::from_millis(100));
        sync.stop();
        assert_eq!(sync.period(), None);

        store.record(LogLevel::Info, "unseen");
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(rx.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_now_and_clear() {
        let (store, sync, rx) = setup();
        store.record(LogLevel::Info, "a");
        store.record(LogLevel::Warn, "b");

        sync.fetch_now().await;
        assert_eq!(rx.borrow().len(), 2);
        assert_eq!(rx.borrow()[1].message, "b");

        sync.clear().await;
        assert!(rx.borrow().is_empty());
        assert!(store.is_empty());
    }
}
