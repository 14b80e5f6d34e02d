use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use otstatus_shared::StatusEvent;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::channel::BroadcastChannel;
use crate::fetcher::StatusSource;

/// Repeating fetch-and-publish loop owned by a page's elected provider.
#[derive(Clone)]
pub struct StatusPoller {
    source: Arc<dyn StatusSource>,
    channel: BroadcastChannel,
    last_seq: Arc<AtomicU64>,
}

impl StatusPoller {
    pub fn new(source: Arc<dyn StatusSource>, channel: BroadcastChannel) -> Self {
        Self {
            source,
            channel,
            last_seq: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Run one cycle immediately, then one per `interval` until the task is aborted.
    ///
    /// Each cycle runs on its own task, so a hung fetch never holds back the next tick.
    pub fn start(self, endpoint: String, interval: Duration) -> JoinHandle<()> {
        tokio::spawn(self.run(endpoint, interval))
    }

    async fn run(self, endpoint: String, interval: Duration) {
        let interval = interval.max(Duration::from_millis(1));
        info!(
            endpoint = %endpoint,
            interval_ms = interval.as_millis() as u64,
            "status poller started"
        );

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;

            let seq = self.next_seq();
            let cycle = self.clone();
            let endpoint = endpoint.clone();
            tokio::spawn(async move {
                cycle.run_cycle(seq, &endpoint).await;
            });
        }
    }

    /// Fetch once and publish the result, whatever it is.
    pub async fn poll_once(&self, endpoint: &str) -> StatusEvent {
        let seq = self.next_seq();
        self.run_cycle(seq, endpoint).await
    }

    fn next_seq(&self) -> u64 {
        self.last_seq.fetch_add(1, Ordering::Relaxed) + 1
    }

    async fn run_cycle(&self, seq: u64, endpoint: &str) -> StatusEvent {
        let payload = self.source.fetch(endpoint).await;
        let event = StatusEvent::new(seq, payload);
        let delivered = self.channel.publish(&event);
        debug!(
            seq,
            online = event.payload.online,
            delivered,
            "status cycle published"
        );
        event
    }
}
