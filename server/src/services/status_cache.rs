use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use otstatus_shared::StatusReport;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::services::status_protocol::StatusBackend;
use crate::state::ObservabilityCounters;

#[derive(Debug, Clone)]
pub struct CachedStatus {
    pub report: StatusReport,
    pub json: Arc<Bytes>,
    pub refreshed_at: Instant,
    pub updated_at: DateTime<Utc>,
}

/// Rate-limits TSQP info queries: at most one query in flight, and none while the last
/// reply is younger than `min_interval`.
#[derive(Debug)]
pub struct StatusCache {
    entry: RwLock<Option<CachedStatus>>,
    refresh: Mutex<()>,
    min_interval: Duration,
}

impl StatusCache {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            entry: RwLock::new(None),
            refresh: Mutex::new(()),
            min_interval,
        }
    }

    pub async fn peek(&self) -> Option<CachedStatus> {
        self.entry.read().await.clone()
    }

    async fn fresh(&self) -> Option<CachedStatus> {
        self.entry
            .read()
            .await
            .as_ref()
            .filter(|cached| cached.refreshed_at.elapsed() < self.min_interval)
            .cloned()
    }

    /// Returns the cached reply when fresh. Otherwise queries the game server, unless a
    /// query is already running: then an older reply is served if there is one, and the
    /// caller waits for the running query if there is not.
    pub async fn get(
        &self,
        backend: &dyn StatusBackend,
        counters: &ObservabilityCounters,
    ) -> CachedStatus {
        if let Some(fresh) = self.fresh().await {
            counters.record_status_cache_hit();
            return fresh;
        }

        let _guard = match self.refresh.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                if let Some(stale) = self.peek().await {
                    debug!("status refresh in flight; serving previous reply");
                    counters.record_status_cache_hit();
                    return stale;
                }
                self.refresh.lock().await
            }
        };

        // Whoever held the guard before us may have just refreshed.
        if let Some(fresh) = self.fresh().await {
            counters.record_status_cache_hit();
            return fresh;
        }

        counters.record_status_refresh();
        let report = match backend.query_info().await {
            Ok(report) => report,
            Err(e) => {
                counters.record_status_query_failure();
                warn!(error = %e, "game server status query failed");
                StatusReport::offline(e.to_string())
            }
        };
        let json = match serde_json::to_vec(&report) {
            Ok(json) => Bytes::from(json),
            Err(e) => {
                warn!(error = %e, "failed to serialize status report");
                Bytes::from_static(br#"{"online":false,"error":"serialization failed"}"#)
            }
        };

        let cached = CachedStatus {
            report,
            json: Arc::new(json),
            refreshed_at: Instant::now(),
            updated_at: Utc::now(),
        };
        *self.entry.write().await = Some(cached.clone());
        cached
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use otstatus_shared::{PlayerCounts, PlayersReport, StatusReport};

    use super::StatusCache;
    use crate::services::status_protocol::{QueryFuture, StatusBackend, StatusQueryError};
    use crate::state::ObservabilityCounters;

    /// Reports `players.online == n` on the nth query; queries listed in `failing` fail.
    struct CountingBackend {
        calls: AtomicUsize,
        delay: Duration,
        failing: Vec<usize>,
    }

    impl CountingBackend {
        fn new(delay: Duration) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                delay,
                failing: Vec::new(),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl StatusBackend for CountingBackend {
        fn query_info(&self) -> QueryFuture<'_, StatusReport> {
            Box::pin(async move {
                let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
                if !self.delay.is_zero() {
                    tokio::time::sleep(self.delay).await;
                }
                if self.failing.contains(&n) {
                    return Err(StatusQueryError::EmptyResponse);
                }
                Ok(StatusReport {
                    online: true,
                    players: Some(PlayerCounts {
                        online: n as u32,
                        ..PlayerCounts::default()
                    }),
                    ..StatusReport::default()
                })
            })
        }

        fn query_players(&self) -> QueryFuture<'_, PlayersReport> {
            Box::pin(async { Err(StatusQueryError::EmptyResponse) })
        }
    }

    fn online_of(report: &StatusReport) -> Option<u32> {
        report.players.map(|players| players.online)
    }

    #[tokio::test(start_paused = true)]
    async fn fresh_reply_is_served_from_cache() {
        let cache = StatusCache::new(Duration::from_secs(15));
        let backend = CountingBackend::new(Duration::ZERO);
        let counters = ObservabilityCounters::default();

        let first = cache.get(&backend, &counters).await;
        tokio::time::advance(Duration::from_secs(14)).await;
        let second = cache.get(&backend, &counters).await;

        assert_eq!(backend.calls(), 1);
        assert_eq!(first.json, second.json);
        assert_eq!(counters.snapshot().status_cache_hits_total, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_reply_is_refreshed() {
        let cache = StatusCache::new(Duration::from_secs(15));
        let backend = CountingBackend::new(Duration::ZERO);
        let counters = ObservabilityCounters::default();

        cache.get(&backend, &counters).await;
        tokio::time::advance(Duration::from_secs(15)).await;
        let refreshed = cache.get(&backend, &counters).await;

        assert_eq!(backend.calls(), 2);
        assert_eq!(online_of(&refreshed.report), Some(2));
        assert_eq!(counters.snapshot().status_refreshes_total, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_query_caches_an_offline_report() {
        let cache = StatusCache::new(Duration::from_secs(15));
        let mut backend = CountingBackend::new(Duration::ZERO);
        backend.failing = vec![1];
        let counters = ObservabilityCounters::default();

        let first = cache.get(&backend, &counters).await;
        let second = cache.get(&backend, &counters).await;

        assert_eq!(first.report, StatusReport::offline("Empty response."));
        assert_eq!(
            serde_json::from_slice::<serde_json::Value>(&first.json).expect("valid JSON"),
            serde_json::json!({"online": false, "error": "Empty response."})
        );
        assert_eq!(second.report, first.report);
        assert_eq!(backend.calls(), 1);
        assert_eq!(counters.snapshot().status_query_failures_total, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_cold_requests_share_one_query() {
        let cache = StatusCache::new(Duration::from_secs(15));
        let backend = CountingBackend::new(Duration::from_secs(1));
        let counters = ObservabilityCounters::default();

        let (a, b) = tokio::join!(
            cache.get(&backend, &counters),
            cache.get(&backend, &counters)
        );

        assert_eq!(backend.calls(), 1);
        assert_eq!(online_of(&a.report), Some(1));
        assert_eq!(online_of(&b.report), Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn previous_reply_is_served_while_refreshing() {
        let cache = StatusCache::new(Duration::from_secs(15));
        let backend = CountingBackend::new(Duration::from_secs(1));
        let counters = ObservabilityCounters::default();

        cache.get(&backend, &counters).await;
        tokio::time::advance(Duration::from_secs(20)).await;

        let (refreshing, waiting) = tokio::join!(
            cache.get(&backend, &counters),
            cache.get(&backend, &counters)
        );

        assert_eq!(backend.calls(), 2);
        assert_eq!(online_of(&refreshing.report), Some(2));
        assert_eq!(online_of(&waiting.report), Some(1));
    }

    #[tokio::test]
    async fn zero_interval_always_queries() {
        let cache = StatusCache::new(Duration::ZERO);
        let backend = CountingBackend::new(Duration::ZERO);
        let counters = ObservabilityCounters::default();

        cache.get(&backend, &counters).await;
        cache.get(&backend, &counters).await;

        assert_eq!(backend.calls(), 2);
        assert!(cache.peek().await.is_some());
    }
}
