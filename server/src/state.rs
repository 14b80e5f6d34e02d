use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::config::ot_status_min_interval;
use crate::services::status_cache::StatusCache;
use crate::services::status_protocol::StatusBackend;

#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<dyn StatusBackend>,
    /// Last TSQP info reply, pre-serialized for `/server_status/`.
    pub status_cache: Arc<StatusCache>,
    pub observability: Arc<ObservabilityCounters>,
}

impl AppState {
    pub fn new(backend: Arc<dyn StatusBackend>) -> Self {
        Self::with_min_interval(backend, ot_status_min_interval())
    }

    pub fn with_min_interval(backend: Arc<dyn StatusBackend>, min_interval: Duration) -> Self {
        Self {
            backend,
            status_cache: Arc::new(StatusCache::new(min_interval)),
            observability: Arc::new(ObservabilityCounters::default()),
        }
    }
}

#[derive(Debug, Default)]
pub struct ObservabilityCounters {
    status_requests_total: AtomicU64,
    status_cache_hits_total: AtomicU64,
    status_refreshes_total: AtomicU64,
    status_query_failures_total: AtomicU64,
    players_requests_total: AtomicU64,
    players_query_failures_total: AtomicU64,
}

#[derive(Debug, Clone, Copy)]
pub struct ObservabilitySnapshot {
    pub status_requests_total: u64,
    pub status_cache_hits_total: u64,
    pub status_refreshes_total: u64,
    pub status_query_failures_total: u64,
    pub players_requests_total: u64,
    pub players_query_failures_total: u64,
}

impl ObservabilityCounters {
    pub fn snapshot(&self) -> ObservabilitySnapshot {
        ObservabilitySnapshot {
            status_requests_total: self.status_requests_total.load(Ordering::Relaxed),
            status_cache_hits_total: self.status_cache_hits_total.load(Ordering::Relaxed),
            status_refreshes_total: self.status_refreshes_total.load(Ordering::Relaxed),
            status_query_failures_total: self.status_query_failures_total.load(Ordering::Relaxed),
            players_requests_total: self.players_requests_total.load(Ordering::Relaxed),
            players_query_failures_total: self
                .players_query_failures_total
                .load(Ordering::Relaxed),
        }
    }

    pub fn record_status_request(&self) {
        self.status_requests_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_status_cache_hit(&self) {
        self.status_cache_hits_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_status_refresh(&self) {
        self.status_refreshes_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_status_query_failure(&self) {
        self.status_query_failures_total
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_players_request(&self) {
        self.players_requests_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_players_query_failure(&self) {
        self.players_query_failures_total
            .fetch_add(1, Ordering::Relaxed);
    }
}
