use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use chrono::{DateTime, Local, TimeZone};
use otstatus_shared::{PlayerCounts, ServerDetails, StatusPayload};

use crate::dom::lock;
use crate::fetcher::{FetchFuture, StatusSource};

/// Status source that replays queued payloads (optionally after a delay), then repeats
/// a fallback payload forever.
pub(crate) struct ScriptedSource {
    queue: Mutex<VecDeque<(Duration, StatusPayload)>>,
    fallback: StatusPayload,
    calls: AtomicUsize,
    endpoints: Mutex<Vec<String>>,
}

impl ScriptedSource {
    pub(crate) fn repeating(fallback: StatusPayload) -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            fallback,
            calls: AtomicUsize::new(0),
            endpoints: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn then_after(self, delay: Duration, payload: StatusPayload) -> Self {
        lock(&self.queue).push_back((delay, payload));
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn endpoints(&self) -> Vec<String> {
        lock(&self.endpoints).clone()
    }
}

impl StatusSource for ScriptedSource {
    fn fetch<'a>(&'a self, endpoint: &'a str) -> FetchFuture<'a> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            lock(&self.endpoints).push(endpoint.to_string());
            let next = lock(&self.queue).pop_front();
            match next {
                Some((delay, payload)) => {
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    payload
                }
                None => self.fallback.clone(),
            }
        })
    }
}

pub(crate) fn online_payload(online: u32, peak: u32, uptime_sec: u64) -> StatusPayload {
    StatusPayload {
        online: true,
        players: PlayerCounts {
            online,
            peak,
            max: 100,
        },
        server: ServerDetails {
            uptime_sec,
            ..ServerDetails::default()
        },
        ..StatusPayload::default()
    }
}

pub(crate) fn fixed_clock() -> DateTime<Local> {
    Local
        .with_ymd_and_hms(2026, 10, 16, 12, 30, 5)
        .earliest()
        .expect("fixed local time should exist")
}
