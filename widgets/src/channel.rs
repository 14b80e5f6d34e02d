use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use otstatus_shared::StatusEvent;

use crate::dom::lock;

pub type StatusHandler = Arc<dyn Fn(&StatusEvent) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionToken(u64);

/// In-page fan-out of status events.
///
/// `publish` calls every handler registered at that moment, in subscription order,
/// before it returns. Nothing is queued or replayed: a handler registered after a
/// publish only sees later publishes.
#[derive(Clone, Default)]
pub struct BroadcastChannel {
    inner: Arc<ChannelInner>,
}

#[derive(Default)]
struct ChannelInner {
    next_token: AtomicU64,
    subscribers: Mutex<Vec<(SubscriptionToken, StatusHandler)>>,
}

impl BroadcastChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, handler: F) -> SubscriptionToken
    where
        F: Fn(&StatusEvent) + Send + Sync + 'static,
    {
        let token = SubscriptionToken(self.inner.next_token.fetch_add(1, Ordering::Relaxed));
        lock(&self.inner.subscribers).push((token, Arc::new(handler)));
        token
    }

    pub fn unsubscribe(&self, token: SubscriptionToken) -> bool {
        let mut subscribers = lock(&self.inner.subscribers);
        let before = subscribers.len();
        subscribers.retain(|(existing, _)| *existing != token);
        subscribers.len() != before
    }

    /// Deliver `event` to every current subscriber. Returns how many were called.
    pub fn publish(&self, event: &StatusEvent) -> usize {
        // Handlers run outside the lock so they may subscribe or unsubscribe.
        let handlers: Vec<StatusHandler> = lock(&self.inner.subscribers)
            .iter()
            .map(|(_, handler)| Arc::clone(handler))
            .collect();
        for handler in &handlers {
            handler(event);
        }
        handlers.len()
    }

    pub fn subscriber_count(&self) -> usize {
        lock(&self.inner.subscribers).len()
    }
}

impl fmt::Debug for BroadcastChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BroadcastChannel")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}
