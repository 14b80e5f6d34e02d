use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::status::StatusPayload;

/// One poll cycle's result as it travels over a page's broadcast channel.
///
/// `seq` is assigned when the cycle starts, so a slow cycle that finishes late carries
/// an older number than the cycles that overtook it.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusEvent {
    pub seq: u64,
    pub fetched_at: DateTime<Utc>,
    pub payload: Arc<StatusPayload>,
}

impl StatusEvent {
    pub fn new(seq: u64, payload: StatusPayload) -> Self {
        Self {
            seq,
            fetched_at: Utc::now(),
            payload: Arc::new(payload),
        }
    }

    pub fn is_newer_than(&self, last_seq: Option<u64>) -> bool {
        last_seq.is_none_or(|last| self.seq >= last)
    }
}

#[cfg(test)]
mod tests {
    use super::StatusEvent;
    use crate::status::OFFLINE;

    #[test]
    fn equal_or_higher_sequence_is_current() {
        let event = StatusEvent::new(4, OFFLINE);

        assert!(event.is_newer_than(None));
        assert!(event.is_newer_than(Some(3)));
        assert!(event.is_newer_than(Some(4)));
        assert!(!event.is_newer_than(Some(5)));
    }
}
