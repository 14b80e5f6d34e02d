use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Page-wide "a status provider is active" flag.
///
/// Clones share one flag. The flag goes from unset to set exactly once and is never
/// reset, so leadership is not handed off if the provider's widget goes away.
#[derive(Debug, Clone, Default)]
pub struct ElectionFlag {
    active: Arc<AtomicBool>,
}

impl ElectionFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` for exactly one caller across all clones of this flag.
    pub fn try_become_provider(&self) -> bool {
        self.active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn is_provider_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}
