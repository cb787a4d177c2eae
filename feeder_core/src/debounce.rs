//! One-shot suppression window over raw button edges.

use crate::sched::Scheduler;
use crate::util::duration_us;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Converts a bouncing contact into one logical edge per press: the first
/// edge is admitted and arms a quiet window; edges inside the window are
/// dropped on arrival, not queued. A scheduler one-shot disarms the guard
/// when the window expires. The fixed minimum recognition interval is the
/// accepted cost of the suppression.
pub struct DebounceGuard {
    window: Duration,
    inhibited: Arc<AtomicBool>,
}

impl DebounceGuard {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            inhibited: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Admit or drop an edge arriving at `now_us`. Admission arms the quiet
    /// window on `sched`.
    pub fn admit(&mut self, sched: &mut Scheduler, now_us: u64) -> bool {
        if self.inhibited.swap(true, Ordering::AcqRel) {
            return false;
        }
        let inhibited = Arc::clone(&self.inhibited);
        sched.attach_oneshot(now_us, duration_us(self.window), move || {
            inhibited.store(false, Ordering::Release);
        });
        true
    }

    /// Whether the guard is currently inside its quiet window.
    pub fn is_inhibited(&self) -> bool {
        self.inhibited.load(Ordering::Acquire)
    }
}

impl core::fmt::Debug for DebounceGuard {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DebounceGuard")
            .field("window", &self.window)
            .field("inhibited", &self.is_inhibited())
            .finish()
    }
}
