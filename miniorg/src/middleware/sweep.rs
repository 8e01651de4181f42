//! Pacing for housekeeping passes over in-memory middleware state

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Grants at most one sweep per interval across all request tasks
#[derive(Debug)]
pub(crate) struct Sweep {
    started: Instant,
    interval_ms: u64,
    last_ms: AtomicU64,
}

impl Sweep {
    pub(crate) fn new(interval: Duration) -> Self {
        Self {
            started: Instant::now(),
            interval_ms: millis(interval),
            last_ms: AtomicU64::new(0),
        }
    }

    /// True for exactly one caller once the interval has elapsed
    pub(crate) fn due(&self) -> bool {
        let now = millis(self.started.elapsed());
        let last = self.last_ms.load(Ordering::Acquire);
        now.saturating_sub(last) >= self.interval_ms
            && self
                .last_ms
                .compare_exchange(last, now, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
