use std::time::{Duration, Instant};

/// Time source for the scan loop, debouncers, hold timers and LED animations.
///
/// Everything time-dependent in the pad takes a `Clock` so a trace can be
/// replayed on simulated time and produce the same actions as on hardware.
pub trait Clock {
    fn now(&self) -> Instant;

    /// Block (or pretend to) for `d`.
    fn sleep(&self, d: Duration);

    /// Time elapsed since `marker`, zero if `marker` lies in the future.
    fn elapsed_since(&self, marker: Instant) -> Duration {
        self.now().saturating_duration_since(marker)
    }
}

/// Wall clock backed by `Instant::now` and `thread::sleep`.
#[derive(Debug, Default, Clone, Copy)]
pub struct MonotonicClock;

impl MonotonicClock {
    #[inline]
    pub fn new() -> Self {
        Self
    }
}

impl Clock for MonotonicClock {
    #[inline]
    fn now(&self) -> Instant {
        Instant::now()
    }

    #[inline]
    fn sleep(&self, d: Duration) {
        if !d.is_zero() {
            std::thread::sleep(d);
        }
    }
}

#[cfg(any(test, feature = "test-clock"))]
pub mod test_clock {
    use super::Clock;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::time::{Duration, Instant};

    /// Simulated clock: time stands still until advanced, and `sleep`
    /// advances it instead of blocking.
    ///
    /// Clones share one timeline, so a test keeps a handle while the pad
    /// owns another.
    #[derive(Debug, Clone)]
    pub struct ManualClock {
        origin: Instant,
        offset_us: Arc<AtomicU64>,
    }

    impl Default for ManualClock {
        fn default() -> Self {
            Self::new()
        }
    }

    impl ManualClock {
        pub fn new() -> Self {
            Self {
                origin: Instant::now(),
                offset_us: Arc::new(AtomicU64::new(0)),
            }
        }

        pub fn advance(&self, d: Duration) {
            let us = u64::try_from(d.as_micros()).unwrap_or(u64::MAX);
            // fetch_update with saturation: Some(..) is always returned
            let _ = self
                .offset_us
                .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |cur| {
                    Some(cur.saturating_add(us))
                });
        }

        pub fn advance_ms(&self, ms: u64) {
            self.advance(Duration::from_millis(ms));
        }

        /// Simulated time since the clock was created.
        pub fn offset(&self) -> Duration {
            Duration::from_micros(self.offset_us.load(Ordering::Relaxed))
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> Instant {
            self.origin + self.offset()
        }

        fn sleep(&self, d: Duration) {
            self.advance(d);
        }
    }
}
