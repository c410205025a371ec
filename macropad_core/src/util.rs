//! Scan timing helpers.

use std::time::Duration;

/// Time between scans at `hz`, never shorter than 1 µs.
///
/// `hz == 0` is rejected by config validation; here it paces like 1 Hz.
#[inline]
pub fn scan_period(hz: u32) -> Duration {
    Duration::from_micros((1_000_000 / u64::from(hz.max(1))).max(1))
}

/// Whole scans that elapse during `window` at `hz`, rounded up.
///
/// Used to size scan budgets for delays given in milliseconds.
pub fn scans_covering(window: Duration, hz: u32) -> u64 {
    let period = scan_period(hz).as_micros();
    let window = window.as_micros();
    u64::try_from(window.div_ceil(period)).unwrap_or(u64::MAX)
}
