//! Common time/period helpers for feeder_core.

use std::time::Duration;

/// Number of microseconds in one second.
pub const MICROS_PER_SEC: u64 = 1_000_000;
/// Number of milliseconds in one second.
pub const MILLIS_PER_SEC: u64 = 1_000;

/// Compute the period in microseconds for a given rate in Hz.
/// - Clamps `hz` to at least 1 to avoid division by zero.
/// - Ensures result is at least 1 microsecond.
#[inline]
pub fn period_us(hz: u32) -> u64 {
    (MICROS_PER_SEC / u64::from(hz.max(1))).max(1)
}

/// Compute the period in milliseconds for a given rate in Hz.
/// - Clamps `hz` to at least 1 to avoid division by zero.
/// - Ensures result is at least 1 millisecond.
#[inline]
pub fn period_ms(hz: u32) -> u64 {
    (MILLIS_PER_SEC / u64::from(hz.max(1))).max(1)
}

/// A `Duration` as whole microseconds, saturating at `u64::MAX`.
#[inline]
pub fn duration_us(d: Duration) -> u64 {
    (d.as_micros().min(u128::from(u64::MAX))) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn period_us_clamps_rate_and_result() {
        assert_eq!(period_us(0), MICROS_PER_SEC);
        assert_eq!(period_us(100), 10_000);
        assert_eq!(period_us(u32::MAX), 1);
    }

    #[test]
    fn period_ms_clamps_rate_and_result() {
        assert_eq!(period_ms(0), MILLIS_PER_SEC);
        assert_eq!(period_ms(50), 20);
        assert_eq!(period_ms(10_000), 1);
    }

    #[test]
    fn duration_us_converts() {
        assert_eq!(duration_us(Duration::from_millis(5)), 5_000);
        assert_eq!(duration_us(Duration::ZERO), 0);
    }
}
