//! Timing helpers for conversions and startup polls
//!
//! Drivers have no wall clock: on a bare MCU there may not be one, and on
//! Linux it is not needed. Time is accounted as the sum of the delays the
//! driver itself issued, which is exact enough for conversion waits and
//! coarse handshake timeouts.

use embedded_hal::delay::DelayNs;

use crate::codec::DataRate;
use crate::constants::time::{CONVERSION_WAKEUP_US, OSCILLATOR_TOLERANCE_PCT, US_PER_SECOND};

/// Minimum time to wait for one conversion at `rate`, in microseconds
///
/// Nominal period `1 / rate`, stretched by the oscillator tolerance, plus
/// the wake-up time from power-down.
pub fn conversion_time_us(rate: DataRate) -> u32 {
    let nominal = (US_PER_SECOND / rate.samples_per_second() as u64) as u32;
    // Round the tolerance margin up so the wait never undershoots
    let margin = (nominal * OSCILLATOR_TOLERANCE_PCT).div_ceil(100);
    nominal + margin + CONVERSION_WAKEUP_US
}

/// Time budget for a status poll
///
/// Starts at zero and advances by `interval_ms` per [`PollBudget::wait`].
#[derive(Debug, Clone, Copy)]
pub struct PollBudget {
    limit_ms: u32,
    interval_ms: u32,
    elapsed_ms: u32,
}

impl PollBudget {
    /// Budget of `limit_ms`, polled every `interval_ms`
    pub fn new(limit_ms: u32, interval_ms: u32) -> Self {
        Self {
            limit_ms,
            interval_ms: interval_ms.max(1),
            elapsed_ms: 0,
        }
    }

    /// Time spent waiting so far
    pub fn elapsed_ms(&self) -> u32 {
        self.elapsed_ms
    }

    /// True once the budget is used up
    pub fn exhausted(&self) -> bool {
        self.elapsed_ms >= self.limit_ms
    }

    /// Sleep one poll interval and account for it
    pub fn wait<D: DelayNs>(&mut self, delay: &mut D) {
        delay.delay_ms(self.interval_ms);
        self.elapsed_ms = self.elapsed_ms.saturating_add(self.interval_ms);
    }
}
