//! Time-Related Constants
//!
//! Unit conversions plus the waits, backoffs and timeouts the drivers use.

// ===== TIME UNIT CONVERSIONS =====

/// Milliseconds per second.
pub const MS_PER_SECOND: u64 = 1000;

/// Microseconds per millisecond.
pub const US_PER_MS: u64 = 1000;

/// Microseconds per second.
pub const US_PER_SECOND: u64 = 1_000_000;

// ===== CONVERSION TIMING =====

/// Fixed conservative conversion wait (milliseconds).
///
/// A flat sleep after starting an ADS1115 conversion, ignoring the data rate.
/// Covers every data rate from 16 SPS up; 8 SPS needs 125 ms.
pub const FIXED_CONVERSION_WAIT_MS: u32 = 100;

/// ADS1115 internal oscillator tolerance (percent).
///
/// Source: ADS1115 datasheet, data rate accuracy ±10 %.
pub const OSCILLATOR_TOLERANCE_PCT: u32 = 10;

/// Wake-up time from power-down before a single-shot conversion starts (µs).
pub const CONVERSION_WAKEUP_US: u32 = 100;

// ===== RETRY =====

/// Attempts per register access before giving up.
pub const RETRY_ATTEMPTS: u8 = 5;

/// Pause between attempts (milliseconds).
pub const RETRY_BACKOFF_MS: u32 = 100;

// ===== STARTUP HANDSHAKE =====

/// Default limit for a startup reset poll (milliseconds).
pub const HANDSHAKE_TIMEOUT_MS: u32 = 5000;

/// Interval between reset-status polls (milliseconds).
pub const HANDSHAKE_POLL_INTERVAL_MS: u32 = 50;

// ===== SAMPLING =====

/// Pause between conductivity samples (milliseconds).
pub const TDS_SAMPLE_INTERVAL_MS: u32 = 40;

/// Pause between voltage-rail samples (milliseconds).
pub const RAIL_SAMPLE_INTERVAL_MS: u32 = 10;

/// Default polling cycle period (milliseconds).
pub const DEFAULT_CYCLE_INTERVAL_MS: u64 = 1000;
