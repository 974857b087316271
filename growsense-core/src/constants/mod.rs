//! Constants for growsense Core
//!
//! Centralised numeric values with their source. Register maps live next to
//! the driver that uses them; what is collected here are the values shared
//! across modules or tuned per deployment.
//!
//! ## Organization
//!
//! - **Sensors**: bus addresses and reference calibration values
//! - **Time**: unit conversions, waits, backoffs and timeouts
//! - **Buffers**: fixed capacities for no-alloc collections
//!
//! ## Usage Guidelines
//!
//! 1. Use these constants instead of magic numbers
//! 2. Note the probe or datasheet a calibration value came from
//! 3. Include units in names

/// Bus addresses and reference calibration values for the deployed probes.
pub mod sensors;

/// Time-related constants for waits, backoffs and timeouts.
pub mod time;

/// Buffer capacities for embedded-friendly collections.
pub mod buffers;

// Re-export commonly used constants for convenience
pub use sensors::{
    ADS1115_PROBE_ADDRESS, ADS1115_RAIL_ADDRESS, BME280_ADDRESS, LTR559_ADDRESS, ZERO2GO_ADDRESS,
};

pub use time::{
    MS_PER_SECOND, US_PER_SECOND, RETRY_BACKOFF_MS, RETRY_ATTEMPTS, HANDSHAKE_TIMEOUT_MS,
};

pub use buffers::{MAX_SAMPLES, MAX_CYCLE_READINGS, MAX_CALIBRATION_MODELS};
