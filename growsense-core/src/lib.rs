//! Core acquisition and calibration engine for growsense
//!
//! Polls I2C sensors on a single-board computer and turns raw register values
//! into physical units. Every device here follows the same pattern:
//! configure register → wait → read register → decode → scale.
//!
//! Key constraints:
//! - `no_std` capable (disable the default `std` feature)
//! - No heap allocation in the acquisition path
//! - One acquisition in flight per device handle
//!
//! ```no_run
//! # fn demo<B: growsense_core::BusTransport, D: embedded_hal::delay::DelayNs>(bus: B, delay: D)
//! #     -> growsense_core::SensorResult<()> {
//! use growsense_core::ads1115::{Ads1115, ADS1115_DEFAULT_ADDRESS};
//! use growsense_core::codec::{Channel, ChannelConfig, DataRate, Gain};
//!
//! let mut adc = Ads1115::new(bus, delay, ADS1115_DEFAULT_ADDRESS);
//! let config = ChannelConfig::single_shot(Channel::A3, Gain::One, DataRate::Sps128);
//!
//! let volts = adc.read_voltage(&config)?;
//! # let _ = volts;
//! # Ok(())
//! # }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

// Optional logging: compiles away when the `log` facade is not enabled
#[cfg(feature = "log")]
macro_rules! log_warn {
    ($($arg:tt)*) => { log::warn!($($arg)*) };
}

#[cfg(not(feature = "log"))]
macro_rules! log_warn {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "log")]
macro_rules! log_error {
    ($($arg:tt)*) => { log::error!($($arg)*) };
}

#[cfg(not(feature = "log"))]
macro_rules! log_error {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "log")]
macro_rules! log_debug {
    ($($arg:tt)*) => { log::debug!($($arg)*) };
}

#[cfg(not(feature = "log"))]
macro_rules! log_debug {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "log")]
macro_rules! log_trace {
    ($($arg:tt)*) => { log::trace!($($arg)*) };
}

#[cfg(not(feature = "log"))]
macro_rules! log_trace {
    ($($arg:tt)*) => {};
}

pub mod ads1115;
pub mod bme280;
pub mod buffer;
pub mod calibration;
pub mod codec;
pub mod constants;
pub mod cycle;
pub mod errors;
pub mod hal;
pub mod ltr559;
pub mod retry;
pub mod sampling;
#[cfg(feature = "std")]
pub mod shared;
pub mod time;
pub mod traits;
pub mod zero2go;

// Public API
pub use errors::{BusOp, SensorError, SensorResult, TransportError};
pub use traits::BusTransport;
pub use calibration::{CalibratedReading, CalibrationEngine, CalibrationModel, SensorKind, Unit};
pub use codec::{Channel, ChannelConfig, DataRate, Gain, Mode};
pub use cycle::CycleReport;
pub use retry::{Retry, RetryingBus};
pub use sampling::{Filter, SamplePlan};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
