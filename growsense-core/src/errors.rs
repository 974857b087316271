//! Error Types for Acquisition and Calibration Failures
//!
//! ## Design Philosophy
//!
//! Errors are shaped for embedded targets first:
//!
//! 1. **Small Size**: every variant is a handful of bytes. Errors are returned
//!    from every register access and collected per polling cycle.
//!
//! 2. **No Heap Allocation**: payloads are integers and `&'static str`.
//!
//! 3. **Copy Semantics**: errors are `Copy` so a cycle report can hold them
//!    next to the readings that did succeed.
//!
//! 4. **Actionable Information**: bus errors name the register and the
//!    direction of the transfer that failed.
//!
//! ## Error Categories
//!
//! ### Configuration faults (never retried)
//! - `InvalidParameter`: channel, gain, data rate or sample count outside its
//!   valid set. Detected before any bus I/O.
//! - `Domain`: calibration math undefined for the input (log of a
//!   non-positive resistance, zero voltage).
//!
//! ### Bus faults
//! - `Transport`: a single failed transfer. Propagated as-is unless the device
//!   is wrapped in a [`crate::retry::RetryingBus`].
//! - `PersistentTransport`: the retry budget ran out.
//!
//! ### Device faults
//! - `DeviceNotFound`: identity register did not match at startup.
//! - `Timeout`: a startup handshake poll did not finish in time.
//!
//! ## Error Handling Strategy
//!
//! ```rust
//! use growsense_core::SensorError;
//!
//! fn log_failure(name: &str, err: SensorError) {
//!     match err {
//!         SensorError::Transport { .. } => {
//!             // Transient: the next cycle will try again
//!         }
//!         SensorError::InvalidParameter { .. } | SensorError::Domain { .. } => {
//!             // Configuration bug: fix the config, retrying will not help
//!         }
//!         _ => {
//!             // Device missing or wedged
//!         }
//!     }
//! }
//! ```

use core::fmt;

use thiserror_no_std::Error;

/// Result type for acquisition and calibration operations
pub type SensorResult<T> = Result<T, SensorError>;

/// Direction of a bus transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BusOp {
    /// Register read
    Read,
    /// Register write
    Write,
}

impl fmt::Display for BusOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BusOp::Read => f.write_str("read"),
            BusOp::Write => f.write_str("write"),
        }
    }
}

/// Failure reported by a bus transport for a single transfer
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// The addressed device did not acknowledge
    #[error("no acknowledge")]
    NoAcknowledge,
    /// Another controller won arbitration
    #[error("arbitration lost")]
    ArbitrationLoss,
    /// Misplaced start/stop or similar bus-level fault
    #[error("bus error")]
    Bus,
    /// Data was not read out in time
    #[error("overrun")]
    Overrun,
    /// Anything the transport cannot classify
    #[error("transport failure")]
    Other,
    /// A retrying transport gave up
    #[error("gave up after {attempts} attempts")]
    RetriesExhausted {
        /// Attempts made
        attempts: u8,
    },
}

/// Acquisition errors - kept small for embedded use
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum SensorError {
    /// Channel, gain, data rate or other argument outside its valid set
    #[error("Invalid parameter: {what}")]
    InvalidParameter {
        /// Which argument was rejected
        what: &'static str,
    },

    /// A single bus transfer failed
    #[error("Bus {op} of register {register:#04x} failed: {cause}")]
    Transport {
        /// Register address being accessed
        register: u8,
        /// Transfer direction
        op: BusOp,
        /// What the transport reported
        cause: TransportError,
    },

    /// Retry budget exhausted on a register access
    #[error("Bus {op} of register {register:#04x} still failing after {attempts} attempts")]
    PersistentTransport {
        /// Register address being accessed
        register: u8,
        /// Transfer direction
        op: BusOp,
        /// Attempts made before giving up
        attempts: u8,
    },

    /// Identity register mismatch during startup
    #[error("Device not found: part id {part_id:#04x}")]
    DeviceNotFound {
        /// Value actually read from the identity register
        part_id: u8,
    },

    /// Startup handshake did not complete in time
    #[error("Timed out after {waited_ms} ms waiting for {what}")]
    Timeout {
        /// What the driver was waiting for
        what: &'static str,
        /// Time spent polling
        waited_ms: u32,
    },

    /// Calibration math undefined for this input
    #[error("Calibration domain error: {reason}")]
    Domain {
        /// Why the input was rejected
        reason: &'static str,
    },
}

impl SensorError {
    /// Only single transient bus failures are worth retrying
    pub fn is_retryable(&self) -> bool {
        matches!(self, SensorError::Transport { .. })
    }

    /// Attach the register and direction to a transport failure
    ///
    /// An exhausted retry budget becomes [`SensorError::PersistentTransport`].
    pub fn transport(register: u8, op: BusOp, cause: TransportError) -> Self {
        match cause {
            TransportError::RetriesExhausted { attempts } => {
                SensorError::PersistentTransport { register, op, attempts }
            }
            cause => SensorError::Transport { register, op, cause },
        }
    }

    pub(crate) fn read(register: u8, cause: TransportError) -> Self {
        Self::transport(register, BusOp::Read, cause)
    }

    pub(crate) fn write(register: u8, cause: TransportError) -> Self {
        Self::transport(register, BusOp::Write, cause)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for SensorError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::InvalidParameter { what } =>
                defmt::write!(fmt, "Invalid parameter: {}", what),
            Self::Transport { register, op, .. } => match op {
                BusOp::Read => defmt::write!(fmt, "Bus read of {=u8:#x} failed", register),
                BusOp::Write => defmt::write!(fmt, "Bus write of {=u8:#x} failed", register),
            },
            Self::PersistentTransport { register, attempts, .. } =>
                defmt::write!(fmt, "Register {=u8:#x} failing after {} attempts", register, attempts),
            Self::DeviceNotFound { part_id } =>
                defmt::write!(fmt, "Device not found: part id {=u8:#x}", part_id),
            Self::Timeout { what, waited_ms } =>
                defmt::write!(fmt, "Timeout after {} ms waiting for {}", waited_ms, what),
            Self::Domain { reason } =>
                defmt::write!(fmt, "Calibration domain error: {}", reason),
        }
    }
}
