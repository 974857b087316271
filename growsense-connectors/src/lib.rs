//! Host-Side Connectors
//!
//! ## Overview
//!
//! Everything growsense touches outside the I2C sensors themselves, on a
//! Raspberry Pi class host:
//!
//! | Module        | Talks to                                   |
//! |---------------|--------------------------------------------|
//! | [`csv_sink`]  | append-only CSV log, one row per cycle     |
//! | [`relay`]     | 8-channel relay board on GPIO lines        |
//! | [`cpu_temp`]  | SoC temperature from the thermal sysfs     |
//! | [`rail`]      | `vcgencmd` supply rail voltages            |
//! | [`linux`]     | `/dev/i2c-N` and sysfs GPIO (feature `linux`) |
//!
//! ## Failure Model
//!
//! Connectors report failures as [`ConnectorError`] and never panic. The
//! polling loop treats a failed probe like a failed sensor: the cell stays
//! empty and the next cycle tries again.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use growsense_connectors::{csv_sink::CsvSink, ReadingSink};
//! use growsense_core::CycleReport;
//!
//! let mut sink = CsvSink::open("sensor_data.csv", &["tds_ppm", "ph"])?;
//!
//! let mut report: CycleReport = CycleReport::new();
//! report.record("tds_ppm", Ok(801.0))?;
//! report.record("ph", Ok(6.5))?;
//! sink.write_cycle(chrono::Local::now().naive_local(), &report)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod cpu_temp;
pub mod csv_sink;
#[cfg(feature = "linux")]
pub mod linux;
pub mod rail;
pub mod relay;

use core::fmt::Display;

use chrono::NaiveDateTime;
use growsense_core::CycleReport;
use thiserror::Error;

/// Common connector errors
#[derive(Debug, Error)]
pub enum ConnectorError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid relay channel {0} (expected 1-8)")]
    InvalidChannel(u8),

    #[error("Pin error: {0}")]
    Pin(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result alias for connector operations
pub type ConnectorResult<T> = Result<T, ConnectorError>;

/// Destination for one row of readings per polling cycle
pub trait ReadingSink {
    /// Persist a cycle's readings, stamped with `timestamp`
    fn write_cycle<E: Display>(&mut self, timestamp: NaiveDateTime, report: &CycleReport<E>) -> ConnectorResult<()>;

    /// Push buffered rows to storage
    fn flush(&mut self) -> ConnectorResult<()>;
}
