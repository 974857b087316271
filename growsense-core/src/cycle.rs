//! Per-cycle results with partial-failure tolerance
//!
//! A polling cycle reads many values from several devices. One probe failing
//! must not cost the others: each reading's outcome is recorded on its own,
//! the failure is logged with the reading's name, and the cycle carries on.
//!
//! ```rust
//! use growsense_core::{CycleReport, SensorError};
//!
//! let mut report: CycleReport = CycleReport::new();
//! report.measure("tds_ppm", || Ok(801.0))?;
//! report.measure("ph", || Err(SensorError::Domain { reason: "pH raw count must be positive" }))?;
//!
//! assert_eq!(report.value("tds_ppm"), Some(801.0));
//! assert_eq!(report.value("ph"), None);
//! assert_eq!(report.failures().count(), 1);
//! # Ok::<(), SensorError>(())
//! ```

use core::fmt::Display;

use heapless::Vec;

use crate::{
    constants::buffers::MAX_CYCLE_READINGS,
    errors::{SensorError, SensorResult},
};

/// Outcome of one named reading
#[derive(Debug, Clone, PartialEq)]
pub struct Entry<E> {
    /// Column name
    pub name: &'static str,
    /// Value, or why it is missing
    pub outcome: Result<f32, E>,
}

/// Every reading attempted in one cycle, in the order attempted
#[derive(Debug, Clone)]
pub struct CycleReport<E = SensorError> {
    entries: Vec<Entry<E>, MAX_CYCLE_READINGS>,
}

impl<E> Default for CycleReport<E> {
    fn default() -> Self {
        Self { entries: Vec::new() }
    }
}

impl<E: Display> CycleReport<E> {
    /// Empty report
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an outcome, logging it if it failed
    ///
    /// Errs only when the report is already full.
    pub fn record(&mut self, name: &'static str, outcome: Result<f32, E>) -> SensorResult<()> {
        if let Err(err) = &outcome {
            log_error!("{}: {}", name, err);
        }
        self.entries
            .push(Entry { name, outcome })
            .map_err(|_| SensorError::InvalidParameter { what: "too many readings in one cycle" })
    }

    /// Run one reading and record its outcome
    pub fn measure<F>(&mut self, name: &'static str, read: F) -> SensorResult<()>
    where
        F: FnOnce() -> Result<f32, E>,
    {
        self.record(name, read())
    }

    /// Value of a successful reading
    pub fn value(&self, name: &str) -> Option<f32> {
        self.entries
            .iter()
            .find(|entry| entry.name == name)
            .and_then(|entry| entry.outcome.as_ref().ok().copied())
    }

    /// All entries in order
    pub fn entries(&self) -> &[Entry<E>] {
        &self.entries
    }

    /// Column names in order
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|entry| entry.name)
    }

    /// One cell per reading: the value, or `None` where it failed
    pub fn cells(&self) -> impl Iterator<Item = Option<f32>> + '_ {
        self.entries.iter().map(|entry| entry.outcome.as_ref().ok().copied())
    }

    /// Failed readings with their errors
    pub fn failures(&self) -> impl Iterator<Item = (&'static str, &E)> + '_ {
        self.entries
            .iter()
            .filter_map(|entry| entry.outcome.as_ref().err().map(|err| (entry.name, err)))
    }

    /// True when every reading succeeded
    pub fn is_complete(&self) -> bool {
        self.entries.iter().all(|entry| entry.outcome.is_ok())
    }

    /// Number of readings recorded
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing was recorded
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
