//! CPU heat compensation for the board-mounted air sensor
//!
//! A BME280 soldered next to the SoC reads high by an amount that tracks CPU
//! temperature. The correction pulls the reading away from a smoothed CPU
//! temperature: `compensated = raw − (cpu_avg − raw) / factor`.

use crate::{
    buffer::RollingWindow,
    constants::{buffers::CPU_TEMP_WINDOW, sensors::CPU_COMPENSATION_FACTOR},
    errors::{SensorError, SensorResult},
};

/// Smoothed CPU temperature and compensation factor
#[derive(Debug, Clone)]
pub struct CpuDriftCompensator {
    cpu: RollingWindow<CPU_TEMP_WINDOW>,
    factor: f32,
}

impl CpuDriftCompensator {
    /// Seed the window with the first CPU reading
    pub fn new(initial_cpu_c: f32, factor: f32) -> SensorResult<Self> {
        if !factor.is_finite() || factor == 0.0 {
            return Err(SensorError::InvalidParameter { what: "compensation factor must be finite and non-zero" });
        }
        Ok(Self {
            cpu: RollingWindow::filled(initial_cpu_c),
            factor,
        })
    }

    /// Compensator with the rig's tuned factor
    pub fn with_default_factor(initial_cpu_c: f32) -> SensorResult<Self> {
        Self::new(initial_cpu_c, CPU_COMPENSATION_FACTOR)
    }

    /// Smoothed CPU temperature
    pub fn cpu_average(&self) -> f32 {
        self.cpu.mean().unwrap_or_default()
    }

    /// Record a CPU reading and correct `raw_c` against the new average
    pub fn compensate(&mut self, cpu_c: f32, raw_c: f32) -> f32 {
        self.cpu.push(cpu_c);
        let average = self.cpu_average();
        raw_c - (average - raw_c) / self.factor
    }
}
