//! NTC thermistor in a voltage divider
//!
//! ```text
//!   Vs ──[ Rseries ]──┬──[ NTC ]── GND
//!                     └── ADC
//! ```
//!
//! The divider voltage gives the thermistor resistance, and the
//! Steinhart-Hart equation gives temperature from resistance:
//! `1/T = A + B·ln(R) + C·ln(R)³`.

use libm::log;

use super::{Calibrate, CalibratedReading, LinearScale, Unit};
use crate::{
    codec::Gain,
    constants::sensors::{
        THERMISTOR_A, THERMISTOR_B, THERMISTOR_C, THERMISTOR_CORRECTION_C, THERMISTOR_SERIES_OHMS,
        THERMISTOR_SUPPLY_VOLTS,
    },
    errors::{SensorError, SensorResult},
};

const KELVIN_OFFSET: f64 = 273.15;

/// Steinhart-Hart coefficients
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SteinhartHart {
    /// Constant term
    pub a: f64,
    /// `ln(R)` term
    pub b: f64,
    /// `ln(R)³` term
    pub c: f64,
}

impl SteinhartHart {
    /// Temperature in kelvin for a resistance in ohms
    pub fn kelvin(&self, ohms: f64) -> SensorResult<f64> {
        if ohms.is_nan() || ohms <= 0.0 {
            return Err(SensorError::Domain { reason: "thermistor resistance must be positive" });
        }
        let ln_r = log(ohms);
        let inverse = self.a + self.b * ln_r + self.c * ln_r * ln_r * ln_r;
        if !inverse.is_finite() || inverse <= 0.0 {
            return Err(SensorError::Domain { reason: "Steinhart-Hart gave a non-positive temperature" });
        }
        Ok(1.0 / inverse)
    }
}

/// Divider plus coefficients plus a fixed correction
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Thermistor {
    /// Steinhart-Hart coefficients
    pub coefficients: SteinhartHart,
    /// Series resistor (Ω)
    pub series_ohms: f64,
    /// Divider supply (V)
    pub supply_volts: f64,
    /// Offset added after conversion (°C)
    pub correction_c: f64,
    /// Raw count to divider voltage
    pub scale: LinearScale,
}

impl Thermistor {
    /// The rig's 10k NTC on a 3.17 V divider, read at gain 1
    pub fn reference() -> Self {
        Self {
            coefficients: SteinhartHart {
                a: THERMISTOR_A,
                b: THERMISTOR_B,
                c: THERMISTOR_C,
            },
            series_ohms: THERMISTOR_SERIES_OHMS,
            supply_volts: THERMISTOR_SUPPLY_VOLTS,
            correction_c: THERMISTOR_CORRECTION_C,
            scale: LinearScale::for_gain(Gain::One, 1.0),
        }
    }

    /// Thermistor resistance for a divider voltage
    ///
    /// `R = Rseries · (Vs / V − 1)`; the voltage must be in `(0, Vs)`.
    pub fn resistance(&self, volts: f64) -> SensorResult<f64> {
        if volts.is_nan() || volts <= 0.0 {
            return Err(SensorError::Domain { reason: "thermistor voltage must be positive" });
        }
        let ratio = self.supply_volts / volts - 1.0;
        if ratio <= 0.0 {
            return Err(SensorError::Domain { reason: "thermistor voltage at or above supply" });
        }
        Ok(self.series_ohms * ratio)
    }

    /// Corrected temperature for a divider voltage
    pub fn celsius(&self, volts: f64) -> SensorResult<f32> {
        let kelvin = self.coefficients.kelvin(self.resistance(volts)?)?;
        Ok((kelvin - KELVIN_OFFSET + self.correction_c) as f32)
    }
}

impl Calibrate for Thermistor {
    fn calibrate(&self, raw: f32) -> SensorResult<CalibratedReading> {
        let volts = self.scale.volts(raw) as f64;
        Ok(CalibratedReading::new(self.celsius(volts)?, Unit::Celsius))
    }
}

/// °C → °F
pub fn celsius_to_fahrenheit(celsius: f32) -> f32 {
    celsius * 9.0 / 5.0 + 32.0
}
