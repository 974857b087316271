//! Conductivity (TDS) probe curve
//!
//! The probe output voltage maps to dissolved solids through a cubic fit
//! supplied with the sensor, after compensating the voltage for water
//! temperature (2 % per °C around 25 °C).

use super::{Calibrate, CalibratedReading, LinearScale, Unit};
use crate::{
    constants::sensors::TDS_DEFAULT_TEMP_C,
    errors::{SensorError, SensorResult},
};

const CUBIC: f32 = 133.42;
const QUADRATIC: f32 = 255.86;
const LINEAR: f32 = 857.39;
const TDS_FACTOR: f32 = 0.5;
const TEMP_COEFFICIENT: f32 = 0.02;
const REFERENCE_TEMP_C: f32 = 25.0;

/// Raw count → volts → temperature-compensated ppm
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TdsCurve {
    scale: LinearScale,
    temperature_c: f32,
}

impl TdsCurve {
    /// Curve with a custom voltage scaling, at 25 °C
    pub fn new(scale: LinearScale) -> Self {
        Self {
            scale,
            temperature_c: TDS_DEFAULT_TEMP_C,
        }
    }

    /// 5.15 V / 32767 scaling at 25 °C
    pub fn reference() -> Self {
        Self::new(LinearScale::tds_reference())
    }

    /// Water temperature used for compensation
    pub fn temperature_c(&self) -> f32 {
        self.temperature_c
    }

    /// Update the water temperature
    pub fn set_temperature_c(&mut self, celsius: f32) {
        self.temperature_c = celsius;
    }

    /// Dissolved solids for a probe voltage at `temperature_c`
    pub fn ppm(&self, volts: f32, temperature_c: f32) -> SensorResult<f32> {
        let k = 1.0 + TEMP_COEFFICIENT * (temperature_c - REFERENCE_TEMP_C);
        if !k.is_finite() || k <= 0.0 {
            return Err(SensorError::Domain {
                reason: "TDS compensation coefficient is not positive",
            });
        }
        let v = volts / k;
        Ok((CUBIC * v * v * v - QUADRATIC * v * v + LINEAR * v) * TDS_FACTOR)
    }
}

impl Calibrate for TdsCurve {
    fn calibrate(&self, raw: f32) -> SensorResult<CalibratedReading> {
        let ppm = self.ppm(self.scale.volts(raw), self.temperature_c)?;
        Ok(CalibratedReading::new(ppm, Unit::PartsPerMillion))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn reference_reading_at_25c() {
        let reading = TdsCurve::reference().calibrate(12000.0).unwrap();
        assert_eq!(reading.unit, Unit::PartsPerMillion);
        assert_relative_eq!(reading.value, 801.025, max_relative = 1e-4);
    }

    #[test]
    fn warmer_water_reads_lower() {
        let mut curve = TdsCurve::reference();
        let at_25 = curve.calibrate(12000.0).unwrap().value;
        curve.set_temperature_c(30.0);
        let at_30 = curve.calibrate(12000.0).unwrap().value;
        assert!(at_30 < at_25);
    }

    #[test]
    fn zero_volts_is_zero_ppm() {
        assert_eq!(TdsCurve::reference().calibrate(0.0).unwrap().value, 0.0);
    }

    #[test]
    fn non_positive_coefficient_is_domain_error() {
        let curve = TdsCurve::reference();
        assert!(matches!(curve.ppm(1.0, -25.0), Err(SensorError::Domain { .. })));
    }
}
