//! Linear scaling from ADC counts to volts

use super::{Calibrate, CalibratedReading, Unit};
use crate::{
    codec::{Gain, HALF_RANGE},
    constants::sensors::{TDS_ADC_RESOLUTION, TDS_VREF_VOLTS},
    errors::SensorResult,
};

/// `volts = raw × volts_per_count`
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LinearScale {
    volts_per_count: f32,
}

impl LinearScale {
    /// Scale through the gain's full-scale range, trimmed by `factor`
    ///
    /// `raw × (full_scale / 32768) × factor`
    pub fn for_gain(gain: Gain, factor: f32) -> Self {
        Self {
            volts_per_count: gain.full_scale_volts() / HALF_RANGE * factor,
        }
    }

    /// Scale against a measured reference: `raw × vref / resolution`
    pub fn reference(vref: f32, resolution: f32) -> Self {
        Self {
            volts_per_count: vref / resolution,
        }
    }

    /// The conductivity probe's 5.15 V / 32767 scaling
    pub fn tds_reference() -> Self {
        Self::reference(TDS_VREF_VOLTS, TDS_ADC_RESOLUTION)
    }

    /// Volts per ADC count
    pub fn volts_per_count(&self) -> f32 {
        self.volts_per_count
    }

    /// Convert a raw count
    pub fn volts(&self, raw: f32) -> f32 {
        raw * self.volts_per_count
    }
}

impl Calibrate for LinearScale {
    fn calibrate(&self, raw: f32) -> SensorResult<CalibratedReading> {
        Ok(CalibratedReading::new(self.volts(raw), Unit::Volts))
    }
}
