//! Calibration Engine
//!
//! ## Overview
//!
//! Turns a raw ADC count into a physical quantity. Each probe uses one of four
//! models, and an engine holds one model per [`SensorKind`]:
//!
//! | Model            | Probe                 | Output |
//! |------------------|-----------------------|--------|
//! | [`LinearScale`]  | supply rails          | V      |
//! | [`TdsCurve`]     | TDS / EC probe        | ppm    |
//! | [`PhCurve`]      | pH probe              | pH     |
//! | [`Thermistor`]   | 10k NTC thermistor    | °C     |
//!
//! The BME280's fixed-point compensation is vendor-defined and tied to that
//! device's trimming registers, so it lives in [`crate::bme280`].
//!
//! ## Domain Errors
//!
//! Several models take logarithms or divide by measured voltages. Inputs that
//! make the math undefined return [`SensorError::Domain`] instead of letting
//! NaN or infinity leak into the log file.
//!
//! ## Usage Example
//!
//! ```rust
//! use growsense_core::calibration::{CalibrationEngine, CalibrationModel, LinearScale, SensorKind, Thermistor};
//! use growsense_core::codec::Gain;
//!
//! let mut engine = CalibrationEngine::new();
//! engine.register(SensorKind::VoltageRail, CalibrationModel::Linear(LinearScale::for_gain(Gain::One, 1.0)))?;
//! engine.register(SensorKind::Thermistor, CalibrationModel::SteinhartHart(Thermistor::reference()))?;
//!
//! let rail = engine.convert(SensorKind::VoltageRail, 16384.0)?;
//! assert!((rail.value - 2.048).abs() < 1e-6);
//! # Ok::<(), growsense_core::SensorError>(())
//! ```

mod ambient;
mod linear;
mod ph;
mod tds;
mod thermistor;

pub use ambient::CpuDriftCompensator;
pub use linear::LinearScale;
pub use ph::{CalibrationPoint, FitMode, LogFit, PhCurve};
pub use tds::TdsCurve;
pub use thermistor::{celsius_to_fahrenheit, SteinhartHart, Thermistor};

use heapless::FnvIndexMap;

use crate::{
    constants::buffers::MAX_CALIBRATION_MODELS,
    errors::{SensorError, SensorResult},
};

/// What a probe measures; the key a calibration model is registered under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SensorKind {
    /// Supply or reference rail read through the ADC
    VoltageRail,
    /// Total dissolved solids / electrical conductivity probe
    Conductivity,
    /// pH probe
    Ph,
    /// NTC thermistor in a voltage divider
    Thermistor,
}

/// Physical unit of a calibrated reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    /// Volts
    Volts,
    /// Parts per million dissolved solids
    PartsPerMillion,
    /// pH units
    Ph,
    /// Degrees Celsius
    Celsius,
    /// Hectopascal
    Hectopascal,
    /// Percent relative humidity
    Percent,
    /// Lux
    Lux,
    /// Raw ADC counts
    Counts,
}

/// A raw value mapped into engineering units
///
/// Computed fresh on every acquisition; never cached across cycles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibratedReading {
    /// Value in `unit`
    pub value: f32,
    /// Unit of `value`
    pub unit: Unit,
}

impl CalibratedReading {
    /// Build a reading
    pub const fn new(value: f32, unit: Unit) -> Self {
        Self { value, unit }
    }
}

/// Core calibration trait - implement this for each probe model
pub trait Calibrate {
    /// Map a (possibly filtered) raw ADC count to a physical reading
    fn calibrate(&self, raw: f32) -> SensorResult<CalibratedReading>;
}

/// The four supported calibration strategies
#[derive(Debug, Clone)]
pub enum CalibrationModel {
    /// Reference scaling to volts
    Linear(LinearScale),
    /// Cubic TDS curve with temperature compensation
    Polynomial(TdsCurve),
    /// Three-point logarithmic pH fit
    LogFit(PhCurve),
    /// Thermistor divider through Steinhart-Hart
    SteinhartHart(Thermistor),
}

impl Calibrate for CalibrationModel {
    fn calibrate(&self, raw: f32) -> SensorResult<CalibratedReading> {
        match self {
            CalibrationModel::Linear(model) => model.calibrate(raw),
            CalibrationModel::Polynomial(model) => model.calibrate(raw),
            CalibrationModel::LogFit(model) => model.calibrate(raw),
            CalibrationModel::SteinhartHart(model) => model.calibrate(raw),
        }
    }
}

/// One calibration model per sensor kind
#[derive(Debug, Default)]
pub struct CalibrationEngine {
    models: FnvIndexMap<SensorKind, CalibrationModel, MAX_CALIBRATION_MODELS>,
}

impl CalibrationEngine {
    /// Engine with no models registered
    pub fn new() -> Self {
        Self { models: FnvIndexMap::new() }
    }

    /// Register (or replace) the model for `kind`, returning the old one
    pub fn register(
        &mut self,
        kind: SensorKind,
        model: CalibrationModel,
    ) -> SensorResult<Option<CalibrationModel>> {
        self.models
            .insert(kind, model)
            .map_err(|_| SensorError::InvalidParameter { what: "calibration engine is full" })
    }

    /// Model registered for `kind`
    pub fn model(&self, kind: SensorKind) -> Option<&CalibrationModel> {
        self.models.get(&kind)
    }

    /// Mutable access, e.g. to update a probe temperature or pH points
    pub fn model_mut(&mut self, kind: SensorKind) -> Option<&mut CalibrationModel> {
        self.models.get_mut(&kind)
    }

    /// Convert a raw count with the model registered for `kind`
    pub fn convert(&self, kind: SensorKind, raw: f32) -> SensorResult<CalibratedReading> {
        self.model(kind)
            .ok_or(SensorError::InvalidParameter { what: "no calibration model for sensor kind" })?
            .calibrate(raw)
    }
}
