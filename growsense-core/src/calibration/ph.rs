//! pH probe: logarithmic fit through buffer-solution readings
//!
//! The probe is calibrated by dipping it into three buffer solutions and
//! averaging the raw count in each. A curve `pH = a·ln(raw) + b` is fitted to
//! those points by least squares.
//!
//! [`FitMode::Cached`] fits once when the points are set; changing the points
//! refits. [`FitMode::Recompute`] refits on every evaluation, which costs
//! three logarithms per reading but never holds a stale fit.

use libm::log;

use super::{Calibrate, CalibratedReading, Unit};
use crate::{
    constants::sensors::{PH_BUFFERS, PH_RAW_POINTS},
    errors::{SensorError, SensorResult},
};

/// Raw count measured in a buffer solution of known pH
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CalibrationPoint {
    /// Averaged raw ADC count
    pub raw: f32,
    /// Buffer solution pH
    pub ph: f32,
}

impl CalibrationPoint {
    /// Point from a raw count and buffer pH
    pub const fn new(raw: f32, ph: f32) -> Self {
        Self { raw, ph }
    }
}

/// When the fit coefficients are computed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum FitMode {
    /// Fit when points change, reuse for every reading
    #[default]
    Cached,
    /// Fit again on every reading
    Recompute,
}

/// Coefficients of `pH = a·ln(raw) + b`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogFit {
    /// Slope against `ln(raw)`
    pub a: f64,
    /// Intercept
    pub b: f64,
}

impl LogFit {
    /// Least-squares fit through `points`
    ///
    /// Needs at least two points with distinct, positive raw counts.
    pub fn fit(points: &[CalibrationPoint]) -> SensorResult<Self> {
        if points.len() < 2 {
            return Err(SensorError::InvalidParameter { what: "pH fit needs at least two points" });
        }

        let n = points.len() as f64;
        let (mut sx, mut sy, mut sxx, mut sxy) = (0.0f64, 0.0f64, 0.0f64, 0.0f64);
        for point in points {
            if point.raw.is_nan() || point.raw <= 0.0 {
                return Err(SensorError::Domain { reason: "pH calibration raw count must be positive" });
            }
            let x = log(point.raw as f64);
            let y = point.ph as f64;
            sx += x;
            sy += y;
            sxx += x * x;
            sxy += x * y;
        }

        let denom = n * sxx - sx * sx;
        if denom.abs() < 1e-9 * n * sxx {
            return Err(SensorError::Domain { reason: "pH calibration points are degenerate" });
        }

        let a = (n * sxy - sx * sy) / denom;
        let b = (sy - a * sx) / n;
        Ok(Self { a, b })
    }

    /// Evaluate at a raw count
    pub fn eval(&self, raw: f32) -> SensorResult<f32> {
        if raw.is_nan() || raw <= 0.0 {
            return Err(SensorError::Domain { reason: "pH raw count must be positive" });
        }
        Ok((self.a * log(raw as f64) + self.b) as f32)
    }
}

/// Three-point pH calibration
#[derive(Debug, Clone, PartialEq)]
pub struct PhCurve {
    points: [CalibrationPoint; 3],
    mode: FitMode,
    cached: Option<LogFit>,
}

impl PhCurve {
    /// Curve through `points`
    ///
    /// The points are fitted once up front in both modes, so bad points are
    /// rejected here rather than on the first reading.
    pub fn new(points: [CalibrationPoint; 3], mode: FitMode) -> SensorResult<Self> {
        let fit = LogFit::fit(&points)?;
        log_debug!("pH fit: a = {}, b = {}", fit.a, fit.b);
        Ok(Self {
            points,
            mode,
            cached: (mode == FitMode::Cached).then_some(fit),
        })
    }

    /// Curve through the rig's measured 4.01 / 6.86 / 9.18 buffers
    pub fn reference(mode: FitMode) -> SensorResult<Self> {
        let mut points = [CalibrationPoint::new(0.0, 0.0); 3];
        for (point, (raw, ph)) in points.iter_mut().zip(PH_RAW_POINTS.iter().zip(PH_BUFFERS.iter())) {
            *point = CalibrationPoint::new(*raw, *ph);
        }
        Self::new(points, mode)
    }

    /// Calibration points
    pub fn points(&self) -> &[CalibrationPoint; 3] {
        &self.points
    }

    /// Fit mode
    pub fn mode(&self) -> FitMode {
        self.mode
    }

    /// Replace the calibration points
    ///
    /// On error the previous points and fit are kept.
    pub fn set_points(&mut self, points: [CalibrationPoint; 3]) -> SensorResult<()> {
        let fit = LogFit::fit(&points)?;
        self.points = points;
        self.cached = (self.mode == FitMode::Cached).then_some(fit);
        Ok(())
    }

    /// Fit currently in effect
    pub fn coefficients(&self) -> SensorResult<LogFit> {
        match self.cached {
            Some(fit) => Ok(fit),
            None => LogFit::fit(&self.points),
        }
    }

    /// pH at a raw count
    pub fn ph(&self, raw: f32) -> SensorResult<f32> {
        self.coefficients()?.eval(raw)
    }
}

impl Calibrate for PhCurve {
    fn calibrate(&self, raw: f32) -> SensorResult<CalibratedReading> {
        Ok(CalibratedReading::new(self.ph(raw)?, Unit::Ph))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn on_curve(a: f64, b: f64, raws: [f32; 3]) -> [CalibrationPoint; 3] {
        raws.map(|raw| CalibrationPoint::new(raw, (a * log(raw as f64) + b) as f32))
    }

    #[test]
    fn reference_fit_coefficients() {
        let fit = PhCurve::reference(FitMode::Cached).unwrap().coefficients().unwrap();
        assert_relative_eq!(fit.a, -19.046593, epsilon = 1e-3);
        assert_relative_eq!(fit.b, 201.353017, epsilon = 1e-2);
    }

    #[test]
    fn reference_fit_is_least_squares() {
        let curve = PhCurve::reference(FitMode::Cached).unwrap();
        let residual_sum: f32 = curve
            .points()
            .iter()
            .map(|p| curve.ph(p.raw).unwrap() - p.ph)
            .sum();
        assert!(residual_sum.abs() < 1e-3);

        // Three points, two parameters: the mid buffer misses by about 0.33
        for p in curve.points() {
            assert!((curve.ph(p.raw).unwrap() - p.ph).abs() < 0.4);
        }
    }

    #[test]
    fn points_on_a_log_curve_are_reproduced() {
        let points = on_curve(-20.0, 210.0, [31000.0, 27000.0, 23000.0]);
        let curve = PhCurve::new(points, FitMode::Recompute).unwrap();
        for p in &points {
            assert_relative_eq!(curve.ph(p.raw).unwrap(), p.ph, epsilon = 0.01);
        }
    }

    #[test]
    fn modes_agree() {
        let cached = PhCurve::reference(FitMode::Cached).unwrap();
        let recompute = PhCurve::reference(FitMode::Recompute).unwrap();
        assert_eq!(cached.ph(25000.0).unwrap(), recompute.ph(25000.0).unwrap());
    }

    #[test]
    fn set_points_invalidates_cached_fit() {
        let mut curve = PhCurve::reference(FitMode::Cached).unwrap();
        let before = curve.ph(25000.0).unwrap();

        curve.set_points(on_curve(-20.0, 210.0, [31000.0, 27000.0, 23000.0])).unwrap();
        let after = curve.ph(25000.0).unwrap();
        assert!((before - after).abs() > 0.01);
        assert_relative_eq!(after, (-20.0 * log(25000.0) + 210.0) as f32, epsilon = 1e-3);
    }

    #[test]
    fn bad_points_keep_previous_fit() {
        let mut curve = PhCurve::reference(FitMode::Cached).unwrap();
        let before = curve.coefficients().unwrap();

        let same_raw = [CalibrationPoint::new(1000.0, 4.0), CalibrationPoint::new(1000.0, 7.0), CalibrationPoint::new(1000.0, 9.0)];
        assert!(matches!(curve.set_points(same_raw), Err(SensorError::Domain { .. })));
        assert_eq!(curve.coefficients().unwrap(), before);
    }

    #[test]
    fn non_positive_raw_is_domain_error() {
        let curve = PhCurve::reference(FitMode::Cached).unwrap();
        assert!(matches!(curve.ph(0.0), Err(SensorError::Domain { .. })));
        assert!(matches!(curve.ph(-12.0), Err(SensorError::Domain { .. })));

        let negative = [CalibrationPoint::new(-1.0, 4.0), CalibrationPoint::new(2.0, 7.0), CalibrationPoint::new(3.0, 9.0)];
        assert!(PhCurve::new(negative, FitMode::Recompute).is_err());
    }
}
