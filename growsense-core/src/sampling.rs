//! Multi-sample acquisition and filtering
//!
//! Noisy probes are read several times in a burst and the burst is reduced to
//! one value. Samples land in a fixed-capacity buffer that lives for a single
//! call; filters work on a copy so the acquisition order is preserved.
//!
//! ```rust
//! use growsense_core::sampling::Filter;
//!
//! let burst = [3.0, 1.0, 2.0];
//! assert_eq!(Filter::Median.apply(&burst)?, 2.0);
//! assert_eq!(Filter::Mean.apply(&burst)?, 2.0);
//! # Ok::<(), growsense_core::SensorError>(())
//! ```

use embedded_hal::delay::DelayNs;
use heapless::Vec;

use crate::{
    ads1115::Ads1115,
    calibration::{Calibrate, CalibratedReading},
    codec::ChannelConfig,
    constants::{
        buffers::MAX_SAMPLES,
        sensors::{RAIL_SAMPLE_COUNT, TDS_SAMPLE_COUNT},
        time::{RAIL_SAMPLE_INTERVAL_MS, TDS_SAMPLE_INTERVAL_MS},
    },
    errors::{SensorError, SensorResult},
    traits::BusTransport,
};

/// Raw counts from one sampling burst
pub type SampleBuffer = Vec<f32, MAX_SAMPLES>;

/// How a burst is reduced to one value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Filter {
    /// Middle value, or mean of the two middle values for even counts
    Median,
    /// Arithmetic mean
    Mean,
}

impl Filter {
    /// Reduce `samples` without reordering them
    pub fn apply(&self, samples: &[f32]) -> SensorResult<f32> {
        if samples.is_empty() {
            return Err(SensorError::InvalidParameter { what: "filter needs at least one sample" });
        }
        match self {
            Filter::Median => median(samples),
            Filter::Mean => Ok(samples.iter().sum::<f32>() / samples.len() as f32),
        }
    }
}

fn median(samples: &[f32]) -> SensorResult<f32> {
    let mut sorted: SampleBuffer = Vec::from_slice(samples)
        .map_err(|_| SensorError::InvalidParameter { what: "too many samples to filter" })?;
    sorted.sort_unstable_by(f32::total_cmp);

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        Ok(sorted[mid])
    } else {
        Ok((sorted[mid - 1] + sorted[mid]) / 2.0)
    }
}

/// Burst size, spacing and reduction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SamplePlan {
    /// Acquisitions per reading, 1 to 64
    pub count: usize,
    /// Pause between acquisitions, not after the last
    pub inter_sample_delay_ms: u32,
    /// Reduction applied to the burst
    pub filter: Filter,
}

impl SamplePlan {
    /// Build a plan
    pub const fn new(count: usize, inter_sample_delay_ms: u32, filter: Filter) -> Self {
        Self { count, inter_sample_delay_ms, filter }
    }

    /// Conductivity probe: 30 samples, 40 ms apart, median
    pub const fn conductivity() -> Self {
        Self::new(TDS_SAMPLE_COUNT, TDS_SAMPLE_INTERVAL_MS, Filter::Median)
    }

    /// Supply rails: 10 samples, 10 ms apart, mean
    pub const fn rails() -> Self {
        Self::new(RAIL_SAMPLE_COUNT, RAIL_SAMPLE_INTERVAL_MS, Filter::Mean)
    }

    /// Single acquisition
    pub const fn single() -> Self {
        Self::new(1, 0, Filter::Mean)
    }

    /// Check the count fits the sample buffer
    pub fn validate(&self) -> SensorResult<()> {
        if self.count == 0 {
            return Err(SensorError::InvalidParameter { what: "sample count must be at least 1" });
        }
        if self.count > MAX_SAMPLES {
            return Err(SensorError::InvalidParameter { what: "sample count exceeds buffer capacity" });
        }
        Ok(())
    }
}

/// Acquire a burst into a buffer, in acquisition order
pub fn collect<B: BusTransport, D: DelayNs>(
    adc: &mut Ads1115<B, D>,
    config: &ChannelConfig,
    plan: &SamplePlan,
) -> SensorResult<SampleBuffer> {
    plan.validate()?;

    let mut samples = SampleBuffer::new();
    for i in 0..plan.count {
        if i > 0 {
            adc.pause_ms(plan.inter_sample_delay_ms);
        }
        let raw = adc.acquire(config)?;
        samples
            .push(raw as f32)
            .map_err(|_| SensorError::InvalidParameter { what: "sample count exceeds buffer capacity" })?;
    }
    Ok(samples)
}

/// Acquire a burst and return the filtered raw count
pub fn sample_filtered<B: BusTransport, D: DelayNs>(
    adc: &mut Ads1115<B, D>,
    config: &ChannelConfig,
    plan: &SamplePlan,
) -> SensorResult<f32> {
    let samples = collect(adc, config, plan)?;
    let filtered = plan.filter.apply(&samples)?;
    log_trace!("{:?} of {} samples on {:?}: {}", plan.filter, samples.len(), config.channel, filtered);
    Ok(filtered)
}

/// Acquire, filter and calibrate in one call
pub fn sample_calibrated<B: BusTransport, D: DelayNs, C: Calibrate + ?Sized>(
    adc: &mut Ads1115<B, D>,
    config: &ChannelConfig,
    plan: &SamplePlan,
    model: &C,
) -> SensorResult<CalibratedReading> {
    model.calibrate(sample_filtered(adc, config, plan)?)
}
