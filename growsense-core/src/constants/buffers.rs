//! Buffer Sizes
//!
//! Fixed capacities for the `heapless` collections used in the acquisition
//! path. Sized for the reference deployment with headroom; raise them if a
//! probe needs longer sampling windows.

/// Largest sample buffer one sampling cycle may fill.
///
/// The conductivity probe takes 30 samples per reading; 64 leaves room for
/// slower, noisier probes without touching the heap.
pub const MAX_SAMPLES: usize = 64;

/// Readings tracked in one polling cycle report.
pub const MAX_CYCLE_READINGS: usize = 24;

/// Calibration models a single engine can hold (one per sensor kind).
///
/// Must be a power of two (`heapless::FnvIndexMap` requirement).
pub const MAX_CALIBRATION_MODELS: usize = 8;

/// CPU temperatures averaged for drift compensation.
pub const CPU_TEMP_WINDOW: usize = 5;
