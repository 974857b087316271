//! Sensor Addresses and Reference Calibration
//!
//! Values measured on the reference rig. Every probe drifts; these are the
//! defaults the CLI configuration starts from.

// ===== BUS ADDRESSES =====

/// ADS1115 wired to the water probes (ADDR → GND).
pub const ADS1115_PROBE_ADDRESS: u8 = 0x48;

/// ADS1115 wired to the supply rails (ADDR → VDD).
pub const ADS1115_RAIL_ADDRESS: u8 = 0x49;

/// BME280 with SDO → GND.
pub const BME280_ADDRESS: u8 = 0x76;

/// LTR-559 fixed address.
pub const LTR559_ADDRESS: u8 = 0x23;

/// Zero2Go Omini default address.
pub const ZERO2GO_ADDRESS: u8 = 0x29;

/// Linux I2C adapter number on a Raspberry Pi header (`/dev/i2c-1`).
pub const DEFAULT_I2C_BUS: u8 = 1;

// ===== TDS / EC PROBE =====

/// Reference voltage measured across the WPM356 TDS probe supply (V).
pub const TDS_VREF_VOLTS: f32 = 5.15;

/// Count the TDS scaling treats as full scale.
pub const TDS_ADC_RESOLUTION: f32 = 32767.0;

/// Temperature assumed when none is measured (°C).
pub const TDS_DEFAULT_TEMP_C: f32 = 25.0;

/// Samples per conductivity reading.
pub const TDS_SAMPLE_COUNT: usize = 30;

// ===== pH PROBE =====

/// Buffer solution pH values (low, mid, high).
pub const PH_BUFFERS: [f32; 3] = [4.01, 6.86, 9.18];

/// Averaged raw counts measured in each buffer solution.
pub const PH_RAW_POINTS: [f32; 3] = [31302.29, 27695.95, 23900.11];

// ===== 10k THERMISTOR =====

/// Steinhart-Hart A coefficient.
pub const THERMISTOR_A: f64 = -0.001169;

/// Steinhart-Hart B coefficient.
pub const THERMISTOR_B: f64 = 0.000565;

/// Steinhart-Hart C coefficient.
pub const THERMISTOR_C: f64 = -8.99e-07;

/// Divider series resistance (Ω).
pub const THERMISTOR_SERIES_OHMS: f64 = 9986.0;

/// Divider supply voltage (V).
pub const THERMISTOR_SUPPLY_VOLTS: f64 = 3.17;

/// Offset applied after conversion (°C).
pub const THERMISTOR_CORRECTION_C: f64 = -2.73;

// ===== SUPPLY RAILS =====

/// Trim factor for the 5 V reference rail channel.
pub const VREF5_CALIBRATION_FACTOR: f32 = 1.0028;

/// Trim factor for the 3.3 V rail channel.
pub const VREF3V3_CALIBRATION_FACTOR: f32 = 1.0;

/// Samples averaged per rail reading.
pub const RAIL_SAMPLE_COUNT: usize = 10;

// ===== CPU HEAT COMPENSATION =====

/// Divisor applied to the CPU/sensor temperature gap.
///
/// Decrease to pull the compensated temperature down, increase to push it up.
pub const CPU_COMPENSATION_FACTOR: f32 = 10.25;
