//! Runtime configuration
//!
//! Loaded from a JSON file; every field is optional and defaults to the
//! reference rig's values, so `{}` is a complete configuration.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use growsense_connectors::cpu_temp::DEFAULT_THERMAL_ZONE;
use growsense_core::ads1115::ConversionWait;
use growsense_core::calibration::{CalibrationPoint, FitMode};
use growsense_core::constants::{sensors, time};

/// Everything the polling loop needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Linux I2C adapter number
    pub i2c_bus: u8,
    /// CSV log path
    pub output: PathBuf,
    /// Time from the start of one cycle to the start of the next
    pub interval_ms: u64,
    /// Stop after this many cycles; run forever when absent
    pub cycles: Option<u64>,
    pub probes: ProbeConfig,
    pub rails: RailConfig,
    pub air: AirConfig,
    pub light: LightConfig,
    pub power: PowerConfig,
    /// Query `vcgencmd` for SoC rail voltages each cycle
    pub system_rails: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            i2c_bus: sensors::DEFAULT_I2C_BUS,
            output: PathBuf::from("sensor_data.csv"),
            interval_ms: time::MS_PER_SECOND,
            cycles: None,
            probes: ProbeConfig::default(),
            rails: RailConfig::default(),
            air: AirConfig::default(),
            light: LightConfig::default(),
            power: PowerConfig::default(),
            system_rails: true,
        }
    }
}

/// Water probes on the first ADS1115
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    pub address: u8,
    pub conversion_wait: ConversionWait,
    /// Measured supply across the TDS probe (V)
    pub tds_vref_volts: f32,
    pub tds_resolution: f32,
    /// Feed the thermistor reading into the TDS temperature compensation
    /// instead of assuming 25 °C
    pub tds_use_water_temperature: bool,
    /// Buffer solution calibration, low to high
    pub ph_points: [CalibrationPoint; 3],
    pub ph_fit: FitMode,
    /// Offset added to the thermistor temperature (°C)
    pub thermistor_correction_c: f64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        let [r1, r2, r3] = sensors::PH_RAW_POINTS;
        let [p1, p2, p3] = sensors::PH_BUFFERS;
        Self {
            address: sensors::ADS1115_PROBE_ADDRESS,
            conversion_wait: ConversionWait::default(),
            tds_vref_volts: sensors::TDS_VREF_VOLTS,
            tds_resolution: sensors::TDS_ADC_RESOLUTION,
            tds_use_water_temperature: false,
            ph_points: [
                CalibrationPoint::new(r1, p1),
                CalibrationPoint::new(r2, p2),
                CalibrationPoint::new(r3, p3),
            ],
            ph_fit: FitMode::default(),
            thermistor_correction_c: sensors::THERMISTOR_CORRECTION_C,
        }
    }
}

/// Supply rail monitor on the second ADS1115
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RailConfig {
    pub enabled: bool,
    pub address: u8,
    pub vref5_factor: f32,
    pub vref3v3_factor: f32,
}

impl Default for RailConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            address: sensors::ADS1115_RAIL_ADDRESS,
            vref5_factor: sensors::VREF5_CALIBRATION_FACTOR,
            vref3v3_factor: sensors::VREF3V3_CALIBRATION_FACTOR,
        }
    }
}

/// BME280 and the CPU heat compensation applied to it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AirConfig {
    pub enabled: bool,
    pub address: u8,
    pub cpu_compensation_factor: f32,
    pub thermal_zone: PathBuf,
}

impl Default for AirConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            address: sensors::BME280_ADDRESS,
            cpu_compensation_factor: sensors::CPU_COMPENSATION_FACTOR,
            thermal_zone: PathBuf::from(DEFAULT_THERMAL_ZONE),
        }
    }
}

/// LTR-559 and its bus retry policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightConfig {
    pub enabled: bool,
    pub address: u8,
    pub retry_attempts: u8,
    pub retry_backoff_ms: u32,
    pub handshake_timeout_ms: u32,
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            address: sensors::LTR559_ADDRESS,
            retry_attempts: time::RETRY_ATTEMPTS,
            retry_backoff_ms: time::RETRY_BACKOFF_MS,
            handshake_timeout_ms: time::HANDSHAKE_TIMEOUT_MS,
        }
    }
}

/// Zero2Go Omini power board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PowerConfig {
    pub enabled: bool,
    pub address: u8,
}

impl Default for PowerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            address: sensors::ZERO2GO_ADDRESS,
        }
    }
}

impl AppConfig {
    /// Read a JSON config file
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        let config: Self =
            serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// File config if a path is given, defaults otherwise
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Reject values no device would accept
    pub fn validate(&self) -> Result<()> {
        if self.interval_ms == 0 {
            bail!("interval_ms must be positive");
        }
        if self.cycles == Some(0) {
            bail!("cycles must be positive when set");
        }
        if !(self.probes.tds_vref_volts > 0.0 && self.probes.tds_resolution > 0.0) {
            bail!("TDS reference voltage and resolution must be positive");
        }
        if self.light.handshake_timeout_ms == 0 {
            bail!("light.handshake_timeout_ms must be positive");
        }
        let addresses = [
            ("probes", true, self.probes.address),
            ("rails", self.rails.enabled, self.rails.address),
            ("air", self.air.enabled, self.air.address),
            ("light", self.light.enabled, self.light.address),
            ("power", self.power.enabled, self.power.address),
        ];
        for (i, (name, enabled, address)) in addresses.iter().enumerate() {
            if !enabled {
                continue;
            }
            if *address > 0x77 {
                bail!("{} address {:#04x} is outside the 7-bit range", name, address);
            }
            if let Some((other, _, _)) = addresses[i + 1..].iter().find(|(_, on, a)| *on && a == address) {
                bail!("{} and {} share address {:#04x}", name, other, address);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_object_is_reference_config() {
        let config: AppConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.probes.address, 0x48);
        assert_eq!(config.rails.address, 0x49);
        assert_eq!(config.interval_ms, 1000);
        config.validate().unwrap();
    }

    #[test]
    fn partial_file_overrides_only_named_fields() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"interval_ms": 5000, "light": {{"enabled": false}}, "probes": {{"ph_fit": "recompute"}}}}"#)
            .unwrap();
        let config = AppConfig::load(file.path()).unwrap();
        assert_eq!(config.interval_ms, 5000);
        assert!(!config.light.enabled);
        assert_eq!(config.light.address, 0x23);
        assert_eq!(config.probes.ph_fit, FitMode::Recompute);
        assert_eq!(config.probes.tds_vref_volts, 5.15);
    }

    #[test]
    fn duplicate_addresses_rejected() {
        let mut config = AppConfig::default();
        config.power.address = 0x48;
        assert!(config.validate().is_err());
        config.power.enabled = false;
        config.validate().unwrap();
    }

    #[test]
    fn zero_interval_rejected() {
        let config = AppConfig { interval_ms: 0, ..AppConfig::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn malformed_file_names_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        let err = AppConfig::load(file.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("parsing"));
    }
}
