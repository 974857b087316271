//! SoC temperature from the Linux thermal sysfs

use std::fs;
use std::path::{Path, PathBuf};

use crate::{ConnectorError, ConnectorResult};

/// Thermal zone of the Raspberry Pi SoC
pub const DEFAULT_THERMAL_ZONE: &str = "/sys/class/thermal/thermal_zone0/temp";

/// Reads millidegrees Celsius from a thermal zone file
#[derive(Debug, Clone)]
pub struct CpuTemperature {
    path: PathBuf,
}

impl Default for CpuTemperature {
    fn default() -> Self {
        Self::new(DEFAULT_THERMAL_ZONE)
    }
}

impl CpuTemperature {
    /// Source reading from `path`
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self { path: path.as_ref().to_path_buf() }
    }

    /// Current temperature in °C
    pub fn read_celsius(&self) -> ConnectorResult<f32> {
        let text = fs::read_to_string(&self.path).map_err(|source| ConnectorError::Io {
            path: self.path.display().to_string(),
            source,
        })?;
        parse_millidegrees(&text)
    }
}

/// Parse the integer millidegree format, e.g. `"48312\n"` → 48.312
pub fn parse_millidegrees(text: &str) -> ConnectorResult<f32> {
    let milli: i32 = text
        .trim()
        .parse()
        .map_err(|_| ConnectorError::Parse(format!("thermal zone value {:?}", text.trim())))?;
    Ok(milli as f32 / 1000.0)
}
