//! Raspberry Pi bindings through linux-embedded-hal
//!
//! Opens `/dev/i2c-N` as a [`BusTransport`](growsense_core::BusTransport)
//! and exports the relay board's sysfs GPIO lines.

pub use linux_embedded_hal::Delay;
use linux_embedded_hal::{sysfs_gpio::Direction, I2cdev, SysfsPin};

use growsense_core::hal::I2cBus;

use crate::{
    relay::{RelayBoard, BCM_LINES, CHANNELS},
    ConnectorError, ConnectorResult,
};

/// An I2C adapter wrapped for the core drivers
pub type LinuxBus = I2cBus<I2cdev>;

/// Device node for adapter `bus`
pub fn i2c_path(bus: u8) -> String {
    format!("/dev/i2c-{}", bus)
}

/// Open I2C adapter `bus`
pub fn open_i2c(bus: u8) -> ConnectorResult<LinuxBus> {
    let path = i2c_path(bus);
    let dev = I2cdev::new(&path).map_err(|e| ConnectorError::Io {
        path: path.clone(),
        source: std::io::Error::new(std::io::ErrorKind::Other, e.to_string()),
    })?;
    log::debug!("Opened {}", path);
    Ok(I2cBus::new(dev))
}

/// Export one GPIO line as an output, initially low
pub fn output_pin(line: u32) -> ConnectorResult<SysfsPin> {
    let pin = SysfsPin::new(u64::from(line));
    pin.export()
        .and_then(|_| pin.set_direction(Direction::Low))
        .map_err(|e| ConnectorError::Pin(format!("GPIO{}: {}", line, e)))?;
    Ok(pin)
}

/// Export the eight relay lines and build the board
pub fn relay_board() -> ConnectorResult<RelayBoard<SysfsPin>> {
    let mut pins = Vec::with_capacity(CHANNELS);
    for line in BCM_LINES {
        pins.push(output_pin(line)?);
    }
    let pins: [SysfsPin; CHANNELS] = pins
        .try_into()
        .map_err(|_| ConnectorError::Pin("relay line table length mismatch".into()))?;
    RelayBoard::new(pins)
}
