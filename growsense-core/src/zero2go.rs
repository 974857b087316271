//! Zero2Go Omini power board
//!
//! A byte-register device reporting the voltage on its three power inputs.
//! Each voltage is split across two registers: whole volts and hundredths.
//! No retries here; errors go straight to the caller.

use crate::{
    errors::{SensorError, SensorResult},
    traits::BusTransport,
};

/// Firmware id
pub const REG_FIRMWARE_ID: u8 = 0;
/// Working mode
pub const REG_WORKING_MODE: u8 = 7;
/// Set while input voltage is below the low-voltage threshold
pub const REG_LOW_VOLTAGE_FLAG: u8 = 8;
/// Status LED blink interval
pub const REG_LED_BLINK_INTERVAL: u8 = 11;

/// One of the three power inputs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PowerInput {
    /// Input A (micro USB)
    A,
    /// Input B (USB type C)
    B,
    /// Input C (screw terminal)
    C,
}

impl PowerInput {
    /// All inputs in register order
    pub const ALL: [PowerInput; 3] = [PowerInput::A, PowerInput::B, PowerInput::C];

    /// Parse `A`, `B` or `C`, either case
    pub fn from_label(label: &str) -> SensorResult<Self> {
        match label {
            "A" | "a" => Ok(PowerInput::A),
            "B" | "b" => Ok(PowerInput::B),
            "C" | "c" => Ok(PowerInput::C),
            _ => Err(SensorError::InvalidParameter { what: "power input must be A, B or C" }),
        }
    }

    /// (whole volts, hundredths) register pair
    pub const fn registers(self) -> (u8, u8) {
        match self {
            PowerInput::A => (1, 2),
            PowerInput::B => (3, 4),
            PowerInput::C => (5, 6),
        }
    }
}

/// Zero2Go Omini on a bus
#[derive(Debug)]
pub struct Zero2Go<B> {
    bus: B,
    address: u8,
}

impl<B: BusTransport> Zero2Go<B> {
    /// Driver for the board at `address`
    pub fn new(bus: B, address: u8) -> Self {
        Self { bus, address }
    }

    fn read(&mut self, register: u8) -> SensorResult<u8> {
        self.bus
            .read_byte(self.address, register)
            .map_err(|cause| SensorError::read(register, cause))
    }

    /// Firmware id
    pub fn firmware_id(&mut self) -> SensorResult<u8> {
        self.read(REG_FIRMWARE_ID)
    }

    /// Working mode (0 = normal, 1 = always-on)
    pub fn working_mode(&mut self) -> SensorResult<u8> {
        self.read(REG_WORKING_MODE)
    }

    /// True while input voltage is under the low-voltage threshold
    pub fn low_voltage(&mut self) -> SensorResult<bool> {
        Ok(self.read(REG_LOW_VOLTAGE_FLAG)? != 0)
    }

    /// Voltage on `input`
    pub fn voltage(&mut self, input: PowerInput) -> SensorResult<f32> {
        let (int_reg, dec_reg) = input.registers();
        let whole = self.read(int_reg)?;
        let hundredths = self.read(dec_reg)?;
        Ok(whole as f32 + hundredths as f32 / 100.0)
    }

    /// Set the LED blink interval: 6 (1 s), 7 (2 s), 8 (4 s) or 9 (8 s)
    pub fn set_led_blink_interval(&mut self, interval: u8) -> SensorResult<()> {
        if !(6..=9).contains(&interval) {
            return Err(SensorError::InvalidParameter { what: "LED blink interval must be 6 to 9" });
        }
        self.bus
            .write_byte(self.address, REG_LED_BLINK_INTERVAL, interval)
            .map_err(|cause| SensorError::write(REG_LED_BLINK_INTERVAL, cause))
    }

    /// Give the bus back
    pub fn release(self) -> B {
        self.bus
    }
}
