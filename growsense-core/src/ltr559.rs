//! LTR-559 Light and Proximity Sensor
//!
//! ## Startup Handshake
//!
//! ```text
//!  Uninitialized ──▶ IdentityVerified ──▶ ConfiguredOutputsEnabled ──▶ SoftResetWait ──▶ Ready
//!        │ part id ≠ 0x92                                                  │ reset bit stuck
//!        ▼                                                                 ▼
//!  DeviceNotFound                                                       Timeout
//! ```
//!
//! Each stage is its own type and consumes the previous one, so an
//! [`Ltr559`] value only exists once the device has reached `Ready`: reading
//! light or proximity from a half-initialised part does not compile.
//!
//! Every transfer goes through a [`RetryingBus`]; this part is known to NAK
//! while its reset is in progress.

use core::marker::PhantomData;

use embedded_hal::delay::DelayNs;

use crate::{
    constants::time::{HANDSHAKE_POLL_INTERVAL_MS, HANDSHAKE_TIMEOUT_MS},
    errors::{SensorError, SensorResult},
    retry::{Retry, RetryingBus},
    time::PollBudget,
    traits::BusTransport,
};

/// ALS gain, mode and software reset
pub const REG_ALS_CONTROL: u8 = 0x80;
/// PS mode and saturation indicator
pub const REG_PS_CONTROL: u8 = 0x81;
/// PS LED pulse frequency, duty cycle, current
pub const REG_PS_LED: u8 = 0x82;
/// PS LED pulse count
pub const REG_PS_N_PULSES: u8 = 0x83;
/// PS measurement rate
pub const REG_PS_MEAS_RATE: u8 = 0x84;
/// ALS integration time and repeat rate
pub const REG_ALS_MEAS_RATE: u8 = 0x85;
/// Part number (high nibble) and revision (low nibble)
pub const REG_PART_ID: u8 = 0x86;
/// ALS CH1 low, CH1 high, CH0 low, CH0 high
pub const REG_ALS_DATA: u8 = 0x88;
/// PS count low, PS count high + saturation flag
pub const REG_PS_DATA: u8 = 0x8D;
/// Interrupt mode and polarity
pub const REG_INTERRUPT: u8 = 0x8F;
/// PS crosstalk offset
pub const REG_PS_OFFSET: u8 = 0x94;

/// Expected part number
pub const PART_NUMBER: u8 = 0x09;
/// Expected revision
pub const REVISION: u8 = 0x02;

const ALS_CONTROL_ACTIVE: u8 = 0x01;
const ALS_CONTROL_SW_RESET: u8 = 0x02;
// Gain 4x in bits 4:2
const ALS_CONTROL_GAIN_4X: u8 = 0x02 << 2;
const ALS_GAIN: f32 = 4.0;

// Active (0b11) with saturation indicator (bit 5)
const PS_CONTROL_VALUE: u8 = 0x23;
// 30 kHz, 100 % duty, 50 mA
const PS_LED_VALUE: u8 = 0x1B;
const PS_N_PULSES_VALUE: u8 = 0x01;
// 100 ms
const PS_MEAS_RATE_VALUE: u8 = 0x02;
// 50 ms integration in bits 5:3, 50 ms repeat in bits 2:0
const ALS_MEAS_RATE_VALUE: u8 = 0x01 << 3;
const ALS_INTEGRATION_MS: f32 = 50.0;
// ALS and PS interrupts, active low
const INTERRUPT_VALUE: u8 = 0x03;

const PS_COUNT_MASK: u16 = 0x07FF;
const PS_SATURATED: u8 = 0x80;

// Lux coefficients indexed by the CH1 / (CH0 + CH1) ratio bucket
const CH0_COEFFICIENTS: [f32; 4] = [17743.0, 42785.0, 5926.0, 0.0];
const CH1_COEFFICIENTS: [f32; 4] = [-11059.0, 19548.0, -1185.0, 0.0];

/// Handshake stages
pub mod stage {
    /// Nothing has been read or written yet
    #[derive(Debug)]
    pub struct Uninitialized;
    /// Part id matched
    #[derive(Debug)]
    pub struct IdentityVerified;
    /// Enable registers written
    #[derive(Debug)]
    pub struct ConfiguredOutputsEnabled;
}

/// Device partway through the startup handshake
#[derive(Debug)]
pub struct Handshake<B, D, S> {
    bus: RetryingBus<B, D>,
    address: u8,
    _stage: PhantomData<S>,
}

impl<B: BusTransport, D: DelayNs> Handshake<B, D, stage::Uninitialized> {
    /// Start a handshake over `bus` with the given retry policy
    pub fn new(bus: B, delay: D, address: u8, retry: Retry) -> Self {
        Self {
            bus: RetryingBus::new(bus, delay, retry),
            address,
            _stage: PhantomData,
        }
    }

    /// Check part number and revision before touching any register
    pub fn verify_identity(mut self) -> SensorResult<Handshake<B, D, stage::IdentityVerified>> {
        let part_id = self
            .bus
            .read_byte(self.address, REG_PART_ID)
            .map_err(|cause| SensorError::read(REG_PART_ID, cause))?;
        if part_id >> 4 != PART_NUMBER || part_id & 0x0F != REVISION {
            log_warn!("LTR559@{:#04x}: unexpected part id {:#04x}", self.address, part_id);
            return Err(SensorError::DeviceNotFound { part_id });
        }
        log_debug!("LTR559@{:#04x}: identity verified", self.address);
        Ok(self.advance())
    }
}

impl<B: BusTransport, D: DelayNs> Handshake<B, D, stage::IdentityVerified> {
    /// Write interrupt, LED, pulse, control and rate registers
    pub fn enable_outputs(mut self) -> SensorResult<Handshake<B, D, stage::ConfiguredOutputsEnabled>> {
        for (register, value) in [
            (REG_INTERRUPT, INTERRUPT_VALUE),
            (REG_PS_LED, PS_LED_VALUE),
            (REG_PS_N_PULSES, PS_N_PULSES_VALUE),
            (REG_ALS_CONTROL, ALS_CONTROL_ACTIVE | ALS_CONTROL_GAIN_4X),
            (REG_PS_CONTROL, PS_CONTROL_VALUE),
            (REG_PS_MEAS_RATE, PS_MEAS_RATE_VALUE),
            (REG_ALS_MEAS_RATE, ALS_MEAS_RATE_VALUE),
        ] {
            self.bus
                .write_byte(self.address, register, value)
                .map_err(|cause| SensorError::write(register, cause))?;
        }
        self.bus
            .write_block(self.address, REG_PS_OFFSET, &[0, 0])
            .map_err(|cause| SensorError::write(REG_PS_OFFSET, cause))?;
        log_debug!("LTR559@{:#04x}: outputs enabled", self.address);
        Ok(self.advance())
    }
}

impl<B: BusTransport, D: DelayNs> Handshake<B, D, stage::ConfiguredOutputsEnabled> {
    /// Poll the software-reset bit until it clears or `timeout_ms` passes
    pub fn await_reset(mut self, timeout_ms: u32) -> SensorResult<Ltr559<B, D>> {
        let mut budget = PollBudget::new(timeout_ms, HANDSHAKE_POLL_INTERVAL_MS);
        loop {
            let control = self
                .bus
                .read_byte(self.address, REG_ALS_CONTROL)
                .map_err(|cause| SensorError::read(REG_ALS_CONTROL, cause))?;
            if control & ALS_CONTROL_SW_RESET == 0 {
                log_debug!("LTR559@{:#04x}: ready after {} ms", self.address, budget.elapsed_ms());
                return Ok(Ltr559 { bus: self.bus, address: self.address });
            }
            if budget.exhausted() {
                return Err(SensorError::Timeout {
                    what: "LTR559 software reset",
                    waited_ms: budget.elapsed_ms(),
                });
            }
            budget.wait(self.bus.delay_mut());
        }
    }
}

impl<B, D, S> Handshake<B, D, S> {
    fn advance<N>(self) -> Handshake<B, D, N> {
        Handshake {
            bus: self.bus,
            address: self.address,
            _stage: PhantomData,
        }
    }
}

/// Proximity count with the saturation flag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Proximity {
    /// 11-bit count, higher is closer
    pub count: u16,
    /// Sensor saturated by ambient IR
    pub saturated: bool,
}

/// LTR-559 past its startup handshake
#[derive(Debug)]
pub struct Ltr559<B, D> {
    bus: RetryingBus<B, D>,
    address: u8,
}

impl<B: BusTransport, D: DelayNs> Ltr559<B, D> {
    /// Run the full handshake with the default retry policy and timeout
    pub fn init(bus: B, delay: D, address: u8) -> SensorResult<Self> {
        Handshake::new(bus, delay, address, Retry::default())
            .verify_identity()?
            .enable_outputs()?
            .await_reset(HANDSHAKE_TIMEOUT_MS)
    }

    /// Raw ALS channel counts `(ch0, ch1)`
    pub fn als_channels(&mut self) -> SensorResult<(u16, u16)> {
        let mut data = [0u8; 4];
        self.bus
            .read_block(self.address, REG_ALS_DATA, &mut data)
            .map_err(|cause| SensorError::read(REG_ALS_DATA, cause))?;
        let ch1 = u16::from_le_bytes([data[0], data[1]]);
        let ch0 = u16::from_le_bytes([data[2], data[3]]);
        Ok((ch0, ch1))
    }

    /// Ambient light in lux
    pub fn lux(&mut self) -> SensorResult<f32> {
        let (ch0, ch1) = self.als_channels()?;
        Ok(lux_from_channels(ch0, ch1))
    }

    /// Proximity reading
    pub fn proximity(&mut self) -> SensorResult<Proximity> {
        let mut data = [0u8; 2];
        self.bus
            .read_block(self.address, REG_PS_DATA, &mut data)
            .map_err(|cause| SensorError::read(REG_PS_DATA, cause))?;
        Ok(Proximity {
            count: u16::from_le_bytes(data) & PS_COUNT_MASK,
            saturated: data[1] & PS_SATURATED != 0,
        })
    }

    /// Transfers attempted so far, retries included
    pub fn attempts_used(&self) -> u32 {
        self.bus.attempts_used()
    }

    /// Give the bus and delay back
    pub fn release(self) -> (B, D) {
        self.bus.release()
    }
}

/// Lux from the visible+IR (CH0) and IR (CH1) counts at 4x gain, 50 ms
pub fn lux_from_channels(ch0: u16, ch1: u16) -> f32 {
    let (ch0, ch1) = (ch0 as f32, ch1 as f32);
    let sum = ch0 + ch1;
    let ratio = if sum > 0.0 { ch1 * 100.0 / sum } else { 101.0 };
    let idx = match ratio {
        r if r < 45.0 => 0,
        r if r < 64.0 => 1,
        r if r < 85.0 => 2,
        _ => 3,
    };
    let lux = ch0 * CH0_COEFFICIENTS[idx] - ch1 * CH1_COEFFICIENTS[idx];
    lux / (ALS_INTEGRATION_MS / 100.0) / ALS_GAIN / 10_000.0
}
