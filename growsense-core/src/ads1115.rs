//! ADS1115 Conversion Driver
//!
//! ## Acquisition State Machine
//!
//! ```text
//!          write config           wait               read result
//!  Idle ───────────────▶ ConfigWritten ──▶ Converting ───────────▶ ResultReady
//!   ▲                                                                  │
//!   └──────────────────────────── decode ──────────────────────────────┘
//! ```
//!
//! A single acquisition owns the config and conversion registers from the
//! config write until the result read. `acquire` takes `&mut self`, so two
//! acquisitions cannot overlap on one handle; callers sharing a handle across
//! threads go through [`crate::shared::SharedDevice`].
//!
//! ## Errors
//!
//! The driver never retries. A failed transfer is reported as
//! [`SensorError::Transport`] naming the register, and the state machine
//! drops back to `Idle`: the next config write restarts the conversion from
//! scratch.

use embedded_hal::delay::DelayNs;

use crate::{
    calibration::LinearScale,
    codec::{decode_signed, ChannelConfig},
    constants::time::FIXED_CONVERSION_WAIT_MS,
    errors::{SensorError, SensorResult},
    time::conversion_time_us,
    traits::BusTransport,
};

/// Address with ADDR tied to GND
pub const ADS1115_DEFAULT_ADDRESS: u8 = 0x48;

/// Conversion result register
pub const REG_CONVERSION: u8 = 0x00;
/// Config register
pub const REG_CONFIG: u8 = 0x01;

/// How long to wait between starting a conversion and reading it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ConversionWait {
    /// Sleep a fixed number of milliseconds regardless of data rate
    Fixed(u32),
    /// Sleep the data rate's conversion time plus tolerance
    FromDataRate,
}

impl ConversionWait {
    /// Flat 100 ms sleep, independent of data rate
    pub const fn conservative() -> Self {
        ConversionWait::Fixed(FIXED_CONVERSION_WAIT_MS)
    }
}

impl Default for ConversionWait {
    fn default() -> Self {
        ConversionWait::FromDataRate
    }
}

/// Where the current acquisition is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionState {
    /// No conversion pending
    Idle,
    /// Config register written, conversion started
    ConfigWritten,
    /// Waiting out the conversion time
    Converting,
    /// Result register read and decoded
    ResultReady,
}

/// One ADS1115 on a bus
#[derive(Debug)]
pub struct Ads1115<B, D> {
    bus: B,
    delay: D,
    address: u8,
    wait: ConversionWait,
    calibration_factor: f32,
    state: ConversionState,
}

impl<B: BusTransport, D: DelayNs> Ads1115<B, D> {
    /// Driver for the device at `address`, waiting by data rate, no trim
    pub fn new(bus: B, delay: D, address: u8) -> Self {
        Self {
            bus,
            delay,
            address,
            wait: ConversionWait::default(),
            calibration_factor: 1.0,
            state: ConversionState::Idle,
        }
    }

    /// Use a different conversion wait policy
    pub fn with_wait(mut self, wait: ConversionWait) -> Self {
        self.wait = wait;
        self
    }

    /// Multiplicative trim applied by [`Ads1115::read_voltage`]
    pub fn with_calibration_factor(mut self, factor: f32) -> Self {
        self.calibration_factor = factor;
        self
    }

    /// Bus address of this device
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Device trim factor
    pub fn calibration_factor(&self) -> f32 {
        self.calibration_factor
    }

    /// Current acquisition state
    pub fn state(&self) -> ConversionState {
        self.state
    }

    /// Pause between acquisitions without releasing the device
    pub fn pause_ms(&mut self, ms: u32) {
        self.delay.delay_ms(ms);
    }

    /// Run one single-shot conversion and return the signed result
    pub fn acquire(&mut self, config: &ChannelConfig) -> SensorResult<i16> {
        let result = self.run_conversion(config);
        if let Err(err) = &result {
            log_debug!("ADS1115@{:#04x}: acquisition aborted in {:?}: {}", self.address, self.state, err);
        }
        self.transition(ConversionState::Idle);
        result
    }

    /// Acquire and scale to volts through the gain's full-scale range
    pub fn read_voltage(&mut self, config: &ChannelConfig) -> SensorResult<f32> {
        let raw = self.acquire(config)?;
        Ok(LinearScale::for_gain(config.gain, self.calibration_factor).volts(raw as f32))
    }

    /// Give the bus and delay back
    pub fn release(self) -> (B, D) {
        (self.bus, self.delay)
    }

    fn run_conversion(&mut self, config: &ChannelConfig) -> SensorResult<i16> {
        let word = config.encode();
        self.bus
            .write_block(self.address, REG_CONFIG, &word.to_be_bytes())
            .map_err(|cause| SensorError::write(REG_CONFIG, cause))?;
        self.transition(ConversionState::ConfigWritten);

        self.transition(ConversionState::Converting);
        match self.wait {
            ConversionWait::Fixed(ms) => self.delay.delay_ms(ms),
            ConversionWait::FromDataRate => self.delay.delay_us(conversion_time_us(config.data_rate)),
        }

        let mut buf = [0u8; 2];
        self.bus
            .read_block(self.address, REG_CONVERSION, &mut buf)
            .map_err(|cause| SensorError::read(REG_CONVERSION, cause))?;
        self.transition(ConversionState::ResultReady);

        // Result register is big-endian: high byte first
        Ok(decode_signed(buf[1], buf[0]))
    }

    fn transition(&mut self, next: ConversionState) {
        log_trace!("ADS1115@{:#04x}: {:?} -> {:?}", self.address, self.state, next);
        self.state = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{Channel, DataRate, Gain};
    use crate::errors::{BusOp, TransportError};

    #[derive(Default)]
    struct ScriptedBus {
        writes: std::vec::Vec<(u8, u8, std::vec::Vec<u8>)>,
        result: [u8; 2],
        fail_read: bool,
    }

    impl BusTransport for ScriptedBus {
        fn write_block(&mut self, address: u8, register: u8, bytes: &[u8]) -> Result<(), TransportError> {
            self.writes.push((address, register, bytes.to_vec()));
            Ok(())
        }

        fn read_block(&mut self, _address: u8, _register: u8, buf: &mut [u8]) -> Result<(), TransportError> {
            if self.fail_read {
                return Err(TransportError::NoAcknowledge);
            }
            buf.copy_from_slice(&self.result);
            Ok(())
        }
    }

    #[derive(Default)]
    struct TotalDelay {
        ns: u64,
    }

    impl DelayNs for TotalDelay {
        fn delay_ns(&mut self, ns: u32) {
            self.ns += ns as u64;
        }
    }

    #[test]
    fn writes_config_big_endian_and_decodes_result() {
        let bus = ScriptedBus { result: [0xFF, 0xFE], ..Default::default() };
        let mut adc = Ads1115::new(bus, TotalDelay::default(), 0x48);
        let config = ChannelConfig::single_shot(Channel::A1, Gain::One, DataRate::Sps128);

        let raw = adc.acquire(&config).unwrap();
        assert_eq!(raw, -2);
        assert_eq!(adc.state(), ConversionState::Idle);

        let (bus, delay) = adc.release();
        let word = config.encode();
        assert_eq!(bus.writes, vec![(0x48, REG_CONFIG, vec![(word >> 8) as u8, word as u8])]);
        assert_eq!(delay.ns, conversion_time_us(DataRate::Sps128) as u64 * 1000);
    }

    #[test]
    fn fixed_wait_sleeps_exactly() {
        let bus = ScriptedBus::default();
        let mut adc = Ads1115::new(bus, TotalDelay::default(), 0x48)
            .with_wait(ConversionWait::conservative());
        let config = ChannelConfig::single_shot(Channel::A0, Gain::One, DataRate::Sps860);

        adc.acquire(&config).unwrap();
        assert_eq!(adc.release().1.ns, 100_000_000);
    }

    #[test]
    fn read_failure_propagates_without_retry() {
        let bus = ScriptedBus { fail_read: true, ..Default::default() };
        let mut adc = Ads1115::new(bus, TotalDelay::default(), 0x48);
        let config = ChannelConfig::single_shot(Channel::A0, Gain::One, DataRate::Sps128);

        let err = adc.acquire(&config).unwrap_err();
        assert_eq!(err, SensorError::Transport {
            register: REG_CONVERSION,
            op: BusOp::Read,
            cause: TransportError::NoAcknowledge,
        });
        assert_eq!(adc.state(), ConversionState::Idle);
        assert_eq!(adc.release().0.writes.len(), 1);
    }

    #[test]
    fn voltage_uses_gain_and_trim() {
        // 0x4000 = 16384 counts = half of full scale
        let bus = ScriptedBus { result: [0x40, 0x00], ..Default::default() };
        let mut adc = Ads1115::new(bus, TotalDelay::default(), 0x49)
            .with_calibration_factor(1.0028);
        let config = ChannelConfig::single_shot(Channel::A0, Gain::TwoThirds, DataRate::Sps860);

        let volts = adc.read_voltage(&config).unwrap();
        approx::assert_relative_eq!(volts, 3.072 * 1.0028, max_relative = 1e-6);
    }
}
