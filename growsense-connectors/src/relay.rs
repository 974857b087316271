//! 8-channel relay board
//!
//! Logical channels 1-8 map to output lines through a fixed table, checked
//! once when the board is built. Every line starts low (relay released).
//! Line state is tracked here rather than read back from the pin, since
//! plain output pins cannot report their level.

use embedded_hal::digital::OutputPin;

use crate::{ConnectorError, ConnectorResult};

/// Number of relay channels
pub const CHANNELS: usize = 8;

/// BCM GPIO line driving each channel, indexed by channel − 1
///
/// Header pins 29, 31, 33, 35, 37, 32, 36, 38.
pub const BCM_LINES: [u32; CHANNELS] = [5, 6, 13, 19, 26, 12, 16, 20];

/// A validated channel number, 1-8
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RelayChannel(u8);

impl RelayChannel {
    /// Validate a channel number
    pub fn new(channel: u8) -> ConnectorResult<Self> {
        if (1..=CHANNELS as u8).contains(&channel) {
            Ok(Self(channel))
        } else {
            Err(ConnectorError::InvalidChannel(channel))
        }
    }

    /// Channel number as printed on the board
    pub fn number(self) -> u8 {
        self.0
    }

    /// GPIO line for this channel
    pub fn line(self) -> u32 {
        BCM_LINES[self.index()]
    }

    fn index(self) -> usize {
        self.0 as usize - 1
    }
}

/// The relay board, generic over the pin implementation
pub struct RelayBoard<P> {
    pins: [P; CHANNELS],
    states: [bool; CHANNELS],
}

impl<P: OutputPin> RelayBoard<P> {
    /// Take the eight pins in channel order and drive them all low
    pub fn new(mut pins: [P; CHANNELS]) -> ConnectorResult<Self> {
        for (i, pin) in pins.iter_mut().enumerate() {
            pin.set_low()
                .map_err(|e| ConnectorError::Pin(format!("channel {}: {:?}", i + 1, e)))?;
        }
        Ok(Self { pins, states: [false; CHANNELS] })
    }

    /// Energise or release one channel
    pub fn set(&mut self, channel: u8, on: bool) -> ConnectorResult<()> {
        let channel = RelayChannel::new(channel)?;
        let pin = &mut self.pins[channel.index()];
        let result = if on { pin.set_high() } else { pin.set_low() };
        result.map_err(|e| ConnectorError::Pin(format!("channel {}: {:?}", channel.number(), e)))?;
        self.states[channel.index()] = on;
        log::debug!("Relay {} (GPIO{}) {}", channel.number(), channel.line(), if on { "on" } else { "off" });
        Ok(())
    }

    /// Switch a channel on
    pub fn on(&mut self, channel: u8) -> ConnectorResult<()> {
        self.set(channel, true)
    }

    /// Switch a channel off
    pub fn off(&mut self, channel: u8) -> ConnectorResult<()> {
        self.set(channel, false)
    }

    /// Flip a channel, returning its new state
    pub fn toggle(&mut self, channel: u8) -> ConnectorResult<bool> {
        let next = !self.is_on(channel)?;
        self.set(channel, next)?;
        Ok(next)
    }

    /// Current state of a channel
    pub fn is_on(&self, channel: u8) -> ConnectorResult<bool> {
        Ok(self.states[RelayChannel::new(channel)?.index()])
    }

    /// Release every channel
    pub fn all_off(&mut self) -> ConnectorResult<()> {
        for channel in 1..=CHANNELS as u8 {
            self.off(channel)?;
        }
        Ok(())
    }

    /// Give the pins back
    pub fn release(self) -> [P; CHANNELS] {
        self.pins
    }
}
