//! ADS1115 Register Codec
//!
//! ## Config Register Layout
//!
//! ```text
//!  15  14 13 12  11 10 9   8     7 6 5   4     3    2    1 0
//! ┌──┬─────────┬────────┬────┬───────┬─────┬────┬────┬─────┐
//! │OS│   MUX   │  PGA   │MODE│  DR   │CMODE│CPOL│CLAT│CQUE │
//! └──┴─────────┴────────┴────┴───────┴─────┴────┴────┴─────┘
//! ```
//!
//! Each configuration axis is a closed enum carrying its bit pattern and its
//! physical meaning, so an out-of-range channel or gain cannot reach the bus.
//! Numeric constructors (`Channel::from_index`, `DataRate::from_sps`, ...) are
//! the only fallible entry points and reject bad input with
//! [`SensorError::InvalidParameter`].
//!
//! ## Result Decoding
//!
//! Results arrive as two bytes. `decode_unsigned` joins them; `decode_signed`
//! reinterprets the joined value as two's complement:
//!
//! ```text
//! 0x0000..=0x7FFF  →  0..=32767
//! 0x8000..=0xFFFF  →  value - 65536
//! ```

use crate::errors::{SensorError, SensorResult};

/// Start a single conversion (write) / conversion idle (read)
pub const CONFIG_OS_SINGLE: u16 = 0x8000;
/// Input multiplexer field
pub const CONFIG_MUX_MASK: u16 = 0x7000;
/// Programmable gain amplifier field
pub const CONFIG_PGA_MASK: u16 = 0x0E00;
/// Operating mode bit
pub const CONFIG_MODE_MASK: u16 = 0x0100;
/// Data rate field
pub const CONFIG_DR_MASK: u16 = 0x00E0;
/// Comparator queue field: `0b11` disables the comparator
pub const CONFIG_COMP_QUE_DISABLE: u16 = 0x0003;

/// Half of the signed 16-bit range, the count at full-scale voltage
pub const HALF_RANGE: f32 = 32768.0;

/// Input multiplexer setting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Channel {
    /// AIN0 − AIN1
    Diff01,
    /// AIN0 − AIN3
    Diff03,
    /// AIN1 − AIN3
    Diff13,
    /// AIN2 − AIN3
    Diff23,
    /// AIN0 − GND
    A0,
    /// AIN1 − GND
    A1,
    /// AIN2 − GND
    A2,
    /// AIN3 − GND
    A3,
}

impl Channel {
    const ALL: [Channel; 8] = [
        Channel::Diff01, Channel::Diff03, Channel::Diff13, Channel::Diff23,
        Channel::A0, Channel::A1, Channel::A2, Channel::A3,
    ];

    /// Single-ended channel by input index 0-3
    pub fn from_index(index: u8) -> SensorResult<Self> {
        match index {
            0 => Ok(Channel::A0),
            1 => Ok(Channel::A1),
            2 => Ok(Channel::A2),
            3 => Ok(Channel::A3),
            _ => Err(SensorError::InvalidParameter { what: "channel must be 0-3" }),
        }
    }

    /// MUX field bit pattern
    pub const fn bits(self) -> u16 {
        (self as u16) << 12
    }

    fn from_bits(word: u16) -> Self {
        Self::ALL[((word & CONFIG_MUX_MASK) >> 12) as usize]
    }
}

/// Programmable gain setting, named after the ADS1115 gain step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Gain {
    /// ±6.144 V
    TwoThirds,
    /// ±4.096 V
    One,
    /// ±2.048 V
    Two,
    /// ±1.024 V
    Four,
    /// ±0.512 V
    Eight,
    /// ±0.256 V
    Sixteen,
}

impl Gain {
    const ALL: [Gain; 6] = [
        Gain::TwoThirds, Gain::One, Gain::Two, Gain::Four, Gain::Eight, Gain::Sixteen,
    ];

    /// Parse the conventional gain label ("2/3", "1", "2", "4", "8", "16")
    pub fn from_label(label: &str) -> SensorResult<Self> {
        match label {
            "2/3" => Ok(Gain::TwoThirds),
            "1" => Ok(Gain::One),
            "2" => Ok(Gain::Two),
            "4" => Ok(Gain::Four),
            "8" => Ok(Gain::Eight),
            "16" => Ok(Gain::Sixteen),
            _ => Err(SensorError::InvalidParameter { what: "gain must be one of 2/3, 1, 2, 4, 8, 16" }),
        }
    }

    /// Full-scale input voltage for this gain
    pub const fn full_scale_volts(self) -> f32 {
        match self {
            Gain::TwoThirds => 6.144,
            Gain::One => 4.096,
            Gain::Two => 2.048,
            Gain::Four => 1.024,
            Gain::Eight => 0.512,
            Gain::Sixteen => 0.256,
        }
    }

    /// PGA field bit pattern
    pub const fn bits(self) -> u16 {
        (self as u16) << 9
    }

    fn from_bits(word: u16) -> Self {
        // 0b101, 0b110 and 0b111 all select ±0.256 V
        let index = ((word & CONFIG_PGA_MASK) >> 9) as usize;
        Self::ALL[index.min(Self::ALL.len() - 1)]
    }
}

/// Conversion data rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum DataRate {
    /// 8 samples per second
    Sps8,
    /// 16 samples per second
    Sps16,
    /// 32 samples per second
    Sps32,
    /// 64 samples per second
    Sps64,
    /// 128 samples per second (power-on default)
    Sps128,
    /// 250 samples per second
    Sps250,
    /// 475 samples per second
    Sps475,
    /// 860 samples per second
    Sps860,
}

impl DataRate {
    const ALL: [DataRate; 8] = [
        DataRate::Sps8, DataRate::Sps16, DataRate::Sps32, DataRate::Sps64,
        DataRate::Sps128, DataRate::Sps250, DataRate::Sps475, DataRate::Sps860,
    ];

    /// Look up a data rate by its samples-per-second value
    pub fn from_sps(sps: u16) -> SensorResult<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|rate| rate.samples_per_second() == sps)
            .ok_or(SensorError::InvalidParameter {
                what: "data rate must be 8, 16, 32, 64, 128, 250, 475 or 860 SPS",
            })
    }

    /// Nominal samples per second
    pub const fn samples_per_second(self) -> u16 {
        match self {
            DataRate::Sps8 => 8,
            DataRate::Sps16 => 16,
            DataRate::Sps32 => 32,
            DataRate::Sps64 => 64,
            DataRate::Sps128 => 128,
            DataRate::Sps250 => 250,
            DataRate::Sps475 => 475,
            DataRate::Sps860 => 860,
        }
    }

    /// DR field bit pattern
    pub const fn bits(self) -> u16 {
        (self as u16) << 5
    }

    fn from_bits(word: u16) -> Self {
        Self::ALL[((word & CONFIG_DR_MASK) >> 5) as usize]
    }
}

/// Conversion mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Mode {
    /// Convert continuously
    Continuous,
    /// Power down after each conversion
    SingleShot,
}

impl Mode {
    /// MODE bit pattern
    pub const fn bits(self) -> u16 {
        match self {
            Mode::Continuous => 0,
            Mode::SingleShot => CONFIG_MODE_MASK,
        }
    }

    fn from_bits(word: u16) -> Self {
        if word & CONFIG_MODE_MASK != 0 {
            Mode::SingleShot
        } else {
            Mode::Continuous
        }
    }
}

/// Everything needed to start one conversion on one input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChannelConfig {
    /// Input multiplexer
    pub channel: Channel,
    /// Full-scale range
    pub gain: Gain,
    /// Conversion rate
    pub data_rate: DataRate,
    /// Conversion mode
    pub mode: Mode,
}

impl ChannelConfig {
    /// Single-shot configuration
    pub const fn single_shot(channel: Channel, gain: Gain, data_rate: DataRate) -> Self {
        Self { channel, gain, data_rate, mode: Mode::SingleShot }
    }

    /// Build from raw numbers, validating every axis before any I/O
    pub fn from_raw(channel: u8, gain: &str, sps: u16) -> SensorResult<Self> {
        Ok(Self::single_shot(
            Channel::from_index(channel)?,
            Gain::from_label(gain)?,
            DataRate::from_sps(sps)?,
        ))
    }

    /// Config register word for this configuration
    pub fn encode(&self) -> u16 {
        encode_config(self.channel, self.gain, self.mode, self.data_rate)
    }
}

/// Combine field patterns into a config word that starts a conversion
pub fn encode_config(channel: Channel, gain: Gain, mode: Mode, data_rate: DataRate) -> u16 {
    CONFIG_OS_SINGLE
        | channel.bits()
        | gain.bits()
        | mode.bits()
        | data_rate.bits()
        | CONFIG_COMP_QUE_DISABLE
}

/// Recover the configuration axes from a config word by masking
pub fn decode_config(word: u16) -> ChannelConfig {
    ChannelConfig {
        channel: Channel::from_bits(word),
        gain: Gain::from_bits(word),
        data_rate: DataRate::from_bits(word),
        mode: Mode::from_bits(word),
    }
}

/// `(high << 8) | low`
pub fn decode_unsigned(low: u8, high: u8) -> u16 {
    ((high as u16) << 8) | low as u16
}

/// Two's-complement view of `decode_unsigned`
pub fn decode_signed(low: u8, high: u8) -> i16 {
    let unsigned = decode_unsigned(low, high) as i32;
    let signed = if unsigned >= 1 << 15 { unsigned - (1 << 16) } else { unsigned };
    signed as i16
}

/// Split a signed value into `(low, high)` bytes
pub fn encode_signed(value: i16) -> (u8, u8) {
    let [high, low] = value.to_be_bytes();
    (low, high)
}
