//! BME280 Barometric Sensor
//!
//! ## Fixed-Point Compensation
//!
//! The BME280 reports uncompensated 20-bit temperature and pressure and a
//! 16-bit humidity value. Each part is factory-trimmed; the trimming
//! coefficients are read once at startup and fed through the vendor's integer
//! algorithm:
//!
//! ```text
//! adc_T ──▶ t_fine ──▶ temperature (0.01 °C)
//!              │
//!              ├──▶ pressure  (Q24.8 Pa, 64-bit path)
//!              └──▶ humidity  (Q22.10 %RH)
//! ```
//!
//! The integer steps are reproduced operation for operation, including
//! arithmetic right shifts and truncating division. Temperature and humidity
//! intermediates are carried in `i64` so out-of-range raw values cannot
//! overflow; for any input where the vendor's 32-bit arithmetic is exact the
//! results are identical.
//!
//! Conversion to floating point happens only at the API boundary
//! ([`Measurement`]).
//!
//! ## Register Map
//!
//! | Register  | Contents                              |
//! |-----------|---------------------------------------|
//! | 0x88–0x9F | T1..T3, P1..P9 (little-endian)        |
//! | 0xA1      | H1                                    |
//! | 0xD0      | chip id (0x60)                        |
//! | 0xE1–0xE7 | H2..H6 (H4/H5 packed as 12-bit)       |
//! | 0xF2      | ctrl_hum                              |
//! | 0xF4      | ctrl_meas                             |
//! | 0xF5      | config                                |
//! | 0xF7–0xFE | press[19:0], temp[19:0], hum[15:0]    |

use embedded_hal::delay::DelayNs;

use crate::{
    errors::{SensorError, SensorResult},
    traits::BusTransport,
};

/// Trimming coefficients T1..P9
pub const REG_CALIB_TP: u8 = 0x88;
/// H1 coefficient
pub const REG_CALIB_H1: u8 = 0xA1;
/// Chip identification
pub const REG_CHIP_ID: u8 = 0xD0;
/// H2..H6 coefficients
pub const REG_CALIB_H: u8 = 0xE1;
/// Humidity oversampling
pub const REG_CTRL_HUM: u8 = 0xF2;
/// Temperature/pressure oversampling and mode
pub const REG_CTRL_MEAS: u8 = 0xF4;
/// Standby, filter
pub const REG_CONFIG: u8 = 0xF5;
/// First data register
pub const REG_DATA: u8 = 0xF7;

/// Value of the chip id register
pub const CHIP_ID: u8 = 0x60;

const CALIB_TP_LEN: usize = 24;
const CALIB_H_LEN: usize = 7;
const DATA_LEN: usize = 8;

// osrs_h ×1
const CTRL_HUM_VALUE: u8 = 0x01;
// osrs_t ×1, osrs_p ×1, normal mode
const CTRL_MEAS_VALUE: u8 = 0x27;
// 1000 ms standby, filter off
const CONFIG_VALUE: u8 = 0xA0;
// Covers one ×1/×1/×1 measurement
const FIRST_MEASUREMENT_MS: u32 = 10;

const HUMIDITY_MAX_Q22: i64 = 419_430_400;

/// Factory trimming coefficients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[allow(missing_docs)]
pub struct Compensation {
    pub t1: u16,
    pub t2: i16,
    pub t3: i16,
    pub p1: u16,
    pub p2: i16,
    pub p3: i16,
    pub p4: i16,
    pub p5: i16,
    pub p6: i16,
    pub p7: i16,
    pub p8: i16,
    pub p9: i16,
    pub h1: u8,
    pub h2: i16,
    pub h3: u8,
    pub h4: i16,
    pub h5: i16,
    pub h6: i8,
}

impl Compensation {
    /// Parse the three calibration blocks as read from the device
    pub fn from_registers(tp: &[u8; CALIB_TP_LEN], h1: u8, h: &[u8; CALIB_H_LEN]) -> Self {
        let u16_at = |i: usize| u16::from_le_bytes([tp[i], tp[i + 1]]);
        let i16_at = |i: usize| i16::from_le_bytes([tp[i], tp[i + 1]]);

        Self {
            t1: u16_at(0),
            t2: i16_at(2),
            t3: i16_at(4),
            p1: u16_at(6),
            p2: i16_at(8),
            p3: i16_at(10),
            p4: i16_at(12),
            p5: i16_at(14),
            p6: i16_at(16),
            p7: i16_at(18),
            p8: i16_at(20),
            p9: i16_at(22),
            h1,
            h2: i16::from_le_bytes([h[0], h[1]]),
            h3: h[2],
            // 0xE4[7:0] / 0xE5[3:0] and 0xE6[7:0] / 0xE5[7:4], both signed 12-bit
            h4: ((h[3] as i8 as i16) << 4) | (h[4] & 0x0F) as i16,
            h5: ((h[5] as i8 as i16) << 4) | (h[4] >> 4) as i16,
            h6: h[6] as i8,
        }
    }

    /// Fine temperature shared by all three compensations
    pub fn t_fine(&self, adc_t: i32) -> i32 {
        let adc_t = adc_t as i64;
        let t1 = self.t1 as i64;

        let var1 = (((adc_t >> 3) - (t1 << 1)) * self.t2 as i64) >> 11;
        let var2 = (((((adc_t >> 4) - t1) * ((adc_t >> 4) - t1)) >> 12) * self.t3 as i64) >> 14;
        (var1 + var2) as i32
    }

    /// Temperature in 0.01 °C
    pub fn temperature(&self, t_fine: i32) -> i32 {
        ((t_fine as i64 * 5 + 128) >> 8) as i32
    }

    /// Pressure in Pa as unsigned Q24.8; 0 when the divisor vanishes
    pub fn pressure(&self, adc_p: i32, t_fine: i32) -> u32 {
        let mut var1 = t_fine as i64 - 128_000;
        let mut var2 = var1 * var1 * self.p6 as i64;
        var2 += (var1 * self.p5 as i64) << 17;
        var2 += (self.p4 as i64) << 35;
        var1 = ((var1 * var1 * self.p3 as i64) >> 8) + ((var1 * self.p2 as i64) << 12);
        var1 = (((1i64 << 47) + var1) * self.p1 as i64) >> 33;
        if var1 == 0 {
            return 0;
        }

        let mut p = 1_048_576 - adc_p as i64;
        p = (((p << 31) - var2) * 3125) / var1;
        let var1 = (self.p9 as i64 * (p >> 13) * (p >> 13)) >> 25;
        let var2 = (self.p8 as i64 * p) >> 19;
        (((p + var1 + var2) >> 8) + ((self.p7 as i64) << 4)) as u32
    }

    /// Relative humidity as unsigned Q22.10 %RH
    pub fn humidity(&self, adc_h: i32, t_fine: i32) -> u32 {
        let adc_h = adc_h as i64;
        let h1 = self.h1 as i64;
        let h2 = self.h2 as i64;
        let h3 = self.h3 as i64;
        let h4 = self.h4 as i64;
        let h5 = self.h5 as i64;
        let h6 = self.h6 as i64;

        let mut v = t_fine as i64 - 76_800;
        v = ((((adc_h << 14) - (h4 << 20) - (h5 * v)) + 16_384) >> 15)
            * (((((((v * h6) >> 10) * (((v * h3) >> 11) + 32_768)) >> 10) + 2_097_152) * h2 + 8_192) >> 14);
        v -= ((((v >> 15) * (v >> 15)) >> 7) * h1) >> 4;
        v = v.clamp(0, HUMIDITY_MAX_Q22);
        (v >> 12) as u32
    }

    /// Compensate one raw data frame
    pub fn compensate(&self, raw: &RawSample) -> Measurement {
        let t_fine = self.t_fine(raw.adc_t);
        Measurement {
            temperature_c: self.temperature(t_fine) as f32 / 100.0,
            pressure_hpa: self.pressure(raw.adc_p, t_fine) as f32 / 25_600.0,
            humidity_pct: self.humidity(raw.adc_h, t_fine) as f32 / 1024.0,
        }
    }
}

/// Uncompensated values from one data burst
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawSample {
    /// 20-bit pressure
    pub adc_p: i32,
    /// 20-bit temperature
    pub adc_t: i32,
    /// 16-bit humidity
    pub adc_h: i32,
}

impl RawSample {
    /// Unpack the 0xF7..0xFE burst (MSB first, 20-bit values left-aligned)
    pub fn from_burst(d: &[u8; DATA_LEN]) -> Self {
        let twenty = |msb: u8, lsb: u8, xlsb: u8| ((msb as i32) << 12) | ((lsb as i32) << 4) | ((xlsb as i32) >> 4);
        Self {
            adc_p: twenty(d[0], d[1], d[2]),
            adc_t: twenty(d[3], d[4], d[5]),
            adc_h: ((d[6] as i32) << 8) | d[7] as i32,
        }
    }
}

/// Compensated reading in engineering units
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Measurement {
    /// Air temperature (°C)
    pub temperature_c: f32,
    /// Barometric pressure (hPa)
    pub pressure_hpa: f32,
    /// Relative humidity (%)
    pub humidity_pct: f32,
}

/// BME280 configured for continuous ×1 sampling
#[derive(Debug)]
pub struct Bme280<B> {
    bus: B,
    address: u8,
    compensation: Compensation,
}

impl<B: BusTransport> Bme280<B> {
    /// Check the chip id, load trimming, start normal mode
    pub fn init<D: DelayNs>(mut bus: B, address: u8, delay: &mut D) -> SensorResult<Self> {
        let chip_id = bus
            .read_byte(address, REG_CHIP_ID)
            .map_err(|cause| SensorError::read(REG_CHIP_ID, cause))?;
        if chip_id != CHIP_ID {
            return Err(SensorError::DeviceNotFound { part_id: chip_id });
        }

        let mut tp = [0u8; CALIB_TP_LEN];
        bus.read_block(address, REG_CALIB_TP, &mut tp)
            .map_err(|cause| SensorError::read(REG_CALIB_TP, cause))?;
        let h1 = bus
            .read_byte(address, REG_CALIB_H1)
            .map_err(|cause| SensorError::read(REG_CALIB_H1, cause))?;
        let mut h = [0u8; CALIB_H_LEN];
        bus.read_block(address, REG_CALIB_H, &mut h)
            .map_err(|cause| SensorError::read(REG_CALIB_H, cause))?;
        let compensation = Compensation::from_registers(&tp, h1, &h);
        log_debug!("BME280@{:#04x}: trimming {:?}", address, compensation);

        // ctrl_hum only latches on the following ctrl_meas write
        for (register, value) in [
            (REG_CTRL_HUM, CTRL_HUM_VALUE),
            (REG_CTRL_MEAS, CTRL_MEAS_VALUE),
            (REG_CONFIG, CONFIG_VALUE),
        ] {
            bus.write_byte(address, register, value)
                .map_err(|cause| SensorError::write(register, cause))?;
        }
        delay.delay_ms(FIRST_MEASUREMENT_MS);

        Ok(Self { bus, address, compensation })
    }

    /// Trimming coefficients loaded at startup
    pub fn compensation(&self) -> &Compensation {
        &self.compensation
    }

    /// Read the latest uncompensated burst
    pub fn read_raw(&mut self) -> SensorResult<RawSample> {
        let mut data = [0u8; DATA_LEN];
        self.bus
            .read_block(self.address, REG_DATA, &mut data)
            .map_err(|cause| SensorError::read(REG_DATA, cause))?;
        Ok(RawSample::from_burst(&data))
    }

    /// Read and compensate
    pub fn read(&mut self) -> SensorResult<Measurement> {
        let raw = self.read_raw()?;
        Ok(self.compensation.compensate(&raw))
    }

    /// Give the bus back
    pub fn release(self) -> B {
        self.bus
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn datasheet_compensation() -> Compensation {
        Compensation {
            t1: 27504,
            t2: 26435,
            t3: -1000,
            p1: 36477,
            p2: -10685,
            p3: 3024,
            p4: 2855,
            p5: 140,
            p6: -7,
            p7: 15500,
            p8: -14600,
            p9: 6000,
            h1: 75,
            h2: 362,
            h3: 0,
            h4: 324,
            h5: 50,
            h6: 30,
        }
    }

    #[test]
    fn vendor_reference_vector() {
        let comp = datasheet_compensation();
        let t_fine = comp.t_fine(519_888);
        assert_eq!(t_fine, 128_422);
        assert_eq!(comp.temperature(t_fine), 2508);
        assert_eq!(comp.pressure(415_148, t_fine), 25_767_233);
    }

    #[test]
    fn humidity_fixed_point() {
        let comp = datasheet_compensation();
        let t_fine = comp.t_fine(519_888);
        assert_eq!(comp.humidity(30_000, t_fine), 52_306);
        assert_eq!(comp.humidity(26_000, t_fine), 29_425);
    }

    #[test]
    fn humidity_clamps_to_range() {
        let comp = datasheet_compensation();
        let t_fine = comp.t_fine(519_888);
        assert_eq!(comp.humidity(0, t_fine), 0);
        assert_eq!(comp.humidity(65_535, t_fine), 102_400);
    }

    #[test]
    fn zero_p1_yields_zero_pressure() {
        let comp = Compensation { p1: 0, ..datasheet_compensation() };
        assert_eq!(comp.pressure(415_148, 128_422), 0);
    }

    #[test]
    fn packed_humidity_coefficients() {
        let tp = [0u8; CALIB_TP_LEN];
        // H2 = 362, H3 = 0, E4 = 0x14, E5 = 0x24, E6 = 0x03, H6 = -2
        let h = [0x6A, 0x01, 0x00, 0x14, 0x24, 0x03, 0xFE];
        let comp = Compensation::from_registers(&tp, 75, &h);
        assert_eq!(comp.h2, 362);
        assert_eq!(comp.h4, 324);
        assert_eq!(comp.h5, 50);
        assert_eq!(comp.h6, -2);

        // Negative H4: E4 = 0xFF → -16 + low nibble
        let h = [0, 0, 0, 0xFF, 0x0F, 0x00, 0];
        assert_eq!(Compensation::from_registers(&tp, 0, &h).h4, -1);
    }

    #[test]
    fn burst_unpacking() {
        let raw = RawSample::from_burst(&[0x65, 0x5A, 0xC0, 0x7E, 0xED, 0x00, 0x75, 0x30]);
        assert_eq!(raw, RawSample { adc_p: 415_148, adc_t: 519_888, adc_h: 30_000 });
    }

    #[test]
    fn compensate_scales_at_boundary() {
        let m = datasheet_compensation().compensate(&RawSample { adc_p: 415_148, adc_t: 519_888, adc_h: 30_000 });
        approx::assert_relative_eq!(m.temperature_c, 25.08);
        approx::assert_relative_eq!(m.pressure_hpa, 1006.5325, max_relative = 1e-6);
        approx::assert_relative_eq!(m.humidity_pct, 51.080078);
    }
}
