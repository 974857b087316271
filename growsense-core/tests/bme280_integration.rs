//! BME280 startup and measurement against a simulated register file

#![cfg(test)]

mod common;

use approx::assert_relative_eq;
use growsense_core::{
    bme280::{Bme280, REG_CALIB_H, REG_CALIB_H1, REG_CALIB_TP, REG_CHIP_ID, REG_CONFIG, REG_CTRL_HUM, REG_CTRL_MEAS, REG_DATA},
    SensorError,
};

use common::{ClockDelay, RegisterBus};

const BME: u8 = 0x76;

fn trimmed_part() -> RegisterBus {
    let coefficients: [i32; 12] = [27504, 26435, -1000, 36477, -10685, 3024, 2855, 140, -7, 15500, -14600, 6000];
    let mut tp = Vec::new();
    for c in coefficients {
        tp.extend_from_slice(&(c as u16).to_le_bytes());
    }

    let mut bus = RegisterBus::new();
    bus.set(BME, REG_CHIP_ID, &[0x60])
        .set(BME, REG_CALIB_TP, &tp)
        .set(BME, REG_CALIB_H1, &[75])
        .set(BME, REG_CALIB_H, &[0x6A, 0x01, 0x00, 0x14, 0x24, 0x03, 30])
        .set(BME, REG_DATA, &[0x65, 0x5A, 0xC0, 0x7E, 0xED, 0x00, 0x75, 0x30]);
    bus
}

#[test]
fn test_init_loads_trimming_and_starts_sampling() {
    let mut bus = trimmed_part();
    let mut delay = ClockDelay::default();
    let bme = Bme280::init(&mut bus, BME, &mut delay).unwrap();

    let comp = *bme.compensation();
    assert_eq!((comp.t1, comp.t2, comp.t3), (27504, 26435, -1000));
    assert_eq!((comp.p1, comp.p9), (36477, 6000));
    assert_eq!((comp.h1, comp.h2, comp.h4, comp.h5, comp.h6), (75, 362, 324, 50, 30));
    drop(bme);

    let writes: Vec<(u8, u8)> = bus.writes().iter().map(|t| (t.register, t.bytes[0])).collect();
    assert_eq!(writes, vec![(REG_CTRL_HUM, 0x01), (REG_CTRL_MEAS, 0x27), (REG_CONFIG, 0xA0)]);
    assert!(delay.total_ms() > 0);
}

#[test]
fn test_measurement_matches_vendor_vector() {
    let mut bus = trimmed_part();
    let mut bme = Bme280::init(&mut bus, BME, &mut ClockDelay::default()).unwrap();

    let m = bme.read().unwrap();
    assert_relative_eq!(m.temperature_c, 25.08);
    assert_relative_eq!(m.pressure_hpa, 1006.5325, max_relative = 1e-6);
    assert_relative_eq!(m.humidity_pct, 51.080078, max_relative = 1e-6);
}

#[test]
fn test_wrong_chip_id() {
    let mut bus = trimmed_part();
    bus.set(BME, REG_CHIP_ID, &[0x58]);
    let err = Bme280::init(&mut bus, BME, &mut ClockDelay::default()).unwrap_err();
    assert_eq!(err, SensorError::DeviceNotFound { part_id: 0x58 });
}
