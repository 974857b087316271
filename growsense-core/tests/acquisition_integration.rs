//! Integration tests for the analog acquisition path
//!
//! Covers config write → wait → result read → decode → filter → calibrate
//! against a simulated register file.

#![cfg(test)]

mod common;

use approx::assert_relative_eq;
use growsense_core::{
    ads1115::{Ads1115, ConversionState, ConversionWait, REG_CONFIG, REG_CONVERSION},
    calibration::{Calibrate, CalibrationEngine, CalibrationModel, LinearScale, SensorKind, TdsCurve, Thermistor, Unit},
    codec::{decode_config, Channel, ChannelConfig, DataRate, Gain, Mode},
    sampling::{collect, sample_calibrated, sample_filtered, Filter, SamplePlan},
    BusOp, SensorError, TransportError,
};

use common::{script_conversions, ClockDelay, RegisterBus};

const ADC: u8 = 0x48;

#[test]
fn test_single_acquisition_register_traffic() {
    let mut bus = RegisterBus::new();
    script_conversions(&mut bus, ADC, &[-1234]);

    let mut adc = Ads1115::new(&mut bus, ClockDelay::default(), ADC);
    let config = ChannelConfig::single_shot(Channel::A2, Gain::Two, DataRate::Sps250);
    assert_eq!(adc.acquire(&config).unwrap(), -1234);
    assert_eq!(adc.state(), ConversionState::Idle);
    drop(adc);

    assert_eq!(bus.log.len(), 2);
    let write = &bus.log[0];
    assert_eq!((write.register, write.op), (REG_CONFIG, BusOp::Write));
    let word = u16::from_be_bytes([write.bytes[0], write.bytes[1]]);
    let decoded = decode_config(word);
    assert_eq!(decoded, config);
    assert_eq!(decoded.mode, Mode::SingleShot);
    assert_eq!(word & 0x8000, 0x8000);

    let read = &bus.log[1];
    assert_eq!((read.register, read.op), (REG_CONVERSION, BusOp::Read));
}

#[test]
fn test_median_burst_with_spacing() {
    let mut bus = RegisterBus::new();
    script_conversions(&mut bus, ADC, &[100, 300, 200, 30000, 250]);

    let mut adc = Ads1115::new(&mut bus, ClockDelay::default(), ADC)
        .with_wait(ConversionWait::Fixed(5));
    let config = ChannelConfig::single_shot(Channel::A0, Gain::One, DataRate::Sps128);
    let plan = SamplePlan::new(5, 40, Filter::Median);

    let filtered = sample_filtered(&mut adc, &config, &plan).unwrap();
    assert_eq!(filtered, 250.0);

    let (_, delay) = adc.release();
    // Five conversion waits, four gaps, nothing after the last sample
    assert_eq!(delay.calls_ms, vec![5, 40, 5, 40, 5, 40, 5, 40, 5]);
}

#[test]
fn test_collect_keeps_acquisition_order() {
    let mut bus = RegisterBus::new();
    script_conversions(&mut bus, ADC, &[3, 1, 2]);

    let mut adc = Ads1115::new(&mut bus, ClockDelay::default(), ADC);
    let config = ChannelConfig::single_shot(Channel::A0, Gain::One, DataRate::Sps860);
    let samples = collect(&mut adc, &config, &SamplePlan::new(3, 0, Filter::Median)).unwrap();

    assert_eq!(samples.as_slice(), &[3.0, 1.0, 2.0]);
    assert_eq!(Filter::Median.apply(&samples).unwrap(), 2.0);
    assert_eq!(samples.as_slice(), &[3.0, 1.0, 2.0]);
}

#[test]
fn test_invalid_plan_rejected_before_io() {
    let mut bus = RegisterBus::new();
    let mut adc = Ads1115::new(&mut bus, ClockDelay::default(), ADC);
    let config = ChannelConfig::single_shot(Channel::A0, Gain::One, DataRate::Sps128);

    for count in [0, 65] {
        let err = sample_filtered(&mut adc, &config, &SamplePlan::new(count, 10, Filter::Mean)).unwrap_err();
        assert!(matches!(err, SensorError::InvalidParameter { .. }));
    }
    drop(adc);
    assert!(bus.log.is_empty());
}

#[test]
fn test_invalid_raw_config_rejected_before_io() {
    assert!(ChannelConfig::from_raw(4, "1", 128).is_err());
    assert!(ChannelConfig::from_raw(0, "3", 128).is_err());
    assert!(ChannelConfig::from_raw(0, "1", 100).is_err());
    assert_eq!(
        ChannelConfig::from_raw(3, "2/3", 860).unwrap(),
        ChannelConfig::single_shot(Channel::A3, Gain::TwoThirds, DataRate::Sps860)
    );
}

#[test]
fn test_transport_failure_mid_burst_aborts() {
    let mut bus = RegisterBus::new();
    script_conversions(&mut bus, ADC, &[10, 10, 10]);
    bus.fail(ADC, REG_CONVERSION, BusOp::Read, 1);

    let mut adc = Ads1115::new(&mut bus, ClockDelay::default(), ADC);
    let config = ChannelConfig::single_shot(Channel::A0, Gain::One, DataRate::Sps128);
    let err = sample_filtered(&mut adc, &config, &SamplePlan::new(3, 0, Filter::Mean)).unwrap_err();

    assert_eq!(
        err,
        SensorError::Transport { register: REG_CONVERSION, op: BusOp::Read, cause: TransportError::NoAcknowledge }
    );
    assert_eq!(adc.state(), ConversionState::Idle);

    // The next acquisition restarts cleanly from a fresh config write
    assert_eq!(adc.acquire(&config).unwrap(), 10);
}

#[test]
fn test_conductivity_reading_end_to_end() {
    let mut bus = RegisterBus::new();
    script_conversions(&mut bus, ADC, &[12000; 30]);

    let mut adc = Ads1115::new(&mut bus, ClockDelay::default(), ADC);
    let config = ChannelConfig::single_shot(Channel::A0, Gain::TwoThirds, DataRate::Sps128);
    let reading = sample_calibrated(&mut adc, &config, &SamplePlan::conductivity(), &TdsCurve::reference()).unwrap();

    assert_eq!(reading.unit, Unit::PartsPerMillion);
    assert_relative_eq!(reading.value, 801.025, max_relative = 1e-4);
}

#[test]
fn test_engine_converts_rail_and_thermistor() {
    let mut engine = CalibrationEngine::new();
    engine
        .register(SensorKind::VoltageRail, CalibrationModel::Linear(LinearScale::for_gain(Gain::TwoThirds, 1.0028)))
        .unwrap();
    engine.register(SensorKind::Thermistor, CalibrationModel::SteinhartHart(Thermistor::reference())).unwrap();

    let mut bus = RegisterBus::new();
    script_conversions(&mut bus, ADC, &[26_667; 10]);
    let mut adc = Ads1115::new(&mut bus, ClockDelay::default(), ADC);
    let config = ChannelConfig::single_shot(Channel::A0, Gain::TwoThirds, DataRate::Sps860);
    let raw = sample_filtered(&mut adc, &config, &SamplePlan::rails()).unwrap();

    let rail = engine.convert(SensorKind::VoltageRail, raw).unwrap();
    assert_relative_eq!(rail.value, 26_667.0 * 6.144 / 32768.0 * 1.0028, max_relative = 1e-6);

    // Full-scale thermistor input means the divider is open
    let model = engine.model(SensorKind::Thermistor).unwrap();
    assert!(matches!(model.calibrate(32767.0), Err(SensorError::Domain { .. })));
}
