//! Thermistor Calibration Example
//!
//! Converts a sweep of divider voltages to temperature with the rig's 10k NTC
//! coefficients, and shows what happens outside the divider's valid range.
//!
//! ## What You'll Learn
//!
//! - Building a calibration engine keyed by sensor kind
//! - Steinhart-Hart conversion and Fahrenheit output
//! - Domain errors instead of NaN for impossible inputs
//!
//! ## Running the Example
//!
//! ```bash
//! cargo run --example 01_thermistor
//! ```

use growsense_core::{
    calibration::{celsius_to_fahrenheit, Calibrate, CalibrationEngine, CalibrationModel, SensorKind, Thermistor},
    codec::{Gain, HALF_RANGE},
    SensorError,
};

fn main() -> Result<(), SensorError> {
    let mut engine = CalibrationEngine::new();
    engine.register(SensorKind::Thermistor, CalibrationModel::SteinhartHart(Thermistor::reference()))?;

    println!("{:>8} {:>10} {:>10}", "volts", "°C", "°F");
    for tenths in 5..=31 {
        let volts = tenths as f32 / 10.0;
        // Thermistor channel is read at ±4.096 V
        let raw = volts * HALF_RANGE / Gain::One.full_scale_volts();
        let reading = engine.convert(SensorKind::Thermistor, raw)?;
        println!(
            "{:>8.2} {:>10.2} {:>10.2}",
            volts,
            reading.value,
            celsius_to_fahrenheit(reading.value)
        );
    }

    // At or above the 3.17 V supply the divider math has no solution
    let open_circuit = Thermistor::reference().calibrate(32767.0);
    match open_circuit {
        Err(SensorError::Domain { reason }) => println!("open circuit rejected: {}", reason),
        other => println!("unexpected: {:?}", other),
    }

    Ok(())
}
