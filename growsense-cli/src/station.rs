//! One polling cycle across every device on the rig
//!
//! The water probe ADC is required; every other device is optional and is
//! dropped with a warning if it does not answer at startup. Within a cycle a
//! failed reading is recorded and logged, and the remaining readings go ahead.
//! `vcgencmd` runs on its own thread while the I2C devices are polled.

use std::thread;

use anyhow::{anyhow, Context, Result};
use embedded_hal::delay::DelayNs;
use log::{info, warn};

use growsense_connectors::cpu_temp::CpuTemperature;
use growsense_connectors::rail::{self, RailVoltage, VoltageProbe};
use growsense_core::ads1115::Ads1115;
use growsense_core::bme280::Bme280;
use growsense_core::calibration::{
    celsius_to_fahrenheit, CalibrationEngine, CalibrationModel, CpuDriftCompensator, LinearScale, PhCurve,
    SensorKind, TdsCurve, Thermistor,
};
use growsense_core::ltr559::{Handshake, Ltr559};
use growsense_core::sampling::{self, SamplePlan};
use growsense_core::zero2go::{PowerInput, Zero2Go};
use growsense_core::{BusTransport, Channel, ChannelConfig, CycleReport, DataRate, Gain, Retry, SensorResult};

use crate::config::AppConfig;

/// Readings of one cycle
pub type Report = CycleReport<anyhow::Error>;

/// CSV column names
pub mod column {
    pub const TDS_PPM: &str = "tds_ppm";
    pub const PH: &str = "ph";
    pub const PH_TEMP_RAW: &str = "ph_temp_raw";
    pub const WATER_C: &str = "water_c";
    pub const WATER_F: &str = "water_f";
    pub const AIR_C: &str = "air_c";
    pub const AIR_F: &str = "air_f";
    pub const PRESSURE_HPA: &str = "pressure_hpa";
    pub const HUMIDITY_PCT: &str = "humidity_pct";
    pub const LUX: &str = "lux";
    pub const PROXIMITY: &str = "proximity";
    pub const VREF5_V: &str = "vref5_v";
    pub const VREF3V3_V: &str = "vref3v3_v";
    pub const INPUT_A_V: &str = "input_a_v";
    pub const INPUT_B_V: &str = "input_b_v";
    pub const INPUT_C_V: &str = "input_c_v";
    pub const CPU_C: &str = "cpu_c";
    pub const CORE_V: &str = "core_v";
    pub const SDRAM_C_V: &str = "sdram_c_v";
    pub const SDRAM_I_V: &str = "sdram_i_v";
    pub const SDRAM_P_V: &str = "sdram_p_v";
}

/// Every column the log carries, in file order
pub const COLUMNS: [&str; 21] = [
    column::TDS_PPM,
    column::PH,
    column::PH_TEMP_RAW,
    column::WATER_C,
    column::WATER_F,
    column::AIR_C,
    column::AIR_F,
    column::PRESSURE_HPA,
    column::HUMIDITY_PCT,
    column::LUX,
    column::PROXIMITY,
    column::VREF5_V,
    column::VREF3V3_V,
    column::INPUT_A_V,
    column::INPUT_B_V,
    column::INPUT_C_V,
    column::CPU_C,
    column::CORE_V,
    column::SDRAM_C_V,
    column::SDRAM_I_V,
    column::SDRAM_P_V,
];

const POWER_COLUMNS: [&str; 3] = [column::INPUT_A_V, column::INPUT_B_V, column::INPUT_C_V];

// Probe ADC inputs
const TDS: ChannelConfig = ChannelConfig::single_shot(Channel::A0, Gain::One, DataRate::Sps860);
const PH: ChannelConfig = ChannelConfig::single_shot(Channel::A1, Gain::One, DataRate::Sps860);
const PH_TEMP: ChannelConfig = ChannelConfig::single_shot(Channel::A2, Gain::One, DataRate::Sps860);
const THERMISTOR: ChannelConfig = ChannelConfig::single_shot(Channel::A3, Gain::One, DataRate::Sps860);

// Rail ADC inputs
const VREF5: ChannelConfig = ChannelConfig::single_shot(Channel::A0, Gain::TwoThirds, DataRate::Sps860);
const VREF3V3: ChannelConfig = ChannelConfig::single_shot(Channel::A1, Gain::One, DataRate::Sps860);

fn system_rail_column(component: &str) -> Option<&'static str> {
    match component {
        "core" => Some(column::CORE_V),
        "sdram_c" => Some(column::SDRAM_C_V),
        "sdram_i" => Some(column::SDRAM_I_V),
        "sdram_p" => Some(column::SDRAM_P_V),
        _ => None,
    }
}

struct RailMonitor<B, D> {
    adc: Ads1115<B, D>,
    vref5: LinearScale,
    vref3v3: LinearScale,
}

struct Devices<B, D> {
    probes: Ads1115<B, D>,
    engine: CalibrationEngine,
    use_water_temperature: bool,
    rails: Option<RailMonitor<B, D>>,
    air: Option<Bme280<B>>,
    light: Option<Ltr559<B, D>>,
    power: Option<Zero2Go<B>>,
    cpu: CpuTemperature,
    drift: Option<CpuDriftCompensator>,
}

/// All devices of the rig, ready to poll
pub struct Station<B, D, V> {
    devices: Devices<B, D>,
    system_rails: Option<V>,
}

fn optional<T>(name: &str, enabled: bool, init: impl FnOnce() -> SensorResult<T>) -> Option<T> {
    if !enabled {
        return None;
    }
    match init() {
        Ok(device) => {
            info!("{} ready", name);
            Some(device)
        }
        Err(err) => {
            warn!("{} unavailable, its columns stay empty: {}", name, err);
            None
        }
    }
}

impl<B, D, V> Station<B, D, V>
where
    B: BusTransport + Clone,
    D: DelayNs,
    V: VoltageProbe,
{
    /// Bring up every configured device on `bus`
    ///
    /// `delay` is called once per driver that needs its own delay provider.
    pub fn start(bus: B, mut delay: impl FnMut() -> D, config: &AppConfig, system_rails: Option<V>) -> Result<Self> {
        let probe_config = &config.probes;
        let probes = Ads1115::new(bus.clone(), delay(), probe_config.address).with_wait(probe_config.conversion_wait);

        let mut engine = CalibrationEngine::new();
        let tds = TdsCurve::new(LinearScale::reference(probe_config.tds_vref_volts, probe_config.tds_resolution));
        engine.register(SensorKind::Conductivity, CalibrationModel::Polynomial(tds))?;
        let ph = PhCurve::new(probe_config.ph_points, probe_config.ph_fit).context("fitting pH calibration points")?;
        engine.register(SensorKind::Ph, CalibrationModel::LogFit(ph))?;
        let mut thermistor = Thermistor::reference();
        thermistor.correction_c = probe_config.thermistor_correction_c;
        engine.register(SensorKind::Thermistor, CalibrationModel::SteinhartHart(thermistor))?;

        let rails = config.rails.enabled.then(|| RailMonitor {
            adc: Ads1115::new(bus.clone(), delay(), config.rails.address),
            vref5: LinearScale::for_gain(VREF5.gain, config.rails.vref5_factor),
            vref3v3: LinearScale::for_gain(VREF3V3.gain, config.rails.vref3v3_factor),
        });

        let air = optional("BME280", config.air.enabled, || {
            Bme280::init(bus.clone(), config.air.address, &mut delay())
        });

        let light_config = &config.light;
        let light = optional("LTR559", light_config.enabled, || {
            let retry = Retry::new(light_config.retry_attempts, light_config.retry_backoff_ms);
            Handshake::new(bus.clone(), delay(), light_config.address, retry)
                .verify_identity()?
                .enable_outputs()?
                .await_reset(light_config.handshake_timeout_ms)
        });

        let power = optional("Zero2Go", config.power.enabled, || {
            let mut board = Zero2Go::new(bus.clone(), config.power.address);
            let firmware = board.firmware_id()?;
            info!("Zero2Go firmware {:#04x}", firmware);
            Ok(board)
        });

        let cpu = CpuTemperature::new(&config.air.thermal_zone);
        let drift = match cpu.read_celsius() {
            Ok(celsius) => Some(CpuDriftCompensator::new(celsius, config.air.cpu_compensation_factor)?),
            Err(err) => {
                warn!("CPU temperature unavailable, air temperature will not be compensated: {}", err);
                None
            }
        };

        Ok(Self {
            devices: Devices {
                probes,
                engine,
                use_water_temperature: probe_config.tds_use_water_temperature,
                rails,
                air,
                light,
                power,
                cpu,
                drift,
            },
            system_rails,
        })
    }

    /// Run one cycle
    ///
    /// Errs only if the report cannot hold every reading.
    pub fn poll(&mut self) -> Result<Report> {
        let Self { devices, system_rails } = self;
        thread::scope(|scope| {
            let pending = system_rails.as_ref().map(|probe| scope.spawn(move || rail::read_all(probe)));

            let mut report = Report::new();
            devices.poll_into(&mut report)?;

            if let Some(handle) = pending {
                let rails = handle.join().map_err(|_| anyhow!("rail voltage reader panicked"))?;
                record_system_rails(&mut report, &rails)?;
            }
            Ok(report)
        })
    }
}

fn record_system_rails(report: &mut Report, rails: &[RailVoltage]) -> Result<()> {
    for rail in rails {
        // Failures were already logged by the reader; the cell stays empty
        if let (Some(name), Some(volts)) = (system_rail_column(rail.component), rail.volts) {
            report.record(name, Ok(volts))?;
        }
    }
    Ok(())
}

impl<B: BusTransport, D: DelayNs> Devices<B, D> {
    fn read_calibrated(&mut self, kind: SensorKind, config: &ChannelConfig, plan: &SamplePlan) -> SensorResult<f32> {
        let raw = sampling::sample_filtered(&mut self.probes, config, plan)?;
        Ok(self.engine.convert(kind, raw)?.value)
    }

    fn poll_into(&mut self, report: &mut Report) -> Result<()> {
        let cpu = self.cpu.read_celsius();
        let cpu_now = cpu.as_ref().ok().copied();
        report.record(column::CPU_C, cpu.map_err(Into::into))?;

        let water = self.read_calibrated(SensorKind::Thermistor, &THERMISTOR, &SamplePlan::single());
        if let (true, Ok(celsius)) = (self.use_water_temperature, water) {
            if let Some(CalibrationModel::Polynomial(curve)) = self.engine.model_mut(SensorKind::Conductivity) {
                curve.set_temperature_c(celsius);
            }
        }
        report.record(column::WATER_C, water.map_err(Into::into))?;
        if let Ok(celsius) = water {
            report.record(column::WATER_F, Ok(celsius_to_fahrenheit(celsius)))?;
        }

        let tds = self.read_calibrated(SensorKind::Conductivity, &TDS, &SamplePlan::conductivity());
        report.record(column::TDS_PPM, tds.map_err(Into::into))?;
        let ph = self.read_calibrated(SensorKind::Ph, &PH, &SamplePlan::single());
        report.record(column::PH, ph.map_err(Into::into))?;
        let ph_temp = self.probes.acquire(&PH_TEMP).map(f32::from);
        report.record(column::PH_TEMP_RAW, ph_temp.map_err(Into::into))?;

        if let Some(bme) = self.air.as_mut() {
            match bme.read() {
                Ok(measurement) => {
                    let raw_c = measurement.temperature_c;
                    let air_c = match self.drift.as_mut() {
                        Some(drift) => {
                            let cpu_c = cpu_now.unwrap_or_else(|| drift.cpu_average());
                            drift.compensate(cpu_c, raw_c)
                        }
                        None => raw_c,
                    };
                    report.record(column::AIR_C, Ok(air_c))?;
                    report.record(column::AIR_F, Ok(celsius_to_fahrenheit(air_c)))?;
                    report.record(column::PRESSURE_HPA, Ok(measurement.pressure_hpa))?;
                    report.record(column::HUMIDITY_PCT, Ok(measurement.humidity_pct))?;
                }
                Err(err) => report.record(column::AIR_C, Err(err.into()))?,
            }
        }

        if let Some(ltr) = self.light.as_mut() {
            report.record(column::LUX, ltr.lux().map_err(Into::into))?;
            let proximity = ltr.proximity().map(|p| f32::from(p.count));
            report.record(column::PROXIMITY, proximity.map_err(Into::into))?;
        }

        if let Some(rails) = self.rails.as_mut() {
            let plan = SamplePlan::rails();
            let vref5 = sampling::sample_calibrated(&mut rails.adc, &VREF5, &plan, &rails.vref5);
            report.record(column::VREF5_V, vref5.map(|r| r.value).map_err(Into::into))?;
            let vref3v3 = sampling::sample_calibrated(&mut rails.adc, &VREF3V3, &plan, &rails.vref3v3);
            report.record(column::VREF3V3_V, vref3v3.map(|r| r.value).map_err(Into::into))?;
        }

        if let Some(board) = self.power.as_mut() {
            for (input, name) in PowerInput::ALL.into_iter().zip(POWER_COLUMNS) {
                report.record(name, board.voltage(input).map_err(Into::into))?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    use approx::assert_relative_eq;
    use growsense_connectors::ConnectorResult;
    use growsense_core::TransportError;

    /// Register file keyed by (address, register); unknown addresses NAK
    #[derive(Clone, Default)]
    struct FakeBus(Arc<Mutex<HashMap<(u8, u8), Vec<u8>>>>);

    impl FakeBus {
        fn set(&self, address: u8, register: u8, bytes: &[u8]) {
            self.0.lock().unwrap().insert((address, register), bytes.to_vec());
        }
    }

    impl BusTransport for FakeBus {
        fn write_block(&mut self, address: u8, _register: u8, _bytes: &[u8]) -> Result<(), TransportError> {
            let regs = self.0.lock().unwrap();
            if regs.keys().any(|(a, _)| *a == address) {
                Ok(())
            } else {
                Err(TransportError::NoAcknowledge)
            }
        }

        fn read_block(&mut self, address: u8, register: u8, buf: &mut [u8]) -> Result<(), TransportError> {
            let regs = self.0.lock().unwrap();
            let bytes = regs.get(&(address, register)).ok_or(TransportError::NoAcknowledge)?;
            buf.fill(0);
            let n = buf.len().min(bytes.len());
            buf[..n].copy_from_slice(&bytes[..n]);
            Ok(())
        }
    }

    struct NoDelay;

    impl DelayNs for NoDelay {
        fn delay_ns(&mut self, _ns: u32) {}
    }

    struct FixedRails(f32);

    impl VoltageProbe for FixedRails {
        fn measure(&self, _component: &str) -> ConnectorResult<f32> {
            Ok(self.0)
        }
    }

    /// Probe ADC converting 12000 on every channel, all optional devices off
    fn rig() -> (FakeBus, AppConfig, tempfile::NamedTempFile) {
        let bus = FakeBus::default();
        bus.set(0x48, 0x00, &12000i16.to_be_bytes());

        let mut zone = tempfile::NamedTempFile::new().unwrap();
        writeln!(zone, "45000").unwrap();

        let mut config = AppConfig::default();
        config.rails.enabled = false;
        config.air.enabled = false;
        config.light.enabled = false;
        config.power.enabled = false;
        config.system_rails = false;
        config.air.thermal_zone = zone.path().to_path_buf();
        (bus, config, zone)
    }

    fn start(bus: &FakeBus, config: &AppConfig, rails: Option<FixedRails>) -> Station<FakeBus, NoDelay, FixedRails> {
        Station::start(bus.clone(), || NoDelay, config, rails).unwrap()
    }

    #[test]
    fn probes_only_cycle_is_complete() {
        let (bus, config, _zone) = rig();
        let report = start(&bus, &config, None).poll().unwrap();

        assert!(report.is_complete());
        assert_relative_eq!(report.value(column::TDS_PPM).unwrap(), 801.02, epsilon = 0.05);
        assert_relative_eq!(report.value(column::WATER_C).unwrap(), 21.05, epsilon = 0.01);
        assert_eq!(report.value(column::PH_TEMP_RAW), Some(12000.0));
        assert_eq!(report.value(column::CPU_C), Some(45.0));
        assert!(report.value(column::PH).is_some());
        assert_eq!(report.value(column::LUX), None);
    }

    #[test]
    fn missing_rail_adc_leaves_other_readings() {
        let (bus, mut config, _zone) = rig();
        config.rails.enabled = true;
        let report = start(&bus, &config, None).poll().unwrap();

        let failed: Vec<_> = report.failures().map(|(name, _)| name).collect();
        assert_eq!(failed, vec![column::VREF5_V, column::VREF3V3_V]);
        assert!(report.value(column::TDS_PPM).is_some());
    }

    #[test]
    fn water_temperature_feeds_tds_compensation() {
        let (bus, mut config, _zone) = rig();
        config.probes.tds_use_water_temperature = true;
        let report = start(&bus, &config, None).poll().unwrap();

        // Colder than 25 °C: the coefficient drops below 1 and ppm rises
        assert!(report.value(column::TDS_PPM).unwrap() > 801.1);
    }

    #[test]
    fn absent_optional_devices_are_dropped_at_start() {
        let (bus, mut config, _zone) = rig();
        config.air.enabled = true;
        config.light.enabled = true;
        config.light.retry_attempts = 1;
        config.power.enabled = true;
        let report = start(&bus, &config, None).poll().unwrap();

        assert!(report.is_complete());
        assert_eq!(report.value(column::AIR_C), None);
        assert_eq!(report.value(column::INPUT_A_V), None);
    }

    #[test]
    fn zero2go_inputs_are_recorded() {
        let (bus, mut config, _zone) = rig();
        config.power.enabled = true;
        for register in 0..16 {
            bus.set(0x29, register, &[0]);
        }
        bus.set(0x29, 1, &[5]);
        bus.set(0x29, 2, &[12]);
        let report = start(&bus, &config, None).poll().unwrap();

        assert_relative_eq!(report.value(column::INPUT_A_V).unwrap(), 5.12);
        assert_eq!(report.value(column::INPUT_C_V), Some(0.0));
    }

    #[test]
    fn system_rails_join_the_report() {
        let (bus, mut config, _zone) = rig();
        config.system_rails = true;
        let report = start(&bus, &config, Some(FixedRails(1.2))).poll().unwrap();

        for name in [column::CORE_V, column::SDRAM_C_V, column::SDRAM_I_V, column::SDRAM_P_V] {
            assert_eq!(report.value(name), Some(1.2));
        }
    }

    #[test]
    fn missing_thermal_zone_still_starts() {
        let (bus, mut config, _zone) = rig();
        config.air.thermal_zone = "/nonexistent/thermal_zone0/temp".into();
        let report = start(&bus, &config, None).poll().unwrap();

        let failed: Vec<_> = report.failures().map(|(name, _)| name).collect();
        assert_eq!(failed, vec![column::CPU_C]);
    }

    #[test]
    fn columns_are_unique_and_fit_one_report() {
        let mut seen = std::collections::HashSet::new();
        assert!(COLUMNS.iter().all(|c| seen.insert(*c)));
        assert!(COLUMNS.len() <= growsense_core::constants::MAX_CYCLE_READINGS);
    }
}
