//! Raspberry Pi supply rails via `vcgencmd measure_volts`
//!
//! Each component is queried by its own process on its own thread; all
//! threads are joined before the results are gathered. A component whose
//! query fails reports `None` and does not affect the others.

use std::process::Command;
use std::thread;

use crate::{ConnectorError, ConnectorResult};

/// Components `vcgencmd measure_volts` understands
pub const COMPONENTS: [&str; 4] = ["core", "sdram_c", "sdram_i", "sdram_p"];

/// One component's voltage, if it could be read
#[derive(Debug, Clone, PartialEq)]
pub struct RailVoltage {
    /// Component name
    pub component: &'static str,
    /// Volts, or `None` if the query failed
    pub volts: Option<f32>,
}

/// Runs the query for one component
pub trait VoltageProbe: Sync {
    /// Voltage of `component`
    fn measure(&self, component: &str) -> ConnectorResult<f32>;
}

/// The real `vcgencmd` binary
#[derive(Debug, Clone)]
pub struct Vcgencmd {
    program: String,
}

impl Default for Vcgencmd {
    fn default() -> Self {
        Self { program: "vcgencmd".to_string() }
    }
}

impl Vcgencmd {
    /// Use a specific executable
    pub fn with_program(program: impl Into<String>) -> Self {
        Self { program: program.into() }
    }
}

impl VoltageProbe for Vcgencmd {
    fn measure(&self, component: &str) -> ConnectorResult<f32> {
        let output = Command::new(&self.program)
            .args(["measure_volts", component])
            .output()
            .map_err(|source| ConnectorError::Io { path: self.program.clone(), source })?;
        if !output.status.success() {
            return Err(ConnectorError::Parse(format!(
                "{} measure_volts {} exited with {}",
                self.program, component, output.status
            )));
        }
        parse_volts(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Parse `volt=1.2000V`
pub fn parse_volts(output: &str) -> ConnectorResult<f32> {
    output
        .trim()
        .strip_prefix("volt=")
        .and_then(|rest| rest.strip_suffix('V'))
        .and_then(|value| value.parse().ok())
        .ok_or_else(|| ConnectorError::Parse(format!("unexpected vcgencmd output {:?}", output.trim())))
}

/// Query every component in parallel
pub fn read_all<P: VoltageProbe>(probe: &P) -> Vec<RailVoltage> {
    thread::scope(|scope| {
        let handles: Vec<_> = COMPONENTS
            .iter()
            .map(|&component| (component, scope.spawn(move || probe.measure(component))))
            .collect();

        handles
            .into_iter()
            .map(|(component, handle)| {
                let volts = match handle.join() {
                    Ok(Ok(volts)) => Some(volts),
                    Ok(Err(err)) => {
                        log::warn!("Failed to read {} voltage: {}", component, err);
                        None
                    }
                    Err(_) => {
                        log::error!("Voltage reader for {} panicked", component);
                        None
                    }
                };
                RailVoltage { component, volts }
            })
            .collect()
    })
}
