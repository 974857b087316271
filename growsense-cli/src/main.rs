//! `growsense`: poll a Raspberry Pi sensor rig into a CSV log
//!
//! Subcommands:
//! - `run`: poll every configured device once per interval
//! - `relay`: drive the 8-channel relay board
//! - `rails`: print SoC rail voltages from `vcgencmd`
//! - `config`: print the effective configuration

mod config;
mod station;

use std::collections::BTreeMap;
use std::io::Write;
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand, ValueEnum};
use log::{error, info, warn, LevelFilter};

use growsense_connectors::csv_sink::CsvSink;
use growsense_connectors::linux::{self, Delay};
use growsense_connectors::rail::{self, Vcgencmd};
use growsense_connectors::ReadingSink;
use growsense_core::shared::SharedBus;

use crate::config::AppConfig;
use crate::station::{Report, Station, COLUMNS};

/// Poll I2C water, air and light sensors into a CSV log
#[derive(Parser, Debug)]
#[command(name = "growsense")]
#[command(version)]
struct Args {
    /// JSON configuration file; reference defaults when absent
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// I2C adapter number (`/dev/i2c-N`)
    #[arg(long, global = true)]
    bus: Option<u8>,

    /// Log at debug level regardless of RUST_LOG
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Poll every sensor and append one CSV row per cycle
    Run {
        /// CSV log path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Milliseconds from the start of one cycle to the next
        #[arg(short, long)]
        interval_ms: Option<u64>,

        /// Stop after this many cycles (default: run until killed)
        #[arg(short = 'n', long)]
        cycles: Option<u64>,
    },

    /// Drive the relay board (every invocation starts with all channels released)
    Relay {
        #[command(subcommand)]
        action: RelayAction,
    },

    /// Print SoC rail voltages from vcgencmd
    Rails {
        /// Print as a JSON object
        #[arg(long)]
        json: bool,
    },

    /// Print the effective configuration as JSON
    Config,
}

#[derive(Subcommand, Debug)]
enum RelayAction {
    /// Energise or release one channel
    Set {
        /// Channel 1-8
        channel: u8,
        state: Switch,
    },

    /// Energise a channel, hold, then release it
    Pulse {
        /// Channel 1-8
        channel: u8,

        /// Hold time in milliseconds
        #[arg(default_value = "1000")]
        ms: u64,
    },

    /// Release every channel
    AllOff,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Switch {
    On,
    Off,
}

fn init_logger(verbose: bool) {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if verbose {
        builder.filter_level(LevelFilter::Debug);
    }
    builder
        .format(|buf, record| {
            writeln!(
                buf,
                "{} {:<8} {}",
                Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.args()
            )
        })
        .init();
}

/// File or default config with command-line overrides applied
fn load_config(args: &Args) -> Result<AppConfig> {
    let mut config = AppConfig::load_or_default(args.config.as_deref())?;
    if let Some(bus) = args.bus {
        config.i2c_bus = bus;
    }
    if let Command::Run { output, interval_ms, cycles } = &args.command {
        if let Some(output) = output {
            config.output = output.clone();
        }
        if let Some(interval_ms) = interval_ms {
            config.interval_ms = *interval_ms;
        }
        if cycles.is_some() {
            config.cycles = *cycles;
        }
    }
    config.validate()?;
    Ok(config)
}

fn log_summary(report: &Report) {
    for entry in report.entries() {
        if let Ok(value) = &entry.outcome {
            info!("{:<14} {:.2}", entry.name, value);
        }
    }
    let failed = report.failures().count();
    if failed > 0 {
        warn!("{} of {} readings failed this cycle", failed, report.len());
    }
}

fn run(config: &AppConfig) -> Result<()> {
    let bus = SharedBus::new(linux::open_i2c(config.i2c_bus)?);
    let system_rails = config.system_rails.then(Vcgencmd::default);
    let mut station = Station::start(bus, || Delay, config, system_rails)?;
    let mut sink = CsvSink::open(&config.output, &COLUMNS)?;

    let interval = Duration::from_millis(config.interval_ms);
    info!(
        "Logging to {} every {} ms{}",
        config.output.display(),
        config.interval_ms,
        config.cycles.map(|n| format!(" for {} cycles", n)).unwrap_or_default()
    );

    let mut completed = 0u64;
    loop {
        let started = Instant::now();
        let timestamp = Local::now().naive_local();

        let report = station.poll()?;
        sink.write_cycle(timestamp, &report)
            .with_context(|| format!("writing {}", config.output.display()))?;
        log_summary(&report);

        completed += 1;
        if config.cycles.is_some_and(|limit| completed >= limit) {
            info!("Finished {} cycles", completed);
            return Ok(());
        }
        thread::sleep(interval.saturating_sub(started.elapsed()));
    }
}

fn relay(action: &RelayAction) -> Result<()> {
    let mut board = linux::relay_board()?;
    match *action {
        RelayAction::Set { channel, state } => board.set(channel, matches!(state, Switch::On))?,
        RelayAction::Pulse { channel, ms } => {
            board.on(channel)?;
            thread::sleep(Duration::from_millis(ms));
            board.off(channel)?;
        }
        RelayAction::AllOff => board.all_off()?,
    }
    Ok(())
}

fn rails(json: bool) -> Result<()> {
    let rails = rail::read_all(&Vcgencmd::default());
    if json {
        let volts: BTreeMap<&str, Option<f32>> = rails.iter().map(|r| (r.component, r.volts)).collect();
        println!("{}", serde_json::to_string_pretty(&volts)?);
    } else {
        for rail in &rails {
            match rail.volts {
                Some(volts) => println!("{:<8} {:.4} V", rail.component, volts),
                None => println!("{:<8} unavailable", rail.component),
            }
        }
    }
    Ok(())
}

fn execute(args: &Args) -> Result<()> {
    let config = load_config(args)?;
    match &args.command {
        Command::Run { .. } => run(&config),
        Command::Relay { action } => relay(action),
        Command::Rails { json } => rails(*json),
        Command::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

fn main() {
    let args = Args::parse();
    init_logger(args.verbose);

    if let Err(err) = execute(&args) {
        error!("{:#}", err);
        std::process::exit(1);
    }
}
