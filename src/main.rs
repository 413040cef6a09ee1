//! Latrine sensor host bench.
//!
//! Runs the full control core against simulated peripherals: a scripted
//! outflow trace drives the ISR entry points, the float switch closes
//! near the end, and every uplink message is printed to stdout.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter<BenchSwitch, BenchEmitter, BenchEmitter>      │
//! │  LogEventSink     NvsAdapter      StdoutUplink                 │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              AppService (pure logic)                   │    │
//! │  │  Timers · FSM · Flow filter · Debounce                 │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Usage: `latrine-bench [--config FILE] [--threshold N] [--verbose]`
#![deny(unused_must_use)]

use core::convert::Infallible;
use core::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result, bail};
use embedded_hal::digital::{ErrorType, InputPin, OutputPin};
use log::{LevelFilter, Log, Metadata, Record, info, warn};

use latrinesensor::adapters::hardware::{self, HardwareAdapter};
use latrinesensor::adapters::log_sink::LogEventSink;
use latrinesensor::adapters::nvs::NvsAdapter;
use latrinesensor::app::commands::AppCommand;
use latrinesensor::app::ports::{ConfigPort, UplinkPort};
use latrinesensor::app::service::AppService;
use latrinesensor::config::SystemConfig;
use latrinesensor::sensors::temperature::{TempSensor, TenthsDegC};
use latrinesensor::threshold::ThresholdStore;

// ── Logger ────────────────────────────────────────────────────

struct StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!("{:<5} {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

// ── Simulated peripherals ─────────────────────────────────────

static SWITCH_CLOSED: AtomicBool = AtomicBool::new(false);

/// Float switch, active low.
struct BenchSwitch;

impl ErrorType for BenchSwitch {
    type Error = Infallible;
}

impl InputPin for BenchSwitch {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(!SWITCH_CLOSED.load(Ordering::Relaxed))
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(SWITCH_CLOSED.load(Ordering::Relaxed))
    }
}

/// IR emitter enable line.
struct BenchEmitter(&'static str);

impl ErrorType for BenchEmitter {
    type Error = Infallible;
}

impl OutputPin for BenchEmitter {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        info!("bench: {} emitter off", self.0);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        info!("bench: {} emitter on", self.0);
        Ok(())
    }
}

/// Conversions complete instantly with fixed readings.
fn bench_conversion(sensor: TempSensor) {
    let reading = match sensor {
        TempSensor::Outflow => TenthsDegC(183),
        TempSensor::Ambient => TenthsDegC(251),
    };
    hardware::on_conversion_done(sensor, reading);
}

struct StdoutUplink {
    sent: usize,
}

impl UplinkPort for StdoutUplink {
    fn send(&mut self, message: &str) {
        self.sent += 1;
        println!("TX {}", message);
    }
}

// ── Trace ─────────────────────────────────────────────────────

const STEP_MS: u32 = 100;
const IDLE_REFLECTANCE: u16 = 3_000;
const FLUSH_REFLECTANCE: u16 = 2_200;

/// What the simulated world does during one step.
struct Stimulus {
    pulses: u16,
    reflectance: u16,
    switch_closed: bool,
}

fn stimulus(t_ms: u32) -> Stimulus {
    let flushing = (10_000..14_000).contains(&t_ms);
    Stimulus {
        pulses: if flushing { 6 } else { 0 },
        reflectance: if flushing { FLUSH_REFLECTANCE } else { IDLE_REFLECTANCE },
        switch_closed: t_ms >= 40_000,
    }
}

// ── Arguments ─────────────────────────────────────────────────

#[derive(Default)]
struct Args {
    config: Option<String>,
    threshold: Option<u16>,
    verbose: bool,
}

fn parse_args() -> Result<Args> {
    let mut args = Args::default();
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--config" => args.config = Some(it.next().context("--config needs a path")?),
            "--threshold" => {
                let raw = it.next().context("--threshold needs a value")?;
                args.threshold = Some(raw.parse().with_context(|| format!("bad threshold '{}'", raw))?);
            }
            "--verbose" | "-v" => args.verbose = true,
            other => bail!("unknown argument '{}'", other),
        }
    }
    Ok(args)
}

fn load_config(path: Option<&str>, nvs: &NvsAdapter) -> Result<SystemConfig> {
    let Some(path) = path else {
        return Ok(nvs.load()?);
    };
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path))?;
    let config: SystemConfig = serde_json::from_str(&text).with_context(|| format!("parsing {}", path))?;
    config.validate()?;
    nvs.save(&config)?;
    info!("Config loaded from {}", path);
    Ok(config)
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    let args = parse_args()?;
    log::set_logger(&LOGGER).map_err(|e| anyhow::anyhow!("logger: {}", e))?;
    log::set_max_level(if args.verbose { LevelFilter::Debug } else { LevelFilter::Info });

    info!("Latrine sensor bench v{}", env!("CARGO_PKG_VERSION"));

    let mut nvs = NvsAdapter::new();
    let config = load_config(args.config.as_deref(), &nvs)?;
    let threshold = ThresholdStore::load(&nvs);

    let mut app = AppService::new(config, threshold)?;
    let mut hw = HardwareAdapter::new(
        BenchSwitch,
        BenchEmitter("outflow"),
        BenchEmitter("level"),
        bench_conversion,
    );
    let mut sink = LogEventSink::new();
    let mut uplink = StdoutUplink { sent: 0 };

    if let Some(t) = args.threshold {
        app.handle_command(AppCommand::SetThreshold(t), &mut nvs, &mut sink)?;
    }
    app.start(&mut sink);

    let mut level_requested = false;
    for step in 0..600 {
        let t_ms = step * STEP_MS;
        let s = stimulus(t_ms);
        for _ in 0..s.pulses {
            hardware::on_outflow_pulse();
        }
        hardware::on_reflectance(s.reflectance);
        SWITCH_CLOSED.store(s.switch_closed, Ordering::Relaxed);

        if s.switch_closed && !level_requested {
            app.handle_command(AppCommand::TriggerLevelTest, &mut nvs, &mut sink)?;
            level_requested = true;
        }

        app.poll(STEP_MS, &mut hw, &mut uplink, &mut sink);
    }

    if uplink.sent == 0 {
        warn!("No uplink traffic during the trace");
    }
    info!(
        "Bench finished: {} app ticks, {} messages, final state {}",
        app.tick_count(),
        uplink.sent,
        app.state().name()
    );
    Ok(())
}
