// src/main.rs - heatctl entry point
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use clap::{Parser, ValueEnum};
use tracing::Level;

use heatctl::app::listen_for_signals;
use heatctl::config::{self, Config};
use heatctl::control::ControlLoop;
use heatctl::hardware::simulated::SimulatedPlant;
use heatctl::hardware::sysfs::{SysfsAdc, SysfsGpio};
use heatctl::hardware::{AnalogInput, HardwareError, HeaterOutput, SensorCalibration};
use heatctl::logging;
use heatctl::render::RenderEngine;
use heatctl::terminal::{Console, CrosstermConsole, RawModeGuard};
use heatctl::{App, AppError, ShutdownToken};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Backend {
    /// Simulated thermal plant
    Sim,
    /// sysfs ADC and GPIO nodes
    Sysfs,
}

#[derive(Parser, Debug)]
#[command(name = "heatctl", version, about = "Single-zone heater controller")]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Sensor and heater backend
    #[arg(short, long, value_enum, default_value_t = Backend::Sim)]
    backend: Backend,

    /// Initial desired temperature in °C, overrides the configured default
    #[arg(short, long)]
    setpoint: Option<f64>,

    /// Write logs to this file. Without it logs go to stderr, and are dropped while the
    /// status screen is up
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(cli: &Cli) -> io::Result<()> {
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let builder = tracing_subscriber::fmt().with_max_level(level);
    match &cli.log_file {
        Some(path) => {
            let file = File::create(path)?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        None => builder.with_writer(logging::stderr_writer()).init(),
    }
    Ok(())
}

fn load(cli: &Cli) -> Result<Config, AppError> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            config::load_config(&path.to_string_lossy())?
        }
        None => Config::default(),
    };
    if let Some(setpoint) = cli.setpoint {
        config.control.default_setpoint = setpoint;
    }
    config.validate()?;
    Ok(config)
}

fn require_node(path: &str) -> Result<(), HardwareError> {
    if Path::new(path).exists() {
        Ok(())
    } else {
        Err(HardwareError::Unavailable(format!("{} does not exist", path)))
    }
}

async fn run<A, H>(input: A, output: H, config: &Config, shutdown: ShutdownToken) -> Result<(), AppError>
where
    A: AnalogInput,
    H: HeaterOutput,
{
    let control = ControlLoop::from_config(input, output, config);

    let guard = RawModeGuard::acquire()?;
    let mut console = CrosstermConsole::new();
    let geometry = console.geometry()?;
    let render = RenderEngine::new(io::stdout(), geometry, config.display.bar_width);

    let mut app = App::new(control, render, console, shutdown, config.control.interval());
    let result = app.run().await;

    // Heater off before the terminal is handed back
    drop(app);
    drop(guard);
    result
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    let cli = Cli::parse();
    init_logging(&cli)?;

    tracing::info!("Starting heatctl {}", env!("CARGO_PKG_VERSION"));

    let config = load(&cli).map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        e
    })?;

    let shutdown = ShutdownToken::new();
    listen_for_signals(shutdown.clone());

    match cli.backend {
        Backend::Sim => {
            tracing::info!("Using simulated plant");
            let plant = SimulatedPlant::new(&config.simulation);
            let (probe, element) = plant.into_handles(SensorCalibration::from_config(&config));
            run(probe, element, &config, shutdown).await?;
        }
        Backend::Sysfs => {
            let hw = &config.hardware;
            require_node(&hw.adc_path)?;
            require_node(&hw.gpio_path)?;
            tracing::info!("Using ADC {} and GPIO {}", hw.adc_path, hw.gpio_path);
            run(SysfsAdc::new(&hw.adc_path), SysfsGpio::new(&hw.gpio_path), &config, shutdown).await?;
        }
    }

    tracing::info!("heatctl stopped");
    Ok(())
}
