//! HTTP position server for the FPI filterwheel.
//!
//! Homes the wheel and moves to the startup filter before accepting any
//! connection, then serves position commands and the temperature CSV.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use etalon::server::{self, ServerState};
use etalon::{AuditLog, PositionController, StartupMode};
use hardware::{FilterWheel, FilterWheelConfig, SimulatedFilterWheel};
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about = "Filterwheel position server for the FPI")]
struct Args {
    #[arg(long, default_value = "0.0.0.0")]
    bind: String,

    #[arg(short, long, default_value = "80")]
    port: u16,

    #[arg(long, help = "Skip the homing sequence at startup")]
    no_startup_homing: bool,

    #[arg(
        long,
        value_enum,
        default_value = "red",
        help = "Filter to select after startup (blank=0, green=1, red=2)"
    )]
    startup_mode: StartupMode,

    #[arg(long, default_value = "/home/pi/src/temperature.csv")]
    temperature_log: PathBuf,

    #[arg(long, default_value = "/home/pi/log/raspberryfpi_server.log")]
    audit_log: PathBuf,

    #[arg(long, help = "JSON file with slot offsets and GPIO wiring")]
    wheel_config: Option<PathBuf>,

    #[arg(long, help = "Drive a simulated filterwheel instead of the stepper")]
    simulate: bool,
}

#[cfg(all(target_os = "linux", feature = "stepper-gpio"))]
async fn run_stepper(config: &FilterWheelConfig, args: Args) -> Result<()> {
    use hardware::filterwheel::{GpiodStepperPins, StdDelay};
    use hardware::StepperFilterWheel;

    let pins =
        GpiodStepperPins::open(&config.gpio).context("Failed to open filterwheel GPIO lines")?;
    run(StepperFilterWheel::new(pins, StdDelay, config), args).await
}

#[cfg(not(all(target_os = "linux", feature = "stepper-gpio")))]
async fn run_stepper(_config: &FilterWheelConfig, _args: Args) -> Result<()> {
    anyhow::bail!("Built without the stepper-gpio feature; pass --simulate")
}

async fn run<W>(wheel: W, args: Args) -> Result<()>
where
    W: FilterWheel + Send + 'static,
{
    let audit = AuditLog::new(&args.audit_log);
    let mut controller = PositionController::new(wheel, audit.clone());

    let home = !args.no_startup_homing;
    let mode = args.startup_mode;
    let controller = tokio::task::spawn_blocking(move || {
        controller.startup(home, mode).map(|()| controller)
    })
    .await
    .context("Startup task panicked")?
    .context("Filterwheel startup failed")?;

    let state = Arc::new(ServerState::new(
        controller,
        &args.temperature_log,
        audit.clone(),
    ));
    let app = server::router(state);

    let addr = format!("{}:{}", args.bind, args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    audit.record(format!("Running server on {addr}"));
    info!("Serving temperature log {}", args.temperature_log.display());

    server::serve(listener, app).await.context("Server error")
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    let config = match &args.wheel_config {
        Some(path) => FilterWheelConfig::load(path)
            .with_context(|| format!("Failed to load wheel config {}", path.display()))?,
        None => FilterWheelConfig::default(),
    };
    info!("Slot offsets {:?}", config.slot_offsets);

    if args.simulate {
        info!("Using simulated filterwheel");
        return run(SimulatedFilterWheel::from_config(&config), args).await;
    }

    run_stepper(&config, args).await
}
