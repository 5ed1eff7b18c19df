//! Etalon temperature logger.
//!
//! Samples the ADS1015 for one integration window at a time and appends each
//! window to the temperature CSV. Runs until the ADC or the filesystem fails.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::TimeDelta;
use clap::Parser;
use etalon::cli::{parse_duration, parse_i2c_address};
use etalon::temperature::{SamplerSettings, TemperatureLog, TemperatureLogger};
use etalon::SystemClock;
use hardware::ads1x15::{AdcSource, Gain, DEFAULT_ADDRESS};
use hardware::SimulatedAdc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about = "Etalon temperature logger")]
struct Args {
    #[arg(long, default_value = "/dev/i2c-1")]
    bus: PathBuf,

    #[arg(long, default_value_t = DEFAULT_ADDRESS, value_parser = parse_i2c_address)]
    address: u8,

    #[arg(long, default_value = "1", help = "PGA gain: 2/3, 1, 2, 4, 8 or 16")]
    gain: Gain,

    #[arg(long, default_value = "0", value_parser = clap::value_parser!(u8).range(0..=3))]
    channel: u8,

    #[arg(long, default_value = "60s", value_parser = parse_duration)]
    integration: Duration,

    #[arg(long, default_value = "500ms", value_parser = parse_duration)]
    poll_interval: Duration,

    #[arg(short, long, default_value = "/home/pi/src/temperature.csv")]
    output: PathBuf,

    #[arg(long, help = "Read a simulated ADC instead of the I2C device")]
    simulate: bool,
}

fn run<A: AdcSource>(adc: A, args: &Args) -> Result<()> {
    let settings = SamplerSettings {
        channel: args.channel,
        gain: args.gain,
        integration: TimeDelta::from_std(args.integration)
            .context("Integration window too long")?,
        poll_interval: args.poll_interval,
        ..SamplerSettings::default()
    };

    let log = TemperatureLog::open(&args.output)
        .with_context(|| format!("Failed to open {}", args.output.display()))?;

    let mut logger = TemperatureLogger::new(adc, SystemClock, log, settings);
    match logger.run_forever() {
        Ok(never) => match never {},
        Err(e) => Err(e).context("Temperature logging stopped"),
    }
}

#[cfg(all(target_os = "linux", feature = "ads1015-i2c"))]
fn run_ads1015(args: &Args) -> Result<()> {
    info!(
        "Opening ADS1015 at {:#04x} on {}",
        args.address,
        args.bus.display()
    );
    let adc =
        hardware::Ads1015::open_bus(&args.bus, args.address).context("Failed to open ADS1015")?;
    run(adc, args)
}

#[cfg(not(all(target_os = "linux", feature = "ads1015-i2c")))]
fn run_ads1015(_args: &Args) -> Result<()> {
    anyhow::bail!("Built without the ads1015-i2c feature; pass --simulate")
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    if args.simulate {
        info!("Using simulated ADC");
        return run(SimulatedAdc::new(1000, 4), &args);
    }

    run_ads1015(&args)
}
