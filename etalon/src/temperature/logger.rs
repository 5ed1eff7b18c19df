//! The sampling loop.
//!
//! Each window polls the ADC's latest conversion every `poll_interval` for as
//! long as no more than `integration` has elapsed, then appends one row. The
//! number of readings per window depends on how long each poll takes, so the
//! row is stamped with the window midpoint instead of anything derived from
//! the readings. Every `rotation_period` of continuous operation the log is
//! flagged for rotation.

use std::convert::Infallible;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use hardware::ads1x15::{AdcError, AdcSource, Gain};
use thiserror::Error;
use tracing::{debug, info};

use super::csv_log::{TemperatureLog, TemperatureLogError};
use super::sample::TemperatureSample;
use crate::clock::{poll_for, Clock};

#[derive(Error, Debug)]
pub enum LoggerError {
    #[error("ADC error: {0}")]
    Adc(#[from] AdcError),

    #[error(transparent)]
    Log(#[from] TemperatureLogError),

    #[error("Integration window starting {0} produced no readings")]
    EmptyWindow(DateTime<Utc>),
}

/// Sampling parameters, fixed once the loop starts.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplerSettings {
    pub channel: u8,
    pub gain: Gain,
    pub integration: TimeDelta,
    pub poll_interval: Duration,
    pub rotation_period: TimeDelta,
}

impl Default for SamplerSettings {
    fn default() -> Self {
        Self {
            channel: 0,
            gain: Gain::One,
            integration: TimeDelta::seconds(60),
            poll_interval: Duration::from_millis(500),
            rotation_period: TimeDelta::days(7),
        }
    }
}

pub struct TemperatureLogger<A, C> {
    adc: A,
    clock: C,
    log: TemperatureLog,
    settings: SamplerSettings,
    rotation_reference: Option<DateTime<Utc>>,
}

impl<A: AdcSource, C: Clock> TemperatureLogger<A, C> {
    pub fn new(adc: A, clock: C, log: TemperatureLog, settings: SamplerSettings) -> Self {
        Self {
            adc,
            clock,
            log,
            settings,
            rotation_reference: None,
        }
    }

    pub fn settings(&self) -> &SamplerSettings {
        &self.settings
    }

    pub fn log(&self) -> &TemperatureLog {
        &self.log
    }

    pub fn adc(&self) -> &A {
        &self.adc
    }

    /// Start continuous conversion and take the rotation reference time.
    pub fn start(&mut self) -> Result<(), LoggerError> {
        self.adc
            .start_continuous(self.settings.channel, self.settings.gain)?;
        self.rotation_reference = Some(self.clock.now());
        info!(
            "Sampling channel {} at gain {} (±{} V) every {:?}, {} s windows, logging to {}",
            self.settings.channel,
            self.settings.gain,
            self.settings.gain.full_scale_volts(),
            self.settings.poll_interval,
            self.settings.integration.num_seconds(),
            self.log.path().display()
        );
        Ok(())
    }

    /// Collect one integration window and reduce it to a sample.
    pub fn sample_window(&mut self) -> Result<TemperatureSample, LoggerError> {
        let adc = &mut self.adc;
        let window = poll_for(
            &self.clock,
            self.settings.integration,
            self.settings.poll_interval,
            || adc.last_result(),
        )?;

        let timestamp = window.start + self.settings.integration / 2;
        TemperatureSample::from_readings(timestamp, &window.values)
            .ok_or(LoggerError::EmptyWindow(window.start))
    }

    /// One iteration of the loop: sample, append, then check rotation.
    pub fn step(&mut self) -> Result<TemperatureSample, LoggerError> {
        let sample = self.sample_window()?;
        self.log.append(&sample)?;
        debug!(
            "{} readings, median {} ({:.3} C)",
            sample.count, sample.value, sample.temperature
        );

        let now = self.clock.now();
        let reference = *self.rotation_reference.get_or_insert(now);
        if now - reference >= self.settings.rotation_period {
            self.log.request_rotation();
            self.rotation_reference = Some(now);
        }

        Ok(sample)
    }

    /// Start the ADC and loop until a fault.
    pub fn run_forever(&mut self) -> Result<Infallible, LoggerError> {
        self.start()?;
        loop {
            self.step()?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::TimeZone;
    use hardware::SimulatedAdc;

    fn epoch() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2021, 9, 16, 0, 0, 0).unwrap()
    }

    fn settings() -> SamplerSettings {
        SamplerSettings {
            integration: TimeDelta::seconds(2),
            ..SamplerSettings::default()
        }
    }

    #[test]
    fn test_start_configures_adc() {
        let dir = tempfile::tempdir().unwrap();
        let log = TemperatureLog::open(dir.path().join("t.csv")).unwrap();
        let settings = SamplerSettings {
            channel: 2,
            gain: Gain::Four,
            ..settings()
        };
        let mut logger =
            TemperatureLogger::new(SimulatedAdc::new(900, 0), ManualClock::new(epoch()), log, settings);

        logger.start().unwrap();
        assert_eq!(logger.adc().running(), Some((2, Gain::Four)));
    }

    #[test]
    fn test_window_timestamp_and_count() {
        let dir = tempfile::tempdir().unwrap();
        let log = TemperatureLog::open(dir.path().join("t.csv")).unwrap();
        let mut logger =
            TemperatureLogger::new(SimulatedAdc::new(1000, 0), ManualClock::new(epoch()), log, settings());
        logger.start().unwrap();

        let sample = logger.sample_window().unwrap();
        assert_eq!(sample.timestamp, epoch() + TimeDelta::seconds(1));
        assert_eq!(sample.count, 5);
        assert_eq!(sample.value, 1000.0);
    }

    #[test]
    fn test_step_appends_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.csv");
        let log = TemperatureLog::open(&path).unwrap();
        let mut logger =
            TemperatureLogger::new(SimulatedAdc::new(1000, 0), ManualClock::new(epoch()), log, settings());
        logger.start().unwrap();

        logger.step().unwrap();
        logger.step().unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("2021/09/16 00:00:01,1000,0.000,"));
        // Second window starts after five 500 ms polls.
        assert!(lines[2].starts_with("2021/09/16 00:00:03,1000,"));
    }

    #[test]
    fn test_adc_fault_is_terminal() {
        struct DeadAdc;

        impl AdcSource for DeadAdc {
            fn start_continuous(&mut self, _channel: u8, _gain: Gain) -> Result<(), AdcError> {
                Ok(())
            }

            fn last_result(&mut self) -> Result<i16, AdcError> {
                Err(AdcError::Bus("NoAcknowledge".to_string()))
            }
        }

        let dir = tempfile::tempdir().unwrap();
        let log = TemperatureLog::open(dir.path().join("t.csv")).unwrap();
        let mut logger = TemperatureLogger::new(DeadAdc, ManualClock::new(epoch()), log, settings());

        assert!(matches!(logger.run_forever(), Err(LoggerError::Adc(_))));
    }
}
