//! Etalon temperature sampling and the weekly CSV log.
//!
//! The logger polls the ADC through a fixed integration window, reduces the
//! readings to a [`TemperatureSample`] and appends it to a [`TemperatureLog`].
//! The position server only ever reads the resulting file.

pub mod conversion;
pub mod csv_log;
pub mod logger;
pub mod sample;
pub mod stats;

pub use conversion::{raw_to_celsius, raw_to_volts, volts_to_celsius};
pub use csv_log::{TemperatureLog, TemperatureLogError, TemperatureLogResult};
pub use logger::{LoggerError, SamplerSettings, TemperatureLogger};
pub use sample::TemperatureSample;
