//! One aggregated integration window.

use chrono::{DateTime, Utc};

use super::conversion::raw_to_celsius;
use super::stats::{median, std_dev};

/// Timestamp format of the CSV `date` column.
pub const DATE_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

#[derive(Debug, Clone, PartialEq)]
pub struct TemperatureSample {
    /// Midpoint of the integration window
    pub timestamp: DateTime<Utc>,
    /// Median raw ADC count
    pub value: f64,
    /// Population standard deviation of the raw counts
    pub value_std: f64,
    /// Median of the per-reading temperatures, degrees Celsius
    pub temperature: f64,
    /// Population standard deviation of the per-reading temperatures
    pub temperature_std: f64,
    /// Number of readings in the window
    pub count: usize,
}

impl TemperatureSample {
    /// Aggregate raw readings. Returns `None` for an empty window.
    pub fn from_readings(timestamp: DateTime<Utc>, readings: &[i16]) -> Option<Self> {
        let raw: Vec<f64> = readings.iter().map(|&r| f64::from(r)).collect();
        let celsius: Vec<f64> = raw.iter().map(|&r| raw_to_celsius(r)).collect();

        Some(Self {
            timestamp,
            value: median(&raw)?,
            value_std: std_dev(&raw)?,
            temperature: median(&celsius)?,
            temperature_std: std_dev(&celsius)?,
            count: readings.len(),
        })
    }

    /// CSV row fields: date, integer value (truncated toward zero), then the
    /// three statistics at three decimals.
    pub fn csv_fields(&self) -> [String; 5] {
        [
            self.timestamp.format(DATE_FORMAT).to_string(),
            format!("{}", self.value.trunc() as i64),
            format!("{:.3}", self.value_std),
            format!("{:.3}", self.temperature),
            format!("{:.3}", self.temperature_std),
        ]
    }
}
