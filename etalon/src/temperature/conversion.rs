//! Conversion of raw ADS1015 counts to etalon temperature.
//!
//! The sensor front end scales its output so that the ADC full scale maps to
//! 8.8 V, and the sensor itself is linear in voltage:
//!
//! ```text
//! volts   = 8.8 * raw / 2048
//! celsius = volts * 6.625 - 3.969
//! ```

/// Voltage represented by the ADC full scale count.
pub const FULL_SCALE_VOLTS: f64 = 8.8;

/// Counts at ADC full scale (12-bit signed, positive half).
pub const FULL_SCALE_COUNTS: f64 = 2048.0;

/// Sensor slope in degrees Celsius per volt.
pub const CELSIUS_PER_VOLT: f64 = 6.625;

/// Sensor output at 0 V, in degrees Celsius.
pub const CELSIUS_OFFSET: f64 = -3.969;

pub fn raw_to_volts(raw: f64) -> f64 {
    FULL_SCALE_VOLTS * raw / FULL_SCALE_COUNTS
}

pub fn volts_to_celsius(volts: f64) -> f64 {
    volts * CELSIUS_PER_VOLT + CELSIUS_OFFSET
}

/// Temperature in degrees Celsius for a raw ADC count.
pub fn raw_to_celsius(raw: f64) -> f64 {
    volts_to_celsius(raw_to_volts(raw))
}
