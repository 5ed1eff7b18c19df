//! Argument parsers shared by the binaries.

use std::time::Duration;

/// Parse duration string with units (e.g., "500ms", "60s", "1.5m", "1h").
///
/// A bare number is taken as seconds.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();

    let (num_str, scale) = if let Some(n) = s.strip_suffix("ms") {
        (n, 1e-3)
    } else if let Some(n) = s.strip_suffix('s') {
        (n, 1.0)
    } else if let Some(n) = s.strip_suffix('m') {
        (n, 60.0)
    } else if let Some(n) = s.strip_suffix('h') {
        (n, 3600.0)
    } else {
        (s, 1.0)
    };

    let value: f64 = num_str
        .trim()
        .parse()
        .map_err(|_| format!("Invalid numeric value: {num_str}"))?;

    if !value.is_finite() || value < 0.0 {
        return Err(format!("Duration must be a non-negative number: {s}"));
    }

    Ok(Duration::from_secs_f64(value * scale))
}

/// Parse a 7-bit I2C address given in decimal or `0x` hex.
pub fn parse_i2c_address(s: &str) -> Result<u8, String> {
    let s = s.trim();
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => s.parse(),
    };

    match parsed {
        Ok(address) if address <= 0x7F => Ok(address),
        Ok(address) => Err(format!("I2C address {address:#04x} is not a 7-bit address")),
        Err(e) => Err(format!("Invalid I2C address '{s}': {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration_units() {
        assert_eq!(parse_duration("500ms").unwrap(), Duration::from_millis(500));
        assert_eq!(parse_duration("60s").unwrap(), Duration::from_secs(60));
        assert_eq!(parse_duration("60").unwrap(), Duration::from_secs(60));
        assert_eq!(parse_duration("2m").unwrap(), Duration::from_secs(120));
        assert_eq!(parse_duration("1h").unwrap(), Duration::from_secs(3600));
    }

    #[test]
    fn test_parse_duration_rejects() {
        assert!(parse_duration("-1s").is_err());
        assert!(parse_duration("fast").is_err());
    }

    #[test]
    fn test_parse_i2c_address() {
        assert_eq!(parse_i2c_address("0x48").unwrap(), 0x48);
        assert_eq!(parse_i2c_address("73").unwrap(), 73);
        assert!(parse_i2c_address("0x80").is_err());
        assert!(parse_i2c_address("0xZZ").is_err());
    }
}
