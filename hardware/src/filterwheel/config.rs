//! Filterwheel geometry and wiring.
//!
//! The defaults describe the wheel as installed on the FPI bench. A JSON file
//! with any subset of the fields can override them:
//!
//! ```json
//! {
//!   "slot_offsets": [100, 300, 500, 700],
//!   "step_interval_us": 1500,
//!   "gpio": { "step_line": 17, "dir_line": 27, "home_line": 22 }
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::SLOT_COUNT;

/// Errors loading or validating a [`FilterWheelConfig`].
#[derive(Error, Debug)]
pub enum WheelConfigError {
    #[error("Failed to read wheel config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse wheel config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid wheel config: {0}")]
    Invalid(String),
}

/// GPIO lines driving the stepper controller and reading the home sensor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GpioWiring {
    /// GPIO chip name or path (e.g. `gpiochip0`)
    pub chip: String,
    /// Line offset of the STEP input on the stepper controller
    pub step_line: u32,
    /// Line offset of the DIR input on the stepper controller
    pub dir_line: u32,
    /// Line offset of the home sensor output
    pub home_line: u32,
    /// Whether the home sensor pulls its line low when triggered
    pub home_active_low: bool,
}

impl Default for GpioWiring {
    fn default() -> Self {
        Self {
            chip: "gpiochip0".to_string(),
            step_line: 17,
            dir_line: 27,
            home_line: 22,
            home_active_low: true,
        }
    }
}

/// Filterwheel geometry in motor steps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterWheelConfig {
    /// Physical offset of each filter slot, indexed by logical position
    pub slot_offsets: [i64; SLOT_COUNT],
    /// Physical offset at which the home sensor triggers
    pub home_sensor_offset: i64,
    /// Full steps in one wheel revolution; bounds the homing search
    pub steps_per_revolution: u32,
    /// Period of one step pulse in microseconds
    pub step_interval_us: u32,
    pub gpio: GpioWiring,
}

impl Default for FilterWheelConfig {
    fn default() -> Self {
        Self {
            slot_offsets: [100, 300, 500, 700],
            home_sensor_offset: 0,
            steps_per_revolution: 800,
            step_interval_us: 2000,
            gpio: GpioWiring::default(),
        }
    }
}

impl FilterWheelConfig {
    /// Load a config from a JSON file, filling missing fields with defaults.
    pub fn load(path: &Path) -> Result<Self, WheelConfigError> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the slot offsets can be told apart and the wheel can home.
    pub fn validate(&self) -> Result<(), WheelConfigError> {
        for (i, a) in self.slot_offsets.iter().enumerate() {
            if self.slot_offsets[i + 1..].contains(a) {
                return Err(WheelConfigError::Invalid(format!(
                    "slot offset {a} is used by more than one slot"
                )));
            }
        }
        if self.steps_per_revolution == 0 {
            return Err(WheelConfigError::Invalid(
                "steps_per_revolution must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
