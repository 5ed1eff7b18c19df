//! Motorized filterwheel in front of the FPI etalon.
//!
//! The wheel carries four filter slots. Each slot sits at a fixed physical
//! offset (in motor steps) relative to the mechanical home sensor, and a
//! [`FilterWheel`] implementation exposes three primitives on top of that:
//! absolute moves, homing to the sensor, and a query of the current offset.
//!
//! Two implementations are provided:
//!
//! - [`StepperFilterWheel`] drives a step/direction stepper controller and
//!   reads the home sensor through a [`StepperPins`] backend. On Linux the
//!   `stepper-gpio` feature supplies [`GpiodStepperPins`].
//! - [`SimulatedFilterWheel`] keeps the offset in memory and records every
//!   move, for tests and for running the server on a desk.
//!
//! # Offset Tracking
//!
//! The stepper is open loop: the driver counts the steps it issues and has no
//! encoder. Only a home sequence re-establishes the true offset, and callers
//! that keep their own record of the last commanded offset can assert it onto
//! the driver with [`FilterWheel::assume_offset`] before a relative move.

mod config;
#[cfg(all(target_os = "linux", feature = "stepper-gpio"))]
mod gpio;
mod sim;
mod stepper;

use thiserror::Error;

pub use config::{FilterWheelConfig, GpioWiring, WheelConfigError};
#[cfg(all(target_os = "linux", feature = "stepper-gpio"))]
pub use gpio::GpiodStepperPins;
pub use sim::SimulatedFilterWheel;
pub use stepper::{Direction, StdDelay, StepperFilterWheel, StepperPins};

/// Number of filter slots on the wheel.
pub const SLOT_COUNT: usize = 4;

/// Errors raised by filterwheel drivers.
#[derive(Error, Debug)]
pub enum FilterWheelError {
    /// Low-level I/O error while talking to the motor controller.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The home sensor never triggered within one revolution.
    #[error("Home sensor not found after {steps} steps")]
    HomeNotFound {
        /// Steps issued before giving up
        steps: u32,
    },

    /// The driver reported a fault while executing a command.
    #[error("Filterwheel fault: {0}")]
    Fault(String),
}

/// Result type for filterwheel operations.
pub type FilterWheelResult<T> = Result<T, FilterWheelError>;

/// Interface for filterwheel control.
///
/// Abstracts the wheel hardware so the position controller can be exercised
/// against a simulated wheel. All motion calls block until the move finishes.
pub trait FilterWheel {
    /// Physical offsets of the filter slots, indexed by logical position.
    fn slot_offsets(&self) -> [i64; SLOT_COUNT];

    /// Physical offset at which the home sensor triggers.
    fn home_sensor_offset(&self) -> i64;

    /// Current physical offset as tracked by the driver.
    fn offset(&self) -> i64;

    /// Overwrite the driver's notion of the current offset without moving.
    fn assume_offset(&mut self, offset: i64);

    /// Move to an absolute physical offset.
    fn move_to(&mut self, offset: i64) -> FilterWheelResult<()>;

    /// Run the homing routine, leaving the wheel at [`home_sensor_offset`](Self::home_sensor_offset).
    fn home(&mut self) -> FilterWheelResult<()>;
}
