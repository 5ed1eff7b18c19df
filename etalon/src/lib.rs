//! Filterwheel position server and etalon temperature logger for the FPI.
//!
//! Two independent services share this crate:
//!
//! - [`server`] exposes the [`controller::PositionController`] over HTTP and
//!   serves the temperature CSV for remote monitoring (`fpi_server` binary).
//! - [`temperature`] samples the etalon temperature sensor, aggregates each
//!   integration window and appends it to the CSV (`temperature_logger` binary).
//!
//! The only thing the two share at runtime is the CSV path.

pub mod audit_log;
pub mod cli;
pub mod clock;
pub mod controller;
pub mod position;
pub mod server;
pub mod temperature;

pub use audit_log::AuditLog;
pub use clock::{Clock, ManualClock, SystemClock};
pub use controller::{ControllerError, PositionController};
pub use position::{FilterSlot, SlotError, StartupMode};
