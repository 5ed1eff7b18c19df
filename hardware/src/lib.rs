//! Hardware drivers for the etalon filter assembly.
//!
//! This crate provides drivers for the two devices on the FPI bench: the
//! motorized filterwheel in front of the etalon and the ADS1015 converter that
//! digitizes the etalon temperature sensor. Each driver has a simulated
//! counterpart so the services built on top can run without hardware.
//!
//! # Features
//!
//! ## Individual Drivers
//! - `stepper-gpio` - Filterwheel stepper driven through gpiochip lines (Linux only)
//! - `ads1015-i2c` - ADS1015 converter on a Linux `/dev/i2c-*` bus (Linux only)
//!
//! ## Convenience Features
//! - `full-linux` - All drivers for the Raspberry Pi deployment

pub mod ads1x15;
pub mod filterwheel;

pub use ads1x15::{AdcError, AdcSource, Ads1015, Gain, SimulatedAdc};
pub use filterwheel::{
    FilterWheel, FilterWheelConfig, FilterWheelError, FilterWheelResult, SimulatedFilterWheel,
    StepperFilterWheel, StepperPins,
};
