//! gpiod backend for the filterwheel stepper.
//!
//! STEP and DIR are requested together as one output bundle so a single
//! `set_values` call drives both lines; the home sensor is a separate input
//! request.

use gpiod::{Chip, Input, Lines, Options, Output};
use tracing::debug;

use super::{Direction, FilterWheelResult, GpioWiring, StepperPins};

const CONSUMER: &str = "fpi-filterwheel";

/// [`StepperPins`] on Linux GPIO character-device lines.
pub struct GpiodStepperPins {
    outputs: Lines<Output>,
    home: Lines<Input>,
    step_level: bool,
    dir_level: bool,
    home_active_low: bool,
}

impl GpiodStepperPins {
    /// Request the step, direction and home-sensor lines described by `wiring`.
    pub fn open(wiring: &GpioWiring) -> FilterWheelResult<Self> {
        let chip = Chip::new(&wiring.chip)?;

        let outputs = chip.request_lines(
            Options::output([wiring.step_line, wiring.dir_line])
                .values([false, false])
                .consumer(CONSUMER),
        )?;
        let home = chip.request_lines(Options::input([wiring.home_line]).consumer(CONSUMER))?;

        debug!(
            "Requested {} lines step={} dir={} home={}",
            wiring.chip, wiring.step_line, wiring.dir_line, wiring.home_line
        );

        Ok(Self {
            outputs,
            home,
            step_level: false,
            dir_level: false,
            home_active_low: wiring.home_active_low,
        })
    }

    fn write(&mut self) -> FilterWheelResult<()> {
        self.outputs.set_values([self.step_level, self.dir_level])?;
        Ok(())
    }
}

impl StepperPins for GpiodStepperPins {
    fn set_direction(&mut self, direction: Direction) -> FilterWheelResult<()> {
        self.dir_level = direction == Direction::Forward;
        self.write()
    }

    fn set_step(&mut self, high: bool) -> FilterWheelResult<()> {
        self.step_level = high;
        self.write()
    }

    fn home_sensor_active(&mut self) -> FilterWheelResult<bool> {
        let [level] = self.home.get_values([false; 1])?;
        Ok(level != self.home_active_low)
    }
}
