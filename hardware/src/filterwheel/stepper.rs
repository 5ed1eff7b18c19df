//! Open-loop stepper driver for the filterwheel.

use std::time::Duration;

use embedded_hal::delay::DelayNs;
use tracing::{debug, info, trace};

use super::{FilterWheel, FilterWheelConfig, FilterWheelError, FilterWheelResult, SLOT_COUNT};

/// Rotation sense of the wheel. Forward increases the physical offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// Signal-level access to a step/direction stepper controller.
pub trait StepperPins {
    /// Drive the DIR input.
    fn set_direction(&mut self, direction: Direction) -> FilterWheelResult<()>;

    /// Drive the STEP input. The controller steps on the rising edge.
    fn set_step(&mut self, high: bool) -> FilterWheelResult<()>;

    /// Whether the home sensor is currently triggered.
    fn home_sensor_active(&mut self) -> FilterWheelResult<bool>;
}

/// [`DelayNs`] backed by `std::thread::sleep`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdDelay;

impl DelayNs for StdDelay {
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(Duration::from_nanos(u64::from(ns)));
    }
}

/// Filterwheel driven by a stepper motor with a single home sensor.
///
/// The driver counts issued steps to track the offset. A move is executed one
/// pulse at a time and the offset is updated after every pulse, so a pin
/// failure mid-move leaves [`offset`](FilterWheel::offset) at the last step
/// actually issued.
pub struct StepperFilterWheel<P, D> {
    pins: P,
    delay: D,
    offset: i64,
    slot_offsets: [i64; SLOT_COUNT],
    home_sensor_offset: i64,
    steps_per_revolution: u32,
    half_period_us: u32,
}

impl<P: StepperPins, D: DelayNs> StepperFilterWheel<P, D> {
    /// Create a driver. The initial offset is assumed to be the home sensor
    /// offset until the wheel is homed.
    pub fn new(pins: P, delay: D, config: &FilterWheelConfig) -> Self {
        Self {
            pins,
            delay,
            offset: config.home_sensor_offset,
            slot_offsets: config.slot_offsets,
            home_sensor_offset: config.home_sensor_offset,
            steps_per_revolution: config.steps_per_revolution,
            half_period_us: config.step_interval_us / 2,
        }
    }

    /// Access the pin backend.
    pub fn pins(&self) -> &P {
        &self.pins
    }

    fn pulse(&mut self) -> FilterWheelResult<()> {
        self.pins.set_step(true)?;
        self.delay.delay_us(self.half_period_us);
        self.pins.set_step(false)?;
        self.delay.delay_us(self.half_period_us);
        Ok(())
    }
}

impl<P: StepperPins, D: DelayNs> FilterWheel for StepperFilterWheel<P, D> {
    fn slot_offsets(&self) -> [i64; SLOT_COUNT] {
        self.slot_offsets
    }

    fn home_sensor_offset(&self) -> i64 {
        self.home_sensor_offset
    }

    fn offset(&self) -> i64 {
        self.offset
    }

    fn assume_offset(&mut self, offset: i64) {
        trace!("Assuming offset {} (was {})", offset, self.offset);
        self.offset = offset;
    }

    fn move_to(&mut self, target: i64) -> FilterWheelResult<()> {
        let delta = target - self.offset;
        if delta == 0 {
            return Ok(());
        }

        let (direction, increment) = if delta > 0 {
            (Direction::Forward, 1)
        } else {
            (Direction::Backward, -1)
        };
        debug!(
            "Stepping {} steps {:?} from {} to {}",
            delta.unsigned_abs(),
            direction,
            self.offset,
            target
        );

        self.pins.set_direction(direction)?;
        for _ in 0..delta.unsigned_abs() {
            self.pulse()?;
            self.offset += increment;
        }
        Ok(())
    }

    fn home(&mut self) -> FilterWheelResult<()> {
        self.pins.set_direction(Direction::Backward)?;

        for steps in 0..=self.steps_per_revolution {
            if self.pins.home_sensor_active()? {
                info!("Home sensor reached after {} steps", steps);
                self.offset = self.home_sensor_offset;
                return Ok(());
            }
            self.pulse()?;
        }

        Err(FilterWheelError::HomeNotFound {
            steps: self.steps_per_revolution,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Mechanical wheel model: counts rising edges and reports the sensor
    /// when the true position sits on it.
    struct FakePins {
        true_position: i64,
        sensor_at: Option<i64>,
        direction: Direction,
        step_level: bool,
        rising_edges: u32,
        fail_after_edges: Option<u32>,
    }

    impl FakePins {
        fn at(true_position: i64) -> Self {
            Self {
                true_position,
                sensor_at: Some(0),
                direction: Direction::Forward,
                step_level: false,
                rising_edges: 0,
                fail_after_edges: None,
            }
        }
    }

    impl StepperPins for FakePins {
        fn set_direction(&mut self, direction: Direction) -> FilterWheelResult<()> {
            self.direction = direction;
            Ok(())
        }

        fn set_step(&mut self, high: bool) -> FilterWheelResult<()> {
            if high && !self.step_level {
                if self.fail_after_edges == Some(self.rising_edges) {
                    return Err(FilterWheelError::Fault("driver stalled".to_string()));
                }
                self.rising_edges += 1;
                self.true_position += match self.direction {
                    Direction::Forward => 1,
                    Direction::Backward => -1,
                };
            }
            self.step_level = high;
            Ok(())
        }

        fn home_sensor_active(&mut self) -> FilterWheelResult<bool> {
            Ok(self.sensor_at == Some(self.true_position))
        }
    }

    struct NoDelay;

    impl DelayNs for NoDelay {
        fn delay_ns(&mut self, _ns: u32) {}
    }

    fn wheel(pins: FakePins) -> StepperFilterWheel<FakePins, NoDelay> {
        StepperFilterWheel::new(pins, NoDelay, &FilterWheelConfig::default())
    }

    #[test]
    fn test_move_forward_and_back() {
        let mut wheel = wheel(FakePins::at(0));

        wheel.move_to(300).unwrap();
        assert_eq!(wheel.offset(), 300);
        assert_eq!(wheel.pins().true_position, 300);

        wheel.move_to(100).unwrap();
        assert_eq!(wheel.offset(), 100);
        assert_eq!(wheel.pins().true_position, 100);
        assert_eq!(wheel.pins().rising_edges, 500);
    }

    #[test]
    fn test_move_to_current_offset_issues_no_steps() {
        let mut wheel = wheel(FakePins::at(0));
        wheel.move_to(0).unwrap();
        assert_eq!(wheel.pins().rising_edges, 0);
    }

    #[test]
    fn test_assumed_offset_sets_step_count() {
        let mut wheel = wheel(FakePins::at(500));
        wheel.assume_offset(500);
        wheel.move_to(700).unwrap();
        assert_eq!(wheel.pins().rising_edges, 200);
        assert_eq!(wheel.pins().true_position, 700);
    }

    #[test]
    fn test_home_finds_sensor() {
        let mut wheel = wheel(FakePins::at(250));
        wheel.assume_offset(250);

        wheel.home().unwrap();
        assert_eq!(wheel.offset(), 0);
        assert_eq!(wheel.pins().true_position, 0);
        assert_eq!(wheel.pins().rising_edges, 250);
    }

    #[test]
    fn test_home_without_sensor_fails() {
        let mut pins = FakePins::at(250);
        pins.sensor_at = None;
        let mut wheel = wheel(pins);

        let err = wheel.home().unwrap_err();
        assert!(matches!(err, FilterWheelError::HomeNotFound { steps: 800 }));
    }

    #[test]
    fn test_fault_mid_move_keeps_issued_steps() {
        let mut pins = FakePins::at(0);
        pins.fail_after_edges = Some(40);
        let mut wheel = wheel(pins);

        assert!(wheel.move_to(300).is_err());
        assert_eq!(wheel.offset(), 40);
        assert_eq!(wheel.pins().true_position, 40);
    }
}
