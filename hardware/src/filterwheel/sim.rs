//! In-memory filterwheel for tests and bench-free runs.

use tracing::{debug, info};

use super::{FilterWheel, FilterWheelConfig, FilterWheelError, FilterWheelResult, SLOT_COUNT};

/// Simulated filterwheel.
///
/// Moves complete instantly. Every commanded offset is recorded so callers can
/// check the sequence a controller produced, and faults or slipped offsets can
/// be injected to exercise error paths.
#[derive(Debug, Clone)]
pub struct SimulatedFilterWheel {
    slot_offsets: [i64; SLOT_COUNT],
    home_sensor_offset: i64,
    offset: i64,
    move_history: Vec<i64>,
    home_count: usize,
    pending_fault: Option<String>,
}

impl SimulatedFilterWheel {
    /// Create a wheel resting on the home sensor.
    pub fn new(slot_offsets: [i64; SLOT_COUNT], home_sensor_offset: i64) -> Self {
        Self {
            slot_offsets,
            home_sensor_offset,
            offset: home_sensor_offset,
            move_history: Vec::new(),
            home_count: 0,
            pending_fault: None,
        }
    }

    /// Create a wheel with the geometry from `config`.
    pub fn from_config(config: &FilterWheelConfig) -> Self {
        Self::new(config.slot_offsets, config.home_sensor_offset)
    }

    /// Start the wheel at `offset` instead of the home sensor.
    pub fn starting_at(mut self, offset: i64) -> Self {
        self.offset = offset;
        self
    }

    /// Move the wheel without going through the driver, as a slipped belt would.
    pub fn force_offset(&mut self, offset: i64) {
        self.offset = offset;
    }

    /// Make the next move or home fail with `message`.
    pub fn fail_next(&mut self, message: impl Into<String>) {
        self.pending_fault = Some(message.into());
    }

    /// Offsets passed to [`move_to`](FilterWheel::move_to), in order.
    pub fn move_history(&self) -> &[i64] {
        &self.move_history
    }

    /// Number of completed home sequences.
    pub fn home_count(&self) -> usize {
        self.home_count
    }

    fn check_fault(&mut self) -> FilterWheelResult<()> {
        match self.pending_fault.take() {
            Some(message) => Err(FilterWheelError::Fault(message)),
            None => Ok(()),
        }
    }
}

impl FilterWheel for SimulatedFilterWheel {
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
        self.offset = offset;
    }

    fn move_to(&mut self, offset: i64) -> FilterWheelResult<()> {
        self.check_fault()?;
        debug!("Simulated move {} -> {}", self.offset, offset);
        self.move_history.push(offset);
        self.offset = offset;
        Ok(())
    }

    fn home(&mut self) -> FilterWheelResult<()> {
        self.check_fault()?;
        info!("Simulated home from {}", self.offset);
        self.offset = self.home_sensor_offset;
        self.home_count += 1;
        Ok(())
    }
}
