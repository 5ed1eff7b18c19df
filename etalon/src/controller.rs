//! Filterwheel position controller.
//!
//! Wraps a [`FilterWheel`] driver with the logical view the operators use:
//! four numbered slots, a status query that maps the physical offset back to
//! a slot, and a homing sequence that lands on slot 0.
//!
//! # Homing Sequence
//!
//! 1. If the wheel sits on the home sensor or on slot 0, move to slot 1
//!    first. Starting a home search on top of the sensor would trigger it
//!    immediately without a real reference.
//! 2. Run the driver's home routine.
//! 3. Record the resulting offset as the last known position.
//! 4. Move to slot 0.
//!
//! A fault at any step aborts the sequence and leaves the wheel wherever it
//! stopped; nothing is retried.
//!
//! # Last Commanded Offset
//!
//! The controller remembers the offset it last commanded (or the home offset
//! after homing) and asserts it onto the driver before every move. The
//! driver then steps relative to that value.

use hardware::filterwheel::{FilterWheel, FilterWheelError, SLOT_COUNT};
use thiserror::Error;
use tracing::{debug, info};

use crate::audit_log::AuditLog;
use crate::position::{FilterSlot, SlotError, StartupMode};

/// Errors surfaced by controller operations.
#[derive(Error, Debug)]
pub enum ControllerError {
    /// The requested position is not a filter slot. Raised before any
    /// hardware access.
    #[error("Invalid filter position: {0}")]
    InvalidPosition(#[from] SlotError),

    /// The wheel reports an offset that matches none of the slots.
    #[error("Filterwheel desync: offset {offset} matches no slot in {slots:?}")]
    Desync {
        offset: i64,
        slots: [i64; SLOT_COUNT],
    },

    /// The driver failed while executing a command.
    #[error("Filterwheel hardware error: {0}")]
    Hardware(#[from] FilterWheelError),
}

/// Owner of the filterwheel handle and the last commanded offset.
pub struct PositionController<W> {
    wheel: W,
    last_offset: Option<i64>,
    audit: AuditLog,
}

impl<W: FilterWheel> PositionController<W> {
    pub fn new(wheel: W, audit: AuditLog) -> Self {
        Self {
            wheel,
            last_offset: None,
            audit,
        }
    }

    pub fn wheel(&self) -> &W {
        &self.wheel
    }

    pub fn wheel_mut(&mut self) -> &mut W {
        &mut self.wheel
    }

    /// Offset of the last completed move or home, if any.
    pub fn last_offset(&self) -> Option<i64> {
        self.last_offset
    }

    /// Slot matching the last commanded offset, if it is one.
    pub fn last_position(&self) -> Option<FilterSlot> {
        self.last_offset.and_then(|offset| self.slot_at(offset))
    }

    fn slot_at(&self, offset: i64) -> Option<FilterSlot> {
        let slots = self.wheel.slot_offsets();
        FilterSlot::ALL
            .into_iter()
            .find(|slot| slots[slot.index()] == offset)
    }

    /// Current slot, by exact match of the wheel's offset.
    pub fn get_position(&self) -> Result<FilterSlot, ControllerError> {
        let offset = self.wheel.offset();
        let slot = self.slot_at(offset).ok_or(ControllerError::Desync {
            offset,
            slots: self.wheel.slot_offsets(),
        })?;

        self.audit.record(format!("CURRENT POSITION {slot}"));
        Ok(slot)
    }

    /// Move to `target`, blocking until the wheel gets there.
    pub fn set_position(&mut self, target: FilterSlot) -> Result<(), ControllerError> {
        let old = self
            .last_position()
            .map_or_else(|| "unknown".to_string(), |slot| slot.to_string());
        self.audit
            .record(format!("POSITION REQUESTED {target} (OLD:{old})"));

        if let Some(offset) = self.last_offset {
            self.wheel.assume_offset(offset);
        }

        let offset = self.wheel.slot_offsets()[target.index()];
        debug!("Moving filterwheel to slot {} (offset {})", target, offset);
        self.wheel.move_to(offset)?;
        self.last_offset = Some(self.wheel.offset());

        self.audit.record("SUCCESS");
        Ok(())
    }

    /// Run the homing sequence, ending on slot 0.
    pub fn home(&mut self) -> Result<(), ControllerError> {
        self.audit.record("REQUESTED HOMING SEQUENCE");

        let offset = self.wheel.offset();
        let slot0 = self.wheel.slot_offsets()[0];
        if offset == self.wheel.home_sensor_offset() || offset == slot0 {
            debug!("Offset {} is on the home sensor side, stepping away", offset);
            self.set_position(FilterSlot::ALL[1])?;
        }

        self.wheel.home()?;
        self.last_offset = Some(self.wheel.offset());
        self.audit.record("SUCCESS REACHING HOME");

        self.set_position(FilterSlot::ALL[0])
    }

    /// Startup sequence; must finish before any request is served.
    pub fn startup(&mut self, home: bool, mode: StartupMode) -> Result<(), ControllerError> {
        if home {
            self.audit.record("Homing filterwheel");
            self.home()?;
        }

        self.audit.record(format!("Startup mode: {mode}"));
        if let Some(slot) = mode.slot() {
            self.set_position(slot)?;
        }

        info!(
            "Filterwheel ready at offset {} (slot {:?})",
            self.wheel.offset(),
            self.last_position()
        );
        Ok(())
    }
}
