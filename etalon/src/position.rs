//! Logical filter positions.

use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use hardware::filterwheel::SLOT_COUNT;
use thiserror::Error;

/// Reasons a requested position is not a filter slot.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SlotError {
    #[error("'{0}' is not an integer")]
    NotANumber(String),

    #[error("{0} is outside 0-3")]
    OutOfRange(i64),
}

/// One of the four filter slots, identified by its logical position 0-3.
///
/// Holding a `FilterSlot` means the position has already been validated, so
/// nothing downstream needs to range-check before touching hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FilterSlot(u8);

impl FilterSlot {
    pub const ALL: [FilterSlot; SLOT_COUNT] =
        [FilterSlot(0), FilterSlot(1), FilterSlot(2), FilterSlot(3)];

    pub fn new(position: i64) -> Result<Self, SlotError> {
        u8::try_from(position)
            .ok()
            .filter(|&p| usize::from(p) < SLOT_COUNT)
            .map(FilterSlot)
            .ok_or(SlotError::OutOfRange(position))
    }

    /// Index into a slot offset table.
    pub fn index(self) -> usize {
        usize::from(self.0)
    }
}

impl FromStr for FilterSlot {
    type Err = SlotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let position: i64 = s
            .trim()
            .parse()
            .map_err(|_| SlotError::NotANumber(s.to_string()))?;
        Self::new(position)
    }
}

impl fmt::Display for FilterSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Filter to land on after the startup sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StartupMode {
    /// Position 0
    Blank,
    /// Position 1
    Green,
    /// Position 2
    Red,
    /// Stay wherever the startup homing left the wheel
    #[value(name = "none")]
    Unchanged,
}

impl StartupMode {
    pub fn slot(self) -> Option<FilterSlot> {
        match self {
            StartupMode::Blank => Some(FilterSlot(0)),
            StartupMode::Green => Some(FilterSlot(1)),
            StartupMode::Red => Some(FilterSlot(2)),
            StartupMode::Unchanged => None,
        }
    }
}

impl fmt::Display for StartupMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StartupMode::Blank => "blank",
            StartupMode::Green => "green",
            StartupMode::Red => "red",
            StartupMode::Unchanged => "none",
        };
        f.write_str(s)
    }
}
