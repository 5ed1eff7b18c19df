//! TI ADS1015 12-bit analog-to-digital converter.
//!
//! The etalon temperature sensor is wired to one single-ended input of an
//! ADS1015 breakout. The sampler only needs two things from the chip: put it
//! into continuous conversion on one channel, then repeatedly read the most
//! recent conversion result.
//!
//! # Register Map
//!
//! | Pointer | Register   |
//! |---------|------------|
//! | `0x00`  | Conversion |
//! | `0x01`  | Config     |
//!
//! The conversion register holds the 12-bit two's-complement result
//! left-justified in 16 bits.
//!
//! # Example
//!
//! ```no_run
//! # #[cfg(all(target_os = "linux", feature = "ads1015-i2c"))]
//! # fn main() -> Result<(), hardware::AdcError> {
//! use hardware::{AdcSource, Ads1015, Gain};
//!
//! let mut adc = Ads1015::open_bus("/dev/i2c-1", 0x48)?;
//! adc.start_continuous(0, Gain::One)?;
//! println!("raw: {}", adc.last_result()?);
//! # Ok(())
//! # }
//! # #[cfg(not(all(target_os = "linux", feature = "ads1015-i2c")))]
//! # fn main() {}
//! ```

mod sim;

use std::fmt;
use std::str::FromStr;

use embedded_hal::i2c::{Error as _, I2c};
use thiserror::Error;
use tracing::debug;

pub use sim::SimulatedAdc;

/// Default 7-bit I2C address (ADDR pin tied to GND).
pub const DEFAULT_ADDRESS: u8 = 0x48;

const REG_CONVERSION: u8 = 0x00;
const REG_CONFIG: u8 = 0x01;

const CONFIG_OS_SINGLE: u16 = 0x8000;
const CONFIG_MUX_OFFSET: u16 = 12;
const CONFIG_MUX_SINGLE_ENDED: u16 = 0x04;
const CONFIG_MODE_CONTINUOUS: u16 = 0x0000;
const CONFIG_DR_1600SPS: u16 = 0x0080;
const CONFIG_COMP_QUE_DISABLE: u16 = 0x0003;

/// Errors raised by ADC drivers.
#[derive(Error, Debug)]
pub enum AdcError {
    /// I2C transfer failed.
    #[error("I2C error: {0}")]
    Bus(String),

    /// Single-ended channel outside 0-3.
    #[error("Invalid ADC channel {0} (expected 0-3)")]
    InvalidChannel(u8),

    /// Unsupported programmable gain.
    #[error("Invalid ADC gain '{0}' (expected 2/3, 1, 2, 4, 8 or 16)")]
    InvalidGain(String),
}

/// Programmable gain amplifier setting.
///
/// | Gain  | Full scale |
/// |-------|------------|
/// | `2/3` | ±6.144 V   |
/// | `1`   | ±4.096 V   |
/// | `2`   | ±2.048 V   |
/// | `4`   | ±1.024 V   |
/// | `8`   | ±0.512 V   |
/// | `16`  | ±0.256 V   |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gain {
    TwoThirds,
    One,
    Two,
    Four,
    Eight,
    Sixteen,
}

impl Gain {
    /// Input voltage at positive full scale.
    pub fn full_scale_volts(self) -> f64 {
        match self {
            Gain::TwoThirds => 6.144,
            Gain::One => 4.096,
            Gain::Two => 2.048,
            Gain::Four => 1.024,
            Gain::Eight => 0.512,
            Gain::Sixteen => 0.256,
        }
    }

    fn config_bits(self) -> u16 {
        match self {
            Gain::TwoThirds => 0x0000,
            Gain::One => 0x0200,
            Gain::Two => 0x0400,
            Gain::Four => 0x0600,
            Gain::Eight => 0x0800,
            Gain::Sixteen => 0x0A00,
        }
    }
}

impl FromStr for Gain {
    type Err = AdcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "2/3" => Ok(Gain::TwoThirds),
            "1" => Ok(Gain::One),
            "2" => Ok(Gain::Two),
            "4" => Ok(Gain::Four),
            "8" => Ok(Gain::Eight),
            "16" => Ok(Gain::Sixteen),
            other => Err(AdcError::InvalidGain(other.to_string())),
        }
    }
}

impl fmt::Display for Gain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Gain::TwoThirds => "2/3",
            Gain::One => "1",
            Gain::Two => "2",
            Gain::Four => "4",
            Gain::Eight => "8",
            Gain::Sixteen => "16",
        };
        f.write_str(s)
    }
}

/// Interface for a free-running ADC.
///
/// Abstracts the converter so the temperature sampler can run against a
/// simulated source.
pub trait AdcSource {
    /// Start continuous conversion on a single-ended `channel`.
    fn start_continuous(&mut self, channel: u8, gain: Gain) -> Result<(), AdcError>;

    /// Read the most recent conversion result as a signed raw count.
    fn last_result(&mut self) -> Result<i16, AdcError>;
}

/// ADS1015 driver over any `embedded-hal` I2C bus.
pub struct Ads1015<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C: I2c> Ads1015<I2C> {
    /// Create a driver at [`DEFAULT_ADDRESS`].
    pub fn new(i2c: I2C) -> Self {
        Self::with_address(i2c, DEFAULT_ADDRESS)
    }

    /// Create a driver at a specific 7-bit address (0x48-0x4B).
    pub fn with_address(i2c: I2C, address: u8) -> Self {
        Self { i2c, address }
    }

    /// Release the underlying bus.
    pub fn release(self) -> I2C {
        self.i2c
    }

    /// Config register value for continuous conversion of `channel` at `gain`.
    fn continuous_config(channel: u8, gain: Gain) -> Result<u16, AdcError> {
        if channel > 3 {
            return Err(AdcError::InvalidChannel(channel));
        }
        let mux = (CONFIG_MUX_SINGLE_ENDED + u16::from(channel)) << CONFIG_MUX_OFFSET;
        Ok(CONFIG_OS_SINGLE
            | mux
            | gain.config_bits()
            | CONFIG_MODE_CONTINUOUS
            | CONFIG_DR_1600SPS
            | CONFIG_COMP_QUE_DISABLE)
    }
}

/// Decode a left-justified 12-bit two's-complement conversion result.
fn decode_conversion(bytes: [u8; 2]) -> i16 {
    let value = (u16::from(bytes[0]) << 4) | (u16::from(bytes[1]) >> 4);
    if value & 0x800 != 0 {
        value as i16 - (1 << 12)
    } else {
        value as i16
    }
}

impl<I2C: I2c> AdcSource for Ads1015<I2C> {
    fn start_continuous(&mut self, channel: u8, gain: Gain) -> Result<(), AdcError> {
        let config = Self::continuous_config(channel, gain)?;
        debug!(
            "ADS1015@{:#04x}: continuous on channel {} gain {} (config {:#06x})",
            self.address, channel, gain, config
        );
        let [hi, lo] = config.to_be_bytes();
        self.i2c
            .write(self.address, &[REG_CONFIG, hi, lo])
            .map_err(|e| AdcError::Bus(format!("{:?}", e.kind())))
    }

    fn last_result(&mut self) -> Result<i16, AdcError> {
        let mut buf = [0u8; 2];
        self.i2c
            .write_read(self.address, &[REG_CONVERSION], &mut buf)
            .map_err(|e| AdcError::Bus(format!("{:?}", e.kind())))?;
        Ok(decode_conversion(buf))
    }
}

#[cfg(all(target_os = "linux", feature = "ads1015-i2c"))]
impl Ads1015<linux_embedded_hal::I2cdev> {
    /// Open a Linux I2C bus device (e.g. `/dev/i2c-1`) and attach a driver.
    pub fn open_bus(path: impl AsRef<std::path::Path>, address: u8) -> Result<Self, AdcError> {
        let path = path.as_ref();
        let i2c = linux_embedded_hal::I2cdev::new(path)
            .map_err(|e| AdcError::Bus(format!("{}: {e}", path.display())))?;
        Ok(Self::with_address(i2c, address))
    }
}
