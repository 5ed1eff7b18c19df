//! Append-only temperature CSV with lazy rotation.
//!
//! ```text
//! date,value,std,temp,std
//! 2021/09/16 12:00:30,1001,0.816,24.526,0.023
//! ```
//!
//! Rotation only raises a flag. The file is truncated and re-headered by the
//! next [`TemperatureLog::append`], so the file is never left header-only
//! between windows.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use csv::{QuoteStyle, Terminator, WriterBuilder};
use thiserror::Error;
use tracing::{debug, info};

use super::sample::TemperatureSample;

#[derive(Error, Debug)]
pub enum TemperatureLogError {
    #[error("Temperature log I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Temperature log write error: {0}")]
    Csv(#[from] csv::Error),
}

pub type TemperatureLogResult<T> = Result<T, TemperatureLogError>;

#[derive(Debug)]
pub struct TemperatureLog {
    path: PathBuf,
    rotation_pending: bool,
}

impl TemperatureLog {
    pub const HEADER: [&'static str; 5] = ["date", "value", "std", "temp", "std"];

    /// Attach to `path`, writing the header if the file does not exist yet.
    /// An existing file is appended to as-is.
    pub fn open(path: impl Into<PathBuf>) -> TemperatureLogResult<Self> {
        let log = Self {
            path: path.into(),
            rotation_pending: false,
        };

        if !log.path.exists() {
            info!("Creating temperature log {}", log.path.display());
            log.write_header()?;
        }
        Ok(log)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Truncate the file before the next append.
    pub fn request_rotation(&mut self) {
        debug!("Temperature log rotation requested");
        self.rotation_pending = true;
    }

    pub fn rotation_pending(&self) -> bool {
        self.rotation_pending
    }

    pub fn append(&mut self, sample: &TemperatureSample) -> TemperatureLogResult<()> {
        if self.rotation_pending {
            info!("Rotating temperature log {}", self.path.display());
            self.write_header()?;
            self.rotation_pending = false;
        }

        let file = OpenOptions::new().append(true).create(true).open(&self.path)?;
        Self::write_record(file, &sample.csv_fields())
    }

    fn write_header(&self) -> TemperatureLogResult<()> {
        Self::write_record(File::create(&self.path)?, &Self::HEADER)
    }

    fn write_record<I>(file: File, record: I) -> TemperatureLogResult<()>
    where
        I: IntoIterator,
        I::Item: AsRef<[u8]>,
    {
        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .terminator(Terminator::Any(b'\n'))
            .quote_style(QuoteStyle::Never)
            .from_writer(file);
        writer.write_record(record)?;
        writer.flush()?;
        Ok(())
    }
}
