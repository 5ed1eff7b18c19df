//! Operator audit log.
//!
//! A plain append-only text file next to the service logs, one timestamped line
//! per operator-visible event:
//!
//! ```text
//! 2021-09-16 18:02:11:: POSITION REQUESTED 2 (OLD:0)
//! 2021-09-16 18:02:13:: SUCCESS
//! ```
//!
//! Every line is also emitted through `tracing`. A failure to write the file is
//! reported as a warning and never fails the operation being audited.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::{info, warn};

#[derive(Debug, Clone, Default)]
pub struct AuditLog {
    path: Option<PathBuf>,
}

impl AuditLog {
    /// Audit log appending to `path`, created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// Audit log that only emits tracing events.
    pub fn disabled() -> Self {
        Self { path: None }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn record(&self, text: impl AsRef<str>) {
        let text = text.as_ref();
        info!(target: "audit", "{}", text);

        if let Some(path) = &self.path {
            if let Err(e) = Self::append(path, text) {
                warn!("Failed to write audit log {}: {}", path.display(), e);
            }
        }
    }

    fn append(path: &Path, text: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(
            file,
            "{}:: {}",
            Local::now().format("%Y-%m-%d %H:%M:%S"),
            text
        )
    }
}
