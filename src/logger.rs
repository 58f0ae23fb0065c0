//! Logger module - Timestamped experiment status lines on an owned sink

pub mod sink;

pub use sink::{FileSink, LogSink, MemorySink};

use chrono::{SecondsFormat, Utc};
use std::path::Path;

use crate::error::LogError;

pub const DEFAULT_LOG_FILE: &str = "data.log";

// ============================================================================
// DATA LOGGER
// ============================================================================

/// Writes one `<timestamp> INFO:root:<message>` line per call to its sink.
///
/// Each logger owns its sink; two loggers never share configuration.
pub struct DataLogger<S: LogSink = FileSink> {
    sink: S,
    entries_written: u64,
}

impl DataLogger<FileSink> {
    /// Append to the file at `path`. Failing to open it is returned here, not on `log`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LogError> {
        Ok(Self::with_sink(FileSink::open(path)?))
    }
}

impl<S: LogSink> DataLogger<S> {
    pub fn with_sink(sink: S) -> Self {
        Self {
            sink,
            entries_written: 0,
        }
    }

    pub fn log(&mut self, message: &str) -> Result<(), LogError> {
        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);
        self.sink.append(&format_entry(&timestamp, message))?;
        self.entries_written += 1;
        Ok(())
    }

    pub fn entries_written(&self) -> u64 {
        self.entries_written
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}

fn format_entry(timestamp: &str, message: &str) -> String {
    format!("{} INFO:root:{}", timestamp, message)
}
