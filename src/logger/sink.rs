use parking_lot::RwLock;
use std::collections::VecDeque;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::LogError;

/// Append-only destination for formatted log lines.
pub trait LogSink {
    /// Append one line. `line` carries no trailing newline.
    fn append(&mut self, line: &str) -> io::Result<()>;
}

// ============================================================================
// FILE SINK
// ============================================================================

pub struct FileSink {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl FileSink {
    /// Open `path` for appending, creating it if needed. Existing lines are kept.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LogError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| LogError::Open { path: path.clone(), source })?;

        Ok(Self {
            path,
            writer: BufWriter::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LogSink for FileSink {
    fn append(&mut self, line: &str) -> io::Result<()> {
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()
    }
}

// ============================================================================
// MEMORY SINK - Shared bounded ring of lines
// ============================================================================

/// Clones share the same buffer, so a driver can keep one handle for reading
/// while a logger owns another for writing.
#[derive(Clone)]
pub struct MemorySink {
    entries: Arc<RwLock<VecDeque<String>>>,
    max_size: usize,
}

impl MemorySink {
    pub fn new(max_size: usize) -> Self {
        let max_size = max_size.max(1);
        Self {
            entries: Arc::new(RwLock::new(VecDeque::with_capacity(max_size))),
            max_size,
        }
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.read().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl LogSink for MemorySink {
    fn append(&mut self, line: &str) -> io::Result<()> {
        let mut log = self.entries.write();
        log.push_back(line.to_string());
        if log.len() > self.max_size {
            log.pop_front();
        }
        Ok(())
    }
}

impl<S: LogSink + ?Sized> LogSink for Box<S> {
    fn append(&mut self, line: &str) -> io::Result<()> {
        (**self).append(line)
    }
}
