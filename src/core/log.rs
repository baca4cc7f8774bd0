//! User-facing log lines.
//!
//! Every component reports its steps through a [`LogSink`]. The shell supplies a
//! [`LogBuffer`], which keeps the lines for display/export and mirrors each one
//! into `tracing`.

use std::path::Path;
use std::sync::{Mutex, PoisonError};

use crate::error::AppError;

/// Receiver of timestamp-free log lines.
pub trait LogSink: Send + Sync {
    fn emit(&self, line: &str);
}

/// Accumulating sink backing the log pane and the export operation.
#[derive(Debug, Default)]
pub struct LogBuffer {
    lines: Mutex<Vec<String>>,
}

impl LogBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Full log text as shown in the pane: one line per event, newline separated.
    pub fn text(&self) -> String {
        self.lines().join("\n")
    }

    pub fn len(&self) -> usize {
        self.lines.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Write the accumulated text verbatim to `path`, replacing any previous file.
    pub fn export(&self, path: &Path) -> Result<(), AppError> {
        std::fs::write(path, self.text())?;
        tracing::info!("Exported {} log lines to {}", self.len(), path.display());
        Ok(())
    }
}

impl LogSink for LogBuffer {
    fn emit(&self, line: &str) {
        if line.starts_with("Error:") {
            tracing::error!("{line}");
        } else {
            tracing::info!("{line}");
        }
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(line.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_keeps_emission_order() {
        let buffer = LogBuffer::new();
        buffer.emit("first");
        buffer.emit("second");
        assert_eq!(buffer.lines(), vec!["first", "second"]);
        assert_eq!(buffer.text(), "first\nsecond");
        assert_eq!(buffer.len(), 2);
    }

    #[test]
    fn test_empty_buffer() {
        let buffer = LogBuffer::new();
        assert!(buffer.is_empty());
        assert_eq!(buffer.text(), "");
    }

    #[test]
    fn test_export_writes_text_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tor_router_logs.txt");
        let buffer = LogBuffer::new();
        buffer.emit("Checking Linux dependencies...");
        buffer.emit("Error: tor is not installed. Please install it first.");

        buffer.export(&path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            written,
            "Checking Linux dependencies...\nError: tor is not installed. Please install it first."
        );
    }

    #[test]
    fn test_export_overwrites_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs.txt");
        std::fs::write(&path, "stale content that is longer").unwrap();
        let buffer = LogBuffer::new();
        buffer.emit("fresh");

        buffer.export(&path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "fresh");
    }

    #[test]
    fn test_export_into_missing_directory_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("logs.txt");
        let buffer = LogBuffer::new();

        let err = buffer.export(&path).unwrap_err();
        assert_eq!(err.kind(), "Io");
    }
}
