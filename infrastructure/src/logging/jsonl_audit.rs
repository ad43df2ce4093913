//! JSONL file writer for timeline events.
//!
//! Each [`TimelineEvent`] is serialized as a single JSON line with a
//! `type` field and `timestamp`, appended to the file via a buffered writer.
//! Existing files are appended to, never truncated.

use ballot_application::{AuditError, AuditLog, TimelineEvent};
use chrono::SecondsFormat;
use serde_json::Value;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;
use tracing::debug;

/// Failure to open the timeline file
#[derive(Error, Debug)]
pub enum AuditOpenError {
    #[error("cannot create directory {}: {source}", path.display())]
    CreateDir { path: PathBuf, source: io::Error },

    #[error("cannot open {}: {source}", path.display())]
    Open { path: PathBuf, source: io::Error },
}

/// JSONL audit log that writes one JSON object per line.
///
/// Thread-safe via `Mutex<BufWriter<File>>`. Flushes after every record and
/// on `Drop`.
pub struct JsonlAuditLog {
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
}

impl JsonlAuditLog {
    /// Open (or create) the timeline at `path`, creating parent directories.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AuditOpenError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|source| AuditOpenError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| AuditOpenError::Open {
                path: path.to_path_buf(),
                source,
            })?;
        debug!("Audit timeline opened at {}", path.display());

        Ok(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path: path.to_path_buf(),
        })
    }

    /// Get the path to the timeline file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn encode(event: TimelineEvent) -> Result<String, AuditError> {
        let timestamp = event.at.to_rfc3339_opts(SecondsFormat::Millis, true);

        // Merge payload with type + timestamp
        let record = if let Value::Object(mut map) = event.payload {
            map.insert("type".to_string(), Value::String(event.event_type.to_string()));
            map.insert("timestamp".to_string(), Value::String(timestamp));
            Value::Object(map)
        } else {
            serde_json::json!({
                "type": event.event_type,
                "timestamp": timestamp,
                "data": event.payload,
            })
        };

        Ok(serde_json::to_string(&record)?)
    }
}

impl AuditLog for JsonlAuditLog {
    fn record(&self, event: TimelineEvent) -> Result<(), AuditError> {
        let line = Self::encode(event)?;
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| io::Error::other("audit writer lock poisoned"))?;
        writeln!(writer, "{}", line)?;
        writer.flush()?;
        Ok(())
    }
}

impl Drop for JsonlAuditLog {
    fn drop(&mut self) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writer.flush();
        }
    }
}
