//! Attendance and notification sinks.
//!
//! Both sinks are append-only. Implementations:
//! - [`InMemorySink`] - collects records in memory (demo, tests)
//! - [`JsonFileSink`] - appends to pretty-printed JSON array files
//! - [`crate::backend::BackendClient`] - posts to the HTTP backend

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use super::record::{AttendanceRecord, Notification};

/// Default attendance log file name.
pub const ATTENDANCE_FILE: &str = "attendance.json";

/// Default notification log file name.
pub const NOTIFICATIONS_FILE: &str = "notifications.json";

/// Errors raised by sinks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SinkError {
    #[error("I/O error on {path}: {message}")]
    Io { path: String, message: String },

    #[error("Failed to encode or decode record log: {0}")]
    Codec(String),

    #[error("Sink transport failed: {0}")]
    Transport(String),

    #[error("Sink returned status {code}: {message}")]
    Status { code: u16, message: String },
}

/// Append-only attendance log.
pub trait AttendanceSink: Send + Sync + 'static {
    fn append(
        &self,
        record: &AttendanceRecord,
    ) -> impl Future<Output = Result<(), SinkError>> + Send;
}

/// Fire-and-forget notification queue.
pub trait NotificationSink: Send + Sync + 'static {
    fn enqueue(
        &self,
        notification: &Notification,
    ) -> impl Future<Output = Result<(), SinkError>> + Send;
}

/// In-memory sink. Clones share storage.
#[derive(Debug, Clone, Default)]
pub struct InMemorySink {
    records: Arc<Mutex<Vec<AttendanceRecord>>>,
    notifications: Arc<Mutex<Vec<Notification>>>,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<AttendanceRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl AttendanceSink for InMemorySink {
    async fn append(&self, record: &AttendanceRecord) -> Result<(), SinkError> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record.clone());
        Ok(())
    }
}

impl NotificationSink for InMemorySink {
    async fn enqueue(&self, notification: &Notification) -> Result<(), SinkError> {
        self.notifications
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notification.clone());
        Ok(())
    }
}

/// JSON-array file sink.
///
/// Every append rewrites the file with the new entry added at the end. A
/// missing file is treated as an empty log. Appends are serialized through
/// an async mutex so concurrent writers cannot lose entries.
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    attendance_path: PathBuf,
    notifications_path: PathBuf,
    write_lock: Arc<tokio::sync::Mutex<()>>,
}

impl JsonFileSink {
    /// Sink writing `attendance.json` and `notifications.json` in `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            attendance_path: dir.join(ATTENDANCE_FILE),
            notifications_path: dir.join(NOTIFICATIONS_FILE),
            write_lock: Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    pub fn attendance_path(&self) -> &Path {
        &self.attendance_path
    }

    pub fn notifications_path(&self) -> &Path {
        &self.notifications_path
    }

    /// Read every attendance record in the log.
    pub async fn read_attendance(&self) -> Result<Vec<AttendanceRecord>, SinkError> {
        read_array(&self.attendance_path).await
    }

    /// Read every notification in the log.
    pub async fn read_notifications(&self) -> Result<Vec<Notification>, SinkError> {
        read_array(&self.notifications_path).await
    }

    async fn append_to<T: Serialize>(&self, path: &Path, entry: &T) -> Result<(), SinkError> {
        let _guard = self.write_lock.lock().await;

        let mut entries: Vec<serde_json::Value> = read_array(path).await?;
        let value = serde_json::to_value(entry).map_err(|e| SinkError::Codec(e.to_string()))?;
        entries.push(value);

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| io_error(parent, e))?;
        }
        let body =
            serde_json::to_vec_pretty(&entries).map_err(|e| SinkError::Codec(e.to_string()))?;
        tokio::fs::write(path, body)
            .await
            .map_err(|e| io_error(path, e))?;

        tracing::debug!(path = %path.display(), entries = entries.len(), "Appended log entry");
        Ok(())
    }
}

impl AttendanceSink for JsonFileSink {
    async fn append(&self, record: &AttendanceRecord) -> Result<(), SinkError> {
        let path = self.attendance_path.clone();
        self.append_to(&path, record).await
    }
}

impl NotificationSink for JsonFileSink {
    async fn enqueue(&self, notification: &Notification) -> Result<(), SinkError> {
        let path = self.notifications_path.clone();
        self.append_to(&path, notification).await
    }
}

async fn read_array<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, SinkError> {
    match tokio::fs::read(path).await {
        Ok(bytes) if bytes.iter().all(|b| b.is_ascii_whitespace()) => Ok(Vec::new()),
        Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| SinkError::Codec(e.to_string())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(io_error(path, e)),
    }
}

fn io_error(path: &Path, e: std::io::Error) -> SinkError {
    SinkError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    }
}
