//! Gateway module - The backend boundary
//!
//! Everything the orchestrator cannot do itself goes through
//! [`BackendGateway`]: picking paths, running the conversion, reading and
//! clearing the log buffer, and opening a folder in the system viewer.
//! Each call resolves asynchronously with a result or a [`GatewayError`].

pub mod log_store;
mod picker;
pub mod worker;

pub use log_store::{LogBufferLayer, LogStore};
pub use picker::{PathPicker, PresetPicker};
#[cfg(feature = "dialogs")]
pub use picker::DialogPicker;
pub use worker::{ConversionWorker, WorkerConfig};

use std::future::Future;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::{ConversionOutcome, LogEntry};

/// Errors raised by backend operations.
///
/// The `Display` text is what the user sees in an error notification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("Invalid file extension. Only {expected} files are supported.")]
    InvalidFileExtension { expected: String },

    #[error("Failed to open file: {0}")]
    FileOpen(String),

    #[error("Failed to create output directory: {0}")]
    DirectoryCreate(String),

    #[error("No conversion worker configured. Set `worker_program` under [conversion] in the config file.")]
    WorkerNotConfigured,

    #[error("Failed to start conversion worker: {0}")]
    WorkerSpawn(String),

    #[error("Conversion worker failed (exit code {})", exit_code_label(.code))]
    WorkerFailed { code: Option<i32> },

    #[error("Conversion task failed: {0}")]
    Task(String),

    #[error("Failed to open folder: {0}")]
    OpenFolder(String),

    #[error("Picker failed: {0}")]
    Picker(String),

    #[error("Log store unavailable: {0}")]
    LogStore(String),
}

fn exit_code_label(code: &Option<i32>) -> String {
    code.map(|c| c.to_string())
        .unwrap_or_else(|| "none".to_string())
}

/// Arguments of a conversion call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionRequest {
    pub input_path: PathBuf,
    pub output_folder: PathBuf,
}

/// The six backend operations
///
/// Implementations must be cheap to share behind an `Arc`; the
/// orchestrator and the log poller hold the same instance.
pub trait BackendGateway: Send + Sync + 'static {
    /// `Ok(None)` means the user cancelled
    fn select_output_folder(
        &self,
    ) -> impl Future<Output = Result<Option<PathBuf>, GatewayError>> + Send;

    /// `Ok(None)` means the user cancelled
    fn select_input_file(&self)
        -> impl Future<Output = Result<Option<PathBuf>, GatewayError>> + Send;

    fn run_conversion(
        &self,
        request: ConversionRequest,
    ) -> impl Future<Output = Result<ConversionOutcome, GatewayError>> + Send;

    /// Full current buffer, oldest first
    fn fetch_logs(&self) -> impl Future<Output = Result<Vec<LogEntry>, GatewayError>> + Send;

    fn clear_logs(&self) -> impl Future<Output = Result<(), GatewayError>> + Send;

    fn open_folder(&self, path: PathBuf) -> impl Future<Output = Result<(), GatewayError>> + Send;
}

/// In-process backend: a path picker, the log buffer and the worker
pub struct LocalGateway<P> {
    picker: P,
    store: LogStore,
    worker: ConversionWorker,
}

impl<P: PathPicker> LocalGateway<P> {
    pub fn new(picker: P, store: LogStore, worker: ConversionWorker) -> Self {
        Self {
            picker,
            store,
            worker,
        }
    }

    pub fn store(&self) -> &LogStore {
        &self.store
    }
}

impl<P: PathPicker> BackendGateway for LocalGateway<P> {
    async fn select_output_folder(&self) -> Result<Option<PathBuf>, GatewayError> {
        self.picker.pick_folder("Select Output Folder").await
    }

    async fn select_input_file(&self) -> Result<Option<PathBuf>, GatewayError> {
        let extensions = self.worker.config().accepted_extensions.clone();
        let picked = self
            .picker
            .pick_file("Select Input File", &extensions)
            .await?;

        match picked {
            Some(path) => {
                self.worker.check_extension(&path)?;
                Ok(Some(path))
            }
            None => Ok(None),
        }
    }

    async fn run_conversion(
        &self,
        request: ConversionRequest,
    ) -> Result<ConversionOutcome, GatewayError> {
        self.worker.convert(&request).await
    }

    async fn fetch_logs(&self) -> Result<Vec<LogEntry>, GatewayError> {
        Ok(self.store.snapshot())
    }

    async fn clear_logs(&self) -> Result<(), GatewayError> {
        self.store.clear();
        Ok(())
    }

    async fn open_folder(&self, path: PathBuf) -> Result<(), GatewayError> {
        tokio::task::spawn_blocking(move || opener::open(&path))
            .await
            .map_err(|e| GatewayError::Task(e.to_string()))?
            .map_err(|e| GatewayError::OpenFolder(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::LogLevel;
    use tempfile::tempdir;

    fn gateway(picker: PresetPicker, extensions: &[&str]) -> LocalGateway<PresetPicker> {
        let config = WorkerConfig {
            accepted_extensions: extensions.iter().map(|e| e.to_string()).collect(),
            ..WorkerConfig::default()
        };
        LocalGateway::new(picker, LogStore::new(100), ConversionWorker::new(config))
    }

    #[tokio::test]
    async fn test_file_pick_rejects_wrong_extension() {
        let picker = PresetPicker::new(None, Some(PathBuf::from("/tmp/place.txt")));
        let gw = gateway(picker, &["rbxl", "rbxlx"]);

        let err = gw.select_input_file().await.unwrap_err();
        assert_eq!(
            err,
            GatewayError::InvalidFileExtension {
                expected: ".rbxl, .rbxlx".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_cancelled_pick_is_none() {
        let gw = gateway(PresetPicker::default(), &[]);
        assert_eq!(gw.select_output_folder().await.unwrap(), None);
        assert_eq!(gw.select_input_file().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_logs_roundtrip_through_store() {
        let gw = gateway(PresetPicker::default(), &[]);
        gw.store().push(LogEntry::at(1, LogLevel::Info, "one"));
        gw.store().push(LogEntry::at(2, LogLevel::Warn, "two"));

        let logs = gw.fetch_logs().await.unwrap();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[1].message, "two");

        gw.clear_logs().await.unwrap();
        assert!(gw.fetch_logs().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_conversion_without_worker_fails() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("place.rbxl");
        std::fs::write(&input, b"data").unwrap();

        let gw = gateway(PresetPicker::default(), &[]);
        let err = gw
            .run_conversion(ConversionRequest {
                input_path: input,
                output_folder: dir.path().join("out"),
            })
            .await
            .unwrap_err();

        assert_eq!(err, GatewayError::WorkerNotConfigured);
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            GatewayError::WorkerFailed { code: Some(2) }.to_string(),
            "Conversion worker failed (exit code 2)"
        );
        assert_eq!(
            GatewayError::FileOpen("missing".into()).to_string(),
            "Failed to open file: missing"
        );
    }
}
