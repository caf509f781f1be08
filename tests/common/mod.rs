//! Scripted in-memory backend for orchestrator tests

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::Semaphore;

use parcel_deck::core::{ConversionOutcome, LogEntry, LogLevel};
use parcel_deck::gateway::{BackendGateway, ConversionRequest, GatewayError};
use parcel_deck::orchestrator::{OrchestratorHandle, Snapshot};

type Pick = Result<Option<PathBuf>, GatewayError>;

/// Backend whose answers are set by the test.
///
/// Conversions block until the test calls [`ScriptedGateway::release`].
pub struct ScriptedGateway {
    folder: Mutex<Pick>,
    file: Mutex<Pick>,
    conversion: Mutex<Result<ConversionOutcome, GatewayError>>,
    gate: Semaphore,
    logs: Mutex<Vec<LogEntry>>,
    fail_fetch: AtomicBool,
    fail_clear: AtomicBool,
    requests: Mutex<Vec<ConversionRequest>>,
    opened: Mutex<Vec<PathBuf>>,
    conversion_calls: AtomicUsize,
    fetch_calls: AtomicUsize,
    fetches_at_conversion: Mutex<Vec<usize>>,
}

impl Default for ScriptedGateway {
    fn default() -> Self {
        Self {
            folder: Mutex::new(Ok(None)),
            file: Mutex::new(Ok(None)),
            conversion: Mutex::new(Err(GatewayError::Task("not scripted".to_string()))),
            gate: Semaphore::new(0),
            logs: Mutex::new(Vec::new()),
            fail_fetch: AtomicBool::new(false),
            fail_clear: AtomicBool::new(false),
            requests: Mutex::new(Vec::new()),
            opened: Mutex::new(Vec::new()),
            conversion_calls: AtomicUsize::new(0),
            fetch_calls: AtomicUsize::new(0),
            fetches_at_conversion: Mutex::new(Vec::new()),
        }
    }
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_paths(folder: &str, file: &str) -> Self {
        let gateway = Self::default();
        gateway.set_folder(Ok(Some(PathBuf::from(folder))));
        gateway.set_file(Ok(Some(PathBuf::from(file))));
        gateway
    }

    pub fn set_folder(&self, pick: Pick) {
        *self.folder.lock() = pick;
    }

    pub fn set_file(&self, pick: Pick) {
        *self.file.lock() = pick;
    }

    pub fn set_conversion(&self, result: Result<ConversionOutcome, GatewayError>) {
        *self.conversion.lock() = result;
    }

    pub fn succeed_with(&self, output_path: &str, message: &str) {
        self.set_conversion(Ok(ConversionOutcome {
            output_path: PathBuf::from(output_path),
            message: message.to_string(),
        }));
    }

    /// Let one blocked conversion call return
    pub fn release(&self) {
        self.gate.add_permits(1);
    }

    pub fn set_logs(&self, entries: Vec<LogEntry>) {
        *self.logs.lock() = entries;
    }

    pub fn push_log(&self, timestamp: u64, message: &str) {
        self.logs
            .lock()
            .push(LogEntry::at(timestamp, LogLevel::Info, message));
    }

    pub fn backend_logs(&self) -> Vec<LogEntry> {
        self.logs.lock().clone()
    }

    pub fn fail_fetch(&self, fail: bool) {
        self.fail_fetch.store(fail, Ordering::SeqCst);
    }

    pub fn fail_clear(&self, fail: bool) {
        self.fail_clear.store(fail, Ordering::SeqCst);
    }

    pub fn conversion_calls(&self) -> usize {
        self.conversion_calls.load(Ordering::SeqCst)
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    /// Value of `fetch_calls` at the start of each conversion call
    pub fn fetches_at_conversion(&self) -> Vec<usize> {
        self.fetches_at_conversion.lock().clone()
    }

    pub fn requests(&self) -> Vec<ConversionRequest> {
        self.requests.lock().clone()
    }

    pub fn opened(&self) -> Vec<PathBuf> {
        self.opened.lock().clone()
    }
}

impl BackendGateway for ScriptedGateway {
    async fn select_output_folder(&self) -> Result<Option<PathBuf>, GatewayError> {
        self.folder.lock().clone()
    }

    async fn select_input_file(&self) -> Result<Option<PathBuf>, GatewayError> {
        self.file.lock().clone()
    }

    async fn run_conversion(
        &self,
        request: ConversionRequest,
    ) -> Result<ConversionOutcome, GatewayError> {
        self.conversion_calls.fetch_add(1, Ordering::SeqCst);
        self.fetches_at_conversion.lock().push(self.fetch_calls());
        self.requests.lock().push(request);

        let permit = self
            .gate
            .acquire()
            .await
            .map_err(|e| GatewayError::Task(e.to_string()))?;
        permit.forget();

        self.conversion.lock().clone()
    }

    async fn fetch_logs(&self) -> Result<Vec<LogEntry>, GatewayError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(GatewayError::LogStore("backend unreachable".to_string()));
        }
        Ok(self.logs.lock().clone())
    }

    async fn clear_logs(&self) -> Result<(), GatewayError> {
        if self.fail_clear.load(Ordering::SeqCst) {
            return Err(GatewayError::LogStore("clear refused".to_string()));
        }
        self.logs.lock().clear();
        Ok(())
    }

    async fn open_folder(&self, path: PathBuf) -> Result<(), GatewayError> {
        self.opened.lock().push(path);
        Ok(())
    }
}

/// Wait for a snapshot matching `predicate`, failing instead of hanging
pub async fn settle(
    handle: &OrchestratorHandle,
    predicate: impl FnMut(&Snapshot) -> bool,
) -> Snapshot {
    tokio::time::timeout(Duration::from_secs(60), handle.wait_for(predicate))
        .await
        .expect("timed out waiting for orchestrator state")
        .expect("orchestrator stopped")
}

/// Let spawned tasks run without crossing a poll tick
pub async fn yield_briefly() {
    tokio::time::sleep(Duration::from_millis(10)).await;
}
