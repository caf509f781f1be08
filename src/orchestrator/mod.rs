//! Conversion Orchestrator - the single owner of conversion state
//!
//! The orchestrator:
//! - Runs as one task; all state lives inside it
//! - Accepts [`Command`]s from any number of [`OrchestratorHandle`]s
//! - Publishes a [`Snapshot`] after every transition
//! - Drives the [`LogSynchronizer`] cadence (slow idle, fast while converting)
//!
//! Gateway calls that may take a while (pickers, the conversion itself,
//! opening a folder) run in spawned tasks that report back over an internal
//! channel, so the orchestrator keeps answering commands meanwhile. At most
//! one conversion is ever in flight: a `RunConversion` arriving while one is
//! running is dropped.

mod log_sync;

pub use log_sync::{LogSnapshot, LogSynchronizer};

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::core::{
    CadenceMode, ConversionOutcome, ConversionStatus, Notification, PollCadence, SelectionState,
    TerminalOutcome,
};
use crate::gateway::{BackendGateway, ConversionRequest, GatewayError};

/// User intents accepted by the orchestrator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    SelectOutputFolder,
    SelectInputFile,
    RunConversion,
    ClearLogs,
    OpenOutputFolder,
    DismissNotification,
    Shutdown,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OrchestratorError {
    #[error("orchestrator has stopped")]
    Closed,
}

/// Everything the presentation needs to draw, published after each change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub selection: SelectionState,
    pub status: ConversionStatus,
    pub is_converting: bool,
    pub cadence: CadenceMode,
    /// Output of the last successful conversion, for "open folder"
    pub last_output_path: Option<PathBuf>,
    pub notification: Option<Notification>,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            selection: SelectionState::default(),
            status: ConversionStatus::Idle,
            is_converting: false,
            cadence: CadenceMode::Idle,
            last_output_path: None,
            notification: None,
        }
    }
}

impl Snapshot {
    pub fn can_select_file(&self) -> bool {
        self.selection.can_select_file()
    }

    pub fn can_convert(&self) -> bool {
        self.selection.can_convert(self.is_converting)
    }
}

/// Completions reported back by spawned gateway calls
#[derive(Debug)]
enum Event {
    FolderPicked(Result<Option<PathBuf>, GatewayError>),
    FilePicked(Result<Option<PathBuf>, GatewayError>),
    ConversionFinished(Result<ConversionOutcome, GatewayError>),
}

/// Cloneable front door to a running orchestrator
#[derive(Debug, Clone)]
pub struct OrchestratorHandle {
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<Snapshot>,
    logs: watch::Receiver<LogSnapshot>,
}

impl OrchestratorHandle {
    /// Queue a command. Only fails once the orchestrator has stopped.
    pub fn send(&self, command: Command) -> Result<(), OrchestratorError> {
        self.commands
            .send(command)
            .map_err(|_| OrchestratorError::Closed)
    }

    pub fn select_output_folder(&self) -> Result<(), OrchestratorError> {
        self.send(Command::SelectOutputFolder)
    }

    pub fn select_input_file(&self) -> Result<(), OrchestratorError> {
        self.send(Command::SelectInputFile)
    }

    pub fn run_conversion(&self) -> Result<(), OrchestratorError> {
        self.send(Command::RunConversion)
    }

    pub fn clear_logs(&self) -> Result<(), OrchestratorError> {
        self.send(Command::ClearLogs)
    }

    pub fn open_output_folder(&self) -> Result<(), OrchestratorError> {
        self.send(Command::OpenOutputFolder)
    }

    pub fn dismiss_notification(&self) -> Result<(), OrchestratorError> {
        self.send(Command::DismissNotification)
    }

    pub fn shutdown(&self) -> Result<(), OrchestratorError> {
        self.send(Command::Shutdown)
    }

    /// Latest published state
    pub fn snapshot(&self) -> Snapshot {
        self.state.borrow().clone()
    }

    /// Latest published log list
    pub fn logs(&self) -> LogSnapshot {
        Arc::clone(&self.logs.borrow())
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.state.clone()
    }

    pub fn subscribe_logs(&self) -> watch::Receiver<LogSnapshot> {
        self.logs.clone()
    }

    /// Wait until a published snapshot satisfies `predicate`
    pub async fn wait_for(
        &self,
        mut predicate: impl FnMut(&Snapshot) -> bool,
    ) -> Result<Snapshot, OrchestratorError> {
        let mut rx = self.state.clone();
        let snapshot = rx
            .wait_for(|s| predicate(s))
            .await
            .map_err(|_| OrchestratorError::Closed)?
            .clone();
        Ok(snapshot)
    }
}

pub struct Orchestrator<G: BackendGateway> {
    gateway: Arc<G>,
    cadence: PollCadence,
    selection: SelectionState,
    is_converting: bool,
    picking: bool,
    last_outcome: Option<TerminalOutcome>,
    last_output_path: Option<PathBuf>,
    notification: Option<Notification>,
    mode: CadenceMode,
    logs: LogSynchronizer<G>,
    state_tx: watch::Sender<Snapshot>,
    events_tx: mpsc::UnboundedSender<Event>,
    events_rx: mpsc::UnboundedReceiver<Event>,
}

impl<G: BackendGateway> Orchestrator<G> {
    /// Start the orchestration task and its idle log poller
    pub fn spawn(gateway: Arc<G>, cadence: PollCadence) -> (OrchestratorHandle, JoinHandle<()>) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(Snapshot::default());
        let (logs_tx, logs_rx) = watch::channel(LogSnapshot::default());
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let orchestrator = Self {
            logs: LogSynchronizer::new(Arc::clone(&gateway), logs_tx),
            gateway,
            cadence,
            selection: SelectionState::default(),
            is_converting: false,
            picking: false,
            last_outcome: None,
            last_output_path: None,
            notification: None,
            mode: CadenceMode::Idle,
            state_tx,
            events_tx,
            events_rx,
        };

        let task = tokio::spawn(orchestrator.run(command_rx));

        let handle = OrchestratorHandle {
            commands: command_tx,
            state: state_rx,
            logs: logs_rx,
        };

        (handle, task)
    }

    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        self.logs.restart(self.cadence.period(self.mode));
        self.publish();

        loop {
            tokio::select! {
                Some(event) = self.events_rx.recv() => self.handle_event(event).await,
                command = commands.recv() => match command {
                    Some(Command::Shutdown) | None => break,
                    Some(command) => self.handle_command(command).await,
                },
            }
        }

        self.logs.stop();
        debug!("Orchestrator stopped");
    }

    async fn handle_command(&mut self, command: Command) {
        debug!("Command: {:?}", command);
        match command {
            Command::SelectOutputFolder => self.start_pick(true),
            Command::SelectInputFile => self.start_pick(false),
            Command::RunConversion => self.start_conversion().await,
            Command::ClearLogs => self.logs.clear().await,
            Command::OpenOutputFolder => self.open_output_folder(),
            Command::DismissNotification => {
                self.notification = None;
                self.publish();
            }
            Command::Shutdown => {}
        }
    }

    async fn handle_event(&mut self, event: Event) {
        match event {
            Event::FolderPicked(result) => {
                self.picking = false;
                if let Some(folder) = self.take_pick(result) {
                    info!("Output folder: {}", folder.display());
                    self.selection.set_output_folder(folder);
                    self.last_outcome = None;
                }
                self.publish();
            }
            Event::FilePicked(result) => {
                self.picking = false;
                if let Some(file) = self.take_pick(result) {
                    info!("Input file: {}", file.display());
                    self.selection.set_input_file(file);
                    self.last_outcome = None;
                }
                self.publish();
            }
            Event::ConversionFinished(result) => self.finish_conversion(result).await,
        }
    }

    /// Cancelled or empty picks are no-ops; failed picks become an error notification
    fn take_pick(&mut self, result: Result<Option<PathBuf>, GatewayError>) -> Option<PathBuf> {
        match result {
            Ok(picked) => picked.filter(|p| !p.as_os_str().is_empty()),
            Err(e) => {
                warn!("Selection failed: {}", e);
                self.notification = Some(Notification::error(e.to_string()));
                None
            }
        }
    }

    fn start_pick(&mut self, folder: bool) {
        // One dialog at a time
        if self.picking {
            debug!("Picker already open");
            return;
        }
        self.picking = true;

        let gateway = Arc::clone(&self.gateway);
        let events = self.events_tx.clone();
        tokio::spawn(async move {
            let event = if folder {
                Event::FolderPicked(gateway.select_output_folder().await)
            } else {
                Event::FilePicked(gateway.select_input_file().await)
            };
            let _ = events.send(event);
        });
    }

    async fn start_conversion(&mut self) {
        let (Some(output_folder), Some(input_path)) = (
            self.selection.output_folder.clone(),
            self.selection.input_file.clone(),
        ) else {
            debug!("Conversion requested without both paths");
            return;
        };
        if self.is_converting {
            debug!("Conversion already running");
            return;
        }

        self.is_converting = true;
        self.last_outcome = None;
        self.set_mode(CadenceMode::Active);
        self.publish();

        // Bring the log view up to date before the first fast tick
        self.logs.fetch_now().await;

        let request = ConversionRequest {
            input_path,
            output_folder,
        };
        let gateway = Arc::clone(&self.gateway);
        let events = self.events_tx.clone();
        tokio::spawn(async move {
            let call = tokio::spawn(async move { gateway.run_conversion(request).await });
            let result = match call.await {
                Ok(result) => result,
                Err(e) => Err(GatewayError::Task(e.to_string())),
            };
            let _ = events.send(Event::ConversionFinished(result));
        });
    }

    async fn finish_conversion(&mut self, result: Result<ConversionOutcome, GatewayError>) {
        match result {
            Ok(outcome) => {
                info!("Conversion finished: {}", outcome.message);
                self.last_output_path = Some(outcome.output_path.clone());
                self.last_outcome = Some(TerminalOutcome::Succeeded {
                    output_path: outcome.output_path,
                    message: outcome.message.clone(),
                });
                // Pick up the worker's final lines
                self.logs.fetch_now().await;
                self.notification = Some(Notification::success(outcome.message));
            }
            Err(e) => {
                let message = e.to_string();
                warn!("Conversion failed: {}", message);
                self.last_outcome = Some(TerminalOutcome::Failed {
                    message: message.clone(),
                });
                self.logs.fetch_now().await;
                self.notification = Some(Notification::error(message));
            }
        }

        self.is_converting = false;
        self.set_mode(CadenceMode::Idle);
        self.publish();
    }

    fn open_output_folder(&mut self) {
        if let Some(path) = self.last_output_path.clone() {
            let gateway = Arc::clone(&self.gateway);
            tokio::spawn(async move {
                if let Err(e) = gateway.open_folder(path).await {
                    warn!("Failed to open folder: {}", e);
                }
            });
        }

        // Opening the folder closes the success popup
        if matches!(&self.notification, Some(n) if !n.is_error()) {
            self.notification = None;
            self.publish();
        }
    }

    fn set_mode(&mut self, mode: CadenceMode) {
        if self.mode != mode || self.logs.period().is_none() {
            self.mode = mode;
            self.logs.restart(self.cadence.period(mode));
        }
    }

    fn publish(&self) {
        let snapshot = Snapshot {
            selection: self.selection.clone(),
            status: ConversionStatus::derive(
                &self.selection,
                self.is_converting,
                self.last_outcome.as_ref(),
            ),
            is_converting: self.is_converting,
            cadence: self.mode,
            last_output_path: self.last_output_path.clone(),
            notification: self.notification.clone(),
        };
        self.state_tx.send_replace(snapshot);
    }
}
