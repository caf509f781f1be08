//! Parcel Deck Library
//!
//! Client-side orchestration for a place-file conversion tool: path
//! selection, a conversion state machine that allows one job at a time,
//! and a log view kept in sync with the backend buffer by adaptive polling.
//!
//! # Features
//!
//! - **Single-owner orchestrator**: one task owns all state; front ends send commands
//! - **Adaptive log polling**: slow while idle, fast while converting
//! - **Pluggable backend**: anything implementing [`BackendGateway`]
//! - **Terminal UI**: ratatui front end, or a headless `convert` command
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::path::PathBuf;
//!
//! use parcel_deck::core::PollCadence;
//! use parcel_deck::gateway::{ConversionWorker, LocalGateway, LogStore, PresetPicker};
//! use parcel_deck::orchestrator::Orchestrator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let picker = PresetPicker::new(
//!         Some(PathBuf::from("/tmp/out")),
//!         Some(PathBuf::from("/tmp/place.rbxl")),
//!     );
//!     let gateway = LocalGateway::new(picker, LogStore::default(), ConversionWorker::default());
//!     let (handle, _task) = Orchestrator::spawn(Arc::new(gateway), PollCadence::default());
//!
//!     handle.select_output_folder()?;
//!     handle.select_input_file()?;
//!     handle.wait_for(|s| s.can_convert()).await?;
//!     handle.run_conversion()?;
//!
//!     let done = handle.wait_for(|s| s.status.is_terminal()).await?;
//!     println!("{}", done.status);
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod gateway;
pub mod orchestrator;
pub mod tui;

// Re-export commonly used types
pub use config::Config;
pub use core::{
    CadenceMode, ConversionOutcome, ConversionStatus, LogEntry, LogLevel, Notification,
    NotificationKind, PollCadence, SelectionState,
};
pub use gateway::{
    BackendGateway, ConversionRequest, ConversionWorker, GatewayError, LocalGateway, LogStore,
    PathPicker, PresetPicker,
};
pub use orchestrator::{
    Command, LogSnapshot, Orchestrator, OrchestratorError, OrchestratorHandle, Snapshot,
};
