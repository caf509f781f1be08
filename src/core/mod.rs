//! Core module - The data model shared by every layer
//!
//! Selection state, the derived conversion status, log entries and the
//! poll cadence. Nothing in here performs I/O.

mod log;
mod selection;
mod status;

pub use log::{LogEntry, LogLevel};
pub use selection::SelectionState;
pub use status::{ConversionStatus, Notification, NotificationKind, TerminalOutcome};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Result returned by the backend when a conversion finishes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionOutcome {
    /// Where the converted project was written
    pub output_path: PathBuf,
    /// Human-readable completion message
    pub message: String,
}

/// Which of the two admissible log-poll intervals is active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CadenceMode {
    /// Slow polling while nothing is converting
    Idle,
    /// Fast polling while a conversion is in flight
    Active,
}

/// The two poll intervals, in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollCadence {
    pub idle_ms: u64,
    pub active_ms: u64,
}

impl Default for PollCadence {
    fn default() -> Self {
        Self {
            idle_ms: 2000,
            active_ms: 300,
        }
    }
}

impl PollCadence {
    pub fn new(idle_ms: u64, active_ms: u64) -> Self {
        Self { idle_ms, active_ms }
    }

    /// Interval for the given mode
    pub fn period(&self, mode: CadenceMode) -> Duration {
        match mode {
            CadenceMode::Idle => Duration::from_millis(self.idle_ms),
            CadenceMode::Active => Duration::from_millis(self.active_ms),
        }
    }
}
