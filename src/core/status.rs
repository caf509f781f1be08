//! Conversion status - derived from selection, the in-flight flag and the
//! last terminal outcome

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::SelectionState;

/// What the last completed conversion produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TerminalOutcome {
    Succeeded { output_path: PathBuf, message: String },
    Failed { message: String },
}

/// The single status shown to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConversionStatus {
    /// Nothing derived yet
    Idle,
    AwaitingFolder,
    AwaitingFile,
    Ready,
    Processing,
    Succeeded { output_path: PathBuf, message: String },
    Failed { message: String },
}

impl ConversionStatus {
    /// Recompute the status after any selection change or orchestrator
    /// transition.
    ///
    /// A terminal outcome is only shown while the selection is complete and
    /// nothing is converting; the caller drops it once it is superseded.
    pub fn derive(
        selection: &SelectionState,
        is_converting: bool,
        last_outcome: Option<&TerminalOutcome>,
    ) -> Self {
        if selection.output_folder.is_none() {
            ConversionStatus::AwaitingFolder
        } else if selection.input_file.is_none() {
            ConversionStatus::AwaitingFile
        } else if is_converting {
            ConversionStatus::Processing
        } else {
            match last_outcome {
                Some(TerminalOutcome::Succeeded {
                    output_path,
                    message,
                }) => ConversionStatus::Succeeded {
                    output_path: output_path.clone(),
                    message: message.clone(),
                },
                Some(TerminalOutcome::Failed { message }) => ConversionStatus::Failed {
                    message: message.clone(),
                },
                None => ConversionStatus::Ready,
            }
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ConversionStatus::Succeeded { .. } | ConversionStatus::Failed { .. }
        )
    }

    /// Status line text
    pub fn label(&self) -> &'static str {
        match self {
            ConversionStatus::Idle => "STARTING...",
            ConversionStatus::AwaitingFolder => "SELECT OUTPUT FOLDER...",
            ConversionStatus::AwaitingFile => "SELECT INPUT FILE...",
            ConversionStatus::Ready => "READY TO CONVERT",
            ConversionStatus::Processing => "PROCESSING...",
            ConversionStatus::Succeeded { .. } => "CONVERSION COMPLETE",
            ConversionStatus::Failed { .. } => "CONVERSION FAILED",
        }
    }
}

impl fmt::Display for ConversionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationKind {
    Success,
    Error,
}

/// A dismissible popup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Error,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.kind == NotificationKind::Error
    }
}
