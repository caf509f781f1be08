//! Typed-path picker for the terminal UI
//!
//! The gateway runs pickers off the UI task, so a pick becomes a
//! [`PromptRequest`] sent to the event loop, which opens an input modal
//! and answers over a oneshot.

use std::path::PathBuf;

use tokio::sync::{mpsc, oneshot};

use crate::gateway::{GatewayError, PathPicker};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    Folder,
    File,
}

/// One open question for the user. `None` on the reply means cancelled.
#[derive(Debug)]
pub struct PromptRequest {
    pub kind: PromptKind,
    pub title: String,
    pub initial: String,
    pub reply: oneshot::Sender<Option<String>>,
}

#[derive(Debug, Clone)]
pub struct PromptPicker {
    requests: mpsc::UnboundedSender<PromptRequest>,
    default_folder: Option<PathBuf>,
}

impl PromptPicker {
    /// Picker plus the receiving end the event loop drains
    pub fn channel(
        default_folder: Option<PathBuf>,
    ) -> (Self, mpsc::UnboundedReceiver<PromptRequest>) {
        let (requests, rx) = mpsc::unbounded_channel();
        (
            Self {
                requests,
                default_folder,
            },
            rx,
        )
    }

    async fn ask(
        &self,
        kind: PromptKind,
        title: String,
        initial: String,
    ) -> Result<Option<PathBuf>, GatewayError> {
        let (reply, answer) = oneshot::channel();
        self.requests
            .send(PromptRequest {
                kind,
                title,
                initial,
                reply,
            })
            .map_err(|_| GatewayError::Picker("terminal prompt is closed".to_string()))?;

        // A dropped reply means the UI went away; treat it as a cancel
        let answer = answer.await.unwrap_or(None);
        Ok(answer.as_deref().and_then(expand_path))
    }
}

impl PathPicker for PromptPicker {
    async fn pick_folder(&self, title: &str) -> Result<Option<PathBuf>, GatewayError> {
        let initial = self
            .default_folder
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default();

        match self.ask(PromptKind::Folder, title.to_string(), initial).await? {
            Some(path) if path.is_dir() => Ok(Some(path)),
            Some(path) => Err(GatewayError::Picker(format!(
                "Not a folder: {}",
                path.display()
            ))),
            None => Ok(None),
        }
    }

    async fn pick_file(
        &self,
        title: &str,
        extensions: &[String],
    ) -> Result<Option<PathBuf>, GatewayError> {
        let title = if extensions.is_empty() {
            title.to_string()
        } else {
            let hint: Vec<String> = extensions.iter().map(|e| format!(".{}", e)).collect();
            format!("{} ({})", title, hint.join(", "))
        };

        match self.ask(PromptKind::File, title, String::new()).await? {
            Some(path) if path.is_file() => Ok(Some(path)),
            Some(path) => Err(GatewayError::Picker(format!(
                "Not a file: {}",
                path.display()
            ))),
            None => Ok(None),
        }
    }
}

/// Trim, expand a leading `~`, and map blank input to `None`
pub fn expand_path(raw: &str) -> Option<PathBuf> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if raw == "~" {
        return dirs::home_dir();
    }
    if let Some(rest) = raw.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return Some(home.join(rest));
        }
    }

    Some(PathBuf::from(raw))
}
