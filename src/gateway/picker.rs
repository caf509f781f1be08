//! Path pickers - where folder and file choices come from

use std::future::Future;
use std::path::PathBuf;

use super::GatewayError;

/// Asks the user for a path. `Ok(None)` means cancelled.
pub trait PathPicker: Send + Sync + 'static {
    fn pick_folder(
        &self,
        title: &str,
    ) -> impl Future<Output = Result<Option<PathBuf>, GatewayError>> + Send;

    /// `extensions` is a filter hint without dots; empty means any file
    fn pick_file(
        &self,
        title: &str,
        extensions: &[String],
    ) -> impl Future<Output = Result<Option<PathBuf>, GatewayError>> + Send;
}

/// Answers every pick with a fixed path, for headless runs
#[derive(Debug, Clone, Default)]
pub struct PresetPicker {
    folder: Option<PathBuf>,
    file: Option<PathBuf>,
}

impl PresetPicker {
    pub fn new(folder: Option<PathBuf>, file: Option<PathBuf>) -> Self {
        Self { folder, file }
    }
}

impl PathPicker for PresetPicker {
    async fn pick_folder(&self, _title: &str) -> Result<Option<PathBuf>, GatewayError> {
        Ok(self.folder.clone())
    }

    async fn pick_file(
        &self,
        _title: &str,
        _extensions: &[String],
    ) -> Result<Option<PathBuf>, GatewayError> {
        Ok(self.file.clone())
    }
}

/// Native OS dialogs via `rfd`
#[cfg(feature = "dialogs")]
#[derive(Debug, Clone, Default)]
pub struct DialogPicker {
    start_dir: Option<PathBuf>,
}

#[cfg(feature = "dialogs")]
impl DialogPicker {
    pub fn new(start_dir: Option<PathBuf>) -> Self {
        Self { start_dir }
    }
}

#[cfg(feature = "dialogs")]
fn native_dialog(title: &str, start_dir: Option<&PathBuf>) -> rfd::FileDialog {
    let dialog = rfd::FileDialog::new().set_title(title);
    match start_dir {
        Some(dir) => dialog.set_directory(dir),
        None => dialog,
    }
}

#[cfg(feature = "dialogs")]
impl PathPicker for DialogPicker {
    async fn pick_folder(&self, title: &str) -> Result<Option<PathBuf>, GatewayError> {
        let title = title.to_string();
        let start_dir = self.start_dir.clone();

        // The dialog blocks until closed
        tokio::task::spawn_blocking(move || {
            native_dialog(&title, start_dir.as_ref()).pick_folder()
        })
        .await
        .map_err(|e| GatewayError::Picker(e.to_string()))
    }

    async fn pick_file(
        &self,
        title: &str,
        extensions: &[String],
    ) -> Result<Option<PathBuf>, GatewayError> {
        let title = title.to_string();
        let start_dir = self.start_dir.clone();
        let extensions = extensions.to_vec();

        tokio::task::spawn_blocking(move || {
            let mut dialog = native_dialog(&title, start_dir.as_ref());
            if !extensions.is_empty() {
                dialog = dialog.add_filter("Input Files", extensions.as_slice());
            }
            dialog.pick_file()
        })
        .await
        .map_err(|e| GatewayError::Picker(e.to_string()))
    }
}
