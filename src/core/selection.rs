//! Selection state - the chosen output folder and input file

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// The user's current picks
///
/// Only successful picker results mutate this. A conversion, whether it
/// succeeds or fails, never clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionState {
    pub output_folder: Option<PathBuf>,
    pub input_file: Option<PathBuf>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the output folder; the input file is left as it was
    pub fn set_output_folder(&mut self, folder: PathBuf) {
        self.output_folder = Some(folder);
    }

    pub fn set_input_file(&mut self, file: PathBuf) {
        self.input_file = Some(file);
    }

    pub fn output_folder(&self) -> Option<&Path> {
        self.output_folder.as_deref()
    }

    pub fn input_file(&self) -> Option<&Path> {
        self.input_file.as_deref()
    }

    /// The file picker is only offered once a folder is chosen
    pub fn can_select_file(&self) -> bool {
        self.output_folder.is_some()
    }

    /// Both paths are present
    pub fn is_complete(&self) -> bool {
        self.output_folder.is_some() && self.input_file.is_some()
    }

    /// Conversion may start: both paths chosen and nothing in flight
    pub fn can_convert(&self, is_converting: bool) -> bool {
        self.is_complete() && !is_converting
    }
}
