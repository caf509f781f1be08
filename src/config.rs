//! Configuration Module - User preferences from config.toml
//!
//! Supports:
//! - Log-poll cadence (idle and active intervals)
//! - Log capture level and buffer size
//! - The conversion worker command line
//! - TUI display settings

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing_subscriber::filter::LevelFilter;

use crate::core::PollCadence;
use crate::gateway::WorkerConfig;

/// Parcel Deck Configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,
    /// Log polling intervals
    pub polling: PollingConfig,
    /// Log buffer settings
    pub logs: LogsConfig,
    /// Conversion worker settings
    pub conversion: ConversionConfig,
    /// TUI settings
    pub tui: TuiConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error
    pub log_level: String,
    /// Diagnostic log file used while the TUI owns the terminal
    pub log_file: Option<PathBuf>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_file: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    /// Poll interval while idle (ms)
    pub idle_ms: u64,
    /// Poll interval while a conversion runs (ms)
    pub active_ms: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        let cadence = PollCadence::default();
        Self {
            idle_ms: cadence.idle_ms,
            active_ms: cadence.active_ms,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogsConfig {
    /// Lowest level captured into the log view
    pub capture_level: String,
    /// Oldest entries are dropped past this many
    pub max_entries: usize,
}

impl Default for LogsConfig {
    fn default() -> Self {
        Self {
            capture_level: "info".to_string(),
            max_entries: 5000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionConfig {
    /// Accepted input extensions without dots (empty = any)
    pub accepted_extensions: Vec<String>,
    /// Pre-filled output folder
    pub default_output_folder: Option<PathBuf>,
    /// Converter executable
    pub worker_program: Option<String>,
    /// Converter arguments; `{input}` and `{output}` are substituted
    pub worker_args: Vec<String>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        let worker = WorkerConfig::default();
        Self {
            accepted_extensions: worker.accepted_extensions,
            default_output_folder: None,
            worker_program: worker.program,
            worker_args: worker.args,
        }
    }
}

/// TUI settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TuiConfig {
    /// Show timestamps in the log panel
    pub show_timestamps: bool,
    /// Redraw / spinner interval (ms)
    pub tick_ms: u64,
}

impl Default for TuiConfig {
    fn default() -> Self {
        Self {
            show_timestamps: true,
            tick_ms: 120,
        }
    }
}

impl Config {
    /// Load config from the default path, falling back to defaults.
    ///
    /// A missing file is normal. A file that fails to load is returned as
    /// the error half so it can be reported once logging is up.
    pub fn load() -> (Self, Option<anyhow::Error>) {
        Self::load_or_default(&Self::default_path())
    }

    /// Like [`Config::load_from`], but never fails
    pub fn load_or_default(path: &Path) -> (Self, Option<anyhow::Error>) {
        if !path.exists() {
            return (Self::default(), None);
        }
        match Self::load_from(path) {
            Ok(config) => (config, None),
            Err(e) => (Self::default(), Some(e)),
        }
    }

    /// Load config from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;

        Ok(config)
    }

    /// Save config to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;

        Ok(())
    }

    /// Get default config path
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "tunclon", "parcel-deck")
            .map(|dirs| dirs.config_dir().join("config.toml"))
            .unwrap_or_else(|| {
                dirs::home_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join(".parcel-deck")
                    .join("config.toml")
            })
    }

    /// Create default config file if it doesn't exist
    pub fn ensure_exists() -> Result<PathBuf> {
        let path = Self::default_path();
        if !path.exists() {
            let config = Config::default();
            config.save_to(&path)?;
            tracing::info!("Created default config at {}", path.display());
        }
        Ok(path)
    }

    /// Reject settings the orchestrator cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.polling.idle_ms == 0 || self.polling.active_ms == 0 {
            bail!("polling intervals must be greater than zero");
        }
        if self.polling.active_ms > self.polling.idle_ms {
            bail!(
                "polling.active_ms ({}) must not exceed polling.idle_ms ({})",
                self.polling.active_ms,
                self.polling.idle_ms
            );
        }
        if self.tui.tick_ms == 0 {
            bail!("tui.tick_ms must be greater than zero");
        }
        self.capture_filter()?;
        Ok(())
    }

    pub fn cadence(&self) -> PollCadence {
        PollCadence::new(self.polling.idle_ms, self.polling.active_ms)
    }

    pub fn worker_config(&self) -> WorkerConfig {
        WorkerConfig {
            program: self.conversion.worker_program.clone(),
            args: self.conversion.worker_args.clone(),
            accepted_extensions: self
                .conversion
                .accepted_extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_lowercase())
                .collect(),
        }
    }

    /// Level filter for the log buffer capture layer
    pub fn capture_filter(&self) -> Result<LevelFilter> {
        LevelFilter::from_str(&self.logs.capture_level).with_context(|| {
            format!("Invalid logs.capture_level: {}", self.logs.capture_level)
        })
    }
}

/// Generate a sample config file with comments
pub fn generate_sample_config() -> String {
    r#"# Parcel Deck Configuration
# Location: ~/.config/parcel-deck/config.toml (or %APPDATA%\tunclon\parcel-deck\config\config.toml on Windows)

[general]
# Log level: trace, debug, info, warn, error
log_level = "info"

# Diagnostic log file while the TUI is running (optional)
# log_file = "/tmp/parcel-deck.log"

[polling]
# Log refresh interval while idle (milliseconds)
idle_ms = 2000

# Log refresh interval while a conversion runs (milliseconds)
active_ms = 300

[logs]
# Lowest level shown in the log panel
capture_level = "info"

# Keep at most this many log lines
max_entries = 5000

[conversion]
# Accepted input file extensions (empty = any file)
# Example: ["rbxl", "rbxlx"]
accepted_extensions = []

# Pre-filled output folder (optional)
# default_output_folder = "/home/user/Projects"

# Converter program and its arguments.
# {input} is the input file, {output} is <output folder>/<input name>.
# worker_program = "rbxl-to-rojo"
worker_args = ["{input}", "{output}"]

[tui]
# Show timestamps in the log panel
show_timestamps = true

# Redraw interval (milliseconds)
tick_ms = 120
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.polling.idle_ms, 2000);
        assert_eq!(config.polling.active_ms, 300);
        assert_eq!(config.general.log_level, "info");
        assert!(config.conversion.worker_program.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test_config.toml");

        let mut config = Config::default();
        config.conversion.worker_program = Some("convert-place".to_string());
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.polling.idle_ms, config.polling.idle_ms);
        assert_eq!(
            loaded.conversion.worker_program.as_deref(),
            Some("convert-place")
        );
    }

    #[test]
    fn test_load_or_default_reports_bad_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        let (config, error) = Config::load_or_default(&path);
        assert!(error.is_none());
        assert_eq!(config.polling.idle_ms, 2000);

        fs::write(&path, "[polling]\nidle_ms = \"soon\"\n").unwrap();
        let (config, error) = Config::load_or_default(&path);
        let error = error.expect("malformed config should be reported");
        assert!(format!("{:#}", error).contains("Failed to parse config"));
        assert_eq!(config.polling.idle_ms, 2000);

        fs::write(&path, "[polling]\nidle_ms = 1500\n").unwrap();
        let (config, error) = Config::load_or_default(&path);
        assert!(error.is_none());
        assert_eq!(config.polling.idle_ms, 1500);
    }

    #[test]
    fn test_parse_sample_config() {
        let sample = generate_sample_config();
        let config: Config = toml::from_str(&sample).unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: Config = toml::from_str("[polling]\nactive_ms = 100\n").unwrap();
        assert_eq!(config.polling.active_ms, 100);
        assert_eq!(config.polling.idle_ms, 2000);
        assert_eq!(config.tui.tick_ms, 120);
    }

    #[test]
    fn test_validate_rejects_bad_cadence() {
        let mut config = Config::default();
        config.polling.active_ms = 0;
        assert!(config.validate().is_err());

        config.polling.active_ms = 5000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_capture_level() {
        let mut config = Config::default();
        config.logs.capture_level = "loud".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_worker_config_normalizes_extensions() {
        let mut config = Config::default();
        config.conversion.accepted_extensions = vec![".RBXL".to_string(), "rbxlx".to_string()];

        let worker = config.worker_config();
        assert_eq!(worker.accepted_extensions, vec!["rbxl", "rbxlx"]);
        assert_eq!(worker.args, vec!["{input}", "{output}"]);
    }
}
