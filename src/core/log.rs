//! Log entries as stored by the backend log buffer

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Severity of a captured log line
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&tracing::Level> for LogLevel {
    fn from(level: &tracing::Level) -> Self {
        match *level {
            tracing::Level::ERROR => LogLevel::Error,
            tracing::Level::WARN => LogLevel::Warn,
            tracing::Level::INFO => LogLevel::Info,
            tracing::Level::DEBUG => LogLevel::Debug,
            tracing::Level::TRACE => LogLevel::Trace,
        }
    }
}

/// One line of the backend log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Seconds since the unix epoch
    pub timestamp: u64,
    pub level: LogLevel,
    pub message: String,
}

impl LogEntry {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        Self {
            timestamp,
            level,
            message: message.into(),
        }
    }

    pub fn at(timestamp: u64, level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            timestamp,
            level,
            message: message.into(),
        }
    }

    /// Local wall-clock time, `HH:MM:SS`
    pub fn local_time(&self) -> String {
        i64::try_from(self.timestamp)
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .map(|utc| utc.with_timezone(&Local).format("%H:%M:%S").to_string())
            .unwrap_or_else(|| "--:--:--".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_serializes_lowercase() {
        let entry = LogEntry::at(1_700_000_000, LogLevel::Warn, "careful");
        let json = serde_json::to_string(&entry).unwrap();
        assert_eq!(
            json,
            r#"{"timestamp":1700000000,"level":"warn","message":"careful"}"#
        );
    }

    #[test]
    fn test_level_from_tracing() {
        assert_eq!(LogLevel::from(&tracing::Level::ERROR), LogLevel::Error);
        assert_eq!(LogLevel::from(&tracing::Level::INFO), LogLevel::Info);
        assert!(LogLevel::Error < LogLevel::Info);
    }

    #[test]
    fn test_local_time_shape() {
        let entry = LogEntry::at(1_700_000_000, LogLevel::Info, "x");
        let time = entry.local_time();
        assert_eq!(time.len(), 8);
        assert_eq!(time.matches(':').count(), 2);
    }
}
