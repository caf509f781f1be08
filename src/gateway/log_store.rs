//! Log store - the backend's in-memory log buffer
//!
//! A bounded buffer of [`LogEntry`] values fed by a `tracing` layer. The
//! gateway hands out full snapshots; clients never see partial updates.

use std::collections::VecDeque;
use std::fmt::{self, Write as _};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

use crate::core::{LogEntry, LogLevel};

/// Shared handle to the log buffer
#[derive(Debug, Clone)]
pub struct LogStore {
    entries: Arc<Mutex<VecDeque<LogEntry>>>,
    max_entries: usize,
}

impl Default for LogStore {
    fn default() -> Self {
        Self::new(5000)
    }
}

impl LogStore {
    /// `max_entries` of 0 is treated as 1
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: Arc::new(Mutex::new(VecDeque::new())),
            max_entries: max_entries.max(1),
        }
    }

    /// Append, dropping the oldest entry when full
    pub fn push(&self, entry: LogEntry) {
        let mut entries = self.entries.lock();
        while entries.len() >= self.max_entries {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    pub fn record(&self, level: LogLevel, message: impl Into<String>) {
        self.push(LogEntry::new(level, message));
    }

    /// Copy of the whole buffer, oldest first
    pub fn snapshot(&self) -> Vec<LogEntry> {
        self.entries.lock().iter().cloned().collect()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// A `tracing` layer that appends every event it sees to this store
    pub fn layer(&self) -> LogBufferLayer {
        LogBufferLayer {
            store: self.clone(),
        }
    }
}

/// `tracing` layer writing into a [`LogStore`]
///
/// Filter it with `Layer::with_filter` to pick the captured level.
pub struct LogBufferLayer {
    store: LogStore,
}

impl<S: Subscriber> Layer<S> for LogBufferLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        let level = LogLevel::from(event.metadata().level());
        self.store.push(LogEntry::new(level, visitor.finish()));
    }
}

#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: String,
}

impl MessageVisitor {
    fn finish(self) -> String {
        if self.fields.is_empty() {
            self.message
        } else if self.message.is_empty() {
            self.fields
        } else {
            format!("{} {}", self.message, self.fields)
        }
    }

    fn push_field(&mut self, name: &str, value: fmt::Arguments<'_>) {
        if !self.fields.is_empty() {
            self.fields.push(' ');
        }
        let _ = write!(self.fields, "{}={}", name, value);
    }
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.push_field(field.name(), format_args!("{}", value));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        } else {
            self.push_field(field.name(), format_args!("{:?}", value));
        }
    }
}
