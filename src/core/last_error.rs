//! Last-error tracking for diagnostics reporting

use super::log_record::LogRecord;
use parking_lot::RwLock;

/// Single-slot, last-write-wins store for the most recent Error/Fatal text
#[derive(Debug, Default)]
pub struct LastErrorTracker {
    slot: RwLock<String>,
}

impl LastErrorTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the slot when `record` is Error or Fatal
    pub fn record_if_severe(&self, record: &LogRecord) {
        if record.level.is_severe() {
            *self.slot.write() = record.message.clone();
        }
    }

    /// Overwrite the slot unconditionally
    pub fn set(&self, message: impl Into<String>) {
        *self.slot.write() = message.into();
    }

    /// Most recent severe message, or an empty string
    pub fn last_error(&self) -> String {
        self.slot.read().clone()
    }
}
