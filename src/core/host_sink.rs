//! Host logging facility interface (journal, syslog, console)

use super::{error::Result, log_record::LogRecord, severity::JournalPriority};

/// Synchronous host sink, called inline on the producer thread
///
/// Callers ignore the returned error beyond counting it; logging must never
/// fail the producer.
pub trait HostLogSink: Send + Sync {
    fn emit(&self, record: &LogRecord, priority: JournalPriority) -> Result<()>;
    fn name(&self) -> &str;
}
