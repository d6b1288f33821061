//! Log record structure

use super::log_level::LogLevel;
use super::severity::SeverityCode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One forwarded log record
///
/// Built once per `log` call and never mutated afterwards. The dispatch
/// queue owns it from enqueue until the worker publishes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    /// Emitting process name
    pub name: String,
    pub message: String,
    pub file: String,
    pub function: String,
    pub line: u32,
    /// Channels the emitter publishes on; empty when suppressed
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub topics: Vec<String>,
}

impl LogRecord {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            name: String::new(),
            message: message.into(),
            file: String::new(),
            function: String::new(),
            line: 0,
            topics: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_location(
        mut self,
        file: impl Into<String>,
        function: impl Into<String>,
        line: u32,
    ) -> Self {
        self.file = file.into();
        self.function = function.into();
        self.line = line;
        self
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    #[must_use]
    pub fn with_topics(mut self, topics: Vec<String>) -> Self {
        self.topics = topics;
        self
    }

    /// Level code as it appears on the wire
    pub fn severity_code(&self) -> SeverityCode {
        self.level.severity_code()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_fields() {
        let record = LogRecord::new(LogLevel::Error, "disk full")
            .with_location("x.cc", "write", 42)
            .with_name("/writer")
            .with_topics(vec!["/rosout".to_string()]);

        assert_eq!(record.level, LogLevel::Error);
        assert_eq!(record.message, "disk full");
        assert_eq!(record.file, "x.cc");
        assert_eq!(record.function, "write");
        assert_eq!(record.line, 42);
        assert_eq!(record.name, "/writer");
        assert_eq!(record.topics, vec!["/rosout".to_string()]);
        assert_eq!(record.severity_code(), SeverityCode::ERROR);
    }

    #[test]
    fn test_json_omits_empty_topics() {
        let record = LogRecord::new(LogLevel::Info, "hello");
        let json = serde_json::to_string(&record).unwrap();
        assert!(!json.contains("topics"));

        let parsed: LogRecord = serde_json::from_str(&json).unwrap();
        assert!(parsed.topics.is_empty());
        assert_eq!(parsed.message, "hello");
    }
}
