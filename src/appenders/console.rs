//! Console host sink

use crate::core::{ForwarderError, HostLogSink, JournalPriority, LogLevel, LogRecord, Result};
use chrono::format::{Item, StrftimeItems};
use colored::Colorize;

/// Human-readable sink for hosts without a journal
///
/// Error and Fatal go to stderr, everything else to stdout.
pub struct ConsoleSink {
    use_colors: bool,
    timestamp_format: String,
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self {
            use_colors: true,
            timestamp_format: "%Y-%m-%d %H:%M:%S%.3f".to_string(),
        }
    }

    pub fn with_colors(use_colors: bool) -> Self {
        Self {
            use_colors,
            ..Self::new()
        }
    }

    /// Set a strftime-compatible timestamp format
    ///
    /// Unknown specifiers are rejected here rather than at emit time.
    ///
    /// ```
    /// use log_forwarder::appenders::ConsoleSink;
    ///
    /// let _sink = ConsoleSink::new().with_timestamp_format("%H:%M:%S").unwrap();
    /// assert!(ConsoleSink::new().with_timestamp_format("%Q").is_err());
    /// ```
    pub fn with_timestamp_format(mut self, format: &str) -> Result<Self> {
        if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
            return Err(ForwarderError::config(
                "console",
                format!("invalid timestamp format '{}'", format),
            ));
        }
        self.timestamp_format = format.to_string();
        Ok(self)
    }

    fn format_line(&self, record: &LogRecord, priority: JournalPriority) -> String {
        let level_str = if self.use_colors {
            format!("{:5}", record.level.to_str())
                .color(record.level.color_code())
                .to_string()
        } else {
            format!("{:5}", record.level.to_str())
        };

        let mut line = format!(
            "[{}] [{}] <{}> {}",
            record.timestamp.format(&self.timestamp_format),
            level_str,
            priority,
            record.name,
        );
        if !record.file.is_empty() {
            line.push_str(&format!(" {}:{}", record.file, record.line));
        }
        line.push_str(" - ");
        line.push_str(&record.message);
        line
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new()
    }
}

impl HostLogSink for ConsoleSink {
    fn emit(&self, record: &LogRecord, priority: JournalPriority) -> Result<()> {
        let line = self.format_line(record, priority);
        match record.level {
            LogLevel::Error | LogLevel::Fatal => eprintln!("{}", line),
            _ => println!("{}", line),
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "console"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_plain_format() {
        let record = LogRecord::new(LogLevel::Info, "ready")
            .with_timestamp(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap())
            .with_name("/talker")
            .with_location("main.rs", "main", 3);

        let line = ConsoleSink::with_colors(false).format_line(&record, JournalPriority::Info);
        assert_eq!(line, "[2024-05-01 12:00:00.000] [INFO ] <6> /talker main.rs:3 - ready");
    }

    #[test]
    fn test_location_omitted_when_unknown() {
        let record = LogRecord::new(LogLevel::Warn, "hm").with_name("/n");
        let line = ConsoleSink::with_colors(false)
            .with_timestamp_format("T")
            .unwrap()
            .format_line(&record, JournalPriority::Warning);
        assert_eq!(line, "[T] [WARN ] <4> /n - hm");
    }

    #[test]
    fn test_invalid_timestamp_format_rejected() {
        let err = ConsoleSink::with_colors(false)
            .with_timestamp_format("%Y-%Q")
            .err()
            .unwrap();
        assert!(matches!(err, ForwarderError::InvalidConfiguration { .. }));
        assert!(err.to_string().contains("%Y-%Q"));

        // A dangling percent is just as unusable
        assert!(ConsoleSink::new().with_timestamp_format("%").is_err());
    }

    #[test]
    fn test_emit_with_custom_format() {
        let sink = ConsoleSink::with_colors(false)
            .with_timestamp_format("%H:%M")
            .unwrap();
        let record = LogRecord::new(LogLevel::Info, "ok").with_name("/n");
        assert!(sink.emit(&record, JournalPriority::Info).is_ok());
    }
}
