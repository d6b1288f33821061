//! Severity mapping from application levels to sink codes and journal priorities
//!
//! Two independent scales are produced for each record:
//! - [`SeverityCode`]: the bit-flag level carried in published log messages
//! - [`JournalPriority`]: the syslog priority handed to the host journal
//!
//! Lower journal priority values are more urgent (`Emerg` = 0).

use super::log_level::LogLevel;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Level code carried inside published records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SeverityCode(u8);

impl SeverityCode {
    pub const DEBUG: SeverityCode = SeverityCode(1);
    pub const INFO: SeverityCode = SeverityCode(2);
    pub const WARN: SeverityCode = SeverityCode(4);
    pub const ERROR: SeverityCode = SeverityCode(8);
    pub const FATAL: SeverityCode = SeverityCode(16);

    #[inline]
    pub fn value(self) -> u8 {
        self.0
    }
}

impl fmt::Display for SeverityCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Syslog priority as understood by journald
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum JournalPriority {
    Emerg = 0,
    Alert = 1,
    Crit = 2,
    Err = 3,
    Warning = 4,
    Notice = 5,
    Info = 6,
    Debug = 7,
}

impl JournalPriority {
    #[inline]
    pub fn value(self) -> u8 {
        self as u8
    }

    /// True when `self` demands attention sooner than `other`
    #[inline]
    pub fn is_more_urgent_than(self, other: JournalPriority) -> bool {
        self.value() < other.value()
    }
}

impl fmt::Display for JournalPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

/// Map an application level to its (sink code, journal priority) pair
pub fn map_level(level: LogLevel) -> (SeverityCode, JournalPriority) {
    match level {
        LogLevel::Debug => (SeverityCode::DEBUG, JournalPriority::Debug),
        LogLevel::Info => (SeverityCode::INFO, JournalPriority::Info),
        LogLevel::Warn => (SeverityCode::WARN, JournalPriority::Warning),
        LogLevel::Error => (SeverityCode::ERROR, JournalPriority::Err),
        LogLevel::Fatal => (SeverityCode::FATAL, JournalPriority::Emerg),
    }
}

/// Decode a raw wire code back into a level
///
/// Unknown codes fall back to [`LogLevel::Info`].
pub fn level_from_code(code: u8) -> LogLevel {
    match code {
        1 => LogLevel::Debug,
        2 => LogLevel::Info,
        4 => LogLevel::Warn,
        8 => LogLevel::Error,
        16 => LogLevel::Fatal,
        _ => LogLevel::Info,
    }
}

/// Map a raw wire code; unknown codes yield the Info pair
pub fn map_raw_code(code: u8) -> (SeverityCode, JournalPriority) {
    map_level(level_from_code(code))
}

impl LogLevel {
    #[inline]
    pub fn severity_code(&self) -> SeverityCode {
        map_level(*self).0
    }

    #[inline]
    pub fn journal_priority(&self) -> JournalPriority {
        map_level(*self).1
    }
}
