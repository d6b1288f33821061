//! Logging macros that capture the call site.
//!
//! Each macro formats its arguments like `format!` and forwards the record
//! together with `file!()`, `module_path!()` and `line!()`.
//!
//! # Examples
//!
//! ```
//! use log_forwarder::prelude::*;
//! use log_forwarder::info;
//! use std::sync::Arc;
//!
//! let forwarder = LogForwarder::new(Arc::new(MemoryBus::new())).unwrap();
//!
//! info!(forwarder, "Server started");
//!
//! let port = 8080;
//! info!(forwarder, "Server listening on port {}", port);
//! ```

/// Forward a record at an explicit level.
///
/// # Examples
///
/// ```
/// # use log_forwarder::prelude::*;
/// # use std::sync::Arc;
/// # let forwarder = LogForwarder::new(Arc::new(MemoryBus::new())).unwrap();
/// use log_forwarder::log;
/// log!(forwarder, LogLevel::Info, "Simple message");
/// log!(forwarder, LogLevel::Error, "Error code: {}", 500);
/// assert_eq!(forwarder.last_error(), "Error code: 500");
/// ```
#[macro_export]
macro_rules! log {
    ($forwarder:expr, $level:expr, $($arg:tt)+) => {
        $forwarder.log(
            $level,
            format!($($arg)+),
            file!(),
            module_path!(),
            line!(),
        )
    };
}

/// Forward a debug-level record.
#[macro_export]
macro_rules! debug {
    ($forwarder:expr, $($arg:tt)+) => {
        $crate::log!($forwarder, $crate::LogLevel::Debug, $($arg)+)
    };
}

/// Forward an info-level record.
#[macro_export]
macro_rules! info {
    ($forwarder:expr, $($arg:tt)+) => {
        $crate::log!($forwarder, $crate::LogLevel::Info, $($arg)+)
    };
}

/// Forward a warn-level record.
#[macro_export]
macro_rules! warn {
    ($forwarder:expr, $($arg:tt)+) => {
        $crate::log!($forwarder, $crate::LogLevel::Warn, $($arg)+)
    };
}

/// Forward an error-level record.
///
/// # Examples
///
/// ```
/// # use log_forwarder::prelude::*;
/// # use std::sync::Arc;
/// # let forwarder = LogForwarder::new(Arc::new(MemoryBus::new())).unwrap();
/// use log_forwarder::error;
/// let path = "/var/data";
/// error!(forwarder, "Failed to open {}", path);
/// assert_eq!(forwarder.last_error(), "Failed to open /var/data");
/// ```
#[macro_export]
macro_rules! error {
    ($forwarder:expr, $($arg:tt)+) => {
        $crate::log!($forwarder, $crate::LogLevel::Error, $($arg)+)
    };
}

/// Forward a fatal-level record.
#[macro_export]
macro_rules! fatal {
    ($forwarder:expr, $($arg:tt)+) => {
        $crate::log!($forwarder, $crate::LogLevel::Fatal, $($arg)+)
    };
}

#[cfg(test)]
mod tests {
    use crate::appenders::MemoryBus;
    use crate::core::{LogForwarder, DEFAULT_FLUSH_TIMEOUT};
    use std::sync::Arc;

    #[test]
    fn test_macros_capture_call_site() {
        let bus = Arc::new(MemoryBus::new());
        let forwarder = LogForwarder::new(bus.clone()).unwrap();

        let line = line!() + 1;
        crate::warn!(forwarder, "value is {}", 42);
        assert!(forwarder.flush(DEFAULT_FLUSH_TIMEOUT));

        let record = bus.retained("/rosout").unwrap();
        assert_eq!(record.message, "value is 42");
        assert_eq!(record.line, line);
        assert!(record.file.ends_with("macros.rs"));
        assert_eq!(record.function, module_path!());
    }

    #[test]
    fn test_severity_macros_update_last_error() {
        let forwarder = LogForwarder::new(Arc::new(MemoryBus::new())).unwrap();
        crate::debug!(forwarder, "d");
        crate::info!(forwarder, "i");
        crate::error!(forwarder, "e{}", 1);
        crate::fatal!(forwarder, "f{}", 2);
        assert_eq!(forwarder.last_error(), "f2");
    }
}
