//! # Log Forwarder
//!
//! A decoupled log-forwarding appender. Producers on any thread hand records
//! to [`LogForwarder::log`]; each record is written inline to an optional
//! host journal and queued for a single background thread that republishes
//! it on a latched publish/subscribe channel.
//!
//! ## Features
//!
//! - **Non-blocking producers**: publishing happens off the caller's thread
//! - **Swap-based hand-off**: the worker takes the whole pending batch at once
//! - **Orderly shutdown**: configurable drain policy, worker always joined
//! - **Last-error tracking**: most recent Error/Fatal text for diagnostics

pub mod appenders;
pub mod core;
pub mod macros;

pub mod prelude {
    pub use crate::appenders::{MemoryBus, TcpTransport};
    #[cfg(feature = "console")]
    pub use crate::appenders::ConsoleSink;
    #[cfg(feature = "journal")]
    pub use crate::appenders::JournalSink;
    pub use crate::core::{
        ChannelOptions, Clock, ConfigStore, ForwarderBuilder, ForwarderConfig, ForwarderError,
        ForwarderMetrics, HostLogSink, JournalPriority, LogForwarder, LogLevel, LogRecord,
        MemoryConfigStore, NameResolver, NamespaceResolver, NodeIdentity, Result, SeverityCode,
        ShutdownPolicy, StaticIdentity, SystemClock, Transport, WorkerState,
        DEFAULT_FLUSH_TIMEOUT,
    };
}

pub use crate::appenders::{MemoryBus, TcpTransport};
pub use crate::core::{
    ChannelOptions, Clock, ConfigStore, ForwarderBuilder, ForwarderConfig, ForwarderError,
    ForwarderMetrics, HostLogSink, JournalPriority, LogForwarder, LogLevel, LogRecord,
    MemoryConfigStore, NameResolver, NamespaceResolver, NodeIdentity, Result, SeverityCode,
    ShutdownPolicy, StaticIdentity, SystemClock, Transport, WorkerState, DEFAULT_FLUSH_TIMEOUT,
};
