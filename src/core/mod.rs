//! Core forwarder types and traits

pub mod config;
pub mod dispatch_queue;
pub mod error;
pub mod feature_flag;
pub mod forwarder;
pub mod host_sink;
pub mod identity;
pub mod last_error;
pub mod log_level;
pub mod log_record;
pub mod metrics;
pub mod severity;
pub mod shutdown_policy;
pub mod transport;

pub use config::ForwarderConfig;
pub use dispatch_queue::{DispatchQueue, DispatchSettings};
pub use error::{ForwarderError, Result};
pub use feature_flag::{ConfigStore, FeatureFlagCache, MemoryConfigStore, NullConfigStore};
pub use forwarder::{ForwarderBuilder, LogForwarder, DEFAULT_FLUSH_TIMEOUT};
pub use host_sink::HostLogSink;
pub use identity::{Clock, NodeIdentity, StaticIdentity, SystemClock};
pub use last_error::LastErrorTracker;
pub use log_level::LogLevel;
pub use log_record::LogRecord;
pub use metrics::ForwarderMetrics;
pub use severity::{map_level, map_raw_code, JournalPriority, SeverityCode};
pub use shutdown_policy::{ShutdownPolicy, WorkerState};
pub use transport::{ChannelOptions, NameResolver, NamespaceResolver, Transport};
