//! Transport and host sink implementations

pub mod memory;
pub mod network;

#[cfg(feature = "console")]
pub mod console;

#[cfg(feature = "journal")]
pub mod journal;

pub use memory::MemoryBus;
pub use network::TcpTransport;

#[cfg(feature = "console")]
pub use console::ConsoleSink;

#[cfg(feature = "journal")]
pub use journal::JournalSink;

// Re-export traits for convenience
pub use crate::core::{HostLogSink, Transport};
