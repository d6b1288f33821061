//! Shutdown policies for the dispatch worker
//!
//! When shutdown begins, records may still sit in the pending queue.
//! The policy decides whether the worker publishes them before exiting.

use serde::{Deserialize, Serialize};
use std::fmt;

/// What the worker does with pending records once shutdown begins
///
/// # Example
///
/// ```
/// use log_forwarder::ShutdownPolicy;
///
/// // Default behavior: publish everything accepted before shutdown
/// let policy = ShutdownPolicy::default();
/// assert_eq!(policy, ShutdownPolicy::DrainToEmpty);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShutdownPolicy {
    /// Publish every record enqueued before the shutdown transition
    ///
    /// Shutdown latency grows with the backlog and the transport speed.
    #[default]
    DrainToEmpty,

    /// Exit as soon as the current batch is done
    ///
    /// Pending records are discarded and counted as dropped.
    StopImmediately,
}

impl fmt::Display for ShutdownPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownPolicy::DrainToEmpty => write!(f, "DrainToEmpty"),
            ShutdownPolicy::StopImmediately => write!(f, "StopImmediately"),
        }
    }
}

/// Lifecycle of a dispatch queue and the forwarder that owns it
///
/// Transitions only move forward; a stopped queue is never restarted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WorkerState {
    /// Built, worker not yet spawned; records are buffered
    Constructed,
    Running,
    ShuttingDown,
    Stopped,
}

impl WorkerState {
    /// Whether new records are still accepted
    #[inline]
    pub fn accepts_records(self) -> bool {
        matches!(self, WorkerState::Constructed | WorkerState::Running)
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerState::Constructed => write!(f, "Constructed"),
            WorkerState::Running => write!(f, "Running"),
            WorkerState::ShuttingDown => write!(f, "ShuttingDown"),
            WorkerState::Stopped => write!(f, "Stopped"),
        }
    }
}
