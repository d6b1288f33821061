//! Forwarder metrics for observability
//!
//! Counters for the intake side (enqueued, dropped), the worker side
//! (published, failures, retries, batches) and the host journal sink.

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics for forwarder observability
///
/// # Example
///
/// ```
/// use log_forwarder::ForwarderMetrics;
///
/// let metrics = ForwarderMetrics::new();
///
/// metrics.record_enqueued();
/// metrics.record_published();
///
/// assert_eq!(metrics.enqueued(), 1);
/// assert_eq!(metrics.published(), 1);
/// ```
#[derive(Debug)]
pub struct ForwarderMetrics {
    /// Records accepted by the dispatch queue
    enqueued: AtomicU64,

    /// Records handed to the transport successfully
    published: AtomicU64,

    /// Records the transport refused after all attempts
    publish_failures: AtomicU64,

    /// Extra publish attempts made after a failure
    publish_retries: AtomicU64,

    /// Records rejected after shutdown or discarded at stop
    dropped: AtomicU64,

    /// Failed host journal emits
    sink_failures: AtomicU64,

    /// Drain cycles that published at least one record
    batches: AtomicU64,
}

impl ForwarderMetrics {
    /// Create a new metrics instance with all counters at zero
    pub const fn new() -> Self {
        Self {
            enqueued: AtomicU64::new(0),
            published: AtomicU64::new(0),
            publish_failures: AtomicU64::new(0),
            publish_retries: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
            sink_failures: AtomicU64::new(0),
            batches: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn enqueued(&self) -> u64 {
        self.enqueued.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn publish_failures(&self) -> u64 {
        self.publish_failures.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn publish_retries(&self) -> u64 {
        self.publish_retries.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn sink_failures(&self) -> u64 {
        self.sink_failures.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn batches(&self) -> u64 {
        self.batches.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn record_enqueued(&self) -> u64 {
        self.enqueued.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_published(&self) -> u64 {
        self.published.fetch_add(1, Ordering::Relaxed)
    }

    /// Returns the previous failure count
    #[inline]
    pub fn record_publish_failure(&self) -> u64 {
        self.publish_failures.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_publish_retry(&self) -> u64 {
        self.publish_retries.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_dropped(&self) -> u64 {
        self.dropped.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_dropped_many(&self, count: u64) -> u64 {
        self.dropped.fetch_add(count, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_sink_failure(&self) -> u64 {
        self.sink_failures.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_batch(&self) -> u64 {
        self.batches.fetch_add(1, Ordering::Relaxed)
    }

    /// Failed publishes as a percentage (0.0 - 100.0) of all publish outcomes
    ///
    /// Returns 0.0 if nothing has been published yet.
    pub fn failure_rate(&self) -> f64 {
        let failed = self.publish_failures() as f64;
        let total = self.published() as f64 + failed;
        if total == 0.0 {
            0.0
        } else {
            (failed / total) * 100.0
        }
    }

    /// Reset all metrics to zero
    pub fn reset(&self) {
        self.enqueued.store(0, Ordering::Relaxed);
        self.published.store(0, Ordering::Relaxed);
        self.publish_failures.store(0, Ordering::Relaxed);
        self.publish_retries.store(0, Ordering::Relaxed);
        self.dropped.store(0, Ordering::Relaxed);
        self.sink_failures.store(0, Ordering::Relaxed);
        self.batches.store(0, Ordering::Relaxed);
    }
}

impl Default for ForwarderMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for ForwarderMetrics {
    /// Create a snapshot of the current metrics values
    fn clone(&self) -> Self {
        Self {
            enqueued: AtomicU64::new(self.enqueued()),
            published: AtomicU64::new(self.published()),
            publish_failures: AtomicU64::new(self.publish_failures()),
            publish_retries: AtomicU64::new(self.publish_retries()),
            dropped: AtomicU64::new(self.dropped()),
            sink_failures: AtomicU64::new(self.sink_failures()),
            batches: AtomicU64::new(self.batches()),
        }
    }
}
