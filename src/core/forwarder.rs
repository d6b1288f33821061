//! Log forwarder facade
//!
//! Accepts one record per call, stamps it, updates the last-error slot,
//! optionally emits it to the host journal, and hands it to the dispatch
//! queue for asynchronous publishing.

use super::{
    config::ForwarderConfig,
    dispatch_queue::{DispatchQueue, DispatchSettings},
    error::Result,
    feature_flag::{ConfigStore, FeatureFlagCache, NullConfigStore},
    host_sink::HostLogSink,
    identity::{Clock, NodeIdentity, StaticIdentity, SystemClock},
    last_error::LastErrorTracker,
    log_level::LogLevel,
    log_record::LogRecord,
    metrics::ForwarderMetrics,
    severity::JournalPriority,
    shutdown_policy::{ShutdownPolicy, WorkerState},
    transport::{ChannelOptions, NameResolver, NamespaceResolver, Transport},
};
use std::panic::Location;
use std::sync::Arc;
use std::time::Duration;

/// Default time `flush` callers typically allow for the queue to drain
pub const DEFAULT_FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

pub struct LogForwarder {
    queue: DispatchQueue,
    journal: Option<Arc<dyn HostLogSink>>,
    suppress_topics: FeatureFlagCache,
    last_error: LastErrorTracker,
    identity: Arc<dyn NodeIdentity>,
    clock: Arc<dyn Clock>,
    metrics: Arc<ForwarderMetrics>,
}

impl LogForwarder {
    /// Forwarder with default configuration and no host journal
    pub fn new(transport: Arc<dyn Transport>) -> Result<Self> {
        Self::builder(transport).build()
    }

    /// Create a builder for LogForwarder
    ///
    /// # Example
    /// ```
    /// use log_forwarder::prelude::*;
    /// use std::sync::Arc;
    ///
    /// let bus = Arc::new(MemoryBus::new());
    /// let forwarder = LogForwarder::builder(bus.clone())
    ///     .identity(Arc::new(StaticIdentity::new("/talker")))
    ///     .shutdown_policy(ShutdownPolicy::DrainToEmpty)
    ///     .build()
    ///     .unwrap();
    ///
    /// forwarder.log(LogLevel::Error, "disk full", "x.cc", "write", 42);
    /// assert_eq!(forwarder.last_error(), "disk full");
    /// ```
    #[must_use]
    pub fn builder(transport: Arc<dyn Transport>) -> ForwarderBuilder {
        ForwarderBuilder::new(transport)
    }

    /// Forward one record
    ///
    /// Never fails and never waits on the transport. Calls made after
    /// shutdown has begun are dropped and counted.
    pub fn log(
        &self,
        level: LogLevel,
        message: impl Into<String>,
        file: &str,
        function: &str,
        line: u32,
    ) {
        if !self.queue.state().accepts_records() {
            self.metrics.record_dropped();
            return;
        }

        let priority = level.journal_priority();
        let mut record = LogRecord::new(level, message)
            .with_timestamp(self.clock.now())
            .with_name(self.identity.name())
            .with_location(file, function, line);

        let journal = if self.suppress_topics.is_suppressed() {
            None
        } else {
            record.topics = self.identity.advertised_topics();
            self.journal.as_ref().map(|journal| (journal, record.clone()))
        };
        let severe = level.is_severe().then(|| record.message.clone());

        // Shutdown may have begun since the check above; a rejected record
        // is counted by the queue and leaves no other trace
        if self.queue.enqueue(record).is_err() {
            return;
        }

        if let Some(message) = severe {
            self.last_error.set(message);
        }
        if let Some((journal, record)) = journal {
            self.emit_to_journal(journal.as_ref(), &record, priority);
        }
    }

    /// Journal failures and panics are swallowed; only the counter moves
    fn emit_to_journal(&self, journal: &dyn HostLogSink, record: &LogRecord, priority: JournalPriority) {
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            journal.emit(record, priority)
        }));
        if !matches!(outcome, Ok(Ok(()))) {
            self.metrics.record_sink_failure();
        }
    }

    #[track_caller]
    fn log_here(&self, level: LogLevel, message: impl Into<String>) {
        let caller = Location::caller();
        self.log(level, message, caller.file(), "", caller.line());
    }

    #[inline]
    #[track_caller]
    pub fn debug(&self, message: impl Into<String>) {
        self.log_here(LogLevel::Debug, message);
    }

    #[inline]
    #[track_caller]
    pub fn info(&self, message: impl Into<String>) {
        self.log_here(LogLevel::Info, message);
    }

    #[inline]
    #[track_caller]
    pub fn warn(&self, message: impl Into<String>) {
        self.log_here(LogLevel::Warn, message);
    }

    #[inline]
    #[track_caller]
    pub fn error(&self, message: impl Into<String>) {
        self.log_here(LogLevel::Error, message);
    }

    #[inline]
    #[track_caller]
    pub fn fatal(&self, message: impl Into<String>) {
        self.log_here(LogLevel::Fatal, message);
    }

    /// Text of the most recent Error/Fatal record, empty if none yet
    pub fn last_error(&self) -> String {
        self.last_error.last_error()
    }

    /// Resolved channel records are published on
    pub fn channel(&self) -> &str {
        self.queue.channel()
    }

    pub fn state(&self) -> WorkerState {
        self.queue.state()
    }

    /// Get the forwarder metrics for detailed observability
    ///
    /// # Example
    ///
    /// ```
    /// use log_forwarder::prelude::*;
    /// use std::sync::Arc;
    ///
    /// let forwarder = LogForwarder::new(Arc::new(MemoryBus::new())).unwrap();
    /// forwarder.info("ready");
    /// forwarder.flush(DEFAULT_FLUSH_TIMEOUT);
    ///
    /// let metrics = forwarder.metrics();
    /// println!("Published: {}", metrics.published());
    /// println!("Failure rate: {:.2}%", metrics.failure_rate());
    /// ```
    pub fn metrics(&self) -> &ForwarderMetrics {
        &self.metrics
    }

    /// Wait until every accepted record has been handed to the transport
    ///
    /// Returns `false` if `timeout` expires first.
    pub fn flush(&self, timeout: Duration) -> bool {
        self.queue.wait_idle(timeout)
    }

    /// Stop accepting records and join the worker
    ///
    /// Safe to call more than once; also runs on drop.
    pub fn shutdown(&self) {
        self.queue.stop();
    }
}

impl Drop for LogForwarder {
    fn drop(&mut self) {
        self.shutdown();

        let failures = self.metrics.publish_failures();
        if failures > 0 {
            eprintln!(
                "[FORWARDER WARNING] Forwarder on '{}' shutting down with {} failed publishes \
                 (failure rate: {:.2}%)",
                self.queue.channel(),
                failures,
                self.metrics.failure_rate()
            );
        }
    }
}

impl std::fmt::Debug for LogForwarder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogForwarder")
            .field("queue", &self.queue)
            .field("journal", &self.journal.as_ref().map(|j| j.name().to_string()))
            .field("suppress_topics", &self.suppress_topics)
            .finish()
    }
}

/// Builder for constructing LogForwarder with a fluent API
///
/// Unset collaborators default to: [`NamespaceResolver`] at `/`,
/// [`NullConfigStore`], no host journal, [`StaticIdentity::default`] and
/// [`SystemClock`].
pub struct ForwarderBuilder {
    transport: Arc<dyn Transport>,
    config: ForwarderConfig,
    resolver: Option<Arc<dyn NameResolver>>,
    config_store: Option<Arc<dyn ConfigStore>>,
    journal: Option<Arc<dyn HostLogSink>>,
    identity: Option<Arc<dyn NodeIdentity>>,
    clock: Option<Arc<dyn Clock>>,
}

impl ForwarderBuilder {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            config: ForwarderConfig::default(),
            resolver: None,
            config_store: None,
            journal: None,
            identity: None,
            clock: None,
        }
    }

    /// Replace the whole configuration
    #[must_use = "builder methods return a new value"]
    pub fn config(mut self, config: ForwarderConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn channel(mut self, channel: impl Into<String>) -> Self {
        self.config.channel = channel.into();
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn shutdown_policy(mut self, policy: ShutdownPolicy) -> Self {
        self.config.shutdown_policy = policy;
        self
    }

    /// Retry each failed publish up to `retries` more times
    #[must_use = "builder methods return a new value"]
    pub fn publish_retries(mut self, retries: u32, backoff: Duration) -> Self {
        self.config.publish_retries = retries;
        self.config.retry_backoff_ms = backoff.as_millis() as u64;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn resolver(mut self, resolver: Arc<dyn NameResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn config_store(mut self, store: Arc<dyn ConfigStore>) -> Self {
        self.config_store = Some(store);
        self
    }

    /// Host journal sink, consulted inline unless topics are suppressed
    #[must_use = "builder methods return a new value"]
    pub fn host_sink(mut self, sink: Arc<dyn HostLogSink>) -> Self {
        self.journal = Some(sink);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn identity(mut self, identity: Arc<dyn NodeIdentity>) -> Self {
        self.identity = Some(identity);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Resolve and register the channel, then start the worker
    ///
    /// The worker is spawned last, so every earlier failure returns before
    /// any thread exists.
    pub fn build(self) -> Result<LogForwarder> {
        self.config.validate()?;

        let resolver = self
            .resolver
            .unwrap_or_else(|| Arc::new(NamespaceResolver::default()));
        let channel = resolver.resolve(&self.config.channel)?;
        self.transport
            .register_channel(&channel, ChannelOptions::latched())?;

        let metrics = Arc::new(ForwarderMetrics::new());
        let queue = DispatchQueue::new(
            self.transport,
            DispatchSettings::from_config(channel, &self.config),
            Arc::clone(&metrics),
        );
        queue.start()?;

        let journal = if self.config.journal_enabled {
            self.journal
        } else {
            None
        };

        Ok(LogForwarder {
            queue,
            journal,
            suppress_topics: FeatureFlagCache::new(
                self.config_store
                    .unwrap_or_else(|| Arc::new(NullConfigStore)),
                self.config.suppress_topics_key.clone(),
            ),
            last_error: LastErrorTracker::new(),
            identity: self
                .identity
                .unwrap_or_else(|| Arc::new(StaticIdentity::default())),
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            metrics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::appenders::MemoryBus;
    use crate::core::{ForwarderError, MemoryConfigStore};
    use chrono::{DateTime, TimeZone, Utc};
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        emitted: Mutex<Vec<(String, JournalPriority)>>,
    }

    impl HostLogSink for RecordingSink {
        fn emit(&self, record: &LogRecord, priority: JournalPriority) -> Result<()> {
            self.emitted.lock().push((record.message.clone(), priority));
            Ok(())
        }

        fn name(&self) -> &str {
            "recording"
        }
    }

    struct FixedClock(DateTime<Utc>);

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_channel_registered_latched_at_construction() {
        let bus = Arc::new(MemoryBus::new());
        let forwarder = LogForwarder::new(bus.clone()).unwrap();

        assert_eq!(forwarder.channel(), "/rosout");
        assert_eq!(bus.channel_options("/rosout"), Some(ChannelOptions::latched()));
        assert_eq!(forwarder.state(), WorkerState::Running);
    }

    #[test]
    fn test_relative_channel_resolved_against_namespace() {
        let bus = Arc::new(MemoryBus::new());
        let forwarder = LogForwarder::builder(bus.clone())
            .channel("rosout")
            .resolver(Arc::new(NamespaceResolver::new("/robot1")))
            .build()
            .unwrap();
        assert_eq!(forwarder.channel(), "/robot1/rosout");
        assert!(bus.is_registered("/robot1/rosout"));
    }

    #[test]
    fn test_invalid_channel_fails_before_spawning() {
        let bus = Arc::new(MemoryBus::new());
        let err = LogForwarder::builder(bus.clone())
            .channel("bad channel")
            .build()
            .unwrap_err();
        assert!(matches!(err, ForwarderError::NameResolution { .. }));
        assert!(!bus.is_registered("bad channel"));
    }

    #[test]
    fn test_record_fields_populated() {
        let bus = Arc::new(MemoryBus::new());
        let identity = Arc::new(StaticIdentity::new("/writer").with_topics(["/rosout", "/disk"]));
        let forwarder = LogForwarder::builder(bus.clone())
            .identity(identity)
            .clock(Arc::new(FixedClock(fixed_time())))
            .build()
            .unwrap();
        let subscriber = bus.subscribe("/rosout").unwrap();

        forwarder.log(LogLevel::Warn, "low space", "disk.rs", "check", 7);
        assert!(forwarder.flush(DEFAULT_FLUSH_TIMEOUT));

        let record = subscriber.try_recv().unwrap();
        assert_eq!(record.timestamp, fixed_time());
        assert_eq!(record.name, "/writer");
        assert_eq!(record.level, LogLevel::Warn);
        assert_eq!(record.file, "disk.rs");
        assert_eq!(record.function, "check");
        assert_eq!(record.line, 7);
        assert_eq!(record.topics, vec!["/rosout", "/disk"]);
    }

    #[test]
    fn test_suppression_skips_journal_and_topics() {
        let bus = Arc::new(MemoryBus::new());
        let store = Arc::new(MemoryConfigStore::new());
        let sink = Arc::new(RecordingSink::default());
        let forwarder = LogForwarder::builder(bus.clone())
            .config_store(store.clone())
            .host_sink(sink.clone())
            .identity(Arc::new(StaticIdentity::new("/n").with_topics(["/t"])))
            .build()
            .unwrap();

        forwarder.info("visible");
        store.set("/rosout_disable_topics_generation", true);
        forwarder.info("suppressed");
        assert!(forwarder.flush(DEFAULT_FLUSH_TIMEOUT));

        let emitted = sink.emitted.lock().clone();
        assert_eq!(emitted, vec![("visible".to_string(), JournalPriority::Info)]);

        let retained = bus.retained("/rosout").unwrap();
        assert_eq!(retained.message, "suppressed");
        assert!(retained.topics.is_empty());
        assert_eq!(bus.published_count("/rosout"), 2);
    }

    #[test]
    fn test_journal_disabled_by_config() {
        let sink = Arc::new(RecordingSink::default());
        let config = ForwarderConfig {
            journal_enabled: false,
            ..ForwarderConfig::default()
        };
        let forwarder = LogForwarder::builder(Arc::new(MemoryBus::new()))
            .config(config)
            .host_sink(sink.clone())
            .build()
            .unwrap();

        forwarder.error("boom");
        assert!(sink.emitted.lock().is_empty());
        assert_eq!(forwarder.last_error(), "boom");
    }

    #[test]
    fn test_failing_journal_is_swallowed() {
        struct BrokenSink;

        impl HostLogSink for BrokenSink {
            fn emit(&self, _record: &LogRecord, _priority: JournalPriority) -> Result<()> {
                Err(ForwarderError::sink("broken", "no socket"))
            }

            fn name(&self) -> &str {
                "broken"
            }
        }

        let bus = Arc::new(MemoryBus::new());
        let forwarder = LogForwarder::builder(bus.clone())
            .host_sink(Arc::new(BrokenSink))
            .build()
            .unwrap();

        forwarder.warn("still forwarded");
        assert!(forwarder.flush(DEFAULT_FLUSH_TIMEOUT));
        assert_eq!(forwarder.metrics().sink_failures(), 1);
        assert_eq!(bus.published_count("/rosout"), 1);
    }

    #[test]
    fn test_log_after_shutdown_is_dropped() {
        let bus = Arc::new(MemoryBus::new());
        let forwarder = LogForwarder::new(bus.clone()).unwrap();
        forwarder.shutdown();
        assert_eq!(forwarder.state(), WorkerState::Stopped);

        forwarder.error("too late");
        assert_eq!(forwarder.metrics().dropped(), 1);
        assert_eq!(forwarder.last_error(), "");
        assert_eq!(bus.published_count("/rosout"), 0);
    }

    #[test]
    fn test_record_rejected_mid_call_leaves_no_trace() {
        use crate::core::ConfigStore;
        use crossbeam_channel::{bounded, Receiver, Sender};

        /// Parks the first lookup until released
        struct ParkingStore {
            entered: Sender<()>,
            release: Receiver<()>,
        }

        impl ConfigStore for ParkingStore {
            fn get_cached_bool(&self, _key: &str) -> Result<Option<bool>> {
                let _ = self.entered.try_send(());
                let _ = self.release.recv();
                Ok(None)
            }
        }

        let (entered_tx, entered_rx) = bounded(1);
        let (release_tx, release_rx) = bounded::<()>(0);
        let bus = Arc::new(MemoryBus::new());
        let sink = Arc::new(RecordingSink::default());
        let forwarder = LogForwarder::builder(bus.clone())
            .config_store(Arc::new(ParkingStore {
                entered: entered_tx,
                release: release_rx,
            }))
            .host_sink(sink.clone())
            .build()
            .unwrap();

        std::thread::scope(|scope| {
            let producer = scope.spawn(|| forwarder.error("ghost"));

            // The producer passed the state check and is inside the lookup
            entered_rx.recv().unwrap();
            forwarder.shutdown();
            drop(release_tx);

            producer.join().unwrap();
        });

        assert_eq!(forwarder.last_error(), "");
        assert!(sink.emitted.lock().is_empty());
        assert_eq!(forwarder.metrics().dropped(), 1);
        assert_eq!(forwarder.metrics().published(), 0);
        assert_eq!(bus.published_count("/rosout"), 0);
    }

    #[test]
    fn test_track_caller_location() {
        let bus = Arc::new(MemoryBus::new());
        let forwarder = LogForwarder::new(bus.clone()).unwrap();
        let line = line!() + 1;
        forwarder.info("here");
        assert!(forwarder.flush(DEFAULT_FLUSH_TIMEOUT));

        let record = bus.retained("/rosout").unwrap();
        assert!(record.file.ends_with("forwarder.rs"));
        assert_eq!(record.line, line);
    }
}
