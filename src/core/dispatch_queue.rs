//! Asynchronous dispatch queue
//!
//! Producers append records under a mutex and signal a condition variable.
//! One dedicated worker thread waits on that condition variable, swaps the
//! whole pending buffer out in a single move, releases the lock and then
//! publishes the batch in arrival order. Publishing never happens under the
//! lock, so a slow transport cannot stall producers.
//!
//! Lifecycle: `Constructed -> Running -> ShuttingDown -> Stopped`, forward
//! only. A stopped queue cannot be started again.

use super::{
    config::ForwarderConfig,
    error::{ForwarderError, Result},
    log_record::LogRecord,
    metrics::ForwarderMetrics,
    shutdown_policy::{ShutdownPolicy, WorkerState},
    transport::Transport,
};
use parking_lot::{Condvar, Mutex};
use rand::Rng;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Alert on the first publish failure and every N-th after that
const FAILURE_ALERT_INTERVAL: u64 = 1000;

/// Cap on the exponential backoff multiplier
const MAX_BACKOFF_SHIFT: u32 = 6;

/// Worker-side settings
#[derive(Debug, Clone)]
pub struct DispatchSettings {
    /// Resolved channel every record is published on
    pub channel: String,
    pub shutdown_policy: ShutdownPolicy,
    pub publish_retries: u32,
    pub retry_backoff: Duration,
    pub thread_name: String,
}

impl DispatchSettings {
    pub fn new(channel: impl Into<String>) -> Self {
        Self::from_config(channel, &ForwarderConfig::default())
    }

    pub fn from_config(channel: impl Into<String>, config: &ForwarderConfig) -> Self {
        Self {
            channel: channel.into(),
            shutdown_policy: config.shutdown_policy,
            publish_retries: config.publish_retries,
            retry_backoff: config.retry_backoff(),
            thread_name: config.worker_thread_name.clone(),
        }
    }

    #[must_use]
    pub fn with_shutdown_policy(mut self, policy: ShutdownPolicy) -> Self {
        self.shutdown_policy = policy;
        self
    }

    #[must_use]
    pub fn with_retries(mut self, retries: u32, backoff: Duration) -> Self {
        self.publish_retries = retries;
        self.retry_backoff = backoff;
        self
    }
}

struct QueueState {
    pending: Vec<LogRecord>,
    /// Size of the batch the worker is publishing right now
    in_flight: usize,
    state: WorkerState,
}

impl QueueState {
    fn is_idle(&self) -> bool {
        self.pending.is_empty() && self.in_flight == 0
    }
}

struct Shared {
    queue: Mutex<QueueState>,
    /// Signalled on enqueue and on shutdown
    wake: Condvar,
    /// Signalled when the worker finishes a batch
    idle: Condvar,
}

/// Publishing half, moved into the worker thread
struct Publisher {
    transport: Arc<dyn Transport>,
    settings: DispatchSettings,
    metrics: Arc<ForwarderMetrics>,
}

impl Publisher {
    /// Publish a batch in order; ownership of the records ends here
    fn publish_batch(&self, batch: Vec<LogRecord>) {
        if batch.is_empty() {
            return;
        }
        for record in &batch {
            self.publish_one(record);
        }
        self.metrics.record_batch();
    }

    fn publish_one(&self, record: &LogRecord) {
        let attempts = self.settings.publish_retries.saturating_add(1);
        let mut last_failure = String::new();

        for attempt in 0..attempts {
            if attempt > 0 {
                self.metrics.record_publish_retry();
                thread::sleep(backoff_delay(self.settings.retry_backoff, attempt));
            }

            // A panicking transport must not take the worker down with it
            let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                self.transport.publish(&self.settings.channel, record)
            }));

            match outcome {
                Ok(Ok(())) => {
                    self.metrics.record_published();
                    return;
                }
                Ok(Err(e)) => last_failure = e.to_string(),
                Err(panic_info) => last_failure = panic_message(&*panic_info),
            }
        }

        let previous = self.metrics.record_publish_failure();
        if previous == 0 || (previous + 1) % FAILURE_ALERT_INTERVAL == 0 {
            eprintln!(
                "[FORWARDER WARNING] Publish on '{}' via {} failed after {} attempt(s), \
                 {} failure(s) so far: {}",
                self.settings.channel,
                self.transport.name(),
                attempts,
                previous + 1,
                last_failure
            );
        }
    }

    /// Apply the shutdown policy to whatever was still pending
    fn finish(&self, remaining: Vec<LogRecord>) {
        match self.settings.shutdown_policy {
            ShutdownPolicy::DrainToEmpty => self.publish_batch(remaining),
            ShutdownPolicy::StopImmediately => {
                if !remaining.is_empty() {
                    self.metrics.record_dropped_many(remaining.len() as u64);
                }
            }
        }
    }
}

struct Worker {
    shared: Arc<Shared>,
    publisher: Publisher,
}

impl Worker {
    fn run(self) {
        loop {
            let (batch, shutting_down) = self.next_batch();
            if shutting_down {
                self.publisher.finish(batch);
                self.batch_done();
                return;
            }
            self.publisher.publish_batch(batch);
            self.batch_done();
        }
    }

    /// Block until there is work or shutdown begins, then take everything
    fn next_batch(&self) -> (Vec<LogRecord>, bool) {
        let mut queue = self.shared.queue.lock();
        // Only wait on an empty queue: records that arrived while the previous
        // batch was publishing are picked up without another notify.
        while queue.state == WorkerState::Running && queue.pending.is_empty() {
            self.shared.wake.wait(&mut queue);
        }
        let batch = std::mem::take(&mut queue.pending);
        queue.in_flight = batch.len();
        (batch, queue.state != WorkerState::Running)
    }

    fn batch_done(&self) {
        let mut queue = self.shared.queue.lock();
        queue.in_flight = 0;
        if queue.pending.is_empty() {
            self.shared.idle.notify_all();
        }
    }
}

/// Mutex + condition variable hand-off queue with one dedicated worker
///
/// # Example
///
/// ```
/// use log_forwarder::appenders::MemoryBus;
/// use log_forwarder::core::{
///     ChannelOptions, DispatchQueue, DispatchSettings, ForwarderMetrics, LogLevel, LogRecord,
///     Transport,
/// };
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// let bus = Arc::new(MemoryBus::new());
/// bus.register_channel("/rosout", ChannelOptions::latched()).unwrap();
///
/// let queue = DispatchQueue::new(
///     bus.clone(),
///     DispatchSettings::new("/rosout"),
///     Arc::new(ForwarderMetrics::new()),
/// );
/// queue.start().unwrap();
/// queue.enqueue(LogRecord::new(LogLevel::Info, "hello")).unwrap();
/// assert!(queue.wait_idle(Duration::from_secs(5)));
/// queue.stop();
///
/// assert_eq!(bus.published_count("/rosout"), 1);
/// ```
pub struct DispatchQueue {
    shared: Arc<Shared>,
    publisher: Publisher,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl DispatchQueue {
    pub fn new(
        transport: Arc<dyn Transport>,
        settings: DispatchSettings,
        metrics: Arc<ForwarderMetrics>,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                queue: Mutex::new(QueueState {
                    pending: Vec::new(),
                    in_flight: 0,
                    state: WorkerState::Constructed,
                }),
                wake: Condvar::new(),
                idle: Condvar::new(),
            }),
            publisher: Publisher {
                transport,
                settings,
                metrics,
            },
            handle: Mutex::new(None),
        }
    }

    /// Append a record and wake the worker
    ///
    /// Never waits on the worker or the transport. Records enqueued before
    /// [`start`](Self::start) are buffered. Fails once shutdown has begun.
    pub fn enqueue(&self, record: LogRecord) -> Result<()> {
        {
            let mut queue = self.shared.queue.lock();
            if !queue.state.accepts_records() {
                drop(queue);
                self.publisher.metrics.record_dropped();
                return Err(ForwarderError::ShuttingDown);
            }
            queue.pending.push(record);
            self.shared.wake.notify_one();
        }
        self.publisher.metrics.record_enqueued();
        Ok(())
    }

    /// Spawn the worker thread; only valid once per instance
    pub fn start(&self) -> Result<()> {
        let mut queue = self.shared.queue.lock();
        if queue.state != WorkerState::Constructed {
            return Err(ForwarderError::AlreadyStarted);
        }

        let worker = Worker {
            shared: Arc::clone(&self.shared),
            publisher: Publisher {
                transport: Arc::clone(&self.publisher.transport),
                settings: self.publisher.settings.clone(),
                metrics: Arc::clone(&self.publisher.metrics),
            },
        };

        // The worker's first lock attempt waits until we release `queue`,
        // by which time the state already reads Running.
        let handle = thread::Builder::new()
            .name(self.publisher.settings.thread_name.clone())
            .spawn(move || worker.run())
            .map_err(ForwarderError::WorkerSpawn)?;

        queue.state = WorkerState::Running;
        *self.handle.lock() = Some(handle);
        Ok(())
    }

    /// Begin shutdown and block until the worker has exited
    ///
    /// Only the first caller joins; later calls return immediately. Waits
    /// without a timeout, so a publish stuck in the transport delays this
    /// call by exactly as long.
    pub fn stop(&self) {
        let never_started = {
            let mut queue = self.shared.queue.lock();
            match queue.state {
                WorkerState::Constructed => {
                    queue.state = WorkerState::Stopped;
                    Some(std::mem::take(&mut queue.pending))
                }
                WorkerState::Running => {
                    queue.state = WorkerState::ShuttingDown;
                    self.shared.wake.notify_all();
                    None
                }
                WorkerState::ShuttingDown | WorkerState::Stopped => return,
            }
        };

        if let Some(buffered) = never_started {
            // No worker ever existed; the policy runs on the caller's thread
            self.publisher.finish(buffered);
            self.shared.idle.notify_all();
            return;
        }

        if let Some(handle) = self.handle.lock().take() {
            if handle.thread().id() == thread::current().id() {
                eprintln!(
                    "[FORWARDER WARNING] stop() called from the dispatch worker itself; \
                     the worker exits after the current batch"
                );
            } else if let Err(e) = handle.join() {
                eprintln!(
                    "[FORWARDER ERROR] Dispatch worker panicked during shutdown: {:?}",
                    e
                );
            }
        }

        let mut queue = self.shared.queue.lock();
        queue.state = WorkerState::Stopped;
        self.shared.idle.notify_all();
    }

    /// Wait until nothing is pending or in flight
    ///
    /// Returns `false` if `timeout` expires first.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut queue = self.shared.queue.lock();
        while !queue.is_idle() {
            if self.shared.idle.wait_until(&mut queue, deadline).timed_out() {
                return queue.is_idle();
            }
        }
        true
    }

    pub fn state(&self) -> WorkerState {
        self.shared.queue.lock().state
    }

    /// Records waiting for the next drain cycle
    pub fn pending_len(&self) -> usize {
        self.shared.queue.lock().pending.len()
    }

    pub fn channel(&self) -> &str {
        &self.publisher.settings.channel
    }

    pub fn shutdown_policy(&self) -> ShutdownPolicy {
        self.publisher.settings.shutdown_policy
    }

    pub fn metrics(&self) -> &ForwarderMetrics {
        &self.publisher.metrics
    }
}

impl Drop for DispatchQueue {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for DispatchQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchQueue")
            .field("channel", &self.publisher.settings.channel)
            .field("state", &self.state())
            .field("pending", &self.pending_len())
            .finish()
    }
}

/// Exponential backoff with up to 50% random jitter
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let shift = attempt.saturating_sub(1).min(MAX_BACKOFF_SHIFT);
    let delay = base.saturating_mul(1u32 << shift);
    let max_jitter = delay.as_millis() as u64 / 2;
    if max_jitter == 0 {
        return delay;
    }
    delay + Duration::from_millis(rand::thread_rng().gen_range(0..=max_jitter))
}

fn panic_message(panic_info: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic_info.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic_info.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}
