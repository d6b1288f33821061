//! In-process publish/subscribe bus
//!
//! Each registered channel fans records out to its subscribers over
//! unbounded crossbeam channels. Latched channels keep the last record and
//! hand it to subscribers that join later.

use crate::core::{ChannelOptions, ForwarderError, LogRecord, Result, Transport};
use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;
use std::collections::HashMap;

struct ChannelSlot {
    options: ChannelOptions,
    retained: Option<LogRecord>,
    subscribers: Vec<Sender<LogRecord>>,
    published: u64,
}

/// Latching in-memory transport
///
/// # Example
///
/// ```
/// use log_forwarder::appenders::MemoryBus;
/// use log_forwarder::core::{ChannelOptions, LogLevel, LogRecord, Transport};
///
/// let bus = MemoryBus::new();
/// bus.register_channel("/rosout", ChannelOptions::latched()).unwrap();
/// bus.publish("/rosout", &LogRecord::new(LogLevel::Warn, "first")).unwrap();
///
/// // Joins late, still sees the retained record
/// let late = bus.subscribe("/rosout").unwrap();
/// assert_eq!(late.try_recv().unwrap().message, "first");
/// ```
#[derive(Default)]
pub struct MemoryBus {
    channels: Mutex<HashMap<String, ChannelSlot>>,
}

impl MemoryBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to a registered channel
    pub fn subscribe(&self, channel: &str) -> Result<Receiver<LogRecord>> {
        let mut channels = self.channels.lock();
        let slot = channels.get_mut(channel).ok_or_else(|| {
            ForwarderError::other(format!("Cannot subscribe: channel '{}' is not registered", channel))
        })?;

        let (tx, rx) = unbounded();
        if let Some(ref retained) = slot.retained {
            // Receiver is alive, send cannot fail
            let _ = tx.send(retained.clone());
        }
        slot.subscribers.push(tx);
        Ok(rx)
    }

    pub fn is_registered(&self, channel: &str) -> bool {
        self.channels.lock().contains_key(channel)
    }

    pub fn channel_options(&self, channel: &str) -> Option<ChannelOptions> {
        self.channels.lock().get(channel).map(|slot| slot.options)
    }

    /// Last record on a latched channel
    pub fn retained(&self, channel: &str) -> Option<LogRecord> {
        self.channels
            .lock()
            .get(channel)
            .and_then(|slot| slot.retained.clone())
    }

    pub fn published_count(&self, channel: &str) -> u64 {
        self.channels
            .lock()
            .get(channel)
            .map_or(0, |slot| slot.published)
    }

    pub fn subscriber_count(&self, channel: &str) -> usize {
        self.channels
            .lock()
            .get(channel)
            .map_or(0, |slot| slot.subscribers.len())
    }
}

impl Transport for MemoryBus {
    fn register_channel(&self, channel: &str, options: ChannelOptions) -> Result<()> {
        let mut channels = self.channels.lock();
        match channels.get(channel) {
            Some(slot) if slot.options != options => Err(ForwarderError::registration(
                channel,
                "already registered with different options",
            )),
            Some(_) => Ok(()),
            None => {
                channels.insert(
                    channel.to_string(),
                    ChannelSlot {
                        options,
                        retained: None,
                        subscribers: Vec::new(),
                        published: 0,
                    },
                );
                Ok(())
            }
        }
    }

    fn publish(&self, channel: &str, record: &LogRecord) -> Result<()> {
        let mut channels = self.channels.lock();
        let slot = channels
            .get_mut(channel)
            .ok_or_else(|| ForwarderError::publish(channel, "channel is not registered"))?;

        if slot.options.latch {
            slot.retained = Some(record.clone());
        }
        // Disconnected subscribers are pruned as we go
        slot.subscribers.retain(|tx| tx.send(record.clone()).is_ok());
        slot.published += 1;
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::LogLevel;

    fn record(message: &str) -> LogRecord {
        LogRecord::new(LogLevel::Info, message)
    }

    #[test]
    fn test_publish_requires_registration() {
        let bus = MemoryBus::new();
        let err = bus.publish("/rosout", &record("x")).unwrap_err();
        assert!(matches!(err, ForwarderError::Publish { .. }));
        assert!(bus.subscribe("/rosout").is_err());
    }

    #[test]
    fn test_conflicting_registration_rejected() {
        let bus = MemoryBus::new();
        bus.register_channel("/rosout", ChannelOptions { latch: true }).unwrap();
        bus.register_channel("/rosout", ChannelOptions { latch: true }).unwrap();
        assert!(bus
            .register_channel("/rosout", ChannelOptions { latch: false })
            .is_err());
    }

    #[test]
    fn test_fan_out_in_order() {
        let bus = MemoryBus::new();
        bus.register_channel("/rosout", ChannelOptions::latched()).unwrap();
        let a = bus.subscribe("/rosout").unwrap();
        let b = bus.subscribe("/rosout").unwrap();

        bus.publish("/rosout", &record("one")).unwrap();
        bus.publish("/rosout", &record("two")).unwrap();

        for rx in [a, b] {
            assert_eq!(rx.try_recv().unwrap().message, "one");
            assert_eq!(rx.try_recv().unwrap().message, "two");
        }
        assert_eq!(bus.published_count("/rosout"), 2);
    }

    #[test]
    fn test_unlatched_channel_retains_nothing() {
        let bus = MemoryBus::new();
        bus.register_channel("/plain", ChannelOptions { latch: false }).unwrap();
        bus.publish("/plain", &record("gone")).unwrap();

        assert!(bus.retained("/plain").is_none());
        assert!(bus.subscribe("/plain").unwrap().try_recv().is_err());
    }

    #[test]
    fn test_dropped_subscribers_pruned() {
        let bus = MemoryBus::new();
        bus.register_channel("/rosout", ChannelOptions::latched()).unwrap();
        let rx = bus.subscribe("/rosout").unwrap();
        assert_eq!(bus.subscriber_count("/rosout"), 1);

        drop(rx);
        bus.publish("/rosout", &record("x")).unwrap();
        assert_eq!(bus.subscriber_count("/rosout"), 0);
    }
}
