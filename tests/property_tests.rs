//! Property-based tests for log_forwarder using proptest

use log_forwarder::core::severity::{level_from_code, map_level, map_raw_code};
use log_forwarder::core::{DispatchQueue, DispatchSettings, LastErrorTracker};
use log_forwarder::prelude::*;
use proptest::prelude::*;
use std::sync::Arc;
use std::time::Duration;

fn any_level() -> impl Strategy<Value = LogLevel> {
    prop_oneof![
        Just(LogLevel::Debug),
        Just(LogLevel::Info),
        Just(LogLevel::Warn),
        Just(LogLevel::Error),
        Just(LogLevel::Fatal),
    ]
}

// ============================================================================
// LogLevel Tests
// ============================================================================

proptest! {
    /// Test that LogLevel string conversions roundtrip correctly
    #[test]
    fn test_log_level_str_roundtrip(level in any_level()) {
        let parsed: LogLevel = level.to_str().parse().unwrap();
        prop_assert_eq!(level, parsed);
    }

    /// Test that parsing ignores case
    #[test]
    fn test_log_level_parse_case_insensitive(level in any_level()) {
        let lower = level.to_str().to_lowercase();
        prop_assert_eq!(lower.parse::<LogLevel>().unwrap(), level);
    }

    /// Test that LogLevel Display matches to_str
    #[test]
    fn test_log_level_display(level in any_level()) {
        prop_assert_eq!(format!("{}", level), level.to_str());
    }
}

// ============================================================================
// Severity Mapping Tests
// ============================================================================

proptest! {
    /// Test that mapping is a pure function of the level
    #[test]
    fn test_map_level_deterministic(level in any_level()) {
        prop_assert_eq!(map_level(level), map_level(level));
    }

    /// Test that a higher level never maps to a less urgent priority
    #[test]
    fn test_map_level_monotonic(a in any_level(), b in any_level()) {
        let (code_a, prio_a) = map_level(a);
        let (code_b, prio_b) = map_level(b);
        if a < b {
            prop_assert!(code_a.value() < code_b.value());
            prop_assert!(prio_b.is_more_urgent_than(prio_a));
        }
    }

    /// Test that the sink code decodes back to the same level
    #[test]
    fn test_code_roundtrip(level in any_level()) {
        prop_assert_eq!(level_from_code(level.severity_code().value()), level);
    }

    /// Test that codes outside the known set map like Info
    #[test]
    fn test_unknown_codes_map_to_info(code in any::<u8>()) {
        prop_assume!(![1u8, 2, 4, 8, 16].contains(&code));
        prop_assert_eq!(map_raw_code(code), map_level(LogLevel::Info));
    }
}

// ============================================================================
// Last Error Tests
// ============================================================================

proptest! {
    /// Test that the slot always holds the newest severe message
    #[test]
    fn test_last_error_tracks_newest_severe(
        entries in prop::collection::vec((any_level(), "[a-z]{1,8}"), 0..40)
    ) {
        let tracker = LastErrorTracker::new();
        let mut expected = String::new();

        for (level, message) in &entries {
            tracker.record_if_severe(&LogRecord::new(*level, message.clone()));
            if level.is_severe() {
                expected = message.clone();
            }
        }

        prop_assert_eq!(tracker.last_error(), expected);
    }
}

// ============================================================================
// Dispatch Ordering Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Test that any sequence from a single producer is published in order
    #[test]
    fn test_single_producer_fifo(
        entries in prop::collection::vec((any_level(), "[a-zA-Z0-9 ]{0,16}"), 1..100)
    ) {
        let bus = Arc::new(MemoryBus::new());
        bus.register_channel("/rosout", ChannelOptions::latched()).unwrap();
        let subscriber = bus.subscribe("/rosout").unwrap();

        let queue = DispatchQueue::new(
            bus.clone(),
            DispatchSettings::new("/rosout"),
            Arc::new(ForwarderMetrics::new()),
        );
        queue.start().unwrap();
        for (level, message) in &entries {
            queue.enqueue(LogRecord::new(*level, message.clone())).unwrap();
        }
        prop_assert!(queue.wait_idle(Duration::from_secs(10)));
        queue.stop();

        let published: Vec<(LogLevel, String)> = subscriber
            .try_iter()
            .map(|record| (record.level, record.message))
            .collect();
        prop_assert_eq!(published, entries);
    }

    /// Test that records buffered before start keep their order
    #[test]
    fn test_buffered_before_start_fifo(messages in prop::collection::vec("[a-z]{1,6}", 1..50)) {
        let bus = Arc::new(MemoryBus::new());
        bus.register_channel("/rosout", ChannelOptions::latched()).unwrap();
        let subscriber = bus.subscribe("/rosout").unwrap();

        let queue = DispatchQueue::new(
            bus.clone(),
            DispatchSettings::new("/rosout"),
            Arc::new(ForwarderMetrics::new()),
        );
        for message in &messages {
            queue.enqueue(LogRecord::new(LogLevel::Info, message.clone())).unwrap();
        }
        prop_assert_eq!(queue.pending_len(), messages.len());
        queue.start().unwrap();
        queue.stop();

        let published: Vec<String> = subscriber.try_iter().map(|r| r.message).collect();
        prop_assert_eq!(published, messages);
    }
}
