//! Basic forwarder usage example
//!
//! Demonstrates forwarding records onto an in-process latched channel, with a
//! console sink standing in for the host journal.
//!
//! Run with: cargo run --example basic_forwarding

use log_forwarder::prelude::*;
use log_forwarder::{error, info};
use std::sync::Arc;
use std::time::Duration;

fn main() -> Result<()> {
    println!("=== Log Forwarder - Basic Forwarding Example ===\n");

    let bus = Arc::new(MemoryBus::new());

    // Build the forwarder; the channel is resolved and registered here
    let forwarder = LogForwarder::builder(bus.clone())
        .identity(Arc::new(
            StaticIdentity::new("/demo_node").with_topics(["/chatter", "/rosout"]),
        ))
        .host_sink(Arc::new(ConsoleSink::new()))
        .build()?;
    println!("Publishing on '{}'\n", forwarder.channel());

    let subscriber = bus.subscribe(forwarder.channel())?;

    println!("1. Logging at different levels:");
    forwarder.debug("This is a debug message");
    forwarder.info("This is an info message");
    forwarder.warn("This is a warning message");
    info!(forwarder, "Listening on port {}", 8080);
    error!(forwarder, "Failed to open {}", "/var/data");

    forwarder.flush(Duration::from_secs(5));

    println!("\n2. Records received by a subscriber:");
    for record in subscriber.try_iter() {
        println!(
            "   [{}] code={} {}",
            record.level,
            record.severity_code(),
            record.message
        );
    }

    println!("\n3. Latched value for late subscribers:");
    let late = bus.subscribe(forwarder.channel())?;
    if let Ok(record) = late.try_recv() {
        println!("   {}", record.message);
    }

    println!("\n4. Last error: {:?}", forwarder.last_error());

    let metrics = forwarder.metrics();
    println!(
        "\n5. Metrics: enqueued={} published={} dropped={}",
        metrics.enqueued(),
        metrics.published(),
        metrics.dropped()
    );

    forwarder.shutdown();
    println!("\n=== Example completed successfully! ===");

    Ok(())
}
