//! TCP transport for remote log collection
//!
//! Sends each record as one JSON line `{"channel": .., "record": ..}` to a
//! remote collector. Latched channels remember their last line and replay it
//! after a reconnect, so a restarted collector sees the latest value again.

use crate::core::{ChannelOptions, ForwarderError, LogRecord, Result, Transport};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::io::Write;
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

const IO_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Serialize)]
struct Frame<'a> {
    channel: &'a str,
    record: &'a LogRecord,
}

struct ChannelState {
    options: ChannelOptions,
    retained: Option<String>,
}

/// Transport that writes JSON lines to a TCP collector
///
/// # Example
///
/// ```no_run
/// use log_forwarder::appenders::TcpTransport;
/// use log_forwarder::prelude::*;
/// use std::sync::Arc;
///
/// let transport = TcpTransport::new("127.0.0.1:11411")
///     .expect("Failed to connect to log collector");
///
/// let forwarder = LogForwarder::new(Arc::new(transport)).unwrap();
/// forwarder.info("This record will be sent to 127.0.0.1:11411");
/// ```
pub struct TcpTransport {
    stream: Mutex<Option<TcpStream>>,
    channels: Mutex<HashMap<String, ChannelState>>,
    address: String,
    reconnect_on_error: bool,
}

impl TcpTransport {
    /// Connect to a collector
    ///
    /// # Errors
    ///
    /// Returns error if connection fails
    pub fn new(addr: impl ToSocketAddrs + ToString) -> Result<Self> {
        let address = addr.to_string();
        let stream = Self::connect(&address)?;

        Ok(Self {
            stream: Mutex::new(Some(stream)),
            channels: Mutex::new(HashMap::new()),
            address,
            reconnect_on_error: true,
        })
    }

    /// Enable or disable automatic reconnection on errors
    ///
    /// Default: enabled
    #[must_use]
    pub fn with_reconnect(mut self, enable: bool) -> Self {
        self.reconnect_on_error = enable;
        self
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Try each resolved address in turn, bounded by `IO_TIMEOUT` apiece
    fn connect(address: &str) -> Result<TcpStream> {
        let context = |e| {
            ForwarderError::io_operation("connecting to log collector", address.to_string(), e)
        };

        let mut last_err = std::io::Error::new(
            std::io::ErrorKind::AddrNotAvailable,
            "address resolved to nothing",
        );
        let mut connected = None;
        for addr in address.to_socket_addrs().map_err(context)? {
            match TcpStream::connect_timeout(&addr, IO_TIMEOUT) {
                Ok(stream) => {
                    connected = Some(stream);
                    break;
                }
                Err(e) => last_err = e,
            }
        }
        let stream = connected.ok_or_else(|| context(last_err))?;

        // Set timeouts to prevent hanging the dispatch worker
        stream.set_write_timeout(Some(IO_TIMEOUT))?;
        stream.set_read_timeout(Some(IO_TIMEOUT))?;
        stream.set_nodelay(true)?;
        Ok(stream)
    }

    fn encode(channel: &str, record: &LogRecord) -> Result<String> {
        let mut line = serde_json::to_string(&Frame { channel, record })?;
        line.push('\n');
        Ok(line)
    }

    /// Reconnect, replay latched lines of other channels, then send `line`
    fn reconnect_and_send(&self, stream: &mut Option<TcpStream>, channel: &str, line: &str) -> Result<()> {
        let mut fresh = Self::connect(&self.address)?;

        let replay: Vec<String> = self
            .channels
            .lock()
            .iter()
            .filter(|(name, state)| state.options.latch && name.as_str() != channel)
            .filter_map(|(_, state)| state.retained.clone())
            .collect();
        for retained in replay {
            fresh.write_all(retained.as_bytes())?;
        }

        fresh.write_all(line.as_bytes())?;
        *stream = Some(fresh);
        Ok(())
    }
}

impl Transport for TcpTransport {
    fn register_channel(&self, channel: &str, options: ChannelOptions) -> Result<()> {
        let mut channels = self.channels.lock();
        if let Some(existing) = channels.get(channel) {
            if existing.options != options {
                return Err(ForwarderError::registration(
                    channel,
                    "already registered with different options",
                ));
            }
            return Ok(());
        }
        channels.insert(
            channel.to_string(),
            ChannelState {
                options,
                retained: None,
            },
        );
        Ok(())
    }

    fn publish(&self, channel: &str, record: &LogRecord) -> Result<()> {
        let line = Self::encode(channel, record)?;

        {
            let mut channels = self.channels.lock();
            let state = channels
                .get_mut(channel)
                .ok_or_else(|| ForwarderError::publish(channel, "channel is not registered"))?;
            if state.options.latch {
                state.retained = Some(line.clone());
            }
        }

        let mut stream = self.stream.lock();
        let result = match stream.as_mut() {
            Some(s) => s.write_all(line.as_bytes()),
            None => Err(std::io::Error::new(
                std::io::ErrorKind::NotConnected,
                "collector stream not connected",
            )),
        };

        match result {
            Ok(()) => Ok(()),
            Err(e) => {
                // Connection lost
                *stream = None;

                if self.reconnect_on_error {
                    self.reconnect_and_send(&mut stream, channel, &line)
                        .map_err(|reconnect_err| {
                            ForwarderError::publish(
                                channel,
                                format!("send failed: {} (reconnect: {})", e, reconnect_err),
                            )
                        })
                } else {
                    Err(ForwarderError::publish(channel, e.to_string()))
                }
            }
        }
    }

    fn name(&self) -> &str {
        "tcp"
    }
}

impl Drop for TcpTransport {
    fn drop(&mut self) {
        if let Some(ref mut stream) = *self.stream.lock() {
            let _ = stream.flush();
        }
    }
}
