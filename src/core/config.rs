//! Forwarder configuration
//!
//! Every field has a default, so a partial JSON document is enough:
//!
//! ```
//! use log_forwarder::{ForwarderConfig, ShutdownPolicy};
//!
//! let config = ForwarderConfig::from_json_str(
//!     r#"{ "channel": "/diagnostics_log", "shutdown_policy": "stop_immediately" }"#,
//! ).unwrap();
//!
//! assert_eq!(config.channel, "/diagnostics_log");
//! assert_eq!(config.shutdown_policy, ShutdownPolicy::StopImmediately);
//! assert_eq!(config.publish_retries, 0);
//! ```

use super::error::{ForwarderError, Result};
use super::shutdown_policy::ShutdownPolicy;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_CHANNEL: &str = "/rosout";
pub const DEFAULT_SUPPRESS_TOPICS_KEY: &str = "/rosout_disable_topics_generation";
pub const DEFAULT_WORKER_THREAD_NAME: &str = "log-dispatch";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForwarderConfig {
    /// Logical channel name, resolved before registration
    pub channel: String,
    /// Config store key holding the topic-suppression flag
    pub suppress_topics_key: String,
    pub shutdown_policy: ShutdownPolicy,
    /// Extra attempts per record after a failed publish
    pub publish_retries: u32,
    /// Base delay between publish attempts, doubled each retry
    pub retry_backoff_ms: u64,
    pub worker_thread_name: String,
    /// Whether the host journal sink is consulted at all
    pub journal_enabled: bool,
}

impl Default for ForwarderConfig {
    fn default() -> Self {
        Self {
            channel: DEFAULT_CHANNEL.to_string(),
            suppress_topics_key: DEFAULT_SUPPRESS_TOPICS_KEY.to_string(),
            shutdown_policy: ShutdownPolicy::default(),
            publish_retries: 0,
            retry_backoff_ms: 10,
            worker_thread_name: DEFAULT_WORKER_THREAD_NAME.to_string(),
            journal_enabled: true,
        }
    }
}

impl ForwarderConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: ForwarderConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            ForwarderError::io_operation(
                "reading forwarder config",
                format!("cannot read '{}'", path.display()),
                e,
            )
        })?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if self.channel.trim().is_empty() {
            return Err(ForwarderError::config("ForwarderConfig", "channel must not be empty"));
        }
        if self.suppress_topics_key.trim().is_empty() {
            return Err(ForwarderError::config(
                "ForwarderConfig",
                "suppress_topics_key must not be empty",
            ));
        }
        if self.worker_thread_name.is_empty() {
            return Err(ForwarderError::config(
                "ForwarderConfig",
                "worker_thread_name must not be empty",
            ));
        }
        Ok(())
    }

    #[inline]
    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}
