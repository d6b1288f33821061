//! Process identity and time source

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

/// Identity of the emitting process
pub trait NodeIdentity: Send + Sync {
    /// Logical name stamped on every record
    fn name(&self) -> String;

    /// Channels the process currently publishes on
    fn advertised_topics(&self) -> Vec<String>;
}

/// Fixed name with a replaceable topic list
#[derive(Debug)]
pub struct StaticIdentity {
    name: String,
    topics: RwLock<Vec<String>>,
}

impl StaticIdentity {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            topics: RwLock::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn with_topics<I, S>(self, topics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set_topics(topics);
        self
    }

    pub fn set_topics<I, S>(&self, topics: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        *self.topics.write() = topics.into_iter().map(Into::into).collect();
    }
}

impl Default for StaticIdentity {
    /// Named after the running executable, falling back to `/unnamed`
    fn default() -> Self {
        let name = std::env::current_exe()
            .ok()
            .and_then(|p| p.file_stem().map(|s| format!("/{}", s.to_string_lossy())))
            .unwrap_or_else(|| "/unnamed".to_string());
        Self::new(name)
    }
}

impl NodeIdentity for StaticIdentity {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn advertised_topics(&self) -> Vec<String> {
        self.topics.read().clone()
    }
}

/// Wall-clock source used to timestamp records
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    #[inline]
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
