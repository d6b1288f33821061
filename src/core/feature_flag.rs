//! Config store interface and the cached suppression flag
//!
//! The flag fails open: when the store is unreachable or the key is missing,
//! the last known value (initially `false`) stays in effect and the log
//! pipeline keeps running as normal.

use super::error::Result;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Key-value configuration store
pub trait ConfigStore: Send + Sync {
    /// `Ok(None)` when the key is absent, `Err` when the store is unreachable
    fn get_cached_bool(&self, key: &str) -> Result<Option<bool>>;
}

/// Store that never holds any key
#[derive(Debug, Clone, Copy, Default)]
pub struct NullConfigStore;

impl ConfigStore for NullConfigStore {
    fn get_cached_bool(&self, _key: &str) -> Result<Option<bool>> {
        Ok(None)
    }
}

/// In-process store, shareable between the forwarder and its owner
#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    values: RwLock<HashMap<String, bool>>,
}

impl MemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, key: impl Into<String>, value: bool) {
        self.values.write().insert(key.into(), value);
    }

    pub fn remove(&self, key: &str) -> Option<bool> {
        self.values.write().remove(key)
    }
}

impl ConfigStore for MemoryConfigStore {
    fn get_cached_bool(&self, key: &str) -> Result<Option<bool>> {
        Ok(self.values.read().get(key).copied())
    }
}

/// Last known value of the topic-suppression flag
pub struct FeatureFlagCache {
    store: Arc<dyn ConfigStore>,
    key: String,
    cached: AtomicBool,
}

impl FeatureFlagCache {
    pub fn new(store: Arc<dyn ConfigStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
            cached: AtomicBool::new(false),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Refresh from the store, then return the (possibly stale) value
    pub fn is_suppressed(&self) -> bool {
        if let Ok(Some(value)) = self.store.get_cached_bool(&self.key) {
            self.cached.store(value, Ordering::Relaxed);
        }
        self.cached.load(Ordering::Relaxed)
    }
}

impl std::fmt::Debug for FeatureFlagCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeatureFlagCache")
            .field("key", &self.key)
            .field("cached", &self.cached.load(Ordering::Relaxed))
            .finish()
    }
}
