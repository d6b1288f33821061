//! Publish/subscribe transport and name resolution interfaces

use super::{
    error::{ForwarderError, Result},
    log_record::LogRecord,
};

/// Options applied when a channel is registered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelOptions {
    /// Retain the last published record and replay it to late subscribers
    pub latch: bool,
}

impl ChannelOptions {
    pub const fn latched() -> Self {
        Self { latch: true }
    }
}

impl Default for ChannelOptions {
    fn default() -> Self {
        Self::latched()
    }
}

/// Outbound publish/subscribe transport
///
/// Methods take `&self` because the dispatch worker and the constructing
/// thread share one instance; implementations guard their own state.
///
/// # Example
///
/// ```
/// use log_forwarder::core::{ChannelOptions, LogRecord, Result, Transport};
///
/// struct Discard;
///
/// impl Transport for Discard {
///     fn register_channel(&self, _channel: &str, _options: ChannelOptions) -> Result<()> {
///         Ok(())
///     }
///
///     fn publish(&self, _channel: &str, _record: &LogRecord) -> Result<()> {
///         Ok(())
///     }
///
///     fn name(&self) -> &str {
///         "discard"
///     }
/// }
/// ```
pub trait Transport: Send + Sync {
    fn register_channel(&self, channel: &str, options: ChannelOptions) -> Result<()>;
    fn publish(&self, channel: &str, record: &LogRecord) -> Result<()>;
    fn name(&self) -> &str;
}

/// Turns a logical channel name into a transport address
pub trait NameResolver: Send + Sync {
    fn resolve(&self, name: &str) -> Result<String>;
}

/// Resolves relative names against a namespace; absolute names pass through
///
/// ```
/// use log_forwarder::core::{NameResolver, NamespaceResolver};
///
/// let resolver = NamespaceResolver::new("/robot1");
/// assert_eq!(resolver.resolve("rosout").unwrap(), "/robot1/rosout");
/// assert_eq!(resolver.resolve("/rosout").unwrap(), "/rosout");
/// ```
#[derive(Debug, Clone)]
pub struct NamespaceResolver {
    namespace: String,
}

impl NamespaceResolver {
    pub fn new(namespace: impl Into<String>) -> Self {
        let mut namespace = namespace.into();
        if !namespace.starts_with('/') {
            namespace.insert(0, '/');
        }
        while namespace.len() > 1 && namespace.ends_with('/') {
            namespace.pop();
        }
        Self { namespace }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    fn validate(name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(ForwarderError::resolution(name, "name is empty"));
        }
        if name.contains("//") {
            return Err(ForwarderError::resolution(name, "empty path segment"));
        }
        if let Some(c) = name
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '/'))
        {
            return Err(ForwarderError::resolution(
                name,
                format!("invalid character '{}'", c),
            ));
        }
        Ok(())
    }
}

impl Default for NamespaceResolver {
    fn default() -> Self {
        Self::new("/")
    }
}

impl NameResolver for NamespaceResolver {
    fn resolve(&self, name: &str) -> Result<String> {
        Self::validate(name)?;
        let resolved = if name.starts_with('/') {
            name.to_string()
        } else if self.namespace == "/" {
            format!("/{}", name)
        } else {
            format!("{}/{}", self.namespace, name)
        };
        if resolved.len() > 1 && resolved.ends_with('/') {
            return Err(ForwarderError::resolution(name, "trailing slash"));
        }
        Ok(resolved)
    }
}
