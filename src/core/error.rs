//! Error types for the log forwarder

pub type Result<T> = std::result::Result<T, ForwarderError>;

#[derive(Debug, thiserror::Error)]
pub enum ForwarderError {
    /// IO error with context
    #[error("IO error while {operation}: {message}")]
    IoOperation {
        operation: String,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Generic IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Channel could not be registered with the transport
    #[error("Failed to register channel '{channel}': {message}")]
    ChannelRegistration { channel: String, message: String },

    /// Record could not be published
    #[error("Failed to publish on '{channel}': {message}")]
    Publish { channel: String, message: String },

    /// Logical name could not be resolved
    #[error("Failed to resolve name '{name}': {message}")]
    NameResolution { name: String, message: String },

    /// Config store unreachable or returned garbage
    #[error("Config store error for key '{key}': {message}")]
    ConfigStore { key: String, message: String },

    /// Host logging facility rejected a record
    #[error("Host sink error ({sink}): {message}")]
    Sink { sink: String, message: String },

    /// Dispatch queue no longer accepts records
    #[error("Dispatch queue is shutting down")]
    ShuttingDown,

    /// Dispatch queue was already started once
    #[error("Dispatch queue already started; a stopped forwarder cannot be restarted")]
    AlreadyStarted,

    /// Worker thread could not be spawned
    #[error("Failed to spawn dispatch worker: {0}")]
    WorkerSpawn(#[source] std::io::Error),

    /// Invalid configuration with details
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl ForwarderError {
    /// Create an IO operation error with context
    pub fn io_operation(
        operation: impl Into<String>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        ForwarderError::IoOperation {
            operation: operation.into(),
            message: message.into(),
            source,
        }
    }

    pub fn registration(channel: impl Into<String>, message: impl Into<String>) -> Self {
        ForwarderError::ChannelRegistration {
            channel: channel.into(),
            message: message.into(),
        }
    }

    pub fn publish(channel: impl Into<String>, message: impl Into<String>) -> Self {
        ForwarderError::Publish {
            channel: channel.into(),
            message: message.into(),
        }
    }

    pub fn resolution(name: impl Into<String>, message: impl Into<String>) -> Self {
        ForwarderError::NameResolution {
            name: name.into(),
            message: message.into(),
        }
    }

    pub fn config_store(key: impl Into<String>, message: impl Into<String>) -> Self {
        ForwarderError::ConfigStore {
            key: key.into(),
            message: message.into(),
        }
    }

    pub fn sink(sink: impl Into<String>, message: impl Into<String>) -> Self {
        ForwarderError::Sink {
            sink: sink.into(),
            message: message.into(),
        }
    }

    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        ForwarderError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        ForwarderError::Other(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = ForwarderError::publish("/rosout", "connection reset");
        assert!(matches!(err, ForwarderError::Publish { .. }));

        let err = ForwarderError::config("ForwarderConfig", "empty channel");
        assert!(matches!(err, ForwarderError::InvalidConfiguration { .. }));

        let err = ForwarderError::resolution("bad name", "contains a space");
        assert!(matches!(err, ForwarderError::NameResolution { .. }));
    }

    #[test]
    fn test_error_display() {
        let err = ForwarderError::registration("/rosout", "already registered");
        assert_eq!(
            err.to_string(),
            "Failed to register channel '/rosout': already registered"
        );

        let err = ForwarderError::sink("journal", "socket missing");
        assert_eq!(err.to_string(), "Host sink error (journal): socket missing");

        assert_eq!(
            ForwarderError::ShuttingDown.to_string(),
            "Dispatch queue is shutting down"
        );
    }

    #[test]
    fn test_io_operation_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "no socket");
        let err = ForwarderError::io_operation("connecting to journal", "socket not found", io_err);

        assert!(matches!(err, ForwarderError::IoOperation { .. }));
        assert!(err.to_string().contains("connecting to journal"));
        assert!(err.to_string().contains("socket not found"));
    }
}
