//! Client configuration

use std::path::PathBuf;

/// Configuration for building the data layer
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Remote store endpoint (e.g. "https://xyz.backend.example")
    pub endpoint: String,

    /// Public API key compiled into the client
    pub api_key: String,

    /// Request timeout in seconds, honored by gateway implementations.
    /// The core itself never cancels an in-flight operation.
    pub timeout: u64,

    /// Directory for durable local session state
    pub local_dir: PathBuf,
}

impl ClientConfig {
    /// Create a configuration with defaults.
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            timeout: 30,
            local_dir: PathBuf::from(".mesa"),
        }
    }

    /// Set the request timeout in seconds.
    pub fn with_timeout(mut self, timeout: u64) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the local session-state directory.
    pub fn with_local_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.local_dir = dir.into();
        self
    }
}
