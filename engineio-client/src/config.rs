//! Client-side configuration, following the builder shape of the teacher
//! crate's `EngineIoConfig`/`EngineIoConfigBuilder`. Everything here is an
//! input the application controls before `connect`; the values negotiated
//! with the server (`sid`, `upgrades`, `ping_interval`, `ping_timeout`) are
//! handshake outputs and have no place in this struct.

use std::collections::HashMap;

use crate::transport::TransportKind;

/// Configuration accepted by [`crate::Client::connect`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// The endpoint path the server is mounted under, e.g. `"engine.io"`.
    pub(crate) path: String,
    /// Extra headers sent with every handshake/upgrade request.
    pub(crate) headers: HashMap<String, String>,
    /// The transports the application permits, in attempt order. The first
    /// entry is tried first; if it is `websocket` the polling handshake is
    /// skipped entirely.
    pub(crate) allowed_transports: Vec<TransportKind>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            path: "engine.io".to_string(),
            headers: HashMap::new(),
            allowed_transports: vec![TransportKind::Polling, TransportKind::WebSocket],
        }
    }
}

impl ClientConfig {
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug, Clone, Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Set the endpoint path. Leading/trailing `/` are stripped at use time.
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.config.path = path.into();
        self
    }

    /// Add a header sent with every handshake/upgrade request.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.headers.insert(key.into(), value.into());
        self
    }

    /// Restrict the transports the client is allowed to use, in attempt
    /// order. Defaults to `[Polling, WebSocket]`.
    pub fn transports(mut self, transports: Vec<TransportKind>) -> Self {
        self.config.allowed_transports = transports;
        self
    }

    pub fn build(self) -> ClientConfig {
        self.config
    }
}
