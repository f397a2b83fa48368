//! HTTP server configuration object and helpers.

use std::net::SocketAddr;
use std::sync::Arc;

use feedgraph::domain::ports::RecordStore;

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) store: Arc<dyn RecordStore>,
}

impl ServerConfig {
    /// Construct a server configuration serving records from `store`.
    #[must_use]
    pub fn new(bind_addr: SocketAddr, store: Arc<dyn RecordStore>) -> Self {
        Self { bind_addr, store }
    }

    /// Return the socket address the server will bind to.
    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }
}
