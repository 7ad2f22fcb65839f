//! HTTP-layer configuration: just the bind address. Environment-driven
//! configuration for the whole process lives in `ocr-server::config`; this
//! crate only needs to know where to listen.

use std::net::SocketAddr;

/// Default port the coordinator listens on.
pub const DEFAULT_PORT: u16 = 1323;

#[derive(Debug, Clone, Copy)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
}

impl ServerConfig {
    pub fn with_port(port: u16) -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], port)),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::with_port(DEFAULT_PORT)
    }
}
