//! The thin HTTP surface over the task coordinator: three routes, a raw
//! `hyper` server, no router crate.

pub mod config;
pub mod error;
pub mod handlers;
pub mod server;

pub use config::ServerConfig;
pub use handlers::AppState;
