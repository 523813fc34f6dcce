//! HTTP and websocket surface
//!
//! Viewers upgrade on the configured endpoint path and receive one JSON text
//! message per replayed record. `/health` and `/stats` sit alongside it.

pub mod config;
pub mod connection;
pub mod listener;

pub use config::ServerConfig;
pub use connection::AppState;
pub use listener::ReplayServer;
