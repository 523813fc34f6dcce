//! Historical line replay over websockets
//!
//! Reads machine-line measurement rows from CSV files in order, normalizes
//! them into a fixed record shape, and re-emits them on a timer to every
//! connected viewer as if they were happening live.
//!
//! # Example
//!
//! ```no_run
//! use line_replay::{CsvSource, ReplayServer, ServerConfig};
//!
//! # async fn run() -> line_replay::Result<()> {
//! let config = ServerConfig::from_env()?;
//! let source = CsvSource::new(config.source.clone())?;
//!
//! ReplayServer::new(config, source).run().await
//! # }
//! ```

pub mod error;
pub mod hub;
pub mod record;
pub mod replay;
pub mod server;
pub mod source;
pub mod stats;

pub use error::{ConfigError, Error, Result};
pub use hub::{BroadcastFrame, Hub, HubConfig, Viewer, ViewerId};
pub use record::{CanonicalRecord, MachineState, NormalizeConfig, Normalizer, RawRecord};
pub use replay::{DriverPhase, ReplayConfig, ReplayDriver};
pub use server::{ReplayServer, ServerConfig};
pub use source::{CsvSource, MemorySource, RecordSource, SourceConfig};
pub use stats::{ReplayMetrics, ReplayStats};
