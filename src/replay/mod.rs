//! Paced replay of a record source
//!
//! The driver owns a single shared cursor over the source. It only advances
//! while at least one viewer is connected, and emits one record per
//! `interval / speed_factor` (never faster than `min_delay`).
//!
//! ```text
//!   RecordSource ──rows──► Normalizer ──records──► ReplayDriver ──frames──► Hub
//!        ▲                                             │
//!        └────────────── open() at each pass ──────────┘
//! ```

pub mod config;
pub mod cursor;
pub mod driver;
pub mod state;

pub use config::{ReplayConfig, MIN_SPEED_FACTOR};
pub use cursor::{ReplayCursor, Step};
pub use driver::ReplayDriver;
pub use state::DriverPhase;
