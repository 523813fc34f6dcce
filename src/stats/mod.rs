//! Replay statistics

pub mod metrics;

pub use metrics::{ReplayMetrics, ReplayStats};
