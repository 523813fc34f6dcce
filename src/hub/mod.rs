//! Viewer hub for fan-out delivery
//!
//! The hub tracks every connected viewer of one logical line and delivers
//! each broadcast frame to all of them. Each viewer owns a bounded queue
//! drained by its own connection task, so a broadcast never waits on a
//! socket.
//!
//! # Architecture
//!
//! ```text
//!                            Arc<Hub>
//!                  ┌──────────────────────────────┐
//!                  │ viewers: HashMap<ViewerId,   │
//!                  │   mpsc::Sender<Frame>>       │
//!                  └──────────────┬───────────────┘
//!                                 │
//!         ┌───────────────────────┼───────────────────────┐
//!         │                       │                       │
//!         ▼                       ▼                       ▼
//!   [ReplayDriver]            [Viewer]                [Viewer]
//!   hub.broadcast()          rx.recv()               rx.recv()
//!         │                       │                       │
//!         └──► try_send ──────────┴──► ws.send() ──► socket
//! ```
//!
//! # Reaping
//!
//! A viewer whose queue is closed (connection task ended) or full (viewer
//! stalled for a whole queue's worth of frames) is removed during the same
//! `broadcast` call. The driver never sees the failure.
//!
//! # Zero-Copy Design
//!
//! Frames carry their JSON payload as `bytes::Bytes`, so every viewer shares
//! the same allocation; a record is serialized once per broadcast.

pub mod config;
pub mod error;
pub mod frame;
pub mod store;
pub mod viewer;

pub use config::HubConfig;
pub use error::HubError;
pub use frame::{BroadcastFrame, ViewerId};
pub use store::Hub;
pub use viewer::Viewer;
