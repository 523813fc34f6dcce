//! Hub implementation
//!
//! The registry of connected viewers for one logical line.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, RwLock};

use super::config::HubConfig;
use super::error::HubError;
use super::frame::{BroadcastFrame, ViewerId};
use super::viewer::Viewer;

/// Concurrent registry of active viewers
///
/// Thread-safe via `RwLock`. `broadcast` holds the write lock for the whole
/// fan-out so that reaping is atomic with respect to connect/disconnect.
/// Enqueueing never awaits, so the lock is held only briefly.
pub struct Hub {
    /// Outbound queue of every active viewer
    viewers: RwLock<HashMap<ViewerId, mpsc::Sender<BroadcastFrame>>>,

    next_viewer_id: AtomicU64,

    config: HubConfig,
}

impl Hub {
    /// Create a new hub with default configuration
    pub fn new() -> Self {
        Self::with_config(HubConfig::default())
    }

    /// Create a new hub with custom configuration
    pub fn with_config(config: HubConfig) -> Self {
        Self {
            viewers: RwLock::new(HashMap::new()),
            next_viewer_id: AtomicU64::new(1),
            config,
        }
    }

    /// Get the hub configuration
    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    /// Register a new viewer
    ///
    /// The viewer receives every frame broadcast after this call; there is no
    /// catch-up of earlier frames.
    pub async fn connect(&self) -> Result<Viewer, HubError> {
        let mut viewers = self.viewers.write().await;

        if self.config.max_viewers > 0 && viewers.len() >= self.config.max_viewers {
            tracing::warn!(
                viewers = viewers.len(),
                max = self.config.max_viewers,
                "Viewer rejected: limit reached"
            );
            return Err(HubError::ViewerLimit(self.config.max_viewers));
        }

        let id = ViewerId(self.next_viewer_id.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = mpsc::channel(self.config.viewer_buffer);
        viewers.insert(id, tx);

        tracing::info!(viewer = %id, viewers = viewers.len(), "Viewer connected");

        Ok(Viewer::new(id, rx))
    }

    /// Remove a viewer
    ///
    /// Returns `false` if the viewer was already gone (e.g. reaped by a
    /// broadcast); that is not an error.
    pub async fn disconnect(&self, id: ViewerId) -> bool {
        let mut viewers = self.viewers.write().await;
        let removed = viewers.remove(&id).is_some();

        if removed {
            tracing::info!(viewer = %id, viewers = viewers.len(), "Viewer disconnected");
        }

        removed
    }

    /// Deliver a frame to every active viewer
    ///
    /// Viewers that cannot accept the frame are dropped as part of this call.
    /// Returns the number of viewers the frame was queued for.
    pub async fn broadcast(&self, frame: BroadcastFrame) -> usize {
        let mut viewers = self.viewers.write().await;
        let before = viewers.len();

        viewers.retain(|id, tx| match tx.try_send(frame.clone()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                tracing::warn!(viewer = %id, "Viewer stalled, dropping");
                false
            }
            Err(TrySendError::Closed(_)) => {
                tracing::debug!(viewer = %id, "Viewer gone, dropping");
                false
            }
        });

        let delivered = viewers.len();
        if delivered < before {
            tracing::info!(
                reaped = before - delivered,
                viewers = delivered,
                "Reaped viewers during broadcast"
            );
        }

        delivered
    }

    /// Remove every viewer, ending their queues
    ///
    /// Connection tasks observe the end of their queue and close the socket.
    pub async fn disconnect_all(&self) -> usize {
        let mut viewers = self.viewers.write().await;
        let count = viewers.len();
        viewers.clear();

        if count > 0 {
            tracing::info!(viewers = count, "Disconnected all viewers");
        }

        count
    }

    /// Number of active viewers
    pub async fn viewer_count(&self) -> usize {
        self.viewers.read().await.len()
    }

    /// Check if any viewer is connected
    pub async fn has_viewers(&self) -> bool {
        !self.viewers.read().await.is_empty()
    }
}

impl Default for Hub {
    fn default() -> Self {
        Self::new()
    }
}
