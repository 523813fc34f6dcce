//! Viewer handle

use tokio::sync::mpsc;

use super::frame::{BroadcastFrame, ViewerId};

/// Receiving side of a registered viewer
///
/// Held by the connection task. Dropping it makes the next broadcast reap
/// the viewer; [`Hub::disconnect`](super::Hub::disconnect) removes it
/// immediately.
#[derive(Debug)]
pub struct Viewer {
    id: ViewerId,
    rx: mpsc::Receiver<BroadcastFrame>,
}

impl Viewer {
    pub(super) fn new(id: ViewerId, rx: mpsc::Receiver<BroadcastFrame>) -> Self {
        Self { id, rx }
    }

    pub fn id(&self) -> ViewerId {
        self.id
    }

    /// Wait for the next frame
    ///
    /// Returns `None` once the hub has dropped this viewer.
    pub async fn recv(&mut self) -> Option<BroadcastFrame> {
        self.rx.recv().await
    }

    /// Take a queued frame without waiting
    pub fn try_recv(&mut self) -> Option<BroadcastFrame> {
        self.rx.try_recv().ok()
    }
}
