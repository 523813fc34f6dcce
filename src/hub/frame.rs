//! Broadcast frame and viewer identity types

use bytes::Bytes;

use crate::record::CanonicalRecord;

/// Identifier assigned to a viewer on connect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewerId(pub u64);

impl std::fmt::Display for ViewerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "viewer-{}", self.0)
    }
}

/// A message to be delivered to every viewer
///
/// This is designed to be cheap to clone due to `Bytes` reference counting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BroadcastFrame {
    /// Position of the record within its replay pass
    pub sequence: u64,
    /// JSON-encoded record
    pub payload: Bytes,
}

impl BroadcastFrame {
    /// Create a frame from an already-encoded payload
    pub fn new(sequence: u64, payload: impl Into<Bytes>) -> Self {
        Self {
            sequence,
            payload: payload.into(),
        }
    }

    /// Encode a record as a JSON frame
    pub fn encode(sequence: u64, record: &CanonicalRecord) -> serde_json::Result<Self> {
        Ok(Self::new(sequence, serde_json::to_vec(record)?))
    }

    /// Payload as text
    pub fn as_text(&self) -> Option<&str> {
        std::str::from_utf8(&self.payload).ok()
    }

    /// Payload size in bytes
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}
