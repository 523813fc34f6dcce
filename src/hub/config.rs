//! Hub configuration

/// Default per-viewer queue depth
pub const DEFAULT_VIEWER_BUFFER: usize = 32;

/// Hub configuration options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubConfig {
    /// Frames queued per viewer before it is considered stalled
    pub viewer_buffer: usize,

    /// Maximum concurrent viewers (0 = unlimited)
    pub max_viewers: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            viewer_buffer: DEFAULT_VIEWER_BUFFER,
            max_viewers: 0, // Unlimited
        }
    }
}

impl HubConfig {
    /// Set the per-viewer queue depth (at least 1)
    pub fn viewer_buffer(mut self, frames: usize) -> Self {
        self.viewer_buffer = frames.max(1);
        self
    }

    /// Set maximum concurrent viewers
    pub fn max_viewers(mut self, max: usize) -> Self {
        self.max_viewers = max;
        self
    }
}
