//! Hub error types

/// Error type for hub operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HubError {
    /// Viewer limit reached
    #[error("viewer limit reached ({0})")]
    ViewerLimit(usize),
}
