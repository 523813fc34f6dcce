//! Driver state machine
//!
//! ```text
//!   WaitingForSource ──files found──► WaitingForViewers ◄──► Playing
//!                                                              │
//!                                           end of pass, no loop
//!                                                              ▼
//!                                                          Finished
//! ```

use serde::Serialize;

/// Macro-state of the replay driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum DriverPhase {
    /// No source batches discovered yet; polling
    WaitingForSource = 0,
    /// Holding the cursor until a viewer connects
    WaitingForViewers = 1,
    /// Emitting records
    Playing = 2,
    /// Sequence exhausted with looping disabled
    Finished = 3,
}

impl DriverPhase {
    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            0 => DriverPhase::WaitingForSource,
            1 => DriverPhase::WaitingForViewers,
            2 => DriverPhase::Playing,
            _ => DriverPhase::Finished,
        }
    }

    /// Check if the driver is idle, waiting on files or viewers
    pub fn is_waiting(&self) -> bool {
        matches!(
            self,
            DriverPhase::WaitingForSource | DriverPhase::WaitingForViewers
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DriverPhase::WaitingForSource => "waiting_for_source",
            DriverPhase::WaitingForViewers => "waiting_for_viewers",
            DriverPhase::Playing => "playing",
            DriverPhase::Finished => "finished",
        }
    }
}

impl std::fmt::Display for DriverPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_u8_roundtrip() {
        for phase in [
            DriverPhase::WaitingForSource,
            DriverPhase::WaitingForViewers,
            DriverPhase::Playing,
            DriverPhase::Finished,
        ] {
            assert_eq!(DriverPhase::from_u8(phase as u8), phase);
        }
    }

    #[test]
    fn test_is_waiting() {
        assert!(DriverPhase::WaitingForSource.is_waiting());
        assert!(DriverPhase::WaitingForViewers.is_waiting());
        assert!(!DriverPhase::Playing.is_waiting());
        assert!(!DriverPhase::Finished.is_waiting());
    }
}
