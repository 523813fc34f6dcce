//! Broadcast-ready record types
//!
//! The JSON produced here is the wire format viewers receive:
//!
//! ```text
//! {"ts":"2025-01-01T00:00:00","line":"1호기","tool_num":4242,
//!  "rpm":1200.0,"feed":0.5,"troq":0.0,"state":"cutting",
//!  "prediction":{"replace_window":["2025-01-02T00:00:00","2025-01-02T12:00:00"]}}
//! ```
//!
//! Timestamps read with a UTC offset keep it, so `ts` and both window ends
//! go out as e.g. `2025-01-01T08:00:00+09:00`.

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeDelta, Timelike};
use serde::ser::{SerializeStruct, Serializer};
use serde::Serialize;

/// Derived machine activity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MachineState {
    /// Spindle turning and either feeding or under load
    Cutting,
    /// Anything else
    Idle,
}

impl MachineState {
    /// Classify a set of measurements
    pub fn from_measurements(rpm: f64, feed_rate: f64, torque: f64) -> Self {
        if rpm > 0.0 && (feed_rate > 0.0 || torque > 0.0) {
            MachineState::Cutting
        } else {
            MachineState::Idle
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MachineState::Cutting => "cutting",
            MachineState::Idle => "idle",
        }
    }
}

impl std::fmt::Display for MachineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Record timestamp: wall-clock time plus the UTC offset, when the source had one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordTime {
    pub wall: NaiveDateTime,
    pub offset: Option<FixedOffset>,
}

impl RecordTime {
    /// Timestamp with no offset
    pub fn naive(wall: NaiveDateTime) -> Self {
        Self { wall, offset: None }
    }

    /// Timestamp with an explicit offset
    pub fn with_offset(wall: NaiveDateTime, offset: FixedOffset) -> Self {
        Self {
            wall,
            offset: Some(offset),
        }
    }

    /// Shift by `delta`, keeping the offset
    pub fn checked_add(self, delta: TimeDelta) -> Option<Self> {
        Some(Self {
            wall: self.wall.checked_add_signed(delta)?,
            offset: self.offset,
        })
    }
}

impl From<NaiveDateTime> for RecordTime {
    fn from(wall: NaiveDateTime) -> Self {
        Self::naive(wall)
    }
}

impl From<DateTime<FixedOffset>> for RecordTime {
    fn from(ts: DateTime<FixedOffset>) -> Self {
        Self::with_offset(ts.naive_local(), *ts.offset())
    }
}

impl std::fmt::Display for RecordTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&iso8601(&self.wall))?;
        match self.offset {
            Some(offset) => write!(f, "{offset}"),
            None => Ok(()),
        }
    }
}

impl Serialize for RecordTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Placeholder replacement window, fixed offsets from the record timestamp
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PredictionWindow {
    pub start: RecordTime,
    pub end: RecordTime,
}

impl Serialize for PredictionWindow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let window = [self.start.to_string(), self.end.to_string()];
        let mut state = serializer.serialize_struct("Prediction", 1)?;
        state.serialize_field("replace_window", &window)?;
        state.end()
    }
}

/// A normalized record, ready to broadcast
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalRecord {
    #[serde(rename = "ts")]
    pub timestamp: RecordTime,

    #[serde(rename = "line")]
    pub line_id: String,

    #[serde(rename = "tool_num")]
    pub tool_id: Option<i64>,

    pub rpm: f64,

    #[serde(rename = "feed")]
    pub feed_rate: f64,

    #[serde(rename = "troq")]
    pub torque: f64,

    pub state: MachineState,

    #[serde(rename = "prediction")]
    pub prediction_window: PredictionWindow,
}

impl CanonicalRecord {
    /// Encode as the JSON wire message
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Format a timestamp as ISO-8601 without offset
///
/// Fractional seconds are only emitted when present, always with
/// microsecond precision.
pub fn iso8601(ts: &NaiveDateTime) -> String {
    if ts.nanosecond() == 0 {
        ts.format("%Y-%m-%dT%H:%M:%S").to_string()
    } else {
        ts.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
    }
}
