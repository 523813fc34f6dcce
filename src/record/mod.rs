//! Record model and normalization
//!
//! A [`RawRecord`] is a single source row as field-name → text. The
//! [`Normalizer`] turns it into a typed [`CanonicalRecord`], or drops it:
//!
//! ```text
//!   RawRecord ──► clean ──► filter(line, tool) ──► parse ──► CanonicalRecord
//!                                 │                              │
//!                                 └──► None (excluded)           └─► state, prediction window
//! ```

pub mod canonical;
pub mod config;
pub mod normalize;
pub mod raw;

pub use canonical::{iso8601, CanonicalRecord, MachineState, PredictionWindow, RecordTime};
pub use config::{ColumnMap, NormalizeConfig, DEFAULT_LINE_ID};
pub use normalize::{clean_field, parse_number, parse_timestamp, parse_tool_id, Normalizer};
pub use raw::RawRecord;
