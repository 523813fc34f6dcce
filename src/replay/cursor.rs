//! Shared replay cursor
//!
//! The single position within the ordered record sequence. Every viewer
//! sees the same cursor; a viewer joining mid-stream starts wherever the
//! cursor currently is.
//!
//! Rows are read on the blocking pool and handed over through a bounded
//! channel, so file I/O never runs on a runtime worker. The reader stays at
//! most `PREFETCH_ROWS` ahead of the cursor.

use tokio::sync::mpsc;

use crate::error::Result;
use crate::hub::BroadcastFrame;
use crate::record::{CanonicalRecord, Normalizer, RawRecord};
use crate::source::{RawRecords, RecordSource};

/// Rows read ahead of the cursor
pub const PREFETCH_ROWS: usize = 256;

/// Outcome of advancing the cursor by one row
#[derive(Debug)]
pub enum Step {
    /// A broadcastable record, with its row index in the pass
    Record {
        sequence: u64,
        record: CanonicalRecord,
    },
    /// Row was filtered out, blank, or unreadable
    Skipped,
    /// The pass is over
    Exhausted,
}

/// Position within the current replay pass
#[derive(Default)]
pub struct ReplayCursor {
    rows: Option<mpsc::Receiver<Result<RawRecord>>>,
    /// Rows consumed in the current pass
    position: u64,
    /// Records produced in the current pass
    records_in_pass: u64,
    /// Passes opened so far
    pass: u64,
    /// Frame taken from the sequence but not yet delivered
    held: Option<BroadcastFrame>,
}

impl ReplayCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new pass from the first batch of `source`
    ///
    /// Must be called from within a tokio runtime. Any reader left over from
    /// the previous pass stops once it notices the pass was dropped.
    pub fn rewind<S: RecordSource + ?Sized>(&mut self, source: &S) {
        self.rows = Some(read_ahead(source.open()));
        self.position = 0;
        self.records_in_pass = 0;
        self.pass += 1;
        self.held = None;
    }

    /// Advance by one row
    pub async fn step(&mut self, normalizer: &Normalizer) -> Step {
        let Some(rows) = self.rows.as_mut() else {
            return Step::Exhausted;
        };

        let Some(row) = rows.recv().await else {
            self.rows = None;
            return Step::Exhausted;
        };

        let sequence = self.position;
        self.position += 1;

        match row.ok().and_then(|raw| normalizer.normalize(&raw)) {
            Some(record) => {
                self.records_in_pass += 1;
                Step::Record { sequence, record }
            }
            None => Step::Skipped,
        }
    }

    /// Keep a frame to be delivered before advancing further
    pub fn hold(&mut self, frame: BroadcastFrame) {
        self.held = Some(frame);
    }

    /// Take the held frame, if any
    pub fn take_held(&mut self) -> Option<BroadcastFrame> {
        self.held.take()
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn records_in_pass(&self) -> u64 {
        self.records_in_pass
    }

    /// Number of passes opened (1 during the first pass)
    pub fn pass(&self) -> u64 {
        self.pass
    }

    /// Check if a pass is in progress
    pub fn is_open(&self) -> bool {
        self.rows.is_some()
    }
}

/// Pull `rows` on the blocking pool into a bounded channel
fn read_ahead(rows: RawRecords) -> mpsc::Receiver<Result<RawRecord>> {
    let (tx, rx) = mpsc::channel(PREFETCH_ROWS);

    tokio::task::spawn_blocking(move || {
        for row in rows {
            if tx.blocking_send(row).is_err() {
                // Cursor rewound or dropped
                break;
            }
        }
    });

    rx
}

impl std::fmt::Debug for ReplayCursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplayCursor")
            .field("open", &self.is_open())
            .field("position", &self.position)
            .field("records_in_pass", &self.records_in_pass)
            .field("pass", &self.pass)
            .field("held", &self.held.as_ref().map(|frame| frame.sequence))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;
    use crate::record::{NormalizeConfig, RawRecord};
    use crate::source::MemorySource;

    fn row(line: &str) -> RawRecord {
        RawRecord::new()
            .with("TimeLine", "2025-01-01 00:00:00")
            .with("ProductionLine", line)
            .with("RPM", "100")
    }

    fn sequence_of(step: Step) -> Option<u64> {
        match step {
            Step::Record { sequence, .. } => Some(sequence),
            _ => None,
        }
    }

    #[tokio::test]
    async fn test_unopened_cursor_is_exhausted() {
        let mut cursor = ReplayCursor::new();

        assert!(!cursor.is_open());
        assert!(matches!(
            cursor.step(&Normalizer::default()).await,
            Step::Exhausted
        ));
    }

    #[tokio::test]
    async fn test_step_through_pass() {
        let source = MemorySource::from_records(vec![row("1"), row("2"), row("1")]);
        let normalizer = Normalizer::new(NormalizeConfig::default().line_filter("1"));
        let mut cursor = ReplayCursor::new();

        cursor.rewind(&source);
        assert_eq!(cursor.pass(), 1);

        assert_eq!(sequence_of(cursor.step(&normalizer).await), Some(0));
        assert!(matches!(cursor.step(&normalizer).await, Step::Skipped));
        assert_eq!(sequence_of(cursor.step(&normalizer).await), Some(2));
        assert!(matches!(cursor.step(&normalizer).await, Step::Exhausted));

        assert_eq!(cursor.position(), 3);
        assert_eq!(cursor.records_in_pass(), 2);
        assert!(!cursor.is_open());
    }

    #[tokio::test]
    async fn test_rewind_restarts() {
        let source = MemorySource::from_records(vec![row("1"), row("1")]);
        let normalizer = Normalizer::default();
        let mut cursor = ReplayCursor::new();

        cursor.rewind(&source);
        cursor.step(&normalizer).await;
        cursor.step(&normalizer).await;
        cursor.rewind(&source);

        assert_eq!(cursor.pass(), 2);
        assert_eq!(cursor.position(), 0);
        assert_eq!(sequence_of(cursor.step(&normalizer).await), Some(0));
    }

    #[test]
    fn test_hold_and_take() {
        let mut cursor = ReplayCursor::new();
        let frame = BroadcastFrame::new(4, Bytes::from_static(b"{}"));

        cursor.hold(frame.clone());
        assert_eq!(cursor.take_held(), Some(frame));
        assert_eq!(cursor.take_held(), None);
    }

    #[tokio::test]
    async fn test_rewind_abandons_long_pass() {
        let long: Vec<_> = (0..PREFETCH_ROWS * 4).map(|_| row("1")).collect();
        let source = MemorySource::from_records(long);
        let normalizer = Normalizer::default();
        let mut cursor = ReplayCursor::new();

        // First reader blocks on a full channel until the pass is dropped
        cursor.rewind(&source);
        assert_eq!(sequence_of(cursor.step(&normalizer).await), Some(0));

        cursor.rewind(&source);
        assert_eq!(cursor.pass(), 2);
        assert_eq!(sequence_of(cursor.step(&normalizer).await), Some(0));
        assert_eq!(sequence_of(cursor.step(&normalizer).await), Some(1));
    }

    #[tokio::test]
    async fn test_unreadable_row_skipped() {
        struct Flaky;

        impl RecordSource for Flaky {
            fn discover(&mut self) -> Result<usize> {
                Ok(1)
            }

            fn open(&self) -> RawRecords {
                let rows = vec![
                    Err(crate::error::Error::UnknownEncoding("x".into())),
                    Ok(row("1")),
                ];
                Box::new(rows.into_iter())
            }

            fn describe(&self) -> String {
                "flaky".into()
            }
        }

        let mut cursor = ReplayCursor::new();
        cursor.rewind(&Flaky);

        assert!(matches!(cursor.step(&Normalizer::default()).await, Step::Skipped));
        assert_eq!(sequence_of(cursor.step(&Normalizer::default()).await), Some(1));
        assert!(matches!(cursor.step(&Normalizer::default()).await, Step::Exhausted));
    }
}
