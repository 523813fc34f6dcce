//! In-memory record source
//!
//! Useful for feeds assembled elsewhere (a database query, a fixture) and
//! for exercising the replay loop without touching the filesystem.

use std::sync::Arc;

use super::{RawRecords, RecordSource};
use crate::error::Result;
use crate::record::RawRecord;

/// Record source over batches held in memory
///
/// Batches are staged with [`push_batch`](Self::push_batch) and only become
/// visible to passes after the next [`discover`](RecordSource::discover).
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    staged: Vec<Arc<Vec<RawRecord>>>,
    discovered: Vec<Arc<Vec<RawRecord>>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a source with a single batch, already discovered
    pub fn from_records(records: Vec<RawRecord>) -> Self {
        let batch = Arc::new(records);
        Self {
            staged: vec![Arc::clone(&batch)],
            discovered: vec![batch],
        }
    }

    /// Stage another batch, replayed after the existing ones
    pub fn push_batch(&mut self, records: Vec<RawRecord>) {
        self.staged.push(Arc::new(records));
    }
}

impl RecordSource for MemorySource {
    fn discover(&mut self) -> Result<usize> {
        self.discovered = self.staged.clone();
        Ok(self.discovered.len())
    }

    fn open(&self) -> RawRecords {
        let batches = self.discovered.clone();
        Box::new(
            batches
                .into_iter()
                .flat_map(|batch| {
                    (0..batch.len()).map(move |i| -> Result<RawRecord> { Ok(batch[i].clone()) })
                }),
        )
    }

    fn describe(&self) -> String {
        format!("memory ({} batches)", self.discovered.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(n: u32) -> RawRecord {
        RawRecord::new().with("RPM", n.to_string())
    }

    #[test]
    fn test_batches_in_order() {
        let mut source = MemorySource::new();
        source.push_batch(vec![rec(1), rec(2)]);
        source.push_batch(vec![rec(3)]);

        // Nothing visible until discovery
        assert_eq!(source.open().count(), 0);

        assert_eq!(source.discover().unwrap(), 2);
        let rpms: Vec<_> = source
            .open()
            .map(|r| r.unwrap().get("RPM").unwrap().to_string())
            .collect();
        assert_eq!(rpms, ["1", "2", "3"]);
    }

    #[test]
    fn test_from_records_ready() {
        let source = MemorySource::from_records(vec![rec(1)]);

        assert_eq!(source.open().count(), 1);
        assert_eq!(source.open().count(), 1);
    }
}
