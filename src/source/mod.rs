//! Record sources
//!
//! A source discovers a set of ordered batches (files, cursor pages, ...)
//! and can open any number of independent passes over them. Each pass is a
//! lazy iterator; looping replay simply opens a new pass.

pub mod files;
pub mod memory;

pub use files::{CsvSource, SourceConfig};
pub use memory::MemorySource;

use crate::error::Result;
use crate::record::RawRecord;

/// One lazy pass over a source, in source order
///
/// Individual rows may fail (unreadable file, malformed line); the pass
/// continues with the next row after an error.
pub type RawRecords = Box<dyn Iterator<Item = Result<RawRecord>> + Send>;

/// Anything that can produce an ordered, restartable sequence of raw rows
pub trait RecordSource: Send + 'static {
    /// Look for batches, replacing the previously discovered set
    ///
    /// Returns the number of batches found. Zero is a valid answer; callers
    /// poll again later.
    fn discover(&mut self) -> Result<usize>;

    /// Open a fresh pass over the discovered batches, from the first one
    fn open(&self) -> RawRecords;

    /// Human-readable description for logs
    fn describe(&self) -> String;
}
