//! Delimited-file record source
//!
//! Discovers files matching a glob pattern inside a directory and replays
//! their rows in lexicographic path order. File names are expected to sort
//! chronologically (e.g. `2025_01_01.csv`, `2025_01_02.csv`); content is
//! never re-sorted.

use std::fs::File;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};

use encoding_rs::{Encoding, UTF_8};

use super::{RawRecords, RecordSource};
use crate::error::{Error, Result};
use crate::record::RawRecord;

const UTF8_BOM: char = '\u{feff}';

/// Where and how to read source files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceConfig {
    /// Directory holding the files
    pub directory: PathBuf,

    /// Glob pattern, relative to `directory`
    pub pattern: String,

    /// Text encoding label (WHATWG names, e.g. `utf-8`, `euc-kr`)
    pub encoding: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("./DB/2025_01"),
            pattern: "*.csv".into(),
            encoding: "utf-8".into(),
        }
    }
}

impl SourceConfig {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            ..Default::default()
        }
    }

    /// Set the file pattern
    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = pattern.into();
        self
    }

    /// Set the text encoding label
    pub fn encoding(mut self, label: impl Into<String>) -> Self {
        self.encoding = label.into();
        self
    }
}

/// Record source backed by a directory of CSV files
#[derive(Debug)]
pub struct CsvSource {
    config: SourceConfig,
    encoding: &'static Encoding,
    files: Vec<PathBuf>,
}

impl CsvSource {
    /// Create a source; fails if the encoding label is unknown
    pub fn new(config: SourceConfig) -> Result<Self> {
        let encoding = Encoding::for_label(config.encoding.trim().as_bytes())
            .ok_or_else(|| Error::UnknownEncoding(config.encoding.clone()))?;

        Ok(Self {
            config,
            encoding,
            files: Vec::new(),
        })
    }

    /// Files found by the last discovery, in replay order
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn config(&self) -> &SourceConfig {
        &self.config
    }
}

impl RecordSource for CsvSource {
    fn discover(&mut self) -> Result<usize> {
        self.files = list_files(&self.config.directory, &self.config.pattern)?;
        Ok(self.files.len())
    }

    fn open(&self) -> RawRecords {
        Box::new(FileRows {
            files: self.files.clone().into_iter(),
            encoding: self.encoding,
            current: None,
        })
    }

    fn describe(&self) -> String {
        format!(
            "{} ({}, {})",
            self.config.directory.join(&self.config.pattern).display(),
            self.encoding.name(),
            self.files.len()
        )
    }
}

/// List files matching `pattern` inside `directory`, sorted by path
pub fn list_files(directory: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let escaped = glob::Pattern::escape(&directory.to_string_lossy());
    let full = Path::new(&escaped).join(pattern);

    let mut files = Vec::new();
    for entry in glob::glob(&full.to_string_lossy())? {
        let path = entry?;
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();

    Ok(files)
}

/// Lazy pass over a list of files
struct FileRows {
    files: std::vec::IntoIter<PathBuf>,
    encoding: &'static Encoding,
    current: Option<OpenFile>,
}

struct OpenFile {
    headers: Vec<String>,
    records: csv::StringRecordsIntoIter<Box<dyn Read + Send>>,
}

impl OpenFile {
    fn open(path: &Path, encoding: &'static Encoding) -> Result<Self> {
        let source_error = |source| Error::SourceFile {
            path: path.to_path_buf(),
            source,
        };

        let input: Box<dyn Read + Send> = if encoding == UTF_8 {
            Box::new(File::open(path).map_err(source_error)?)
        } else {
            // Transcode the whole file up front; only one file is resident at a time
            let bytes = std::fs::read(path).map_err(source_error)?;
            let (text, _, _) = encoding.decode(&bytes);
            Box::new(Cursor::new(text.into_owned().into_bytes()))
        };

        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(input);

        let headers = reader
            .headers()?
            .iter()
            .enumerate()
            .map(|(i, name)| {
                if i == 0 {
                    name.trim_start_matches(UTF8_BOM).to_string()
                } else {
                    name.to_string()
                }
            })
            .collect();

        tracing::debug!(file = %path.display(), "Opened source file");

        Ok(Self {
            headers,
            records: reader.into_records(),
        })
    }

    fn row(&self, record: &csv::StringRecord) -> RawRecord {
        self.headers
            .iter()
            .map(String::as_str)
            .zip(record.iter())
            .collect()
    }
}

impl Iterator for FileRows {
    type Item = Result<RawRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(file) = self.current.as_mut() {
                match file.records.next() {
                    Some(Ok(record)) => return Some(Ok(file.row(&record))),
                    Some(Err(e)) => {
                        if e.is_io_error() {
                            self.current = None;
                        }
                        return Some(Err(e.into()));
                    }
                    None => self.current = None,
                }
            }

            let path = self.files.next()?;
            match OpenFile::open(&path, self.encoding) {
                Ok(file) => self.current = Some(file),
                Err(e) => return Some(Err(e)),
            }
        }
    }
}
