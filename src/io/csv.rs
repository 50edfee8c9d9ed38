//! CSV row source.
//!
//! [`CsvRowSource`] streams raw string rows from a (possibly compressed) CSV
//! file without materialising it. Rows are not validated against a schema and
//! may have any number of cells; that is the encoder's concern.
//!
//! # Design notes
//! - The reader is `flexible`, so ragged rows are yielded rather than rejected.
//! - Blank lines never produce a row.
//! - The file handle lives as long as the iterator and is released when it is
//!   exhausted or dropped.

use crate::io::compression::open_reader;
use anyhow::{Context, Result};
use csv::{ReaderBuilder, StringRecordsIntoIter};
use std::io::Read;
use std::path::{Path, PathBuf};

/// Lazy iterator over the data rows of one CSV file.
pub struct CsvRowSource {
    path: PathBuf,
    records: StringRecordsIntoIter<Box<dyn Read>>,
    row: u64,
}

impl CsvRowSource {
    /// Open `path`. When `skip_header` is `true` the first parsed row is
    /// consumed and never yielded.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or its decompressor set up.
    pub fn open(path: impl AsRef<Path>, skip_header: bool) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let reader = open_reader(&path)?;
        Ok(Self::from_reader(reader, skip_header, path))
    }

    /// Build a source over an already-open stream. `path` is only used in
    /// error messages.
    pub fn from_reader(reader: Box<dyn Read>, skip_header: bool, path: impl Into<PathBuf>) -> Self {
        let records = ReaderBuilder::new()
            .has_headers(skip_header)
            .flexible(true)
            .from_reader(reader)
            .into_records();
        Self {
            path: path.into(),
            records,
            row: 0,
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Iterator for CsvRowSource {
    type Item = Result<Vec<String>>;

    fn next(&mut self) -> Option<Self::Item> {
        let rec = self.records.next()?;
        self.row += 1;
        Some(
            rec.map(|r| r.iter().map(str::to_string).collect())
                .with_context(|| format!("parse CSV row #{} in {}", self.row, self.path.display())),
        )
    }
}

/// Read all data rows of a CSV file into memory.
///
/// # Errors
/// Returns an error if the file cannot be opened or any row fails to parse.
pub fn read_rows(path: impl AsRef<Path>, skip_header: bool) -> Result<Vec<Vec<String>>> {
    CsvRowSource::open(path, skip_header)?.collect()
}
