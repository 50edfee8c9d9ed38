//! End-to-end driver: CSV rows -> typed records -> Example bytes -> shards.
//!
//! Processing is strictly sequential and order preserving. Rows with zero
//! cells are skipped without touching the shard writer. Any I/O error aborts
//! the run; shards already written are left in place.

use crate::config::ConversionConfig;
use crate::io::csv::CsvRowSource;
use crate::record::encode_row;
use crate::schema::Schema;
use crate::shard::{SealedShard, ShardWriter};
use anyhow::{Context, Result};
use log::{debug, info};
use std::path::{Path, PathBuf};

/// Counters and outputs of one conversion run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConversionSummary {
    /// Rows pulled from the source, including skipped ones.
    pub rows_read: u64,
    /// Rows skipped because they had no cells.
    pub rows_skipped: u64,
    pub records_written: u64,
    /// Every shard written, in index order.
    pub shards: Vec<SealedShard>,
}

impl ConversionSummary {
    #[must_use]
    pub fn shard_paths(&self) -> Vec<PathBuf> {
        self.shards.iter().map(|s| s.path.clone()).collect()
    }
}

/// Convert the CSV at `input` into shards derived from `output`.
///
/// The schema is resolved before the input is opened, so configuration
/// errors surface before any file is touched.
///
/// # Errors
/// Returns configuration errors, CSV open/parse errors, and shard I/O errors.
pub fn convert_csv(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionSummary> {
    let input = input.as_ref();
    let schema = config.schema().context("invalid conversion config")?;
    let rows = CsvRowSource::open(input, config.skip_header)?;
    let summary = write_rows(rows, output, &schema, config.filesize)
        .with_context(|| format!("convert {}", input.display()))?;
    info!(
        "Converted {} rows from {} into {} records across {} shard(s)",
        summary.rows_read,
        input.display(),
        summary.records_written,
        summary.shards.len()
    );
    Ok(summary)
}

/// Encode and write any fallible row stream.
///
/// # Errors
/// Returns the first row error or shard I/O error encountered.
pub fn write_rows<I, R>(
    rows: I,
    output: impl AsRef<Path>,
    schema: &Schema,
    max_shard_bytes: u64,
) -> Result<ConversionSummary>
where
    I: IntoIterator<Item = Result<R>>,
    R: AsRef<[String]>,
{
    let mut writer = ShardWriter::with_threshold(output, max_shard_bytes)?;
    let mut summary = ConversionSummary::default();

    for (i, row) in rows.into_iter().enumerate() {
        let row = row?;
        let row = row.as_ref();
        summary.rows_read += 1;
        if row.is_empty() {
            debug!("skipping empty row #{}", i + 1);
            summary.rows_skipped += 1;
            continue;
        }
        let record = encode_row(row, schema);
        writer
            .write(&record.serialize())
            .with_context(|| format!("write row #{}", i + 1))?;
        summary.records_written += 1;
    }

    summary.shards = writer.finish()?;
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_rows_do_not_reach_the_writer() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        let schema = Schema::builder(["a"]).integers(["a"]).build()?;
        let rows: Vec<Result<Vec<String>>> = vec![
            Ok(vec![]),
            Ok(vec!["1".into()]),
            Ok(vec![]),
            Ok(vec!["2".into()]),
        ];
        let summary = write_rows(rows, tmp.path().join("o.tfrecords"), &schema, 1)?;
        assert_eq!(summary.rows_read, 4);
        assert_eq!(summary.rows_skipped, 2);
        assert_eq!(summary.records_written, 2);
        // Every record overshoots the threshold, leaving a trailing empty shard.
        let indices: Vec<_> = summary.shards.iter().map(|s| s.index).collect();
        assert_eq!(indices, vec![1, 2, 3]);
        Ok(())
    }

    #[test]
    fn row_errors_abort() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        let schema = Schema::builder(["a"]).integers(["a"]).build()?;
        let rows: Vec<Result<Vec<String>>> =
            vec![Ok(vec!["1".into()]), Err(anyhow::anyhow!("disk gone"))];
        let err = write_rows(rows, tmp.path().join("o.tfrecords"), &schema, 1_000)
            .unwrap_err();
        assert!(format!("{err:#}").contains("disk gone"));
        Ok(())
    }
}
