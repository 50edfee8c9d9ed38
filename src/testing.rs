//! Helpers for tests that inspect conversion output.
//!
//! ```no_run
//! use tfshard::testing::*;
//! # fn main() -> anyhow::Result<()> {
//! let dir = tempfile::tempdir()?;
//! let csv = write_csv_fixture(dir.path(), "in.csv", "a\n1\n")?;
//! # let _ = csv;
//! let examples = read_shard_examples(dir.path().join("out_1.tfrecords"))?;
//! let first = feature_of(&examples[0], "a");
//! # let _ = first;
//! # Ok(())
//! # }
//! ```

use crate::io::tfrecord::read_records;
use crate::proto::Example;
use crate::record::FeatureValue;
use anyhow::{Context, Result};
use prost::Message;
use std::fs;
use std::path::{Path, PathBuf};

/// Read and decode every Example in one shard file.
///
/// # Errors
/// Fails on I/O errors, bad framing, or undecodable payloads.
pub fn read_shard_examples(path: impl AsRef<Path>) -> Result<Vec<Example>> {
    let path = path.as_ref();
    read_records(path)?
        .iter()
        .enumerate()
        .map(|(i, bytes)| {
            Example::decode(bytes.as_slice())
                .with_context(|| format!("decode Example #{} in {}", i, path.display()))
        })
        .collect()
}

/// Decoded value of `name` in `example`, or `None` when the feature is missing
/// from the map entirely.
#[must_use]
pub fn feature_of(example: &Example, name: &str) -> Option<FeatureValue> {
    example.feature(name).map(FeatureValue::from)
}

/// Write `contents` to `dir/name` and return the path.
///
/// # Errors
/// Fails if the file cannot be written.
pub fn write_csv_fixture(dir: impl AsRef<Path>, name: &str, contents: &str) -> Result<PathBuf> {
    let path = dir.as_ref().join(name);
    fs::write(&path, contents).with_context(|| format!("write {}", path.display()))?;
    Ok(path)
}

/// Sorted list of files in `dir` whose names start with `stem_`.
///
/// # Errors
/// Fails if the directory cannot be listed.
pub fn list_shards(dir: impl AsRef<Path>, stem: &str) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    let prefix = format!("{stem}_");
    let mut found = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("read_dir {}", dir.display()))? {
        let path = entry?.path();
        if path
            .file_name()
            .is_some_and(|n| n.to_string_lossy().starts_with(&prefix))
        {
            found.push(path);
        }
    }
    found.sort_by_key(|p| shard_index(p));
    Ok(found)
}

fn shard_index(path: &Path) -> u32 {
    path.file_stem()
        .and_then(|s| s.to_string_lossy().rsplit('_').next()?.parse().ok())
        .unwrap_or(0)
}
