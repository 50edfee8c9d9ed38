//! Size-bounded, index-numbered output shards.
//!
//! A [`ShardWriter`] owns exactly one open shard file at a time. Each write
//! frames the payload as a TFRecord, flushes, and checks the shard's on-disk
//! size; once that size exceeds the threshold the shard is sealed and the next
//! index is opened. The threshold is therefore advisory: a shard may overshoot
//! it by up to one record.
//!
//! Given an output path `out/train.tfrecords`, shards are written to
//! `out/train_1.tfrecords`, `out/train_2.tfrecords`, ... with no gaps.

use crate::io::tfrecord::RecordWriter;
use anyhow::{Context, Result};
use log::{info, trace, warn};
use std::fs::{File, create_dir_all};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

/// Default shard size threshold in bytes.
pub const DEFAULT_MAX_SHARD_BYTES: u64 = 100_000_000;

const DEFAULT_EXTENSION: &str = "tfrecords";

/// Maps a 1-based shard index to a file path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShardPathTemplate {
    dir: PathBuf,
    stem: String,
    extension: String,
}

impl ShardPathTemplate {
    /// Derive the template from the requested output path. The extension is
    /// kept; a path without one gets `tfrecords`.
    #[must_use]
    pub fn from_output(output: impl AsRef<Path>) -> Self {
        let output = output.as_ref();
        let dir = output.parent().map(Path::to_path_buf).unwrap_or_default();
        let stem = output
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let extension = output
            .extension()
            .map_or_else(|| DEFAULT_EXTENSION.to_string(), |e| e.to_string_lossy().into_owned());
        Self {
            dir,
            stem,
            extension,
        }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn path_for(&self, index: u32) -> PathBuf {
        self.dir
            .join(format!("{}_{}.{}", self.stem, index, self.extension))
    }
}

struct OpenShard {
    index: u32,
    path: PathBuf,
    writer: RecordWriter<BufWriter<File>>,
}

impl OpenShard {
    fn create(template: &ShardPathTemplate, index: u32) -> Result<Self> {
        let path = template.path_for(index);
        let f = File::create(&path).with_context(|| format!("create {}", path.display()))?;
        info!("Creating TFRecords file at {} ...", path.display());
        Ok(Self {
            index,
            path,
            writer: RecordWriter::new(BufWriter::new(f)),
        })
    }

    fn size_on_disk(&self) -> Result<u64> {
        let meta = self
            .writer
            .get_ref()
            .get_ref()
            .metadata()
            .with_context(|| format!("stat {}", self.path.display()))?;
        Ok(meta.len())
    }

    fn seal(mut self) -> Result<SealedShard> {
        self.writer
            .flush()
            .with_context(|| format!("flush {}", self.path.display()))?;
        let records = self.writer.records();
        let file = self
            .writer
            .into_inner()
            .into_inner()
            .map_err(|e| e.into_error())
            .with_context(|| format!("flush {}", self.path.display()))?;
        file.sync_all()
            .with_context(|| format!("sync {}", self.path.display()))?;
        let bytes = file
            .metadata()
            .with_context(|| format!("stat {}", self.path.display()))?
            .len();
        Ok(SealedShard {
            index: self.index,
            path: self.path,
            records,
            bytes,
        })
    }
}

/// A closed shard.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SealedShard {
    pub index: u32,
    pub path: PathBuf,
    pub records: u64,
    pub bytes: u64,
}

/// Writes framed records into rotating shard files.
///
/// Call [`ShardWriter::finish`] to close the last shard; dropping the writer
/// without finishing only flushes on a best-effort basis.
pub struct ShardWriter {
    template: ShardPathTemplate,
    max_bytes: u64,
    current: Option<OpenShard>,
    sealed: Vec<SealedShard>,
}

impl ShardWriter {
    /// Create the output directory if needed and open shard 1 with the default
    /// threshold.
    ///
    /// # Errors
    /// Returns an error if the directory or the first shard cannot be created.
    pub fn open(output: impl AsRef<Path>) -> Result<Self> {
        Self::with_threshold(output, DEFAULT_MAX_SHARD_BYTES)
    }

    /// Like [`ShardWriter::open`] with an explicit size threshold in bytes.
    ///
    /// # Errors
    /// Returns an error if the directory or the first shard cannot be created.
    pub fn with_threshold(output: impl AsRef<Path>, max_bytes: u64) -> Result<Self> {
        let template = ShardPathTemplate::from_output(output);
        if !template.dir().as_os_str().is_empty() {
            create_dir_all(template.dir())
                .with_context(|| format!("mkdir -p {}", template.dir().display()))?;
        }
        let first = OpenShard::create(&template, 1)?;
        Ok(Self {
            template,
            max_bytes,
            current: Some(first),
            sealed: Vec::new(),
        })
    }

    /// Append one serialized record, rotating afterwards if the shard has
    /// grown past the threshold.
    ///
    /// # Errors
    /// Returns an error on any write, flush, or file creation failure.
    pub fn write(&mut self, payload: &[u8]) -> Result<()> {
        let shard = self
            .current
            .as_mut()
            .context("shard writer is already finished")?;
        shard
            .writer
            .write_record(payload)
            .with_context(|| format!("write record to {}", shard.path.display()))?;
        shard
            .writer
            .flush()
            .with_context(|| format!("flush {}", shard.path.display()))?;
        let size = shard.size_on_disk()?;
        trace!(
            "{} is {} bytes after {} framed bytes",
            shard.path.display(),
            size,
            shard.writer.bytes_written()
        );

        if size > self.max_bytes {
            self.rotate()?;
        }
        Ok(())
    }

    fn rotate(&mut self) -> Result<()> {
        let Some(shard) = self.current.take() else {
            return Ok(());
        };
        let next = shard.index + 1;
        self.sealed.push(shard.seal()?);
        self.current = Some(OpenShard::create(&self.template, next)?);
        Ok(())
    }

    /// Index of the shard currently open for writing.
    #[must_use]
    pub fn current_index(&self) -> Option<u32> {
        self.current.as_ref().map(|s| s.index)
    }

    #[must_use]
    pub fn current_path(&self) -> Option<&Path> {
        self.current.as_ref().map(|s| s.path.as_path())
    }

    #[must_use]
    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Shards sealed so far, in index order.
    #[must_use]
    pub fn sealed(&self) -> &[SealedShard] {
        &self.sealed
    }

    /// Close the open shard (even if empty) and return every shard written.
    ///
    /// # Errors
    /// Returns an error if the final flush or sync fails.
    pub fn finish(mut self) -> Result<Vec<SealedShard>> {
        if let Some(shard) = self.current.take() {
            self.sealed.push(shard.seal()?);
        }
        Ok(std::mem::take(&mut self.sealed))
    }
}

impl Drop for ShardWriter {
    fn drop(&mut self) {
        if let Some(shard) = self.current.as_mut()
            && let Err(e) = shard.writer.flush()
        {
            warn!("flush {} on drop failed: {e}", shard.path.display());
        }
    }
}
