//! TFRecord length-delimited framing.
//!
//! Each record on disk is
//!
//! ```text
//! u64 length (little endian)
//! u32 masked_crc32c(length bytes)
//! [u8; length] payload
//! u32 masked_crc32c(payload)
//! ```
//!
//! [`RecordWriter`] appends frames to any `Write`; [`RecordReader`] iterates
//! them back and verifies both checksums.

use anyhow::{Context, Result, bail};
use std::fs::File;
use std::io::{self, BufReader, ErrorKind, Read, Write};
use std::path::Path;

const MASK_DELTA: u32 = 0xa282_ead8;

/// Bytes of framing around each payload.
pub const FRAME_OVERHEAD: u64 = 8 + 4 + 4;

/// CRC32C (Castagnoli) with the TFRecord rotation mask applied.
#[inline]
#[must_use]
pub fn masked_crc32c(data: &[u8]) -> u32 {
    let crc = crc32c::crc32c(data);
    crc.rotate_right(15).wrapping_add(MASK_DELTA)
}

/// Writes framed records to an underlying sink.
pub struct RecordWriter<W: Write> {
    inner: W,
    records: u64,
    bytes: u64,
}

impl<W: Write> RecordWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            records: 0,
            bytes: 0,
        }
    }

    /// Frame and write one payload.
    ///
    /// # Errors
    /// Returns any I/O error from the sink.
    pub fn write_record(&mut self, payload: &[u8]) -> io::Result<()> {
        let len = (payload.len() as u64).to_le_bytes();
        self.inner.write_all(&len)?;
        self.inner.write_all(&masked_crc32c(&len).to_le_bytes())?;
        self.inner.write_all(payload)?;
        self.inner.write_all(&masked_crc32c(payload).to_le_bytes())?;
        self.records += 1;
        self.bytes += payload.len() as u64 + FRAME_OVERHEAD;
        Ok(())
    }

    /// # Errors
    /// Returns any I/O error from the sink.
    pub fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }

    /// Records written so far.
    #[must_use]
    pub fn records(&self) -> u64 {
        self.records
    }

    /// Framed bytes handed to the sink so far.
    #[must_use]
    pub fn bytes_written(&self) -> u64 {
        self.bytes
    }

    #[must_use]
    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

/// Iterates framed payloads from a source, verifying checksums.
pub struct RecordReader<R: Read> {
    inner: R,
    index: u64,
    done: bool,
}

impl<R: Read> RecordReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            index: 0,
            done: false,
        }
    }

    fn read_frame(&mut self) -> Result<Option<Vec<u8>>> {
        let mut len_buf = [0u8; 8];
        match read_exact_or_eof(&mut self.inner, &mut len_buf)
            .with_context(|| format!("read length of record #{}", self.index))?
        {
            Filled::Eof => return Ok(None),
            Filled::Partial => bail!("truncated length header at record #{}", self.index),
            Filled::Full => {}
        }

        let mut crc_buf = [0u8; 4];
        self.inner
            .read_exact(&mut crc_buf)
            .with_context(|| format!("read length checksum of record #{}", self.index))?;
        if u32::from_le_bytes(crc_buf) != masked_crc32c(&len_buf) {
            bail!("length checksum mismatch at record #{}", self.index);
        }

        let len = usize::try_from(u64::from_le_bytes(len_buf))
            .with_context(|| format!("record #{} length does not fit in memory", self.index))?;
        let mut payload = vec![0u8; len];
        self.inner
            .read_exact(&mut payload)
            .with_context(|| format!("read payload of record #{}", self.index))?;
        self.inner
            .read_exact(&mut crc_buf)
            .with_context(|| format!("read payload checksum of record #{}", self.index))?;
        if u32::from_le_bytes(crc_buf) != masked_crc32c(&payload) {
            bail!("payload checksum mismatch at record #{}", self.index);
        }

        self.index += 1;
        Ok(Some(payload))
    }
}

impl<R: Read> Iterator for RecordReader<R> {
    type Item = Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.read_frame() {
            Ok(Some(payload)) => Some(Ok(payload)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

enum Filled {
    Full,
    Partial,
    Eof,
}

/// Like `read_exact`, but a clean EOF before the first byte is not an error.
fn read_exact_or_eof<R: Read>(r: &mut R, buf: &mut [u8]) -> io::Result<Filled> {
    let mut filled = 0;
    while filled < buf.len() {
        match r.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(match filled {
        0 => Filled::Eof,
        n if n == buf.len() => Filled::Full,
        _ => Filled::Partial,
    })
}

/// Read every payload of a TFRecord file.
///
/// # Errors
/// Returns an error if the file cannot be opened or any frame is truncated or
/// fails its checksum.
pub fn read_records(path: impl AsRef<Path>) -> Result<Vec<Vec<u8>>> {
    let path = path.as_ref();
    let f = File::open(path).with_context(|| format!("open {}", path.display()))?;
    RecordReader::new(BufReader::new(f))
        .collect::<Result<Vec<_>>>()
        .with_context(|| format!("read records from {}", path.display()))
}
