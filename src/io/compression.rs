//! Transparent decompression for CSV sources.
//!
//! [`open_reader`] opens a file and, when it recognises a compressed format,
//! wraps the handle in the matching decoder. Detection checks the file
//! extension first and falls back to the leading magic bytes, so a gzip file
//! named `data.csv` is still read correctly.
//!
//! Each codec sits behind its own feature flag:
//! - **Gzip** (`.gz`) - `compression-gzip`
//! - **Zstd** (`.zst`) - `compression-zstd`
//! - **Bzip2** (`.bz2`) - `compression-bzip2`
//! - **Xz** (`.xz`) - `compression-xz`
//!
//! Formats whose feature is disabled are read as plain bytes.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

/// Compression formats recognised on input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Codec {
    Gzip,
    Zstd,
    Bzip2,
    Xz,
}

impl Codec {
    const ALL: [Codec; 4] = [Codec::Gzip, Codec::Zstd, Codec::Bzip2, Codec::Xz];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Codec::Gzip => "gzip",
            Codec::Zstd => "zstd",
            Codec::Bzip2 => "bzip2",
            Codec::Xz => "xz",
        }
    }

    fn extensions(self) -> &'static [&'static str] {
        match self {
            Codec::Gzip => &[".gz", ".gzip"],
            Codec::Zstd => &[".zst", ".zstd"],
            Codec::Bzip2 => &[".bz2", ".bzip2"],
            Codec::Xz => &[".xz"],
        }
    }

    fn magic(self) -> &'static [u8] {
        match self {
            Codec::Gzip => &[0x1f, 0x8b],
            Codec::Zstd => &[0x28, 0xb5, 0x2f, 0xfd],
            Codec::Bzip2 => b"BZh",
            Codec::Xz => &[0xfd, 0x37, 0x7a, 0x58, 0x5a, 0x00],
        }
    }

    /// Whether a decoder for this codec is compiled in.
    #[must_use]
    pub fn enabled(self) -> bool {
        match self {
            Codec::Gzip => cfg!(feature = "compression-gzip"),
            Codec::Zstd => cfg!(feature = "compression-zstd"),
            Codec::Bzip2 => cfg!(feature = "compression-bzip2"),
            Codec::Xz => cfg!(feature = "compression-xz"),
        }
    }

    /// Codec implied by the file name, if any. Case-insensitive.
    #[must_use]
    pub fn from_path(path: impl AsRef<Path>) -> Option<Codec> {
        let name = path.as_ref().to_string_lossy().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|c| c.extensions().iter().any(|ext| name.ends_with(ext)))
    }

    /// Codec whose signature starts `head`, if any.
    #[must_use]
    pub fn from_magic(head: &[u8]) -> Option<Codec> {
        Self::ALL.into_iter().find(|c| head.starts_with(c.magic()))
    }

    fn wrap(self, reader: Box<dyn Read>) -> Result<Box<dyn Read>> {
        match self {
            #[cfg(feature = "compression-gzip")]
            Codec::Gzip => Ok(Box::new(flate2::read::MultiGzDecoder::new(reader))),
            #[cfg(feature = "compression-zstd")]
            Codec::Zstd => Ok(Box::new(zstd::stream::read::Decoder::new(reader)?)),
            #[cfg(feature = "compression-bzip2")]
            Codec::Bzip2 => Ok(Box::new(bzip2::read::MultiBzDecoder::new(reader))),
            #[cfg(feature = "compression-xz")]
            Codec::Xz => Ok(Box::new(xz2::read::XzDecoder::new_multi_decoder(reader))),
            #[allow(unreachable_patterns)]
            _ => Ok(reader),
        }
    }
}

/// Wrap `reader` with a decoder chosen from `path_hint` or the stream's magic
/// bytes. Unrecognised (or disabled) formats pass through unchanged.
///
/// # Errors
/// Returns an error if peeking the stream or constructing the decoder fails.
pub fn decompress_reader<R: Read + 'static>(
    reader: R,
    path_hint: impl AsRef<Path>,
) -> Result<Box<dyn Read>> {
    let mut buffered = BufReader::new(reader);
    let codec = match Codec::from_path(&path_hint) {
        Some(c) => Some(c),
        None => {
            let head = buffered.fill_buf().context("peek stream header")?;
            Codec::from_magic(head)
        }
    };
    match codec.filter(|c| c.enabled()) {
        Some(c) => c
            .wrap(Box::new(buffered))
            .with_context(|| format!("wrap reader with {} codec", c.name())),
        None => Ok(Box::new(buffered)),
    }
}

/// Open `path` for reading, decompressing when the format is recognised.
///
/// # Errors
/// Returns an error if the file cannot be opened or the decoder cannot be set up.
pub fn open_reader(path: impl AsRef<Path>) -> Result<Box<dyn Read>> {
    let path = path.as_ref();
    let f = File::open(path).with_context(|| format!("open {}", path.display()))?;
    decompress_reader(f, path)
        .with_context(|| format!("setup decompression for {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_by_extension() {
        assert_eq!(Codec::from_path("a/b.csv.GZ"), Some(Codec::Gzip));
        assert_eq!(Codec::from_path("x.zst"), Some(Codec::Zstd));
        assert_eq!(Codec::from_path("x.csv.bz2"), Some(Codec::Bzip2));
        assert_eq!(Codec::from_path("x.xz"), Some(Codec::Xz));
        assert_eq!(Codec::from_path("x.csv"), None);
    }

    #[test]
    fn detects_by_magic() {
        assert_eq!(Codec::from_magic(&[0x1f, 0x8b, 0x08]), Some(Codec::Gzip));
        assert_eq!(Codec::from_magic(b"BZh91AY"), Some(Codec::Bzip2));
        assert_eq!(Codec::from_magic(b"id,name\n"), None);
        assert_eq!(Codec::from_magic(b""), None);
    }

    #[test]
    fn plain_bytes_pass_through() {
        let mut out = String::new();
        decompress_reader(std::io::Cursor::new(b"a,b\n1,2\n".to_vec()), "in.csv")
            .unwrap()
            .read_to_string(&mut out)
            .unwrap();
        assert_eq!(out, "a,b\n1,2\n");
    }

    #[cfg(feature = "compression-gzip")]
    #[test]
    fn gzip_detected_without_extension() {
        use flate2::Compression;
        use flate2::write::GzEncoder;
        use std::io::Write;

        let mut enc = GzEncoder::new(Vec::new(), Compression::default());
        enc.write_all(b"x\n1\n").unwrap();
        let gz = enc.finish().unwrap();

        let mut out = String::new();
        decompress_reader(std::io::Cursor::new(gz), "in.csv")
            .unwrap()
            .read_to_string(&mut out)
            .unwrap();
        assert_eq!(out, "x\n1\n");
    }
}
