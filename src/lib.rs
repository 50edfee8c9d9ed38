//! # tfshard
//!
//! Convert CSV tables into **size-bounded shards of TFRecord files** holding
//! `tf.train.Example` protobufs, so that training pipelines can stream
//! fixed-schema examples without loading the dataset into memory.
//!
//! ## Key Features
//!
//! - **Streaming** - rows are read, encoded, and written one at a time
//! - **Typed coercion** - each column is a float, int64, categorical (bytes), or ignored
//! - **Per-field transforms** - remap raw text before coercion (built-in or closures)
//! - **Tolerant** - a malformed value becomes an empty feature instead of failing the row
//! - **Sharded output** - files rotate once they pass a byte threshold, numbered `_1`, `_2`, ...
//! - **Compressed input** - gzip, zstd, bzip2, and xz CSVs are decoded transparently
//!
//! ## Quick Start
//!
//! ```no_run
//! use tfshard::*;
//! # use anyhow::Result;
//!
//! # fn main() -> Result<()> {
//! let config = ConversionConfig::new(["id", "amount", "label"])
//!     .with_integers(["id"])
//!     .with_floats(["amount"])
//!     .with_categoricals(["label"])
//!     .with_transform("label", FieldTransform::Uppercase)
//!     .with_filesize(64 * 1024 * 1024);
//!
//! let summary = convert_csv("data/train.csv", "out/train.tfrecords", &config)?;
//! for shard in &summary.shards {
//!     println!("{} ({} records)", shard.path.display(), shard.records);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Core Concepts
//!
//! ### Schema
//!
//! A [`Schema`] is the ordered header plus a classification of each column.
//! Columns listed in several type sets resolve with the precedence
//! `float > integer > categorical`; columns in none are dropped.
//!
//! ### Typed records
//!
//! [`encode_row`] turns one row into a [`TypedRecord`] of [`FeatureValue`]s.
//! [`FeatureValue::Absent`] marks a value that was missing or failed to parse,
//! and is written as an empty feature, never as zero.
//!
//! ### Shards
//!
//! A [`ShardWriter`] owns one open file at a time. After each write it checks
//! the file size and, once the threshold is exceeded, seals the shard and opens
//! the next index. The threshold may be overshot by at most one record.
//!
//! ## Module Overview
//!
//! - [`io`] - CSV row source, input decompression, TFRecord framing
//! - [`schema`] - column classification
//! - [`transform`] - per-field value transforms
//! - [`record`] - row encoder
//! - [`proto`] - Example protobuf messages
//! - [`shard`] - rotating shard writer
//! - [`config`] - serde-backed configuration
//! - [`convert`] - the end-to-end driver
//! - [`testing`] - helpers for inspecting output in tests

pub mod config;
pub mod convert;
pub mod io;
pub mod proto;
pub mod record;
pub mod schema;
pub mod shard;
pub mod testing;
pub mod transform;

pub use config::ConversionConfig;
pub use convert::{ConversionSummary, convert_csv, write_rows};
pub use io::csv::{CsvRowSource, read_rows};
pub use io::tfrecord::{RecordReader, RecordWriter, read_records};
pub use proto::Example;
pub use record::{FeatureValue, TypedRecord, encode_row};
pub use schema::{FieldKind, Schema, SchemaBuilder};
pub use shard::{DEFAULT_MAX_SHARD_BYTES, SealedShard, ShardPathTemplate, ShardWriter};
pub use transform::{FieldTransform, TransformRegistry};
