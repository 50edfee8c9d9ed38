//! Conversion configuration.
//!
//! [`ConversionConfig`] is the full configuration surface consumed before any
//! row is processed. It deserializes from JSON:
//!
//! ```
//! use tfshard::config::ConversionConfig;
//!
//! let cfg = ConversionConfig::from_json_str(r#"{
//!     "header": ["id", "amount", "label"],
//!     "integers": ["id"],
//!     "floats": ["amount"],
//!     "categoricals": ["label"],
//!     "mappings": { "label": { "kind": "uppercase" } },
//!     "filesize": 1048576
//! }"#).unwrap();
//!
//! assert_eq!(cfg.filesize, 1_048_576);
//! let schema = cfg.schema().unwrap();
//! assert_eq!(schema.header().len(), 3);
//! ```
//!
//! Closure transforms cannot be written in JSON; add them with
//! [`ConversionConfig::with_transform`].

use crate::schema::Schema;
use crate::shard::DEFAULT_MAX_SHARD_BYTES;
use crate::transform::FieldTransform;
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConversionConfig {
    /// Ordered column names. Required.
    #[serde(alias = "headers")]
    pub header: Vec<String>,
    #[serde(default)]
    pub floats: BTreeSet<String>,
    #[serde(default)]
    pub integers: BTreeSet<String>,
    #[serde(default)]
    pub categoricals: BTreeSet<String>,
    /// Per-field transforms; identity for fields not listed.
    #[serde(default)]
    pub mappings: BTreeMap<String, FieldTransform>,
    /// Shard size threshold in bytes.
    #[serde(default = "default_filesize")]
    pub filesize: u64,
    /// Discard the first CSV row.
    #[serde(default = "default_skip_header")]
    pub skip_header: bool,
}

fn default_filesize() -> u64 {
    DEFAULT_MAX_SHARD_BYTES
}

fn default_skip_header() -> bool {
    true
}

impl ConversionConfig {
    /// Config with the given header and every other key at its default.
    pub fn new<I, S>(header: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            header: header.into_iter().map(Into::into).collect(),
            floats: BTreeSet::new(),
            integers: BTreeSet::new(),
            categoricals: BTreeSet::new(),
            mappings: BTreeMap::new(),
            filesize: DEFAULT_MAX_SHARD_BYTES,
            skip_header: true,
        }
    }

    /// # Errors
    /// Fails on malformed JSON, a missing `header` key, or an invalid header.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(json).context("parse conversion config")?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// # Errors
    /// Fails if the file cannot be read or does not hold a valid config.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        Self::from_json_str(&text).with_context(|| format!("load config {}", path.display()))
    }

    #[must_use]
    pub fn with_floats<I: IntoIterator<Item = S>, S: Into<String>>(mut self, names: I) -> Self {
        self.floats.extend(names.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn with_integers<I: IntoIterator<Item = S>, S: Into<String>>(mut self, names: I) -> Self {
        self.integers.extend(names.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn with_categoricals<I: IntoIterator<Item = S>, S: Into<String>>(
        mut self,
        names: I,
    ) -> Self {
        self.categoricals.extend(names.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn with_transform(mut self, field: impl Into<String>, transform: FieldTransform) -> Self {
        self.mappings.insert(field.into(), transform);
        self
    }

    #[must_use]
    pub fn with_filesize(mut self, bytes: u64) -> Self {
        self.filesize = bytes;
        self
    }

    #[must_use]
    pub fn with_skip_header(mut self, skip: bool) -> Self {
        self.skip_header = skip;
        self
    }

    /// Check the settings that must hold before any row is read.
    ///
    /// # Errors
    /// Fails when the header is empty.
    pub fn validate(&self) -> Result<()> {
        if self.header.is_empty() {
            bail!("config key `header` must list at least one column");
        }
        Ok(())
    }

    /// Resolve the schema described by this config.
    ///
    /// # Errors
    /// See [`ConversionConfig::validate`] and [`crate::schema::SchemaBuilder::build`].
    pub fn schema(&self) -> Result<Schema> {
        self.validate()?;
        let mut builder = Schema::builder(self.header.iter().cloned())
            .floats(self.floats.iter().cloned())
            .integers(self.integers.iter().cloned())
            .categoricals(self.categoricals.iter().cloned());
        for (field, transform) in &self.mappings {
            builder = builder.transform(field.clone(), transform.clone());
        }
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldKind;

    #[test]
    fn defaults_apply() {
        let cfg = ConversionConfig::from_json_str(r#"{"headers": ["a", "b"]}"#).unwrap();
        assert_eq!(cfg.header, vec!["a", "b"]);
        assert!(cfg.floats.is_empty() && cfg.integers.is_empty() && cfg.categoricals.is_empty());
        assert!(cfg.mappings.is_empty());
        assert_eq!(cfg.filesize, 100_000_000);
        assert!(cfg.skip_header);
        let schema = cfg.schema().unwrap();
        assert_eq!(schema.kind_of(0), FieldKind::Ignored);
    }

    #[test]
    fn missing_header_is_fatal() {
        let err = ConversionConfig::from_json_str(r#"{"floats": ["a"]}"#).unwrap_err();
        assert!(format!("{err:#}").contains("header"));
        assert!(ConversionConfig::from_json_str(r#"{"header": []}"#).is_err());
    }

    #[test]
    fn builder_methods_feed_schema() {
        let schema = ConversionConfig::new(["x", "y"])
            .with_floats(["x"])
            .with_categoricals(["y"])
            .with_transform("y", FieldTransform::Lowercase)
            .schema()
            .unwrap();
        assert_eq!(schema.kind_of_field("x"), FieldKind::Float);
        assert_eq!(schema.transforms().apply("y", "ABC").unwrap(), "abc");
    }
}
