//! Column layout and per-field classification.
//!
//! A [`Schema`] is built from the ordered header plus three (possibly
//! overlapping) sets of field names. Each header field resolves to exactly one
//! [`FieldKind`] at build time with the precedence
//! `Float > Integer > Categorical`; fields in none of the sets are
//! [`FieldKind::Ignored`] and never reach the output.
//!
//! ```
//! use tfshard::schema::{FieldKind, Schema};
//!
//! let schema = Schema::builder(["id", "amount", "label", "note"])
//!     .integers(["id"])
//!     .floats(["amount"])
//!     .categoricals(["label"])
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(schema.kind_of(1), FieldKind::Float);
//! assert_eq!(schema.kind_of(3), FieldKind::Ignored);
//! ```

use crate::transform::{FieldTransform, TransformRegistry};
use anyhow::{Result, bail};
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// How a single column is coerced before serialization.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Parsed as a floating point number, stored in a float list.
    Float,
    /// Parsed as a signed 64-bit integer, stored in an int64 list.
    Integer,
    /// Stored verbatim as a byte string.
    Categorical,
    /// Dropped from the output record.
    Ignored,
}

/// Fixed schema for one conversion run.
#[derive(Clone, Debug)]
pub struct Schema {
    header: Vec<String>,
    kinds: Vec<FieldKind>,
    transforms: TransformRegistry,
    overlaps: Vec<String>,
}

impl Schema {
    /// Start building a schema from the ordered column names.
    pub fn builder<I, S>(header: I) -> SchemaBuilder
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        SchemaBuilder {
            header: header.into_iter().map(Into::into).collect(),
            floats: HashSet::new(),
            integers: HashSet::new(),
            categoricals: HashSet::new(),
            transforms: TransformRegistry::default(),
        }
    }

    /// Ordered column names.
    #[must_use]
    pub fn header(&self) -> &[String] {
        &self.header
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.header.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.header.is_empty()
    }

    /// Resolved kind of the column at `index`; out-of-range indices are ignored.
    #[must_use]
    pub fn kind_of(&self, index: usize) -> FieldKind {
        self.kinds.get(index).copied().unwrap_or(FieldKind::Ignored)
    }

    /// Resolved kind of the column named `field`.
    #[must_use]
    pub fn kind_of_field(&self, field: &str) -> FieldKind {
        self.header
            .iter()
            .position(|h| h == field)
            .map_or(FieldKind::Ignored, |i| self.kind_of(i))
    }

    /// Iterate `(name, kind)` pairs in header order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, FieldKind)> {
        self.header
            .iter()
            .map(String::as_str)
            .zip(self.kinds.iter().copied())
    }

    #[must_use]
    pub fn transforms(&self) -> &TransformRegistry {
        &self.transforms
    }

    /// Transform registered for `field`, if any. `None` means identity.
    #[must_use]
    pub fn transform_for(&self, field: &str) -> Option<&FieldTransform> {
        self.transforms.get(field)
    }

    /// Fields that were listed in more than one classification set.
    #[must_use]
    pub fn overlaps(&self) -> &[String] {
        &self.overlaps
    }
}

/// Builder for [`Schema`]; see [`Schema::builder`].
#[derive(Clone, Debug)]
pub struct SchemaBuilder {
    header: Vec<String>,
    floats: HashSet<String>,
    integers: HashSet<String>,
    categoricals: HashSet<String>,
    transforms: TransformRegistry,
}

impl SchemaBuilder {
    #[must_use]
    pub fn floats<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.floats.extend(names.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn integers<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.integers.extend(names.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn categoricals<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categoricals.extend(names.into_iter().map(Into::into));
        self
    }

    /// Register a transform for `field`, replacing any previous one.
    #[must_use]
    pub fn transform(mut self, field: impl Into<String>, transform: FieldTransform) -> Self {
        self.transforms.insert(field, transform);
        self
    }

    /// Replace the whole transform registry.
    #[must_use]
    pub fn transforms(mut self, transforms: TransformRegistry) -> Self {
        self.transforms = transforms;
        self
    }

    /// Resolve every header field to a single [`FieldKind`].
    ///
    /// # Errors
    /// Fails when the header is empty or names a column twice.
    pub fn build(self) -> Result<Schema> {
        if self.header.is_empty() {
            bail!("schema header must name at least one column");
        }
        let mut seen = HashSet::with_capacity(self.header.len());
        for name in &self.header {
            if !seen.insert(name.as_str()) {
                bail!("duplicate column {name:?} in schema header");
            }
        }

        let mut overlaps = Vec::new();
        let kinds = self
            .header
            .iter()
            .map(|name| {
                let memberships = [
                    self.floats.contains(name),
                    self.integers.contains(name),
                    self.categoricals.contains(name),
                ];
                let kind = match memberships {
                    [true, _, _] => FieldKind::Float,
                    [false, true, _] => FieldKind::Integer,
                    [false, false, true] => FieldKind::Categorical,
                    _ => FieldKind::Ignored,
                };
                if memberships.iter().filter(|m| **m).count() > 1 {
                    warn!("field {name:?} is listed in several type sets; using {kind:?}");
                    overlaps.push(name.clone());
                }
                kind
            })
            .collect::<Vec<_>>();

        Ok(Schema {
            header: self.header,
            kinds,
            transforms: self.transforms,
            overlaps,
        })
    }
}
