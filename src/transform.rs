//! Per-field value transforms applied to raw CSV text before type coercion.
//!
//! A [`FieldTransform`] is a pure `&str -> String` function. The built-in
//! variants are serde-deserializable so they can live in a JSON config; the
//! [`FieldTransform::Custom`] variant wraps an arbitrary closure and is only
//! available programmatically.
//!
//! A transform may fail (for example a [`FieldTransform::Lookup`] miss with no
//! default). Callers in the encoder turn that failure into an absent feature.
//!
//! ```
//! use tfshard::transform::{FieldTransform, TransformRegistry};
//!
//! let mut reg = TransformRegistry::default();
//! reg.insert("label", FieldTransform::Uppercase);
//! assert_eq!(reg.apply("label", "cat").unwrap(), "CAT");
//! assert_eq!(reg.apply("other", "cat").unwrap(), "cat");
//! ```

use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

/// Signature of a user-supplied transform closure.
pub type TransformFn = dyn Fn(&str) -> Result<String> + Send + Sync;

/// A unary text transform registered for one field.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldTransform {
    /// Return the input unchanged.
    Identity,
    /// Unicode uppercase.
    Uppercase,
    /// Unicode lowercase.
    Lowercase,
    /// Strip leading and trailing whitespace.
    Trim,
    /// Replace every occurrence of `from` with `to`.
    Replace { from: String, to: String },
    /// Look the value up in `table`. A miss yields `default` when set, and an
    /// error otherwise.
    Lookup {
        table: BTreeMap<String, String>,
        #[serde(default)]
        default: Option<String>,
    },
    /// Arbitrary closure. Not representable in config files.
    #[serde(skip)]
    Custom(Arc<TransformFn>),
}

impl FieldTransform {
    /// Wrap a closure as a transform.
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&str) -> Result<String> + Send + Sync + 'static,
    {
        FieldTransform::Custom(Arc::new(f))
    }

    /// Apply the transform to `value`.
    ///
    /// # Errors
    /// Returns an error when a lookup misses without a default, or when a
    /// custom closure fails.
    pub fn apply(&self, value: &str) -> Result<String> {
        match self {
            FieldTransform::Identity => Ok(value.to_string()),
            FieldTransform::Uppercase => Ok(value.to_uppercase()),
            FieldTransform::Lowercase => Ok(value.to_lowercase()),
            FieldTransform::Trim => Ok(value.trim().to_string()),
            FieldTransform::Replace { from, to } => {
                if from.is_empty() {
                    Ok(value.to_string())
                } else {
                    Ok(value.replace(from.as_str(), to))
                }
            }
            FieldTransform::Lookup { table, default } => table
                .get(value)
                .or(default.as_ref())
                .cloned()
                .ok_or_else(|| anyhow!("no mapping for value {value:?}")),
            FieldTransform::Custom(f) => f(value),
        }
    }
}

impl fmt::Debug for FieldTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldTransform::Identity => f.write_str("Identity"),
            FieldTransform::Uppercase => f.write_str("Uppercase"),
            FieldTransform::Lowercase => f.write_str("Lowercase"),
            FieldTransform::Trim => f.write_str("Trim"),
            FieldTransform::Replace { from, to } => f
                .debug_struct("Replace")
                .field("from", from)
                .field("to", to)
                .finish(),
            FieldTransform::Lookup { table, default } => f
                .debug_struct("Lookup")
                .field("entries", &table.len())
                .field("default", default)
                .finish(),
            FieldTransform::Custom(_) => f.write_str("Custom(<fn>)"),
        }
    }
}

/// Field name to transform. Fields without an entry use identity.
#[derive(Clone, Debug, Default)]
pub struct TransformRegistry {
    by_field: HashMap<String, FieldTransform>,
}

impl TransformRegistry {
    /// Register (or replace) the transform for `field`.
    pub fn insert(&mut self, field: impl Into<String>, transform: FieldTransform) {
        self.by_field.insert(field.into(), transform);
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&FieldTransform> {
        self.by_field.get(field)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_field.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_field.is_empty()
    }

    /// Apply the transform registered for `field`, or return `value` unchanged.
    ///
    /// # Errors
    /// Propagates the registered transform's error.
    pub fn apply(&self, field: &str, value: &str) -> Result<String> {
        match self.by_field.get(field) {
            Some(t) => t.apply(value),
            None => Ok(value.to_string()),
        }
    }
}

impl FromIterator<(String, FieldTransform)> for TransformRegistry {
    fn from_iter<I: IntoIterator<Item = (String, FieldTransform)>>(iter: I) -> Self {
        Self {
            by_field: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_apply() {
        assert_eq!(FieldTransform::Identity.apply("aB").unwrap(), "aB");
        assert_eq!(FieldTransform::Uppercase.apply("aB").unwrap(), "AB");
        assert_eq!(FieldTransform::Lowercase.apply("aB").unwrap(), "ab");
        assert_eq!(FieldTransform::Trim.apply("  x ").unwrap(), "x");
        let r = FieldTransform::Replace {
            from: ",".into(),
            to: ".".into(),
        };
        assert_eq!(r.apply("3,5").unwrap(), "3.5");
    }

    #[test]
    fn lookup_miss_without_default_fails() {
        let mut table = BTreeMap::new();
        table.insert("yes".to_string(), "1".to_string());
        let t = FieldTransform::Lookup {
            table: table.clone(),
            default: None,
        };
        assert_eq!(t.apply("yes").unwrap(), "1");
        assert!(t.apply("maybe").is_err());

        let t = FieldTransform::Lookup {
            table,
            default: Some("0".into()),
        };
        assert_eq!(t.apply("maybe").unwrap(), "0");
    }

    #[test]
    fn custom_closure_errors_propagate() {
        let t = FieldTransform::custom(|v| {
            if v == "boom" {
                anyhow::bail!("refused")
            }
            Ok(format!("<{v}>"))
        });
        assert_eq!(t.apply("x").unwrap(), "<x>");
        assert!(t.apply("boom").is_err());
    }

    #[test]
    fn deserializes_tagged_variants() {
        let t: FieldTransform =
            serde_json::from_str(r#"{"kind":"replace","from":"-","to":""}"#).unwrap();
        assert_eq!(t.apply("1-2-3").unwrap(), "123");
        let t: FieldTransform = serde_json::from_str(r#"{"kind":"uppercase"}"#).unwrap();
        assert_eq!(t.apply("q").unwrap(), "Q");
    }
}
