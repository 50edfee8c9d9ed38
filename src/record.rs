//! Row encoding: raw CSV cells to a typed, schema-ordered record.
//!
//! [`encode_row`] never fails. A value that cannot be coerced to its column's
//! declared kind, or whose transform errors, becomes [`FeatureValue::Absent`];
//! the rest of the row is still encoded.

use crate::schema::{FieldKind, Schema};
use log::debug;
use std::borrow::Cow;
use std::collections::BTreeMap;

/// A single coerced cell.
///
/// `Absent` is kept distinct from a parsed zero so a failed parse is never
/// mistaken for a real value.
#[derive(Clone, Debug, PartialEq)]
pub enum FeatureValue {
    Float(f32),
    Int64(i64),
    Bytes(Vec<u8>),
    Absent,
}

impl FeatureValue {
    #[must_use]
    pub fn is_absent(&self) -> bool {
        matches!(self, FeatureValue::Absent)
    }

    #[must_use]
    pub fn as_float(&self) -> Option<f32> {
        match self {
            FeatureValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_int64(&self) -> Option<i64> {
        match self {
            FeatureValue::Int64(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            FeatureValue::Bytes(v) => Some(v),
            _ => None,
        }
    }
}

/// Field name to coerced value for one row. Ignored columns are not present.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TypedRecord {
    pub(crate) features: BTreeMap<String, FeatureValue>,
}

impl TypedRecord {
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&FeatureValue> {
        self.features.get(field)
    }

    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.features.contains_key(field)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.features.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Iterate fields in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FeatureValue)> {
        self.features.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub(crate) fn insert(&mut self, field: &str, value: FeatureValue) {
        self.features.insert(field.to_string(), value);
    }
}

/// Encode one raw row against `schema`.
///
/// Cells are matched to header fields by position. When the row is shorter
/// than the header the missing cells read as empty; extra cells are ignored.
pub fn encode_row<S: AsRef<str>>(row: &[S], schema: &Schema) -> TypedRecord {
    if row.len() != schema.len() {
        debug!(
            "row has {} cells but schema has {} columns",
            row.len(),
            schema.len()
        );
    }

    let mut record = TypedRecord::default();
    for (index, (name, kind)) in schema.fields().enumerate() {
        if kind == FieldKind::Ignored {
            continue;
        }
        let raw: &str = row.get(index).map_or("", |cell| cell.as_ref());
        record.insert(name, encode_value(name, kind, raw, schema));
    }
    record
}

fn encode_value(name: &str, kind: FieldKind, raw: &str, schema: &Schema) -> FeatureValue {
    let transforms = schema.transforms();
    match kind {
        FieldKind::Float => transforms
            .apply(name, raw)
            .ok()
            .and_then(|v| parse_float(&v))
            .map_or(FeatureValue::Absent, FeatureValue::Float),
        FieldKind::Integer => transforms
            .apply(name, raw)
            .ok()
            .and_then(|v| parse_int(&v))
            .map_or(FeatureValue::Absent, FeatureValue::Int64),
        FieldKind::Categorical => {
            if raw.is_empty() {
                return FeatureValue::Absent;
            }
            match transforms.apply(name, raw) {
                Ok(v) if !v.is_empty() => FeatureValue::Bytes(v.into_bytes()),
                _ => FeatureValue::Absent,
            }
        }
        FieldKind::Ignored => FeatureValue::Absent,
    }
}

/// Parse a float, tolerating surrounding whitespace and digit-group
/// underscores. Values outside the `f32` range saturate to infinity.
fn parse_float(value: &str) -> Option<f32> {
    strip_digit_separators(value.trim())?
        .parse::<f64>()
        .ok()
        .map(|v| v as f32)
}

fn parse_int(value: &str) -> Option<i64> {
    strip_digit_separators(value.trim())?.parse::<i64>().ok()
}

/// Drop `_` separators that sit between two ASCII digits (`1_000`). Any other
/// underscore makes the value unparseable.
fn strip_digit_separators(value: &str) -> Option<Cow<'_, str>> {
    if !value.contains('_') {
        return Some(Cow::Borrowed(value));
    }
    let bytes = value.as_bytes();
    let mut out = String::with_capacity(value.len());
    for (i, ch) in value.char_indices() {
        if ch == '_' {
            let before = i > 0 && bytes[i - 1].is_ascii_digit();
            let after = bytes.get(i + 1).is_some_and(u8::is_ascii_digit);
            if !(before && after) {
                return None;
            }
        } else {
            out.push(ch);
        }
    }
    Some(Cow::Owned(out))
}
