//! `tf.train.Example` protobuf messages.
//!
//! Field tags match `tensorflow/core/example/{example,feature}.proto`, so the
//! encoded bytes are readable by any Example consumer. The feature map is a
//! `BTreeMap` to keep the encoding deterministic.

use crate::record::{FeatureValue, TypedRecord};
use prost::Message;
use std::collections::BTreeMap;

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct BytesList {
    #[prost(bytes = "vec", repeated, tag = "1")]
    pub value: Vec<Vec<u8>>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct FloatList {
    #[prost(float, repeated, tag = "1")]
    pub value: Vec<f32>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Int64List {
    #[prost(int64, repeated, tag = "1")]
    pub value: Vec<i64>,
}

#[derive(Clone, PartialEq, ::prost::Oneof)]
pub enum Kind {
    #[prost(message, tag = "1")]
    BytesList(BytesList),
    #[prost(message, tag = "2")]
    FloatList(FloatList),
    #[prost(message, tag = "3")]
    Int64List(Int64List),
}

/// One feature. `kind == None` is the empty feature written for absent values.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Feature {
    #[prost(oneof = "Kind", tags = "1, 2, 3")]
    pub kind: Option<Kind>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Features {
    #[prost(btree_map = "string, message", tag = "1")]
    pub feature: BTreeMap<String, Feature>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Example {
    #[prost(message, optional, tag = "1")]
    pub features: Option<Features>,
}

impl From<&FeatureValue> for Feature {
    fn from(value: &FeatureValue) -> Self {
        let kind = match value {
            FeatureValue::Float(v) => Some(Kind::FloatList(FloatList { value: vec![*v] })),
            FeatureValue::Int64(v) => Some(Kind::Int64List(Int64List { value: vec![*v] })),
            FeatureValue::Bytes(v) => Some(Kind::BytesList(BytesList {
                value: vec![v.clone()],
            })),
            FeatureValue::Absent => None,
        };
        Feature { kind }
    }
}

impl From<&Feature> for FeatureValue {
    /// Lists with more than one element keep only the first value.
    fn from(feature: &Feature) -> Self {
        match &feature.kind {
            Some(Kind::FloatList(l)) => l.value.first().map_or(Self::Absent, |v| Self::Float(*v)),
            Some(Kind::Int64List(l)) => l.value.first().map_or(Self::Absent, |v| Self::Int64(*v)),
            Some(Kind::BytesList(l)) => l
                .value
                .first()
                .map_or(Self::Absent, |v| Self::Bytes(v.clone())),
            None => Self::Absent,
        }
    }
}

impl TypedRecord {
    /// Build the Example message for this record.
    #[must_use]
    pub fn to_example(&self) -> Example {
        let feature = self
            .iter()
            .map(|(name, value)| (name.to_string(), Feature::from(value)))
            .collect();
        Example {
            features: Some(Features { feature }),
        }
    }

    /// Serialize this record as Example protobuf bytes.
    #[must_use]
    pub fn serialize(&self) -> Vec<u8> {
        self.to_example().encode_to_vec()
    }
}

impl Example {
    /// Look up a feature by name.
    #[must_use]
    pub fn feature(&self, name: &str) -> Option<&Feature> {
        self.features.as_ref()?.feature.get(name)
    }

    /// Convert back into a [`TypedRecord`].
    #[must_use]
    pub fn to_record(&self) -> TypedRecord {
        let mut record = TypedRecord::default();
        if let Some(features) = &self.features {
            for (name, feature) in &features.feature {
                record.insert(name, FeatureValue::from(feature));
            }
        }
        record
    }
}
