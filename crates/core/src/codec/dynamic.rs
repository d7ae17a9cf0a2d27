//! Dynamic value scheme (tag 3)
//!
//! The payload is first lowered into [`Value`], then wrapped in an explicitly
//! tagged mirror of it and marshaled with bincode. Unlike JSON, the tagging
//! keeps `Bytes`, `Int` and `Uint` distinct across the boundary, so a caller
//! that reads into a `Value` gets back exactly the shape the reader produced.

use std::fmt;

use bincode::Options;
use serde::de::{
    self, DeserializeOwned, DeserializeSeed, EnumAccess, SeqAccess, Unexpected, VariantAccess,
};
use serde::{Deserializer, Serialize};

use crate::error::Result;
use crate::value::{from_value, to_value, Value};

/// Deepest array/object nesting accepted from a peer
pub(super) const MAX_DEPTH: usize = 128;

/// Largest envelope payload accepted from a peer
const MAX_PAYLOAD: u64 = 16 * 1024 * 1024;

const VARIANTS: &[&str] = &[
    "Null", "Bool", "Int", "Uint", "Float", "String", "Bytes", "Array", "Object",
];

#[derive(Serialize)]
enum Tagged {
    Null,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    String(String),
    Bytes(Vec<u8>),
    Array(Vec<Tagged>),
    Object(Vec<(String, Tagged)>),
}

impl From<Value> for Tagged {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Tagged::Null,
            Value::Bool(b) => Tagged::Bool(b),
            Value::Int(i) => Tagged::Int(i),
            Value::Uint(u) => Tagged::Uint(u),
            Value::Float(f) => Tagged::Float(f),
            Value::String(s) => Tagged::String(s),
            Value::Bytes(b) => Tagged::Bytes(b),
            Value::Array(items) => Tagged::Array(items.into_iter().map(Tagged::from).collect()),
            Value::Object(fields) => Tagged::Object(
                fields
                    .into_iter()
                    .map(|(k, v)| (k, Tagged::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<Tagged> for Value {
    fn from(tagged: Tagged) -> Self {
        match tagged {
            Tagged::Null => Value::Null,
            Tagged::Bool(b) => Value::Bool(b),
            Tagged::Int(i) => Value::Int(i),
            Tagged::Uint(u) => Value::Uint(u),
            Tagged::Float(f) => Value::Float(f),
            Tagged::String(s) => Value::String(s),
            Tagged::Bytes(b) => Value::Bytes(b),
            Tagged::Array(items) => Value::Array(items.into_iter().map(Value::from).collect()),
            Tagged::Object(fields) => Value::Object(
                fields
                    .into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
        }
    }
}

// Decoding walks the tree through seeds that carry the current depth, so a
// hostile envelope fails with an error instead of exhausting the stack.

struct TaggedSeed {
    depth: usize,
}

impl<'de> DeserializeSeed<'de> for TaggedSeed {
    type Value = Tagged;

    fn deserialize<D: Deserializer<'de>>(
        self,
        deserializer: D,
    ) -> std::result::Result<Tagged, D::Error> {
        if self.depth > MAX_DEPTH {
            return Err(de::Error::custom(format!(
                "dynamic value nested deeper than {} levels",
                MAX_DEPTH
            )));
        }
        deserializer.deserialize_enum("Tagged", VARIANTS, self)
    }
}

impl<'de> de::Visitor<'de> for TaggedSeed {
    type Value = Tagged;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a tagged dynamic value")
    }

    fn visit_enum<A: EnumAccess<'de>>(self, data: A) -> std::result::Result<Tagged, A::Error> {
        let (index, variant): (u32, _) = data.variant()?;
        let inner = self.depth + 1;
        match index {
            0 => variant.unit_variant().map(|()| Tagged::Null),
            1 => variant.newtype_variant().map(Tagged::Bool),
            2 => variant.newtype_variant().map(Tagged::Int),
            3 => variant.newtype_variant().map(Tagged::Uint),
            4 => variant.newtype_variant().map(Tagged::Float),
            5 => variant.newtype_variant().map(Tagged::String),
            6 => variant.newtype_variant().map(Tagged::Bytes),
            7 => variant
                .newtype_variant_seed(ItemsSeed { depth: inner })
                .map(Tagged::Array),
            8 => variant
                .newtype_variant_seed(FieldsSeed { depth: inner })
                .map(Tagged::Object),
            other => Err(de::Error::invalid_value(
                Unexpected::Unsigned(u64::from(other)),
                &"variant index 0 <= i < 9",
            )),
        }
    }
}

fn capacity<'de, A: SeqAccess<'de>>(seq: &A) -> usize {
    seq.size_hint().unwrap_or(0).min(1024)
}

struct ItemsSeed {
    depth: usize,
}

impl<'de> DeserializeSeed<'de> for ItemsSeed {
    type Value = Vec<Tagged>;

    fn deserialize<D: Deserializer<'de>>(
        self,
        deserializer: D,
    ) -> std::result::Result<Vec<Tagged>, D::Error> {
        deserializer.deserialize_seq(self)
    }
}

impl<'de> de::Visitor<'de> for ItemsSeed {
    type Value = Vec<Tagged>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a sequence of dynamic values")
    }

    fn visit_seq<A: SeqAccess<'de>>(
        self,
        mut seq: A,
    ) -> std::result::Result<Vec<Tagged>, A::Error> {
        let mut items = Vec::with_capacity(capacity(&seq));
        while let Some(item) = seq.next_element_seed(TaggedSeed { depth: self.depth })? {
            items.push(item);
        }
        Ok(items)
    }
}

struct FieldsSeed {
    depth: usize,
}

impl<'de> DeserializeSeed<'de> for FieldsSeed {
    type Value = Vec<(String, Tagged)>;

    fn deserialize<D: Deserializer<'de>>(
        self,
        deserializer: D,
    ) -> std::result::Result<Self::Value, D::Error> {
        deserializer.deserialize_seq(self)
    }
}

impl<'de> de::Visitor<'de> for FieldsSeed {
    type Value = Vec<(String, Tagged)>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a sequence of named dynamic values")
    }

    fn visit_seq<A: SeqAccess<'de>>(
        self,
        mut seq: A,
    ) -> std::result::Result<Self::Value, A::Error> {
        let mut fields = Vec::with_capacity(capacity(&seq));
        while let Some(field) = seq.next_element_seed(FieldSeed { depth: self.depth })? {
            fields.push(field);
        }
        Ok(fields)
    }
}

struct FieldSeed {
    depth: usize,
}

impl<'de> DeserializeSeed<'de> for FieldSeed {
    type Value = (String, Tagged);

    fn deserialize<D: Deserializer<'de>>(
        self,
        deserializer: D,
    ) -> std::result::Result<Self::Value, D::Error> {
        deserializer.deserialize_tuple(2, self)
    }
}

impl<'de> de::Visitor<'de> for FieldSeed {
    type Value = (String, Tagged);

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a field name and dynamic value")
    }

    fn visit_seq<A: SeqAccess<'de>>(
        self,
        mut seq: A,
    ) -> std::result::Result<Self::Value, A::Error> {
        let name: String = seq
            .next_element()?
            .ok_or_else(|| de::Error::invalid_length(0, &self))?;
        let value = seq
            .next_element_seed(TaggedSeed { depth: self.depth })?
            .ok_or_else(|| de::Error::invalid_length(1, &self))?;
        Ok((name, value))
    }
}

fn options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_limit(MAX_PAYLOAD)
}

pub(super) fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    let tagged = Tagged::from(to_value(value)?);
    Ok(options().serialize(&tagged)?)
}

pub(super) fn decode<T: DeserializeOwned>(data: &[u8]) -> Result<T> {
    let tagged = options().deserialize_seed(TaggedSeed { depth: 0 }, data)?;
    from_value(Value::from(tagged))
}
