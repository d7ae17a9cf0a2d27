//! serde Deserializer reading from [`Value`]

use std::collections::{btree_map, BTreeMap};
use std::fmt;
use std::vec;

use serde::de::{
    self, DeserializeOwned, DeserializeSeed, Deserializer, EnumAccess, IntoDeserializer, MapAccess,
    SeqAccess, VariantAccess, Visitor,
};

use super::Value;
use crate::error::{Error, Result};

/// Convert a [`Value`] into any deserializable type.
pub fn from_value<T: DeserializeOwned>(value: Value) -> Result<T> {
    T::deserialize(ValueDeserializer::new(value))
}

/// Like [`from_value`], but numeric targets also accept decimal strings.
///
/// Used for payloads whose numbers were stringified to survive transports
/// that lose integer precision.
pub fn from_value_lenient<T: DeserializeOwned>(value: Value) -> Result<T> {
    T::deserialize(ValueDeserializer::lenient(value))
}

/// Deserializer over an owned [`Value`]
pub struct ValueDeserializer {
    value: Value,
    lenient_numbers: bool,
}

impl ValueDeserializer {
    /// Strict deserializer
    pub fn new(value: Value) -> Self {
        Self {
            value,
            lenient_numbers: false,
        }
    }

    /// Deserializer that parses strings for numeric targets
    pub fn lenient(value: Value) -> Self {
        Self {
            value,
            lenient_numbers: true,
        }
    }

    fn deserialize_number<'de, V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        if self.lenient_numbers {
            if let Value::String(s) = &self.value {
                let s = s.trim();
                return if let Ok(i) = s.parse::<i64>() {
                    visitor.visit_i64(i)
                } else if let Ok(u) = s.parse::<u64>() {
                    visitor.visit_u64(u)
                } else if let Ok(f) = s.parse::<f64>() {
                    visitor.visit_f64(f)
                } else {
                    Err(Error::invalid_type(format!(
                        "expected a number, got string {:?}",
                        s
                    )))
                };
            }
        }
        self.deserialize_any(visitor)
    }
}

impl<'de> IntoDeserializer<'de, Error> for Value {
    type Deserializer = ValueDeserializer;

    fn into_deserializer(self) -> ValueDeserializer {
        ValueDeserializer::new(self)
    }
}

macro_rules! forward_numbers {
    ($($method:ident)*) => {
        $(
            fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
                self.deserialize_number(visitor)
            }
        )*
    };
}

impl<'de> de::Deserializer<'de> for ValueDeserializer {
    type Error = Error;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        let lenient = self.lenient_numbers;
        match self.value {
            Value::Null => visitor.visit_unit(),
            Value::Bool(b) => visitor.visit_bool(b),
            Value::Int(i) => visitor.visit_i64(i),
            Value::Uint(u) => visitor.visit_u64(u),
            Value::Float(f) => visitor.visit_f64(f),
            Value::String(s) => visitor.visit_string(s),
            Value::Bytes(b) => visitor.visit_byte_buf(b),
            Value::Array(items) => visitor.visit_seq(SeqDeserializer::new(items, lenient)),
            Value::Object(fields) => visitor.visit_map(MapDeserializer::new(fields, lenient)),
        }
    }

    forward_numbers! {
        deserialize_i8 deserialize_i16 deserialize_i32 deserialize_i64 deserialize_i128
        deserialize_u8 deserialize_u16 deserialize_u32 deserialize_u64 deserialize_u128
        deserialize_f32 deserialize_f64
    }

    fn deserialize_bool<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        if self.lenient_numbers {
            if let Value::String(s) = &self.value {
                match s.as_str() {
                    "true" => return visitor.visit_bool(true),
                    "false" => return visitor.visit_bool(false),
                    _ => {}
                }
            }
        }
        self.deserialize_any(visitor)
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.value {
            Value::Bytes(bytes) => {
                let items = bytes.into_iter().map(|b| Value::Uint(b as u64)).collect();
                visitor.visit_seq(SeqDeserializer::new(items, self.lenient_numbers))
            }
            value => ValueDeserializer {
                value,
                lenient_numbers: self.lenient_numbers,
            }
            .deserialize_any(visitor),
        }
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.value {
            Value::Null => visitor.visit_none(),
            _ => visitor.visit_some(self),
        }
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        let lenient = self.lenient_numbers;
        match self.value {
            Value::String(variant) => visitor.visit_enum(EnumDeserializer {
                variant,
                value: None,
                lenient,
            }),
            Value::Object(fields) => {
                let mut iter = fields.into_iter();
                let (variant, value) = match (iter.next(), iter.next()) {
                    (Some(entry), None) => entry,
                    _ => {
                        return Err(Error::invalid_type(
                            "enum object must have exactly one entry",
                        ))
                    }
                };
                visitor.visit_enum(EnumDeserializer {
                    variant,
                    value: Some(value),
                    lenient,
                })
            }
            other => Err(Error::invalid_type(format!(
                "expected enum, got {}",
                other.type_name()
            ))),
        }
    }

    serde::forward_to_deserialize_any! {
        char str string bytes byte_buf unit unit_struct tuple
        tuple_struct map struct identifier ignored_any
    }
}

struct SeqDeserializer {
    iter: vec::IntoIter<Value>,
    lenient: bool,
}

impl SeqDeserializer {
    fn new(items: Vec<Value>, lenient: bool) -> Self {
        Self {
            iter: items.into_iter(),
            lenient,
        }
    }
}

impl<'de> SeqAccess<'de> for SeqDeserializer {
    type Error = Error;

    fn next_element_seed<T: DeserializeSeed<'de>>(&mut self, seed: T) -> Result<Option<T::Value>> {
        match self.iter.next() {
            Some(value) => seed
                .deserialize(ValueDeserializer {
                    value,
                    lenient_numbers: self.lenient,
                })
                .map(Some),
            None => Ok(None),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

struct MapDeserializer {
    iter: btree_map::IntoIter<String, Value>,
    value: Option<Value>,
    lenient: bool,
}

impl MapDeserializer {
    fn new(fields: BTreeMap<String, Value>, lenient: bool) -> Self {
        Self {
            iter: fields.into_iter(),
            value: None,
            lenient,
        }
    }
}

impl<'de> MapAccess<'de> for MapDeserializer {
    type Error = Error;

    fn next_key_seed<K: DeserializeSeed<'de>>(&mut self, seed: K) -> Result<Option<K::Value>> {
        match self.iter.next() {
            Some((key, value)) => {
                self.value = Some(value);
                // Keys are always strings; integer-keyed maps parse them back.
                seed.deserialize(ValueDeserializer::lenient(Value::String(key)))
                    .map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(&mut self, seed: V) -> Result<V::Value> {
        let value = self
            .value
            .take()
            .ok_or_else(|| Error::internal("map value requested before its key"))?;
        seed.deserialize(ValueDeserializer {
            value,
            lenient_numbers: self.lenient,
        })
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

struct EnumDeserializer {
    variant: String,
    value: Option<Value>,
    lenient: bool,
}

impl<'de> EnumAccess<'de> for EnumDeserializer {
    type Error = Error;
    type Variant = VariantDeserializer;

    fn variant_seed<V: DeserializeSeed<'de>>(self, seed: V) -> Result<(V::Value, Self::Variant)> {
        let variant = seed.deserialize(ValueDeserializer::new(Value::String(self.variant)))?;
        Ok((
            variant,
            VariantDeserializer {
                value: self.value,
                lenient: self.lenient,
            },
        ))
    }
}

struct VariantDeserializer {
    value: Option<Value>,
    lenient: bool,
}

impl VariantDeserializer {
    fn take(self, what: &str) -> Result<ValueDeserializer> {
        match self.value {
            Some(value) => Ok(ValueDeserializer {
                value,
                lenient_numbers: self.lenient,
            }),
            None => Err(Error::invalid_type(format!(
                "expected {}, got unit variant",
                what
            ))),
        }
    }
}

impl<'de> VariantAccess<'de> for VariantDeserializer {
    type Error = Error;

    fn unit_variant(self) -> Result<()> {
        match self.value {
            None | Some(Value::Null) => Ok(()),
            Some(other) => Err(Error::invalid_type(format!(
                "expected unit variant, got {}",
                other.type_name()
            ))),
        }
    }

    fn newtype_variant_seed<T: DeserializeSeed<'de>>(self, seed: T) -> Result<T::Value> {
        seed.deserialize(self.take("newtype variant")?)
    }

    fn tuple_variant<V: Visitor<'de>>(self, _len: usize, visitor: V) -> Result<V::Value> {
        de::Deserializer::deserialize_seq(self.take("tuple variant")?, visitor)
    }

    fn struct_variant<V: Visitor<'de>>(
        self,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        de::Deserializer::deserialize_map(self.take("struct variant")?, visitor)
    }
}

/// Visitor building a [`Value`] from any self-describing format
pub(crate) struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("any value")
    }

    fn visit_bool<E>(self, v: bool) -> std::result::Result<Value, E> {
        Ok(Value::Bool(v))
    }

    fn visit_i64<E>(self, v: i64) -> std::result::Result<Value, E> {
        Ok(Value::Int(v))
    }

    fn visit_u64<E>(self, v: u64) -> std::result::Result<Value, E> {
        Ok(Value::Uint(v))
    }

    fn visit_i128<E: de::Error>(self, v: i128) -> std::result::Result<Value, E> {
        if let Ok(i) = i64::try_from(v) {
            Ok(Value::Int(i))
        } else if let Ok(u) = u64::try_from(v) {
            Ok(Value::Uint(u))
        } else {
            Err(E::custom(format!("integer {} out of range", v)))
        }
    }

    fn visit_u128<E: de::Error>(self, v: u128) -> std::result::Result<Value, E> {
        u64::try_from(v)
            .map(Value::Uint)
            .map_err(|_| E::custom(format!("integer {} out of range", v)))
    }

    fn visit_f64<E>(self, v: f64) -> std::result::Result<Value, E> {
        Ok(Value::Float(v))
    }

    fn visit_str<E>(self, v: &str) -> std::result::Result<Value, E> {
        Ok(Value::String(v.to_string()))
    }

    fn visit_string<E>(self, v: String) -> std::result::Result<Value, E> {
        Ok(Value::String(v))
    }

    fn visit_bytes<E>(self, v: &[u8]) -> std::result::Result<Value, E> {
        Ok(Value::Bytes(v.to_vec()))
    }

    fn visit_byte_buf<E>(self, v: Vec<u8>) -> std::result::Result<Value, E> {
        Ok(Value::Bytes(v))
    }

    fn visit_none<E>(self) -> std::result::Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_some<D: de::Deserializer<'de>>(
        self,
        deserializer: D,
    ) -> std::result::Result<Value, D::Error> {
        de::Deserialize::deserialize(deserializer)
    }

    fn visit_unit<E>(self) -> std::result::Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_newtype_struct<D: de::Deserializer<'de>>(
        self,
        deserializer: D,
    ) -> std::result::Result<Value, D::Error> {
        de::Deserialize::deserialize(deserializer)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> std::result::Result<Value, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(Value::Array(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<Value, A::Error> {
        let mut fields = BTreeMap::new();
        while let Some((key, value)) = map.next_entry::<String, Value>()? {
            fields.insert(key, value);
        }
        Ok(Value::Object(fields))
    }
}
