//! Runtime type descriptors
//!
//! The protocol decodes payloads whose concrete type is only known per call.
//! A [`TypeDescriptor`] is that per-call type: a chain implementation hands
//! one out (through a [`TypeProvider`](crate::traits::TypeProvider)) for each
//! read or key, and the server conforms decoded values to it before they
//! reach the chain code.
//!
//! Conforming coerces what the transport may have changed (stringified
//! numbers, byte arrays rendered as integer lists) and rejects what no
//! encoding could have produced (missing struct fields, scalars where a
//! sequence is required, fixed arrays of the wrong length).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::value::Value;

/// Field of a [`TypeDescriptor::Struct`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Field name
    pub name: String,
    /// Field type
    pub ty: TypeDescriptor,
}

impl FieldDescriptor {
    /// Create a field descriptor
    pub fn new(name: impl Into<String>, ty: TypeDescriptor) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// Shape a decoded value must conform to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TypeDescriptor {
    /// Any value, passed through untouched
    Any,
    /// Boolean
    Bool,
    /// Signed integer
    Int,
    /// Unsigned integer
    Uint,
    /// Floating point
    Float,
    /// UTF-8 string
    String,
    /// Raw bytes
    Bytes,
    /// Variable-length sequence
    List(Box<TypeDescriptor>),
    /// Fixed-length sequence
    Array(Box<TypeDescriptor>, usize),
    /// String-keyed map with uniform values
    Map(Box<TypeDescriptor>),
    /// Struct with named fields
    Struct(Vec<FieldDescriptor>),
    /// Value that may be null
    Optional(Box<TypeDescriptor>),
}

impl Default for TypeDescriptor {
    fn default() -> Self {
        TypeDescriptor::Any
    }
}

impl TypeDescriptor {
    /// The generic string-keyed map used when a chain supplies no type.
    pub fn generic_map() -> Self {
        TypeDescriptor::Map(Box::new(TypeDescriptor::Any))
    }

    /// Shorthand for `List(elem)`
    pub fn list(elem: TypeDescriptor) -> Self {
        TypeDescriptor::List(Box::new(elem))
    }

    /// Shorthand for `Optional(inner)`
    pub fn optional(inner: TypeDescriptor) -> Self {
        TypeDescriptor::Optional(Box::new(inner))
    }

    /// Shorthand for a struct descriptor from `(name, type)` pairs
    pub fn structure<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = (S, TypeDescriptor)>,
        S: Into<String>,
    {
        TypeDescriptor::Struct(
            fields
                .into_iter()
                .map(|(name, ty)| FieldDescriptor::new(name, ty))
                .collect(),
        )
    }

    /// Returns true if values of this type pass through unchanged
    pub fn is_any(&self) -> bool {
        matches!(self, TypeDescriptor::Any)
    }

    /// Conform `value` to this descriptor.
    ///
    /// # Errors
    ///
    /// - `FieldNotFound` when a required struct field is absent
    /// - `NotASequence` when a list or array is expected but something else is found
    /// - `WrongLength` when a fixed array has the wrong number of elements
    /// - `InvalidType` for any other mismatch
    pub fn conform(&self, value: Value) -> Result<Value> {
        match self {
            TypeDescriptor::Any => Ok(value),
            TypeDescriptor::Optional(inner) => match value {
                Value::Null => Ok(Value::Null),
                other => inner.conform(other),
            },
            TypeDescriptor::Bool => match value {
                Value::Bool(b) => Ok(Value::Bool(b)),
                Value::String(ref s) if s == "true" => Ok(Value::Bool(true)),
                Value::String(ref s) if s == "false" => Ok(Value::Bool(false)),
                other => Err(mismatch("Bool", &other)),
            },
            TypeDescriptor::Int => match value {
                Value::Int(i) => Ok(Value::Int(i)),
                Value::Uint(u) => i64::try_from(u)
                    .map(Value::Int)
                    .map_err(|_| Error::invalid_type(format!("{} overflows Int", u))),
                Value::String(ref s) => s
                    .trim()
                    .parse::<i64>()
                    .map(Value::Int)
                    .map_err(|_| mismatch("Int", &value)),
                other => Err(mismatch("Int", &other)),
            },
            TypeDescriptor::Uint => match value {
                Value::Uint(u) => Ok(Value::Uint(u)),
                Value::Int(i) => u64::try_from(i)
                    .map(Value::Uint)
                    .map_err(|_| Error::invalid_type(format!("{} is negative", i))),
                Value::String(ref s) => s
                    .trim()
                    .parse::<u64>()
                    .map(Value::Uint)
                    .map_err(|_| mismatch("Uint", &value)),
                other => Err(mismatch("Uint", &other)),
            },
            TypeDescriptor::Float => match value {
                Value::Float(f) => Ok(Value::Float(f)),
                Value::Int(i) => Ok(Value::Float(i as f64)),
                Value::Uint(u) => Ok(Value::Float(u as f64)),
                Value::String(ref s) => s
                    .trim()
                    .parse::<f64>()
                    .map(Value::Float)
                    .map_err(|_| mismatch("Float", &value)),
                other => Err(mismatch("Float", &other)),
            },
            TypeDescriptor::String => match value {
                Value::String(s) => Ok(Value::String(s)),
                other => Err(mismatch("String", &other)),
            },
            TypeDescriptor::Bytes => match value {
                Value::Bytes(b) => Ok(Value::Bytes(b)),
                Value::Array(items) => items
                    .iter()
                    .map(|item| {
                        TypeDescriptor::Uint
                            .conform(item.clone())
                            .ok()
                            .and_then(|u| u.as_uint())
                            .and_then(|u| u8::try_from(u).ok())
                            .ok_or_else(|| mismatch("byte", item))
                    })
                    .collect::<Result<Vec<u8>>>()
                    .map(Value::Bytes),
                other => Err(mismatch("Bytes", &other)),
            },
            TypeDescriptor::List(elem) => {
                let items = sequence(value)?;
                conform_all(elem, items)
            }
            TypeDescriptor::Array(elem, len) => {
                let items = sequence(value)?;
                if items.len() != *len {
                    return Err(Error::WrongLength {
                        expected: *len,
                        actual: items.len(),
                    });
                }
                conform_all(elem, items)
            }
            TypeDescriptor::Map(elem) => match value {
                Value::Null => Ok(Value::Null),
                Value::Object(fields) => fields
                    .into_iter()
                    .map(|(k, v)| Ok((k, elem.conform(v)?)))
                    .collect::<Result<BTreeMap<_, _>>>()
                    .map(Value::Object),
                other => Err(mismatch("Map", &other)),
            },
            TypeDescriptor::Struct(fields) => match value {
                Value::Object(mut present) => {
                    let mut out = BTreeMap::new();
                    for field in fields {
                        let conformed = match present.remove(&field.name) {
                            Some(v) => field.ty.conform(v)?,
                            None if matches!(field.ty, TypeDescriptor::Optional(_)) => Value::Null,
                            None => {
                                return Err(Error::FieldNotFound {
                                    field: field.name.clone(),
                                })
                            }
                        };
                        out.insert(field.name.clone(), conformed);
                    }
                    Ok(Value::Object(out))
                }
                other => Err(mismatch("Struct", &other)),
            },
        }
    }
}

fn sequence(value: Value) -> Result<Vec<Value>> {
    match value {
        Value::Array(items) => Ok(items),
        Value::Bytes(bytes) => Ok(bytes.into_iter().map(|b| Value::Uint(b as u64)).collect()),
        other => Err(Error::NotASequence {
            actual: other.type_name().to_string(),
        }),
    }
}

fn conform_all(elem: &TypeDescriptor, items: Vec<Value>) -> Result<Value> {
    items
        .into_iter()
        .map(|item| elem.conform(item))
        .collect::<Result<Vec<_>>>()
        .map(Value::Array)
}

fn mismatch(expected: &str, actual: &Value) -> Error {
    Error::invalid_type(format!("expected {}, got {}", expected, actual.type_name()))
}
