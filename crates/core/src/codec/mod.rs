//! Versioned value codec
//!
//! Every payload that crosses the process boundary travels as a
//! [`VersionedBytes`] envelope: `{version, data}`. The version tag alone says
//! how `data` must be decoded; decoding never consults a local default.
//!
//! | Tag | Scheme | Notes |
//! |-----|--------|-------|
//! | 0 | [`EncodingVersion::Json`] | baseline JSON |
//! | 1 | [`EncodingVersion::JsonStringified`] | JSON with every number rendered as a string |
//! | 2 | [`EncodingVersion::Cbor`] | canonical CBOR, byte-identical for equal values |
//! | 3 | [`EncodingVersion::Dynamic`] | tagged [`Value`](crate::Value) model, binary marshaled |

mod cbor;
mod dynamic;
mod json;

use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{Error, Result};

/// Encoding scheme selector
///
/// Serialized by name (`"json"`, `"json-stringified"`, `"cbor"`, `"dynamic"`);
/// deserialization also accepts the numeric tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EncodingVersion {
    /// Baseline JSON
    Json,
    /// JSON with numbers stringified for precision-sensitive fields
    JsonStringified,
    /// Canonical CBOR with deterministic map ordering
    Cbor,
    /// Self-describing tagged value model
    Dynamic,
}

impl EncodingVersion {
    /// All recognized schemes, in tag order
    pub const ALL: [EncodingVersion; 4] = [
        EncodingVersion::Json,
        EncodingVersion::JsonStringified,
        EncodingVersion::Cbor,
        EncodingVersion::Dynamic,
    ];

    /// Wire tag for this scheme
    pub const fn tag(self) -> u32 {
        match self {
            EncodingVersion::Json => 0,
            EncodingVersion::JsonStringified => 1,
            EncodingVersion::Cbor => 2,
            EncodingVersion::Dynamic => 3,
        }
    }

    /// Resolve a wire tag, failing `InvalidEncoding` for unknown tags
    pub fn from_tag(tag: u32) -> Result<Self> {
        match tag {
            0 => Ok(EncodingVersion::Json),
            1 => Ok(EncodingVersion::JsonStringified),
            2 => Ok(EncodingVersion::Cbor),
            3 => Ok(EncodingVersion::Dynamic),
            version => Err(Error::InvalidEncoding {
                version,
                data: None,
            }),
        }
    }

    /// Human-readable name
    pub const fn name(self) -> &'static str {
        match self {
            EncodingVersion::Json => "json",
            EncodingVersion::JsonStringified => "json-stringified",
            EncodingVersion::Cbor => "cbor",
            EncodingVersion::Dynamic => "dynamic",
        }
    }
}

impl Default for EncodingVersion {
    fn default() -> Self {
        EncodingVersion::Cbor
    }
}

impl fmt::Display for EncodingVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EncodingVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "json" => Ok(EncodingVersion::Json),
            "json-stringified" => Ok(EncodingVersion::JsonStringified),
            "cbor" => Ok(EncodingVersion::Cbor),
            "dynamic" => Ok(EncodingVersion::Dynamic),
            other => match other.parse::<u32>() {
                Ok(tag) => EncodingVersion::from_tag(tag),
                Err(_) => Err(Error::invalid_argument(format!(
                    "unknown encoding '{}', expected json, json-stringified, cbor or dynamic",
                    other
                ))),
            },
        }
    }
}

impl Serialize for EncodingVersion {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for EncodingVersion {
    fn deserialize<D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Tag(u32),
            Name(String),
        }

        let parsed = match Repr::deserialize(deserializer)? {
            Repr::Tag(tag) => EncodingVersion::from_tag(tag),
            Repr::Name(name) => name.parse(),
        };
        parsed.map_err(serde::de::Error::custom)
    }
}

/// A self-describing encoded payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionedBytes {
    /// Encoding tag; the sole source of truth for decoding `data`
    pub version: u32,
    /// Encoded payload
    pub data: Vec<u8>,
}

impl VersionedBytes {
    /// Encode `value` under `version`.
    pub fn encode<T: Serialize + ?Sized>(value: &T, version: EncodingVersion) -> Result<Self> {
        encode(value, version)
    }

    /// Decode the payload according to its own version tag.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        decode(self)
    }
}

/// Encode `value` into an envelope tagged with `version`.
///
/// # Errors
///
/// Returns `InvalidType` if the value cannot be represented in the scheme.
pub fn encode<T: Serialize + ?Sized>(value: &T, version: EncodingVersion) -> Result<VersionedBytes> {
    let data = match version {
        EncodingVersion::Json => json::encode(value)?,
        EncodingVersion::JsonStringified => json::encode_stringified(value)?,
        EncodingVersion::Cbor => cbor::encode(value)?,
        EncodingVersion::Dynamic => dynamic::encode(value)?,
    };
    trace!(target: "chainread::codec", version = %version, len = data.len(), "encoded payload");
    Ok(VersionedBytes {
        version: version.tag(),
        data,
    })
}

/// Encode `value` under a raw wire tag.
///
/// # Errors
///
/// Returns `InvalidEncoding` if `tag` is not a recognized scheme.
pub fn encode_tagged<T: Serialize + ?Sized>(value: &T, tag: u32) -> Result<VersionedBytes> {
    encode(value, EncodingVersion::from_tag(tag)?)
}

/// Decode an envelope into `T`, dispatching purely on the envelope's tag.
///
/// # Errors
///
/// Returns `InvalidEncoding` (carrying the raw bytes) for unknown tags and a
/// `Decode` error wrapping `InvalidType` when the payload does not fit `T`.
pub fn decode<T: DeserializeOwned>(envelope: &VersionedBytes) -> Result<T> {
    let version = EncodingVersion::from_tag(envelope.version).map_err(|_| Error::InvalidEncoding {
        version: envelope.version,
        data: Some(envelope.data.clone()),
    })?;

    let decoded = match version {
        EncodingVersion::Json => json::decode(&envelope.data),
        EncodingVersion::JsonStringified => json::decode_stringified(&envelope.data),
        EncodingVersion::Cbor => cbor::decode(&envelope.data),
        EncodingVersion::Dynamic => dynamic::decode(&envelope.data),
    };
    decoded.map_err(|e| Error::decode(envelope.version, &envelope.data, e))
}
