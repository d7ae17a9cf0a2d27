//! Canonical CBOR scheme (tag 2)
//!
//! Values are first lowered into a `ciborium::value::Value` tree, every map
//! is sorted by the canonical ordering of its encoded keys (shorter encodings
//! first, then bytewise), and only then written. Two equal values therefore
//! produce byte-identical output no matter how their maps were built.

use ciborium::value::Value as Cbor;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Error, Result};

pub(super) fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    let tree = Cbor::serialized(value).map_err(|e| Error::invalid_type(e.to_string()))?;
    let tree = canonicalize(tree)?;
    let mut buf = Vec::new();
    ciborium::into_writer(&tree, &mut buf).map_err(|e| Error::invalid_type(e.to_string()))?;
    Ok(buf)
}

pub(super) fn decode<T: DeserializeOwned>(data: &[u8]) -> Result<T> {
    ciborium::from_reader(data).map_err(|e| Error::invalid_type(e.to_string()))
}

fn canonicalize(value: Cbor) -> Result<Cbor> {
    Ok(match value {
        Cbor::Array(items) => Cbor::Array(
            items
                .into_iter()
                .map(canonicalize)
                .collect::<Result<Vec<_>>>()?,
        ),
        Cbor::Map(entries) => {
            let mut keyed = Vec::with_capacity(entries.len());
            for (k, v) in entries {
                let k = canonicalize(k)?;
                let mut encoded = Vec::new();
                ciborium::into_writer(&k, &mut encoded)
                    .map_err(|e| Error::invalid_type(e.to_string()))?;
                keyed.push((encoded, k, canonicalize(v)?));
            }
            keyed.sort_by(|a, b| a.0.len().cmp(&b.0.len()).then_with(|| a.0.cmp(&b.0)));
            if keyed.windows(2).any(|w| w[0].0 == w[1].0) {
                return Err(Error::invalid_type("duplicate map key in CBOR payload"));
            }
            Cbor::Map(keyed.into_iter().map(|(_, k, v)| (k, v)).collect())
        }
        Cbor::Tag(tag, inner) => Cbor::Tag(tag, Box::new(canonicalize(*inner)?)),
        other => other,
    })
}
