//! Translators for chain-specific primitives
//!
//! The core AST carries extension primitives as `{id, payload}`. On the wire
//! the payload travels as a versioned envelope produced by the translator
//! registered for that id. A primitive whose id has no translator fails the
//! conversion in either direction.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chainread_core::{EncodingVersion, Error, Result, TypeDescriptor, Value, VersionedBytes};

/// Converts one kind of extension payload to and from the wire
pub trait PrimitiveTranslator: Send + Sync {
    /// Extension id this translator handles
    fn id(&self) -> &str;

    /// Encode `payload` for transport
    fn to_wire(&self, payload: &Value, encoding: EncodingVersion) -> Result<VersionedBytes>;

    /// Decode a transported payload
    fn from_wire(&self, payload: &VersionedBytes) -> Result<Value>;
}

/// Translator that runs payloads through the versioned codec and conforms
/// them to a descriptor on the way in.
#[derive(Debug, Clone)]
pub struct CodecTranslator {
    id: String,
    shape: TypeDescriptor,
}

impl CodecTranslator {
    /// Translator for `id` whose payloads have shape `shape`
    pub fn new(id: impl Into<String>, shape: TypeDescriptor) -> Self {
        Self {
            id: id.into(),
            shape,
        }
    }
}

impl PrimitiveTranslator for CodecTranslator {
    fn id(&self) -> &str {
        &self.id
    }

    fn to_wire(&self, payload: &Value, encoding: EncodingVersion) -> Result<VersionedBytes> {
        let payload = self.shape.conform(payload.clone())?;
        VersionedBytes::encode(&payload, encoding)
    }

    fn from_wire(&self, payload: &VersionedBytes) -> Result<Value> {
        let value: Value = payload.decode()?;
        self.shape.conform(value)
    }
}

/// Extension id → translator
#[derive(Clone, Default)]
pub struct PrimitiveRegistry {
    translators: BTreeMap<String, Arc<dyn PrimitiveTranslator>>,
}

impl PrimitiveRegistry {
    /// An empty registry: only the base primitives translate
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a translator.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if a translator for the same id is already present.
    pub fn register(&mut self, translator: Arc<dyn PrimitiveTranslator>) -> Result<()> {
        let id = translator.id().to_string();
        if self.translators.contains_key(&id) {
            return Err(Error::invalid_argument(format!(
                "primitive '{}' already has a translator",
                id
            )));
        }
        self.translators.insert(id, translator);
        Ok(())
    }

    /// Builder form of [`register`](Self::register)
    pub fn with(mut self, translator: Arc<dyn PrimitiveTranslator>) -> Result<Self> {
        self.register(translator)?;
        Ok(self)
    }

    /// Translator for `id`, failing `InvalidArgument` if none is registered
    pub fn get(&self, id: &str) -> Result<&dyn PrimitiveTranslator> {
        self.translators
            .get(id)
            .map(|t| t.as_ref())
            .ok_or_else(|| Error::invalid_argument(format!("unrecognised primitive '{}'", id)))
    }

    /// Registered ids
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.translators.keys().map(String::as_str)
    }
}

impl fmt::Debug for PrimitiveRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrimitiveRegistry")
            .field("ids", &self.translators.keys().collect::<Vec<_>>())
            .finish()
    }
}
