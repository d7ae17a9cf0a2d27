//! Error types for chainread
//!
//! Every failure a reader can report is a variant of [`Error`]. The same
//! vocabulary is used on both sides of the process boundary: the server
//! renders errors into wire codes, the client maps them back.
//!
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.

use thiserror::Error;

/// Result type alias for chainread operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the contract reader stack
///
/// # Categories
///
/// | Category | Variants | Description |
/// |----------|----------|-------------|
/// | Codec | `InvalidType`, `InvalidEncoding`, `Decode` | Payload cannot be produced or consumed |
/// | Shape | `FieldNotFound`, `NotASequence`, `WrongLength` | Value does not match its type descriptor |
/// | Lookup | `NotFound` | Missing binding or result |
/// | Validation | `InvalidArgument` | Bad filter, limit or request |
/// | Support | `Unimplemented` | No concrete reader behind a server |
/// | Call | `Cancelled`, `DeadlineExceeded`, `Transport`, `Remote` | Remote call failures |
/// | System | `Internal` | Invariant violations |
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    // ==================== Codec ====================
    /// Payload cannot be produced or consumed under the chosen scheme
    #[error("invalid type: {reason}")]
    InvalidType {
        /// What went wrong
        reason: String,
    },

    /// Unrecognized encoding version tag
    #[error("unsupported encoding version {version}{}", render_data(.data))]
    InvalidEncoding {
        /// The offending tag
        version: u32,
        /// Raw envelope bytes, present on the decode path
        data: Option<Vec<u8>>,
    },

    /// A decode failure annotated with the envelope it came from
    #[error("failed to decode version {version} payload {}: {source}", preview(.data))]
    Decode {
        /// Envelope version tag
        version: u32,
        /// Raw envelope bytes
        data: Vec<u8>,
        /// Originating error
        #[source]
        source: Box<Error>,
    },

    // ==================== Shape ====================
    /// A struct field required by a type descriptor is missing
    #[error("field not found: {field}")]
    FieldNotFound {
        /// Field name
        field: String,
    },

    /// A sequence was expected
    #[error("not a sequence: got {actual}")]
    NotASequence {
        /// Type that was found instead
        actual: String,
    },

    /// A fixed-length sequence has the wrong number of elements
    #[error("wrong length: expected {expected}, got {actual}")]
    WrongLength {
        /// Required length
        expected: usize,
        /// Length found
        actual: usize,
    },

    // ==================== Lookup / validation ====================
    /// Missing binding, sequence or result
    #[error("not found: {what}")]
    NotFound {
        /// What could not be found
        what: String,
    },

    /// Invalid filter, limit, primitive or request
    #[error("invalid argument: {reason}")]
    InvalidArgument {
        /// What went wrong
        reason: String,
    },

    /// The server has no concrete reader wired for this operation
    #[error("unimplemented: {operation}")]
    Unimplemented {
        /// Operation that is not supported
        operation: String,
    },

    // ==================== Call ====================
    /// The caller cancelled the call
    #[error("call cancelled")]
    Cancelled,

    /// The caller's deadline passed before a reply arrived
    #[error("deadline exceeded")]
    DeadlineExceeded,

    /// The transport failed to deliver the call
    #[error("transport error: {reason}")]
    Transport {
        /// Transport detail
        reason: String,
    },

    /// An error reported by the remote side without a matchable class
    #[error("remote error: {message}")]
    Remote {
        /// Rendered remote error
        message: String,
    },

    // ==================== System ====================
    /// Internal error (bug or invariant violation)
    #[error("internal error: {reason}")]
    Internal {
        /// What went wrong
        reason: String,
    },
}

/// Raw bytes shown in error text before truncation
const PREVIEW_BYTES: usize = 64;

fn preview(data: &[u8]) -> String {
    if data.len() <= PREVIEW_BYTES {
        format!("{:?}", data)
    } else {
        format!("{:?}... ({} bytes)", &data[..PREVIEW_BYTES], data.len())
    }
}

fn render_data(data: &Option<Vec<u8>>) -> String {
    match data {
        Some(bytes) => format!(" for payload {}", preview(bytes)),
        None => String::new(),
    }
}

impl Error {
    /// Create an `InvalidType` error
    pub fn invalid_type(reason: impl Into<String>) -> Self {
        Error::InvalidType {
            reason: reason.into(),
        }
    }

    /// Create an `InvalidArgument` error
    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        Error::InvalidArgument {
            reason: reason.into(),
        }
    }

    /// Create a `NotFound` error
    pub fn not_found(what: impl Into<String>) -> Self {
        Error::NotFound { what: what.into() }
    }

    /// Create an `Unimplemented` error
    pub fn unimplemented(operation: impl Into<String>) -> Self {
        Error::Unimplemented {
            operation: operation.into(),
        }
    }

    /// Create an `Internal` error
    pub fn internal(reason: impl Into<String>) -> Self {
        Error::Internal {
            reason: reason.into(),
        }
    }

    /// Wrap a decode failure with the envelope that produced it
    pub fn decode(version: u32, data: &[u8], source: Error) -> Self {
        Error::Decode {
            version,
            data: data.to_vec(),
            source: Box::new(source),
        }
    }

    /// The originating error, looking through `Decode` wrappers
    pub fn root(&self) -> &Error {
        match self {
            Error::Decode { source, .. } => source.root(),
            other => other,
        }
    }

    /// Returns true if this is (or wraps) an `InvalidType` error
    pub fn is_invalid_type(&self) -> bool {
        matches!(self.root(), Error::InvalidType { .. })
    }

    /// Returns true if this is (or wraps) an `InvalidEncoding` error
    pub fn is_invalid_encoding(&self) -> bool {
        matches!(self.root(), Error::InvalidEncoding { .. })
    }

    /// Returns true if this is a `NotFound` error
    pub fn is_not_found(&self) -> bool {
        matches!(self.root(), Error::NotFound { .. })
    }

    /// Returns true if this is an `Unimplemented` error
    pub fn is_unimplemented(&self) -> bool {
        matches!(self.root(), Error::Unimplemented { .. })
    }

    /// Returns true if this is an `InvalidArgument` error
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self.root(), Error::InvalidArgument { .. })
    }
}

impl serde::ser::Error for Error {
    fn custom<T: std::fmt::Display>(msg: T) -> Self {
        Error::invalid_type(msg.to_string())
    }
}

impl serde::de::Error for Error {
    fn custom<T: std::fmt::Display>(msg: T) -> Self {
        Error::invalid_type(msg.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::invalid_type(e.to_string())
    }
}

impl From<bincode::Error> for Error {
    fn from(e: bincode::Error) -> Self {
        Error::invalid_type(e.to_string())
    }
}
