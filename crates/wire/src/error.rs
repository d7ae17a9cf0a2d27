//! Errors as they cross the wire
//!
//! A [`WireError`] is a `{code, message, detail}` triple. `message` is the
//! human-readable rendering; `detail` carries just enough to rebuild the
//! documented sentinel kinds on the receiving side. Everything else comes
//! back as [`Error::Remote`] holding the text.

use serde::{Deserialize, Serialize};

use chainread_core::Error;

/// Error classes that survive the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    /// Payload cannot be produced or consumed under the chosen scheme
    InvalidType,
    /// Unknown envelope version
    InvalidEncoding,
    /// Validation failure
    InvalidArgument,
    /// Missing binding or result
    NotFound,
    /// Struct field absent
    FieldNotFound,
    /// Scalar where a sequence was required
    NotASequence,
    /// Fixed array of the wrong length
    WrongLength,
    /// No reader wired on the server
    Unimplemented,
    /// Caller cancelled
    Cancelled,
    /// Deadline passed
    DeadlineExceeded,
    /// Connection-level failure
    Unavailable,
    /// Anything else
    Unknown,
}

/// Serializable error
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{code:?}: {message}")]
pub struct WireError {
    /// Error class
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Reconstruction payload for sentinel kinds
    pub detail: String,
}

impl WireError {
    /// Create a wire error
    pub fn new(code: ErrorCode, message: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            detail: detail.into(),
        }
    }

    /// A connection-level failure
    pub fn unavailable(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        Self::new(ErrorCode::Unavailable, reason.clone(), reason)
    }

    /// Rebuild the reader error this wire error stands for.
    pub fn into_error(self) -> Error {
        let WireError {
            code,
            message,
            detail,
        } = self;
        match code {
            ErrorCode::InvalidType => Error::InvalidType { reason: detail },
            ErrorCode::InvalidEncoding => match detail.parse::<u32>() {
                Ok(version) => Error::InvalidEncoding {
                    version,
                    data: None,
                },
                Err(_) => Error::Remote { message },
            },
            ErrorCode::InvalidArgument => Error::InvalidArgument { reason: detail },
            ErrorCode::NotFound => Error::NotFound { what: detail },
            ErrorCode::FieldNotFound => Error::FieldNotFound { field: detail },
            ErrorCode::NotASequence => Error::NotASequence { actual: detail },
            ErrorCode::WrongLength => match parse_lengths(&detail) {
                Some((expected, actual)) => Error::WrongLength { expected, actual },
                None => Error::Remote { message },
            },
            ErrorCode::Unimplemented => Error::Unimplemented { operation: detail },
            ErrorCode::Cancelled => Error::Cancelled,
            ErrorCode::DeadlineExceeded => Error::DeadlineExceeded,
            ErrorCode::Unavailable => Error::Transport { reason: detail },
            ErrorCode::Unknown => Error::Remote { message },
        }
    }
}

fn parse_lengths(detail: &str) -> Option<(usize, usize)> {
    let (expected, actual) = detail.split_once('/')?;
    Some((expected.parse().ok()?, actual.parse().ok()?))
}

impl From<&Error> for WireError {
    fn from(err: &Error) -> Self {
        let message = match err {
            Error::Remote { message } => message.clone(),
            other => other.to_string(),
        };
        let (code, detail) = match err {
            Error::InvalidType { reason } => (ErrorCode::InvalidType, reason.clone()),
            // Decode failures keep their version in the text only
            Error::Decode { .. } => (ErrorCode::InvalidType, message.clone()),
            Error::InvalidEncoding { version, .. } => {
                (ErrorCode::InvalidEncoding, version.to_string())
            }
            Error::InvalidArgument { reason } => (ErrorCode::InvalidArgument, reason.clone()),
            Error::NotFound { what } => (ErrorCode::NotFound, what.clone()),
            Error::FieldNotFound { field } => (ErrorCode::FieldNotFound, field.clone()),
            Error::NotASequence { actual } => (ErrorCode::NotASequence, actual.clone()),
            Error::WrongLength { expected, actual } => {
                (ErrorCode::WrongLength, format!("{}/{}", expected, actual))
            }
            Error::Unimplemented { operation } => (ErrorCode::Unimplemented, operation.clone()),
            Error::Cancelled => (ErrorCode::Cancelled, String::new()),
            Error::DeadlineExceeded => (ErrorCode::DeadlineExceeded, String::new()),
            Error::Transport { reason } => (ErrorCode::Unavailable, reason.clone()),
            Error::Remote { .. } | Error::Internal { .. } => (ErrorCode::Unknown, String::new()),
        };
        WireError {
            code,
            message,
            detail,
        }
    }
}

impl From<Error> for WireError {
    fn from(err: Error) -> Self {
        WireError::from(&err)
    }
}
