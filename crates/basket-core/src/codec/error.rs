//! # Codec Error Types
//!
//! ## Positional Paths
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  A failure deep inside a nested record keeps every hop:                 │
//! │                                                                         │
//! │   item → additions(14) → subcontract(3) → schedule(4) → date(1)        │
//! │                                                                         │
//! │  Display: "additions(14): subcontract(3): schedule(4): date(1):        │
//! │            invalid value: ..."                                          │
//! │                                                                         │
//! │  Array elements use the element entity and 1-based index               │
//! │  ("problem(2)"); map entries use the key ("info[1](1)").               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Decode errors are for logs and alerts only; they never reach end users.

use std::convert::Infallible;

use thiserror::Error;

use super::schema::LengthRule;
use crate::error::InvalidType;

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("cbor encode: {0}")]
    Cbor(#[from] minicbor::encode::Error<Infallible>),

    #[error("{entity} has no encoder for position {position}")]
    UnknownPosition {
        entity: &'static str,
        position: usize,
    },
}

#[derive(Debug, Error)]
pub enum DecodeError {
    /// The declared array length is outside the entity's accepted range.
    /// Raised before any field of the record is touched.
    #[error("{entity}: length {found} not accepted (expected {accepted})")]
    Length {
        entity: &'static str,
        found: u64,
        accepted: LengthRule,
    },

    #[error("{entity}: indefinite-length CBOR not allowed")]
    IndefiniteLength { entity: &'static str },

    #[error("invalid value: {reason}")]
    InvalidValue { reason: String },

    #[error(transparent)]
    InvalidType(#[from] InvalidType),

    #[error("trailing bytes after record")]
    TrailingBytes,

    #[error("cbor decode: {0}")]
    Cbor(#[from] minicbor::decode::Error),

    /// Failure inside a field, tagged with the field name and its 1-based
    /// position.
    #[error("{name}({position}): {source}")]
    Field {
        name: String,
        position: usize,
        source: Box<DecodeError>,
    },
}

impl DecodeError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        DecodeError::InvalidValue {
            reason: reason.into(),
        }
    }

    /// Wraps this error with one more path segment.
    pub fn at(self, name: impl Into<String>, position: usize) -> Self {
        DecodeError::Field {
            name: name.into(),
            position,
            source: Box::new(self),
        }
    }

    /// Path segments, outermost first.
    pub fn path(&self) -> Vec<(&str, usize)> {
        let mut path = Vec::new();
        let mut current = self;
        while let DecodeError::Field {
            name,
            position,
            source,
        } = current
        {
            path.push((name.as_str(), *position));
            current = source;
        }
        path
    }

    /// The innermost, unwrapped error.
    pub fn root_cause(&self) -> &DecodeError {
        let mut current = self;
        while let DecodeError::Field { source, .. } = current {
            current = source;
        }
        current
    }
}
