//! # Versioned Binary Codec
//!
//! Positional, length-gated, tombstone-preserving encoding for every persisted
//! basket entity.
//!
//! ## Wire Format
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Each record = one definite-length CBOR array                           │
//! │                                                                         │
//! │   [ len ] [ pos 1 ] [ pos 2 ] ... [ pos len ]                           │
//! │     │                                                                   │
//! │     └── explicit length prefix, always the full current schema length   │
//! │                                                                         │
//! │  Decoding:                                                             │
//! │   1. read len, check it against the entity's LengthRule                │
//! │      (fails before any field is touched)                               │
//! │   2. decode positions 1..=len into the target, in order                │
//! │      (a field failure stops here; earlier fields stay applied)         │
//! │   3. positions > len keep their blank values (older payloads)          │
//! │   4. positions beyond the schema are skipped (newer payloads)          │
//! │                                                                         │
//! │  Tombstones: encoder writes the zero value of the original wire type,  │
//! │  decoder reads it with that type and discards it.                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Evolution Rules
//! Only two schema changes are allowed: append a position, or turn a position
//! into a tombstone. Renaming is cosmetic; reordering or deleting a position
//! breaks every stored basket.
//!
//! ## Usage
//! ```rust
//! use basket_core::codec;
//! use basket_core::{Item, Money};
//!
//! let item = Item::product("30012345", 2, Money::from_minor(1999));
//! let bytes = codec::encode(&item).unwrap();
//! let decoded: Item = codec::decode(&bytes).unwrap();
//! assert_eq!(decoded, item);
//! ```

mod error;
mod records;
pub mod schema;

pub use error::{DecodeError, EncodeError};
pub use schema::{FieldDef, FieldState, LengthRule, Schema, WireType};

use minicbor::data::Type;
use minicbor::{Decoder, Encoder};
use tracing::{debug, warn};

use crate::collection::Items;

/// Encoder over an in-memory buffer.
pub type Enc<'a> = Encoder<&'a mut Vec<u8>>;

// =============================================================================
// Record Trait
// =============================================================================

/// A persisted entity with a positional schema.
///
/// Implementations only handle their active positions; tombstones, length
/// gating and error paths are handled by the generic routines.
pub trait Record {
    const SCHEMA: Schema;

    /// The value decoding starts from. Positions missing from a payload keep
    /// what this returns.
    fn blank() -> Self;

    /// Writes the active field at 1-based `position`.
    fn encode_field(&self, position: usize, enc: &mut Enc<'_>) -> Result<(), EncodeError>;

    /// Reads the active field at 1-based `position` into `self`.
    fn decode_field(&mut self, position: usize, dec: &mut Decoder<'_>) -> Result<(), DecodeError>;
}

// =============================================================================
// Entry Points
// =============================================================================

pub fn encode<R: Record>(record: &R) -> Result<Vec<u8>, EncodeError> {
    let mut buf = Vec::new();
    let mut enc = Encoder::new(&mut buf);
    write_record(record, &mut enc)?;
    debug!(entity = R::SCHEMA.entity, bytes = buf.len(), "Encoded record");
    Ok(buf)
}

pub fn decode<R: Record>(bytes: &[u8]) -> Result<R, DecodeError> {
    let mut record = R::blank();
    decode_into(bytes, &mut record)?;
    Ok(record)
}

/// Decodes into an existing value.
///
/// Not transactional: when a field fails, the fields before it have already
/// been written to `target`.
pub fn decode_into<R: Record>(bytes: &[u8], target: &mut R) -> Result<(), DecodeError> {
    let mut dec = Decoder::new(bytes);
    let result = read_record_into(target, &mut dec).and_then(|()| {
        if dec.position() == bytes.len() {
            Ok(())
        } else {
            Err(DecodeError::TrailingBytes)
        }
    });

    match &result {
        Ok(()) => debug!(entity = R::SCHEMA.entity, bytes = bytes.len(), "Decoded record"),
        Err(err) => warn!(entity = R::SCHEMA.entity, error = %err, "Failed to decode record"),
    }
    result
}

/// Encodes a whole basket, items in display order.
pub fn encode_items(items: &Items) -> Result<Vec<u8>, EncodeError> {
    encode(items)
}

pub fn decode_items(bytes: &[u8]) -> Result<Items, DecodeError> {
    decode(bytes)
}

// =============================================================================
// Generic Record Routines
// =============================================================================

pub(crate) fn write_record<R: Record>(record: &R, enc: &mut Enc<'_>) -> Result<(), EncodeError> {
    let schema = R::SCHEMA;
    enc.array(schema.len() as u64)?;
    for (index, field) in schema.fields.iter().enumerate() {
        match field.state {
            FieldState::Active => record.encode_field(index + 1, enc)?,
            FieldState::Tombstone => write_placeholder(enc, field.wire)?,
        }
    }
    Ok(())
}

pub(crate) fn read_record_into<R: Record>(
    target: &mut R,
    dec: &mut Decoder<'_>,
) -> Result<(), DecodeError> {
    let schema = R::SCHEMA;
    let declared = dec.array()?.ok_or(DecodeError::IndefiniteLength {
        entity: schema.entity,
    })?;
    let len = usize::try_from(declared)
        .ok()
        .filter(|len| schema.accepted.accepts(*len))
        .ok_or(DecodeError::Length {
            entity: schema.entity,
            found: declared,
            accepted: schema.accepted,
        })?;

    for position in 1..=len {
        match schema.field(position) {
            Some(field) => {
                let result = match field.state {
                    FieldState::Active => target.decode_field(position, dec),
                    FieldState::Tombstone => read_placeholder(dec, field.wire),
                };
                result.map_err(|err| err.at(field.name, position))?;
            }
            None => {
                dec.skip()
                    .map_err(|err| DecodeError::from(err).at("unknown", position))?;
            }
        }
    }
    Ok(())
}

pub(crate) fn read_record<R: Record>(dec: &mut Decoder<'_>) -> Result<R, DecodeError> {
    let mut record = R::blank();
    read_record_into(&mut record, dec)?;
    Ok(record)
}

/// Writes a nested record, or `null` when absent.
pub(crate) fn write_optional<R: Record>(
    record: Option<&R>,
    enc: &mut Enc<'_>,
) -> Result<(), EncodeError> {
    match record {
        Some(record) => write_record(record, enc),
        None => {
            enc.null()?;
            Ok(())
        }
    }
}

pub(crate) fn read_optional<R: Record>(dec: &mut Decoder<'_>) -> Result<Option<R>, DecodeError> {
    if dec.datatype()? == Type::Null {
        dec.null()?;
        return Ok(None);
    }
    read_record(dec).map(Some)
}

/// Writes a definite-length array of records.
pub(crate) fn write_list<'r, R: Record + 'r>(
    records: impl ExactSizeIterator<Item = &'r R>,
    enc: &mut Enc<'_>,
) -> Result<(), EncodeError> {
    enc.array(records.len() as u64)?;
    for record in records {
        write_record(record, enc)?;
    }
    Ok(())
}

/// Reads an array of records. Element failures carry the element's entity
/// name and 1-based index.
pub(crate) fn read_list<R: Record>(
    dec: &mut Decoder<'_>,
    entity: &'static str,
) -> Result<Vec<R>, DecodeError> {
    let len = dec.array()?.ok_or(DecodeError::IndefiniteLength { entity })?;
    let mut records = Vec::new();
    for index in 0..len {
        let record = read_record(dec).map_err(|err| err.at(R::SCHEMA.entity, index as usize + 1))?;
        records.push(record);
    }
    Ok(records)
}

fn write_placeholder(enc: &mut Enc<'_>, wire: WireType) -> Result<(), EncodeError> {
    match wire {
        WireType::Str => enc.str("")?,
        WireType::U32 => enc.u32(0)?,
        WireType::I64 => enc.i64(0)?,
        WireType::Bool => enc.bool(false)?,
        WireType::Array => enc.array(0)?,
        WireType::Map => enc.map(0)?,
        WireType::Record => enc.null()?,
    };
    Ok(())
}

fn read_placeholder(dec: &mut Decoder<'_>, wire: WireType) -> Result<(), DecodeError> {
    match wire {
        WireType::Str => {
            dec.str()?;
        }
        WireType::U32 => {
            dec.u32()?;
        }
        WireType::I64 => {
            dec.i64()?;
        }
        WireType::Bool => {
            dec.bool()?;
        }
        WireType::Array | WireType::Map | WireType::Record => dec.skip()?,
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
