//! Per-entity wire schema tables.
//!
//! A schema lists every position a record has ever had, in wire order.
//! Positions are only ever appended; a removed field stays as a tombstone so
//! the positions after it never move.

use std::fmt;

/// CBOR shape written at a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireType {
    Str,
    U32,
    I64,
    Bool,
    Array,
    Map,
    /// A nested record, or `null` when absent.
    Record,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldState {
    Active,
    /// Removed from the model; the position is still written and read.
    Tombstone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    pub name: &'static str,
    pub wire: WireType,
    pub state: FieldState,
}

impl FieldDef {
    pub const fn active(name: &'static str, wire: WireType) -> Self {
        FieldDef {
            name,
            wire,
            state: FieldState::Active,
        }
    }

    pub const fn tombstone(name: &'static str, wire: WireType) -> Self {
        FieldDef {
            name,
            wire,
            state: FieldState::Tombstone,
        }
    }
}

/// Which declared array lengths a decoder accepts for an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthRule {
    Exact(usize),
    AtLeast(usize),
    Between(usize, usize),
}

impl LengthRule {
    pub fn accepts(&self, len: usize) -> bool {
        match *self {
            LengthRule::Exact(n) => len == n,
            LengthRule::AtLeast(min) => len >= min,
            LengthRule::Between(min, max) => (min..=max).contains(&len),
        }
    }
}

impl fmt::Display for LengthRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LengthRule::Exact(n) => write!(f, "exactly {n}"),
            LengthRule::AtLeast(min) => write!(f, "at least {min}"),
            LengthRule::Between(min, max) => write!(f, "{min}..={max}"),
        }
    }
}

/// Wire layout of one entity.
#[derive(Debug, Clone, Copy)]
pub struct Schema {
    pub entity: &'static str,
    pub fields: &'static [FieldDef],
    pub accepted: LengthRule,
}

impl Schema {
    /// Current-schema length every encoder writes.
    pub const fn len(&self) -> usize {
        self.fields.len()
    }

    pub const fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// 1-based position lookup.
    pub fn field(&self, position: usize) -> Option<&FieldDef> {
        position.checked_sub(1).and_then(|i| self.fields.get(i))
    }
}
