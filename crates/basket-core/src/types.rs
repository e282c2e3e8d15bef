//! # Domain Types
//!
//! Identifier and value types shared by the item tree, the codec and the
//! catalog adapters.
//!
//! ## Dual-Key Identity Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Item Identity                                   │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    UniqId       │   │     ItemId      │   │  SpaceId +      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  PriceColumn    │       │
//! │  │  UUID v4        │   │  catalog ref    │   │  ─────────────  │       │
//! │  │  one per Item   │   │  NOT unique     │   │  where the      │       │
//! │  │  never changes  │   │  in a basket    │   │  price comes    │       │
//! │  └─────────────────┘   └─────────────────┘   │  from           │       │
//! │                                              └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The same catalog product may appear twice in one basket (standalone and
//! inside a configuration), so every lookup inside the basket goes through
//! `UniqId`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;
use uuid::Uuid;

// =============================================================================
// UniqId
// =============================================================================

/// Globally unique identity of one basket line, assigned at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UniqId(Uuid);

impl UniqId {
    /// Generates a fresh random id.
    pub fn generate() -> Self {
        UniqId(Uuid::new_v4())
    }

    /// The all-zero id, used as the placeholder before decoding fills it in.
    pub const fn nil() -> Self {
        UniqId(Uuid::nil())
    }

    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

impl fmt::Display for UniqId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for UniqId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(UniqId)
    }
}

// =============================================================================
// ItemId
// =============================================================================

/// Catalog reference of an item (product code, service code, ...).
#[derive(
    Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        ItemId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        ItemId(s.to_string())
    }
}

impl From<String> for ItemId {
    fn from(s: String) -> Self {
        ItemId(s)
    }
}

// =============================================================================
// Pricing Location
// =============================================================================

/// Sales space (store, warehouse region) the basket is priced in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpaceId(String);

impl SpaceId {
    pub fn new(id: impl Into<String>) -> Self {
        SpaceId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SpaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Index of the catalog price column the item is priced from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PriceColumn(u32);

impl PriceColumn {
    pub const fn new(column: u32) -> Self {
        PriceColumn(column)
    }

    pub const fn get(&self) -> u32 {
        self.0
    }
}

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (2000 = 20%).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }
}

// =============================================================================
// Customer Kind
// =============================================================================

/// Who the basket belongs to. Some item types are sold to only one kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum CustomerKind {
    #[default]
    Individual,
    Business,
}

// =============================================================================
// Unit Tests
// =============================================================================
