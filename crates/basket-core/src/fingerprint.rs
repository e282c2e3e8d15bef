//! # Change Fingerprints
//!
//! Dirty-tracking hash over the commercially significant fields of an item.
//!
//! ## Byte Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  FNV-1a 64 over, in this order:                                         │
//! │                                                                         │
//! │   space_id      raw UTF-8 bytes                                        │
//! │   price_column  u32 little-endian                                      │
//! │   item_id       raw UTF-8 bytes                                        │
//! │   count         u32 little-endian                                      │
//! │   price         u32 little-endian (low 32 bits of minor units)         │
//! │                                                                         │
//! │  Result rendered as a decimal string.                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Fingerprints are committed into persisted baskets. Changing the field
//! order, a field width or the hash function silently marks every stored
//! item as changed.

use crate::money::Money;
use crate::types::{ItemId, PriceColumn, SpaceId};

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Incremental 64-bit FNV-1a.
#[derive(Debug, Clone, Copy)]
pub struct Fnv1a64 {
    state: u64,
}

impl Fnv1a64 {
    pub const fn new() -> Self {
        Fnv1a64 {
            state: FNV_OFFSET_BASIS,
        }
    }

    pub fn write(&mut self, bytes: &[u8]) {
        for byte in bytes {
            self.state ^= u64::from(*byte);
            self.state = self.state.wrapping_mul(FNV_PRIME);
        }
    }

    pub const fn finish(&self) -> u64 {
        self.state
    }
}

impl Default for Fnv1a64 {
    fn default() -> Self {
        Fnv1a64::new()
    }
}

/// Computes the fingerprint of an item's commercial state.
pub fn fingerprint(
    space_id: &SpaceId,
    price_column: PriceColumn,
    item_id: &ItemId,
    count: u32,
    price: Money,
) -> String {
    let mut hasher = Fnv1a64::new();
    hasher.write(space_id.as_str().as_bytes());
    hasher.write(&price_column.get().to_le_bytes());
    hasher.write(item_id.as_str().as_bytes());
    hasher.write(&count.to_le_bytes());
    hasher.write(&price.fingerprint_bits().to_le_bytes());
    hasher.finish().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================
