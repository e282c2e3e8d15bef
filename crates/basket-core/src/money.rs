//! # Money Module
//!
//! Provides the `Money` type used for item prices and bonuses.
//!
//! ## Integer Minor Units
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Catalog price ──► Item.price (minor units, i64) ──► line total        │
//! │                          │                                              │
//! │                          ├──► fingerprint (low 32 bits, little-endian)  │
//! │                          └──► wire codec (i64, position 8)              │
//! │                                                                         │
//! │  Floats never enter the basket: 0.1 + 0.2 != 0.3                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use basket_core::money::Money;
//!
//! let price = Money::from_minor(129_990);
//! let line = price.multiply_count(2);
//! assert_eq!(line.minor(), 259_980);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit.
///
/// ## Design Decisions
/// - **i64 (signed)**: bonuses may be written off as negative adjustments
/// - **Single field tuple struct**: zero-cost abstraction over i64
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS,
)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from minor units.
    #[inline]
    pub const fn from_minor(minor: i64) -> Self {
        Money(minor)
    }

    /// Returns the value in minor units.
    #[inline]
    pub const fn minor(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion.
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn minor_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// The 32-bit value fed into item fingerprints.
    ///
    /// Previously committed fingerprints were computed over the low 32 bits
    /// of the price, so this truncation is part of the persisted contract.
    #[inline]
    pub const fn fingerprint_bits(&self) -> u32 {
        self.0 as u32
    }

    /// Multiplies a unit price by an item count, saturating at the i64
    /// bounds. Decoded baskets may carry any stored count.
    ///
    /// ## Example
    /// ```rust
    /// use basket_core::money::Money;
    ///
    /// let unit_price = Money::from_minor(299);
    /// assert_eq!(unit_price.multiply_count(3).minor(), 897);
    /// ```
    #[inline]
    pub const fn multiply_count(&self, count: u32) -> Self {
        Money(self.0.saturating_mul(count as i64))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Debug-oriented display; storefront formatting happens client-side.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.major().abs(), self.minor_part())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
