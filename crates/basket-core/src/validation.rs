//! # Count Validation
//!
//! Count normalization rules shared by `Item::set_count` and the catalog
//! availability pass.
//!
//! ## Normalization Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Requested count → stored count                     │
//! │                                                                         │
//! │  Step 1: clamp to [1, LIMIT_TOTAL_GOODS]                               │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Step 2: round to the packaging multiplicity                           │
//! │          ├── n ≤ m  → m           (never rounds down to 0)             │
//! │          └── n > m  → ⌊n / m⌋ · m                                      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Step 3 (Item only): compare with the active max-count rule            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use basket_core::validation::{normalize_count, round_to_multiplicity};
//!
//! assert_eq!(round_to_multiplicity(1, 10), 10);
//! assert_eq!(round_to_multiplicity(50, 11), 44);
//! assert_eq!(normalize_count(0, 1), 1);
//! ```

use crate::LIMIT_TOTAL_GOODS;

/// Multiplicity 0 is stored by old payloads; it means "no packaging".
#[inline]
pub fn effective_multiplicity(multiplicity: u32) -> u32 {
    multiplicity.max(1)
}

/// Rounds `count` to a multiple of `multiplicity`.
///
/// ## Rules
/// - Counts at or below one package become exactly one package
/// - Larger counts round down to the nearest whole package
pub fn round_to_multiplicity(count: u32, multiplicity: u32) -> u32 {
    let multiplicity = effective_multiplicity(multiplicity);
    if count <= multiplicity {
        return multiplicity;
    }
    count / multiplicity * multiplicity
}

/// Clamps `count` to `[1, LIMIT_TOTAL_GOODS]` and rounds it to the packaging
/// multiplicity.
pub fn normalize_count(count: u32, multiplicity: u32) -> u32 {
    let clamped = count.clamp(1, LIMIT_TOTAL_GOODS);
    round_to_multiplicity(clamped, multiplicity)
}

/// Converts an availability limit expressed in packages into an item count.
///
/// ## Example
/// ```rust
/// use basket_core::validation::calculate_max_count;
///
/// // 3 boxes of 12 available
/// assert_eq!(calculate_max_count(3, 12), 36);
/// ```
pub fn calculate_max_count(max_available: u32, multiplicity: u32) -> u32 {
    max_available.saturating_mul(effective_multiplicity(multiplicity))
}

// =============================================================================
// Unit Tests
// =============================================================================
