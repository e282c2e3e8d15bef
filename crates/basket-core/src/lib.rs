//! # basket-core: Line-Item Tree for Order Baskets
//!
//! This crate is the **heart** of the basket backend. It holds the item
//! tree, its type-driven structural rules, change fingerprinting and the
//! versioned binary codec, with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Basket Backend Architecture                      │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │             Orchestrators (refresh, checkout, B2B)              │   │
//! │  │    catalog fan-out ──► compliance ──► city services ──► save    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ mutation API                           │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ basket-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   spec    │  │   item    │  │collection │  │  catalog  │  │   │
//! │  │   │ ItemType  │  │   Item    │  │   Items   │  │  offers   │  │   │
//! │  │   │ Registry  │  │ Additions │  │ ordering  │  │ decisions │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │fingerprint│  │   codec   │  │projection │  │  config   │  │   │
//! │  │   │  FNV-1a   │  │ positional│  │ OrderLine │  │ simulated │  │   │
//! │  │   │   dirty   │  │   CBOR    │  │ quantity  │  │ problems  │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • SYNCHRONOUS              │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ encoded bytes                          │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    Persistence Layer                            │   │
//! │  │              basket blobs, keyed by customer                    │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`spec`] - Item types and the static structural rule registry
//! - [`item`] - The Item aggregate and its mutation API
//! - [`collection`] - Flat, id-keyed basket with display ordering
//! - [`codec`] - Append-only, tombstone-preserving binary format
//! - [`catalog`] - Adapter traits and catalog/compliance application
//! - [`money`] - Integer money (minor units)
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Flat Arena**: children point at parents by `UniqId`; nothing owns a subtree
//! 2. **No I/O**: catalog, compliance and storage are behind traits or outside
//! 3. **Stable Wire**: codec positions are appended or tombstoned, never moved
//! 4. **Typed Errors**: every recoverable failure is an enum; an unregistered
//!    item type is a panic
//!
//! ## Example Usage
//!
//! ```rust
//! use basket_core::{codec, Item, Items, Money};
//!
//! let kettle = Item::product("30012345", 1, Money::from_minor(1999)).with_name("Kettle");
//! let mut warranty = Item::service("WRN-2Y", 1, Money::from_minor(499)).with_name("Warranty");
//! kettle.add_child(&mut warranty).unwrap();
//!
//! let items: Items = vec![kettle, warranty].into_iter().collect();
//! let bytes = codec::encode_items(&items).unwrap();
//! assert_eq!(codec::decode_items(&bytes).unwrap(), items);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod additions;
pub mod catalog;
pub mod codec;
pub mod collection;
pub mod config;
pub mod diag;
pub mod error;
pub mod fingerprint;
pub mod item;
pub mod money;
pub mod projection;
pub mod spec;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use additions::{Additions, Rules, SubRecord};
pub use collection::{CardinalityViolation, Items};
pub use diag::{Info, InfoId, Problem, ProblemCode};
pub use error::{CountError, InvalidType, ItemError, ItemResult, StructuralError};
pub use item::Item;
pub use money::Money;
pub use projection::{ItemQuantity, OrderLine};
pub use spec::{ItemType, Spec, SpecRegistry};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum count of a single item.
///
/// ## Business Reason
/// Prevents accidental over-ordering (typing 1000 instead of 10). Every
/// requested count is clamped to `[1, LIMIT_TOTAL_GOODS]`.
pub const LIMIT_TOTAL_GOODS: u32 = 999;

/// Packaging multiplicity of items sold by the piece.
pub const DEFAULT_COUNT_MULTIPLICITY: u32 = 1;

/// Catalog price column used until the pricing location is known.
pub const DEFAULT_PRICE_COLUMN: u32 = 1;
