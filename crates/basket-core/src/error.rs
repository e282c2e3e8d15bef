//! # Error Types
//!
//! Domain-specific error types for basket-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  basket-core errors (this file)                                        │
//! │  ├── InvalidType      - Type code not present in the Spec registry     │
//! │  ├── StructuralError  - Illegal parent/child pairing                   │
//! │  ├── CountError       - Count not changeable / over max-count rule     │
//! │  └── ItemError        - Umbrella returned by collection operations     │
//! │                                                                         │
//! │  codec errors (codec::error)                                           │
//! │  └── DecodeError      - Positional path through nested records         │
//! │                                                                         │
//! │  Unregistered type on SpecRegistry::spec → panic (programmer error)    │
//! │                                                                         │
//! │  Flow: StructuralError / CountError → caller → user-facing message     │
//! │        DecodeError → persistence layer → logs/alerts only              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (types, ids, limits)
//! 3. Errors are enum variants, never String
//! 4. A failed mutation leaves the item untouched

use thiserror::Error;

use crate::spec::ItemType;
use crate::types::UniqId;

// =============================================================================
// Invalid Type
// =============================================================================

/// A type code that has no entry in the Spec registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Item type {code} is not registered")]
pub struct InvalidType {
    pub code: u32,
}

// =============================================================================
// Structural Error
// =============================================================================

/// Illegal tree mutation.
///
/// ## When This Occurs
/// - The parent's Spec does not list the child's type
/// - The child is already attached to a parent (re-parenting is not supported)
/// - An item is asked to become its own child
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructuralError {
    #[error("{child} cannot be a child of {parent}")]
    ChildNotAllowed { parent: ItemType, child: ItemType },

    #[error("Item {child} is already attached to a parent")]
    AlreadyAttached { child: UniqId },

    #[error("Item cannot be attached to itself")]
    SelfReference,
}

// =============================================================================
// Count Error
// =============================================================================

/// Rejected count change.
///
/// ## User Workflow
/// ```text
/// Change Quantity (qty: 12)
///      │
///      ▼
/// Round to packaging multiple, check max-count rule (limit: 10)
///      │
///      ▼
/// MaxItemCount { limit: 10 }
///      │
///      ▼
/// UI shows: "No more than 10 items available"
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CountError {
    #[error("Count of {item_type} items cannot be changed")]
    NotChangeable { item_type: ItemType },

    #[error("Count exceeds maximum allowed ({limit})")]
    MaxItemCount { limit: u32 },
}

impl CountError {
    /// Returns the max-count limit for `MaxItemCount`, if that is what this is.
    pub fn limit(&self) -> Option<u32> {
        match self {
            CountError::MaxItemCount { limit } => Some(*limit),
            CountError::NotChangeable { .. } => None,
        }
    }
}

// =============================================================================
// Item Error
// =============================================================================

/// Errors surfaced by collection-level operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ItemError {
    #[error("Item not found: {0}")]
    NotFound(UniqId),

    #[error(transparent)]
    Structural(#[from] StructuralError),

    #[error(transparent)]
    Count(#[from] CountError),
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with ItemError.
pub type ItemResult<T> = Result<T, ItemError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = StructuralError::ChildNotAllowed {
            parent: ItemType::Service,
            child: ItemType::Product,
        };
        assert_eq!(err.to_string(), "product cannot be a child of service");

        let err = CountError::MaxItemCount { limit: 10 };
        assert_eq!(err.to_string(), "Count exceeds maximum allowed (10)");

        assert_eq!(
            InvalidType { code: 42 }.to_string(),
            "Item type 42 is not registered"
        );
    }

    #[test]
    fn test_count_error_limit() {
        assert_eq!(CountError::MaxItemCount { limit: 7 }.limit(), Some(7));
        let err = CountError::NotChangeable {
            item_type: ItemType::ConfProduct,
        };
        assert_eq!(err.limit(), None);
    }

    #[test]
    fn test_structural_converts_to_item_error() {
        let err: ItemError = StructuralError::SelfReference.into();
        assert!(matches!(err, ItemError::Structural(_)));

        let err: ItemError = CountError::MaxItemCount { limit: 1 }.into();
        assert!(matches!(err, ItemError::Count(_)));
    }
}
