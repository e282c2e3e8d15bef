//! # Type/Spec Registry
//!
//! Static structural rules for every item type.
//!
//! ## Registered Types
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Basket Tree Shapes                               │
//! │                                                                         │
//! │  Product (1)                        Configuration (4)                   │
//! │  ├── Service (2)                    ├── ConfProduct (5)  × N           │
//! │  └── SubcontractService (3)         └── ConfService (6)  (one)         │
//! │                                                                         │
//! │  Children types absent ⇒ the type is a leaf                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Enforcement Split
//! Item itself checks only "may this type hang under that type". Basket-wide
//! cardinality (one per basket, one per parent, count tied to parent) is
//! declared here but checked by the orchestrator, see
//! [`Items::cardinality_violations`](crate::collection::Items::cardinality_violations).
//!
//! The registry is built once on first use and never mutated. Asking it for
//! the Spec of a type it does not contain is a programmer error and panics.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;
use ts_rs::TS;

use crate::error::InvalidType;
use crate::types::CustomerKind;

// =============================================================================
// Item Type
// =============================================================================

/// Kind of basket line. The numeric code is persisted (wire position 3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    /// A catalog product bought on its own.
    Product,
    /// A digital/insurance service attached to a product.
    Service,
    /// An address-bound service (installation, delivery to floor) done by a contractor.
    SubcontractService,
    /// A "build" container with a fixed set of children.
    Configuration,
    /// A product inside a configuration.
    ConfProduct,
    /// The assembly service of a configuration.
    ConfService,
}

impl ItemType {
    pub const ALL: [ItemType; 6] = [
        ItemType::Product,
        ItemType::Service,
        ItemType::SubcontractService,
        ItemType::Configuration,
        ItemType::ConfProduct,
        ItemType::ConfService,
    ];

    /// Persisted numeric code.
    pub const fn code(&self) -> u32 {
        match self {
            ItemType::Product => 1,
            ItemType::Service => 2,
            ItemType::SubcontractService => 3,
            ItemType::Configuration => 4,
            ItemType::ConfProduct => 5,
            ItemType::ConfService => 6,
        }
    }

    pub fn from_code(code: u32) -> Result<Self, InvalidType> {
        ItemType::ALL
            .into_iter()
            .find(|t| t.code() == code)
            .ok_or(InvalidType { code })
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            ItemType::Product => "product",
            ItemType::Service => "service",
            ItemType::SubcontractService => "subcontract_service",
            ItemType::Configuration => "configuration",
            ItemType::ConfProduct => "conf_product",
            ItemType::ConfService => "conf_service",
        }
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Spec
// =============================================================================

/// Immutable structural rule record for one item type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spec {
    /// Types allowed directly under this one. Empty ⇒ cannot have children.
    pub children: &'static [ItemType],
    /// The item is meaningless without a parent.
    pub must_be_child: bool,
    pub deletable: bool,
    pub count_changeable: bool,
    pub one_per_basket: bool,
    pub one_per_parent: bool,
    pub count_equals_parent: bool,
    pub count_le_parent: bool,
    pub allowed_for_individual: bool,
    pub allowed_for_business: bool,
}

impl Spec {
    /// A standalone, freely editable leaf sold to everyone.
    pub const LEAF: Spec = Spec {
        children: &[],
        must_be_child: false,
        deletable: true,
        count_changeable: true,
        one_per_basket: false,
        one_per_parent: false,
        count_equals_parent: false,
        count_le_parent: false,
        allowed_for_individual: true,
        allowed_for_business: true,
    };

    pub fn children_types(&self) -> &'static [ItemType] {
        self.children
    }

    pub fn has_children_types(&self) -> bool {
        !self.children.is_empty()
    }

    /// Checks a child type against the process-wide registry.
    pub fn can_have_child(&self, child: ItemType) -> bool {
        self.can_have_child_in(SpecRegistry::global(), child)
    }

    /// Checks a child type against an injected registry.
    pub fn can_have_child_in(&self, registry: &SpecRegistry, child: ItemType) -> bool {
        self.has_children_types()
            && registry.validate(child).is_ok()
            && self.children.contains(&child)
    }

    pub fn is_allowed_for(&self, customer: CustomerKind) -> bool {
        match customer {
            CustomerKind::Individual => self.allowed_for_individual,
            CustomerKind::Business => self.allowed_for_business,
        }
    }
}

// =============================================================================
// Registry
// =============================================================================

static GLOBAL: LazyLock<SpecRegistry> = LazyLock::new(SpecRegistry::standard);

/// Type → Spec table.
#[derive(Debug, Clone)]
pub struct SpecRegistry {
    specs: HashMap<ItemType, Spec>,
}

impl SpecRegistry {
    /// The process-wide registry, built once on first use.
    pub fn global() -> &'static SpecRegistry {
        &GLOBAL
    }

    /// Builds an injected registry from explicit entries.
    pub fn from_specs(specs: impl IntoIterator<Item = (ItemType, Spec)>) -> Self {
        SpecRegistry {
            specs: specs.into_iter().collect(),
        }
    }

    /// The production rule table.
    pub fn standard() -> Self {
        SpecRegistry::from_specs([
            (
                ItemType::Product,
                Spec {
                    children: &[ItemType::Service, ItemType::SubcontractService],
                    ..Spec::LEAF
                },
            ),
            (
                ItemType::Service,
                Spec {
                    must_be_child: true,
                    count_le_parent: true,
                    ..Spec::LEAF
                },
            ),
            (
                ItemType::SubcontractService,
                Spec {
                    must_be_child: true,
                    count_changeable: false,
                    one_per_parent: true,
                    count_equals_parent: true,
                    allowed_for_business: false,
                    ..Spec::LEAF
                },
            ),
            (
                ItemType::Configuration,
                Spec {
                    children: &[ItemType::ConfProduct, ItemType::ConfService],
                    allowed_for_business: false,
                    ..Spec::LEAF
                },
            ),
            (
                ItemType::ConfProduct,
                Spec {
                    must_be_child: true,
                    deletable: false,
                    count_changeable: false,
                    count_equals_parent: true,
                    allowed_for_business: false,
                    ..Spec::LEAF
                },
            ),
            (
                ItemType::ConfService,
                Spec {
                    must_be_child: true,
                    count_changeable: false,
                    one_per_parent: true,
                    count_equals_parent: true,
                    allowed_for_business: false,
                    ..Spec::LEAF
                },
            ),
        ])
    }

    /// Fails if `item_type` has no registered Spec.
    pub fn validate(&self, item_type: ItemType) -> Result<(), InvalidType> {
        if self.specs.contains_key(&item_type) {
            Ok(())
        } else {
            Err(InvalidType {
                code: item_type.code(),
            })
        }
    }

    /// Parses a persisted type code and checks it is registered.
    pub fn validate_code(&self, code: u32) -> Result<ItemType, InvalidType> {
        let item_type = ItemType::from_code(code)?;
        self.validate(item_type)?;
        Ok(item_type)
    }

    /// Returns the Spec of a registered type.
    ///
    /// ## Panics
    /// If `item_type` is not registered. Every type is registered statically;
    /// a missing entry is a build defect and must not fall back to a default.
    pub fn spec(&self, item_type: ItemType) -> &Spec {
        match self.specs.get(&item_type) {
            Some(spec) => spec,
            None => panic!("item type {item_type} is not registered in the Spec registry"),
        }
    }

    /// Whether `child` may hang directly under `parent`.
    pub fn can_have_child(&self, parent: ItemType, child: ItemType) -> bool {
        self.spec(parent).can_have_child_in(self, child)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
