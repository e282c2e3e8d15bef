//! # Item Additions
//!
//! Type-specific extension data attached to an item, and the per-record lock
//! that lets refresh workers touch them concurrently.
//!
//! ## Locking Granularity
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                              Item                                       │
//! │                                                                         │
//! │  count, price, bonus, diagnostics ── NO LOCK (one owner per pass)      │
//! │                                                                         │
//! │  additions                                                             │
//! │  ├── product       SubRecord<ProductAdditions>       ◄─ RwLock         │
//! │  ├── configuration SubRecord<ConfigurationAdditions> ◄─ RwLock         │
//! │  ├── subcontract   SubRecord<SubcontractAdditions>   ◄─ RwLock         │
//! │  └── service       SubRecord<ServiceAdditions>       ◄─ RwLock         │
//! │  rules             SubRecord<Rules>                  ◄─ RwLock         │
//! │                                                                         │
//! │  Availability worker writes `product` while the compliance worker      │
//! │  writes `rules` of the same item: no contention between them.          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Which slot is populated follows the item type (see [`Additions::for_type`]).
//! Slots are plain options so payloads written before a slot existed still
//! decode.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::spec::ItemType;
use crate::types::TaxRate;

// =============================================================================
// SubRecord
// =============================================================================

/// A value behind its own reader/writer lock.
///
/// Many concurrent readers or one writer. Accessors never hand out guards, so
/// a lock is never held across caller code.
#[derive(Debug, Default)]
pub struct SubRecord<T> {
    inner: RwLock<T>,
}

impl<T> SubRecord<T> {
    pub fn new(value: T) -> Self {
        SubRecord {
            inner: RwLock::new(value),
        }
    }

    /// Runs `f` under the read lock.
    pub fn read<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.read())
    }

    /// Runs `f` under the write lock.
    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        f(&mut self.inner.write())
    }

    /// Replaces the whole value.
    pub fn set(&self, value: T) {
        *self.inner.write() = value;
    }

    pub fn into_inner(self) -> T {
        self.inner.into_inner()
    }
}

impl<T: Clone> SubRecord<T> {
    /// Snapshot of the current value.
    pub fn get(&self) -> T {
        self.inner.read().clone()
    }
}

impl<T: Clone> Clone for SubRecord<T> {
    fn clone(&self) -> Self {
        SubRecord::new(self.get())
    }
}

impl<T: PartialEq> PartialEq for SubRecord<T> {
    fn eq(&self, other: &Self) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }
        *self.inner.read() == *other.inner.read()
    }
}

// =============================================================================
// Product Additions
// =============================================================================

/// Catalog-derived state of a product line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductAdditions {
    /// Cleared whenever the count changes so the next pass re-checks stock.
    pub availability_checked: bool,
    pub available: bool,
    pub stock: u32,
    pub tax_rate: TaxRate,
    pub category: String,
    pub brand: String,
    pub image: String,
    pub credit_eligible: bool,
}

// =============================================================================
// Configuration Additions
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigurationAdditions {
    pub configuration_id: String,
    pub title: String,
    pub assembled: bool,
}

// =============================================================================
// Subcontract Additions
// =============================================================================

/// When the contractor will come.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceSchedule {
    pub date: Option<DateTime<Utc>>,
    pub slot: String,
}

/// Address-bound service data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubcontractAdditions {
    pub city_id: String,
    pub address: String,
    pub available_in_city: bool,
    pub schedule: Option<ServiceSchedule>,
}

// =============================================================================
// Service Additions
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceAdditions {
    pub group_code: String,
    pub duration_months: u32,
}

// =============================================================================
// Rules
// =============================================================================

/// Per-item purchase rules supplied by pricing and compliance lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rules {
    /// Positive value activates a max-count limit for `set_count`.
    pub max_count: u32,
    pub resale_allowed: bool,
    pub commodity_group: String,
}

impl Default for Rules {
    fn default() -> Self {
        Rules {
            max_count: 0,
            resale_allowed: true,
            commodity_group: String::new(),
        }
    }
}

// =============================================================================
// Additions
// =============================================================================

/// The four extension slots of an item.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Additions {
    pub product: Option<SubRecord<ProductAdditions>>,
    pub configuration: Option<SubRecord<ConfigurationAdditions>>,
    pub subcontract: Option<SubRecord<SubcontractAdditions>>,
    pub service: Option<SubRecord<ServiceAdditions>>,
}

impl Additions {
    /// Empty additions with the slot that belongs to `item_type` populated.
    pub fn for_type(item_type: ItemType) -> Self {
        let mut additions = Additions::default();
        match item_type {
            ItemType::Product | ItemType::ConfProduct => {
                additions.product = Some(SubRecord::default());
            }
            ItemType::Configuration => {
                additions.configuration = Some(SubRecord::default());
            }
            ItemType::SubcontractService => {
                additions.subcontract = Some(SubRecord::default());
            }
            ItemType::Service | ItemType::ConfService => {
                additions.service = Some(SubRecord::default());
            }
        }
        additions
    }

    pub fn is_empty(&self) -> bool {
        self.product.is_none()
            && self.configuration.is_none()
            && self.subcontract.is_none()
            && self.service.is_none()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
