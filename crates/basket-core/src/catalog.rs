//! # Catalog Application
//!
//! Adapter traits for the catalog, compliance and city-service collaborators,
//! plus the pure functions that fold their answers into items.
//!
//! ## Data Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │   CatalogLookup ──► CatalogOffer ──► Item::apply_offer                  │
//! │                                         ├── name · price · multiplicity │
//! │                                         ├── product additions           │
//! │                                         ├── Info: PriceChanged          │
//! │                                         └── Problem: NotAvailable       │
//! │                                                                         │
//! │   ComplianceLookup ──► ResaleDecision ──► Item::apply_resale_decision  │
//! │                                                                         │
//! │   CityServiceLookup ──► bool ──► Item::apply_city_availability         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The adapters themselves live outside this crate (HTTP clients, caches).
//! Nothing here performs I/O; the `apply_*` helpers only call the trait.

use std::collections::HashMap;

use tracing::debug;

use crate::additions::{ProductAdditions, SubRecord};
use crate::collection::Items;
use crate::diag::{Info, Problem, ProblemCode};
use crate::item::Item;
use crate::money::Money;
use crate::spec::ItemType;
use crate::types::{ItemId, PriceColumn, SpaceId, TaxRate};
use crate::validation::{self, normalize_count};

// =============================================================================
// Collaborator Data
// =============================================================================

/// Catalog answer for one item id in one sales space.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogOffer {
    pub item_id: ItemId,
    pub name: String,
    pub image: String,
    /// Price per catalog price column.
    pub prices: HashMap<PriceColumn, Money>,
    pub available: bool,
    pub stock: u32,
    pub multiplicity: u32,
    pub tax_rate: TaxRate,
    pub category: String,
    pub brand: String,
    pub credit_eligible: bool,
}

impl CatalogOffer {
    /// Price in `column`, zero when the column is not priced.
    pub fn price_for(&self, column: PriceColumn) -> Money {
        self.prices.get(&column).copied().unwrap_or_default()
    }
}

/// Compliance answer for a regulated resale purchase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResaleDecision {
    pub item_id: ItemId,
    pub allowed: bool,
    /// Human-readable commodity group name.
    pub commodity_group: String,
}

// =============================================================================
// Adapter Traits
// =============================================================================

pub trait CatalogLookup {
    type Error: std::error::Error;

    /// `Ok(None)` when the catalog does not know the item.
    fn offer(
        &self,
        item_id: &ItemId,
        space_id: &SpaceId,
    ) -> Result<Option<CatalogOffer>, Self::Error>;
}

pub trait ComplianceLookup {
    type Error: std::error::Error;

    fn resale_decision(&self, item_id: &ItemId) -> Result<Option<ResaleDecision>, Self::Error>;
}

pub trait CityServiceLookup {
    type Error: std::error::Error;

    fn available_in_city(&self, item_id: &ItemId, city_id: &str) -> Result<bool, Self::Error>;
}

// =============================================================================
// Per-Item Application
// =============================================================================

impl Item {
    /// Applies a catalog offer, or its absence.
    ///
    /// ## Steps
    /// 1. Missing offer: mark the product unavailable, add `NotAvailable`
    /// 2. Copy name, price for this item's column and multiplicity
    /// 3. Record `PriceChanged` when a non-zero price moved
    /// 4. Fill the product additions and mark availability checked
    /// 5. Add `NotAvailable` when the price is 0 or the offer is unavailable
    pub fn apply_offer(&mut self, offer: Option<&CatalogOffer>) {
        let Some(offer) = offer else {
            self.product_slot().update(|p| {
                p.available = false;
                p.availability_checked = true;
            });
            self.add_problem(Problem::not_available());
            return;
        };

        let price = offer.price_for(self.price_column);
        if !self.price.is_zero() && price != self.price {
            self.add_info(Info::price_changed(self.price, price));
        }
        self.name = offer.name.clone();
        self.price = price;

        let multiplicity = validation::effective_multiplicity(offer.multiplicity);
        if multiplicity != self.count_multiplicity {
            self.count_multiplicity = multiplicity;
            let rounded = normalize_count(self.count, multiplicity);
            if rounded != self.count {
                self.add_info(Info::count_changed(self.count, rounded));
                self.count = rounded;
            }
        }

        self.product_slot().set(ProductAdditions {
            availability_checked: true,
            available: offer.available,
            stock: offer.stock,
            tax_rate: offer.tax_rate,
            category: offer.category.clone(),
            brand: offer.brand.clone(),
            image: offer.image.clone(),
            credit_eligible: offer.credit_eligible,
        });

        if price.is_zero() || !offer.available {
            self.add_problem(Problem::not_available());
        }
        debug!(
            uniq_id = %self.uniq_id,
            price = %price,
            available = offer.available,
            "Applied catalog offer"
        );
    }

    /// Stores the commodity group and flags a forbidden resale.
    pub fn apply_resale_decision(&mut self, decision: &ResaleDecision) {
        self.rules.update(|rules| {
            rules.resale_allowed = decision.allowed;
            rules.commodity_group = decision.commodity_group.clone();
        });
        if !decision.allowed {
            self.add_problem(Problem::new(
                ProblemCode::ResaleForbidden,
                format!("Resale of {} is not allowed", decision.commodity_group),
            ));
        }
    }

    /// Records whether an address-bound service is offered in the customer's
    /// city. No-op for items without a subcontract slot.
    pub fn apply_city_availability(&mut self, available: bool) {
        let Some(subcontract) = &self.additions.subcontract else {
            return;
        };
        subcontract.update(|s| s.available_in_city = available);
        if !available {
            self.add_problem(Problem::new(
                ProblemCode::ServiceUnavailableInCity,
                "Service is not available in this city",
            ));
        }
    }

    /// Installs a max-count rule from the available package count and
    /// reduces the count when it no longer fits.
    pub fn limit_by_availability(&mut self, max_available: u32) {
        let limit = self.calculate_max_count(max_available);
        self.rules.update(|rules| rules.max_count = limit);

        if limit == 0 {
            self.add_problem(Problem::not_available());
            return;
        }
        if self.count > limit {
            let old = self.count;
            self.force_count(limit);
            self.add_problem(Problem::count_reduced(limit));
            self.add_info(Info::count_changed(old, limit));
            debug!(
                uniq_id = %self.uniq_id,
                from = old,
                to = limit,
                "Count reduced by availability"
            );
        }
    }

    fn product_slot(&mut self) -> &SubRecord<ProductAdditions> {
        self.additions.product.get_or_insert_with(SubRecord::default)
    }
}

// =============================================================================
// Basket-Wide Passes
// =============================================================================

fn is_catalog_priced(item_type: ItemType) -> bool {
    matches!(item_type, ItemType::Product | ItemType::ConfProduct)
}

/// Looks up and applies an offer for every catalog-priced item.
pub fn apply_catalog<L: CatalogLookup>(items: &mut Items, lookup: &L) -> Result<(), L::Error> {
    for item in items.iter_mut().filter(|i| is_catalog_priced(i.item_type())) {
        let offer = lookup.offer(item.item_id(), item.space_id())?;
        item.apply_offer(offer.as_ref());
    }
    Ok(())
}

/// Applies compliance decisions to every item the compliance service knows.
pub fn apply_compliance<L: ComplianceLookup>(
    items: &mut Items,
    lookup: &L,
) -> Result<(), L::Error> {
    for item in items.iter_mut() {
        if let Some(decision) = lookup.resale_decision(item.item_id())? {
            item.apply_resale_decision(&decision);
        }
    }
    Ok(())
}

/// Checks every subcontract service against the city recorded on it.
pub fn apply_city_services<L: CityServiceLookup>(
    items: &mut Items,
    lookup: &L,
) -> Result<(), L::Error> {
    for item in items.iter_mut() {
        let Some(city_id) = item
            .additions()
            .subcontract
            .as_ref()
            .map(|s| s.read(|s| s.city_id.clone()))
        else {
            continue;
        };
        let available = lookup.available_in_city(item.item_id(), &city_id)?;
        item.apply_city_availability(available);
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diag::InfoId;
    use crate::error::CountError;
    use std::fmt;

    fn offer(price: i64) -> CatalogOffer {
        CatalogOffer {
            item_id: ItemId::new("30012345"),
            name: "Kettle".into(),
            image: "kettle.png".into(),
            prices: HashMap::from([(
                PriceColumn::new(crate::DEFAULT_PRICE_COLUMN),
                Money::from_minor(price),
            )]),
            available: true,
            stock: 8,
            multiplicity: 1,
            tax_rate: TaxRate::from_bps(2000),
            category: "kitchen".into(),
            brand: "Acme".into(),
            credit_eligible: false,
        }
    }

    #[test]
    fn test_apply_offer_fills_item() {
        let mut item = Item::product("30012345", 2, Money::zero());
        item.apply_offer(Some(&offer(1999)));

        assert_eq!(item.name(), "Kettle");
        assert_eq!(item.price(), Money::from_minor(1999));
        assert!(!item.has_problem(ProblemCode::NotAvailable));
        // First pricing is not a change.
        assert!(item.info(InfoId::PriceChanged).is_none());

        let product = item.product_additions().unwrap().get();
        assert!(product.availability_checked);
        assert_eq!(product.stock, 8);
        assert_eq!(product.brand, "Acme");
    }

    #[test]
    fn test_price_change_is_reported() {
        let mut item = Item::product("30012345", 1, Money::from_minor(1500));
        item.apply_offer(Some(&offer(1999)));

        let info = item.info(InfoId::PriceChanged).unwrap();
        assert_eq!(info.old_value, 1500);
        assert_eq!(info.new_value, 1999);
    }

    #[test]
    fn test_zero_price_is_not_available() {
        let mut item = Item::product("30012345", 1, Money::from_minor(1500));
        item.apply_offer(Some(&offer(0)));
        assert!(item.has_problem(ProblemCode::NotAvailable));

        let mut unpriced = Item::product("30012345", 1, Money::zero())
            .with_pricing_location(SpaceId::new("spb"), PriceColumn::new(9));
        unpriced.apply_offer(Some(&offer(1999)));
        assert!(unpriced.price().is_zero());
        assert!(unpriced.has_problem(ProblemCode::NotAvailable));
    }

    #[test]
    fn test_missing_offer() {
        let mut item = Item::product("30012345", 1, Money::from_minor(1500));
        item.apply_offer(None);

        assert!(item.has_problem(ProblemCode::NotAvailable));
        let product = item.product_additions().unwrap().get();
        assert!(product.availability_checked);
        assert!(!product.available);
    }

    #[test]
    fn test_offer_multiplicity_rounds_count() {
        let mut item = Item::product("30012345", 15, Money::from_minor(100));
        let mut packed = offer(100);
        packed.multiplicity = 6;
        item.apply_offer(Some(&packed));

        assert_eq!(item.count_multiplicity(), 6);
        assert_eq!(item.count(), 12);
        assert_eq!(item.info(InfoId::CountChanged).map(|i| i.new_value), Some(12));
    }

    #[test]
    fn test_resale_decision() {
        let mut item = Item::product("30012345", 1, Money::from_minor(100));
        item.apply_resale_decision(&ResaleDecision {
            item_id: ItemId::new("30012345"),
            allowed: false,
            commodity_group: "alcohol".into(),
        });

        assert!(item.has_problem(ProblemCode::ResaleForbidden));
        let rules = item.rules().get();
        assert!(!rules.resale_allowed);
        assert_eq!(rules.commodity_group, "alcohol");
    }

    #[test]
    fn test_city_availability_only_touches_subcontracts() {
        let mut install =
            Item::new(ItemType::SubcontractService, "INSTALL", 1, Money::from_minor(500));
        install.apply_city_availability(false);
        assert!(install.has_problem(ProblemCode::ServiceUnavailableInCity));

        let mut product = Item::product("30012345", 1, Money::from_minor(100));
        product.apply_city_availability(false);
        assert!(product.problems().is_empty());
    }

    #[test]
    fn test_limit_by_availability_reduces_count() {
        let mut item = Item::product("30012345", 10, Money::from_minor(100));
        item.limit_by_availability(4);

        assert_eq!(item.count(), 4);
        assert!(item.has_problem(ProblemCode::CountReduced));
        assert_eq!(item.info(InfoId::CountChanged).map(|i| i.old_value), Some(10));
        assert_eq!(item.rules().get().max_count, 4);
        assert_eq!(item.set_count(5), Err(CountError::MaxItemCount { limit: 4 }));
    }

    #[test]
    fn test_limit_within_availability_keeps_count() {
        let mut item = Item::product("30012345", 2, Money::from_minor(100));
        item.limit_by_availability(4);
        assert_eq!(item.count(), 2);
        assert!(item.problems().is_empty());
    }

    // -------------------------------------------------------------------------
    // Basket-wide passes against in-memory adapters
    // -------------------------------------------------------------------------

    #[derive(Debug)]
    struct Unreachable;

    impl fmt::Display for Unreachable {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("service unreachable")
        }
    }

    impl std::error::Error for Unreachable {}

    struct StaticCatalog(HashMap<ItemId, CatalogOffer>);

    impl CatalogLookup for StaticCatalog {
        type Error = Unreachable;

        fn offer(
            &self,
            item_id: &ItemId,
            _: &SpaceId,
        ) -> Result<Option<CatalogOffer>, Unreachable> {
            Ok(self.0.get(item_id).cloned())
        }
    }

    struct DownCompliance;

    impl ComplianceLookup for DownCompliance {
        type Error = Unreachable;

        fn resale_decision(&self, _: &ItemId) -> Result<Option<ResaleDecision>, Unreachable> {
            Err(Unreachable)
        }
    }

    struct NoCities;

    impl CityServiceLookup for NoCities {
        type Error = Unreachable;

        fn available_in_city(&self, _: &ItemId, city_id: &str) -> Result<bool, Unreachable> {
            Ok(city_id != "remote")
        }
    }

    #[test]
    fn test_apply_catalog_pass() {
        let kettle = Item::product("30012345", 1, Money::zero());
        let unknown = Item::product("99999999", 1, Money::from_minor(100));
        let warranty = Item::service("WRN", 1, Money::from_minor(100));
        let (kettle_id, unknown_id, warranty_id) =
            (kettle.uniq_id(), unknown.uniq_id(), warranty.uniq_id());
        let mut items: Items = vec![kettle, unknown, warranty].into_iter().collect();

        let catalog = StaticCatalog(HashMap::from([(ItemId::new("30012345"), offer(1999))]));
        apply_catalog(&mut items, &catalog).unwrap();

        assert_eq!(items.get(&kettle_id).unwrap().price(), Money::from_minor(1999));
        assert!(items.get(&unknown_id).unwrap().has_problem(ProblemCode::NotAvailable));
        assert!(items.get(&warranty_id).unwrap().problems().is_empty());
    }

    #[test]
    fn test_adapter_errors_propagate() {
        let mut items: Items = vec![Item::product("30012345", 1, Money::zero())]
            .into_iter()
            .collect();
        assert!(apply_compliance(&mut items, &DownCompliance).is_err());
    }

    #[test]
    fn test_apply_city_services_pass() {
        let install = Item::new(ItemType::SubcontractService, "INSTALL", 1, Money::from_minor(500));
        if let Some(subcontract) = &install.additions().subcontract {
            subcontract.update(|s| s.city_id = "remote".into());
        }
        let id = install.uniq_id();
        let mut items: Items = vec![install].into_iter().collect();

        apply_city_services(&mut items, &NoCities).unwrap();
        let install = items.get(&id).unwrap();
        assert!(install.has_problem(ProblemCode::ServiceUnavailableInCity));
        assert_eq!(
            install.additions().subcontract.as_ref().map(|s| s.get().available_in_city),
            Some(false)
        );
    }
}
