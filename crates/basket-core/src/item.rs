//! # Item Aggregate
//!
//! One line of the basket tree: a product, an attached service or a
//! configuration container.
//!
//! ## Anatomy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                              Item                                       │
//! │                                                                         │
//! │  identity      uniq_id (immutable) · item_id · type                    │
//! │                parent_uniq_id / parent_item_id (set at most once)       │
//! │                                                                         │
//! │  commercial    count · price · bonus · count_multiplicity · selected   │
//! │                space_id · price_column                                  │
//! │                                                                         │
//! │  diagnostics   problems (transient + simulated) · infos (one per id)   │
//! │                                                                         │
//! │  extension     additions (4 locked slots) · rules (locked)             │
//! │                                                                         │
//! │  tracking      commit_fingerprint ──► is_changed()                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Ownership Contract
//! The scalar fields carry no locks: exactly one logical owner mutates them
//! per refresh pass. The additions slots and the rules record are each behind
//! their own lock so separate workers can fill them concurrently.
//!
//! ## Tree Links
//! Children are not owned. A child points at its parent by `UniqId`; the
//! [`Items`](crate::collection::Items) collection resolves the links.

use tracing::{debug, warn};

use crate::additions::{Additions, ProductAdditions, Rules, SubRecord};
use crate::diag::{Diagnostics, Info, InfoId, Problem, ProblemCode};
use crate::error::{CountError, StructuralError};
use crate::fingerprint;
use crate::money::Money;
use crate::spec::{ItemType, Spec, SpecRegistry};
use crate::types::{ItemId, PriceColumn, SpaceId, UniqId};
use crate::validation::{self, normalize_count};
use crate::{DEFAULT_COUNT_MULTIPLICITY, DEFAULT_PRICE_COLUMN};

// =============================================================================
// Item
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub(crate) uniq_id: UniqId,
    pub(crate) item_id: ItemId,
    pub(crate) item_type: ItemType,
    pub(crate) parent_uniq_id: Option<UniqId>,
    pub(crate) parent_item_id: Option<ItemId>,
    pub(crate) name: String,
    pub(crate) space_id: SpaceId,
    pub(crate) price_column: PriceColumn,
    pub(crate) count: u32,
    pub(crate) price: Money,
    pub(crate) bonus: Money,
    pub(crate) count_multiplicity: u32,
    pub(crate) is_selected: bool,
    pub(crate) diagnostics: Diagnostics,
    pub(crate) additions: Additions,
    pub(crate) rules: SubRecord<Rules>,
    pub(crate) commit_fingerprint: String,
}

impl Item {
    /// Creates a fully-formed item with a fresh `UniqId`.
    ///
    /// The count is clamped to `[1, LIMIT_TOTAL_GOODS]`; the item starts
    /// selected for purchase with the additions slot of its type populated.
    pub fn new(item_type: ItemType, item_id: impl Into<ItemId>, count: u32, price: Money) -> Self {
        Item {
            uniq_id: UniqId::generate(),
            item_id: item_id.into(),
            item_type,
            parent_uniq_id: None,
            parent_item_id: None,
            name: String::new(),
            space_id: SpaceId::default(),
            price_column: PriceColumn::new(DEFAULT_PRICE_COLUMN),
            count: normalize_count(count, DEFAULT_COUNT_MULTIPLICITY),
            price,
            bonus: Money::zero(),
            count_multiplicity: DEFAULT_COUNT_MULTIPLICITY,
            is_selected: true,
            diagnostics: Diagnostics::default(),
            additions: Additions::for_type(item_type),
            rules: SubRecord::default(),
            commit_fingerprint: String::new(),
        }
    }

    pub fn product(item_id: impl Into<ItemId>, count: u32, price: Money) -> Self {
        Item::new(ItemType::Product, item_id, count, price)
    }

    pub fn service(item_id: impl Into<ItemId>, count: u32, price: Money) -> Self {
        Item::new(ItemType::Service, item_id, count, price)
    }

    pub fn configuration(item_id: impl Into<ItemId>, count: u32, price: Money) -> Self {
        Item::new(ItemType::Configuration, item_id, count, price)
    }

    /// Placeholder the codec decodes into. Fields the payload does not carry
    /// keep these values.
    pub(crate) fn blank() -> Self {
        Item {
            uniq_id: UniqId::nil(),
            item_id: ItemId::default(),
            item_type: ItemType::Product,
            parent_uniq_id: None,
            parent_item_id: None,
            name: String::new(),
            space_id: SpaceId::default(),
            price_column: PriceColumn::default(),
            count: 0,
            price: Money::zero(),
            bonus: Money::zero(),
            count_multiplicity: 0,
            is_selected: true,
            diagnostics: Diagnostics::default(),
            additions: Additions::default(),
            rules: SubRecord::default(),
            commit_fingerprint: String::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_bonus(mut self, bonus: Money) -> Self {
        self.bonus = bonus;
        self
    }

    /// Sets the packaging multiplicity and re-rounds the current count.
    pub fn with_multiplicity(mut self, multiplicity: u32) -> Self {
        self.count_multiplicity = validation::effective_multiplicity(multiplicity);
        self.count = normalize_count(self.count, self.count_multiplicity);
        self
    }

    pub fn with_pricing_location(mut self, space_id: SpaceId, price_column: PriceColumn) -> Self {
        self.space_id = space_id;
        self.price_column = price_column;
        self
    }

    // =========================================================================
    // Identity
    // =========================================================================

    pub fn uniq_id(&self) -> UniqId {
        self.uniq_id
    }

    pub fn item_id(&self) -> &ItemId {
        &self.item_id
    }

    /// Replaces the catalog reference (e.g. a superseded product code).
    pub fn set_item_id(&mut self, item_id: impl Into<ItemId>) {
        self.item_id = item_id.into();
    }

    pub fn item_type(&self) -> ItemType {
        self.item_type
    }

    pub fn parent_uniq_id(&self) -> Option<UniqId> {
        self.parent_uniq_id
    }

    pub fn parent_item_id(&self) -> Option<&ItemId> {
        self.parent_item_id.as_ref()
    }

    pub fn has_parent(&self) -> bool {
        self.parent_uniq_id.is_some()
    }

    /// Structural rules of this item's type.
    ///
    /// ## Panics
    /// If the type is missing from the global registry.
    pub fn spec(&self) -> &'static Spec {
        self.spec_in(SpecRegistry::global())
    }

    /// Structural rules of this item's type in an injected registry.
    pub fn spec_in<'r>(&self, registry: &'r SpecRegistry) -> &'r Spec {
        registry.spec(self.item_type)
    }

    pub fn is_deletable(&self) -> bool {
        self.spec().deletable
    }

    // =========================================================================
    // Tree Mutation
    // =========================================================================

    /// Attaches `child` under this item.
    ///
    /// Only the child's parent links change. On error neither item is touched.
    pub fn add_child(&self, child: &mut Item) -> Result<(), StructuralError> {
        self.add_child_in(SpecRegistry::global(), child)
    }

    /// [`Item::add_child`] checked against an injected registry.
    pub fn add_child_in(
        &self,
        registry: &SpecRegistry,
        child: &mut Item,
    ) -> Result<(), StructuralError> {
        child.make_child_of_in(registry, self)
    }

    /// Attaches this item under `parent`. Mirror of [`Item::add_child`].
    pub fn make_child_of(&mut self, parent: &Item) -> Result<(), StructuralError> {
        self.make_child_of_in(SpecRegistry::global(), parent)
    }

    pub fn make_child_of_in(
        &mut self,
        registry: &SpecRegistry,
        parent: &Item,
    ) -> Result<(), StructuralError> {
        self.link_parent(registry, parent.item_type, parent.uniq_id, &parent.item_id)
    }

    pub(crate) fn link_parent(
        &mut self,
        registry: &SpecRegistry,
        parent_type: ItemType,
        parent_uniq_id: UniqId,
        parent_item_id: &ItemId,
    ) -> Result<(), StructuralError> {
        if parent_uniq_id == self.uniq_id {
            return Err(StructuralError::SelfReference);
        }
        if self.parent_uniq_id.is_some() {
            return Err(StructuralError::AlreadyAttached {
                child: self.uniq_id,
            });
        }
        if !registry.can_have_child(parent_type, self.item_type) {
            return Err(StructuralError::ChildNotAllowed {
                parent: parent_type,
                child: self.item_type,
            });
        }

        self.parent_uniq_id = Some(parent_uniq_id);
        self.parent_item_id = Some(parent_item_id.clone());
        debug!(child = %self.uniq_id, parent = %parent_uniq_id, "Attached item to parent");
        Ok(())
    }

    // =========================================================================
    // Commercial State
    // =========================================================================

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn count_multiplicity(&self) -> u32 {
        self.count_multiplicity
    }

    /// Sets the packaging multiplicity and re-rounds the current count.
    ///
    /// A count that moves forces the next availability check.
    pub fn set_count_multiplicity(&mut self, multiplicity: u32) {
        self.count_multiplicity = validation::effective_multiplicity(multiplicity);
        let rounded = normalize_count(self.count, self.count_multiplicity);
        if rounded != self.count {
            self.count = rounded;
            self.reset_availability_check();
        }
    }

    /// Changes the item count.
    ///
    /// ## Steps
    /// 1. Reject types whose Spec forbids count changes
    /// 2. Clamp to `[1, LIMIT_TOTAL_GOODS]` and round to the multiplicity
    /// 3. Reject results above an active max-count rule, returning the limit
    /// 4. Store and force the next availability check
    ///
    /// A rejected request leaves `count` unchanged.
    pub fn set_count(&mut self, count: u32) -> Result<(), CountError> {
        self.set_count_in(SpecRegistry::global(), count)
    }

    /// [`Item::set_count`] with the Spec taken from an injected registry.
    pub fn set_count_in(&mut self, registry: &SpecRegistry, count: u32) -> Result<(), CountError> {
        if !self.spec_in(registry).count_changeable {
            return Err(CountError::NotChangeable {
                item_type: self.item_type,
            });
        }

        let rounded = normalize_count(count, self.count_multiplicity);
        let limit = self.rules.read(|r| r.max_count);
        if limit > 0 && rounded > limit {
            warn!(
                uniq_id = %self.uniq_id,
                requested = count,
                limit,
                "Count rejected by max-count rule"
            );
            return Err(CountError::MaxItemCount { limit });
        }

        self.count = rounded;
        self.reset_availability_check();
        debug!(uniq_id = %self.uniq_id, count = rounded, "Count changed");
        Ok(())
    }

    /// Stores a count chosen by the core itself (availability reductions).
    pub(crate) fn force_count(&mut self, count: u32) {
        self.count = count;
        self.reset_availability_check();
    }

    fn reset_availability_check(&self) {
        if let Some(product) = &self.additions.product {
            product.update(|p| p.availability_checked = false);
        }
    }

    /// Converts an availability limit in packages into an item-count limit.
    pub fn calculate_max_count(&self, max_available: u32) -> u32 {
        validation::calculate_max_count(max_available, self.count_multiplicity)
    }

    pub fn price(&self) -> Money {
        self.price
    }

    pub fn set_price(&mut self, price: Money) {
        self.price = price;
    }

    pub fn bonus(&self) -> Money {
        self.bonus
    }

    pub fn set_bonus(&mut self, bonus: Money) {
        self.bonus = bonus;
    }

    pub fn space_id(&self) -> &SpaceId {
        &self.space_id
    }

    pub fn price_column(&self) -> PriceColumn {
        self.price_column
    }

    pub fn set_pricing_location(&mut self, space_id: SpaceId, price_column: PriceColumn) {
        self.space_id = space_id;
        self.price_column = price_column;
    }

    pub fn is_selected(&self) -> bool {
        self.is_selected
    }

    /// Opts the item in or out of the purchase. Problems added while the item
    /// is unselected are hidden.
    pub fn set_selected(&mut self, selected: bool) {
        self.is_selected = selected;
    }

    /// Price × count.
    pub fn line_total(&self) -> Money {
        self.price.multiply_count(self.count)
    }

    // =========================================================================
    // Change Tracking
    // =========================================================================

    /// Decimal FNV-1a fingerprint of space, price column, item id, count, price.
    pub fn fingerprint(&self) -> String {
        fingerprint::fingerprint(
            &self.space_id,
            self.price_column,
            &self.item_id,
            self.count,
            self.price,
        )
    }

    /// Snapshots the current fingerprint.
    pub fn commit_changes(&mut self) {
        self.commit_fingerprint = self.fingerprint();
    }

    pub fn is_changed(&self) -> bool {
        self.fingerprint() != self.commit_fingerprint
    }

    pub fn commit_fingerprint(&self) -> &str {
        &self.commit_fingerprint
    }

    // =========================================================================
    // Diagnostics
    // =========================================================================

    /// Appends a transient problem; hidden when the item is unselected.
    pub fn add_problem(&mut self, problem: Problem) {
        self.diagnostics.add_problem(problem, !self.is_selected);
    }

    /// Transient problems followed by simulated ones.
    pub fn problems(&self) -> Vec<Problem> {
        self.diagnostics.problems()
    }

    pub fn has_problem(&self, code: ProblemCode) -> bool {
        self.diagnostics.has_problem(code)
    }

    pub fn clear_problems(&mut self) {
        self.diagnostics.clear_problems();
    }

    /// Replaces the debug-only simulated problems.
    pub fn set_simulated_problems(&mut self, problems: Vec<Problem>) {
        self.diagnostics.set_simulated(problems);
    }

    pub fn add_info(&mut self, info: Info) {
        self.diagnostics.add_info(info);
    }

    /// Acknowledges one info. Returns it if it was active.
    pub fn commit_info(&mut self, id: InfoId) -> Option<Info> {
        let committed = self.diagnostics.commit_info(id);
        if committed.is_some() {
            debug!(uniq_id = %self.uniq_id, info = ?id, "Info committed");
        }
        committed
    }

    pub fn info(&self, id: InfoId) -> Option<&Info> {
        self.diagnostics.info(id)
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    // =========================================================================
    // Extension Data
    // =========================================================================

    pub fn additions(&self) -> &Additions {
        &self.additions
    }

    pub fn additions_mut(&mut self) -> &mut Additions {
        &mut self.additions
    }

    pub fn product_additions(&self) -> Option<&SubRecord<ProductAdditions>> {
        self.additions.product.as_ref()
    }

    pub fn rules(&self) -> &SubRecord<Rules> {
        &self.rules
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
