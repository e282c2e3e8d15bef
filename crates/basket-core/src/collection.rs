//! # Items Collection
//!
//! Flat, `UniqId`-indexed set of basket items. Tree structure is derived from
//! the parent back-references each item carries.
//!
//! ## Display Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Priority buckets (lower first), name within a bucket:                  │
//! │                                                                         │
//! │   0  Product                                                           │
//! │   1  Service, SubcontractService                                       │
//! │   2  Configuration                                                     │
//! │   3  ConfProduct                                                       │
//! │   4  ConfService                                                       │
//! │                                                                         │
//! │  Pre-order walk: every parent is followed by its own children          │
//! │                                                                         │
//! │   Kettle (0)                                                           │
//! │   ├── Installation (1)                                                 │
//! │   └── Warranty (1)                                                     │
//! │   Toaster (0)                                                          │
//! │   Gaming PC (2)                                                        │
//! │   ├── CPU (3)                                                          │
//! │   ├── GPU (3)                                                          │
//! │   └── Assembly (4)                                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Cardinality
//! One-per-basket, one-per-parent and count-tied-to-parent rules are only
//! reported here ([`Items::cardinality_violations`]); deciding what to do
//! about them belongs to the orchestrator.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use crate::error::{ItemError, ItemResult};
use crate::item::Item;
use crate::spec::{ItemType, SpecRegistry};
use crate::types::{ItemId, UniqId};

fn priority(item_type: ItemType) -> u8 {
    match item_type {
        ItemType::Product => 0,
        ItemType::Service | ItemType::SubcontractService => 1,
        ItemType::Configuration => 2,
        ItemType::ConfProduct => 3,
        ItemType::ConfService => 4,
    }
}

fn display_cmp(a: &Item, b: &Item) -> Ordering {
    priority(a.item_type())
        .cmp(&priority(b.item_type()))
        .then_with(|| a.name().cmp(b.name()))
        .then_with(|| a.uniq_id().cmp(&b.uniq_id()))
}

// =============================================================================
// Cardinality Violation
// =============================================================================

/// A basket-wide Spec rule that the current tree breaks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardinalityViolation {
    OnePerBasket {
        item_type: ItemType,
        found: usize,
    },
    OnePerParent {
        parent: UniqId,
        item_type: ItemType,
        found: usize,
    },
    CountNotEqualParent {
        child: UniqId,
        count: u32,
        parent_count: u32,
    },
    CountExceedsParent {
        child: UniqId,
        count: u32,
        parent_count: u32,
    },
    MissingParent {
        child: UniqId,
    },
}

// =============================================================================
// Items
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Items {
    items: HashMap<UniqId, Item>,
}

impl Items {
    pub fn new() -> Self {
        Items::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Adds an item, returning the one it replaced if the id was taken.
    pub fn insert(&mut self, item: Item) -> Option<Item> {
        self.items.insert(item.uniq_id(), item)
    }

    pub fn get(&self, uniq_id: &UniqId) -> Option<&Item> {
        self.items.get(uniq_id)
    }

    pub fn get_mut(&mut self, uniq_id: &UniqId) -> Option<&mut Item> {
        self.items.get_mut(uniq_id)
    }

    pub fn contains(&self, uniq_id: &UniqId) -> bool {
        self.items.contains_key(uniq_id)
    }

    /// Unordered iteration.
    pub fn iter(&self) -> impl Iterator<Item = &Item> {
        self.items.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Item> {
        self.items.values_mut()
    }

    /// Removes an item together with all of its descendants.
    pub fn remove(&mut self, uniq_id: &UniqId) -> Vec<Item> {
        let mut pending = vec![*uniq_id];
        let mut removed = Vec::new();
        while let Some(id) = pending.pop() {
            if let Some(item) = self.items.remove(&id) {
                pending.extend(
                    self.items
                        .values()
                        .filter(|i| i.parent_uniq_id() == Some(id))
                        .map(Item::uniq_id),
                );
                removed.push(item);
            }
        }
        removed
    }

    /// Links two items already in the collection.
    pub fn attach(&mut self, parent: &UniqId, child: &UniqId) -> ItemResult<()> {
        self.attach_in(SpecRegistry::global(), parent, child)
    }

    /// [`Items::attach`] checked against an injected registry.
    pub fn attach_in(
        &mut self,
        registry: &SpecRegistry,
        parent: &UniqId,
        child: &UniqId,
    ) -> ItemResult<()> {
        let (parent_type, parent_item_id) = {
            let parent_item = self.get(parent).ok_or(ItemError::NotFound(*parent))?;
            (parent_item.item_type(), parent_item.item_id().clone())
        };
        let child_item = self.get_mut(child).ok_or(ItemError::NotFound(*child))?;
        child_item.link_parent(registry, parent_type, *parent, &parent_item_id)?;
        Ok(())
    }

    /// Direct children in display order.
    pub fn children_of(&self, uniq_id: &UniqId) -> Vec<&Item> {
        let mut children: Vec<&Item> = self
            .items
            .values()
            .filter(|i| i.parent_uniq_id() == Some(*uniq_id))
            .collect();
        children.sort_by(|a, b| display_cmp(a, b));
        children
    }

    pub fn parent_of(&self, uniq_id: &UniqId) -> Option<&Item> {
        let parent = self.get(uniq_id)?.parent_uniq_id()?;
        self.get(&parent)
    }

    /// Items without a parent in this collection, in display order.
    pub fn roots(&self) -> Vec<&Item> {
        let mut roots: Vec<&Item> = self
            .items
            .values()
            .filter(|i| match i.parent_uniq_id() {
                Some(parent) => !self.items.contains_key(&parent),
                None => true,
            })
            .collect();
        roots.sort_by(|a, b| display_cmp(a, b));
        roots
    }

    /// Every item in display order: buckets, then names, parents before
    /// their children.
    pub fn ordered(&self) -> Vec<&Item> {
        let mut children: HashMap<UniqId, Vec<&Item>> = HashMap::new();
        for item in self.items.values() {
            if let Some(parent) = item.parent_uniq_id() {
                children.entry(parent).or_default().push(item);
            }
        }
        for list in children.values_mut() {
            list.sort_by(|a, b| display_cmp(a, b));
        }

        let mut ordered = Vec::with_capacity(self.items.len());
        let mut visited = HashSet::with_capacity(self.items.len());
        for root in self.roots() {
            walk(root, &children, &mut visited, &mut ordered);
        }

        // Parent cycles from corrupt payloads have no root; keep them listed.
        if ordered.len() < self.items.len() {
            let mut rest: Vec<&Item> = self
                .items
                .values()
                .filter(|i| !visited.contains(&i.uniq_id()))
                .collect();
            rest.sort_by(|a, b| display_cmp(a, b));
            for item in rest {
                walk(item, &children, &mut visited, &mut ordered);
            }
        }
        ordered
    }

    /// Unique ids in display order.
    pub fn ids(&self) -> Vec<UniqId> {
        self.ordered().into_iter().map(Item::uniq_id).collect()
    }

    /// Catalog ids in display order. The same id may appear more than once.
    pub fn item_ids(&self) -> Vec<&ItemId> {
        self.ordered().into_iter().map(Item::item_id).collect()
    }

    pub fn find_by_item_id(&self, item_id: &ItemId) -> Vec<&Item> {
        self.ordered()
            .into_iter()
            .filter(|i| i.item_id() == item_id)
            .collect()
    }

    /// Starts a validation pass on every item.
    pub fn clear_problems(&mut self) {
        self.items.values_mut().for_each(Item::clear_problems);
    }

    pub fn commit_all(&mut self) {
        self.items.values_mut().for_each(Item::commit_changes);
    }

    /// Items whose commercial state moved since their last commit.
    pub fn changed(&self) -> Vec<&Item> {
        self.ordered()
            .into_iter()
            .filter(|i| i.is_changed())
            .collect()
    }

    /// Reports basket-wide Spec rules the tree currently breaks.
    pub fn cardinality_violations(&self) -> Vec<CardinalityViolation> {
        self.cardinality_violations_in(SpecRegistry::global())
    }

    /// [`Items::cardinality_violations`] against an injected registry.
    pub fn cardinality_violations_in(&self, registry: &SpecRegistry) -> Vec<CardinalityViolation> {
        let mut violations = Vec::new();
        let mut per_type: HashMap<ItemType, usize> = HashMap::new();
        let mut per_parent: HashMap<(UniqId, ItemType), usize> = HashMap::new();

        for item in self.ordered() {
            let spec = item.spec_in(registry);
            *per_type.entry(item.item_type()).or_default() += 1;

            let parent = self.parent_of(&item.uniq_id());
            if spec.must_be_child && parent.is_none() {
                violations.push(CardinalityViolation::MissingParent {
                    child: item.uniq_id(),
                });
            }
            let Some(parent) = parent else {
                continue;
            };

            *per_parent
                .entry((parent.uniq_id(), item.item_type()))
                .or_default() += 1;

            if spec.count_equals_parent && item.count() != parent.count() {
                violations.push(CardinalityViolation::CountNotEqualParent {
                    child: item.uniq_id(),
                    count: item.count(),
                    parent_count: parent.count(),
                });
            } else if spec.count_le_parent && item.count() > parent.count() {
                violations.push(CardinalityViolation::CountExceedsParent {
                    child: item.uniq_id(),
                    count: item.count(),
                    parent_count: parent.count(),
                });
            }
        }

        let mut over_basket: Vec<_> = per_type
            .into_iter()
            .filter(|(t, n)| *n > 1 && registry.spec(*t).one_per_basket)
            .collect();
        over_basket.sort();
        violations.extend(over_basket.into_iter().map(|(item_type, found)| {
            CardinalityViolation::OnePerBasket { item_type, found }
        }));

        let mut over_parent: Vec<_> = per_parent
            .into_iter()
            .filter(|((_, t), n)| *n > 1 && registry.spec(*t).one_per_parent)
            .collect();
        over_parent.sort();
        violations.extend(over_parent.into_iter().map(|((parent, item_type), found)| {
            CardinalityViolation::OnePerParent {
                parent,
                item_type,
                found,
            }
        }));

        violations
    }
}

/// Pre-order walk from `root` over an explicit stack.
fn walk<'a>(
    root: &'a Item,
    children: &HashMap<UniqId, Vec<&'a Item>>,
    visited: &mut HashSet<UniqId>,
    out: &mut Vec<&'a Item>,
) {
    let mut stack = vec![root];
    while let Some(item) = stack.pop() {
        if !visited.insert(item.uniq_id()) {
            continue;
        }
        out.push(item);
        if let Some(kids) = children.get(&item.uniq_id()) {
            stack.extend(kids.iter().rev().copied());
        }
    }
}

impl FromIterator<Item> for Items {
    fn from_iter<I: IntoIterator<Item = Item>>(iter: I) -> Self {
        Items {
            items: iter.into_iter().map(|i| (i.uniq_id(), i)).collect(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use crate::spec::Spec;

    struct Basket {
        items: Items,
        kettle: UniqId,
        warranty: UniqId,
        install: UniqId,
        toaster: UniqId,
        pc: UniqId,
        cpu: UniqId,
        gpu: UniqId,
        assembly: UniqId,
    }

    fn basket() -> Basket {
        let mut items = Items::new();
        let mut add = |item: Item| {
            let id = item.uniq_id();
            items.insert(item);
            id
        };

        let pc = add(Item::configuration("PC-1", 1, Money::zero()).with_name("Gaming PC"));
        let gpu = add(
            Item::new(ItemType::ConfProduct, "GPU", 1, Money::from_minor(50_000)).with_name("GPU"),
        );
        let assembly = add(
            Item::new(ItemType::ConfService, "ASM", 1, Money::from_minor(2_000))
                .with_name("Assembly"),
        );
        let cpu = add(
            Item::new(ItemType::ConfProduct, "CPU", 1, Money::from_minor(30_000)).with_name("CPU"),
        );
        let toaster = add(Item::product("T-1", 1, Money::from_minor(3_000)).with_name("Toaster"));
        let install = add(
            Item::new(ItemType::SubcontractService, "INST", 1, Money::from_minor(500))
                .with_name("Installation"),
        );
        let warranty = add(Item::service("W-2", 1, Money::from_minor(700)).with_name("Warranty"));
        let kettle = add(Item::product("K-1", 1, Money::from_minor(2_500)).with_name("Kettle"));

        items.attach(&kettle, &warranty).unwrap();
        items.attach(&kettle, &install).unwrap();
        items.attach(&pc, &cpu).unwrap();
        items.attach(&pc, &gpu).unwrap();
        items.attach(&pc, &assembly).unwrap();

        Basket {
            items,
            kettle,
            warranty,
            install,
            toaster,
            pc,
            cpu,
            gpu,
            assembly,
        }
    }

    #[test]
    fn test_ordered_is_preorder_by_bucket_and_name() {
        let b = basket();
        assert_eq!(
            b.items.ids(),
            vec![b.kettle, b.install, b.warranty, b.toaster, b.pc, b.cpu, b.gpu, b.assembly]
        );
    }

    #[test]
    fn test_children_and_parent_queries() {
        let b = basket();
        let children: Vec<_> = b.items.children_of(&b.pc).iter().map(|i| i.uniq_id()).collect();
        assert_eq!(children, vec![b.cpu, b.gpu, b.assembly]);
        assert_eq!(b.items.parent_of(&b.gpu).map(Item::uniq_id), Some(b.pc));
        assert!(b.items.parent_of(&b.toaster).is_none());

        let roots: Vec<_> = b.items.roots().iter().map(|i| i.uniq_id()).collect();
        assert_eq!(roots, vec![b.kettle, b.toaster, b.pc]);
    }

    #[test]
    fn test_attach_errors() {
        let mut b = basket();
        let missing = UniqId::generate();
        assert_eq!(
            b.items.attach(&missing, &b.toaster),
            Err(ItemError::NotFound(missing))
        );
        let err = b.items.attach(&b.warranty, &b.toaster).unwrap_err();
        assert!(matches!(err, ItemError::Structural(_)));
    }

    #[test]
    fn test_remove_takes_descendants() {
        let mut b = basket();
        let removed = b.items.remove(&b.pc);
        assert_eq!(removed.len(), 4);
        assert_eq!(b.items.len(), 4);
        assert!(!b.items.contains(&b.cpu));
        assert!(b.items.contains(&b.kettle));
    }

    #[test]
    fn test_item_ids_may_repeat() {
        let mut items = Items::new();
        items.insert(Item::product("SAME", 1, Money::from_minor(100)).with_name("A"));
        items.insert(Item::product("SAME", 2, Money::from_minor(100)).with_name("B"));
        assert_eq!(items.find_by_item_id(&ItemId::new("SAME")).len(), 2);
        assert_eq!(items.item_ids().len(), 2);
    }

    #[test]
    fn test_changed_and_commit_all() {
        let mut b = basket();
        assert_eq!(b.items.changed().len(), 8);
        b.items.commit_all();
        assert!(b.items.changed().is_empty());

        b.items.get_mut(&b.kettle).unwrap().set_count(2).unwrap();
        let changed: Vec<_> = b.items.changed().iter().map(|i| i.uniq_id()).collect();
        assert_eq!(changed, vec![b.kettle]);
    }

    #[test]
    fn test_cardinality_violations_are_reported() {
        let mut b = basket();
        assert!(b.items.cardinality_violations().is_empty());

        // Count tied to the parent drifts when the parent changes.
        b.items.get_mut(&b.pc).unwrap().set_count(2).unwrap();
        let second_assembly = Item::new(ItemType::ConfService, "ASM", 2, Money::zero());
        let second_id = second_assembly.uniq_id();
        b.items.insert(second_assembly);
        b.items.attach(&b.pc, &second_id).unwrap();

        let violations = b.items.cardinality_violations();
        assert!(violations.contains(&CardinalityViolation::CountNotEqualParent {
            child: b.cpu,
            count: 1,
            parent_count: 2
        }));
        assert!(violations.contains(&CardinalityViolation::OnePerParent {
            parent: b.pc,
            item_type: ItemType::ConfService,
            found: 2
        }));
        assert!(!violations.iter().any(|v| matches!(
            v,
            CardinalityViolation::CountNotEqualParent { child, .. } if *child == second_id
        )));
    }

    #[test]
    fn test_orphan_service_is_reported() {
        let mut items = Items::new();
        let orphan = Item::service("W-2", 1, Money::zero());
        let id = orphan.uniq_id();
        items.insert(orphan);
        assert_eq!(
            items.cardinality_violations(),
            vec![CardinalityViolation::MissingParent { child: id }]
        );
    }

    #[test]
    fn test_service_count_above_parent() {
        let mut b = basket();
        b.items.get_mut(&b.warranty).unwrap().set_count(3).unwrap();
        assert_eq!(
            b.items.cardinality_violations(),
            vec![CardinalityViolation::CountExceedsParent {
                child: b.warranty,
                count: 3,
                parent_count: 1
            }]
        );
    }

    #[test]
    fn test_injected_registry_reports_one_per_basket() {
        let registry = SpecRegistry::from_specs([(
            ItemType::Product,
            Spec {
                one_per_basket: true,
                ..Spec::LEAF
            },
        )]);
        let mut items = Items::new();
        items.insert(Item::product("K-1", 1, Money::from_minor(100)));
        items.insert(Item::product("T-1", 1, Money::from_minor(100)));

        assert!(items.cardinality_violations().is_empty());
        assert_eq!(
            items.cardinality_violations_in(&registry),
            vec![CardinalityViolation::OnePerBasket {
                item_type: ItemType::Product,
                found: 2
            }]
        );
    }

    #[test]
    fn test_deep_chain_orders_without_recursion() {
        const DEPTH: usize = 10_000;
        let registry = SpecRegistry::from_specs([(
            ItemType::Product,
            Spec {
                children: &[ItemType::Product],
                ..Spec::LEAF
            },
        )]);

        let mut items = Items::new();
        let mut chain = Vec::with_capacity(DEPTH);
        for n in 0..DEPTH {
            let item = Item::product(format!("P-{n}"), 1, Money::from_minor(100));
            chain.push(item.uniq_id());
            items.insert(item);
        }
        for pair in chain.windows(2) {
            items.attach_in(&registry, &pair[0], &pair[1]).unwrap();
        }

        assert_eq!(items.ids(), chain);
    }
}
