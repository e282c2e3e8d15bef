//! Property tests for the basket invariants that must hold for every input.

use basket_core::codec;
use basket_core::fingerprint::fingerprint;
use basket_core::validation::round_to_multiplicity;
use basket_core::{Item, ItemId, ItemType, Money, PriceColumn, SpaceId, SpecRegistry};
use proptest::prelude::*;

fn item_type() -> impl Strategy<Value = ItemType> {
    prop::sample::select(ItemType::ALL.to_vec())
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 500,
        ..ProptestConfig::default()
    })]

    /// Rounding yields a multiple of m: m itself for n ≤ m, otherwise the
    /// largest multiple not above n.
    #[test]
    fn rounding_is_a_package_multiple(n in 0u32..10_000, m in 1u32..500) {
        let rounded = round_to_multiplicity(n, m);
        prop_assert_eq!(rounded % m, 0);
        if n <= m {
            prop_assert_eq!(rounded, m);
        } else {
            prop_assert!(rounded <= n);
            prop_assert!(n - rounded < m);
        }
    }

    /// Same inputs, same fingerprint.
    #[test]
    fn fingerprint_is_deterministic(
        space in "[a-z0-9-]{0,12}",
        column in any::<u32>(),
        item_id in "[0-9]{1,10}",
        count in any::<u32>(),
        price in any::<i64>(),
    ) {
        let space = SpaceId::new(space);
        let item_id = ItemId::new(item_id);
        let (column, price) = (PriceColumn::new(column), Money::from_minor(price));
        let first = fingerprint(&space, column, &item_id, count, price);
        let second = fingerprint(&space, column, &item_id, count, price);
        prop_assert_eq!(first, second);
    }

    /// Committing makes an item clean; moving the price dirties it again.
    #[test]
    fn commit_then_change(price in 1i64..1_000_000, delta in 1i64..1000) {
        let mut item = Item::product("30012345", 1, Money::from_minor(price));
        item.commit_changes();
        prop_assert!(!item.is_changed());
        item.set_price(Money::from_minor(price + delta));
        prop_assert!(item.is_changed());
    }

    /// add_child succeeds exactly when the parent's Spec lists the child
    /// type; a rejected attachment changes neither item.
    #[test]
    fn add_child_follows_registry(parent_type in item_type(), child_type in item_type()) {
        let parent = Item::new(parent_type, "P", 1, Money::from_minor(100));
        let mut child = Item::new(child_type, "C", 1, Money::from_minor(100));
        let before = child.clone();

        let allowed = SpecRegistry::global().can_have_child(parent_type, child_type);
        match parent.add_child(&mut child) {
            Ok(()) => {
                prop_assert!(allowed);
                prop_assert_eq!(child.parent_uniq_id(), Some(parent.uniq_id()));
            }
            Err(_) => {
                prop_assert!(!allowed);
                prop_assert_eq!(child, before);
            }
        }
    }

    /// Newest-shape round trip for items with arbitrary commercial fields.
    #[test]
    fn item_round_trip(
        kind in item_type(),
        item_id in "[0-9A-Z-]{1,16}",
        name in "\\PC{0,40}",
        count in 1u32..=999,
        price in any::<i64>(),
        bonus in any::<i64>(),
        selected in any::<bool>(),
    ) {
        let mut item = Item::new(kind, item_id, count, Money::from_minor(price))
            .with_name(name)
            .with_bonus(Money::from_minor(bonus));
        item.set_selected(selected);
        item.commit_changes();

        let bytes = codec::encode(&item).unwrap();
        let decoded: Item = codec::decode(&bytes).unwrap();
        prop_assert_eq!(decoded, item);
    }
}
