//! Flat legacy views of an item.
//!
//! Older order services consume rows, not trees. These projections carry no
//! logic of their own; they copy what the item already knows.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::item::Item;
use crate::money::Money;
use crate::spec::ItemType;
use crate::types::{ItemId, UniqId};

/// Row-oriented order line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    #[ts(as = "String")]
    pub uniq_id: UniqId,
    #[ts(as = "String")]
    pub item_id: ItemId,
    #[ts(as = "Option<String>")]
    pub parent_uniq_id: Option<UniqId>,
    #[serde(rename = "type")]
    pub item_type: ItemType,
    pub name: String,
    pub quantity: u32,
    pub price: Money,
    pub bonus: Money,
    pub total: Money,
    pub is_selected: bool,
}

/// Minimal id + quantity record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ItemQuantity {
    #[ts(as = "String")]
    pub item_id: ItemId,
    pub quantity: u32,
}

impl Item {
    pub fn to_order_line(&self) -> OrderLine {
        OrderLine {
            uniq_id: self.uniq_id,
            item_id: self.item_id.clone(),
            parent_uniq_id: self.parent_uniq_id,
            item_type: self.item_type,
            name: self.name.clone(),
            quantity: self.count,
            price: self.price,
            bonus: self.bonus,
            total: self.line_total(),
            is_selected: self.is_selected,
        }
    }

    pub fn to_item_quantity(&self) -> ItemQuantity {
        ItemQuantity {
            item_id: self.item_id.clone(),
            quantity: self.count,
        }
    }
}
