use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::catalog::MenuCatalog;
use crate::domain::menu::MenuKey;
use crate::pricing::price_cart;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLineItem {
    pub key: MenuKey,
    pub quantity: u32,
}

impl OrderLineItem {
    pub fn new(key: impl Into<String>, quantity: u32) -> Self {
        Self { key: MenuKey(key.into()), quantity }
    }
}

/// Line item joined with its menu entry, as handed back to callers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub key: MenuKey,
    pub name: String,
    pub price: Decimal,
    pub quantity: u32,
}

/// Per-session cart. Holds at most one line per menu key, in first-added order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    items: Vec<OrderLineItem>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[OrderLineItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn quantity_of(&self, key: &str) -> Option<u32> {
        self.items.iter().find(|item| item.key.0 == key).map(|item| item.quantity)
    }

    /// Applies extracted items and returns the recomputed total.
    ///
    /// Additive: a key already in the cart has its quantity increased in place,
    /// a new key is appended at the end.
    pub fn merge(&mut self, extracted: &[OrderLineItem], catalog: &MenuCatalog) -> Decimal {
        for incoming in extracted {
            match self.items.iter_mut().find(|item| item.key == incoming.key) {
                Some(existing) => {
                    existing.quantity = existing.quantity.saturating_add(incoming.quantity);
                }
                None => self.items.push(incoming.clone()),
            }
        }

        self.total(catalog)
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn total(&self, catalog: &MenuCatalog) -> Decimal {
        price_cart(self, catalog)
    }

    pub fn lines(&self, catalog: &MenuCatalog) -> Vec<CartLine> {
        denormalize(&self.items, catalog)
    }
}

/// Joins items with the catalog. Keys the catalog does not know are skipped.
pub fn denormalize(items: &[OrderLineItem], catalog: &MenuCatalog) -> Vec<CartLine> {
    items
        .iter()
        .filter_map(|item| {
            catalog.find(item.key.as_str()).map(|entry| CartLine {
                key: entry.key.clone(),
                name: entry.name.clone(),
                price: entry.price,
                quantity: item.quantity,
            })
        })
        .collect()
}
