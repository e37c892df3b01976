use std::collections::BTreeSet;

use rust_decimal::Decimal;

use crate::domain::menu::{MenuEntry, MenuKey};
use crate::errors::DomainError;

/// Immutable menu loaded at startup.
///
/// Entries keep the order they were supplied in. That order is the iteration
/// order used by fuzzy matching and fallback extraction, so results stay
/// reproducible for a given catalog.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MenuCatalog {
    entries: Vec<MenuEntry>,
}

impl MenuCatalog {
    pub fn new(entries: Vec<MenuEntry>) -> Result<Self, DomainError> {
        if entries.is_empty() {
            return Err(DomainError::EmptyCatalog);
        }

        let mut seen = BTreeSet::new();
        for entry in &entries {
            if !entry.key.is_canonical() {
                return Err(DomainError::InvalidMenuKey(entry.key.0.clone()));
            }
            if !seen.insert(entry.key.0.as_str()) {
                return Err(DomainError::DuplicateMenuKey(entry.key.0.clone()));
            }
            if entry.price < Decimal::ZERO {
                return Err(DomainError::NegativePrice { key: entry.key.0.clone() });
            }
        }

        Ok(Self { entries })
    }

    /// The Twilight Cafe menu.
    pub fn twilight_cafe() -> Self {
        Self {
            entries: vec![
                MenuEntry::new("burger", "Burger", Decimal::new(899, 2)),
                MenuEntry::new("cheeseburger", "Cheeseburger", Decimal::new(999, 2)),
                MenuEntry::new("pizza", "Pizza", Decimal::new(1299, 2)),
                MenuEntry::new("pasta", "Pasta", Decimal::new(1099, 2)),
                MenuEntry::new("salad", "Salad", Decimal::new(799, 2)),
                MenuEntry::new("fries", "Fries", Decimal::new(399, 2)),
                MenuEntry::new("chicken wings", "Chicken Wings", Decimal::new(1199, 2)),
                MenuEntry::new("sandwich", "Sandwich", Decimal::new(699, 2)),
                MenuEntry::new("soda", "Soda", Decimal::new(299, 2)),
                MenuEntry::new("water", "Water", Decimal::new(199, 2)),
                MenuEntry::new("coffee", "Coffee", Decimal::new(349, 2)),
                MenuEntry::new("milkshake", "Milkshake", Decimal::new(599, 2)),
            ],
        }
    }

    pub fn find(&self, key: &str) -> Option<&MenuEntry> {
        self.entries.iter().find(|entry| entry.key.0 == key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.find(key).is_some()
    }

    pub fn price_of(&self, key: &MenuKey) -> Option<Decimal> {
        self.find(key.as_str()).map(|entry| entry.price)
    }

    pub fn entries(&self) -> &[MenuEntry] {
        &self.entries
    }

    /// Menu keys in catalog order.
    pub fn keys(&self) -> impl Iterator<Item = &MenuKey> + '_ {
        self.entries.iter().map(|entry| &entry.key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for MenuCatalog {
    fn default() -> Self {
        Self::twilight_cafe()
    }
}
