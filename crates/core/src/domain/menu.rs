use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Canonical lowercase identifier of a purchasable item, e.g. `chicken wings`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MenuKey(pub String);

impl MenuKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_canonical(&self) -> bool {
        !self.0.is_empty() && self.0.trim() == self.0 && self.0.to_lowercase() == self.0
    }
}

impl fmt::Display for MenuKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MenuKey {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuEntry {
    pub key: MenuKey,
    pub name: String,
    pub price: Decimal,
}

impl MenuEntry {
    pub fn new(key: impl Into<String>, name: impl Into<String>, price: Decimal) -> Self {
        Self { key: MenuKey(key.into()), name: name.into(), price }
    }
}

#[cfg(test)]
mod tests {
    use super::MenuKey;

    #[test]
    fn canonical_keys_are_trimmed_lowercase_and_non_empty() {
        assert!(MenuKey::from("chicken wings").is_canonical());
        assert!(!MenuKey::from("Burger").is_canonical());
        assert!(!MenuKey::from(" soda").is_canonical());
        assert!(!MenuKey::from("").is_canonical());
    }
}
