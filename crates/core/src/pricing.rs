use rust_decimal::Decimal;

use crate::catalog::MenuCatalog;
use crate::domain::cart::{Cart, CartLine};

/// Sum of `unit_price * quantity`, prices taken from the catalog.
pub fn price_cart(cart: &Cart, catalog: &MenuCatalog) -> Decimal {
    cart.items()
        .iter()
        .filter_map(|item| catalog.price_of(&item.key).map(|price| price * Decimal::from(item.quantity)))
        .sum()
}

pub fn price_lines(lines: &[CartLine]) -> Decimal {
    lines.iter().map(|line| line.price * Decimal::from(line.quantity)).sum()
}

/// Two-decimal rendering used in replies, e.g. `15.97`.
pub fn format_amount(amount: Decimal) -> String {
    format!("{:.2}", amount.round_dp(2))
}
