use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::order::OrderId;
use crate::domain::product::ProductCode;
use crate::pricing::round2;

/// Ordering stage for one session's cart.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum CartStatus {
    #[default]
    Idle,
    Browsing,
    Calculating,
    Confirming,
    Completed,
}

/// One product's presence in a cart, with its computed pricing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub code: ProductCode,
    pub name: String,
    pub requested_quantity: u32,
    pub unit_base_price: Decimal,
    pub flat_discount: Decimal,
    pub scheme_label: String,
    pub final_unit_price: Decimal,
    pub paid_quantity: u32,
    pub free_quantity: u32,
    pub line_total: Decimal,
    pub discount_percent_applied: Decimal,
}

impl CartLine {
    /// Informational: what the line would have cost without discount or
    /// scheme, minus what it actually costs.
    pub fn savings(&self) -> Decimal {
        round2(self.unit_base_price * Decimal::from(self.requested_quantity)) - self.line_total
    }
}

/// The full cart for one session: insertion-stable lines keyed by product
/// code plus derived totals.
///
/// Invariants: `total_cost == sum(line_total)` and `final_total ==
/// total_cost` (scheme and discount benefits are already folded into each
/// line; `discount_applied` is informational only).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Cart {
    pub status: CartStatus,
    pub lines: Vec<CartLine>,
    pub total_cost: Decimal,
    pub discount_applied: Decimal,
    pub final_total: Decimal,
    pub order_id: Option<OrderId>,
    pub pending_confirmation: bool,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn line(&self, code: &ProductCode) -> Option<&CartLine> {
        self.lines.iter().find(|line| &line.code == code)
    }

    pub fn position(&self, code: &ProductCode) -> Option<usize> {
        self.lines.iter().position(|line| &line.code == code)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{Cart, CartLine, CartStatus};
    use crate::domain::product::ProductCode;

    fn line(code: &str, total: i64) -> CartLine {
        CartLine {
            code: ProductCode(code.to_owned()),
            name: code.to_owned(),
            requested_quantity: 1,
            unit_base_price: Decimal::from(total),
            flat_discount: Decimal::ZERO,
            scheme_label: String::new(),
            final_unit_price: Decimal::from(total),
            paid_quantity: 1,
            free_quantity: 0,
            line_total: Decimal::from(total),
            discount_percent_applied: Decimal::ZERO,
        }
    }

    #[test]
    fn new_cart_starts_idle_and_empty() {
        let cart = Cart::new();
        assert_eq!(cart.status, CartStatus::Idle);
        assert!(cart.is_empty());
        assert_eq!(cart.total_cost, Decimal::ZERO);
        assert!(cart.order_id.is_none());
    }

    #[test]
    fn lines_are_looked_up_by_code() {
        let mut cart = Cart::new();
        cart.lines.push(line("QB001", 100));
        cart.lines.push(line("QB002", 200));

        assert_eq!(cart.position(&ProductCode("QB002".to_owned())), Some(1));
        assert!(cart.line(&ProductCode("QB003".to_owned())).is_none());
    }
}
