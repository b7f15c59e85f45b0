//! Mutations over one session's cart.
//!
//! Every operation either succeeds and recomputes the cart totals, or fails
//! and leaves the cart exactly as it was. Pricing for a line is always
//! recomputed against the full new quantity - never accumulated additively.

use rust_decimal::Decimal;

use crate::domain::cart::{Cart, CartLine, CartStatus};
use crate::domain::product::{Product, ProductCode};
use crate::errors::AssistantError;
use crate::pricing::PricingEngine;

pub struct CartStore<'a, P> {
    cart: &'a mut Cart,
    pricing: &'a P,
}

impl<'a, P> CartStore<'a, P>
where
    P: PricingEngine,
{
    pub fn new(cart: &'a mut Cart, pricing: &'a P) -> Self {
        Self { cart, pricing }
    }

    pub fn cart(&self) -> &Cart {
        self.cart
    }

    /// Adds `quantity` units of `product`. If the product is already in the
    /// cart its requested quantity grows and the scheme is re-evaluated
    /// against the combined total.
    pub fn add_item(&mut self, product: &Product, quantity: u32) -> Result<(), AssistantError> {
        if quantity == 0 {
            return Err(AssistantError::validation("quantity must be greater than zero"));
        }
        let new_quantity = match self.cart.line(&product.code) {
            Some(line) => line.requested_quantity.checked_add(quantity).ok_or_else(|| {
                AssistantError::validation("combined quantity is too large")
            })?,
            None => quantity,
        };
        self.write_line(product, new_quantity)
    }

    /// Replaces the line's quantity wholesale. This is the explicit
    /// quantity-selection path, distinct from `add_item`; a quantity of
    /// zero removes the line.
    pub fn set_item_quantity(
        &mut self,
        product: &Product,
        quantity: u32,
    ) -> Result<(), AssistantError> {
        if quantity == 0 {
            if self.cart.position(&product.code).is_some() {
                self.remove_item(&product.code)?;
            }
            return Ok(());
        }
        self.write_line(product, quantity)
    }

    pub fn remove_item(&mut self, code: &ProductCode) -> Result<CartLine, AssistantError> {
        let Some(index) = self.cart.position(code) else {
            return Err(AssistantError::state(
                self.cart.status,
                format!("{} is not in your cart", code.as_str()),
            ));
        };
        let removed = self.cart.lines.remove(index);
        self.recompute();
        Ok(removed)
    }

    /// Empties the cart and returns it to `Idle`.
    pub fn clear(&mut self) {
        self.cart.lines.clear();
        self.cart.status = CartStatus::Idle;
        self.cart.pending_confirmation = false;
        self.recompute();
    }

    /// Re-derives the cart totals from the current lines. Called after
    /// every mutation, never skipped.
    pub fn recompute(&mut self) {
        self.cart.total_cost =
            self.cart.lines.iter().map(|line| line.line_total).sum::<Decimal>();
        self.cart.discount_applied =
            self.cart.lines.iter().map(CartLine::savings).sum::<Decimal>();
        // Scheme and discount benefits are already folded into each line
        // total, so the final total never subtracts them again.
        self.cart.final_total = self.cart.total_cost;
    }

    /// Read-only copy for rendering or handoff to the finalizer.
    pub fn snapshot(&self) -> Cart {
        self.cart.clone()
    }

    fn write_line(&mut self, product: &Product, quantity: u32) -> Result<(), AssistantError> {
        // Price first: a pricing failure must not touch the cart.
        let breakdown =
            self.pricing.price(product.base_price, product.flat_discount, &product.scheme(), quantity)?;

        let line = CartLine {
            code: product.code.clone(),
            name: product.name.clone(),
            requested_quantity: quantity,
            unit_base_price: product.base_price,
            flat_discount: product.flat_discount,
            scheme_label: product.scheme_label.clone(),
            final_unit_price: breakdown.final_unit_price,
            paid_quantity: breakdown.paid_quantity,
            free_quantity: breakdown.free_quantity,
            line_total: breakdown.line_total,
            discount_percent_applied: breakdown.discount_percent_applied,
        };

        match self.cart.position(&product.code) {
            Some(index) => self.cart.lines[index] = line,
            None => self.cart.lines.push(line),
        }
        self.recompute();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::CartStore;
    use crate::domain::cart::{Cart, CartStatus};
    use crate::domain::product::{Product, ProductCode};
    use crate::errors::AssistantError;
    use crate::pricing::{round2, DeterministicPricingEngine};

    fn product(code: &str, price: i64, scheme: &str) -> Product {
        Product {
            code: ProductCode(code.to_owned()),
            name: format!("Product {code}"),
            base_price: Decimal::from(price),
            flat_discount: Decimal::ZERO,
            scheme_label: scheme.to_owned(),
        }
    }

    fn assert_invariant(cart: &Cart) {
        let sum: Decimal = cart.lines.iter().map(|line| line.line_total).sum();
        assert_eq!(cart.total_cost, sum);
        assert_eq!(cart.final_total, cart.total_cost);
    }

    #[test]
    fn add_creates_a_line_and_totals_follow() {
        let engine = DeterministicPricingEngine;
        let mut cart = Cart::new();
        let mut store = CartStore::new(&mut cart, &engine);

        store.add_item(&product("QB001", 100, ""), 3).expect("add");
        assert_eq!(store.cart().lines.len(), 1);
        assert_eq!(store.cart().total_cost, round2(Decimal::from(300)));
        assert_invariant(store.cart());
    }

    #[test]
    fn repeated_add_reprices_the_combined_quantity() {
        // Buy 2 Get 1 Free: 2 then 3 more must price as a single quantity
        // of 5 (4 paid), not as two independently priced adds (2 + 2 paid
        // would over-charge; 2 + 3 priced separately would under-reward).
        let engine = DeterministicPricingEngine;
        let mut cart = Cart::new();
        let mut store = CartStore::new(&mut cart, &engine);
        let item = product("QB001", 2500, "Buy 2 Get 1 Free");

        store.add_item(&item, 2).expect("first add");
        store.add_item(&item, 3).expect("second add");

        let line = store.cart().line(&item.code).expect("line exists");
        assert_eq!(line.requested_quantity, 5);
        assert_eq!(line.paid_quantity, 4);
        assert_eq!(line.free_quantity, 1);
        assert_eq!(line.line_total, round2(Decimal::from(10_000)));
        assert_invariant(store.cart());
    }

    #[test]
    fn set_quantity_replaces_instead_of_adding() {
        let engine = DeterministicPricingEngine;
        let mut cart = Cart::new();
        let mut store = CartStore::new(&mut cart, &engine);
        let item = product("QB001", 100, "");

        store.add_item(&item, 4).expect("add");
        store.set_item_quantity(&item, 2).expect("set");

        assert_eq!(store.cart().line(&item.code).expect("line").requested_quantity, 2);
        assert_invariant(store.cart());
    }

    #[test]
    fn set_quantity_zero_removes_the_line() {
        let engine = DeterministicPricingEngine;
        let mut cart = Cart::new();
        let mut store = CartStore::new(&mut cart, &engine);
        let item = product("QB001", 100, "");

        store.add_item(&item, 4).expect("add");
        store.set_item_quantity(&item, 0).expect("set to zero");

        assert!(store.cart().is_empty());
        assert_eq!(store.cart().total_cost, Decimal::ZERO);
    }

    #[test]
    fn remove_unknown_code_fails_and_changes_nothing() {
        let engine = DeterministicPricingEngine;
        let mut cart = Cart::new();
        let mut store = CartStore::new(&mut cart, &engine);
        store.add_item(&product("QB001", 100, ""), 1).expect("add");
        let before = store.snapshot();

        let error = store
            .remove_item(&ProductCode("QB999".to_owned()))
            .expect_err("unknown code must fail");
        assert!(matches!(error, AssistantError::State { .. }));
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn add_then_remove_restores_the_prior_snapshot_exactly() {
        let engine = DeterministicPricingEngine;
        let mut cart = Cart::new();
        let mut store = CartStore::new(&mut cart, &engine);
        store.add_item(&product("QB001", 800, "Buy 3 Get 2 Free"), 8).expect("seed");
        let before = store.snapshot();

        let extra = product("QB002", 1200, "Buy 1 Get 20% Off");
        store.add_item(&extra, 3).expect("add");
        store.remove_item(&extra.code).expect("remove");

        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn combined_quantity_overflow_fails_and_changes_nothing() {
        let engine = DeterministicPricingEngine;
        let mut cart = Cart::new();
        let mut store = CartStore::new(&mut cart, &engine);
        let item = product("QB001", 100, "");
        store.add_item(&item, u32::MAX).expect("first add");
        let before = store.snapshot();

        let error = store.add_item(&item, 1).expect_err("overflowing add must fail");
        assert!(matches!(error, AssistantError::Validation(_)));
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn failed_add_leaves_the_cart_untouched() {
        let engine = DeterministicPricingEngine;
        let mut cart = Cart::new();
        let mut store = CartStore::new(&mut cart, &engine);
        store.add_item(&product("QB001", 100, ""), 1).expect("seed");
        let before = store.snapshot();

        let error = store.add_item(&product("QB002", 100, ""), 0).expect_err("zero quantity");
        assert!(matches!(error, AssistantError::Validation(_)));
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn clear_empties_and_returns_to_idle() {
        let engine = DeterministicPricingEngine;
        let mut cart = Cart::new();
        cart.status = CartStatus::Confirming;
        let mut store = CartStore::new(&mut cart, &engine);
        store.add_item(&product("QB001", 100, ""), 2).expect("add");

        store.clear();
        assert!(store.cart().is_empty());
        assert_eq!(store.cart().status, CartStatus::Idle);
        assert_eq!(store.cart().final_total, Decimal::ZERO);
    }

    #[test]
    fn invariant_holds_across_mixed_mutation_sequences() {
        let engine = DeterministicPricingEngine;
        let mut cart = Cart::new();
        let mut store = CartStore::new(&mut cart, &engine);
        let a = product("QB001", 2500, "Buy 2 Get 1 Free");
        let b = product("QB002", 1200, "Buy 1 Get 20% Off");
        let c = product("QB003", 800, "");

        store.add_item(&a, 5).expect("add a");
        assert_invariant(store.cart());
        store.add_item(&b, 1).expect("add b");
        assert_invariant(store.cart());
        store.set_item_quantity(&b, 3).expect("set b");
        assert_invariant(store.cart());
        store.add_item(&c, 10).expect("add c");
        assert_invariant(store.cart());
        store.remove_item(&a.code).expect("remove a");
        assert_invariant(store.cart());
        store.set_item_quantity(&c, 0).expect("drop c");
        assert_invariant(store.cart());

        assert_eq!(store.cart().lines.len(), 1);
    }
}
