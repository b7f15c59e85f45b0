//! Order placement.
//!
//! Finalizing is all-or-nothing from the session's point of view: either
//! every line is reserved and the cart completes, or the session is left
//! exactly as it was. Reservations made before a failure are released, and
//! an already-created order record is flagged for external reconciliation.

use tracing::{info, warn};

use chatcart_core::domain::cart::CartStatus;
use chatcart_core::domain::order::{Order, OrderDraft, OrderLine};
use chatcart_core::domain::product::ProductCode;
use chatcart_core::errors::AssistantError;
use chatcart_core::flows::{transition_ordering, OrderingEvent};
use chatcart_core::session::Session;

use crate::ports::{
    Catalog, IntentFallback, Inventory, Notifier, OrderStore, ReserveOutcome, SessionStore,
};
use crate::runtime::Assistant;

impl<C, I, O, N, S, F> Assistant<C, I, O, N, S, F>
where
    C: Catalog,
    I: Inventory,
    O: OrderStore,
    N: Notifier,
    S: SessionStore,
    F: IntentFallback,
{
    pub(crate) async fn run_finalize(
        &self,
        session: &mut Session,
    ) -> Result<Order, AssistantError> {
        if !matches!(session.cart.status, CartStatus::Confirming | CartStatus::Calculating) {
            return Err(AssistantError::state(
                session.cart.status,
                "There's nothing ready to order. Add items to your cart first.",
            ));
        }
        if session.cart.is_empty() {
            return Err(AssistantError::state(
                session.cart.status,
                "Your cart is empty. Add items before placing an order.",
            ));
        }
        let warehouse = session
            .profile
            .warehouse
            .clone()
            .ok_or_else(|| AssistantError::validation("no warehouse selected yet"))?;
        let owner_email = session
            .profile
            .email
            .clone()
            .ok_or_else(|| AssistantError::validation("no email on file for this session"))?;

        // Phase 1: check every line before touching anything. A shortage
        // found here aborts with no side effects at all.
        for line in &session.cart.lines {
            let available = self.guard_read(|| self.inventory.available(&line.code)).await?;
            if available < line.requested_quantity {
                return Err(AssistantError::Stock {
                    code: line.code.as_str().to_owned(),
                    requested: line.requested_quantity,
                    available,
                });
            }
        }

        // Phase 2: persist the order record. Prices are copied from the
        // cart verbatim; the user pays what the summary showed.
        let draft = OrderDraft {
            lines: session
                .cart
                .lines
                .iter()
                .map(|line| OrderLine {
                    code: line.code.clone(),
                    name: line.name.clone(),
                    quantity: line.requested_quantity,
                    unit_price: line.final_unit_price,
                    line_total: line.line_total,
                })
                .collect(),
            total_amount: session.cart.final_total,
            warehouse,
            owner_email: owner_email.clone(),
        };
        let order = self.guard(self.orders.create(draft)).await?;

        // Phase 3: reserve line by line. The availability check cannot rule
        // out a concurrent taker, so a shortage can still surface here; in
        // that case every reservation made by this call is returned.
        let mut reserved: Vec<(ProductCode, u32)> = Vec::new();
        for line in &session.cart.lines {
            let outcome = self
                .guard(self.inventory.reserve(&line.code, line.requested_quantity))
                .await;
            match outcome {
                Ok(ReserveOutcome::Reserved) => {
                    reserved.push((line.code.clone(), line.requested_quantity));
                }
                Ok(ReserveOutcome::Insufficient { available }) => {
                    self.roll_back(&order, &reserved).await;
                    return Err(AssistantError::Stock {
                        code: line.code.as_str().to_owned(),
                        requested: line.requested_quantity,
                        available,
                    });
                }
                Err(error) => {
                    self.roll_back(&order, &reserved).await;
                    return Err(error);
                }
            }
        }

        // Phase 4: the cart completes only once stock is actually held.
        session.cart.status = transition_ordering(session.cart.status, OrderingEvent::OrderPlaced)
            .map_err(|error| AssistantError::state(session.cart.status, error.to_string()))?
            .to;
        session.cart.order_id = Some(order.id.clone());
        session.cart.pending_confirmation = false;

        // Phase 5: notification is best-effort; the order stands either way.
        if let Err(error) =
            self.guard(self.notifier.order_confirmed(&order, &owner_email)).await
        {
            warn!(order = %order.id.as_str(), %error, "confirmation notice failed");
        }
        info!(order = %order.id.as_str(), total = %order.total_amount, "order placed");

        Ok(order)
    }

    /// Returns reservations made by a failed finalize and flags the order
    /// record. Both are best-effort: the external order manager reconciles
    /// anything that slips through.
    async fn roll_back(&self, order: &Order, reserved: &[(ProductCode, u32)]) {
        for (code, quantity) in reserved {
            if let Err(error) = self.guard(self.inventory.release(code, *quantity)).await {
                warn!(code = %code.as_str(), %error, "reservation release failed");
            }
        }
        if let Err(error) = self.guard(self.orders.mark_failed(&order.id)).await {
            warn!(order = %order.id.as_str(), %error, "could not mark order failed");
        }
    }
}
