//! The per-message runtime: loads the session, routes the text to a
//! handler, and writes the session back only when the handler fully
//! succeeded.
//!
//! The caller guarantees at most one in-flight message per session; the
//! runtime performs no internal locking. Sessions never share carts, so
//! cross-session interference is impossible by construction.

use std::future::Future;

use tokio::time::timeout;
use tracing::{info, instrument, warn};

use chatcart_core::cart_store::CartStore;
use chatcart_core::config::AssistantConfig;
use chatcart_core::domain::cart::{Cart, CartStatus};
use chatcart_core::domain::order::{Order, OrderId};
use chatcart_core::domain::product::{Product, ProductCode, WarehouseId};
use chatcart_core::domain::tracking::TrackingStatus;
use chatcart_core::errors::AssistantError;
use chatcart_core::flows::{transition_ordering, transition_tracking, OrderingEvent, TrackingEvent};
use chatcart_core::intent::{classify, signals_order_intent, Intent};
use chatcart_core::parser::{parse_add_request, parse_remove_request};
use chatcart_core::pricing::DeterministicPricingEngine;
use chatcart_core::session::{OnboardingState, Session, SessionId};

use crate::ports::{
    Catalog, IntentFallback, Inventory, Notifier, OrderStore, PortResult, SessionStore,
};
use crate::render;

/// What the caller gets back for every processed message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MessageOutcome {
    pub response_text: String,
    pub stage_after: CartStatus,
    pub cart: Cart,
}

pub struct Assistant<C, I, O, N, S, F> {
    pub(crate) catalog: C,
    pub(crate) inventory: I,
    pub(crate) orders: O,
    pub(crate) notifier: N,
    pub(crate) sessions: S,
    pub(crate) fallback: F,
    pub(crate) pricing: DeterministicPricingEngine,
    pub(crate) config: AssistantConfig,
}

impl<C, I, O, N, S, F> Assistant<C, I, O, N, S, F>
where
    C: Catalog,
    I: Inventory,
    O: OrderStore,
    N: Notifier,
    S: SessionStore,
    F: IntentFallback,
{
    pub fn new(
        catalog: C,
        inventory: I,
        orders: O,
        notifier: N,
        sessions: S,
        fallback: F,
        config: AssistantConfig,
    ) -> Self {
        Self {
            catalog,
            inventory,
            orders,
            notifier,
            sessions,
            fallback,
            pricing: DeterministicPricingEngine,
            config,
        }
    }

    /// Routes one chat message. The session is written back only when the
    /// handler fully succeeded; a failed handler produces a clarification
    /// response over the untouched pre-message state.
    #[instrument(skip(self, raw_text), fields(session = %session_id.as_str()))]
    pub async fn process_message(
        &self,
        session_id: &SessionId,
        raw_text: &str,
    ) -> Result<MessageOutcome, AssistantError> {
        let session = self.load_session(session_id).await?;
        let mut working = session.clone();

        match self.handle(&mut working, raw_text).await {
            Ok(response_text) => {
                self.save_session(session_id, &working).await?;
                info!(stage = ?working.cart.status, "message handled");
                Ok(MessageOutcome {
                    response_text,
                    stage_after: working.cart.status,
                    cart: working.cart,
                })
            }
            Err(error) => {
                info!(%error, "message rejected; session unchanged");
                Ok(MessageOutcome {
                    response_text: error.user_message(),
                    stage_after: session.cart.status,
                    cart: session.cart,
                })
            }
        }
    }

    /// Read-only snapshot of the session's cart.
    pub async fn cart_summary(&self, session_id: &SessionId) -> Result<Cart, AssistantError> {
        Ok(self.load_session(session_id).await?.cart)
    }

    /// The explicit quantity-selection interface: replaces a line's
    /// quantity wholesale (zero removes it), unlike chat adds which
    /// accumulate.
    pub async fn set_item_quantity(
        &self,
        session_id: &SessionId,
        code: &ProductCode,
        quantity: u32,
    ) -> Result<Cart, AssistantError> {
        let mut session = self.load_session(session_id).await?;
        if session.cart.status == CartStatus::Completed {
            return Err(AssistantError::state(
                CartStatus::Completed,
                "This order is already placed. Reset the session to start a new one.",
            ));
        }
        let product = self
            .guard_read(|| self.catalog.by_code(code))
            .await?
            .ok_or_else(|| {
                AssistantError::validation(format!("unknown product code {}", code.as_str()))
            })?;

        let mut store = CartStore::new(&mut session.cart, &self.pricing);
        store.set_item_quantity(&product, quantity)?;
        if session.cart.is_empty() {
            session.cart.status = CartStatus::Idle;
        } else {
            session.cart.status =
                transition_ordering(session.cart.status, OrderingEvent::CartMutated)
                    .map_err(|error| AssistantError::state(session.cart.status, error.to_string()))?
                    .to;
        }
        self.save_session(session_id, &session).await?;
        Ok(session.cart)
    }

    /// Places the order for the session's current cart without going
    /// through chat dispatch. The session is written back only on success.
    pub async fn finalize_order(
        &self,
        session_id: &SessionId,
    ) -> Result<Order, AssistantError> {
        let mut session = self.load_session(session_id).await?;
        let order = self.run_finalize(&mut session).await?;
        self.save_session(session_id, &session).await?;
        Ok(order)
    }

    /// Drops cart and tracking state, keeping the customer profile.
    pub async fn reset_session(&self, session_id: &SessionId) -> Result<(), AssistantError> {
        let mut session = self.load_session(session_id).await?;
        session.reset_order_state();
        self.save_session(session_id, &session).await
    }

    async fn handle(&self, session: &mut Session, text: &str) -> Result<String, AssistantError> {
        if session.onboarding != OnboardingState::Done {
            return self.handle_onboarding(session, text).await;
        }
        if session.tracking.status != TrackingStatus::Idle {
            if let Some(response) = self.handle_tracking_followup(session, text).await? {
                return Ok(response);
            }
        }
        match classify(text) {
            Intent::Other => self.handle_other(session, text).await,
            intent => self.dispatch(session, text, intent).await,
        }
    }

    async fn dispatch(
        &self,
        session: &mut Session,
        text: &str,
        intent: Intent,
    ) -> Result<String, AssistantError> {
        match intent {
            Intent::AddItem => self.handle_add(session, text).await,
            Intent::RemoveItem => self.handle_remove(session, text).await,
            Intent::CalculateCost => self.handle_calculate(session, text).await,
            Intent::PlaceOrder => self.handle_place_order(session).await,
            Intent::TrackOrder => self.handle_track(session, text).await,
            Intent::Other => Ok(render::help_text()),
        }
    }

    async fn handle_other(
        &self,
        session: &mut Session,
        text: &str,
    ) -> Result<String, AssistantError> {
        if signals_order_intent(text) {
            if session.cart.status == CartStatus::Idle {
                session.cart.status =
                    transition_ordering(CartStatus::Idle, OrderingEvent::OrderIntent)
                        .map_err(|error| {
                            AssistantError::state(session.cart.status, error.to_string())
                        })?
                        .to;
            }
            let products = self.warehouse_products(session).await?;
            return Ok(render::product_listing(&products, &self.config.currency));
        }

        // Deterministic classification found nothing; ask the external
        // classifier once, then give up gracefully.
        match self.guard_read(|| self.fallback.classify(text)).await {
            Ok(Intent::Other) => Ok(render::help_text()),
            Ok(intent) => self.dispatch(session, text, intent).await,
            Err(error) => {
                warn!(%error, "intent fallback unavailable");
                Ok(render::help_text())
            }
        }
    }

    async fn handle_onboarding(
        &self,
        session: &mut Session,
        text: &str,
    ) -> Result<String, AssistantError> {
        let trimmed = text.trim();
        match session.onboarding {
            OnboardingState::AskName => {
                let lowered = trimmed.to_lowercase();
                if trimmed.is_empty()
                    || ["hi", "hello", "hey", "start", "hi there"].contains(&lowered.as_str())
                {
                    return Ok("Welcome! I can take your order over chat. What's your name?"
                        .to_string());
                }
                session.profile.name = Some(trimmed.to_string());
                session.onboarding = OnboardingState::AskEmail;
                Ok(format!("Nice to meet you, {trimmed}. What's your email address?"))
            }
            OnboardingState::AskEmail => {
                if !trimmed.contains('@') || !trimmed.contains('.') {
                    return Ok("That doesn't look like an email address. Please try again."
                        .to_string());
                }
                session.profile.email = Some(trimmed.to_string());
                session.onboarding = OnboardingState::AskWarehouse;
                let warehouses = self.guard_read(|| self.catalog.warehouses()).await?;
                let mut response = String::from("Which warehouse should we ship from?\n");
                for (id, name) in &warehouses {
                    response.push_str(&format!("  {} - {}\n", id.0, name));
                }
                Ok(response)
            }
            OnboardingState::AskWarehouse => {
                let warehouses = self.guard_read(|| self.catalog.warehouses()).await?;
                let lowered = trimmed.to_lowercase();
                let matches: Vec<&(WarehouseId, String)> = warehouses
                    .iter()
                    .filter(|(id, name)| {
                        id.0.eq_ignore_ascii_case(trimmed)
                            || name.to_lowercase().contains(&lowered)
                    })
                    .collect();
                match matches.as_slice() {
                    [(id, name)] => {
                        session.profile.warehouse = Some(id.clone());
                        session.onboarding = OnboardingState::Done;
                        let products = self.warehouse_products(session).await?;
                        Ok(format!(
                            "You're all set - ordering from {name}.\n\n{}",
                            render::product_listing(&products, &self.config.currency)
                        ))
                    }
                    [] => Ok("I don't know that warehouse. Please pick one from the list."
                        .to_string()),
                    _ => Ok("That matches more than one warehouse. Please use its code."
                        .to_string()),
                }
            }
            OnboardingState::Done => unreachable!("handled by the caller"),
        }
    }

    async fn handle_add(
        &self,
        session: &mut Session,
        text: &str,
    ) -> Result<String, AssistantError> {
        // A completed cart accepts nothing; the machine resets itself
        // rather than relying on the caller to remember.
        if session.cart.status == CartStatus::Completed {
            session.reset_order_state();
        }
        let products = self.warehouse_products(session).await?;
        let items = parse_add_request(text, &products)?;
        if items.is_empty() {
            return Ok(render::no_match_prompt(&products, &self.config.currency));
        }

        let mut store = CartStore::new(&mut session.cart, &self.pricing);
        for item in &items {
            let product = products
                .iter()
                .find(|product| product.code == item.code)
                .ok_or_else(|| {
                    AssistantError::validation(format!("unknown product code {}", item.code.as_str()))
                })?;
            store.add_item(product, item.quantity)?;
        }

        session.cart.status = transition_ordering(session.cart.status, OrderingEvent::CartMutated)
            .map_err(|error| AssistantError::state(session.cart.status, error.to_string()))?
            .to;
        session.cart.pending_confirmation = true;

        Ok(format!(
            "Added to your cart.\n\n{}\n\nSay 'place order' to finalize, or keep adding items.",
            render::cart_summary(&session.cart, &self.config.currency)
        ))
    }

    async fn handle_remove(
        &self,
        session: &mut Session,
        text: &str,
    ) -> Result<String, AssistantError> {
        if session.cart.is_empty() {
            return Err(AssistantError::state(
                session.cart.status,
                "Your cart is empty - there's nothing to remove.",
            ));
        }
        let Some(code) = parse_remove_request(text, &session.cart.lines)? else {
            return Ok(
                "I couldn't find that product in your cart. Check the name and try again."
                    .to_string(),
            );
        };

        let mut store = CartStore::new(&mut session.cart, &self.pricing);
        let removed = store.remove_item(&code)?;
        if store.cart().is_empty() {
            store.clear();
            return Ok("Cart cleared! Would you like to browse our products?".to_string());
        }
        session.cart.status = transition_ordering(session.cart.status, OrderingEvent::CartMutated)
            .map_err(|error| AssistantError::state(session.cart.status, error.to_string()))?
            .to;

        Ok(format!(
            "Removed {}.\n\n{}",
            removed.name,
            render::cart_summary(&session.cart, &self.config.currency)
        ))
    }

    async fn handle_calculate(
        &self,
        session: &mut Session,
        text: &str,
    ) -> Result<String, AssistantError> {
        if session.cart.status == CartStatus::Completed {
            session.reset_order_state();
        }
        let products = self.warehouse_products(session).await?;
        let items = parse_add_request(text, &products)?;

        if !items.is_empty() {
            let mut store = CartStore::new(&mut session.cart, &self.pricing);
            for item in &items {
                let product = products
                    .iter()
                    .find(|product| product.code == item.code)
                    .ok_or_else(|| {
                        AssistantError::validation(format!(
                            "unknown product code {}",
                            item.code.as_str()
                        ))
                    })?;
                // Cost questions state the wanted quantity outright, so
                // this replaces rather than accumulates.
                store.set_item_quantity(product, item.quantity)?;
            }
        }

        if session.cart.is_empty() {
            return Err(AssistantError::validation(
                "tell me which products and quantities to price, e.g. '2 Quantum Processors'",
            ));
        }

        session.cart.status =
            transition_ordering(session.cart.status, OrderingEvent::CostCalculated)
                .map_err(|error| AssistantError::state(session.cart.status, error.to_string()))?
                .to;

        Ok(format!(
            "{}\n\nSay 'place order' to finalize.",
            render::cart_summary(&session.cart, &self.config.currency)
        ))
    }

    async fn handle_place_order(&self, session: &mut Session) -> Result<String, AssistantError> {
        let order = self.run_finalize(session).await?;
        Ok(render::order_confirmation(&order, &self.config.currency))
    }

    async fn handle_track(
        &self,
        session: &mut Session,
        text: &str,
    ) -> Result<String, AssistantError> {
        let email = session
            .profile
            .email
            .clone()
            .ok_or_else(|| AssistantError::validation("no email on file for this session"))?;

        let mut summaries = self.guard_read(|| self.orders.orders_for(&email)).await?;
        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        summaries.truncate(self.config.order_history_limit);

        session.tracking.status =
            transition_tracking(session.tracking.status, TrackingEvent::TrackRequested)
                .map_err(|error| AssistantError::state(session.cart.status, error.to_string()))?
                .to;
        // Snapshot at query time; the listing does not update live.
        session.tracking.available_orders = summaries;
        session.tracking.selected_order_id = None;
        session.tracking.order_details = None;

        if let Some(id) = session.tracking.resolve_selection(extract_order_token(text)) {
            return self.view_order(session, id).await;
        }
        Ok(render::order_listing(&session.tracking.available_orders, &self.config.currency))
    }

    /// While the tracking axis is active, selection replies and exits are
    /// interpreted before normal intent dispatch. Returns `None` when the
    /// text is not a tracking follow-up.
    async fn handle_tracking_followup(
        &self,
        session: &mut Session,
        text: &str,
    ) -> Result<Option<String>, AssistantError> {
        let trimmed = text.trim().to_lowercase();
        if ["exit", "back", "close", "done"].contains(&trimmed.as_str()) {
            session.tracking.reset();
            return Ok(Some("Closed order tracking. Anything else?".to_string()));
        }
        if let Some(id) = session.tracking.resolve_selection(extract_order_token(text)) {
            return self.view_order(session, id).await.map(Some);
        }
        Ok(None)
    }

    async fn view_order(
        &self,
        session: &mut Session,
        id: OrderId,
    ) -> Result<String, AssistantError> {
        let order = self
            .guard_read(|| self.orders.by_id(&id))
            .await?
            .ok_or_else(|| {
                AssistantError::validation(format!("order {} was not found", id.as_str()))
            })?;

        session.tracking.status =
            transition_tracking(session.tracking.status, TrackingEvent::OrderSelected)
                .map_err(|error| AssistantError::state(session.cart.status, error.to_string()))?
                .to;
        session.tracking.selected_order_id = Some(id);
        session.tracking.order_details = Some(order.clone());

        Ok(render::order_details(&order, &self.config.currency))
    }

    pub(crate) async fn warehouse_products(
        &self,
        session: &Session,
    ) -> Result<Vec<Product>, AssistantError> {
        let warehouse = session
            .profile
            .warehouse
            .clone()
            .ok_or_else(|| AssistantError::validation("no warehouse selected yet"))?;
        self.guard_read(|| self.catalog.by_warehouse(&warehouse)).await
    }

    pub(crate) async fn load_session(
        &self,
        session_id: &SessionId,
    ) -> Result<Session, AssistantError> {
        let stored = self.guard_read(|| self.sessions.get(session_id)).await?;
        Ok(stored.unwrap_or_default())
    }

    pub(crate) async fn save_session(
        &self,
        session_id: &SessionId,
        session: &Session,
    ) -> Result<(), AssistantError> {
        // A session write is a write: never silently retried.
        self.guard(self.sessions.put(session_id, session)).await
    }

    /// Bounds one collaborator call; a timeout is an `External` error, not
    /// a crash.
    pub(crate) async fn guard<T, Fut>(&self, call: Fut) -> Result<T, AssistantError>
    where
        Fut: Future<Output = PortResult<T>>,
    {
        match timeout(self.config.external_timeout(), call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(error)) => Err(AssistantError::External(error.0)),
            Err(_) => Err(AssistantError::External("collaborator call timed out".to_string())),
        }
    }

    /// Read-only calls may be retried once; writes go through `guard`.
    pub(crate) async fn guard_read<T, Fut>(
        &self,
        make_call: impl Fn() -> Fut,
    ) -> Result<T, AssistantError>
    where
        Fut: Future<Output = PortResult<T>>,
    {
        match self.guard(make_call()).await {
            Ok(value) => Ok(value),
            Err(error) if self.config.retry_reads => {
                warn!(%error, "read call failed; retrying once");
                self.guard(make_call()).await
            }
            Err(error) => Err(error),
        }
    }
}

/// Pulls the first token that looks like an order id out of free text.
fn extract_order_token(text: &str) -> &str {
    text.split_whitespace()
        .find(|token| {
            token.len() > 4 && token.get(..4).is_some_and(|prefix| prefix.eq_ignore_ascii_case("ord-"))
        })
        .unwrap_or(text)
}

#[cfg(test)]
mod tests {
    use super::extract_order_token;

    #[test]
    fn order_tokens_are_extracted_from_surrounding_text() {
        assert_eq!(extract_order_token("track order ORD-0042 please"), "ORD-0042");
        assert_eq!(extract_order_token("2"), "2");
    }
}
