//! Collaborator contracts the runtime depends on.
//!
//! Everything behind these traits is an external system: the catalog and
//! inventory services, the order datastore, outbound notification, session
//! persistence, and the LLM intent classifier. The runtime wraps every call
//! in a bounded timeout and maps failures to `AssistantError::External`.

use async_trait::async_trait;
use thiserror::Error;

use chatcart_core::domain::order::{Order, OrderDraft, OrderId, OrderSummary};
use chatcart_core::domain::product::{Product, ProductCode, WarehouseId};
use chatcart_core::intent::Intent;
use chatcart_core::session::{Session, SessionId};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct PortError(pub String);

impl PortError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

pub type PortResult<T> = Result<T, PortError>;

#[async_trait]
pub trait Catalog: Send + Sync {
    async fn warehouses(&self) -> PortResult<Vec<(WarehouseId, String)>>;
    async fn by_warehouse(&self, warehouse: &WarehouseId) -> PortResult<Vec<Product>>;
    async fn by_code(&self, code: &ProductCode) -> PortResult<Option<Product>>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReserveOutcome {
    Reserved,
    Insufficient { available: u32 },
}

#[async_trait]
pub trait Inventory: Send + Sync {
    async fn available(&self, code: &ProductCode) -> PortResult<u32>;
    async fn reserve(&self, code: &ProductCode, quantity: u32) -> PortResult<ReserveOutcome>;
    /// Returns a prior reservation to stock. Used only to roll back a
    /// partially reserved finalize call.
    async fn release(&self, code: &ProductCode, quantity: u32) -> PortResult<()>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn create(&self, draft: OrderDraft) -> PortResult<Order>;
    /// Best-effort: flags an order whose reservations could not be
    /// completed so the external order manager can reconcile it.
    async fn mark_failed(&self, id: &OrderId) -> PortResult<()>;
    async fn orders_for(&self, owner_email: &str) -> PortResult<Vec<OrderSummary>>;
    async fn by_id(&self, id: &OrderId) -> PortResult<Option<Order>>;
}

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Best-effort; a failure here never fails the finalize call.
    async fn order_confirmed(&self, order: &Order, recipient_email: &str) -> PortResult<()>;
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, id: &SessionId) -> PortResult<Option<Session>>;
    async fn put(&self, id: &SessionId, session: &Session) -> PortResult<()>;
}

/// The external LLM classifier, consulted only after the deterministic
/// classifier yields `Other`.
#[async_trait]
pub trait IntentFallback: Send + Sync {
    async fn classify(&self, text: &str) -> PortResult<Intent>;
}

/// A fallback that never recognizes anything; useful where no LLM
/// collaborator is wired.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoFallback;

#[async_trait]
impl IntentFallback for NoFallback {
    async fn classify(&self, _text: &str) -> PortResult<Intent> {
        Ok(Intent::Other)
    }
}
