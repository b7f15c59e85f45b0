//! In-memory collaborator implementations.
//!
//! Used by the integration tests and the demo binary. They model just
//! enough behavior to exercise the runtime: stock that depletes on
//! reserve, sequential order ids, and injectable failures.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;

use chatcart_core::domain::order::{Order, OrderDraft, OrderId, OrderStatus, OrderSummary};
use chatcart_core::domain::product::{Product, ProductCode, WarehouseId};
use chatcart_core::session::{Session, SessionId};

use crate::ports::{
    Catalog, Inventory, Notifier, OrderStore, PortError, PortResult, ReserveOutcome, SessionStore,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

#[derive(Clone, Default)]
pub struct InMemoryCatalog {
    warehouses: Vec<(WarehouseId, String)>,
    products: BTreeMap<String, Vec<Product>>,
}

impl InMemoryCatalog {
    pub fn new(warehouses: Vec<(WarehouseId, String)>) -> Self {
        Self { warehouses, products: BTreeMap::new() }
    }

    pub fn with_products(mut self, warehouse: &WarehouseId, products: Vec<Product>) -> Self {
        self.products.insert(warehouse.0.clone(), products);
        self
    }
}

#[async_trait]
impl Catalog for InMemoryCatalog {
    async fn warehouses(&self) -> PortResult<Vec<(WarehouseId, String)>> {
        Ok(self.warehouses.clone())
    }

    async fn by_warehouse(&self, warehouse: &WarehouseId) -> PortResult<Vec<Product>> {
        Ok(self.products.get(&warehouse.0).cloned().unwrap_or_default())
    }

    async fn by_code(&self, code: &ProductCode) -> PortResult<Option<Product>> {
        Ok(self
            .products
            .values()
            .flatten()
            .find(|product| &product.code == code)
            .cloned())
    }
}

#[derive(Clone, Default)]
pub struct InMemoryInventory {
    stock: Arc<Mutex<BTreeMap<String, u32>>>,
    reserved: Arc<Mutex<BTreeMap<String, u32>>>,
    /// Codes whose next reserve call reports insufficiency regardless of
    /// stock, to simulate a race with another session.
    contended: Arc<Mutex<BTreeMap<String, u32>>>,
}

impl InMemoryInventory {
    pub fn with_stock(stock: &[(&str, u32)]) -> Self {
        let inventory = Self::default();
        {
            let mut guard = lock(&inventory.stock);
            for (code, quantity) in stock {
                guard.insert((*code).to_owned(), *quantity);
            }
        }
        inventory
    }

    pub fn set_stock(&self, code: &str, quantity: u32) {
        lock(&self.stock).insert(code.to_owned(), quantity);
    }

    /// Makes the next `reserve` for `code` fail as if another session took
    /// the stock between the availability check and the reservation.
    pub fn contend(&self, code: &str, available_after_race: u32) {
        lock(&self.contended).insert(code.to_owned(), available_after_race);
    }

    pub fn reserved(&self, code: &str) -> u32 {
        lock(&self.reserved).get(code).copied().unwrap_or(0)
    }
}

#[async_trait]
impl Inventory for InMemoryInventory {
    async fn available(&self, code: &ProductCode) -> PortResult<u32> {
        Ok(lock(&self.stock).get(code.as_str()).copied().unwrap_or(0))
    }

    async fn reserve(&self, code: &ProductCode, quantity: u32) -> PortResult<ReserveOutcome> {
        if let Some(available) = lock(&self.contended).remove(code.as_str()) {
            return Ok(ReserveOutcome::Insufficient { available });
        }
        let mut stock = lock(&self.stock);
        let available = stock.get(code.as_str()).copied().unwrap_or(0);
        if available < quantity {
            return Ok(ReserveOutcome::Insufficient { available });
        }
        stock.insert(code.as_str().to_owned(), available - quantity);
        *lock(&self.reserved).entry(code.as_str().to_owned()).or_insert(0) += quantity;
        Ok(ReserveOutcome::Reserved)
    }

    async fn release(&self, code: &ProductCode, quantity: u32) -> PortResult<()> {
        let mut reserved = lock(&self.reserved);
        let held = reserved.get(code.as_str()).copied().unwrap_or(0);
        if held < quantity {
            return Err(PortError::new(format!(
                "release of {quantity} exceeds reservation {held} for {}",
                code.as_str()
            )));
        }
        reserved.insert(code.as_str().to_owned(), held - quantity);
        let mut stock = lock(&self.stock);
        *stock.entry(code.as_str().to_owned()).or_insert(0) += quantity;
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct InMemoryOrderStore {
    orders: Arc<Mutex<Vec<Order>>>,
    sequence: Arc<AtomicU64>,
    fail_create: Arc<AtomicBool>,
}

impl InMemoryOrderStore {
    pub fn orders(&self) -> Vec<Order> {
        lock(&self.orders).clone()
    }

    pub fn fail_next_create(&self) {
        self.fail_create.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn create(&self, draft: OrderDraft) -> PortResult<Order> {
        if self.fail_create.swap(false, Ordering::SeqCst) {
            return Err(PortError::new("order datastore unavailable"));
        }
        let number = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let order = Order {
            id: OrderId(format!("ORD-{number:04}")),
            lines: draft.lines,
            total_amount: draft.total_amount,
            status: OrderStatus::Pending,
            created_at: Utc::now(),
            warehouse: draft.warehouse,
            owner_email: draft.owner_email,
        };
        lock(&self.orders).push(order.clone());
        Ok(order)
    }

    async fn mark_failed(&self, id: &OrderId) -> PortResult<()> {
        let mut orders = lock(&self.orders);
        match orders.iter_mut().find(|order| &order.id == id) {
            Some(order) => {
                order.status = OrderStatus::Failed;
                Ok(())
            }
            None => Err(PortError::new(format!("unknown order {}", id.as_str()))),
        }
    }

    async fn orders_for(&self, owner_email: &str) -> PortResult<Vec<OrderSummary>> {
        Ok(lock(&self.orders)
            .iter()
            .filter(|order| order.owner_email == owner_email)
            .map(|order| OrderSummary {
                id: order.id.clone(),
                status: order.status,
                total_amount: order.total_amount,
                created_at: order.created_at,
            })
            .collect())
    }

    async fn by_id(&self, id: &OrderId) -> PortResult<Option<Order>> {
        Ok(lock(&self.orders).iter().find(|order| &order.id == id).cloned())
    }
}

#[derive(Clone, Default)]
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<(OrderId, String)>>>,
    fail: Arc<AtomicBool>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<(OrderId, String)> {
        lock(&self.sent).clone()
    }

    pub fn fail_next(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn order_confirmed(&self, order: &Order, recipient_email: &str) -> PortResult<()> {
        if self.fail.swap(false, Ordering::SeqCst) {
            return Err(PortError::new("mail relay refused the message"));
        }
        lock(&self.sent).push((order.id.clone(), recipient_email.to_owned()));
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct InMemorySessionStore {
    sessions: Arc<Mutex<BTreeMap<String, String>>>,
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, id: &SessionId) -> PortResult<Option<Session>> {
        match lock(&self.sessions).get(id.as_str()) {
            Some(raw) => {
                let session =
                    Session::from_json(raw).map_err(|error| PortError::new(error.to_string()))?;
                Ok(Some(session))
            }
            None => Ok(None),
        }
    }

    async fn put(&self, id: &SessionId, session: &Session) -> PortResult<()> {
        let raw = session.to_json().map_err(|error| PortError::new(error.to_string()))?;
        lock(&self.sessions).insert(id.as_str().to_owned(), raw);
        Ok(())
    }
}
