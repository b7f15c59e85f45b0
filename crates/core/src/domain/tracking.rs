use serde::{Deserialize, Serialize};

use crate::domain::order::{Order, OrderId, OrderSummary};

/// Tracking sub-state, independent of the ordering stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TrackingStatus {
    #[default]
    Idle,
    Selecting,
    Viewing,
}

/// Session-scoped state for browsing previously placed orders.
///
/// `available_orders` and `order_details` are snapshots taken at query
/// time, not live views.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TrackingSession {
    pub status: TrackingStatus,
    pub selected_order_id: Option<OrderId>,
    pub order_details: Option<Order>,
    pub available_orders: Vec<OrderSummary>,
}

impl TrackingSession {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Resolves a user selection against the snapshotted listing: either a
    /// 1-based index or a literal order id.
    pub fn resolve_selection(&self, input: &str) -> Option<OrderId> {
        let trimmed = input.trim();
        if let Ok(index) = trimmed.parse::<usize>() {
            if index >= 1 {
                return self.available_orders.get(index - 1).map(|order| order.id.clone());
            }
            return None;
        }
        self.available_orders
            .iter()
            .find(|order| order.id.as_str().eq_ignore_ascii_case(trimmed))
            .map(|order| order.id.clone())
    }
}
