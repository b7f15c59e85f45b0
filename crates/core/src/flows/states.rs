use serde::{Deserialize, Serialize};

use crate::domain::cart::CartStatus;
use crate::domain::tracking::TrackingStatus;

/// Events on the ordering axis of a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderingEvent {
    /// The user signalled intent to order without touching the cart yet.
    OrderIntent,
    /// A parseable add/remove command succeeded.
    CartMutated,
    /// An explicit cost-calculation request resolved product and quantity.
    CostCalculated,
    /// The finalizer created an order.
    OrderPlaced,
    /// Forced reset back to a fresh cart.
    ResetRequested,
}

/// Events on the independent tracking axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackingEvent {
    TrackRequested,
    OrderSelected,
    ViewClosed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderingOutcome {
    pub from: CartStatus,
    pub to: CartStatus,
    pub event: OrderingEvent,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingOutcome {
    pub from: TrackingStatus,
    pub to: TrackingStatus,
    pub event: TrackingEvent,
}
