//! Transition tables for the two per-session state axes.
//!
//! A rejected transition is an error and leaves the caller's state exactly
//! where it was; no stage ever changes on failure.

use thiserror::Error;

use crate::domain::cart::CartStatus;
use crate::domain::tracking::TrackingStatus;
use crate::flows::states::{OrderingEvent, OrderingOutcome, TrackingEvent, TrackingOutcome};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FlowTransitionError {
    #[error("invalid ordering transition from {state:?} on {event:?}")]
    InvalidOrdering { state: CartStatus, event: OrderingEvent },
    #[error("invalid tracking transition from {state:?} on {event:?}")]
    InvalidTracking { state: TrackingStatus, event: TrackingEvent },
}

pub fn transition_ordering(
    current: CartStatus,
    event: OrderingEvent,
) -> Result<OrderingOutcome, FlowTransitionError> {
    use CartStatus::{Browsing, Calculating, Completed, Confirming, Idle};
    use OrderingEvent::{CartMutated, CostCalculated, OrderIntent, OrderPlaced, ResetRequested};

    let to = match (current, event) {
        (Idle, OrderIntent) => Browsing,
        // A completed cart accepts nothing until it is force-reset.
        (Completed, ResetRequested) => Idle,
        (Completed, _) => {
            return Err(FlowTransitionError::InvalidOrdering { state: current, event });
        }
        (_, ResetRequested) => Idle,
        (Idle | Browsing | Confirming | Calculating, CartMutated) => Confirming,
        (Idle | Browsing | Confirming | Calculating, CostCalculated) => Calculating,
        (Confirming | Calculating, OrderPlaced) => Completed,
        _ => return Err(FlowTransitionError::InvalidOrdering { state: current, event }),
    };

    Ok(OrderingOutcome { from: current, to, event })
}

pub fn transition_tracking(
    current: TrackingStatus,
    event: TrackingEvent,
) -> Result<TrackingOutcome, FlowTransitionError> {
    use TrackingEvent::{OrderSelected, TrackRequested, ViewClosed};
    use TrackingStatus::{Idle, Selecting, Viewing};

    let to = match (current, event) {
        (_, TrackRequested) => Selecting,
        (Selecting | Viewing, OrderSelected) => Viewing,
        (_, ViewClosed) => Idle,
        (Idle, OrderSelected) => {
            return Err(FlowTransitionError::InvalidTracking { state: current, event });
        }
    };

    Ok(TrackingOutcome { from: current, to, event })
}
