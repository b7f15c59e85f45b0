pub mod engine;
pub mod states;

pub use engine::{transition_ordering, transition_tracking, FlowTransitionError};
pub use states::{OrderingEvent, OrderingOutcome, TrackingEvent, TrackingOutcome};
