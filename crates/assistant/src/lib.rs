//! The chat-facing runtime: per-message routing over the pure core, with
//! every external system behind an async collaborator trait.

mod finalize;

pub mod memory;
pub mod ports;
pub mod render;
pub mod runtime;

pub use ports::{
    Catalog, IntentFallback, Inventory, NoFallback, Notifier, OrderStore, PortError, PortResult,
    ReserveOutcome, SessionStore,
};
pub use runtime::{Assistant, MessageOutcome};
