pub mod cart_store;
pub mod config;
pub mod domain;
pub mod errors;
pub mod flows;
pub mod intent;
pub mod parser;
pub mod pricing;
pub mod session;

pub use cart_store::CartStore;
pub use config::{AssistantConfig, ConfigError};
pub use domain::cart::{Cart, CartLine, CartStatus};
pub use domain::order::{Order, OrderDraft, OrderId, OrderLine, OrderStatus, OrderSummary};
pub use domain::product::{Product, ProductCode, Scheme, WarehouseId};
pub use domain::tracking::{TrackingSession, TrackingStatus};
pub use errors::AssistantError;
pub use intent::Intent;
pub use parser::ParsedItem;
pub use pricing::{price_breakdown, round2, DeterministicPricingEngine, PriceBreakdown, PricingEngine};
pub use session::{CustomerProfile, OnboardingState, Session, SessionId, SESSION_SCHEMA_VERSION};
