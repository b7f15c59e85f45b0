//! The versioned per-session aggregate.
//!
//! One session owns exactly one cart and one tracking sub-state; no two
//! sessions ever share them. The aggregate is serialized as a whole through
//! the SessionStore collaborator, with an explicit schema version so
//! evolution stays controlled.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::cart::Cart;
use crate::domain::product::WarehouseId;
use crate::domain::tracking::TrackingSession;
use crate::errors::AssistantError;

pub const SESSION_SCHEMA_VERSION: u16 = 1;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Progress through the one-time onboarding dialogue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OnboardingState {
    #[default]
    AskName,
    AskEmail,
    AskWarehouse,
    Done,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CustomerProfile {
    pub name: Option<String>,
    pub email: Option<String>,
    pub warehouse: Option<WarehouseId>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub version: u16,
    pub onboarding: OnboardingState,
    pub profile: CustomerProfile,
    pub cart: Cart,
    pub tracking: TrackingSession,
}

impl Session {
    pub fn new() -> Self {
        Self {
            version: SESSION_SCHEMA_VERSION,
            onboarding: OnboardingState::default(),
            profile: CustomerProfile::default(),
            cart: Cart::new(),
            tracking: TrackingSession::default(),
        }
    }

    /// Drops the cart and tracking state but keeps the customer profile,
    /// so a returning user does not re-onboard.
    pub fn reset_order_state(&mut self) {
        self.cart = Cart::new();
        self.tracking.reset();
    }

    pub fn to_json(&self) -> Result<String, AssistantError> {
        serde_json::to_string(self)
            .map_err(|error| AssistantError::External(format!("session encode failed: {error}")))
    }

    pub fn from_json(raw: &str) -> Result<Self, AssistantError> {
        let session: Self = serde_json::from_str(raw)
            .map_err(|error| AssistantError::External(format!("session decode failed: {error}")))?;
        if session.version > SESSION_SCHEMA_VERSION {
            return Err(AssistantError::External(format!(
                "session schema version {} is newer than supported {}",
                session.version, SESSION_SCHEMA_VERSION
            )));
        }
        Ok(session)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
