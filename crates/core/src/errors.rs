use thiserror::Error;

use crate::domain::cart::CartStatus;

/// Error taxonomy for the assistant core.
///
/// Every variant is recoverable: it renders to a user-facing clarification
/// and the session state it was raised against stays untouched.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum AssistantError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("ambiguous product reference `{query}`")]
    Ambiguous { query: String, candidates: Vec<String> },
    #[error("operation not valid in stage {stage:?}: {message}")]
    State { stage: CartStatus, message: String },
    #[error("insufficient stock for {code}: requested {requested}, available {available}")]
    Stock { code: String, requested: u32, available: u32 },
    #[error("collaborator failure: {0}")]
    External(String),
}

impl AssistantError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn state(stage: CartStatus, message: impl Into<String>) -> Self {
        Self::State { stage, message: message.into() }
    }

    /// A safe, actionable message for the chat user.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(message) => format!("I couldn't process that: {message}"),
            Self::Ambiguous { query, candidates } => {
                let mut text = format!(
                    "\"{query}\" matches more than one product. Which one did you mean?\n"
                );
                for candidate in candidates {
                    text.push_str(&format!("  - {candidate}\n"));
                }
                text.push_str("Please repeat the request with the exact name or code.");
                text
            }
            Self::State { message, .. } => message.clone(),
            Self::Stock { code, requested, available } => format!(
                "Not enough stock for {code}: you asked for {requested} but only {available} \
                 are available. Adjust the quantity and try again."
            ),
            Self::External(_) => {
                "A backend service is temporarily unavailable. Your cart is unchanged - please \
                 try again shortly."
                    .to_string()
            }
        }
    }
}
