//! Deterministic intent classification.
//!
//! The runtime dispatches over this tagged variant; the external LLM
//! classifier is consulted only when this yields `Other`, never interleaved.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Intent {
    AddItem,
    RemoveItem,
    CalculateCost,
    PlaceOrder,
    TrackOrder,
    Other,
}

/// Keyword classification over normalized text. Rules are ordered: the
/// more specific commitment phrases win over generic cost words.
pub fn classify(text: &str) -> Intent {
    let lowered = text.to_lowercase();
    let text = lowered.trim();

    if contains_any(text, &["place order", "place my order", "confirm order", "confirm my order", "checkout", "check out"]) {
        return Intent::PlaceOrder;
    }
    if text.starts_with("add ") || text.contains(" add ") {
        return Intent::AddItem;
    }
    if text.starts_with("remove ") || text.starts_with("delete ") {
        return Intent::RemoveItem;
    }
    if contains_any(text, &["track", "order status", "where is my order", "my orders", "past orders"]) {
        return Intent::TrackOrder;
    }
    if contains_any(text, &["calculate", "cost", "how much", "total", "price for", "price of", "quote"]) {
        return Intent::CalculateCost;
    }

    Intent::Other
}

/// Whether free text signals the wish to start ordering without naming a
/// product yet ("I want to order", "show me the products").
pub fn signals_order_intent(text: &str) -> bool {
    let lowered = text.to_lowercase();
    contains_any(
        &lowered,
        &["want to order", "like to order", "start an order", "place an order", "buy", "order something", "show products", "show me the products", "what products", "browse"],
    )
}

fn contains_any(text: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| text.contains(needle))
}
