use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductCode(pub String);

impl ProductCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WarehouseId(pub String);

/// One catalog entry for a warehouse, as supplied by the Catalog collaborator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub code: ProductCode,
    pub name: String,
    pub base_price: Decimal,
    /// Flat per-unit discount amount, already expressed in currency units.
    pub flat_discount: Decimal,
    /// Human-readable scheme label, e.g. "Buy 2 Get 1 Free". May be empty.
    pub scheme_label: String,
}

impl Product {
    pub fn scheme(&self) -> Scheme {
        Scheme::parse_label(&self.scheme_label)
    }

    /// Display form used in clarification prompts: "Name (CODE)".
    pub fn display(&self) -> String {
        format!("{} ({})", self.name, self.code.as_str())
    }
}

/// A discount policy attached to a product.
///
/// Labels come from catalog data and are free text; anything that does not
/// parse degrades to `Scheme::None` rather than failing the pricing call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Scheme {
    #[default]
    None,
    /// Buy `buy` paid units, receive `free` free units, repeating per group
    /// of `buy + free`.
    BuyXGetYFree { buy: u32, free: u32 },
    /// Flat `percent` off every unit once `min_qty` is met.
    PercentOff { min_qty: u32, percent: u32 },
}

impl Scheme {
    /// Parses labels of the shape "Buy X Get Y Free" and "Buy X Get Y% Off".
    ///
    /// Matching is case-insensitive and tolerant of extra whitespace. Any
    /// other label, including the empty string, is `Scheme::None`.
    pub fn parse_label(label: &str) -> Self {
        let lowered = label.to_lowercase();
        let tokens: Vec<&str> = lowered.split_whitespace().collect();
        if tokens.len() != 5 || tokens[0] != "buy" || tokens[2] != "get" {
            return Self::None;
        }
        let Ok(buy) = tokens[1].parse::<u32>() else {
            return Self::None;
        };
        if buy == 0 {
            return Self::None;
        }

        match (tokens[3], tokens[4]) {
            (qty, "free") => match qty.parse::<u32>() {
                Ok(free) if free > 0 => Self::BuyXGetYFree { buy, free },
                _ => Self::None,
            },
            (pct, "off") => match pct.strip_suffix('%').and_then(|p| p.parse::<u32>().ok()) {
                Some(percent) if percent > 0 && percent <= 100 => {
                    Self::PercentOff { min_qty: buy, percent }
                }
                _ => Self::None,
            },
            _ => Self::None,
        }
    }
}
