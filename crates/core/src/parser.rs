//! Deterministic free-text parsing of cart commands.
//!
//! Patterns are tried in a fixed order and the first hit wins:
//!   1. `add <qty> <name>`
//!   2. `add <name> <qty>`
//!   3. `add <name>`            (quantity defaults to 1)
//!   4. `<name> - <qty> units`
//!   5. `<qty> <name>`
//!   6. `... <qty> <name>`       (quantity mid-sentence, for cost questions)
//!
//! Product resolution tries exact case-insensitive name/code matches first
//! (tolerating a trailing plural `s`), then token overlap. A name matching more than one product at the same
//! tier is reported as ambiguous, never ranked; no match at all yields an
//! empty result so the caller can prompt with the available products.

use serde::{Deserialize, Serialize};

use crate::domain::cart::CartLine;
use crate::domain::product::{Product, ProductCode};
use crate::errors::AssistantError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedItem {
    pub code: ProductCode,
    pub name: String,
    pub quantity: u32,
}

/// Extracts zero or more (product, quantity) pairs from raw chat text.
///
/// Multi-item messages are split on newlines and commas and each segment is
/// parsed independently; segments that match no pattern are skipped.
pub fn parse_add_request(
    text: &str,
    products: &[Product],
) -> Result<Vec<ParsedItem>, AssistantError> {
    let mut items = Vec::new();
    for segment in segments(text) {
        let Some((name, quantity)) = match_patterns(&segment) else {
            continue;
        };
        if quantity == 0 {
            return Err(AssistantError::validation("quantity must be greater than zero"));
        }
        match resolve(&name, products)? {
            Some(product) => items.push(ParsedItem {
                code: product.code.clone(),
                name: product.name.clone(),
                quantity,
            }),
            None => continue,
        }
    }
    Ok(items)
}

/// Resolves a `remove <name>` / `delete <name>` request against the cart's
/// own lines. Returns `None` when the text is not a removal command or the
/// name matches nothing in the cart.
pub fn parse_remove_request(
    text: &str,
    lines: &[CartLine],
) -> Result<Option<ProductCode>, AssistantError> {
    let normalized = normalize(text);
    let name = match normalized
        .strip_prefix("remove ")
        .or_else(|| normalized.strip_prefix("delete "))
    {
        Some(rest) => strip_cart_suffix(rest).to_owned(),
        None => return Ok(None),
    };
    if name.is_empty() {
        return Ok(None);
    }

    let singular = name.strip_suffix('s').unwrap_or(&name).to_owned();
    let exact: Vec<&CartLine> = lines
        .iter()
        .filter(|line| {
            line.name.eq_ignore_ascii_case(&name)
                || line.name.eq_ignore_ascii_case(&singular)
                || line.code.as_str().eq_ignore_ascii_case(&name)
        })
        .collect();
    let candidates = if exact.is_empty() {
        lines
            .iter()
            .filter(|line| {
                line.name.to_lowercase().contains(&singular)
                    || name.contains(&line.code.as_str().to_lowercase())
                    || shares_token(&name, &line.name)
            })
            .collect()
    } else {
        exact
    };

    match candidates.as_slice() {
        [] => Ok(None),
        [line] => Ok(Some(line.code.clone())),
        many => Err(AssistantError::Ambiguous {
            query: name,
            candidates: many
                .iter()
                .map(|line| format!("{} ({})", line.name, line.code.as_str()))
                .collect(),
        }),
    }
}

fn segments(text: &str) -> Vec<String> {
    text.split(['\n', ','])
        .map(normalize)
        .filter(|segment| !segment.is_empty())
        .collect()
}

fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

fn strip_cart_suffix(text: &str) -> &str {
    let trimmed = text.trim();
    for suffix in ["to my cart", "to the cart", "to cart", "from my cart", "from the cart", "from cart"] {
        if let Some(rest) = trimmed.strip_suffix(suffix) {
            return rest.trim();
        }
    }
    trimmed
}

/// Applies the fixed pattern cascade to one segment, returning the raw
/// product name and quantity.
fn match_patterns(segment: &str) -> Option<(String, u32)> {
    if let Some(rest) = segment.strip_prefix("add ") {
        let rest = strip_cart_suffix(rest);
        let tokens: Vec<&str> = rest.split(' ').collect();
        if tokens.is_empty() || rest.is_empty() {
            return None;
        }
        // add <qty> <name>
        if let Ok(quantity) = tokens[0].parse::<u32>() {
            if tokens.len() > 1 {
                return Some((tokens[1..].join(" "), quantity));
            }
            return None;
        }
        // add <name> <qty>
        if tokens.len() > 1 {
            if let Ok(quantity) = tokens[tokens.len() - 1].parse::<u32>() {
                return Some((tokens[..tokens.len() - 1].join(" "), quantity));
            }
        }
        // add <name>
        return Some((rest.to_owned(), 1));
    }

    // <name> - <qty> units
    if let Some((name, tail)) = segment.split_once(" - ") {
        let tail = tail.trim();
        let qty_token =
            tail.strip_suffix("units").or_else(|| tail.strip_suffix("unit")).unwrap_or(tail);
        if let Ok(quantity) = qty_token.trim().parse::<u32>() {
            let name = name.trim();
            if !name.is_empty() {
                return Some((name.to_owned(), quantity));
            }
        }
    }

    // <qty> <name>
    let tokens: Vec<&str> = segment.split(' ').collect();
    if tokens.len() > 1 {
        if let Ok(quantity) = tokens[0].parse::<u32>() {
            return Some((tokens[1..].join(" "), quantity));
        }
    }

    // ... <qty> <name>, e.g. "how much for 8 ai memory cards"
    for (index, token) in tokens.iter().enumerate() {
        if let Ok(quantity) = token.parse::<u32>() {
            if index + 1 < tokens.len() {
                return Some((tokens[index + 1..].join(" "), quantity));
            }
        }
    }

    None
}

/// Two-tier product resolution with explicit ambiguity.
fn resolve<'a>(
    name: &str,
    products: &'a [Product],
) -> Result<Option<&'a Product>, AssistantError> {
    let singular = name.strip_suffix('s').unwrap_or(name);
    let exact: Vec<&Product> = products
        .iter()
        .filter(|product| {
            product.name.eq_ignore_ascii_case(name)
                || product.name.eq_ignore_ascii_case(singular)
                || product.code.as_str().eq_ignore_ascii_case(name)
        })
        .collect();
    let tier = if exact.is_empty() {
        products
            .iter()
            .filter(|product| {
                product.name.to_lowercase().contains(singular)
                    || name.contains(&product.code.as_str().to_lowercase())
                    || shares_token(name, &product.name)
            })
            .collect()
    } else {
        exact
    };

    match tier.as_slice() {
        [] => Ok(None),
        [product] => Ok(Some(product)),
        many => Err(AssistantError::Ambiguous {
            query: name.to_owned(),
            candidates: many.iter().map(|product| product.display()).collect(),
        }),
    }
}

/// At least one shared token longer than two characters, with trailing
/// plural `s` tolerated on the query side.
fn shares_token(query: &str, product_name: &str) -> bool {
    let product_lower = product_name.to_lowercase();
    let product_tokens: Vec<&str> = product_lower.split_whitespace().collect();
    query
        .split_whitespace()
        .map(|token| token.strip_suffix('s').unwrap_or(token))
        .filter(|token| token.len() > 2)
        .any(|token| product_tokens.contains(&token))
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{parse_add_request, parse_remove_request, ParsedItem};
    use crate::domain::cart::CartLine;
    use crate::domain::product::{Product, ProductCode};
    use crate::errors::AssistantError;

    fn product(code: &str, name: &str) -> Product {
        Product {
            code: ProductCode(code.to_owned()),
            name: name.to_owned(),
            base_price: Decimal::from(100),
            flat_discount: Decimal::ZERO,
            scheme_label: String::new(),
        }
    }

    fn catalog() -> Vec<Product> {
        vec![
            product("QB001", "Quantum Processor"),
            product("QB002", "Neural Network Module"),
            product("QB003", "AI Memory Card"),
            product("QB004", "Quantum Sensor"),
        ]
    }

    fn parsed(code: &str, name: &str, quantity: u32) -> ParsedItem {
        ParsedItem { code: ProductCode(code.to_owned()), name: name.to_owned(), quantity }
    }

    #[test]
    fn add_qty_name_pattern_wins_first() {
        let items = parse_add_request("add 2 neural network module", &catalog()).expect("parse");
        assert_eq!(items, vec![parsed("QB002", "Neural Network Module", 2)]);
    }

    #[test]
    fn add_name_qty_pattern() {
        let items = parse_add_request("add ai memory card 4 to cart", &catalog()).expect("parse");
        assert_eq!(items, vec![parsed("QB003", "AI Memory Card", 4)]);
    }

    #[test]
    fn bare_add_defaults_quantity_to_one() {
        let items = parse_add_request("add neural network module", &catalog()).expect("parse");
        assert_eq!(items, vec![parsed("QB002", "Neural Network Module", 1)]);
    }

    #[test]
    fn name_dash_units_pattern() {
        let items =
            parse_add_request("AI Memory Card - 6 units", &catalog()).expect("parse");
        assert_eq!(items, vec![parsed("QB003", "AI Memory Card", 6)]);
    }

    #[test]
    fn leading_qty_name_pattern() {
        let items = parse_add_request("3 neural network module", &catalog()).expect("parse");
        assert_eq!(items, vec![parsed("QB002", "Neural Network Module", 3)]);
    }

    #[test]
    fn plural_names_resolve_to_the_singular_product() {
        let items = parse_add_request("add 5 quantum processors", &catalog()).expect("parse");
        assert_eq!(items, vec![parsed("QB001", "Quantum Processor", 5)]);
    }

    #[test]
    fn quantity_is_found_mid_sentence() {
        let items =
            parse_add_request("how much for 8 ai memory cards", &catalog()).expect("parse");
        assert_eq!(items, vec![parsed("QB003", "AI Memory Card", 8)]);
    }

    #[test]
    fn resolution_accepts_product_codes() {
        let items = parse_add_request("add 2 qb003", &catalog()).expect("parse");
        assert_eq!(items[0].code, ProductCode("QB003".to_owned()));
    }

    #[test]
    fn multi_item_messages_split_on_commas_and_newlines() {
        let items = parse_add_request(
            "Neural Network Module - 2 units\nAI Memory Card - 5 units, add 1 quantum processor",
            &catalog(),
        )
        .expect("parse");
        assert_eq!(
            items,
            vec![
                parsed("QB002", "Neural Network Module", 2),
                parsed("QB003", "AI Memory Card", 5),
                parsed("QB001", "Quantum Processor", 1),
            ]
        );
    }

    #[test]
    fn ambiguous_token_match_is_not_ranked() {
        // "quantum" hits both the processor and the sensor.
        let error = parse_add_request("add 2 quantum", &catalog()).expect_err("ambiguous");
        match error {
            AssistantError::Ambiguous { candidates, .. } => {
                assert_eq!(candidates.len(), 2);
                assert!(candidates.iter().any(|c| c.contains("QB001")));
                assert!(candidates.iter().any(|c| c.contains("QB004")));
            }
            other => panic!("expected ambiguity, got {other:?}"),
        }
    }

    #[test]
    fn exact_match_beats_partial_matches() {
        // "quantum sensor" is an exact name even though "quantum" also
        // appears in another product.
        let items = parse_add_request("add 2 quantum sensor", &catalog()).expect("parse");
        assert_eq!(items, vec![parsed("QB004", "Quantum Sensor", 2)]);
    }

    #[test]
    fn unknown_product_yields_empty_result() {
        let items = parse_add_request("add 2 flux capacitors", &catalog()).expect("parse");
        assert!(items.is_empty());
    }

    #[test]
    fn chatter_without_patterns_yields_empty_result() {
        let items = parse_add_request("hello there, how are you", &catalog()).expect("parse");
        assert!(items.is_empty());
    }

    #[test]
    fn zero_quantity_is_a_validation_error() {
        let error =
            parse_add_request("add 0 quantum processor", &catalog()).expect_err("zero quantity");
        assert!(matches!(error, AssistantError::Validation(_)));
    }

    fn cart_line(code: &str, name: &str) -> CartLine {
        CartLine {
            code: ProductCode(code.to_owned()),
            name: name.to_owned(),
            requested_quantity: 1,
            unit_base_price: Decimal::from(100),
            flat_discount: Decimal::ZERO,
            scheme_label: String::new(),
            final_unit_price: Decimal::from(100),
            paid_quantity: 1,
            free_quantity: 0,
            line_total: Decimal::from(100),
            discount_percent_applied: Decimal::ZERO,
        }
    }

    #[test]
    fn remove_resolves_against_the_cart() {
        let lines =
            vec![cart_line("QB001", "Quantum Processor"), cart_line("QB003", "AI Memory Card")];
        let code = parse_remove_request("remove ai memory card", &lines).expect("parse");
        assert_eq!(code, Some(ProductCode("QB003".to_owned())));
    }

    #[test]
    fn remove_of_absent_product_is_none() {
        let lines = vec![cart_line("QB001", "Quantum Processor")];
        assert_eq!(parse_remove_request("remove sensor", &lines).expect("parse"), None);
        assert_eq!(parse_remove_request("what is in my cart", &lines).expect("parse"), None);
    }

    #[test]
    fn remove_with_two_matches_is_ambiguous() {
        let lines =
            vec![cart_line("QB001", "Quantum Processor"), cart_line("QB004", "Quantum Sensor")];
        let error = parse_remove_request("delete quantum", &lines).expect_err("ambiguous");
        assert!(matches!(error, AssistantError::Ambiguous { .. }));
    }
}
