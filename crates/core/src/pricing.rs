//! Deterministic price breakdowns for a single cart line.
//!
//! Money values are rounded to two decimals only at the line-total and
//! display boundaries, never mid-calculation.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::domain::product::Scheme;
use crate::errors::AssistantError;

/// Rounds a money value to two decimals, half away from zero.
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBreakdown {
    /// Price charged per paid unit, after flat discount and scheme.
    pub final_unit_price: Decimal,
    pub paid_quantity: u32,
    pub free_quantity: u32,
    /// `round2(final_unit_price * paid_quantity)`.
    pub line_total: Decimal,
    /// Informational: the flat discount as a percentage of the base price.
    pub discount_percent_applied: Decimal,
}

pub trait PricingEngine: Send + Sync {
    fn price(
        &self,
        base_price: Decimal,
        flat_discount: Decimal,
        scheme: &Scheme,
        quantity: u32,
    ) -> Result<PriceBreakdown, AssistantError>;
}

#[derive(Clone, Debug, Default)]
pub struct DeterministicPricingEngine;

impl PricingEngine for DeterministicPricingEngine {
    fn price(
        &self,
        base_price: Decimal,
        flat_discount: Decimal,
        scheme: &Scheme,
        quantity: u32,
    ) -> Result<PriceBreakdown, AssistantError> {
        price_breakdown(base_price, flat_discount, scheme, quantity)
    }
}

/// Computes the breakdown for one line.
///
/// Negative flat discounts clamp to zero; a flat discount above the base
/// price clamps the unit price at zero. `paid_quantity + free_quantity`
/// always equals `quantity`.
pub fn price_breakdown(
    base_price: Decimal,
    flat_discount: Decimal,
    scheme: &Scheme,
    quantity: u32,
) -> Result<PriceBreakdown, AssistantError> {
    if quantity == 0 {
        return Err(AssistantError::validation("quantity must be greater than zero"));
    }

    let flat = flat_discount.max(Decimal::ZERO);
    let price_after_flat = (base_price - flat).max(Decimal::ZERO);

    let (unit_price, paid, free) = match scheme {
        Scheme::None => (price_after_flat, quantity, 0),
        Scheme::BuyXGetYFree { buy, free } if quantity >= *buy => {
            let group_size = buy + free;
            let groups = quantity / group_size;
            let remainder = quantity % group_size;
            // Within a partial trailing group the first `buy` units are
            // paid and anything past them rides free.
            let remainder_paid = remainder.min(*buy);
            let paid = groups * buy + remainder_paid;
            let free = groups * free + (remainder - remainder_paid);
            (price_after_flat, paid, free)
        }
        Scheme::BuyXGetYFree { .. } => (price_after_flat, quantity, 0),
        Scheme::PercentOff { min_qty, percent } if quantity >= *min_qty => {
            // A percent above 100 clamps at free, mirroring the flat path.
            let factor =
                (Decimal::ONE - Decimal::from(*percent) / Decimal::from(100u32)).max(Decimal::ZERO);
            (price_after_flat * factor, quantity, 0)
        }
        Scheme::PercentOff { .. } => (price_after_flat, quantity, 0),
    };

    debug_assert_eq!(paid + free, quantity);

    let final_unit_price = round2(unit_price);
    let line_total = round2(final_unit_price * Decimal::from(paid));
    let discount_percent_applied = if base_price > Decimal::ZERO {
        round2(flat / base_price * Decimal::from(100u32))
    } else {
        Decimal::ZERO
    };

    Ok(PriceBreakdown {
        final_unit_price,
        paid_quantity: paid,
        free_quantity: free,
        line_total,
        discount_percent_applied,
    })
}
