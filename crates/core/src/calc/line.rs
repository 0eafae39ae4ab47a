//! Per-line total calculation.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use super::error::CalcError;

/// The caller-supplied inputs of one document line.
///
/// Everything else on a line is derived; totals are never accepted as
/// direct input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineInput {
    /// Quantity of the item (non-negative).
    pub quantity: Decimal,
    /// Price per unit, excluding VAT (non-negative).
    pub unit_price: Decimal,
    /// VAT rate in percent (non-negative).
    pub vat_rate: Decimal,
    /// Discount in percent, within 0..=100.
    pub discount_percent: Decimal,
}

/// The derived totals of one document line, each rounded to 2 decimals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineTotals {
    /// Line total excluding VAT, after discount.
    pub excl_vat: Decimal,
    /// VAT amount on the discounted line total.
    pub vat_amount: Decimal,
    /// Line total including VAT.
    pub incl_vat: Decimal,
}

/// Rounds to 2 decimals, half away from zero.
#[must_use]
pub(crate) fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Calculates the derived totals of one line.
///
/// `excl = round(quantity × price × (1 − discount/100))`,
/// `vat = round(excl × rate/100)`, `incl = excl + vat`. Rounding happens
/// per line so document totals are sums of already-rounded values.
///
/// # Errors
///
/// Returns [`CalcError`] for negative quantities, prices, or rates, and
/// for discounts outside 0..=100.
pub fn calculate_line(input: &LineInput) -> Result<LineTotals, CalcError> {
    if input.quantity.is_sign_negative() {
        return Err(CalcError::NegativeQuantity);
    }
    if input.unit_price.is_sign_negative() {
        return Err(CalcError::NegativeUnitPrice);
    }
    if input.vat_rate.is_sign_negative() {
        return Err(CalcError::NegativeVatRate);
    }
    if input.discount_percent.is_sign_negative() || input.discount_percent > Decimal::ONE_HUNDRED {
        return Err(CalcError::DiscountOutOfRange(input.discount_percent));
    }

    let discount_factor = Decimal::ONE - input.discount_percent / Decimal::ONE_HUNDRED;
    let excl_vat = round_money(input.quantity * input.unit_price * discount_factor);
    let vat_amount = round_money(excl_vat * input.vat_rate / Decimal::ONE_HUNDRED);
    let incl_vat = excl_vat + vat_amount;

    Ok(LineTotals {
        excl_vat,
        vat_amount,
        incl_vat,
    })
}
