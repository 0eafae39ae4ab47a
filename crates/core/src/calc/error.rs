//! Calculation input errors.

use defter_shared::AppError;
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors for malformed calculation inputs.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CalcError {
    /// Quantity must not be negative.
    #[error("Quantity cannot be negative")]
    NegativeQuantity,

    /// Unit price must not be negative.
    #[error("Unit price cannot be negative")]
    NegativeUnitPrice,

    /// VAT rate must not be negative.
    #[error("VAT rate cannot be negative")]
    NegativeVatRate,

    /// Discount percent must lie within 0..=100.
    #[error("Discount percent {0} is outside 0..=100")]
    DiscountOutOfRange(Decimal),
}

impl CalcError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NegativeQuantity => "NEGATIVE_QUANTITY",
            Self::NegativeUnitPrice => "NEGATIVE_UNIT_PRICE",
            Self::NegativeVatRate => "NEGATIVE_VAT_RATE",
            Self::DiscountOutOfRange(_) => "DISCOUNT_OUT_OF_RANGE",
        }
    }
}

impl From<CalcError> for AppError {
    fn from(err: CalcError) -> Self {
        Self::Validation(err.to_string())
    }
}
