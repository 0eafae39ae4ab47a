//! Document total calculation.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::line::{round_money, LineTotals};

/// The derived totals of a whole document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentTotals {
    /// Sum of line totals excluding VAT.
    pub sub_total: Decimal,
    /// Sum of line VAT amounts.
    pub total_vat: Decimal,
    /// Sum of line totals including VAT.
    pub grand_total: Decimal,
}

impl DocumentTotals {
    /// Totals of a document with no lines.
    pub const ZERO: Self = Self {
        sub_total: Decimal::ZERO,
        total_vat: Decimal::ZERO,
        grand_total: Decimal::ZERO,
    };
}

/// Calculates document totals from already-rounded line totals.
///
/// Called with the full, current line set whenever lines change; totals are
/// never patched incrementally.
#[must_use]
pub fn calculate_document(lines: &[LineTotals]) -> DocumentTotals {
    let sub_total: Decimal = lines.iter().map(|l| l.excl_vat).sum();
    let total_vat: Decimal = lines.iter().map(|l| l.vat_amount).sum();
    let grand_total: Decimal = lines.iter().map(|l| l.incl_vat).sum();

    DocumentTotals {
        sub_total: round_money(sub_total),
        total_vat: round_money(total_vat),
        grand_total: round_money(grand_total),
    }
}
