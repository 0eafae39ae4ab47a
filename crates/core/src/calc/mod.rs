//! Line and document total calculations.
//!
//! Totals are pure functions of their inputs and are recomputed from the
//! full, current item set on every mutation; nothing is patched
//! incrementally. All rounding is to 2 decimals, half away from zero.

pub mod error;
pub mod line;
pub mod totals;

pub use error::CalcError;
pub use line::{calculate_line, LineInput, LineTotals};
pub use totals::{calculate_document, DocumentTotals};

#[cfg(test)]
mod calc_props;
