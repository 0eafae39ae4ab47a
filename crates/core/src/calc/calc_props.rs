//! Property tests for the calculation engine.

use proptest::prelude::*;
use rust_decimal::Decimal;

use super::line::{calculate_line, LineInput};
use super::totals::calculate_document;

fn money_strategy() -> impl Strategy<Value = Decimal> {
    // Amounts up to 1,000,000.00 with 2 decimals.
    (0i64..=100_000_000).prop_map(|n| Decimal::new(n, 2))
}

fn quantity_strategy() -> impl Strategy<Value = Decimal> {
    // Quantities up to 10,000 with 3 decimals.
    (0i64..=10_000_000).prop_map(|n| Decimal::new(n, 3))
}

fn rate_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..=10_000).prop_map(|n| Decimal::new(n, 2))
}

fn discount_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..=10_000).prop_map(|n| Decimal::new(n, 2))
}

fn line_strategy() -> impl Strategy<Value = LineInput> {
    (
        quantity_strategy(),
        money_strategy(),
        rate_strategy(),
        discount_strategy(),
    )
        .prop_map(|(quantity, unit_price, vat_rate, discount_percent)| LineInput {
            quantity,
            unit_price,
            vat_rate,
            discount_percent,
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Valid inputs never produce negative totals, and incl = excl + vat
    /// exactly.
    #[test]
    fn prop_line_totals_consistent(input in line_strategy()) {
        let totals = calculate_line(&input).unwrap();

        prop_assert!(totals.excl_vat >= Decimal::ZERO);
        prop_assert!(totals.vat_amount >= Decimal::ZERO);
        prop_assert_eq!(totals.incl_vat, totals.excl_vat + totals.vat_amount);
        prop_assert!(totals.excl_vat.scale() <= 2);
        prop_assert!(totals.vat_amount.scale() <= 2);
    }

    /// Calculation is deterministic: the same inputs give the same totals.
    #[test]
    fn prop_line_calculation_deterministic(input in line_strategy()) {
        prop_assert_eq!(calculate_line(&input).unwrap(), calculate_line(&input).unwrap());
    }

    /// A full discount always zeroes the line regardless of other inputs.
    #[test]
    fn prop_full_discount_zeroes(
        quantity in quantity_strategy(),
        unit_price in money_strategy(),
        vat_rate in rate_strategy(),
    ) {
        let totals = calculate_line(&LineInput {
            quantity,
            unit_price,
            vat_rate,
            discount_percent: Decimal::ONE_HUNDRED,
        })
        .unwrap();
        prop_assert_eq!(totals.incl_vat, Decimal::ZERO);
    }

    /// Document totals equal the component-wise sums of their lines.
    #[test]
    fn prop_document_totals_sum_lines(inputs in proptest::collection::vec(line_strategy(), 0..8)) {
        let lines: Vec<_> = inputs.iter().map(|i| calculate_line(i).unwrap()).collect();
        let totals = calculate_document(&lines);

        let excl: Decimal = lines.iter().map(|l| l.excl_vat).sum();
        let vat: Decimal = lines.iter().map(|l| l.vat_amount).sum();

        prop_assert_eq!(totals.sub_total, excl);
        prop_assert_eq!(totals.total_vat, vat);
        prop_assert_eq!(totals.grand_total, totals.sub_total + totals.total_vat);
    }
}
