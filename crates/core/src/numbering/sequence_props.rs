//! Property tests for document number succession.

use proptest::prelude::*;

use super::sequence::{format_number, is_well_formed, next_number, parse_sequence};

fn prefix_strategy() -> impl Strategy<Value = Option<String>> {
    proptest::option::of("[A-Z]{1,5}")
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Every formatted number parses back to the sequence it was built from.
    #[test]
    fn prop_format_parse_roundtrip(
        prefix in prefix_strategy(),
        year in 1000i32..=9999,
        seq in 1u64..=1_000_000,
    ) {
        let number = format_number(prefix.as_deref(), year, seq);
        prop_assert_eq!(parse_sequence(&number), Some(seq));
    }

    /// Every formatted number matches the exposed wire format.
    #[test]
    fn prop_formatted_numbers_are_well_formed(
        prefix in prefix_strategy(),
        year in 1000i32..=9999,
        seq in 1u64..=1_000_000,
    ) {
        let number = format_number(prefix.as_deref(), year, seq);
        prop_assert!(is_well_formed(&number), "not well-formed: {number}");
    }

    /// Succession is strictly increasing: the next number always parses to
    /// a sequence greater than its predecessor's.
    #[test]
    fn prop_succession_strictly_increases(
        prefix in prefix_strategy(),
        year in 1000i32..=9999,
        seq in 1u64..=1_000_000,
    ) {
        let last = format_number(prefix.as_deref(), year, seq);
        let next = next_number(prefix.as_deref(), year, Some(&last));
        prop_assert_eq!(parse_sequence(&next), Some(seq + 1));
        prop_assert_ne!(next, last);
    }

    /// Arbitrary garbage never panics the parser and always restarts the
    /// sequence at 1.
    #[test]
    fn prop_malformed_input_restarts(garbage in "[a-z ]{0,12}") {
        prop_assert_eq!(parse_sequence(&garbage), None);
        prop_assert_eq!(next_number(None, 2026, Some(&garbage)), "2026-0001");
    }
}
