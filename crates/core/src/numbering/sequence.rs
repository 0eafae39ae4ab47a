//! Document number formatting, parsing, and succession.

/// Minimum width of the sequence field; sequences beyond 9999 grow wider.
pub const SEQUENCE_WIDTH: usize = 4;

/// Formats a document number as `{prefix-}{year}-{seq:04}`.
///
/// The sequence is zero-padded to [`SEQUENCE_WIDTH`] digits and grows
/// naturally beyond it (10000, 10001, ...); it never wraps.
#[must_use]
pub fn format_number(prefix: Option<&str>, year: i32, sequence: u64) -> String {
    match prefix {
        Some(prefix) => format!("{prefix}-{year:04}-{sequence:0SEQUENCE_WIDTH$}"),
        None => format!("{year:04}-{sequence:0SEQUENCE_WIDTH$}"),
    }
}

/// Parses the trailing sequence field of a document number.
///
/// Returns `None` for malformed numbers: a missing separator, a sequence
/// shorter than [`SEQUENCE_WIDTH`] digits, or non-digit characters.
#[must_use]
pub fn parse_sequence(number: &str) -> Option<u64> {
    let (_, tail) = number.rsplit_once('-')?;
    if tail.len() < SEQUENCE_WIDTH || !tail.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    tail.parse().ok()
}

/// Computes the next document number after `last` for (owner, year).
///
/// With no previously issued number the sequence starts at 1. A malformed
/// `last` also restarts at 1: availability is favored over strict
/// continuity, and the unique constraint downstream still rejects genuine
/// duplicates.
#[must_use]
pub fn next_number(prefix: Option<&str>, year: i32, last: Option<&str>) -> String {
    let next = last
        .and_then(parse_sequence)
        .map_or(1, |seq| seq.saturating_add(1));
    format_number(prefix, year, next)
}

/// Checks a number against the exposed format `^(?:[A-Z]+-)?\d{4}-\d{4,}$`.
#[must_use]
pub fn is_well_formed(number: &str) -> bool {
    // Strip the optional uppercase prefix; a leading year is left alone
    // because A-Z and 0-9 do not overlap.
    let rest = match number.split_once('-') {
        Some((head, rest))
            if !head.is_empty() && head.bytes().all(|b| b.is_ascii_uppercase()) =>
        {
            rest
        }
        _ => number,
    };

    let Some((year, seq)) = rest.split_once('-') else {
        return false;
    };
    year.len() == 4
        && year.bytes().all(|b| b.is_ascii_digit())
        && seq.len() >= SEQUENCE_WIDTH
        && seq.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_without_prefix() {
        assert_eq!(format_number(None, 2026, 1), "2026-0001");
        assert_eq!(format_number(None, 2026, 42), "2026-0042");
    }

    #[test]
    fn test_format_with_prefix() {
        assert_eq!(format_number(Some("ORD"), 2026, 7), "ORD-2026-0007");
    }

    #[test]
    fn test_format_beyond_padding_never_wraps() {
        assert_eq!(format_number(None, 2026, 9999), "2026-9999");
        assert_eq!(format_number(None, 2026, 10_000), "2026-10000");
        assert_eq!(format_number(Some("DN"), 2026, 123_456), "DN-2026-123456");
    }

    #[test]
    fn test_parse_sequence() {
        assert_eq!(parse_sequence("2026-0001"), Some(1));
        assert_eq!(parse_sequence("ORD-2026-0042"), Some(42));
        assert_eq!(parse_sequence("2026-10000"), Some(10_000));
    }

    #[test]
    fn test_parse_sequence_malformed() {
        assert_eq!(parse_sequence("garbage"), None);
        assert_eq!(parse_sequence("2026-1"), None); // too short
        assert_eq!(parse_sequence("2026-00a1"), None);
        assert_eq!(parse_sequence(""), None);
    }

    #[test]
    fn test_next_number_starts_at_one() {
        assert_eq!(next_number(None, 2026, None), "2026-0001");
        assert_eq!(next_number(Some("INV"), 2026, None), "INV-2026-0001");
    }

    #[test]
    fn test_next_number_increments_last() {
        assert_eq!(next_number(None, 2026, Some("2026-0041")), "2026-0042");
        assert_eq!(
            next_number(Some("ORD"), 2026, Some("ORD-2026-0009")),
            "ORD-2026-0010"
        );
    }

    #[test]
    fn test_next_number_overflows_past_9999() {
        assert_eq!(next_number(None, 2026, Some("2026-9999")), "2026-10000");
        assert_eq!(next_number(None, 2026, Some("2026-10000")), "2026-10001");
    }

    #[test]
    fn test_next_number_malformed_last_restarts() {
        assert_eq!(next_number(None, 2026, Some("scribble")), "2026-0001");
        assert_eq!(next_number(None, 2026, Some("2026-12")), "2026-0001");
    }

    #[test]
    fn test_well_formed() {
        assert!(is_well_formed("2026-0001"));
        assert!(is_well_formed("INV-2026-0001"));
        assert!(is_well_formed("DN-2026-10000"));
        assert!(!is_well_formed("2026-001"));
        assert!(!is_well_formed("inv-2026-0001"));
        assert!(!is_well_formed("INV-26-0001"));
        assert!(!is_well_formed("INV-2026"));
        assert!(!is_well_formed(""));
    }

    #[test]
    fn test_year_zero_padded() {
        // Unusual, but the format holds for any 4-digit-or-less year.
        assert_eq!(format_number(None, 987, 1), "0987-0001");
    }
}
