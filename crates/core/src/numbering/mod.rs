//! Per-owner/year sequential document numbers.
//!
//! Numbers look like `INV-2026-0042`: an optional uppercase prefix, the
//! 4-digit calendar year, and a zero-padded sequence of at least 4 digits.
//! The sequence is scoped per owning user and calendar year and is computed
//! from the last number already issued, never from a counter table.
//!
//! The computation itself is not concurrency-safe; the persistence layer
//! runs it inside the same transaction as the document insert and relies on
//! a unique constraint on (owner, number) to make races fail loudly, then
//! retries the allocation.

pub mod sequence;

pub use sequence::{format_number, is_well_formed, next_number, parse_sequence};

#[cfg(test)]
mod sequence_props;
