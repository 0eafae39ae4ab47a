//! Optimistic concurrency version tokens.

pub mod guard;

pub use guard::{check_version, next_version, ConcurrencyError};
