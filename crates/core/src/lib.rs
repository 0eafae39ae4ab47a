//! Core business logic for Defter.
//!
//! This crate contains pure business logic with ZERO web or database
//! dependencies. All domain rules, state machines, and calculations live
//! here; the persistence layer executes the plans this crate produces.
//!
//! # Modules
//!
//! - `scope` - Tenant scoping: who may see and mutate which rows
//! - `numbering` - Per-owner/year sequential document numbers
//! - `calc` - Line and document total calculations
//! - `document` - Document status state machines
//! - `ledger` - Ledger posting plans and balance folds
//! - `concurrency` - Optimistic concurrency version tokens

pub mod calc;
pub mod concurrency;
pub mod document;
pub mod ledger;
pub mod numbering;
pub mod scope;
