//! Tenant scoping: who may see and mutate which rows.
//!
//! Every read and every existence check before a write runs through a
//! [`TenantScope`] resolved from the acting user. Omitting the scope is the
//! single most dangerous defect class in this system (cross-tenant leakage),
//! so the resolver is pure and trivially testable, and the persistence layer
//! has exactly one translation point from scope to query predicate.

pub mod error;
pub mod resolver;
pub mod types;

pub use error::ScopeError;
pub use resolver::resolve;
pub use types::{Actor, Role, TenantScope};
